pub mod deploy_contracts;

use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tracing::info;

use crate::{chain::Chain, config::Config, deployer::Deployer};

pub use deploy_contracts::{DeployContracts, DeployError, Report, deploy_and_initialize};

/// One numbered deployment stage.
#[async_trait]
pub trait Migration<C: Chain>: Send + Sync {
    fn number(&self) -> u32;

    fn name(&self) -> &'static str;

    async fn run(&self, deployer: &mut Deployer<C>) -> Result<()>;
}

pub fn all<C: Chain>(config: &Config) -> Vec<Box<dyn Migration<C>>> {
    vec![Box::new(DeployContracts {
        verify_cap: config.verify_cap,
    })]
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageRange {
    pub from: Option<u32>,
    pub to: Option<u32>,
}

impl StageRange {
    pub fn new(from: Option<u32>, to: Option<u32>) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, number: u32) -> bool {
        self.from.is_none_or(|from| number >= from) && self.to.is_none_or(|to| number <= to)
    }
}

/// Runs the stages in `range` in ascending order and stops at the first
/// failure. Returns the numbers of the stages that ran.
pub async fn run<C: Chain>(
    deployer: &mut Deployer<C>,
    mut migrations: Vec<Box<dyn Migration<C>>>,
    range: StageRange,
) -> Result<Vec<u32>> {
    let mut seen = HashSet::new();
    for migration in &migrations {
        if !seen.insert(migration.number()) {
            bail!("Duplicate migration number {}", migration.number());
        }
    }
    migrations.sort_by_key(|m| m.number());

    let mut completed = vec![];
    for migration in migrations.iter().filter(|m| range.contains(m.number())) {
        let label = format!("{}_{}", migration.number(), migration.name());
        info!("Running migration {}", label);
        migration
            .run(deployer)
            .await
            .with_context(|| format!("Migration {} failed", label))?;
        info!("Migration {} complete", label);
        completed.push(migration.number());
    }
    if completed.is_empty() {
        info!("No migrations in range {:?}", range);
    }
    Ok(completed)
}
