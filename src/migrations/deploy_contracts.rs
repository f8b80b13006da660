use alloy_primitives::{Address, U256};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error as ThisError;
use tracing::{info, warn};

use crate::{
    artifacts::{CONTROLLER, PROXY},
    chain::Chain,
    contracts::Controller,
    deployer::{self, Deployer},
    rpc, supply,
};

use super::Migration;

#[derive(ThisError, Debug)]
pub enum DeployError {
    #[error("Deployment failed: {0}")]
    Deployment(#[source] deployer::Error),
    #[error("Binding failed: {0}")]
    Unbound(#[source] deployer::Error),
    #[error("Binding failed, code lookup errored: {0}")]
    CodeLookup(#[source] rpc::Error),
    #[error("Binding failed: no code at proxy address {0}")]
    NoCode(Address),
    #[error("Call to {method} failed: {source}")]
    Call {
        method: &'static str,
        source: rpc::Error,
    },
    #[error("Cap mismatch: expected {expected}, read back {actual}")]
    Verification { expected: U256, actual: U256 },
    #[error(transparent)]
    Supply(#[from] supply::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub proxy: Address,
    pub controller: Address,
    pub expected_cap: U256,
    pub cap: U256,
}

impl Report {
    pub fn cap_matches(&self) -> bool {
        self.cap == self.expected_cap
    }
}

/// Deploys the proxy and the controller, initializes the controller logic
/// through the proxy's address and reads the resulting cap back.
pub async fn deploy_and_initialize<C: Chain>(
    deployer: &mut Deployer<C>,
    verify_cap: bool,
) -> Result<Report, DeployError> {
    let expected_cap = supply::initial_cap()?;

    let proxy = deployer
        .deploy(PROXY)
        .await
        .map_err(DeployError::Deployment)?;
    let controller = deployer
        .deploy(CONTROLLER)
        .await
        .map_err(DeployError::Deployment)?;

    let bound_address = deployer
        .deployed(PROXY)
        .map_err(DeployError::Unbound)?;
    let code = deployer
        .chain()
        .code_at(bound_address)
        .await
        .map_err(DeployError::CodeLookup)?;
    if code.is_empty() {
        return Err(DeployError::NoCode(bound_address));
    }
    let binding = Controller::at(bound_address, deployer.chain().clone());
    info!(
        "Bound {} interface to {} at {}",
        CONTROLLER,
        PROXY,
        binding.address()
    );

    binding
        .initialize(controller.address, expected_cap)
        .await
        .map_err(|source| DeployError::Call {
            method: "initialize",
            source,
        })?;
    info!(
        "Initialized {} with logic {} and cap {}",
        binding.address(),
        controller.address,
        expected_cap
    );

    let cap = binding.cap().await.map_err(|source| DeployError::Call {
        method: "cap",
        source,
    })?;
    let report = Report {
        proxy: proxy.address,
        controller: controller.address,
        expected_cap,
        cap,
    };
    if !report.cap_matches() {
        if verify_cap {
            return Err(DeployError::Verification {
                expected: expected_cap,
                actual: cap,
            });
        }
        warn!("Cap read back {} differs from expected {}", cap, expected_cap);
    }
    Ok(report)
}

pub struct DeployContracts {
    pub verify_cap: bool,
}

#[async_trait]
impl<C: Chain> Migration<C> for DeployContracts {
    fn number(&self) -> u32 {
        2
    }

    fn name(&self) -> &'static str {
        "deploy_contracts"
    }

    async fn run(&self, deployer: &mut Deployer<C>) -> Result<()> {
        let report = deploy_and_initialize(deployer, self.verify_cap).await?;
        let cap = supply::to_display(report.cap)?;
        info!(
            proxy = %report.proxy,
            controller = %report.controller,
            cap = %cap,
            "Deployment complete"
        );
        println!("{}", cap);
        Ok(())
    }
}
