use anyhow::{Context, Result};
use clap::Parser;
use parsec_deploy::{
    artifacts::{self, Registry},
    config::Config,
    contracts::CONTROLLER_FUNCTIONS,
    deployer::Deployer,
    logging,
    migrations::{self, StageRange},
    rpc, stopper,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    logging::setup(config.log_format);
    info!("Deploying from {} via {}", config.from, config.rpc_url);

    let registry = Registry::load(
        &config.artifacts_dir,
        &[artifacts::PROXY, artifacts::CONTROLLER],
    )?;
    registry
        .require(artifacts::CONTROLLER)?
        .require_functions(CONTROLLER_FUNCTIONS)?;

    let cancel_token = CancellationToken::new();
    let stopper_handle = stopper::run(cancel_token.clone());

    let client = rpc::Client::new_from_config(&config, cancel_token.clone())?;
    if let Some(chain_id) = config.chain_id {
        client
            .ensure_chain_id(chain_id)
            .await
            .context("Failed to verify the node's chain id")?;
    }

    let mut deployer = Deployer::new(client, registry);
    let result = migrations::run(
        &mut deployer,
        migrations::all(&config),
        StageRange::new(config.from_stage, config.to_stage),
    )
    .await;

    cancel_token.cancel();
    let _ = stopper_handle.await;
    let completed = result?;
    for deployed in deployer.deployments() {
        info!(
            "{} at {} (tx {})",
            deployed.name, deployed.address, deployed.transaction_hash
        );
    }
    info!("Completed migrations {:?}", completed);
    Ok(())
}
