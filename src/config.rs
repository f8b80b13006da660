use std::path::PathBuf;

use alloy_primitives::Address;
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::logging;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[clap(
    author = "Parsec",
    version = "0.1.0",
    about = "Parsec deployer",
    long_about = r#"Deploys the Parsec proxy and locked controller and initializes the token cap"#
)]
pub struct Config {
    #[clap(
        long,
        env = "LOG_FORMAT",
        help = "Log format (plain, json)",
        default_value = "plain"
    )]
    pub log_format: logging::Format,

    #[clap(
        long,
        env = "RPC_URL",
        help = "URL of the node's JSON-RPC endpoint (e.g., http://localhost:8545)",
        default_value = "http://127.0.0.1:8545"
    )]
    pub rpc_url: String,

    #[clap(long, env = "RPC_USER", help = "User for RPC basic authentication")]
    pub rpc_user: Option<String>,

    #[clap(
        long,
        env = "RPC_PASSWORD",
        help = "Password for RPC basic authentication"
    )]
    pub rpc_password: Option<String>,

    #[clap(
        long,
        env = "DEPLOYER_ADDRESS",
        help = "Unlocked node account that sends the deployment transactions"
    )]
    pub from: Address,

    #[clap(
        long,
        env = "CHAIN_ID",
        help = "Expected chain id of the node; the run aborts on mismatch"
    )]
    pub chain_id: Option<u64>,

    #[clap(long, env = "GAS_LIMIT", help = "Gas limit for every transaction")]
    pub gas: Option<u64>,

    #[clap(long, env = "GAS_PRICE", help = "Gas price in wei for every transaction")]
    pub gas_price: Option<u128>,

    #[clap(
        long,
        env = "ARTIFACTS_DIR",
        help = "Directory holding compiled contract artifacts (<Name>.json)",
        default_value = "build/contracts"
    )]
    pub artifacts_dir: PathBuf,

    #[clap(
        long,
        env = "RECEIPT_POLL_INTERVAL_MS",
        help = "Initial delay between transaction receipt polls",
        default_value = "500"
    )]
    pub receipt_poll_interval_ms: u64,

    #[clap(
        long,
        env = "RECEIPT_POLL_ATTEMPTS",
        help = "Receipt polls before a transaction is considered timed out",
        default_value = "120"
    )]
    pub receipt_poll_attempts: usize,

    #[clap(long, env = "FROM_STAGE", help = "First migration stage to run")]
    pub from_stage: Option<u32>,

    #[clap(long, env = "TO_STAGE", help = "Last migration stage to run")]
    pub to_stage: Option<u32>,

    #[clap(
        long,
        env = "VERIFY_CAP",
        help = "Fail the run when the cap read back differs from the configured supply",
        default_value = "false"
    )]
    pub verify_cap: bool,
}

impl Config {
    pub fn new_local(from: Address) -> Self {
        Self {
            log_format: logging::Format::Plain,
            rpc_url: "http://127.0.0.1:8545".to_string(),
            rpc_user: None,
            rpc_password: None,
            from,
            chain_id: None,
            gas: None,
            gas_price: None,
            artifacts_dir: "build/contracts".into(),
            receipt_poll_interval_ms: 500,
            receipt_poll_attempts: 120,
            from_stage: None,
            to_stage: None,
            verify_cap: false,
        }
    }
}
