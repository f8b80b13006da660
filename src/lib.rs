pub mod artifacts;
pub mod chain;
pub mod config;
pub mod contracts;
pub mod deployer;
pub mod logging;
pub mod migrations;
pub mod retry;
pub mod rpc;
pub mod stopper;
pub mod supply;
pub mod test_utils;
