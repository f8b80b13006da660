use alloy_primitives::B256;
use serde::Deserialize;
use thiserror::Error as ThisError;

#[derive(Deserialize, Debug)]
pub struct RpcErrorResponse {
    pub code: i64,
    pub message: String,
}

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("Unexpected error: {0}")]
    Unexpected(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON serialization/deserialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("RPC error (code {code}): {message}")]
    Rpc { code: i64, message: String },
    #[error("Invalid header value error: {0}")]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
    #[error("ABI error: {0}")]
    Abi(#[from] alloy_sol_types::Error),
    #[error("Transaction {0} is still pending")]
    Pending(B256),
    #[error("Transaction {0} was not confirmed in time")]
    Timeout(B256),
    #[error("Transaction {0} reverted")]
    Reverted(B256),
    #[error("Creation transaction {0} produced no contract address")]
    MissingContractAddress(B256),
    #[error("Chain id mismatch: expected {expected}, node reports {actual}")]
    ChainIdMismatch { expected: u64, actual: u64 },
    #[error("Cancelled")]
    Cancelled,
}
