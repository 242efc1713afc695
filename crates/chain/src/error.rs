use std::time::Duration;

use alloy_primitives::B256;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("invalid rpc url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("rpc transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed rpc response for {method}: {reason}")]
    Decode { method: String, reason: String },
    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: B256 },
    #[error("transaction {tx_hash} not confirmed within {timeout:?}")]
    ConfirmationTimeout { tx_hash: B256, timeout: Duration },
    #[error("execution reverted: {0}")]
    Rejected(String),
    #[error("unknown transaction {0}")]
    UnknownTransaction(B256),
    #[error("node reported no accounts")]
    NoAccounts,
}

impl ChainError {
    pub fn decode(method: &str, reason: impl ToString) -> Self {
        Self::Decode {
            method: method.to_string(),
            reason: reason.to_string(),
        }
    }
}
