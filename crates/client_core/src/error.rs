use shared::{
    domain::{ChainId, SaleOperation},
    error::ErrorKind,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Change the network to {expected} (wallet is on {actual})")]
    NetworkMismatch { expected: ChainId, actual: ChainId },
    #[error("wallet is not connected")]
    NotConnected,
    #[error("another transaction is still pending")]
    Busy,
    #[error("{operation} failed: {source:#}")]
    Transaction {
        operation: SaleOperation,
        source: anyhow::Error,
    },
}

impl ControllerError {
    pub fn transaction(operation: SaleOperation, source: anyhow::Error) -> Self {
        Self::Transaction { operation, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ControllerError::NetworkMismatch { .. } => ErrorKind::NetworkMismatch,
            ControllerError::NotConnected
            | ControllerError::Busy
            | ControllerError::Transaction { .. } => ErrorKind::TransactionFailure,
        }
    }

    /// Whether the failure must be put in front of the user.
    pub fn is_blocking(&self) -> bool {
        self.kind() == ErrorKind::NetworkMismatch
    }
}
