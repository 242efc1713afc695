use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::SaleOperation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Wallet is on the wrong chain. Blocking and shown to the user.
    NetworkMismatch,
    /// Any failed read or write. Logged only.
    TransactionFailure,
    /// Script-level failure. Fatal.
    DeploymentFailure,
}

/// A failed operation as published on the controller event channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub kind: ErrorKind,
    pub operation: SaleOperation,
    pub message: String,
}

impl FailureReport {
    pub fn new(kind: ErrorKind, operation: SaleOperation, message: impl Into<String>) -> Self {
        Self {
            kind,
            operation,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("{kind:?}: {message}")]
pub struct DappException {
    pub kind: ErrorKind,
    pub message: String,
}

impl DappException {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn deployment(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DeploymentFailure, message)
    }
}
