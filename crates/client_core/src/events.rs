//! Events published by the sale controller.

use alloy_primitives::Address;
use chain::TxHash;
use shared::{
    domain::{SaleOperation, SaleState},
    error::FailureReport,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    WalletConnected {
        address: Address,
    },
    PhaseChanged {
        from: SaleState,
        to: SaleState,
    },
    OwnerResolved {
        is_owner: bool,
    },
    MintCountUpdated {
        minted: u64,
        max_supply: u64,
    },
    LoadingChanged(bool),
    TransactionConfirmed {
        operation: SaleOperation,
        tx_hash: TxHash,
    },
    /// Message the front end must show to the user.
    Alert(String),
    OperationFailed(FailureReport),
}
