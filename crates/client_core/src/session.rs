use std::sync::Arc;

use alloy_primitives::Address;
use anyhow::anyhow;
use chain::WalletProvider;
use shared::domain::{ChainId, SaleOperation};
use tokio::sync::Mutex;

use crate::error::ControllerError;

/// Wallet connection owned by one mounted controller.
///
/// Created by the caller and handed to the controller; dropping the controller
/// drops the connection, like a page reload would.
pub struct WalletSession {
    provider: Arc<dyn WalletProvider>,
    address: Mutex<Option<Address>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Connection {
    pub address: Address,
    pub newly_connected: bool,
}

impl WalletSession {
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self {
            provider,
            address: Mutex::new(None),
        }
    }

    pub async fn address(&self) -> Option<Address> {
        *self.address.lock().await
    }

    pub async fn is_connected(&self) -> bool {
        self.address.lock().await.is_some()
    }

    pub(crate) async fn connect(&self, required: ChainId) -> Result<Connection, ControllerError> {
        let mut guard = self.address.lock().await;
        if let Some(address) = *guard {
            return Ok(Connection {
                address,
                newly_connected: false,
            });
        }

        let accounts = self
            .provider
            .request_accounts()
            .await
            .map_err(|source| ControllerError::transaction(SaleOperation::ConnectWallet, source))?;
        let actual = self
            .provider
            .chain_id()
            .await
            .map(ChainId)
            .map_err(|source| ControllerError::transaction(SaleOperation::ConnectWallet, source))?;
        if actual != required {
            return Err(ControllerError::NetworkMismatch {
                expected: required,
                actual,
            });
        }

        let address = accounts.first().copied().ok_or_else(|| {
            ControllerError::transaction(
                SaleOperation::ConnectWallet,
                anyhow!("wallet exposed no accounts"),
            )
        })?;
        *guard = Some(address);

        Ok(Connection {
            address,
            newly_connected: true,
        })
    }
}
