use std::sync::Arc;

use alloy_primitives::Address;
use anyhow::Result;
use async_trait::async_trait;

use crate::{rpc::JsonRpcClient, WalletProvider};

/// Wallet backed by the unlocked accounts of a JSON-RPC node.
pub struct RpcWallet {
    rpc: Arc<JsonRpcClient>,
}

impl RpcWallet {
    pub fn new(rpc: Arc<JsonRpcClient>) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl WalletProvider for RpcWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        Ok(self.rpc.accounts().await?)
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.rpc.chain_id().await?)
    }
}
