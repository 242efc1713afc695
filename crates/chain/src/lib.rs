use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;

pub mod bindings;
mod contract;
pub mod deploy;
pub mod error;
pub mod memory;
pub mod rpc;
mod wallet;

pub use contract::RpcSaleContract;
pub use deploy::{ContractArtifact, RpcDeployer};
pub use error::ChainError;
pub use rpc::{ConfirmationPolicy, JsonRpcClient};
pub use wallet::RpcWallet;

pub type TxHash = B256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub contract_address: Option<Address>,
}

/// Browser-wallet equivalent: exposes the user's accounts and the chain the
/// wallet is connected to. Signing happens behind this seam.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request_accounts(&self) -> anyhow::Result<Vec<Address>>;
    async fn chain_id(&self) -> anyhow::Result<u64>;
}

/// The sale contract as seen by clients.
///
/// Writes return as soon as the transaction is accepted; callers wait for
/// inclusion with [`SaleContract::wait_for_confirmation`].
#[async_trait]
pub trait SaleContract: Send + Sync {
    fn address(&self) -> Address;
    async fn presale_started(&self) -> anyhow::Result<bool>;
    async fn presale_ended(&self) -> anyhow::Result<u64>;
    async fn token_ids(&self) -> anyhow::Result<u64>;
    async fn max_token_ids(&self) -> anyhow::Result<u64>;
    async fn get_owner(&self) -> anyhow::Result<Address>;
    async fn start_presale(&self, from: Address) -> anyhow::Result<TxHash>;
    async fn presale_mint(&self, from: Address, value: U256) -> anyhow::Result<TxHash>;
    async fn mint(&self, from: Address, value: U256) -> anyhow::Result<TxHash>;
    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> anyhow::Result<TxReceipt>;
}

/// Constructor arguments of the sale contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployArgs {
    pub metadata_url: String,
    pub whitelist_contract: Address,
}

#[async_trait]
pub trait ContractDeployer: Send + Sync {
    /// Account the deployment is sent from; it becomes the contract owner.
    async fn deployer_account(&self) -> anyhow::Result<Address>;

    /// Publishes the contract and waits until the deployment is confirmed.
    async fn deploy(
        &self,
        from: Address,
        args: &DeployArgs,
    ) -> anyhow::Result<Arc<dyn SaleContract>>;
}
