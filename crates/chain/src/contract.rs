use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;

use crate::{
    bindings::ICryptoDevs,
    rpc::{ConfirmationPolicy, JsonRpcClient, TransactionRequest},
    SaleContract, TxHash, TxReceipt,
};

/// Sale contract reached through a JSON-RPC node whose accounts sign.
pub struct RpcSaleContract {
    rpc: Arc<JsonRpcClient>,
    address: Address,
    confirmation: ConfirmationPolicy,
}

impl RpcSaleContract {
    pub fn new(rpc: Arc<JsonRpcClient>, address: Address) -> Self {
        Self::with_confirmation(rpc, address, ConfirmationPolicy::default())
    }

    pub fn with_confirmation(
        rpc: Arc<JsonRpcClient>,
        address: Address,
        confirmation: ConfirmationPolicy,
    ) -> Self {
        Self {
            rpc,
            address,
            confirmation,
        }
    }

    async fn view<C: SolCall>(&self, call: C) -> Result<C::Return> {
        let raw = self
            .rpc
            .call(self.address, Bytes::from(call.abi_encode()))
            .await
            .with_context(|| format!("eth_call {} on {}", C::SIGNATURE, self.address))?;
        C::abi_decode_returns(&raw, true)
            .with_context(|| format!("failed to decode {} return data", C::SIGNATURE))
    }

    async fn transact<C: SolCall>(
        &self,
        from: Address,
        call: C,
        value: Option<U256>,
    ) -> Result<TxHash> {
        let tx = TransactionRequest {
            from,
            to: Some(self.address),
            value,
            data: Bytes::from(call.abi_encode()),
        };
        self.rpc
            .send_transaction(&tx)
            .await
            .with_context(|| format!("failed to submit {} from {from}", C::SIGNATURE))
    }
}

#[async_trait]
impl SaleContract for RpcSaleContract {
    fn address(&self) -> Address {
        self.address
    }

    async fn presale_started(&self) -> Result<bool> {
        Ok(self.view(ICryptoDevs::presaleStartedCall {}).await?._0)
    }

    async fn presale_ended(&self) -> Result<u64> {
        let raw = self.view(ICryptoDevs::presaleEndedCall {}).await?._0;
        to_u64(raw, "presaleEnded")
    }

    async fn token_ids(&self) -> Result<u64> {
        let raw = self.view(ICryptoDevs::tokenIdsCall {}).await?._0;
        to_u64(raw, "tokenIds")
    }

    async fn max_token_ids(&self) -> Result<u64> {
        let raw = self.view(ICryptoDevs::maxTokenIdsCall {}).await?._0;
        to_u64(raw, "maxTokenIds")
    }

    async fn get_owner(&self) -> Result<Address> {
        Ok(self.view(ICryptoDevs::getOwnerCall {}).await?._0)
    }

    async fn start_presale(&self, from: Address) -> Result<TxHash> {
        self.transact(from, ICryptoDevs::startPresaleCall {}, None)
            .await
    }

    async fn presale_mint(&self, from: Address, value: U256) -> Result<TxHash> {
        self.transact(from, ICryptoDevs::presaleMintCall {}, Some(value))
            .await
    }

    async fn mint(&self, from: Address, value: U256) -> Result<TxHash> {
        self.transact(from, ICryptoDevs::mintCall {}, Some(value))
            .await
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<TxReceipt> {
        Ok(self
            .rpc
            .wait_for_receipt(tx_hash, &self.confirmation)
            .await?)
    }
}

fn to_u64(value: U256, what: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{what} value {value} does not fit in u64"))
}
