//! Contract creation from a compiled artifact.

use std::{fs, path::Path, sync::Arc};

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolValue;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::{
    error::ChainError,
    rpc::{ConfirmationPolicy, JsonRpcClient, TransactionRequest},
    ContractDeployer, DeployArgs, RpcSaleContract, SaleContract,
};

/// The parts of a hardhat build artifact needed to create the contract.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read contract artifact '{}'", path.display()))?;
        let artifact: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse contract artifact '{}'", path.display()))?;
        if artifact.bytecode.is_empty() {
            bail!(
                "artifact '{}' has no bytecode; is {} abstract?",
                path.display(),
                artifact.contract_name
            );
        }
        Ok(artifact)
    }

    /// Creation bytecode followed by the ABI-encoded constructor arguments.
    pub fn creation_payload(&self, args: &DeployArgs) -> Bytes {
        let mut payload = self.bytecode.to_vec();
        payload.extend((args.metadata_url.clone(), args.whitelist_contract).abi_encode_params());
        Bytes::from(payload)
    }
}

pub struct RpcDeployer {
    rpc: Arc<JsonRpcClient>,
    artifact: ContractArtifact,
    account: Option<Address>,
    confirmation: ConfirmationPolicy,
}

impl RpcDeployer {
    pub fn new(
        rpc: Arc<JsonRpcClient>,
        artifact: ContractArtifact,
        account: Option<Address>,
        confirmation: ConfirmationPolicy,
    ) -> Self {
        Self {
            rpc,
            artifact,
            account,
            confirmation,
        }
    }
}

#[async_trait]
impl ContractDeployer for RpcDeployer {
    async fn deployer_account(&self) -> Result<Address> {
        if let Some(account) = self.account {
            return Ok(account);
        }
        let accounts = self.rpc.accounts().await?;
        accounts
            .first()
            .copied()
            .ok_or_else(|| ChainError::NoAccounts.into())
    }

    async fn deploy(&self, from: Address, args: &DeployArgs) -> Result<Arc<dyn SaleContract>> {
        let tx = TransactionRequest {
            from,
            to: None,
            value: None,
            data: self.artifact.creation_payload(args),
        };
        let tx_hash = self
            .rpc
            .send_transaction(&tx)
            .await
            .with_context(|| format!("failed to submit {} deployment", self.artifact.contract_name))?;
        info!(
            %tx_hash,
            contract = %self.artifact.contract_name,
            %from,
            "deployment submitted"
        );

        let receipt = self.rpc.wait_for_receipt(tx_hash, &self.confirmation).await?;
        let address = receipt
            .contract_address
            .ok_or_else(|| anyhow!("deployment receipt {tx_hash} carries no contract address"))?;

        Ok(Arc::new(RpcSaleContract::with_confirmation(
            Arc::clone(&self.rpc),
            address,
            self.confirmation,
        )))
    }
}
