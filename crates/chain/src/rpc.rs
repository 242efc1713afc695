//! Minimal Ethereum JSON-RPC client over HTTP.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use alloy_primitives::{Address, Bytes, U256};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::time::{sleep, Instant};
use tracing::debug;
use url::Url;

use crate::{error::ChainError, TxHash, TxReceipt};

const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

/// How long and how often to ask the node for a transaction receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
            timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    pub data: Bytes,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: TxHash,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    contract_address: Option<Address>,
}

pub struct JsonRpcClient {
    http: Client,
    url: Url,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: &str) -> Result<Self, ChainError> {
        let parsed = Url::parse(url).map_err(|source| ChainError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        Ok(Self {
            http: Client::new(),
            url: parsed,
            next_id: AtomicU64::new(1),
        })
    }

    pub async fn request<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<R, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(method, id, "rpc request");

        let response: RpcResponse = self
            .http
            .post(self.url.clone())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(ChainError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        serde_json::from_value(response.result.unwrap_or(Value::Null))
            .map_err(|err| ChainError::decode(method, err))
    }

    pub async fn chain_id(&self) -> Result<u64, ChainError> {
        let raw: String = self.request("eth_chainId", json!([])).await?;
        parse_quantity("eth_chainId", &raw)
    }

    pub async fn accounts(&self) -> Result<Vec<Address>, ChainError> {
        self.request("eth_accounts", json!([])).await
    }

    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        self.request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, ChainError> {
        self.request("eth_sendTransaction", json!([tx])).await
    }

    /// Returns `None` while the transaction is still pending.
    pub async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<TxReceipt>, ChainError> {
        const METHOD: &str = "eth_getTransactionReceipt";
        let Some(raw) = self
            .request::<Option<RpcReceipt>>(METHOD, json!([tx_hash]))
            .await?
        else {
            return Ok(None);
        };

        if let Some(status) = raw.status.as_deref() {
            if parse_quantity(METHOD, status)? == 0 {
                return Err(ChainError::Reverted {
                    tx_hash: raw.transaction_hash,
                });
            }
        }

        let block_number = raw
            .block_number
            .as_deref()
            .map(|value| parse_quantity(METHOD, value))
            .transpose()?;

        Ok(Some(TxReceipt {
            tx_hash: raw.transaction_hash,
            block_number,
            contract_address: raw.contract_address,
        }))
    }

    pub async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        policy: &ConfirmationPolicy,
    ) -> Result<TxReceipt, ChainError> {
        let deadline = Instant::now() + policy.timeout;
        loop {
            if let Some(receipt) = self.transaction_receipt(tx_hash).await? {
                debug!(%tx_hash, block = ?receipt.block_number, "transaction confirmed");
                return Ok(receipt);
            }
            if Instant::now() >= deadline {
                return Err(ChainError::ConfirmationTimeout {
                    tx_hash,
                    timeout: policy.timeout,
                });
            }
            sleep(policy.poll_interval).await;
        }
    }
}

/// Parses a hex-encoded JSON-RPC quantity such as `0x1b`.
pub fn parse_quantity(method: &str, raw: &str) -> Result<u64, ChainError> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::decode(method, format!("quantity '{raw}' lacks 0x prefix")))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16)
        .map_err(|err| ChainError::decode(method, format!("quantity '{raw}': {err}")))
}

#[cfg(test)]
#[path = "tests/rpc_tests.rs"]
mod tests;
