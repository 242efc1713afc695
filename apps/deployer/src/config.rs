use std::{path::PathBuf, time::Duration};

use alloy_primitives::Address;
use anyhow::Context;
use chain::{ConfirmationPolicy, DeployArgs};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::constants::{METADATA_URL, WHITELIST_CONTRACT_ADDRESS};

pub const SETTINGS_FILE: &str = "deploy";

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
const DEFAULT_ARTIFACT_PATH: &str = "artifacts/contracts/CryptoDevs.sol/CryptoDevs.json";
const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 120;
const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Deserialize)]
struct RawSettings {
    rpc_url: String,
    artifact_path: String,
    metadata_url: String,
    whitelist_contract_address: String,
    deployer_address: Option<String>,
    confirmation_timeout_secs: u64,
    receipt_poll_interval_ms: u64,
}

#[derive(Debug)]
pub struct Settings {
    pub rpc_url: String,
    pub artifact_path: PathBuf,
    pub deploy_args: DeployArgs,
    pub deployer_address: Option<Address>,
    pub confirmation: ConfirmationPolicy,
}

/// Layers the built-in constants, an optional `<name>.toml` file and `APP__*`
/// environment variables, later sources winning.
pub fn load_settings(file_name: &str) -> anyhow::Result<Settings> {
    let raw: RawSettings = Config::builder()
        .set_default("rpc_url", DEFAULT_RPC_URL)?
        .set_default("artifact_path", DEFAULT_ARTIFACT_PATH)?
        .set_default("metadata_url", METADATA_URL)?
        .set_default("whitelist_contract_address", WHITELIST_CONTRACT_ADDRESS)?
        .set_default("confirmation_timeout_secs", DEFAULT_CONFIRMATION_TIMEOUT_SECS)?
        .set_default("receipt_poll_interval_ms", DEFAULT_RECEIPT_POLL_INTERVAL_MS)?
        .add_source(File::with_name(file_name).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()
        .context("failed to assemble deployer settings")?
        .try_deserialize()
        .context("invalid deployer settings")?;

    raw.resolve()
}

impl RawSettings {
    fn resolve(self) -> anyhow::Result<Settings> {
        let whitelist_contract = parse_address(
            "whitelist_contract_address",
            &self.whitelist_contract_address,
        )?;
        let deployer_address = self
            .deployer_address
            .as_deref()
            .map(|raw| parse_address("deployer_address", raw))
            .transpose()?;

        Ok(Settings {
            rpc_url: self.rpc_url,
            artifact_path: PathBuf::from(self.artifact_path),
            deploy_args: DeployArgs {
                metadata_url: self.metadata_url,
                whitelist_contract,
            },
            deployer_address,
            confirmation: ConfirmationPolicy {
                poll_interval: Duration::from_millis(self.receipt_poll_interval_ms.max(1)),
                timeout: Duration::from_secs(self.confirmation_timeout_secs),
            },
        })
    }
}

fn parse_address(key: &str, raw: &str) -> anyhow::Result<Address> {
    raw.trim()
        .parse::<Address>()
        .with_context(|| format!("setting '{key}' is not an address: '{raw}'"))
}
