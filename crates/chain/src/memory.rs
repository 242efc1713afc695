//! In-process chain that enforces the sale contract's rules.
//!
//! Used by tests and local demos in place of a node. Time comes from a
//! [`Clock`] so presale windows can be crossed without waiting.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use alloy_primitives::{Address, B256, U256};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    clock::Clock,
    constants::{MAX_TOKEN_IDS, MINT_PRICE_WEI, PRESALE_DURATION},
};
use tracing::debug;

use crate::{
    error::ChainError, ContractDeployer, DeployArgs, SaleContract, TxHash, TxReceipt,
    WalletProvider,
};

pub struct InMemoryWallet {
    accounts: Vec<Address>,
    chain_id: AtomicU64,
    reachable: AtomicBool,
}

impl InMemoryWallet {
    pub fn new(accounts: Vec<Address>, chain_id: u64) -> Self {
        Self {
            accounts,
            chain_id: AtomicU64::new(chain_id),
            reachable: AtomicBool::new(true),
        }
    }

    pub fn switch_chain(&self, chain_id: u64) {
        self.chain_id.store(chain_id, Ordering::SeqCst);
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    fn ensure_reachable(&self) -> Result<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(anyhow!("wallet provider unavailable"))
        }
    }
}

#[async_trait]
impl WalletProvider for InMemoryWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.ensure_reachable()?;
        Ok(self.accounts.clone())
    }

    async fn chain_id(&self) -> Result<u64> {
        self.ensure_reachable()?;
        Ok(self.chain_id.load(Ordering::SeqCst))
    }
}

struct ContractState {
    metadata_url: String,
    whitelist: HashSet<Address>,
    presale_started: bool,
    presale_ended: u64,
    token_owners: Vec<Address>,
    pending: HashMap<TxHash, TxReceipt>,
    tx_counter: u64,
    block_number: u64,
    reported_token_ids: Option<u64>,
}

pub struct InMemorySaleContract {
    address: Address,
    owner: Address,
    max_token_ids: u64,
    price: U256,
    clock: Arc<dyn Clock>,
    reads_failing: AtomicBool,
    state: Mutex<ContractState>,
}

impl InMemorySaleContract {
    pub fn new(
        address: Address,
        owner: Address,
        whitelist: impl IntoIterator<Item = Address>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            address,
            owner,
            max_token_ids: MAX_TOKEN_IDS,
            price: MINT_PRICE_WEI,
            clock,
            reads_failing: AtomicBool::new(false),
            state: Mutex::new(ContractState {
                metadata_url: String::new(),
                whitelist: whitelist.into_iter().collect(),
                presale_started: false,
                presale_ended: 0,
                token_owners: Vec::new(),
                pending: HashMap::new(),
                tx_counter: 0,
                block_number: 0,
                reported_token_ids: None,
            }),
        }
    }

    pub fn with_metadata_url(self, metadata_url: impl Into<String>) -> Self {
        self.lock().metadata_url = metadata_url.into();
        self
    }

    pub fn metadata_url(&self) -> String {
        self.lock().metadata_url.clone()
    }

    pub fn balance_of(&self, account: Address) -> u64 {
        self.lock()
            .token_owners
            .iter()
            .filter(|owner| **owner == account)
            .count() as u64
    }

    /// Makes every view call fail until reset.
    pub fn set_reads_failing(&self, failing: bool) {
        self.reads_failing.store(failing, Ordering::SeqCst);
    }

    /// Overrides the value `tokenIds()` reports, to simulate a misbehaving node.
    pub fn report_token_ids(&self, value: Option<u64>) {
        self.lock().reported_token_ids = value;
    }

    fn lock(&self) -> MutexGuard<'_, ContractState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_readable(&self) -> Result<()> {
        if self.reads_failing.load(Ordering::SeqCst) {
            return Err(ChainError::Rpc {
                code: -32000,
                message: "header not found".into(),
            }
            .into());
        }
        Ok(())
    }

    fn record(state: &mut ContractState) -> TxHash {
        state.tx_counter += 1;
        state.block_number += 1;
        let tx_hash = B256::left_padding_from(&state.tx_counter.to_be_bytes());
        state.pending.insert(
            tx_hash,
            TxReceipt {
                tx_hash,
                block_number: Some(state.block_number),
                contract_address: None,
            },
        );
        tx_hash
    }

    fn mint_to(&self, state: &mut ContractState, to: Address, value: U256) -> Result<()> {
        if state.token_owners.len() as u64 >= self.max_token_ids {
            return Err(rejected("Exceeded maximum Crypto Devs supply"));
        }
        if value < self.price {
            return Err(rejected("Ether sent is not correct"));
        }
        state.token_owners.push(to);
        debug!(%to, token_id = state.token_owners.len(), "minted");
        Ok(())
    }
}

fn rejected(reason: &str) -> anyhow::Error {
    ChainError::Rejected(reason.to_string()).into()
}

#[async_trait]
impl SaleContract for InMemorySaleContract {
    fn address(&self) -> Address {
        self.address
    }

    async fn presale_started(&self) -> Result<bool> {
        self.ensure_readable()?;
        Ok(self.lock().presale_started)
    }

    async fn presale_ended(&self) -> Result<u64> {
        self.ensure_readable()?;
        Ok(self.lock().presale_ended)
    }

    async fn token_ids(&self) -> Result<u64> {
        self.ensure_readable()?;
        let state = self.lock();
        Ok(state
            .reported_token_ids
            .unwrap_or(state.token_owners.len() as u64))
    }

    async fn max_token_ids(&self) -> Result<u64> {
        self.ensure_readable()?;
        Ok(self.max_token_ids)
    }

    async fn get_owner(&self) -> Result<Address> {
        self.ensure_readable()?;
        Ok(self.owner)
    }

    async fn start_presale(&self, from: Address) -> Result<TxHash> {
        if from != self.owner {
            return Err(rejected("Ownable: caller is not the owner"));
        }
        let mut state = self.lock();
        state.presale_started = true;
        state.presale_ended = self.clock.now_unix() + PRESALE_DURATION.as_secs();
        Ok(Self::record(&mut state))
    }

    async fn presale_mint(&self, from: Address, value: U256) -> Result<TxHash> {
        let now = self.clock.now_unix();
        let mut state = self.lock();
        if !(state.presale_started && now < state.presale_ended) {
            return Err(rejected("Presale is not running"));
        }
        if !state.whitelist.contains(&from) {
            return Err(rejected("You are not whitelisted"));
        }
        self.mint_to(&mut state, from, value)?;
        Ok(Self::record(&mut state))
    }

    async fn mint(&self, from: Address, value: U256) -> Result<TxHash> {
        let now = self.clock.now_unix();
        let mut state = self.lock();
        if !(state.presale_started && now >= state.presale_ended) {
            return Err(rejected("Presale has not ended yet"));
        }
        self.mint_to(&mut state, from, value)?;
        Ok(Self::record(&mut state))
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<TxReceipt> {
        self.lock()
            .pending
            .remove(&tx_hash)
            .ok_or_else(|| ChainError::UnknownTransaction(tx_hash).into())
    }
}

/// Deploys fresh [`InMemorySaleContract`]s.
pub struct InMemoryDeployer {
    account: Address,
    whitelist: Vec<Address>,
    clock: Arc<dyn Clock>,
    deployed: Mutex<Vec<Arc<InMemorySaleContract>>>,
    reachable: AtomicBool,
}

impl InMemoryDeployer {
    pub fn new(account: Address, whitelist: Vec<Address>, clock: Arc<dyn Clock>) -> Self {
        Self {
            account,
            whitelist,
            clock,
            deployed: Mutex::new(Vec::new()),
            reachable: AtomicBool::new(true),
        }
    }

    pub fn deployments(&self) -> u64 {
        self.deployed().len() as u64
    }

    pub fn last_deployment(&self) -> Option<Arc<InMemorySaleContract>> {
        self.deployed().last().cloned()
    }

    fn deployed(&self) -> MutexGuard<'_, Vec<Arc<InMemorySaleContract>>> {
        self.deployed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContractDeployer for InMemoryDeployer {
    async fn deployer_account(&self) -> Result<Address> {
        Ok(self.account)
    }

    async fn deploy(&self, from: Address, args: &DeployArgs) -> Result<Arc<dyn SaleContract>> {
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(anyhow!("connection refused"));
        }
        let mut deployed = self.deployed();
        let nonce = deployed.len() as u64 + 1;
        let address = Address::left_padding_from(&nonce.to_be_bytes());
        let contract = Arc::new(
            InMemorySaleContract::new(
                address,
                from,
                self.whitelist.iter().copied(),
                Arc::clone(&self.clock),
            )
            .with_metadata_url(args.metadata_url.clone()),
        );
        deployed.push(Arc::clone(&contract));
        Ok(contract)
    }
}

#[cfg(test)]
#[path = "tests/memory_tests.rs"]
mod tests;
