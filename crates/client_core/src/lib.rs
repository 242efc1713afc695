use std::{sync::Arc, time::Duration};

use alloy_primitives::{Address, U256};
use anyhow::{anyhow, bail};
use chain::{SaleContract, TxReceipt};
use shared::{
    clock::Clock,
    constants::{
        MAX_TOKEN_IDS, MINT_COUNT_POLL_INTERVAL, MINT_PRICE_WEI, REQUIRED_CHAIN_ID,
        SALE_STATUS_POLL_INTERVAL,
    },
    domain::{ChainId, SaleOperation, SaleState},
    error::FailureReport,
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

pub mod error;
pub mod events;
pub mod render;
mod session;

pub use error::ControllerError;
pub use events::ControllerEvent;
pub use render::{render, Affordance, RenderInputs};
pub use session::WalletSession;

const MINT_SUCCESS_ALERT: &str = "You successfully minted a Crypto Dev!";
const EVENT_CHANNEL_CAPACITY: usize = 256;
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub required_chain_id: ChainId,
    pub mint_price: U256,
    pub max_supply: u64,
    /// Zero is raised to [`MIN_POLL_INTERVAL`].
    pub sale_status_interval: Duration,
    /// Zero is raised to [`MIN_POLL_INTERVAL`].
    pub mint_count_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            required_chain_id: REQUIRED_CHAIN_ID,
            mint_price: MINT_PRICE_WEI,
            max_supply: MAX_TOKEN_IDS,
            sale_status_interval: SALE_STATUS_POLL_INTERVAL,
            mint_count_interval: MINT_COUNT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub address: Option<Address>,
    pub sale: SaleState,
    pub presale_ends_at: Option<u64>,
    pub is_owner: bool,
    pub minted: u64,
    pub max_supply: u64,
    pub loading: bool,
}

impl ControllerSnapshot {
    pub fn render_inputs(&self) -> RenderInputs {
        RenderInputs {
            connected: self.address.is_some(),
            loading: self.loading,
            is_owner: self.is_owner,
            presale_started: self.sale.presale_started(),
            presale_ended: self.sale.presale_ended(),
        }
    }

    pub fn affordance(&self) -> Affordance {
        render(self.render_inputs())
    }
}

#[derive(Default)]
struct ControllerState {
    sale: SaleState,
    presale_ends_at: Option<u64>,
    is_owner: bool,
    minted: u64,
    loading: bool,
}

#[derive(Default)]
struct Pollers {
    sale_status: Option<JoinHandle<()>>,
    mint_count: Option<JoinHandle<()>>,
}

/// Drives one mounted sale page: wallet connection, sale-phase polling and
/// the write operations offered by the current phase.
pub struct SaleController {
    session: WalletSession,
    contract: Arc<dyn SaleContract>,
    clock: Arc<dyn Clock>,
    config: ControllerConfig,
    inner: Mutex<ControllerState>,
    pollers: Mutex<Pollers>,
    events: broadcast::Sender<ControllerEvent>,
}

impl SaleController {
    /// Builds a controller without connecting or polling.
    pub fn new(
        session: WalletSession,
        contract: Arc<dyn SaleContract>,
        clock: Arc<dyn Clock>,
        config: ControllerConfig,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            session,
            contract,
            clock,
            config,
            inner: Mutex::new(ControllerState::default()),
            pollers: Mutex::new(Pollers::default()),
            events,
        })
    }

    /// Builds and mounts a controller in one step.
    pub async fn init(
        session: WalletSession,
        contract: Arc<dyn SaleContract>,
        clock: Arc<dyn Clock>,
        config: ControllerConfig,
    ) -> Arc<Self> {
        let controller = Self::new(session, contract, clock, config);
        controller.mount().await;
        controller
    }

    /// Connects the wallet, reads the current sale state once and starts both
    /// pollers. Subscribe before mounting to observe the first round.
    ///
    /// Failures during the first round are reported like any other and leave
    /// the controller usable.
    pub async fn mount(self: &Arc<Self>) {
        let _ = self.connect_wallet().await;
        let sale = self.poll_sale_status().await.unwrap_or_default();
        let _ = self.poll_mint_count().await;
        self.start_polling(!sale.presale_ended()).await;
    }

    /// Unmounts the controller by cancelling both pollers. In-flight
    /// transactions are not cancelled.
    pub async fn dispose(&self) {
        let mut pollers = self.pollers.lock().await;
        for handle in [pollers.sale_status.take(), pollers.mint_count.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
        info!(contract = %self.contract.address(), "sale controller disposed");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub async fn snapshot(&self) -> ControllerSnapshot {
        let address = self.session.address().await;
        let guard = self.inner.lock().await;
        ControllerSnapshot {
            address,
            sale: guard.sale,
            presale_ends_at: guard.presale_ends_at,
            is_owner: guard.is_owner,
            minted: guard.minted,
            max_supply: self.config.max_supply,
            loading: guard.loading,
        }
    }

    pub async fn affordance(&self) -> Affordance {
        self.snapshot().await.affordance()
    }

    pub async fn is_polling_sale_status(&self) -> bool {
        let pollers = self.pollers.lock().await;
        pollers
            .sale_status
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub async fn is_polling_mint_count(&self) -> bool {
        let pollers = self.pollers.lock().await;
        pollers
            .mint_count
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub async fn connect_wallet(&self) -> Result<Address, ControllerError> {
        match self.session.connect(self.config.required_chain_id).await {
            Ok(connection) => {
                if connection.newly_connected {
                    info!(address = %connection.address, "wallet connected");
                    self.emit(ControllerEvent::WalletConnected {
                        address: connection.address,
                    });
                }
                Ok(connection.address)
            }
            Err(err) => {
                if err.is_blocking() {
                    self.emit(ControllerEvent::Alert(err.to_string()));
                }
                self.report(SaleOperation::ConnectWallet, &err);
                Err(err)
            }
        }
    }

    /// Reads the presale flag (and end timestamp once started) and folds the
    /// observation into the recorded phase. Owner status is only resolved
    /// while the presale has not started.
    pub async fn poll_sale_status(&self) -> Result<SaleState, ControllerError> {
        let operation = SaleOperation::PollSaleStatus;
        let started = self
            .contract
            .presale_started()
            .await
            .map_err(|source| self.fail(operation, source))?;

        let presale_end = if started {
            let end = self
                .contract
                .presale_ended()
                .await
                .map_err(|source| self.fail(operation, source))?;
            Some(end)
        } else {
            self.resolve_owner().await;
            None
        };

        let observed = SaleState::classify(started, presale_end, self.clock.now_unix());
        Ok(self.apply_sale_state(observed, presale_end).await)
    }

    pub async fn poll_mint_count(&self) -> Result<u64, ControllerError> {
        let operation = SaleOperation::PollMintCount;
        let minted = self
            .contract
            .token_ids()
            .await
            .map_err(|source| self.fail(operation, source))?;
        if minted > self.config.max_supply {
            return Err(self.fail(
                operation,
                anyhow!(
                    "contract reported {minted} tokens minted, above the supply of {}",
                    self.config.max_supply
                ),
            ));
        }

        let changed = {
            let mut guard = self.inner.lock().await;
            let changed = guard.minted != minted;
            guard.minted = minted;
            changed
        };
        if changed {
            debug!(minted, max_supply = self.config.max_supply, "mint count updated");
            self.emit(ControllerEvent::MintCountUpdated {
                minted,
                max_supply: self.config.max_supply,
            });
        }
        Ok(minted)
    }

    /// Owner-only. Polls the sale status right after confirmation.
    pub async fn start_presale(&self) -> Result<TxReceipt, ControllerError> {
        let receipt = self.submit(SaleOperation::StartPresale).await?;
        let _ = self.poll_sale_status().await;
        Ok(receipt)
    }

    pub async fn presale_mint(&self) -> Result<TxReceipt, ControllerError> {
        let receipt = self.submit(SaleOperation::PresaleMint).await?;
        self.emit(ControllerEvent::Alert(MINT_SUCCESS_ALERT.to_string()));
        Ok(receipt)
    }

    pub async fn public_mint(&self) -> Result<TxReceipt, ControllerError> {
        let receipt = self.submit(SaleOperation::PublicMint).await?;
        self.emit(ControllerEvent::Alert(MINT_SUCCESS_ALERT.to_string()));
        Ok(receipt)
    }

    /// Replaces any pollers left by an earlier mount.
    async fn start_polling(self: &Arc<Self>, include_sale_status: bool) {
        let mut pollers = self.pollers.lock().await;
        for handle in [pollers.sale_status.take(), pollers.mint_count.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
        if include_sale_status {
            pollers.sale_status = Some(self.spawn_sale_status_poller());
        }
        pollers.mint_count = Some(self.spawn_mint_count_poller());
        info!(
            contract = %self.contract.address(),
            sale_status = include_sale_status,
            "sale pollers started"
        );
    }

    fn spawn_sale_status_poller(self: &Arc<Self>) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        let period = poll_period("sale_status", self.config.sale_status_interval);
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Ok(sale) = controller.poll_sale_status().await {
                    if sale.presale_ended() {
                        info!("presale ended; sale status polling stopped");
                        break;
                    }
                }
            }
        })
    }

    fn spawn_mint_count_poller(self: &Arc<Self>) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        let period = poll_period("mint_count", self.config.mint_count_interval);
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let _ = controller.poll_mint_count().await;
            }
        })
    }

    async fn resolve_owner(&self) {
        let Some(address) = self.session.address().await else {
            return;
        };
        let owner = match self.contract.get_owner().await {
            Ok(owner) => owner,
            Err(source) => {
                self.fail(SaleOperation::PollSaleStatus, source);
                return;
            }
        };

        let is_owner = owner == address;
        let changed = {
            let mut guard = self.inner.lock().await;
            let changed = guard.is_owner != is_owner;
            guard.is_owner = is_owner;
            changed
        };
        if changed {
            info!(%address, is_owner, "owner status resolved");
            self.emit(ControllerEvent::OwnerResolved { is_owner });
        }
    }

    async fn apply_sale_state(&self, observed: SaleState, presale_end: Option<u64>) -> SaleState {
        let mut transitions = Vec::new();
        let current = {
            let mut guard = self.inner.lock().await;
            if presale_end.is_some() {
                guard.presale_ends_at = presale_end;
            }
            if observed.settle() < guard.sale {
                warn!(
                    recorded = %guard.sale,
                    %observed,
                    "ignoring sale status older than the recorded phase"
                );
                return guard.sale;
            }
            let advanced = guard.sale.advance(observed);
            if advanced != guard.sale {
                transitions.push((guard.sale, advanced));
            }
            let settled = advanced.settle();
            if settled != advanced {
                transitions.push((advanced, settled));
            }
            guard.sale = settled;
            settled
        };

        for (from, to) in transitions {
            info!(%from, %to, "sale phase changed");
            self.emit(ControllerEvent::PhaseChanged { from, to });
        }
        current
    }

    async fn submit(&self, operation: SaleOperation) -> Result<TxReceipt, ControllerError> {
        let Some(from) = self.session.address().await else {
            let err = ControllerError::NotConnected;
            self.report(operation, &err);
            return Err(err);
        };
        self.begin_loading(operation).await?;

        let outcome = self.send_and_confirm(operation, from).await;
        self.set_loading(false).await;

        match outcome {
            Ok(receipt) => {
                info!(%operation, tx_hash = %receipt.tx_hash, block = ?receipt.block_number, "transaction confirmed");
                self.emit(ControllerEvent::TransactionConfirmed {
                    operation,
                    tx_hash: receipt.tx_hash,
                });
                Ok(receipt)
            }
            Err(source) => Err(self.fail(operation, source)),
        }
    }

    async fn send_and_confirm(
        &self,
        operation: SaleOperation,
        from: Address,
    ) -> anyhow::Result<TxReceipt> {
        let price = self.config.mint_price;
        let tx_hash = match operation {
            SaleOperation::StartPresale => self.contract.start_presale(from).await?,
            SaleOperation::PresaleMint => self.contract.presale_mint(from, price).await?,
            SaleOperation::PublicMint => self.contract.mint(from, price).await?,
            other => bail!("{other} is not a write operation"),
        };
        info!(%operation, %tx_hash, %from, "transaction submitted; waiting for confirmation");
        self.contract.wait_for_confirmation(tx_hash).await
    }

    async fn begin_loading(&self, operation: SaleOperation) -> Result<(), ControllerError> {
        {
            let mut guard = self.inner.lock().await;
            if guard.loading {
                drop(guard);
                let err = ControllerError::Busy;
                self.report(operation, &err);
                return Err(err);
            }
            guard.loading = true;
        }
        self.emit(ControllerEvent::LoadingChanged(true));
        Ok(())
    }

    async fn set_loading(&self, loading: bool) {
        self.inner.lock().await.loading = loading;
        self.emit(ControllerEvent::LoadingChanged(loading));
    }

    fn fail(&self, operation: SaleOperation, source: anyhow::Error) -> ControllerError {
        let err = ControllerError::transaction(operation, source);
        self.report(operation, &err);
        err
    }

    fn report(&self, operation: SaleOperation, err: &ControllerError) {
        if operation.is_write() {
            error!(%operation, error = %err, "sale operation failed");
        } else {
            warn!(%operation, error = %err, "sale operation failed");
        }
        self.emit(ControllerEvent::OperationFailed(FailureReport::new(
            err.kind(),
            operation,
            err.to_string(),
        )));
    }

    fn emit(&self, event: ControllerEvent) {
        let _ = self.events.send(event);
    }
}

fn poll_period(poller: &'static str, configured: Duration) -> Duration {
    if configured < MIN_POLL_INTERVAL {
        warn!(poller, ?configured, "poll interval too small; using the minimum");
        return MIN_POLL_INTERVAL;
    }
    configured
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
