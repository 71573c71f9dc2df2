//! Wallet Poller
//!
//! Background service that keeps an up-to-date view of the wallet. Two loops
//! run on fixed intervals: a fast one tracking the latest tick and a slower
//! one rebuilding the full snapshot. Snapshots are published whole through a
//! watch channel, so readers never observe a half-built state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use wallet_core::{
    BalanceStatus, Identity, IdentitySummary, IssuedAsset, MarketPrice, OrderBook, OrderSide, PortfolioTotals,
    QuorumPolicy, WalletResult, WalletSnapshot,
};
use wallet_node::validate::validate_asset_name;
use wallet_node::{HistoryPage, NodeApi, PriceClient};

use crate::balance_resolver::resolve_identities;
use crate::health::{ConnectionHealth, ConnectionMetrics};

/// Configuration for the wallet poller
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// How often to refresh the latest tick
    pub tick_interval: Duration,
    /// How often to rebuild the full snapshot
    pub snapshot_interval: Duration,
    /// How long a fetched coin price stays fresh
    pub price_refresh: Duration,
    /// Agreement rule for peer balance reports
    pub quorum: QuorumPolicy,
    /// Levels fetched per order book side
    pub orderbook_limit: u32,
    /// Paging for the transfer and asset transfer lists
    pub history: HistoryPage,
    /// Paging for the QX order list
    pub orders_page: HistoryPage,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(1000),
            snapshot_interval: Duration::from_millis(3000),
            price_refresh: Duration::from_secs(60),
            quorum: QuorumPolicy::default(),
            orderbook_limit: 1000,
            history: HistoryPage::all(),
            orders_page: HistoryPage::oldest_first(1000),
        }
    }
}

/// What the UI is currently looking at.
///
/// Until the UI picks an asset, the alphabetically first issued asset is
/// selected; clearing the selection explicitly turns that off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Asset whose order book is polled
    pub asset: Option<String>,
}

/// Polls the node and publishes wallet snapshots
pub struct WalletPoller {
    node: Arc<dyn NodeApi>,
    price_feed: Option<PriceClient>,
    config: PollerConfig,
    metrics: ConnectionMetrics,
    selection: RwLock<Selection>,
    auto_select: AtomicBool,
    /// Held for a whole snapshot cycle so cycles publish in selection order
    refresh_lock: Mutex<()>,
    tick_tx: watch::Sender<Option<u64>>,
    snapshot_tx: watch::Sender<Arc<WalletSnapshot>>,
}

impl WalletPoller {
    pub fn new(node: Arc<dyn NodeApi>, config: PollerConfig) -> Self {
        let (tick_tx, _) = watch::channel(None);
        let (snapshot_tx, _) = watch::channel(Arc::new(WalletSnapshot::empty()));

        Self {
            node,
            price_feed: None,
            config,
            metrics: ConnectionMetrics::new(),
            selection: RwLock::new(Selection::default()),
            auto_select: AtomicBool::new(true),
            refresh_lock: Mutex::new(()),
            tick_tx,
            snapshot_tx,
        }
    }

    /// Enable USD valuation
    pub fn with_price_feed(mut self, price_feed: PriceClient) -> Self {
        self.price_feed = Some(price_feed);
        self
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    // ========================================================================
    // Readers
    // ========================================================================

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<WalletSnapshot> {
        self.snapshot_tx.borrow().clone()
    }

    /// Receive every snapshot as it is published
    pub fn subscribe(&self) -> watch::Receiver<Arc<WalletSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Latest tick from the fast loop, falling back to the last snapshot
    pub fn latest_tick(&self) -> Option<u64> {
        let tick = *self.tick_tx.borrow();
        tick.or_else(|| self.snapshot().latest_tick)
    }

    pub fn health(&self) -> ConnectionHealth {
        self.metrics.health()
    }

    pub async fn selection(&self) -> Selection {
        self.selection.read().await.clone()
    }

    /// Change the asset whose order book is polled; `None` clears it
    pub async fn select_asset(&self, asset: Option<&str>) -> WalletResult<Selection> {
        let asset = match asset.map(str::trim) {
            None | Some("") => None,
            Some(name) => {
                validate_asset_name(name)?;
                Some(name.to_uppercase())
            }
        };

        let mut selection = self.selection.write().await;
        self.auto_select.store(false, Ordering::SeqCst);
        selection.asset = asset;
        info!("Selected asset: {:?}", selection.asset);
        Ok(selection.clone())
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    /// Fetch the latest tick.
    ///
    /// A failure marks the connection down right away; only a complete
    /// snapshot cycle marks it up again.
    pub async fn refresh_tick(&self) -> Option<u64> {
        match self.node.latest_tick().await {
            Ok(tick) => {
                self.tick_tx.send_replace(Some(tick));
                Some(tick)
            }
            Err(e) => {
                self.metrics.record_failure();
                warn!("Failed to fetch latest tick: {}", e);
                None
            }
        }
    }

    /// Rebuild and publish a full snapshot.
    ///
    /// A section whose read fails keeps the previous snapshot's data and marks
    /// the connection down for this cycle.
    pub async fn refresh_snapshot(&self) -> Arc<WalletSnapshot> {
        let _cycle = self.refresh_lock.lock().await;
        let previous = self.snapshot();
        let selection = self.selection().await;
        let page = self.config.history;
        let node = self.node.as_ref();

        let (tick, peers, identities, issued, transfers, asset_transfers, qx_orders) = tokio::join!(
            node.latest_tick(),
            node.peers(),
            node.identities(),
            node.issued_assets(),
            node.transfers(page),
            node.asset_transfers(page),
            node.qx_orders(self.config.orders_page),
        );

        let mut failed = false;

        let latest_tick = keep_on_error("tick", tick.map(Some), &previous.latest_tick, &mut failed);
        let peers = keep_on_error("peers", peers, &previous.peers, &mut failed);
        let issued_assets = keep_on_error("issued assets", issued, &previous.issued_assets, &mut failed);
        let transfers = keep_on_error("transfers", transfers, &previous.transfers, &mut failed);
        let asset_transfers = keep_on_error(
            "asset transfers",
            asset_transfers,
            &previous.asset_transfers,
            &mut failed,
        );
        let qx_orders = keep_on_error("qx orders", qx_orders, &previous.qx_orders, &mut failed);

        let identities = match identities {
            Ok(identities) => self.summarize(identities, &previous, &mut failed).await,
            Err(e) => {
                warn!("Failed to fetch identities: {}", e);
                failed = true;
                previous.identities.clone()
            }
        };

        let selected = match selection.asset {
            Some(asset) => Some(asset),
            None => self.default_asset(&issued_assets).await,
        };

        let orderbook = match selected.as_deref() {
            Some(asset) => match self.fetch_orderbook(asset).await {
                Ok(book) => Some(book),
                Err(e) => {
                    warn!("Failed to fetch {} order book: {}", asset, e);
                    failed = true;
                    previous
                        .orderbook
                        .clone()
                        .filter(|book| book.asset == asset)
                }
            },
            None => None,
        };

        let price = self.current_price(previous.price.as_ref()).await;
        let totals = PortfolioTotals::from_identities(&identities);
        let total_value_usd = price.as_ref().map(|p| p.value_of(totals.total_balance));

        if failed {
            self.metrics.record_failure();
        } else {
            self.metrics.record_success();
            if let Some(tick) = latest_tick {
                self.tick_tx.send_replace(Some(tick));
            }
        }

        let snapshot = Arc::new(WalletSnapshot {
            latest_tick,
            connected: !failed,
            peers,
            identities,
            totals,
            issued_assets,
            transfers,
            asset_transfers,
            qx_orders,
            orderbook,
            price,
            total_value_usd,
            updated_at: Utc::now(),
        });

        debug!(
            "Published snapshot: tick={:?} identities={} connected={}",
            snapshot.latest_tick,
            snapshot.identities.len(),
            snapshot.connected
        );

        self.snapshot_tx.send_replace(snapshot.clone());
        snapshot
    }

    /// Resolve balances; an identity whose reads fail keeps its previous summary
    async fn summarize(
        &self,
        identities: Vec<Identity>,
        previous: &WalletSnapshot,
        failed: &mut bool,
    ) -> Vec<IdentitySummary> {
        let resolved = resolve_identities(self.node.as_ref(), identities, &self.config.quorum).await;

        resolved
            .into_iter()
            .map(|(identity, result)| match result {
                Ok(summary) => summary,
                Err(e) => {
                    warn!("Failed to resolve balance for {}: {}", identity.address, e);
                    *failed = true;
                    previous
                        .identity(&identity.address)
                        .cloned()
                        .unwrap_or(IdentitySummary {
                            identity,
                            balance: BalanceStatus::Unreported,
                            assets: Vec::new(),
                        })
                }
            })
            .collect()
    }

    /// Select the alphabetically first issued asset when nothing is selected yet
    async fn default_asset(&self, issued: &[IssuedAsset]) -> Option<String> {
        if !self.auto_select.load(Ordering::SeqCst) {
            return None;
        }
        let first = issued.iter().map(|a| a.name.to_uppercase()).min()?;

        let mut selection = self.selection.write().await;
        if selection.asset.is_none() && self.auto_select.load(Ordering::SeqCst) {
            info!("Defaulting selected asset to {}", first);
            selection.asset = Some(first);
        }
        selection.asset.clone()
    }

    async fn fetch_orderbook(&self, asset: &str) -> WalletResult<OrderBook> {
        let limit = self.config.orderbook_limit;
        let (asks, bids) = tokio::join!(
            self.node.orderbook_side(asset, OrderSide::Ask, limit, 0),
            self.node.orderbook_side(asset, OrderSide::Bid, limit, 0),
        );
        Ok(OrderBook::from_node_rows(asset, asks?, bids?))
    }

    /// Reuse the last price until it ages out; feed errors never affect health
    async fn current_price(&self, previous: Option<&MarketPrice>) -> Option<MarketPrice> {
        let feed = self.price_feed.as_ref()?;

        if let Some(price) = previous {
            let age = Utc::now().signed_duration_since(price.fetched_at);
            if age.to_std().map(|age| age < self.config.price_refresh).unwrap_or(true) {
                return Some(price.clone());
            }
        }

        match feed.fetch_usd().await {
            Ok(price) => Some(price),
            Err(e) => {
                warn!("Failed to fetch coin price: {}", e);
                previous.cloned()
            }
        }
    }

    // ========================================================================
    // Background loops
    // ========================================================================

    /// Spawn the tick and snapshot loops
    pub fn start(self: Arc<Self>) -> (JoinHandle<()>, JoinHandle<()>) {
        info!(
            "Starting wallet poller (tick every {:?}, snapshot every {:?})",
            self.config.tick_interval, self.config.snapshot_interval
        );

        let tick_poller = self.clone();
        let tick_task = tokio::spawn(async move {
            let mut ticker = interval(tick_poller.config.tick_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tick_poller.refresh_tick().await;
            }
        });

        let snapshot_task = tokio::spawn(async move {
            let mut ticker = interval(self.config.snapshot_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.refresh_snapshot().await;
            }
        });

        (tick_task, snapshot_task)
    }
}

fn keep_on_error<T: Clone>(
    section: &str,
    result: WalletResult<T>,
    previous: &T,
    failed: &mut bool,
) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to fetch {}: {}", section, e);
            *failed = true;
            previous.clone()
        }
    }
}

impl std::fmt::Debug for WalletPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletPoller")
            .field("config", &self.config)
            .field("connected", &self.metrics.is_connected())
            .finish()
    }
}
