//! In-memory node used by service tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

use wallet_core::{
    AssetBalance, Identity, IssuedAsset, OrderLevel, OrderSide, Peer, PeerReport, Transfer,
    WalletError, WalletResult,
};
use wallet_node::{HistoryPage, NodeApi};

#[derive(Default)]
pub struct FakeNode {
    failing: AtomicBool,
    tick: AtomicU64,
    identities: Mutex<Vec<Identity>>,
    reports: Mutex<HashMap<String, Vec<PeerReport>>>,
    assets: Mutex<HashMap<String, Vec<AssetBalance>>>,
    issued: Mutex<Vec<IssuedAsset>>,
    asks: Mutex<Vec<OrderLevel>>,
    bids: Mutex<Vec<OrderLevel>>,
    orders_page: Mutex<Option<HistoryPage>>,
    paused: AtomicBool,
    parked: AtomicUsize,
    resume: Notify,
}

impl FakeNode {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_tick(&self, tick: u64) {
        self.tick.store(tick, Ordering::SeqCst);
    }

    pub fn add_identity(&self, address: &str) {
        self.identities.lock().unwrap().push(Identity {
            address: address.to_string(),
            encrypted: false,
        });
    }

    pub fn set_reports(&self, address: &str, reports: Vec<PeerReport>) {
        self.reports
            .lock()
            .unwrap()
            .insert(address.to_string(), reports);
    }

    pub fn set_assets(&self, address: &str, assets: Vec<AssetBalance>) {
        self.assets
            .lock()
            .unwrap()
            .insert(address.to_string(), assets);
    }

    pub fn set_book(&self, asks: Vec<OrderLevel>, bids: Vec<OrderLevel>) {
        *self.asks.lock().unwrap() = asks;
        *self.bids.lock().unwrap() = bids;
    }

    pub fn set_issued(&self, names: &[&str]) {
        *self.issued.lock().unwrap() = names
            .iter()
            .map(|name| IssuedAsset {
                name: name.to_string(),
                issuer: "A".repeat(60),
            })
            .collect();
    }

    /// Paging of the last QX order history read
    pub fn orders_page(&self) -> Option<HistoryPage> {
        *self.orders_page.lock().unwrap()
    }

    /// Hold tick reads until [`FakeNode::resume`]
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.resume.notify_waiters();
    }

    /// Number of tick reads currently held
    pub fn parked(&self) -> usize {
        self.parked.load(Ordering::SeqCst)
    }

    async fn wait_while_paused(&self) {
        loop {
            let resumed = self.resume.notified();
            if !self.paused.load(Ordering::SeqCst) {
                return;
            }
            self.parked.fetch_add(1, Ordering::SeqCst);
            resumed.await;
            self.parked.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn check(&self) -> WalletResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(WalletError::network("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl NodeApi for FakeNode {
    async fn latest_tick(&self) -> WalletResult<u64> {
        self.wait_while_paused().await;
        self.check()?;
        Ok(self.tick.load(Ordering::SeqCst))
    }

    async fn peers(&self) -> WalletResult<Vec<Peer>> {
        self.check()?;
        Ok(Vec::new())
    }

    async fn identities(&self) -> WalletResult<Vec<Identity>> {
        self.check()?;
        Ok(self.identities.lock().unwrap().clone())
    }

    async fn balance_reports(&self, address: &str) -> WalletResult<Vec<PeerReport>> {
        self.check()?;
        Ok(self
            .reports
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    async fn asset_balances(&self, address: &str) -> WalletResult<Vec<AssetBalance>> {
        self.check()?;
        Ok(self
            .assets
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    async fn issued_assets(&self) -> WalletResult<Vec<IssuedAsset>> {
        self.check()?;
        Ok(self.issued.lock().unwrap().clone())
    }

    async fn transfers(&self, _page: HistoryPage) -> WalletResult<Vec<Transfer>> {
        self.check()?;
        Ok(Vec::new())
    }

    async fn asset_transfers(&self, _page: HistoryPage) -> WalletResult<Vec<Transfer>> {
        self.check()?;
        Ok(Vec::new())
    }

    async fn qx_orders(&self, page: HistoryPage) -> WalletResult<Vec<Transfer>> {
        *self.orders_page.lock().unwrap() = Some(page);
        self.check()?;
        Ok(Vec::new())
    }

    async fn orderbook_side(
        &self,
        _asset: &str,
        side: OrderSide,
        _limit: u32,
        _offset: u32,
    ) -> WalletResult<Vec<OrderLevel>> {
        self.check()?;
        let levels = match side {
            OrderSide::Ask => self.asks.lock().unwrap().clone(),
            OrderSide::Bid => self.bids.lock().unwrap().clone(),
        };
        Ok(levels)
    }
}
