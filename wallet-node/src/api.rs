//! Read-side abstraction over the node API
//!
//! Services depend on this trait rather than on [`NodeClient`] directly so
//! polling can run against any node implementation.
//!
//! [`NodeClient`]: crate::NodeClient

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wallet_core::{
    AssetBalance, Identity, IssuedAsset, OrderLevel, OrderSide, Peer, PeerReport, Transfer,
    WalletResult,
};

/// Paging for history endpoints (`{asc}/{limit}/{offset}`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPage {
    /// Oldest first when true
    pub ascending: bool,
    /// Zero means no limit
    pub limit: u32,
    pub offset: u32,
}

impl HistoryPage {
    /// Newest first, unlimited
    pub fn all() -> Self {
        Self {
            ascending: false,
            limit: 0,
            offset: 0,
        }
    }

    pub fn oldest_first(limit: u32) -> Self {
        Self {
            ascending: true,
            limit,
            offset: 0,
        }
    }

    /// Path segments in node order
    pub fn segments(&self) -> [String; 3] {
        [
            u8::from(self.ascending).to_string(),
            self.limit.to_string(),
            self.offset.to_string(),
        ]
    }
}

impl Default for HistoryPage {
    fn default() -> Self {
        Self::all()
    }
}

/// Read operations the wallet polls for
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Latest tick the node has observed
    async fn latest_tick(&self) -> WalletResult<u64>;

    /// Currently connected peers
    async fn peers(&self) -> WalletResult<Vec<Peer>>;

    /// Identities stored in the wallet
    async fn identities(&self) -> WalletResult<Vec<Identity>>;

    /// Per-peer balance reports for an identity at the newest tick with at least two reporters
    async fn balance_reports(&self, address: &str) -> WalletResult<Vec<PeerReport>>;

    /// Non-zero asset balances for an identity
    async fn asset_balances(&self, address: &str) -> WalletResult<Vec<AssetBalance>>;

    /// Assets issued on the network
    async fn issued_assets(&self) -> WalletResult<Vec<IssuedAsset>>;

    /// Native transfers created by this wallet
    async fn transfers(&self, page: HistoryPage) -> WalletResult<Vec<Transfer>>;

    /// Asset transfers created by this wallet
    async fn asset_transfers(&self, page: HistoryPage) -> WalletResult<Vec<Transfer>>;

    /// QX orders created by this wallet
    async fn qx_orders(&self, page: HistoryPage) -> WalletResult<Vec<Transfer>>;

    /// One side of an asset's order book, in node order
    async fn orderbook_side(
        &self,
        asset: &str,
        side: OrderSide,
        limit: u32,
        offset: u32,
    ) -> WalletResult<Vec<OrderLevel>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_page_segments() {
        assert_eq!(HistoryPage::all().segments(), ["0", "0", "0"]);
        assert_eq!(HistoryPage::oldest_first(1000).segments(), ["1", "1000", "0"]);
    }
}
