//! Immutable wallet state published to the UI after each poll cycle

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::balance::{IdentitySummary, IssuedAsset, PortfolioTotals};
use crate::orderbook::OrderBook;
use crate::peer::Peer;
use crate::transfer::Transfer;

/// Price of the native coin on an external market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPrice {
    pub usd: Decimal,
    pub fetched_at: DateTime<Utc>,
}

impl MarketPrice {
    /// USD value of a native-coin amount
    pub fn value_of(&self, amount: i64) -> Decimal {
        self.usd * Decimal::from(amount)
    }
}

/// Everything the UI renders, captured in one poll cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSnapshot {
    /// Latest tick the node has seen
    pub latest_tick: Option<u64>,
    /// Whether the last request to the node succeeded
    pub connected: bool,
    pub peers: Vec<Peer>,
    pub identities: Vec<IdentitySummary>,
    pub totals: PortfolioTotals,
    pub issued_assets: Vec<IssuedAsset>,
    pub transfers: Vec<Transfer>,
    pub asset_transfers: Vec<Transfer>,
    pub qx_orders: Vec<Transfer>,
    /// Order book for the selected asset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orderbook: Option<OrderBook>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<MarketPrice>,
    /// Confirmed total balance in USD, when a price is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_value_usd: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

impl WalletSnapshot {
    /// Snapshot before the first poll completes
    pub fn empty() -> Self {
        Self {
            latest_tick: None,
            connected: false,
            peers: Vec::new(),
            identities: Vec::new(),
            totals: PortfolioTotals::default(),
            issued_assets: Vec::new(),
            transfers: Vec::new(),
            asset_transfers: Vec::new(),
            qx_orders: Vec::new(),
            orderbook: None,
            price: None,
            total_value_usd: None,
            updated_at: Utc::now(),
        }
    }

    /// Find an identity's summary
    pub fn identity(&self, address: &str) -> Option<&IdentitySummary> {
        self.identities
            .iter()
            .find(|s| s.identity.address == address)
    }

    /// Issuer of an asset, if the node lists it
    pub fn issuer_of(&self, asset: &str) -> Option<&str> {
        self.issued_assets
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(asset))
            .map(|a| a.issuer.as_str())
    }
}

impl Default for WalletSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::{BalanceStatus, Identity};

    #[test]
    fn test_market_price_value() {
        let price = MarketPrice {
            usd: Decimal::new(25, 7), // 0.0000025
            fetched_at: Utc::now(),
        };
        assert_eq!(price.value_of(1_000_000), Decimal::new(25, 1));
    }

    #[test]
    fn test_lookup_helpers() {
        let mut snapshot = WalletSnapshot::empty();
        snapshot.identities.push(IdentitySummary {
            identity: Identity { address: "ABC".into(), encrypted: false },
            balance: BalanceStatus::Unreported,
            assets: vec![],
        });
        snapshot.issued_assets.push(IssuedAsset { name: "QX".into(), issuer: "ISSUER".into() });

        assert!(snapshot.identity("ABC").is_some());
        assert!(snapshot.identity("XYZ").is_none());
        assert_eq!(snapshot.issuer_of("qx"), Some("ISSUER"));
    }
}
