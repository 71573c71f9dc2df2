//! QX order book types and display ordering

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::serde_helpers::int_from_str_or_number;

/// Side of the order book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Ask,
    Bid,
}

impl OrderSide {
    /// Path segment used by the node API
    pub fn as_path(&self) -> &'static str {
        match self {
            OrderSide::Ask => "ASK",
            OrderSide::Bid => "BID",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_path())
    }
}

impl std::str::FromStr for OrderSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ASK" | "SELL" => Ok(OrderSide::Ask),
            "BID" | "BUY" => Ok(OrderSide::Bid),
            _ => Err(format!("Unknown order side: {}", s)),
        }
    }
}

/// A resting order in the book
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderLevel {
    /// Price per share
    #[serde(deserialize_with = "int_from_str_or_number")]
    pub price: i64,
    /// Number of shares resting at this price for this entity
    #[serde(alias = "num_shares", deserialize_with = "int_from_str_or_number")]
    pub quantity: i64,
    /// Identity that placed the order
    #[serde(alias = "entity_id")]
    pub entity: String,
}

impl OrderLevel {
    pub fn new(price: i64, quantity: i64, entity: impl Into<String>) -> Self {
        Self {
            price,
            quantity,
            entity: entity.into(),
        }
    }
}

/// Reverse the order of every contiguous run of equal-price levels.
///
/// Which price groups appear, and in which order, is left untouched; only the
/// entries inside each group are flipped. Applying it twice restores the input.
pub fn reverse_same_price_groups(levels: &[OrderLevel]) -> Vec<OrderLevel> {
    levels
        .chunk_by(|a, b| a.price == b.price)
        .flat_map(|run| run.iter().rev().cloned())
        .collect()
}

/// Order book for one asset, arranged for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
    /// Asset name (e.g. "QX", "CFB")
    pub asset: String,
    /// Asks, highest price first
    pub asks: Vec<OrderLevel>,
    /// Bids, in the order the node returned them (best bid first)
    pub bids: Vec<OrderLevel>,
    /// When the rows were fetched
    pub timestamp: DateTime<Utc>,
}

impl OrderBook {
    /// Create an empty order book
    pub fn new(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            asks: Vec::new(),
            bids: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Build a display book from the node's raw rows.
    ///
    /// The node lists asks best (lowest) first. For a price ladder the asks
    /// sit above the bids, so they are flipped to highest-first, and each
    /// same-price run is flipped back so entries at one price keep node order.
    pub fn from_node_rows(
        asset: impl Into<String>,
        raw_asks: Vec<OrderLevel>,
        raw_bids: Vec<OrderLevel>,
    ) -> Self {
        let mut asks = raw_asks;
        asks.reverse();

        Self {
            asset: asset.into(),
            asks: reverse_same_price_groups(&asks),
            bids: raw_bids,
            timestamp: Utc::now(),
        }
    }

    /// Lowest ask price
    pub fn best_ask(&self) -> Option<i64> {
        self.asks.iter().map(|l| l.price).min()
    }

    /// Highest bid price
    pub fn best_bid(&self) -> Option<i64> {
        self.bids.iter().map(|l| l.price).max()
    }

    /// Best ask minus best bid
    pub fn spread(&self) -> Option<i64> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some(ask - bid),
            _ => None,
        }
    }
}
