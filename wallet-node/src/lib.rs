//! Ledger node client
//!
//! HTTP client for the wallet node's API plus the coin price feed.

pub mod api;
pub mod client;
pub mod price;
pub mod types;
pub mod validate;

pub use api::{HistoryPage, NodeApi};
pub use client::{NodeClient, DEFAULT_NODE_URL, DEFAULT_TIMEOUT_MS};
pub use price::PriceClient;
pub use types::{AssetTransferRequest, NodeReply, QxOrderAction, QxOrderRequest, TransferRequest};
