//! Core types for the ledger wallet client
//!
//! This crate defines the shared data structures used across the client,
//! including identities, peer balance reports, order books and transfer
//! records, plus the two pieces of reconciliation logic the views rely on:
//! the peer-balance quorum check and same-price run reversal.

pub mod balance;
pub mod error;
pub mod orderbook;
pub mod peer;
pub mod quorum;
pub mod serde_helpers;
pub mod snapshot;
pub mod transfer;

pub use balance::{
    group_thousands, AssetBalance, BalanceStatus, Identity, IdentitySummary, IssuedAsset,
    PeerReport, PortfolioTotals,
};
pub use error::{WalletError, WalletResult};
pub use orderbook::{reverse_same_price_groups, OrderBook, OrderLevel, OrderSide};
pub use peer::{Peer, PeerLimits};
pub use quorum::{resolve_quorum, QuorumPolicy, QuorumResult};
pub use snapshot::{MarketPrice, WalletSnapshot};
pub use transfer::{Transfer, TransferStatus};
