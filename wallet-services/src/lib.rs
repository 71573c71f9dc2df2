//! Services for the ledger wallet client
//!
//! This crate polls the node, resolves every identity's balance through the
//! peer quorum, and publishes immutable snapshots for the local API.

pub mod balance_resolver;
pub mod health;
pub mod poller;

#[cfg(test)]
mod test_support;

pub use balance_resolver::{resolve_identities, resolve_identity};
pub use health::{ConnectionHealth, ConnectionMetrics};
pub use poller::{PollerConfig, Selection, WalletPoller};
