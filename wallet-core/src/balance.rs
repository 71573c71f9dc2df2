//! Identity balances and portfolio totals

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{WalletError, WalletResult};
use crate::quorum::{QuorumPolicy, QuorumResult};
use crate::serde_helpers::int_from_str_or_number;

/// One peer's report of an identity's balance at a tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerReport {
    pub tick: u64,
    /// Peer address as reported by the node
    pub peer: String,
    /// Reported value, kept verbatim for comparison
    pub value: String,
}

impl PeerReport {
    /// Split the node's flat `[tick, peer, value, tick, peer, value, ...]` list.
    ///
    /// A trailing incomplete triple is ignored.
    pub fn from_flat<S: AsRef<str>>(flat: &[S]) -> WalletResult<Vec<PeerReport>> {
        flat.chunks_exact(3)
            .map(|chunk| {
                let tick_raw = chunk[0].as_ref();
                let tick = tick_raw.trim().parse::<u64>().map_err(|e| {
                    WalletError::parse(format!("Invalid tick '{}' in balance report: {}", tick_raw, e))
                })?;
                Ok(PeerReport {
                    tick,
                    peer: chunk[1].as_ref().to_string(),
                    value: chunk[2].as_ref().to_string(),
                })
            })
            .collect()
    }
}

/// Display-level balance outcome for one identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BalanceStatus {
    /// No peer has reported this identity yet
    Unreported,
    /// Enough peers agree on the balance
    Confirmed {
        tick: u64,
        balance: i64,
        peers: usize,
    },
    /// Peers disagree, or too few of them answered
    Mismatch { tick: u64, reports: Vec<PeerReport> },
}

impl BalanceStatus {
    /// Reconcile a set of peer reports under the given policy
    pub fn resolve(reports: &[PeerReport], policy: &QuorumPolicy) -> Self {
        let Some(tick) = reports.iter().map(|r| r.tick).max() else {
            return BalanceStatus::Unreported;
        };

        let values: Vec<&str> = reports.iter().map(|r| r.value.as_str()).collect();
        match policy.resolve(&values) {
            QuorumResult::Agreed(balance) => BalanceStatus::Confirmed {
                tick,
                balance,
                peers: reports.len(),
            },
            QuorumResult::NoQuorum => BalanceStatus::Mismatch {
                tick,
                reports: reports.to_vec(),
            },
        }
    }

    /// The confirmed balance, if any
    pub fn confirmed(&self) -> Option<i64> {
        match self {
            BalanceStatus::Confirmed { balance, .. } => Some(*balance),
            _ => None,
        }
    }

    /// Short label for tables ("1,200", "Not Yet Reported", "Peer Balance Mismatch")
    pub fn label(&self) -> String {
        match self {
            BalanceStatus::Unreported => "Not Yet Reported".to_string(),
            BalanceStatus::Confirmed { balance, .. } => group_thousands(*balance),
            BalanceStatus::Mismatch { .. } => "Peer Balance Mismatch".to_string(),
        }
    }
}

/// A wallet identity known to the node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// 60-character public identity
    pub address: String,
    /// Whether the seed is stored encrypted under the master password
    pub encrypted: bool,
}

impl Identity {
    /// Parse the node's flat `[address, "true"|"false", ...]` list
    pub fn from_flat<S: AsRef<str>>(flat: &[S]) -> Vec<Identity> {
        flat.chunks_exact(2)
            .map(|pair| Identity {
                address: pair[0].as_ref().to_string(),
                encrypted: pair[1].as_ref().trim().eq_ignore_ascii_case("true"),
            })
            .collect()
    }
}

/// Balance of an issued asset held by an identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalance {
    pub name: String,
    #[serde(deserialize_with = "int_from_str_or_number")]
    pub balance: i64,
}

/// An asset issued on the network, with its issuer identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedAsset {
    pub name: String,
    pub issuer: String,
}

impl IssuedAsset {
    /// Parse the node's flat `[name, issuer, name, issuer, ...]` list
    pub fn from_flat<S: AsRef<str>>(flat: &[S]) -> Vec<IssuedAsset> {
        flat.chunks_exact(2)
            .map(|pair| IssuedAsset {
                name: pair[0].as_ref().to_string(),
                issuer: pair[1].as_ref().to_string(),
            })
            .collect()
    }
}

/// An identity with its resolved balances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub identity: Identity,
    pub balance: BalanceStatus,
    #[serde(default)]
    pub assets: Vec<AssetBalance>,
}

/// Totals across all identities in the wallet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioTotals {
    /// Sum of confirmed balances only
    pub total_balance: i64,
    /// Identities whose balance is not confirmed
    pub unconfirmed_identities: usize,
    /// Asset name -> summed balance
    pub by_asset: BTreeMap<String, i64>,
}

impl PortfolioTotals {
    /// Compute totals from identity summaries
    pub fn from_identities(identities: &[IdentitySummary]) -> Self {
        let mut totals = PortfolioTotals::default();

        for summary in identities {
            match summary.balance.confirmed() {
                Some(balance) => totals.total_balance = totals.total_balance.saturating_add(balance),
                None => totals.unconfirmed_identities += 1,
            }

            for asset in &summary.assets {
                let entry = totals.by_asset.entry(asset.name.clone()).or_insert(0);
                *entry = entry.saturating_add(asset.balance);
            }
        }

        totals
    }
}

/// Format an integer with comma thousands separators
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
