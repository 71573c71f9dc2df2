//! Peer definitions

use serde::{Deserialize, Serialize};

use crate::error::{WalletError, WalletResult};

/// Number of positional columns in a node peer row
const PEER_COLUMNS: usize = 8;

/// A network peer the node is connected to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub id: String,
    pub ip: String,
    pub nick: String,
    /// Raw whitelist flag; `-1` marks a peer the node will not reconnect to
    pub whitelisted: i64,
    /// Last measured round trip in milliseconds
    pub ping: i64,
    /// Unix time of the last response
    pub last_responded: i64,
    pub created: String,
    pub connected: bool,
}

impl Peer {
    /// Parse a positional row:
    /// `[id, ip, nick, whitelisted, ping, last_responded, created, connected]`
    pub fn from_row<S: AsRef<str>>(row: &[S]) -> WalletResult<Self> {
        if row.len() < PEER_COLUMNS {
            return Err(WalletError::parse(format!(
                "Peer row has {} columns, expected {}",
                row.len(),
                PEER_COLUMNS
            )));
        }

        let col = |i: usize| row[i].as_ref().trim();
        let int = |i: usize, name: &str| -> WalletResult<i64> {
            let raw = col(i);
            if raw.is_empty() {
                return Ok(0);
            }
            raw.parse::<i64>()
                .map_err(|e| WalletError::parse(format!("Invalid peer {} '{}': {}", name, raw, e)))
        };

        Ok(Peer {
            id: col(0).to_string(),
            ip: col(1).to_string(),
            nick: col(2).to_string(),
            whitelisted: int(3, "whitelisted")?,
            ping: int(4, "ping")?,
            last_responded: int(5, "last_responded")?,
            created: col(6).to_string(),
            connected: matches!(col(7), "1" | "true" | "TRUE" | "True"),
        })
    }
}

/// Bounds on how many peers the node keeps connected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerLimits {
    pub min: u32,
    pub max: u32,
}

impl PeerLimits {
    pub fn new(min: u32, max: u32) -> WalletResult<Self> {
        if min > max {
            return Err(WalletError::validation(format!(
                "Minimum peers ({}) cannot exceed maximum ({})",
                min, max
            )));
        }
        Ok(Self { min, max })
    }
}
