//! Node API response types and reply classification
//!
//! The node answers reads with JSON (mostly arrays of strings) and writes with
//! a short plain-text message. These helpers turn both into typed values.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wallet_core::{PeerLimits, WalletError, WalletResult};

/// Response from GET /peers/limit
#[derive(Debug, Clone, Deserialize)]
pub struct PeerLimitsResponse {
    #[serde(deserialize_with = "wallet_core::serde_helpers::int_from_str_or_number")]
    pub min: u32,
    #[serde(deserialize_with = "wallet_core::serde_helpers::int_from_str_or_number")]
    pub max: u32,
}

impl PeerLimitsResponse {
    pub fn to_peer_limits(&self) -> PeerLimits {
        PeerLimits {
            min: self.min,
            max: self.max,
        }
    }
}

/// Password segment sent when the wallet is not encrypted
pub const NO_PASSWORD: &str = "0";

/// A native-coin transfer to sign and broadcast
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub source: String,
    pub destination: String,
    pub amount: i64,
    /// Tick after which the transfer is dropped
    pub expiration_tick: u64,
    #[serde(default)]
    pub password: Option<String>,
}

/// An asset transfer to sign and broadcast
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransferRequest {
    pub asset: String,
    /// Identity that issued the asset
    pub issuer: String,
    pub source: String,
    pub destination: String,
    /// Number of shares
    pub amount: i64,
    pub expiration_tick: u64,
    #[serde(default)]
    pub password: Option<String>,
}

/// QX procedure to invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QxOrderAction {
    Ask,
    Bid,
    RemoveAsk,
    RemoveBid,
}

impl QxOrderAction {
    /// Path segment used by the node API
    pub fn as_path(&self) -> &'static str {
        match self {
            QxOrderAction::Ask => "ASK",
            QxOrderAction::Bid => "BID",
            QxOrderAction::RemoveAsk => "REMOVEASK",
            QxOrderAction::RemoveBid => "REMOVEBID",
        }
    }
}

/// A QX order to place or cancel
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QxOrderRequest {
    /// Expiration tick; zero lets the node use its latest tick
    #[serde(default)]
    pub tick: u64,
    pub issuer: String,
    pub asset: String,
    pub action: QxOrderAction,
    pub address: String,
    pub price: i64,
    pub amount: i64,
    #[serde(default)]
    pub password: Option<String>,
}

/// Plain-text replies the node uses to refuse a write
const REJECTION_PREFIXES: &[&str] = &[
    "Invalid",
    "Failed",
    "Unknown",
    "Must",
    "Error",
    "Timed Out",
    "Password Too Short",
    "You Must",
    "Wallet Password Already Set",
    "Identity Is Encrypted",
];

/// Outcome of a write request the node accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeReply {
    /// Endpoint family, for logs and UI feedback ("transfer", "peers/add", ...)
    pub action: String,
    /// Raw reply text (a txid, "200", "Peer Added", ...)
    pub message: String,
}

/// Classify a write reply as accepted or rejected
pub fn classify_reply(action: &str, body: &str) -> WalletResult<NodeReply> {
    let message = body.trim().trim_matches('"').to_string();

    if message.is_empty() {
        return Err(WalletError::api(format!("Empty reply to {}", action)));
    }

    if REJECTION_PREFIXES.iter().any(|p| message.starts_with(p)) {
        return Err(WalletError::rejected(message));
    }

    Ok(NodeReply {
        action: action.to_string(),
        message,
    })
}

/// Parse a JSON read body, surfacing the node's own error text when it sent one
pub fn parse_body<T: DeserializeOwned>(endpoint: &str, body: &str) -> WalletResult<T> {
    serde_json::from_str(body).map_err(|e| {
        let trimmed = body.trim();
        if trimmed.starts_with("Error") {
            WalletError::api(format!("{} failed: {}", endpoint, trimmed))
        } else {
            WalletError::parse(format!("Failed to parse {} response: {}", endpoint, e))
        }
    })
}

/// Parse a bare integer body such as the tick endpoint's
pub fn parse_integer_body(endpoint: &str, body: &str) -> WalletResult<u64> {
    let trimmed = body.trim().trim_matches('"');
    trimmed.parse::<u64>().map_err(|_| {
        if trimmed.starts_with("Error") {
            WalletError::api(format!("{} failed: {}", endpoint, trimmed))
        } else {
            WalletError::parse(format!("Expected an integer from {}, got '{}'", endpoint, trimmed))
        }
    })
}

/// Parse a "true"/"false" body
pub fn parse_bool_body(endpoint: &str, body: &str) -> WalletResult<bool> {
    match body.trim().trim_matches('"') {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(WalletError::parse(format!(
            "Expected a boolean from {}, got '{}'",
            endpoint, other
        ))),
    }
}

/// Parse the wallet/is_encrypted body.
///
/// Without a master password the node answers with its store error
/// ("No Master Password Set") instead of a boolean, so anything other than
/// `true` reads as not encrypted.
pub fn parse_encrypted_body(body: &str) -> bool {
    body.trim().trim_matches('"') == "true"
}
