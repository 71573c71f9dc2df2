//! Transfer history records

use serde::{Deserialize, Deserializer, Serialize};

use crate::serde_helpers::{int_from_str_or_number, string_from_str_or_number};

/// Confirmation state of a broadcast transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Success,
    Failed,
}

impl TransferStatus {
    /// Map the node's status column: `-1` pending, `0` success, anything else failed
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "-1" => TransferStatus::Pending,
            "0" => TransferStatus::Success,
            _ => TransferStatus::Failed,
        }
    }

}

fn status_from_code<'de, D>(deserializer: D) -> Result<TransferStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let code = string_from_str_or_number(deserializer)?;
    Ok(TransferStatus::from_code(&code))
}

/// A transfer (native, asset or QX order) created by this wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    #[serde(alias = "source_identity")]
    pub source: String,
    #[serde(alias = "destination_identity")]
    pub destination: String,
    #[serde(deserialize_with = "int_from_str_or_number")]
    pub amount: i64,
    /// Tick at which the transaction expires
    #[serde(deserialize_with = "int_from_str_or_number")]
    pub tick: u64,
    #[serde(default)]
    pub txid: Option<String>,
    #[serde(deserialize_with = "status_from_code")]
    pub status: TransferStatus,
    #[serde(default)]
    pub created: Option<String>,
    /// Extra columns for asset transfers and orders (asset name, issuer, price, ...)
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}
