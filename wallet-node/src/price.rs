//! USD price feed for the native coin
//!
//! Public CoinGecko endpoint, no authentication required.

use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};
use wallet_core::{MarketPrice, WalletError, WalletResult};

const COINGECKO_API_BASE: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko id of the native coin
pub const DEFAULT_COIN_ID: &str = "qubic-network";

#[derive(Debug, Deserialize)]
struct CoinQuote {
    usd: Option<Decimal>,
}

/// Price feed client
#[derive(Debug, Clone)]
pub struct PriceClient {
    http: Client,
    base_url: String,
    coin_id: String,
}

impl PriceClient {
    pub fn new(timeout: Duration) -> WalletResult<Self> {
        Self::with_base_url(COINGECKO_API_BASE, DEFAULT_COIN_ID, timeout)
    }

    pub fn with_base_url(base_url: &str, coin_id: &str, timeout: Duration) -> WalletResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("LedgerWallet/1.0")
            .build()
            .map_err(|e| WalletError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            coin_id: coin_id.to_string(),
        })
    }

    /// Fetch the current USD price
    #[instrument(skip(self), fields(coin = %self.coin_id))]
    pub async fn fetch_usd(&self) -> WalletResult<MarketPrice> {
        let url = format!("{}/simple/price", self.base_url);
        debug!("Fetching coin price from: {}", url);

        let response = self
            .http
            .get(&url)
            .query(&[("ids", self.coin_id.as_str()), ("vs_currencies", "usd")])
            .send()
            .await
            .map_err(|e| WalletError::network(format!("Failed to fetch price: {}", e)))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(WalletError::rate_limited("Price feed rate limit hit"));
        }
        if !status.is_success() {
            return Err(WalletError::api(format!("Price feed error ({})", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| WalletError::network(format!("Failed to read price response: {}", e)))?;

        let usd = parse_quote(&self.coin_id, &body)?;
        Ok(MarketPrice {
            usd,
            fetched_at: Utc::now(),
        })
    }
}

/// Pull `{coin_id: {usd}}` out of a simple/price body
fn parse_quote(coin_id: &str, body: &str) -> WalletResult<Decimal> {
    let quotes: HashMap<String, CoinQuote> = serde_json::from_str(body)
        .map_err(|e| WalletError::parse(format!("Failed to parse price response: {}", e)))?;

    quotes
        .get(coin_id)
        .and_then(|q| q.usd)
        .ok_or_else(|| WalletError::not_found(format!("No USD quote for {}", coin_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_quote() {
        let usd = parse_quote("qubic-network", r#"{"qubic-network":{"usd":0.25}}"#).unwrap();
        assert_eq!(usd, Decimal::from_str("0.25").unwrap());
    }

    #[test]
    fn test_missing_quote() {
        let err = parse_quote("qubic-network", r#"{}"#).unwrap_err();
        assert!(matches!(err, WalletError::NotFound(_)));

        let err = parse_quote("qubic-network", r#"{"qubic-network":{}}"#).unwrap_err();
        assert!(matches!(err, WalletError::NotFound(_)));

        assert!(matches!(parse_quote("x", "oops"), Err(WalletError::Parse(_))));
    }
}
