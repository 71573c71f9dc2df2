//! Runtime configuration loaded from the environment

use std::env;
use std::time::Duration;

use wallet_core::QuorumPolicy;
use wallet_node::{DEFAULT_NODE_URL, DEFAULT_TIMEOUT_MS};
use wallet_services::PollerConfig;

/// Configuration for the wallet API server
#[derive(Debug, Clone)]
pub struct WalletConfig {
    /// Base URL of the node API
    pub node_url: String,
    pub request_timeout: Duration,
    pub tick_interval: Duration,
    pub poll_interval: Duration,
    /// Agreement required among peer balance reports, in percent
    pub quorum_threshold: u32,
    pub quorum_min_samples: usize,
    /// Levels fetched per order book side
    pub orderbook_limit: u32,
    /// Whether to value balances in USD
    pub price_feed: bool,
    pub server_port: u16,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            node_url: DEFAULT_NODE_URL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            tick_interval: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(3000),
            quorum_threshold: wallet_core::quorum::DEFAULT_THRESHOLD_PERCENT,
            quorum_min_samples: wallet_core::quorum::DEFAULT_MIN_SAMPLES,
            orderbook_limit: 1000,
            price_feed: true,
            server_port: 3001,
        }
    }
}

impl WalletConfig {
    /// Load configuration from environment variables
    ///
    /// Reads:
    /// - WALLET_NODE_URL, WALLET_REQUEST_TIMEOUT_MS
    /// - WALLET_TICK_INTERVAL_MS, WALLET_POLL_INTERVAL_MS
    /// - WALLET_QUORUM_THRESHOLD, WALLET_QUORUM_MIN_SAMPLES
    /// - WALLET_ORDERBOOK_LIMIT, WALLET_PRICE_FEED, SERVER_PORT
    ///
    /// Unset variables fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let node_url = lookup("WALLET_NODE_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.node_url);

        let config = Self {
            node_url,
            request_timeout: millis(&lookup, "WALLET_REQUEST_TIMEOUT_MS", defaults.request_timeout)?,
            tick_interval: millis(&lookup, "WALLET_TICK_INTERVAL_MS", defaults.tick_interval)?,
            poll_interval: millis(&lookup, "WALLET_POLL_INTERVAL_MS", defaults.poll_interval)?,
            quorum_threshold: number(&lookup, "WALLET_QUORUM_THRESHOLD", defaults.quorum_threshold)?,
            quorum_min_samples: number(&lookup, "WALLET_QUORUM_MIN_SAMPLES", defaults.quorum_min_samples)?,
            orderbook_limit: number(&lookup, "WALLET_ORDERBOOK_LIMIT", defaults.orderbook_limit)?,
            price_feed: flag(&lookup, "WALLET_PRICE_FEED", defaults.price_feed)?,
            server_port: number(&lookup, "SERVER_PORT", defaults.server_port)?,
        };

        if !(1..=100).contains(&config.quorum_threshold) {
            return Err(ConfigError::OutOfRange {
                key: "WALLET_QUORUM_THRESHOLD",
                expected: "1-100",
            });
        }
        if config.quorum_min_samples == 0 {
            return Err(ConfigError::OutOfRange {
                key: "WALLET_QUORUM_MIN_SAMPLES",
                expected: "at least 1",
            });
        }

        Ok(config)
    }

    pub fn quorum_policy(&self) -> QuorumPolicy {
        QuorumPolicy::new(self.quorum_threshold).with_min_samples(self.quorum_min_samples)
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            tick_interval: self.tick_interval,
            snapshot_interval: self.poll_interval,
            quorum: self.quorum_policy(),
            orderbook_limit: self.orderbook_limit,
            ..PollerConfig::default()
        }
    }
}

fn number<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            value: raw.clone(),
            error: e.to_string(),
        }),
    }
}

fn millis<F>(lookup: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let ms: u64 = number(lookup, key, default.as_millis() as u64)?;
    if ms == 0 {
        return Err(ConfigError::OutOfRange {
            key,
            expected: "a positive number of milliseconds",
        });
    }
    Ok(Duration::from_millis(ms))
}

fn flag<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw,
            error: "expected on/off".to_string(),
        }),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key} ({value}): {error}")]
    InvalidValue {
        key: &'static str,
        value: String,
        error: String,
    },

    #[error("{key} must be {expected}")]
    OutOfRange {
        key: &'static str,
        expected: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<WalletConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        WalletConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.node_url, "http://127.0.0.1:8080");
        assert_eq!(config.request_timeout, Duration::from_millis(10_000));
        assert_eq!(config.tick_interval, Duration::from_millis(1000));
        assert_eq!(config.poll_interval, Duration::from_millis(3000));
        assert_eq!(config.quorum_threshold, 50);
        assert_eq!(config.quorum_min_samples, 2);
        assert_eq!(config.orderbook_limit, 1000);
        assert!(config.price_feed);
        assert_eq!(config.server_port, 3001);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("WALLET_NODE_URL", "http://10.0.0.5:9000"),
            ("WALLET_QUORUM_THRESHOLD", "66"),
            ("WALLET_POLL_INTERVAL_MS", "500"),
            ("WALLET_PRICE_FEED", "off"),
            ("SERVER_PORT", "4000"),
        ])
        .unwrap();

        assert_eq!(config.node_url, "http://10.0.0.5:9000");
        assert_eq!(config.quorum_policy().threshold_percent, 66);
        assert_eq!(config.poller_config().snapshot_interval, Duration::from_millis(500));
        assert!(!config.price_feed);
        assert_eq!(config.server_port, 4000);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("SERVER_PORT", "http")]),
            Err(ConfigError::InvalidValue { key: "SERVER_PORT", .. })
        ));
        assert!(matches!(
            load(&[("WALLET_QUORUM_THRESHOLD", "0")]),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(matches!(
            load(&[("WALLET_TICK_INTERVAL_MS", "0")]),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(load(&[("WALLET_PRICE_FEED", "sometimes")]).is_err());
    }
}
