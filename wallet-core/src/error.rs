//! Error types for the wallet client

use thiserror::Error;

/// Wallet-wide error type
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The node answered, but refused the request (bad password, unknown identity, ...)
    #[error("Rejected by node: {0}")]
    Rejected(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WalletError {
    pub fn api(msg: impl Into<String>) -> Self {
        WalletError::Api(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        WalletError::Network(msg.into())
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        WalletError::RateLimited(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        WalletError::Parse(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        WalletError::NotFound(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        WalletError::Rejected(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        WalletError::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        WalletError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        WalletError::Internal(msg.into())
    }

    /// Whether the error means the node could not be reached at all
    pub fn is_connectivity(&self) -> bool {
        matches!(self, WalletError::Network(_) | WalletError::RateLimited(_))
    }
}

/// Result type alias for wallet operations
pub type WalletResult<T> = Result<T, WalletError>;
