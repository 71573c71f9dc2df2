//! Client-side checks run before a write reaches the node

use wallet_core::{WalletError, WalletResult};

/// Length of a public identity
pub const IDENTITY_LEN: usize = 60;
/// Length of a private seed
pub const SEED_LEN: usize = 55;
/// Longest asset name the QX contract accepts
pub const MAX_ASSET_NAME_LEN: usize = 8;
/// Largest amount the wallet lets a user send in one transfer
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

pub fn validate_identity(identity: &str) -> WalletResult<()> {
    if identity.len() != IDENTITY_LEN {
        return Err(WalletError::validation(format!(
            "Invalid identity: must be exactly {} characters",
            IDENTITY_LEN
        )));
    }
    if !identity.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(WalletError::validation("Invalid identity: must be A-Z uppercase"));
    }
    Ok(())
}

pub fn validate_seed(seed: &str) -> WalletResult<()> {
    if seed.len() != SEED_LEN {
        return Err(WalletError::validation(format!(
            "Invalid seed: must be exactly {} characters",
            SEED_LEN
        )));
    }
    if !seed.bytes().all(|b| b.is_ascii_lowercase()) {
        return Err(WalletError::validation("Invalid seed: must be a-z lowercase"));
    }
    Ok(())
}

pub fn validate_asset_name(asset: &str) -> WalletResult<()> {
    if asset.is_empty() || asset.len() > MAX_ASSET_NAME_LEN {
        return Err(WalletError::validation(format!(
            "Invalid asset name '{}': must be 1-{} characters",
            asset, MAX_ASSET_NAME_LEN
        )));
    }
    Ok(())
}

pub fn validate_amount(amount: i64) -> WalletResult<()> {
    if amount <= 0 || amount > MAX_AMOUNT {
        return Err(WalletError::validation(format!(
            "Invalid amount {}: must be between 1 and {}",
            amount, MAX_AMOUNT
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_rules() {
        assert!(validate_identity(&"A".repeat(60)).is_ok());
        assert!(validate_identity(&"A".repeat(59)).is_err());
        assert!(validate_identity(&"a".repeat(60)).is_err());
    }

    #[test]
    fn test_seed_rules() {
        assert!(validate_seed(&"q".repeat(55)).is_ok());
        assert!(validate_seed(&"q".repeat(54)).is_err());
        assert!(validate_seed(&format!("{}Q", "q".repeat(54))).is_err());
        assert!(validate_seed(&format!("{}1", "q".repeat(54))).is_err());
    }

    #[test]
    fn test_asset_and_amount_rules() {
        assert!(validate_asset_name("QX").is_ok());
        assert!(validate_asset_name("").is_err());
        assert!(validate_asset_name("TOOLONGNAME").is_err());

        assert!(validate_amount(1).is_ok());
        assert!(validate_amount(MAX_AMOUNT).is_ok());
        assert!(validate_amount(0).is_err());
        assert!(validate_amount(MAX_AMOUNT + 1).is_err());
    }
}
