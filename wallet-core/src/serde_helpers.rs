//! Deserialization helpers for node payloads
//!
//! The node renders most columns as strings (`"1200"`), but some builds emit
//! plain JSON numbers. These helpers accept both.

use serde::{de, Deserialize, Deserializer};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum StrOrNum {
    Num(serde_json::Number),
    Str(String),
}

/// Deserialize an integer that may arrive as a JSON number or a numeric string
pub fn int_from_str_or_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match StrOrNum::deserialize(deserializer)? {
        StrOrNum::Num(n) => n.to_string().parse().map_err(de::Error::custom),
        StrOrNum::Str(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

/// Deserialize a string column that may arrive as a JSON number
pub fn string_from_str_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match StrOrNum::deserialize(deserializer)? {
        StrOrNum::Num(n) => Ok(n.to_string()),
        StrOrNum::Str(s) => Ok(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(deserialize_with = "int_from_str_or_number")]
        amount: i64,
        #[serde(deserialize_with = "string_from_str_or_number")]
        status: String,
    }

    #[test]
    fn test_accepts_strings_and_numbers() {
        let row: Row = serde_json::from_str(r#"{"amount": "1200", "status": -1}"#).unwrap();
        assert_eq!(row.amount, 1200);
        assert_eq!(row.status, "-1");

        let row: Row = serde_json::from_str(r#"{"amount": 7, "status": "0"}"#).unwrap();
        assert_eq!(row.amount, 7);
        assert_eq!(row.status, "0");
    }

    #[test]
    fn test_rejects_non_numeric_amount() {
        let row = serde_json::from_str::<Row>(r#"{"amount": "lots", "status": "0"}"#);
        assert!(row.is_err());
    }
}
