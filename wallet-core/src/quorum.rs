//! Peer-balance quorum resolution
//!
//! Several peers report the same quantity (an identity's balance at a tick)
//! and may disagree while the network converges. A value is trusted only when
//! strictly more than the required share of respondents report it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Percentage of respondents that must agree, as used by the balance views
pub const DEFAULT_THRESHOLD_PERCENT: u32 = 50;

/// Fewer reports than this never reach a quorum
pub const DEFAULT_MIN_SAMPLES: usize = 2;

/// Outcome of a quorum check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum QuorumResult {
    /// Enough peers agree on this value
    Agreed(i64),
    /// Too few reports, or no value has enough support
    NoQuorum,
}

/// Parameters of the quorum check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumPolicy {
    /// Share of respondents (0-100) that must agree
    pub threshold_percent: u32,
    /// Minimum number of reports before a quorum is attempted
    pub min_samples: usize,
}

impl Default for QuorumPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_PERCENT)
    }
}

impl QuorumPolicy {
    /// Create a policy with the given threshold and the default minimum sample count
    pub fn new(threshold_percent: u32) -> Self {
        Self {
            threshold_percent,
            min_samples: DEFAULT_MIN_SAMPLES,
        }
    }

    /// Override the minimum sample count
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Number of agreeing reports the winning value must *exceed*
    ///
    /// `ceil(threshold_percent / 100 * respondents)`, computed in integers.
    pub fn required_agreement(&self, respondents: usize) -> usize {
        let scaled = u64::from(self.threshold_percent) * respondents as u64;
        scaled.div_ceil(100) as usize
    }

    /// Resolve a set of reported values.
    ///
    /// Values are compared by their string form, so `5` and `"5"` count as the
    /// same report. Order only matters for ties: the value seen first wins.
    pub fn resolve<V: Display>(&self, values: &[V]) -> QuorumResult {
        if values.len() < self.min_samples {
            return QuorumResult::NoQuorum;
        }

        let required = self.required_agreement(values.len());

        let mut counts: IndexMap<String, usize> = IndexMap::new();
        for value in values {
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }

        let mut winner: Option<(&str, usize)> = None;
        for (value, &count) in &counts {
            match winner {
                Some((_, best)) if count <= best => {}
                _ => winner = Some((value.as_str(), count)),
            }
        }

        match winner {
            Some((value, count)) if count > required => parse_leading_int(value)
                .map(QuorumResult::Agreed)
                .unwrap_or(QuorumResult::NoQuorum),
            _ => QuorumResult::NoQuorum,
        }
    }
}

/// Resolve reported values with the given threshold and default minimum sample count
pub fn resolve_quorum<V: Display>(values: &[V], threshold_percent: u32) -> QuorumResult {
    QuorumPolicy::new(threshold_percent).resolve(values)
}

/// Parse the leading integer of a reported value ("1200", " -3", "42abc")
fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign_len, rest) = match trimmed.as_bytes().first() {
        Some(b'-') | Some(b'+') => (1, &trimmed[1..]),
        _ => (0, trimmed),
    };
    let digits = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    trimmed[..sign_len + digits].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_few_reports() {
        let empty: [i64; 0] = [];
        assert_eq!(resolve_quorum(&empty, 50), QuorumResult::NoQuorum);
        assert_eq!(resolve_quorum(&[7], 50), QuorumResult::NoQuorum);
        assert_eq!(resolve_quorum(&[7], 0), QuorumResult::NoQuorum);
    }

    #[test]
    fn test_unanimous_agreement() {
        assert_eq!(resolve_quorum(&[5, 5, 5], 50), QuorumResult::Agreed(5));
        assert_eq!(resolve_quorum(&[5, 5], 50), QuorumResult::Agreed(5));
    }

    #[test]
    fn test_boundary_is_strict() {
        // required = ceil(1.5) = 2, winner has exactly 2
        assert_eq!(resolve_quorum(&[5, 5, 3], 50), QuorumResult::NoQuorum);
        // unanimous, but 100% requires all three and 3 > 3 is false
        assert_eq!(resolve_quorum(&[5, 5, 5], 100), QuorumResult::NoQuorum);
    }

    #[test]
    fn test_majority_above_requirement() {
        assert_eq!(resolve_quorum(&[5, 5, 5, 3], 50), QuorumResult::Agreed(5));
    }

    #[test]
    fn test_tie_prefers_first_seen() {
        assert_eq!(resolve_quorum(&[1, 1, 2, 2], 50), QuorumResult::NoQuorum);
        assert_eq!(resolve_quorum(&[1, 1, 2, 2], 10), QuorumResult::Agreed(1));
        assert_eq!(resolve_quorum(&[2, 1, 1, 2], 10), QuorumResult::Agreed(2));
        assert_eq!(resolve_quorum(&[3, 9, 9, 3], 10), QuorumResult::Agreed(3));
    }

    #[test]
    fn test_later_strictly_larger_count_wins() {
        assert_eq!(resolve_quorum(&[4, 8, 8, 8], 50), QuorumResult::Agreed(8));
    }

    #[test]
    fn test_two_thirds_threshold() {
        let policy = QuorumPolicy::new(66);
        assert_eq!(policy.required_agreement(3), 2);
        assert_eq!(policy.resolve(&[10, 10, 10]), QuorumResult::Agreed(10));
        assert_eq!(policy.resolve(&[10, 10, 11]), QuorumResult::NoQuorum);
    }

    #[test]
    fn test_string_and_number_reports_share_identity() {
        let reports = ["1500", "1500", "1500", "900"];
        assert_eq!(resolve_quorum(&reports, 50), QuorumResult::Agreed(1500));

        // " 1500" is a different report string than "1500"
        let reports = ["1500", " 1500", "1500"];
        assert_eq!(resolve_quorum(&reports, 50), QuorumResult::NoQuorum);
    }

    #[test]
    fn test_non_numeric_winner_has_no_quorum() {
        let reports = ["n/a", "n/a", "n/a"];
        assert_eq!(resolve_quorum(&reports, 50), QuorumResult::NoQuorum);
    }

    #[test]
    fn test_min_samples_override() {
        let policy = QuorumPolicy::new(50).with_min_samples(3);
        assert_eq!(policy.resolve(&[5, 5]), QuorumResult::NoQuorum);
        assert_eq!(policy.resolve(&[5, 5, 5]), QuorumResult::Agreed(5));

        let lenient = QuorumPolicy::new(0).with_min_samples(1);
        assert_eq!(lenient.resolve(&[42]), QuorumResult::Agreed(42));
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("1200"), Some(1200));
        assert_eq!(parse_leading_int("  -3"), Some(-3));
        assert_eq!(parse_leading_int("+8"), Some(8));
        assert_eq!(parse_leading_int("42abc"), Some(42));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int("-"), None);
        assert_eq!(parse_leading_int(""), None);
    }

    #[test]
    fn test_result_serialization() {
        let agreed = serde_json::to_value(QuorumResult::Agreed(12)).unwrap();
        assert_eq!(agreed, serde_json::json!({"status": "agreed", "value": 12}));

        let none = serde_json::to_value(QuorumResult::NoQuorum).unwrap();
        assert_eq!(none, serde_json::json!({"status": "no_quorum"}));
    }
}
