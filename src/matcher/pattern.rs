//! Prefix/suffix pattern matching.

/// Returns true when `address` starts with `prefix` and ends with `suffix`.
///
/// Comparison is literal and case-sensitive. Empty strings match anything.
#[inline]
pub fn matches(address: &str, prefix: &str, suffix: &str) -> bool {
    address.starts_with(prefix) && address.ends_with(suffix)
}

/// A prefix/suffix constraint on textual addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    prefix: String,
    suffix: String,
    case_sensitive: bool,
}

impl Pattern {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>, case_sensitive: bool) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            case_sensitive,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Tests an address (checksummed, `0x`-prefixed) against this pattern.
    #[inline]
    pub fn matches(&self, address: &str) -> bool {
        if self.case_sensitive {
            return matches(address, &self.prefix, &self.suffix);
        }

        let addr = address.as_bytes();
        let (prefix, suffix) = (self.prefix.as_bytes(), self.suffix.as_bytes());
        addr.len() >= prefix.len()
            && addr.len() >= suffix.len()
            && addr[..prefix.len()].eq_ignore_ascii_case(prefix)
            && addr[addr.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
    }

    /// Hex digits of the address constrained by the pattern.
    ///
    /// The leading `0x` of the prefix is common to every address and does not
    /// count.
    fn constrained_digits(&self) -> impl Iterator<Item = char> + '_ {
        let prefix_digits = self.prefix.strip_prefix("0x").unwrap_or("");
        prefix_digits.chars().chain(self.suffix.chars())
    }

    /// Returns the expected number of attempts to find a match.
    ///
    /// Each constrained digit has 16 possible values; with case-sensitive
    /// matching an alphabetic digit must also land on the right EIP-55 case.
    pub fn estimated_difficulty(&self) -> u64 {
        self.constrained_digits().fold(1u64, |acc, c| {
            let per_digit = if self.case_sensitive && c.is_ascii_alphabetic() {
                32
            } else {
                16
            };
            acc.saturating_mul(per_digit)
        })
    }

    /// Returns a human-readable difficulty estimate.
    pub fn difficulty_description(&self) -> String {
        let diff = self.estimated_difficulty();
        match diff {
            0..=1_000 => "Very Easy (< 1 second)".into(),
            1_001..=100_000 => "Easy (seconds)".into(),
            100_001..=10_000_000 => "Medium (minutes)".into(),
            10_000_001..=1_000_000_000 => "Hard (hours)".into(),
            _ => "Very Hard (days or more)".into(),
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let case = if self.case_sensitive {
            "case-sensitive"
        } else {
            "case-insensitive"
        };
        if self.suffix.is_empty() {
            write!(f, "{}... ({})", self.prefix, case)
        } else {
            write!(f, "{}...{} ({})", self.prefix, self.suffix, case)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    #[test]
    fn test_prefix_match() {
        assert!(matches(ADDR, "0x5aAe", ""));
        assert!(!matches(ADDR, "0x5aae", ""));
        assert!(!matches(ADDR, "0xdead", ""));
    }

    #[test]
    fn test_suffix_match() {
        assert!(matches(ADDR, "", "BeAed"));
        assert!(!matches(ADDR, "", "beaed"));
    }

    #[test]
    fn test_prefix_and_suffix_must_both_hold() {
        assert!(matches(ADDR, "0x5a", "ed"));
        assert!(!matches(ADDR, "0x5a", "ff"));
        assert!(!matches(ADDR, "0xff", "ed"));
    }

    #[test]
    fn test_empty_pattern_matches_everything() {
        assert!(matches(ADDR, "", ""));
        assert!(Pattern::new("", "", true).matches(ADDR));
        assert!(Pattern::new("", "", false).matches(ADDR));
    }

    #[test]
    fn test_case_insensitive_match() {
        let pattern = Pattern::new("0x5AAEB", "beaed", false);
        assert!(pattern.matches(ADDR));
        assert!(!Pattern::new("0x5AAEB", "beaed", true).matches(ADDR));
    }

    #[test]
    fn test_pattern_longer_than_address() {
        let long = format!("{}00", ADDR);
        assert!(!Pattern::new(long.clone(), "", false).matches(ADDR));
        assert!(!Pattern::new("", long, false).matches(ADDR));
    }

    #[test]
    fn test_difficulty() {
        assert_eq!(Pattern::new("0x0000", "", true).estimated_difficulty(), 65536);
        assert_eq!(Pattern::new("0xdead", "", false).estimated_difficulty(), 65536);
        assert_eq!(Pattern::new("0xAA", "", true).estimated_difficulty(), 1024);
        assert_eq!(Pattern::new("", "", true).estimated_difficulty(), 1);
        assert_eq!(Pattern::new("0x", "00", true).estimated_difficulty(), 256);
    }
}
