//! Pattern matching for checksummed addresses.
//!
//! A pattern is a literal prefix and/or suffix; both must hold for a match.
//! Matching is case-sensitive against the EIP-55 form unless configured
//! otherwise.

mod pattern;

pub use pattern::{matches, Pattern};
