//! Key generation and address derivation.
//!
//! This module provides:
//! - Candidate keypairs drawn from the OS entropy source
//! - Ethereum address derivation using Keccak-256
//! - EIP-55 checksum rendering

mod address;
mod keypair;

pub use address::Address;
pub use keypair::{GenerationError, KeyGenerator, Keypair};
