//! Ethereum address derivation and EIP-55 rendering.

use std::fmt;

use secp256k1::PublicKey;
use tiny_keccak::{Hasher, Keccak};

/// A 20-byte account address derived from a secp256k1 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    #[inline]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derives the address of a public key.
    ///
    /// The uncompressed point is serialized without its `0x04` tag, hashed with
    /// Keccak-256, and the trailing 20 bytes of the digest form the address.
    #[inline]
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let serialized = public_key.serialize_uncompressed();
        let hash = keccak256(&serialized[1..]);

        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[12..]);
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase hex without the `0x` prefix.
    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Mixed-case EIP-55 form with the `0x` prefix.
    ///
    /// This is the textual address patterns are matched against and the one
    /// reported to the operator.
    pub fn to_checksum(&self) -> String {
        let lower = self.to_hex();
        let hash = keccak256(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let byte = hash[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}
