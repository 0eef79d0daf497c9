//! Candidate keypair generation.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use secp256k1::{PublicKey, Secp256k1, SecretKey, SignOnly};

use super::Address;

/// Failure to produce a candidate for a single attempt.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("entropy source failed: {0}")]
    Entropy(#[from] rand::Error),

    #[error("sampled scalar is not a valid secret key")]
    InvalidScalar,
}

/// A secp256k1 keypair together with its derived address.
///
/// Lives for one attempt unless it matches.
#[derive(Clone)]
pub struct Keypair {
    secret_key: [u8; 32],
    address: Address,
}

impl Keypair {
    /// Builds a keypair from a known secret scalar.
    pub fn from_secret_bytes(secret_bytes: [u8; 32]) -> Result<Self, GenerationError> {
        let secp = Secp256k1::signing_only();
        Self::derive(&secp, secret_bytes)
    }

    fn derive(
        secp: &Secp256k1<SignOnly>,
        secret_bytes: [u8; 32],
    ) -> Result<Self, GenerationError> {
        let secret_key =
            SecretKey::from_slice(&secret_bytes).map_err(|_| GenerationError::InvalidScalar)?;
        let public_key = PublicKey::from_secret_key(secp, &secret_key);

        Ok(Self {
            secret_key: secret_bytes,
            address: Address::from_public_key(&public_key),
        })
    }

    /// Private key as `0x`-prefixed lowercase hex.
    pub fn private_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.secret_key))
    }

    pub fn private_key_bytes(&self) -> &[u8; 32] {
        &self.secret_key
    }

    #[inline]
    pub fn address(&self) -> &Address {
        &self.address
    }
}

// The secret never shows up in debug output.
impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("secret_key", &"<redacted>")
            .field("address", &self.address)
            .finish()
    }
}

/// Draws candidate keypairs from an entropy source, the operating system's
/// CSPRNG unless another is supplied.
///
/// Holds one signing context so that it is not rebuilt on every attempt;
/// each worker owns its own generator.
pub struct KeyGenerator<R = OsRng> {
    secp: Secp256k1<SignOnly>,
    rng: R,
}

impl KeyGenerator<OsRng> {
    pub fn new() -> Self {
        Self::with_rng(OsRng)
    }
}

impl<R: RngCore> KeyGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            secp: Secp256k1::signing_only(),
            rng,
        }
    }

    /// Generates one random keypair.
    #[inline]
    pub fn generate(&mut self) -> Result<Keypair, GenerationError> {
        let mut secret = [0u8; 32];
        self.rng.try_fill_bytes(&mut secret)?;
        Keypair::derive(&self.secp, secret)
    }
}

impl Default for KeyGenerator<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}
