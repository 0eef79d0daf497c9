//! Protection of found private keys.
//!
//! A found key can be sealed with an RSA public key (OAEP, SHA-256) before it
//! leaves the process, and a sealed key can be opened offline with the
//! matching private key. Keys are supplied as base64-encoded PEM; ciphertext
//! is standard base64.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

#[derive(Debug, thiserror::Error)]
pub enum ProtectError {
    #[error("invalid key material: {0}")]
    KeyFormat(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),
}

/// Unwraps the base64 layer around a PEM document.
fn decode_pem(encoded: &str) -> Result<String, ProtectError> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| ProtectError::KeyFormat(format!("key is not valid base64: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|_| ProtectError::KeyFormat("decoded key is not a PEM document".into()))
}

/// Parses a base64-wrapped `PUBLIC KEY` (SPKI) or `RSA PUBLIC KEY` (PKCS#1) PEM.
pub fn parse_public_key(encoded: &str) -> Result<RsaPublicKey, ProtectError> {
    let pem = decode_pem(encoded)?;
    RsaPublicKey::from_public_key_pem(&pem)
        .or_else(|spki_err| {
            RsaPublicKey::from_pkcs1_pem(&pem).map_err(|_| spki_err.to_string())
        })
        .map_err(|e| ProtectError::KeyFormat(format!("failed to parse RSA public key: {}", e)))
}

/// Parses a base64-wrapped `RSA PRIVATE KEY` (PKCS#1) or `PRIVATE KEY` (PKCS#8) PEM.
pub fn parse_private_key(encoded: &str) -> Result<RsaPrivateKey, ProtectError> {
    let pem = decode_pem(encoded)?;
    RsaPrivateKey::from_pkcs1_pem(&pem)
        .or_else(|pkcs1_err| {
            RsaPrivateKey::from_pkcs8_pem(&pem).map_err(|_| pkcs1_err.to_string())
        })
        .map_err(|e| ProtectError::KeyFormat(format!("failed to parse RSA private key: {}", e)))
}

/// Seals plaintext for delivery.
///
/// Without a key the plaintext passes through unchanged.
#[derive(Debug, Clone)]
pub struct Sealer {
    key: Option<RsaPublicKey>,
}

impl Sealer {
    /// A sealer that leaves plaintext untouched.
    pub fn passthrough() -> Self {
        Self { key: None }
    }

    pub fn new(key: RsaPublicKey) -> Self {
        Self { key: Some(key) }
    }

    /// Builds a sealer from an optional base64 PEM public key.
    ///
    /// An absent or empty key yields a pass-through sealer.
    pub fn from_encoded(encoded: Option<&str>) -> Result<Self, ProtectError> {
        match encoded.map(str::trim).filter(|k| !k.is_empty()) {
            Some(k) => Ok(Self::new(parse_public_key(k)?)),
            None => Ok(Self::passthrough()),
        }
    }

    pub fn is_encrypting(&self) -> bool {
        self.key.is_some()
    }

    /// Returns the base64 ciphertext, or the plaintext itself when no key is set.
    pub fn seal(&self, plaintext: &str) -> Result<String, ProtectError> {
        let Some(key) = &self.key else {
            return Ok(plaintext.to_string());
        };

        let ciphertext = key
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext.as_bytes())
            .map_err(|e| ProtectError::Encryption(e.to_string()))?;
        Ok(BASE64.encode(ciphertext))
    }
}

/// Opens ciphertext produced by [`Sealer::seal`].
#[derive(Debug, Clone)]
pub struct Opener {
    key: Option<RsaPrivateKey>,
}

impl Opener {
    pub fn passthrough() -> Self {
        Self { key: None }
    }

    pub fn new(key: RsaPrivateKey) -> Self {
        Self { key: Some(key) }
    }

    /// Builds an opener from an optional base64 PEM private key.
    pub fn from_encoded(encoded: Option<&str>) -> Result<Self, ProtectError> {
        match encoded.map(str::trim).filter(|k| !k.is_empty()) {
            Some(k) => Ok(Self::new(parse_private_key(k)?)),
            None => Ok(Self::passthrough()),
        }
    }

    /// Recovers the plaintext; without a key the input is returned unchanged.
    pub fn open(&self, ciphertext: &str) -> Result<String, ProtectError> {
        let Some(key) = &self.key else {
            return Ok(ciphertext.to_string());
        };

        let bytes = BASE64.decode(ciphertext.trim()).map_err(|e| {
            ProtectError::Decryption(format!("ciphertext is not valid base64: {}", e))
        })?;
        let plaintext = key
            .decrypt(Oaep::new::<Sha256>(), &bytes)
            .map_err(|e| ProtectError::Decryption(e.to_string()))?;
        String::from_utf8(plaintext)
            .map_err(|_| ProtectError::Decryption("plaintext is not valid UTF-8".into()))
    }
}

/// Encrypts `plaintext` with a base64 PEM public key; an empty key passes the
/// plaintext through.
pub fn encrypt(public_key: &str, plaintext: &str) -> Result<String, ProtectError> {
    Sealer::from_encoded(Some(public_key))?.seal(plaintext)
}

/// Decrypts base64 `ciphertext` with a base64 PEM private key; an empty key
/// passes the input through.
pub fn decrypt(private_key: &str, ciphertext: &str) -> Result<String, ProtectError> {
    Opener::from_encoded(Some(private_key))?.open(ciphertext)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::OnceLock;

    use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
    use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};

    const FOUND_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn keypair() -> &'static RsaPrivateKey {
        static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
        KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, 2048).unwrap())
    }

    fn encoded_public() -> String {
        let pem = keypair()
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .unwrap();
        BASE64.encode(pem)
    }

    fn encoded_private() -> String {
        let pem = keypair().to_pkcs1_pem(LineEnding::LF).unwrap();
        BASE64.encode(pem.as_bytes())
    }

    #[test]
    fn test_passthrough_without_key() {
        assert_eq!(encrypt("", FOUND_KEY).unwrap(), FOUND_KEY);
        assert_eq!(decrypt("", FOUND_KEY).unwrap(), FOUND_KEY);
        assert!(!Sealer::from_encoded(None).unwrap().is_encrypting());
    }

    #[test]
    fn test_round_trip() {
        let ciphertext = encrypt(&encoded_public(), FOUND_KEY).unwrap();
        assert_ne!(ciphertext, FOUND_KEY);
        // 2048-bit modulus
        assert_eq!(BASE64.decode(&ciphertext).unwrap().len(), 256);
        assert_eq!(decrypt(&encoded_private(), &ciphertext).unwrap(), FOUND_KEY);
    }

    #[test]
    fn test_encryption_is_randomized() {
        let sealer = Sealer::from_encoded(Some(&encoded_public())).unwrap();
        assert_ne!(sealer.seal(FOUND_KEY).unwrap(), sealer.seal(FOUND_KEY).unwrap());
    }

    #[test]
    fn test_alternate_key_encodings() {
        let public_pkcs1 = keypair()
            .to_public_key()
            .to_pkcs1_pem(LineEnding::LF)
            .unwrap();
        let private_pkcs8 = keypair().to_pkcs8_pem(LineEnding::LF).unwrap();

        let ciphertext = encrypt(&BASE64.encode(public_pkcs1), FOUND_KEY).unwrap();
        let opened = decrypt(&BASE64.encode(private_pkcs8.as_bytes()), &ciphertext).unwrap();
        assert_eq!(opened, FOUND_KEY);
    }

    #[test]
    fn test_malformed_public_key() {
        assert!(matches!(
            encrypt("not base64!", FOUND_KEY),
            Err(ProtectError::KeyFormat(_))
        ));
        let not_pem = BASE64.encode("hello");
        assert!(matches!(
            encrypt(&not_pem, FOUND_KEY),
            Err(ProtectError::KeyFormat(_))
        ));
    }

    #[test]
    fn test_malformed_private_key() {
        let ciphertext = encrypt(&encoded_public(), FOUND_KEY).unwrap();
        // A public key is not a private key
        assert!(matches!(
            decrypt(&encoded_public(), &ciphertext),
            Err(ProtectError::KeyFormat(_))
        ));
    }

    #[test]
    fn test_plaintext_too_large() {
        let oversized = "a".repeat(300);
        assert!(matches!(
            encrypt(&encoded_public(), &oversized),
            Err(ProtectError::Encryption(_))
        ));
    }

    #[test]
    fn test_corrupt_ciphertext() {
        let private = encoded_private();
        assert!(matches!(
            decrypt(&private, "%%%"),
            Err(ProtectError::Decryption(_))
        ));

        let mut bytes = BASE64
            .decode(encrypt(&encoded_public(), FOUND_KEY).unwrap())
            .unwrap();
        bytes[10] ^= 0xff;
        assert!(matches!(
            decrypt(&private, &BASE64.encode(bytes)),
            Err(ProtectError::Decryption(_))
        ));
    }
}
