//! # Key Management
//!
//! Key types and per-user identity generation.
//!
//! ## Key Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          KEY TYPES                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  AsymmetricKeyPair (RSA-2048, OAEP/SHA-256)                     │   │
//! │  │  ──────────────────────────────────────────                      │   │
//! │  │                                                                  │   │
//! │  │  • PublicKey: SubjectPublicKeyInfo DER, shared with peers       │   │
//! │  │  • PrivateKey: PKCS#8 DER, never leaves the owner's client      │   │
//! │  │                                                                  │   │
//! │  │  Created once at registration, never rotated.                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SymmetricKey (AES-256-GCM, 32 bytes)                           │   │
//! │  │  ─────────────────────────────────────                           │   │
//! │  │                                                                  │   │
//! │  │  • Content key: fresh per envelope, used exactly once           │   │
//! │  │  • Passcode key: PBKDF2 output that wraps a vault master key    │   │
//! │  │                                                                  │   │
//! │  │  Zeroized on drop.                                              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::codec::{EncodedKey, KeyCodec};
use super::provider::{CryptoProvider, RustCryptoProvider};
use crate::error::{Error, Result};

/// RSA modulus size for user identities
pub const RSA_MODULUS_BITS: usize = 2048;

/// Size of an AES-256 key in bytes
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// Size of the AES-GCM initialization vector in bytes (96 bits)
pub const IV_SIZE: usize = 12;

/// Public half of a user identity (SubjectPublicKeyInfo DER)
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    /// Wrap SubjectPublicKeyInfo DER bytes
    pub fn from_der(der: Vec<u8>) -> Self {
        Self(der)
    }

    /// Get the DER bytes
    pub fn as_der(&self) -> &[u8] {
        &self.0
    }

    /// Base64 form for storage and transport
    pub fn encode(&self) -> EncodedKey {
        KeyCodec::encode(&self.0)
    }

    /// Parse the base64 form
    ///
    /// ## Errors
    ///
    /// `MalformedKeyEncoding` unless the bytes are an RSA
    /// SubjectPublicKeyInfo.
    pub fn decode(encoded: &EncodedKey) -> Result<Self> {
        let der = KeyCodec::decode(encoded)?;
        RsaPublicKey::from_public_key_der(&der).map_err(|e| {
            Error::MalformedKeyEncoding(format!("Not an RSA public key: {}", e))
        })?;
        Ok(Self(der))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({} DER bytes)", self.0.len())
    }
}

/// Private half of a user identity (PKCS#8 DER)
///
/// ## Security Warning
///
/// Only the owning client ever holds this. Never log or transmit it.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey(Vec<u8>);

impl PrivateKey {
    /// Wrap PKCS#8 DER bytes
    pub fn from_der(der: Vec<u8>) -> Self {
        Self(der)
    }

    /// Get the DER bytes
    pub fn as_der(&self) -> &[u8] {
        &self.0
    }

    /// Base64 form for the owner's local backup
    pub fn encode(&self) -> EncodedKey {
        KeyCodec::encode(&self.0)
    }

    /// Parse the base64 form
    ///
    /// ## Errors
    ///
    /// `MalformedKeyEncoding` unless the bytes are an RSA PKCS#8
    /// document.
    pub fn decode(encoded: &EncodedKey) -> Result<Self> {
        let mut der = Zeroizing::new(KeyCodec::decode(encoded)?);
        RsaPrivateKey::from_pkcs8_der(&der).map_err(|e| {
            Error::MalformedKeyEncoding(format!("Not an RSA private key: {}", e))
        })?;
        Ok(Self(std::mem::take(&mut *der)))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// A user's asymmetric identity
#[derive(Debug, Clone)]
pub struct AsymmetricKeyPair {
    /// Shareable, long-lived public key
    pub public_key: PublicKey,
    /// Owner-only private key
    pub private_key: PrivateKey,
}

impl AsymmetricKeyPair {
    /// Export both halves as base64 text
    pub fn encode(&self) -> EncodedKeyPair {
        EncodedKeyPair {
            public_key: self.public_key.encode(),
            private_key: self.private_key.encode(),
        }
    }
}

/// Base64 export of a key pair, shaped like the registration payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedKeyPair {
    /// Base64 SubjectPublicKeyInfo
    pub public_key: EncodedKey,
    /// Base64 PKCS#8
    pub private_key: EncodedKey,
}

impl EncodedKeyPair {
    /// Decode both halves
    pub fn decode(&self) -> Result<AsymmetricKeyPair> {
        Ok(AsymmetricKeyPair {
            public_key: PublicKey::decode(&self.public_key)?,
            private_key: PrivateKey::decode(&self.private_key)?,
        })
    }
}

/// A 256-bit AES-GCM key
///
/// Zeroized when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; SYMMETRIC_KEY_SIZE]);

impl SymmetricKey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; SYMMETRIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a slice that must be exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes = <[u8; SYMMETRIC_KEY_SIZE]>::try_from(bytes).map_err(|_| {
            Error::MalformedKeyEncoding(format!(
                "symmetric key must be {} bytes, got {}",
                SYMMETRIC_KEY_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Get the raw key bytes
    pub fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

/// A 96-bit AES-GCM initialization vector
///
/// ## Critical Security Requirement
///
/// **NEVER reuse an IV with the same key!** Every envelope gets a fresh
/// content key and a fresh random IV; every vault wrap gets a fresh IV.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Iv([u8; IV_SIZE]);

impl Iv {
    /// Draw a random IV from the provider
    pub fn random(provider: &impl CryptoProvider) -> Result<Self> {
        let mut bytes = [0u8; IV_SIZE];
        provider.random_bytes(&mut bytes)?;
        Ok(Self(bytes))
    }

    /// Create from existing bytes
    pub fn from_bytes(bytes: [u8; IV_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; IV_SIZE] {
        &self.0
    }
}

/// Produces one asymmetric identity per user at registration time
pub struct KeyPairGenerator<P = RustCryptoProvider> {
    provider: P,
}

impl<P: CryptoProvider> KeyPairGenerator<P> {
    /// Create a generator backed by `provider`
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Generate a fresh RSA-2048 key pair
    ///
    /// ## Errors
    ///
    /// `KeyGenerationFailed` if the provider is unavailable or refuses the
    /// parameters. There is no fallback: the caller gets a complete key
    /// pair or an error, never half of one.
    pub fn generate(&self) -> Result<AsymmetricKeyPair> {
        let pair = self
            .provider
            .generate_asymmetric_keypair()
            .map_err(|e| match e {
                Error::KeyGenerationFailed(_) => e,
                other => Error::KeyGenerationFailed(other.to_string()),
            })?;

        tracing::debug!(
            public_der_len = pair.public_key.as_der().len(),
            "Generated identity key pair"
        );
        Ok(pair)
    }

    /// Generate a key pair and export it as base64 in one step
    pub fn generate_encoded(&self) -> Result<EncodedKeyPair> {
        self.generate().map(|pair| pair.encode())
    }
}

impl Default for KeyPairGenerator<RustCryptoProvider> {
    fn default() -> Self {
        Self::new(RustCryptoProvider)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ALICE, BOB};

    #[test]
    fn test_generated_keys_are_independent() {
        assert_ne!(ALICE.public_key, BOB.public_key);
        assert_ne!(ALICE.private_key, BOB.private_key);
    }

    #[test]
    fn test_public_key_is_spki_der() {
        // RSA-2048 SubjectPublicKeyInfo is always 294 bytes
        assert_eq!(ALICE.public_key.as_der().len(), 294);
        assert_eq!(ALICE.public_key.as_der()[0], 0x30);
    }

    #[test]
    fn test_encoded_pair_round_trip() {
        let encoded = ALICE.encode();
        let decoded = encoded.decode().unwrap();

        assert_eq!(decoded.public_key, ALICE.public_key);
        assert_eq!(decoded.private_key, ALICE.private_key);
    }

    #[test]
    fn test_encoded_pair_json_field_names() {
        let json = serde_json::to_value(ALICE.encode()).unwrap();
        assert!(json.get("publicKey").is_some());
        assert!(json.get("privateKey").is_some());
    }

    #[test]
    fn test_decode_rejects_truncated_public_key() {
        let der = ALICE.public_key.as_der();
        let truncated = KeyCodec::encode(&der[..der.len() - 10]);

        let err = PublicKey::decode(&truncated).unwrap_err();
        assert!(matches!(err, Error::MalformedKeyEncoding(_)));
    }

    #[test]
    fn test_decode_rejects_non_key_sequence() {
        // A well-formed DER SEQUENCE { INTEGER 5 } that is no key at all
        let not_a_key = KeyCodec::encode(&[0x30, 0x03, 0x02, 0x01, 0x05]);

        assert!(matches!(
            PublicKey::decode(&not_a_key),
            Err(Error::MalformedKeyEncoding(_))
        ));
        assert!(matches!(
            PrivateKey::decode(&not_a_key),
            Err(Error::MalformedKeyEncoding(_))
        ));
    }

    #[test]
    fn test_decode_rejects_wrong_key_half() {
        let public_as_private = PrivateKey::decode(&ALICE.public_key.encode()).unwrap_err();
        assert!(matches!(public_as_private, Error::MalformedKeyEncoding(_)));

        let private_as_public = PublicKey::decode(&ALICE.private_key.encode()).unwrap_err();
        assert!(matches!(private_as_public, Error::MalformedKeyEncoding(_)));
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut der = ALICE.public_key.as_der().to_vec();
        der.extend_from_slice(&[0, 0]);

        let err = PublicKey::decode(&KeyCodec::encode(&der)).unwrap_err();
        assert!(matches!(err, Error::MalformedKeyEncoding(_)));
    }

    #[test]
    fn test_private_key_debug_is_redacted() {
        let rendered = format!("{:?}", *ALICE);
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_symmetric_key_from_slice_checks_length() {
        assert!(SymmetricKey::from_slice(&[1u8; 32]).is_ok());
        assert!(matches!(
            SymmetricKey::from_slice(&[1u8; 16]),
            Err(Error::MalformedKeyEncoding(_))
        ));
    }

    #[test]
    fn test_random_ivs_differ() {
        let a = Iv::random(&RustCryptoProvider).unwrap();
        let b = Iv::random(&RustCryptoProvider).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_generator_relabels_provider_failures() {
        use crate::test_support::FailingProvider;

        let generator = KeyPairGenerator::new(FailingProvider);
        let err = generator.generate().unwrap_err();
        assert!(matches!(err, Error::KeyGenerationFailed(_)));
        assert!(err.is_fatal());
    }
}
