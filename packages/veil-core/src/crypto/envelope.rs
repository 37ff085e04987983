//! # Envelope Encryption
//!
//! Hybrid encryption of chat payloads for exactly one recipient.
//!
//! ## Sealing Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ENVELOPE ENCRYPTION FLOW                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  SENDER                                                                │
//! │  ─────────────────────────────────────────────────────────────────      │
//! │                                                                         │
//! │  Step 1: Fresh content key          AES-256, 32 random bytes            │
//! │  Step 2: Fresh IV                   12 random bytes                     │
//! │  Step 3: AES-256-GCM(content key, IV, plaintext) → data + 16-byte tag  │
//! │  Step 4: RSA-OAEP-SHA256(recipient public key, content key) → key      │
//! │                                                                         │
//! │  Output: {"iv": b64, "key": b64, "data": b64}                          │
//! │                                                                         │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  RECIPIENT                                                             │
//! │  ─────────────────────────────────────────────────────────────────      │
//! │                                                                         │
//! │  Step 1: RSA-OAEP decrypt "key" with own private key → content key     │
//! │  Step 2: AES-256-GCM decrypt "data" with content key and "iv"          │
//! │          (any tampered bit fails the tag check)                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Properties
//!
//! | Property | Guarantee |
//! |----------|-----------|
//! | Confidentiality | Only the holder of the recipient private key can read it |
//! | Integrity | Any modification of iv, key or data is detected |
//! | Key freshness | One content key per envelope, never reused |
//! | Forward Secrecy | None: a leaked private key opens every past envelope |

use serde::{Deserialize, Serialize};

use super::codec::{EncodedBytes, KeyCodec};
use super::keys::{Iv, PrivateKey, PublicKey, SymmetricKey, IV_SIZE};
use super::provider::{CryptoProvider, RustCryptoProvider};
use crate::error::{Error, Result};

/// Text shown in place of a message that could not be decrypted
pub const UNDECRYPTABLE_PLACEHOLDER: &str = "[Encrypted message: unable to decrypt]";

/// One encrypted message body
///
/// Self-contained: together with the recipient's private key it is
/// everything needed to recover the plaintext. Stored and forwarded
/// opaquely by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Base64 of the 12-byte AES-GCM IV
    pub iv: EncodedBytes,
    /// Base64 of the RSA-OAEP encrypted content key
    #[serde(rename = "key")]
    pub wrapped_key: EncodedBytes,
    /// Base64 of the AES-GCM ciphertext with tag
    #[serde(rename = "data")]
    pub ciphertext: EncodedBytes,
}

impl Envelope {
    /// Serialize to the `{"iv","key","data"}` wire form
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse the wire form
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Seals and opens envelopes
pub struct EnvelopeCipher<P = RustCryptoProvider> {
    provider: P,
}

impl<P: CryptoProvider> EnvelopeCipher<P> {
    /// Create a cipher backed by `provider`
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Encrypt `plaintext` for the holder of `recipient`'s private key
    ///
    /// ## Errors
    ///
    /// `EncryptionFailed` if the recipient key is malformed or the provider
    /// rejects any step. Nothing was sent; the caller still owns the
    /// plaintext and can retry once it has a corrected key.
    pub fn encrypt(&self, plaintext: &str, recipient: &PublicKey) -> Result<Envelope> {
        let content_key = self
            .provider
            .generate_symmetric_key()
            .map_err(encryption_error)?;
        let iv = Iv::random(&self.provider).map_err(encryption_error)?;

        let ciphertext = self
            .provider
            .encrypt(&content_key, &iv, plaintext.as_bytes())
            .map_err(encryption_error)?;
        let wrapped_key = self
            .provider
            .asymmetric_encrypt(recipient, content_key.as_bytes())
            .map_err(encryption_error)?;

        tracing::debug!(
            plaintext_len = plaintext.len(),
            ciphertext_len = ciphertext.len(),
            "Sealed envelope"
        );

        Ok(Envelope {
            iv: KeyCodec::encode(iv.as_bytes()),
            wrapped_key: KeyCodec::encode(&wrapped_key),
            ciphertext: KeyCodec::encode(&ciphertext),
        })
    }

    /// Decrypt an envelope with the local private key
    ///
    /// Returns the exact original plaintext or an error; the authenticated
    /// symmetric step means there is no path that yields altered text.
    ///
    /// ## Errors
    ///
    /// `DecryptionFailed` if the private key does not match, any field was
    /// tampered with, or any field is malformed.
    pub fn decrypt(&self, envelope: &Envelope, private_key: &PrivateKey) -> Result<String> {
        let iv = KeyCodec::decode_exact::<IV_SIZE>(&envelope.iv, "iv").map_err(decryption_error)?;
        let wrapped_key = KeyCodec::decode(&envelope.wrapped_key).map_err(decryption_error)?;
        let ciphertext = KeyCodec::decode(&envelope.ciphertext).map_err(decryption_error)?;

        let raw_key = self
            .provider
            .asymmetric_decrypt(private_key, &wrapped_key)
            .map_err(decryption_error)?;
        let content_key = SymmetricKey::from_slice(&raw_key).map_err(decryption_error)?;

        let plaintext = self
            .provider
            .decrypt(&content_key, &Iv::from_bytes(iv), &ciphertext)
            .map_err(decryption_error)?;

        String::from_utf8(plaintext)
            .map_err(|_| Error::DecryptionFailed("Plaintext is not valid UTF-8".into()))
    }

    /// Encrypt and serialize in one step
    pub fn encrypt_to_json(&self, plaintext: &str, recipient: &PublicKey) -> Result<String> {
        self.encrypt(plaintext, recipient)?
            .to_json()
            .map_err(encryption_error)
    }

    /// Parse and decrypt in one step
    ///
    /// A payload that is not a well-formed envelope is a `DecryptionFailed`
    /// like any other unreadable message.
    pub fn decrypt_json(&self, json: &str, private_key: &PrivateKey) -> Result<String> {
        let envelope = Envelope::from_json(json).map_err(decryption_error)?;
        self.decrypt(&envelope, private_key)
    }

    /// Decrypt for display
    ///
    /// Returns the plaintext, or [`UNDECRYPTABLE_PLACEHOLDER`] when the
    /// message cannot be read. Never returns partial plaintext.
    pub fn open_or_placeholder(&self, json: &str, private_key: &PrivateKey) -> String {
        match self.decrypt_json(json, private_key) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                tracing::debug!(code = e.code(), "Showing placeholder for undecryptable message");
                UNDECRYPTABLE_PLACEHOLDER.to_string()
            }
        }
    }
}

impl Default for EnvelopeCipher<RustCryptoProvider> {
    fn default() -> Self {
        Self::new(RustCryptoProvider)
    }
}

fn encryption_error(err: Error) -> Error {
    match err {
        Error::EncryptionFailed(_) => err,
        other => Error::EncryptionFailed(other.to_string()),
    }
}

fn decryption_error(err: Error) -> Error {
    match err {
        Error::DecryptionFailed(_) => err,
        other => Error::DecryptionFailed(other.to_string()),
    }
}

// ============================================================================
// TESTS
// ============================================================================
