//! # Key Codec
//!
//! Transport-safe text encoding for key material and envelope fields.
//!
//! Everything that crosses the storage or network boundary (public keys,
//! the owner's private key backup, and every envelope field) is carried
//! as standard base64 with padding. Decoding is strict: non-canonical
//! padding, URL-safe alphabet characters and embedded whitespace are all
//! rejected rather than guessed at.
//!
//! ```text
//! raw bytes ──encode──► "MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8A..."
//!     ▲                                   │
//!     └──────────────decode───────────────┘
//! ```

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Base64 text form of some byte string
///
/// Construction does not validate; validation happens on decode so a
/// bad value is reported at the point it is actually used.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedBytes(String);

/// Base64 text form of one half of a key pair
pub type EncodedKey = EncodedBytes;

impl EncodedBytes {
    /// Wrap an already-encoded string
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Borrow the base64 text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the base64 text
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EncodedBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Private keys travel through this type too, keep it out of debug logs.
impl fmt::Debug for EncodedBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncodedBytes({} chars)", self.0.len())
    }
}

impl From<String> for EncodedBytes {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Base64 codec for keys and envelope fields
pub struct KeyCodec;

impl KeyCodec {
    /// Encode raw bytes as standard base64
    pub fn encode(bytes: &[u8]) -> EncodedBytes {
        EncodedBytes(STANDARD.encode(bytes))
    }

    /// Decode base64 text back into raw bytes
    ///
    /// ## Errors
    ///
    /// `MalformedKeyEncoding` if the text is not canonical standard base64.
    pub fn decode(encoded: &EncodedBytes) -> Result<Vec<u8>> {
        STANDARD
            .decode(encoded.as_str())
            .map_err(|e| Error::MalformedKeyEncoding(format!("Invalid base64: {}", e)))
    }

    /// Decode into a fixed-size array
    ///
    /// `what` names the field in the error message.
    pub fn decode_exact<const N: usize>(encoded: &EncodedBytes, what: &str) -> Result<[u8; N]> {
        let bytes = Self::decode(encoded)?;
        <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| {
            Error::MalformedKeyEncoding(format!(
                "{} must be {} bytes, got {}",
                what,
                N,
                bytes.len()
            ))
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
