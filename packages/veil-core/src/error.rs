//! # Error Handling
//!
//! Error types for Veil Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                     │
//! │  │   ├── KeyGenerationFailed   - No key pair could be produced (fatal) │
//! │  │   ├── MalformedKeyEncoding  - Bad base64 / wrong key length         │
//! │  │   ├── EncryptionFailed      - Envelope could not be sealed          │
//! │  │   ├── DecryptionFailed      - Wrong key, tampered or malformed      │
//! │  │   ├── KeyDerivationFailed   - PBKDF2 could not run                  │
//! │  │   └── RngFailed             - OS randomness unavailable             │
//! │  │                                                                      │
//! │  ├── Vault Storage Errors                                              │
//! │  │   ├── StorageContention     - CAS retries exhausted                 │
//! │  │   └── StorageError          - Backing store failed                  │
//! │  │                                                                      │
//! │  ├── Configuration Errors                                              │
//! │  │   └── InvalidConfig         - Policy or KDF parameters rejected     │
//! │  │                                                                      │
//! │  └── Internal Errors                                                   │
//! │      ├── SerializationError                                            │
//! │      └── DeserializationError                                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Recovery Rules
//!
//! | Error | Caller behavior |
//! |-------|-----------------|
//! | `KeyGenerationFailed` | Abort registration, no partial key pair exists |
//! | `MalformedKeyEncoding` | Reject that key, re-fetch or re-enter it |
//! | `EncryptionFailed` | Message not sent, keep plaintext for retry |
//! | `DecryptionFailed` | Show the placeholder for that one message |
//! | `KeyDerivationFailed` | Fail the wrap/unwrap call |
//!
//! No error path ever substitutes a default key or a default plaintext.

use thiserror::Error;

/// Result type alias for Veil Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Veil Core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Crypto Errors (300-399)
    // ========================================================================

    /// Key pair generation failed
    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// Key or field encoding is not valid base64 or has the wrong length
    #[error("Malformed key encoding: {0}")]
    MalformedKeyEncoding(String),

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Key derivation failed
    #[error("Failed to derive key: {0}")]
    KeyDerivationFailed(String),

    /// Random number generation failed
    #[error("Random number generation failed")]
    RngFailed,

    // ========================================================================
    // Vault Storage Errors (400-499)
    // ========================================================================

    /// Concurrent writers kept invalidating the lock state
    #[error("Vault lock state for {0} is too contended, giving up")]
    StorageContention(String),

    /// The lock state store failed
    #[error("Vault storage error: {0}")]
    StorageError(String),

    // ========================================================================
    // Configuration Errors (800-899)
    // ========================================================================

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl Error {
    /// Get a stable numeric error code
    ///
    /// Error codes are organized by category:
    /// - 300-399: Crypto
    /// - 400-499: Vault storage
    /// - 800-899: Configuration
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            // Crypto (300-399)
            Error::KeyGenerationFailed(_) => 300,
            Error::MalformedKeyEncoding(_) => 301,
            Error::EncryptionFailed(_) => 302,
            Error::DecryptionFailed(_) => 303,
            Error::KeyDerivationFailed(_) => 304,
            Error::RngFailed => 305,

            // Vault storage (400-499)
            Error::StorageContention(_) => 400,
            Error::StorageError(_) => 401,

            // Configuration (800-899)
            Error::InvalidConfig(_) => 800,

            // Internal (900-999)
            Error::SerializationError(_) => 900,
            Error::DeserializationError(_) => 901,
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors affect only the one key, message or attempt
    /// that produced them; the session carries on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::MalformedKeyEncoding(_)
                | Error::EncryptionFailed(_)
                | Error::DecryptionFailed(_)
                | Error::StorageContention(_)
        )
    }

    /// Check if this error must abort the operation that raised it
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::KeyGenerationFailed(_) | Error::KeyDerivationFailed(_) | Error::RngFailed
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            Error::DeserializationError(err.to_string())
        } else {
            Error::SerializationError(err.to_string())
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
