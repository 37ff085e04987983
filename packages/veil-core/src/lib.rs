//! # Veil Core
//!
//! End-to-end message confidentiality and vault access control for a
//! one-to-one chat application. The server only ever stores and forwards
//! opaque envelopes; plaintext exists on the two clients alone.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          VEIL CORE MODULES                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │  │ KeyPairGenerator │  │  EnvelopeCipher  │  │ PasswordKeyDeriver   │  │
//! │  │                  │  │                  │  │                      │  │
//! │  │ - RSA-2048       │  │ - AES-256-GCM    │  │ - PBKDF2-SHA256      │  │
//! │  │ - SPKI / PKCS#8  │  │ - RSA-OAEP wrap  │  │ - Vault key wrapping │  │
//! │  └────────┬─────────┘  └────────┬─────────┘  └──────────┬───────────┘  │
//! │           │                     │                       │              │
//! │           └─────────────────────┼───────────────────────┘              │
//! │                                 ▼                                      │
//! │                   ┌──────────────────────────┐                         │
//! │                   │  CryptoProvider + Codec  │                         │
//! │                   └──────────────────────────┘                         │
//! │                                                                         │
//! │  ┌───────────────────────────────────────────────────────────────────┐ │
//! │  │ VaultGuard                                                        │ │
//! │  │ - Failed-attempt counter, 24h lock window, escalation at 5        │ │
//! │  │ - Atomic updates through LockStateStore::compare_and_swap         │ │
//! │  └───────────────────────────────────────────────────────────────────┘ │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`crypto`] - Key pairs, envelopes, passcode key derivation
//! - [`vault`] - Lockout state machine and its store
//! - [`config`] - Tunable parameters
//!
//! ## Quick Start
//!
//! ```no_run
//! use veil_core::{EnvelopeCipher, KeyPairGenerator};
//!
//! # fn main() -> veil_core::Result<()> {
//! let bob = KeyPairGenerator::default().generate()?;
//! let cipher = EnvelopeCipher::default();
//!
//! let envelope = cipher.encrypt("meet at 6", &bob.public_key)?;
//! assert_eq!(cipher.decrypt(&envelope, &bob.private_key)?, "meet at 6");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod config;
pub mod crypto;
pub mod error;
/// Clock helpers for time-dependent operations.
pub mod time;
pub mod vault;

#[cfg(test)]
mod test_support;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use config::VeilConfig;
pub use crypto::{
    AsymmetricKeyPair, EncodedKeyPair, Envelope, EnvelopeCipher, KeyCodec, KeyPairGenerator,
    PasswordKeyDeriver, PrivateKey, PublicKey, SealedVaultKey, UNDECRYPTABLE_PLACEHOLDER,
};
pub use error::{Error, Result};
pub use vault::{AccessDecision, FailureOutcome, LockoutPolicy, VaultGuard, VaultId};

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
