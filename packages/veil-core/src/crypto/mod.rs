//! # Cryptography Module
//!
//! Message confidentiality for Veil: per-user RSA identities, hybrid
//! envelopes for chat messages, and passcode-wrapped vault keys.
//!
//! ## Security Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    IDENTITY (per user)                          │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  KeyPairGenerator ──► RSA-2048 (OAEP / SHA-256)                │   │
//! │  │                          │                                      │   │
//! │  │            ┌─────────────┴─────────────┐                       │   │
//! │  │            ▼                           ▼                       │   │
//! │  │  ┌─────────────────┐         ┌─────────────────┐              │   │
//! │  │  │  Public Key     │         │  Private Key    │              │   │
//! │  │  │  SPKI, base64   │         │  PKCS#8, base64 │              │   │
//! │  │  │  shared freely  │         │  owner only     │              │   │
//! │  │  └─────────────────┘         └─────────────────┘              │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 MESSAGE ENCRYPTION                              │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  1. Fresh AES-256 content key + 96-bit IV per message          │   │
//! │  │  2. AES-256-GCM over the plaintext                             │   │
//! │  │  3. RSA-OAEP wraps the content key for the recipient           │   │
//! │  │                                                                 │   │
//! │  │  Envelope = {"iv", "key", "data"}                              │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 VAULT KEY WRAPPING                              │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  PBKDF2-HMAC-SHA256(passcode, per-vault salt, 100k rounds)     │   │
//! │  │  → AES-256-GCM wraps the 32-byte vault master key              │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices & Rationale
//!
//! | Algorithm | Purpose | Why Chosen |
//! |-----------|---------|------------|
//! | RSA-2048 OAEP | Content key wrapping | Interoperable with browser WebCrypto |
//! | AES-256-GCM | Encryption | Hardware acceleration, AEAD |
//! | PBKDF2-SHA256 | Passcode stretching | Available everywhere, tunable cost |
//!
//! ## Security Considerations
//!
//! 1. **Key Zeroization**: Symmetric and private keys are zeroized when dropped
//! 2. **Secure Random**: Using `rand::rngs::OsRng` for cryptographic randomness
//! 3. **No Key Reuse**: A new content key and IV for every envelope
//! 4. **No Forward Secrecy**: A leaked private key opens all past envelopes

mod codec;
mod envelope;
mod kdf;
mod keys;
mod provider;

pub use codec::{EncodedBytes, EncodedKey, KeyCodec};
pub use envelope::{Envelope, EnvelopeCipher, UNDECRYPTABLE_PLACEHOLDER};
pub use kdf::{
    KdfParams, PasswordKeyDeriver, SealedVaultKey, WrappedVaultKey, PBKDF2_ITERATIONS, SALT_SIZE,
    VAULT_KEY_SIZE,
};
pub use keys::{
    AsymmetricKeyPair, EncodedKeyPair, Iv, KeyPairGenerator, PrivateKey, PublicKey, SymmetricKey,
    IV_SIZE, RSA_MODULUS_BITS, SYMMETRIC_KEY_SIZE,
};
pub use provider::{CryptoProvider, RustCryptoProvider};
