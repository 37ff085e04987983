//! # Passcode Key Derivation
//!
//! Turns a short human passcode into an AES-256 key and uses it to wrap a
//! vault's master key.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       VAULT KEY SEALING                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  passcode ──┐                                                          │
//! │             ├──► PBKDF2-HMAC-SHA256 (100,000 rounds) ──► passcode key  │
//! │  salt (16) ─┘                                               │           │
//! │                                                             ▼           │
//! │  vault master key (32) ──► AES-256-GCM(passcode key, fresh IV)         │
//! │                                                             │           │
//! │                                                             ▼           │
//! │                        SealedVaultKey { salt, iv, data }                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every vault gets its own random salt, stored next to the wrapped key.
//! Changing the passcode produces a brand new record (new salt, new IV);
//! the old record is superseded, never patched.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::codec::{EncodedBytes, KeyCodec};
use super::keys::{Iv, SymmetricKey, IV_SIZE, SYMMETRIC_KEY_SIZE};
use super::provider::{CryptoProvider, RustCryptoProvider};
use crate::error::{Error, Result};

/// Default PBKDF2 round count
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Default and minimum salt length in bytes
pub const SALT_SIZE: usize = 16;

/// Size of a vault master key in bytes
pub const VAULT_KEY_SIZE: usize = SYMMETRIC_KEY_SIZE;

/// Tunable key derivation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    /// PBKDF2 round count
    pub iterations: u32,
    /// Length of freshly generated salts
    pub salt_len: usize,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: PBKDF2_ITERATIONS,
            salt_len: SALT_SIZE,
        }
    }
}

impl KdfParams {
    /// Reject parameters that would weaken the derivation
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::InvalidConfig(
                "kdf.iterations must be positive".into(),
            ));
        }
        if self.salt_len < SALT_SIZE {
            return Err(Error::InvalidConfig(format!(
                "kdf.salt_len must be at least {} bytes, got {}",
                SALT_SIZE, self.salt_len
            )));
        }
        Ok(())
    }
}

/// A vault master key encrypted under a passcode-derived key
///
/// Same `{iv, data}` shape as an envelope, minus the `key` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedVaultKey {
    /// Base64 of the 12-byte IV
    pub iv: EncodedBytes,
    /// Base64 of the AES-GCM ciphertext with tag
    #[serde(rename = "data")]
    pub ciphertext: EncodedBytes,
}

/// A wrapped vault key together with the salt it was derived with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedVaultKey {
    /// Base64 of the per-vault random salt
    pub salt: EncodedBytes,
    /// The wrapped master key
    #[serde(flatten)]
    pub wrapped: WrappedVaultKey,
}

impl SealedVaultKey {
    /// Serialize to `{"salt","iv","data"}`
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse the JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Derives passcode keys and wraps vault master keys with them
pub struct PasswordKeyDeriver<P = RustCryptoProvider> {
    provider: P,
    params: KdfParams,
}

impl<P: CryptoProvider> PasswordKeyDeriver<P> {
    /// Create a deriver with the default parameters
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            params: KdfParams::default(),
        }
    }

    /// Create a deriver with custom parameters
    pub fn with_params(provider: P, params: KdfParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { provider, params })
    }

    /// Parameters in use
    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    /// Derive an AES-256 key from `password` and `salt`
    ///
    /// Pure in its inputs: the same password and salt always give the
    /// same key.
    pub fn derive(&self, password: &str, salt: &[u8]) -> Result<SymmetricKey> {
        self.provider
            .derive_key(password.as_bytes(), salt, self.params.iterations)
            .map_err(|e| match e {
                Error::KeyDerivationFailed(_) => e,
                other => Error::KeyDerivationFailed(other.to_string()),
            })
    }

    /// Encrypt `vault_key` under the key derived from `password` and `salt`
    ///
    /// A fresh IV is drawn for every call.
    pub fn wrap(&self, vault_key: &[u8], password: &str, salt: &[u8]) -> Result<WrappedVaultKey> {
        let key = self.derive(password, salt)?;
        let iv = Iv::random(&self.provider)?;
        let ciphertext = self.provider.encrypt(&key, &iv, vault_key)?;

        Ok(WrappedVaultKey {
            iv: KeyCodec::encode(iv.as_bytes()),
            ciphertext: KeyCodec::encode(&ciphertext),
        })
    }

    /// Recover a vault key
    ///
    /// ## Errors
    ///
    /// `DecryptionFailed` on a wrong password or a tampered or malformed
    /// record. `KeyDerivationFailed` if the derivation itself cannot run.
    pub fn unwrap(
        &self,
        wrapped: &WrappedVaultKey,
        password: &str,
        salt: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        let iv = KeyCodec::decode_exact::<IV_SIZE>(&wrapped.iv, "iv")
            .map_err(|e| Error::DecryptionFailed(e.to_string()))?;
        let ciphertext = KeyCodec::decode(&wrapped.ciphertext)
            .map_err(|e| Error::DecryptionFailed(e.to_string()))?;

        let key = self.derive(password, salt)?;
        self.provider
            .decrypt(&key, &Iv::from_bytes(iv), &ciphertext)
            .map(Zeroizing::new)
            .map_err(|e| match e {
                Error::DecryptionFailed(_) => e,
                other => Error::DecryptionFailed(other.to_string()),
            })
    }

    /// Generate a random vault master key from the provider's RNG
    pub fn generate_vault_key(&self) -> Result<Zeroizing<Vec<u8>>> {
        let key = self.provider.generate_symmetric_key()?;
        Ok(Zeroizing::new(key.as_bytes().to_vec()))
    }

    /// Draw a fresh random salt of the configured length
    pub fn generate_salt(&self) -> Result<Vec<u8>> {
        let mut salt = vec![0u8; self.params.salt_len];
        self.provider.random_bytes(&mut salt)?;
        Ok(salt)
    }

    /// Wrap `vault_key` under `passcode` with a fresh salt
    pub fn seal(&self, vault_key: &[u8], passcode: &str) -> Result<SealedVaultKey> {
        let salt = self.generate_salt()?;
        let wrapped = self.wrap(vault_key, passcode, &salt)?;

        tracing::debug!(
            salt_len = salt.len(),
            iterations = self.params.iterations,
            "Sealed vault key"
        );

        Ok(SealedVaultKey {
            salt: KeyCodec::encode(&salt),
            wrapped,
        })
    }

    /// Recover the vault key from a sealed record
    pub fn open(&self, sealed: &SealedVaultKey, passcode: &str) -> Result<Zeroizing<Vec<u8>>> {
        let salt = KeyCodec::decode(&sealed.salt)
            .map_err(|e| Error::DecryptionFailed(e.to_string()))?;
        self.unwrap(&sealed.wrapped, passcode, &salt)
    }

    /// Change the passcode of a sealed record
    ///
    /// Opens with `old_passcode` and seals again under `new_passcode` with
    /// a new salt and IV.
    pub fn reseal(
        &self,
        sealed: &SealedVaultKey,
        old_passcode: &str,
        new_passcode: &str,
    ) -> Result<SealedVaultKey> {
        let vault_key = self.open(sealed, old_passcode)?;
        self.seal(&vault_key, new_passcode)
    }
}

impl Default for PasswordKeyDeriver<RustCryptoProvider> {
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
    use crate::test_support::{FailingProvider, MirrorProvider};

    // Full-strength derivation is exercised once; the rest run cheap.
    fn fast() -> PasswordKeyDeriver {
        PasswordKeyDeriver::with_params(
            RustCryptoProvider,
            KdfParams {
                iterations: 1_000,
                salt_len: SALT_SIZE,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_default_params() {
        let deriver = PasswordKeyDeriver::default();
        assert_eq!(deriver.params().iterations, 100_000);
        assert_eq!(deriver.params().salt_len, 16);
    }

    #[test]
    fn test_derive_is_deterministic() {
        let deriver = PasswordKeyDeriver::default();
        let a = deriver.derive("1809", b"per-vault-salt!!").unwrap();
        let b = deriver.derive("1809", b"per-vault-salt!!").unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_derive_depends_on_password_and_salt() {
        let deriver = fast();
        let base = deriver.derive("1809", b"salt-one-16bytes").unwrap();
        let other_pw = deriver.derive("0404", b"salt-one-16bytes").unwrap();
        let other_salt = deriver.derive("1809", b"salt-two-16bytes").unwrap();

        assert_ne!(base.as_bytes(), other_pw.as_bytes());
        assert_ne!(base.as_bytes(), other_salt.as_bytes());
    }

    #[test]
    fn test_wrap_unwrap_round_trip() {
        let deriver = fast();
        let vault_key = deriver.generate_vault_key().unwrap();
        let salt = deriver.generate_salt().unwrap();

        let wrapped = deriver.wrap(&vault_key, "1809", &salt).unwrap();
        let recovered = deriver.unwrap(&wrapped, "1809", &salt).unwrap();
        assert_eq!(recovered.as_slice(), vault_key.as_slice());
    }

    #[test]
    fn test_unwrap_wrong_password_fails() {
        let deriver = fast();
        let salt = deriver.generate_salt().unwrap();
        let wrapped = deriver.wrap(&[3u8; 32], "1809", &salt).unwrap();

        let result = deriver.unwrap(&wrapped, "1808", &salt);
        assert!(matches!(result, Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_unwrap_wrong_salt_fails() {
        let deriver = fast();
        let wrapped = deriver.wrap(&[3u8; 32], "1809", b"salt-one-16bytes").unwrap();

        let result = deriver.unwrap(&wrapped, "1809", b"salt-two-16bytes");
        assert!(matches!(result, Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_unwrap_tampered_fails() {
        let deriver = fast();
        let salt = deriver.generate_salt().unwrap();
        let wrapped = deriver.wrap(&[3u8; 32], "1809", &salt).unwrap();

        let mut raw = KeyCodec::decode(&wrapped.ciphertext).unwrap();
        raw[0] ^= 0x01;
        let tampered = WrappedVaultKey {
            iv: wrapped.iv.clone(),
            ciphertext: KeyCodec::encode(&raw),
        };

        let result = deriver.unwrap(&tampered, "1809", &salt);
        assert!(matches!(result, Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_wrap_uses_fresh_iv() {
        let deriver = fast();
        let salt = deriver.generate_salt().unwrap();
        let a = deriver.wrap(&[3u8; 32], "1809", &salt).unwrap();
        let b = deriver.wrap(&[3u8; 32], "1809", &salt).unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_seal_open_and_json_shape() {
        let deriver = fast();
        let vault_key = deriver.generate_vault_key().unwrap();
        let sealed = deriver.seal(&vault_key, "0404").unwrap();

        let json = sealed.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 3);
        for field in ["salt", "iv", "data"] {
            assert!(object.contains_key(field), "missing {}", field);
        }

        let parsed = SealedVaultKey::from_json(&json).unwrap();
        let opened = deriver.open(&parsed, "0404").unwrap();
        assert_eq!(opened.as_slice(), vault_key.as_slice());
    }

    #[test]
    fn test_each_seal_gets_its_own_salt() {
        let deriver = fast();
        let a = deriver.seal(&[1u8; 32], "0404").unwrap();
        let b = deriver.seal(&[1u8; 32], "0404").unwrap();
        assert_ne!(a.salt, b.salt);
        assert_eq!(KeyCodec::decode(&a.salt).unwrap().len(), SALT_SIZE);
    }

    #[test]
    fn test_reseal_changes_passcode() {
        let deriver = fast();
        let vault_key = deriver.generate_vault_key().unwrap();
        let sealed = deriver.seal(&vault_key, "old").unwrap();

        let resealed = deriver.reseal(&sealed, "old", "new").unwrap();
        assert_ne!(resealed.salt, sealed.salt);
        assert_eq!(
            deriver.open(&resealed, "new").unwrap().as_slice(),
            vault_key.as_slice()
        );
        assert!(matches!(
            deriver.open(&resealed, "old"),
            Err(Error::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_reseal_requires_old_passcode() {
        let deriver = fast();
        let sealed = deriver.seal(&[1u8; 32], "old").unwrap();
        assert!(matches!(
            deriver.reseal(&sealed, "guess", "new"),
            Err(Error::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_generate_vault_key_size() {
        let deriver = fast();
        let a = deriver.generate_vault_key().unwrap();
        let b = deriver.generate_vault_key().unwrap();
        assert_eq!(a.len(), VAULT_KEY_SIZE);
        assert_ne!(a.as_slice(), b.as_slice());
    }

    #[test]
    fn test_generate_vault_key_uses_injected_provider() {
        let err = PasswordKeyDeriver::new(FailingProvider)
            .generate_vault_key()
            .unwrap_err();
        assert!(matches!(err, Error::RngFailed));

        let mirror = PasswordKeyDeriver::new(MirrorProvider);
        let key = mirror.generate_vault_key().unwrap();
        assert_eq!(key.len(), VAULT_KEY_SIZE);
        let sealed = mirror.seal(&key, "1809").unwrap();
        assert_eq!(mirror.open(&sealed, "1809").unwrap().as_slice(), key.as_slice());
    }

    #[test]
    fn test_params_validation() {
        assert!(KdfParams::default().validate().is_ok());

        let zero = KdfParams {
            iterations: 0,
            ..KdfParams::default()
        };
        assert!(matches!(zero.validate(), Err(Error::InvalidConfig(_))));

        let short_salt = KdfParams {
            salt_len: 8,
            ..KdfParams::default()
        };
        assert!(PasswordKeyDeriver::with_params(RustCryptoProvider, short_salt).is_err());
    }

    #[test]
    fn test_provider_failure_is_key_derivation_error() {
        let deriver = PasswordKeyDeriver::new(FailingProvider);
        let err = deriver.derive("1809", b"salt").err().unwrap();
        assert!(matches!(err, Error::KeyDerivationFailed(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_provider_agnostic_seal_open() {
        let deriver = PasswordKeyDeriver::new(MirrorProvider);
        let sealed = deriver.seal(&[9u8; 32], "1809").unwrap();

        assert_eq!(deriver.open(&sealed, "1809").unwrap().as_slice(), &[9u8; 32]);
        assert!(deriver.open(&sealed, "0000").is_err());
    }
}
