//! # Crypto Provider
//!
//! The capability interface every higher-level component is written
//! against, and its one production implementation.
//!
//! ```text
//! ┌──────────────────────┐   ┌───────────────┐   ┌────────────────────┐
//! │  KeyPairGenerator    │   │ EnvelopeCipher│   │ PasswordKeyDeriver │
//! └──────────┬───────────┘   └───────┬───────┘   └─────────┬──────────┘
//!            └───────────────────────┼─────────────────────┘
//!                                    ▼
//!                    ┌───────────────────────────────┐
//!                    │   trait CryptoProvider        │
//!                    │   • generate_asymmetric_keypair│
//!                    │   • generate_symmetric_key    │
//!                    │   • encrypt / decrypt (AEAD)  │
//!                    │   • asymmetric_encrypt/decrypt│
//!                    │   • derive_key (PBKDF2)       │
//!                    └───────────────┬───────────────┘
//!                                    ▼
//!                    ┌───────────────────────────────┐
//!                    │   RustCryptoProvider          │
//!                    │   rsa + aes-gcm + pbkdf2      │
//!                    └───────────────────────────────┘
//! ```
//!
//! Every method is a stateless, independent computation. Any number of
//! calls may run concurrently.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce as AesNonce,
};
use rand::{rngs::OsRng, RngCore};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use super::keys::{
    AsymmetricKeyPair, Iv, PrivateKey, PublicKey, SymmetricKey, RSA_MODULUS_BITS,
    SYMMETRIC_KEY_SIZE,
};
use crate::error::{Error, Result};

/// Platform cryptographic capabilities
pub trait CryptoProvider: Send + Sync {
    /// Generate an RSA-2048 identity, exported as SPKI / PKCS#8 DER
    fn generate_asymmetric_keypair(&self) -> Result<AsymmetricKeyPair>;

    /// Fill `buf` from a cryptographically secure RNG
    fn random_bytes(&self, buf: &mut [u8]) -> Result<()>;

    /// Generate a fresh AES-256 key
    fn generate_symmetric_key(&self) -> Result<SymmetricKey> {
        let mut bytes = [0u8; SYMMETRIC_KEY_SIZE];
        self.random_bytes(&mut bytes)?;
        let key = SymmetricKey::from_bytes(bytes);
        bytes.zeroize();
        Ok(key)
    }

    /// AES-256-GCM encrypt; output is ciphertext followed by the 16-byte tag
    fn encrypt(&self, key: &SymmetricKey, iv: &Iv, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// AES-256-GCM decrypt; fails on any tag mismatch
    fn decrypt(&self, key: &SymmetricKey, iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>>;

    /// RSA-OAEP(SHA-256) encrypt a short payload for `recipient`
    fn asymmetric_encrypt(&self, recipient: &PublicKey, data: &[u8]) -> Result<Vec<u8>>;

    /// RSA-OAEP(SHA-256) decrypt with the owner's private key
    fn asymmetric_decrypt(&self, key: &PrivateKey, data: &[u8]) -> Result<Zeroizing<Vec<u8>>>;

    /// PBKDF2-HMAC-SHA256 a password into an AES-256 key
    fn derive_key(&self, password: &[u8], salt: &[u8], iterations: u32) -> Result<SymmetricKey>;
}

/// Production provider backed by the RustCrypto crates
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoProvider;

/// OAEP padding with SHA-256 for both the label hash and MGF1
fn oaep() -> Oaep {
    Oaep::new::<Sha256>()
}

impl CryptoProvider for RustCryptoProvider {
    fn generate_asymmetric_keypair(&self) -> Result<AsymmetricKeyPair> {
        let private = RsaPrivateKey::new(&mut OsRng, RSA_MODULUS_BITS).map_err(|e| {
            Error::KeyGenerationFailed(format!("RSA-{} generation failed: {}", RSA_MODULUS_BITS, e))
        })?;
        let public = RsaPublicKey::from(&private);

        let spki = public
            .to_public_key_der()
            .map_err(|e| Error::KeyGenerationFailed(format!("SPKI export failed: {}", e)))?;
        let pkcs8 = private
            .to_pkcs8_der()
            .map_err(|e| Error::KeyGenerationFailed(format!("PKCS#8 export failed: {}", e)))?;

        Ok(AsymmetricKeyPair {
            public_key: PublicKey::from_der(spki.as_bytes().to_vec()),
            private_key: PrivateKey::from_der(pkcs8.as_bytes().to_vec()),
        })
    }

    fn random_bytes(&self, buf: &mut [u8]) -> Result<()> {
        OsRng.try_fill_bytes(buf).map_err(|_| Error::RngFailed)
    }

    fn encrypt(&self, key: &SymmetricKey, iv: &Iv, plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| Error::EncryptionFailed(format!("Invalid key: {}", e)))?;

        cipher
            .encrypt(AesNonce::from_slice(iv.as_bytes()), plaintext)
            .map_err(|e| Error::EncryptionFailed(format!("Encryption failed: {}", e)))
    }

    fn decrypt(&self, key: &SymmetricKey, iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| Error::DecryptionFailed(format!("Invalid key: {}", e)))?;

        cipher
            .decrypt(AesNonce::from_slice(iv.as_bytes()), ciphertext)
            .map_err(|_| {
                Error::DecryptionFailed("Decryption failed: authentication tag mismatch".into())
            })
    }

    fn asymmetric_encrypt(&self, recipient: &PublicKey, data: &[u8]) -> Result<Vec<u8>> {
        let key = RsaPublicKey::from_public_key_der(recipient.as_der())
            .map_err(|e| Error::EncryptionFailed(format!("Invalid recipient public key: {}", e)))?;

        if key.size() * 8 < RSA_MODULUS_BITS {
            return Err(Error::EncryptionFailed(format!(
                "Recipient key is {} bits, at least {} required",
                key.size() * 8,
                RSA_MODULUS_BITS
            )));
        }

        key.encrypt(&mut OsRng, oaep(), data)
            .map_err(|e| Error::EncryptionFailed(format!("RSA-OAEP encryption failed: {}", e)))
    }

    fn asymmetric_decrypt(&self, key: &PrivateKey, data: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let key = RsaPrivateKey::from_pkcs8_der(key.as_der())
            .map_err(|e| Error::DecryptionFailed(format!("Invalid private key: {}", e)))?;

        key.decrypt(oaep(), data)
            .map(Zeroizing::new)
            .map_err(|_| Error::DecryptionFailed("RSA-OAEP key unwrap failed".into()))
    }

    fn derive_key(&self, password: &[u8], salt: &[u8], iterations: u32) -> Result<SymmetricKey> {
        if iterations == 0 {
            return Err(Error::KeyDerivationFailed(
                "PBKDF2 iteration count must be positive".into(),
            ));
        }

        let mut out = [0u8; SYMMETRIC_KEY_SIZE];
        pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out);
        let key = SymmetricKey::from_bytes(out);
        out.zeroize();

        Ok(key)
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
    fn test_aead_round_trip() {
        let provider = RustCryptoProvider;
        let key = SymmetricKey::from_bytes([42u8; 32]);
        let iv = Iv::from_bytes([7u8; 12]);

        let ciphertext = provider.encrypt(&key, &iv, b"Hello, World!").unwrap();
        // 16-byte GCM tag is appended
        assert_eq!(ciphertext.len(), 13 + 16);

        let plaintext = provider.decrypt(&key, &iv, &ciphertext).unwrap();
        assert_eq!(plaintext, b"Hello, World!");
    }

    #[test]
    fn test_aead_wrong_iv_fails() {
        let provider = RustCryptoProvider;
        let key = SymmetricKey::from_bytes([42u8; 32]);

        let ciphertext = provider
            .encrypt(&key, &Iv::from_bytes([1u8; 12]), b"secret")
            .unwrap();
        let result = provider.decrypt(&key, &Iv::from_bytes([2u8; 12]), &ciphertext);

        assert!(matches!(result, Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_rsa_oaep_round_trip() {
        let provider = RustCryptoProvider;
        let wrapped = provider
            .asymmetric_encrypt(&ALICE.public_key, &[9u8; 32])
            .unwrap();
        // RSA-2048 ciphertext is always one modulus long
        assert_eq!(wrapped.len(), 256);

        let unwrapped = provider
            .asymmetric_decrypt(&ALICE.private_key, &wrapped)
            .unwrap();
        assert_eq!(unwrapped.as_slice(), &[9u8; 32]);
    }

    #[test]
    fn test_rsa_oaep_wrong_private_key_fails() {
        let provider = RustCryptoProvider;
        let wrapped = provider
            .asymmetric_encrypt(&ALICE.public_key, &[9u8; 32])
            .unwrap();

        let result = provider.asymmetric_decrypt(&BOB.private_key, &wrapped);
        assert!(matches!(result, Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_garbage_public_key_is_encryption_error() {
        let provider = RustCryptoProvider;
        let bogus = PublicKey::from_der(vec![0x30, 0x03, 0x02, 0x01, 0x05]);

        let result = provider.asymmetric_encrypt(&bogus, &[0u8; 32]);
        assert!(matches!(result, Err(Error::EncryptionFailed(_))));
    }

    #[test]
    fn test_pbkdf2_known_answer() {
        // RFC 7914 section 11 PBKDF2-HMAC-SHA256 vector, first 32 bytes
        let key = RustCryptoProvider
            .derive_key(b"passwd", b"salt", 1)
            .unwrap();
        assert_eq!(
            &key.as_bytes()[..8],
            &[0x55, 0xac, 0x04, 0x6e, 0x56, 0xe3, 0x08, 0x9f]
        );
    }

    #[test]
    fn test_pbkdf2_rejects_zero_iterations() {
        let result = RustCryptoProvider.derive_key(b"pw", b"salt", 0);
        assert!(matches!(result, Err(Error::KeyDerivationFailed(_))));
    }
}
