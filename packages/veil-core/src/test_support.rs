//! Shared fixtures for unit tests.
//!
//! RSA-2048 generation is slow, so the two identities every test talks
//! about are generated once per test binary.

use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;
use zeroize::Zeroizing;

use crate::crypto::{
    AsymmetricKeyPair, CryptoProvider, Iv, PrivateKey, PublicKey, RustCryptoProvider, SymmetricKey,
};
use crate::error::{Error, Result};

pub static ALICE: Lazy<AsymmetricKeyPair> = Lazy::new(|| {
    RustCryptoProvider
        .generate_asymmetric_keypair()
        .expect("generate Alice")
});

pub static BOB: Lazy<AsymmetricKeyPair> = Lazy::new(|| {
    RustCryptoProvider
        .generate_asymmetric_keypair()
        .expect("generate Bob")
});

/// A provider whose entropy source is gone
pub struct FailingProvider;

impl CryptoProvider for FailingProvider {
    fn generate_asymmetric_keypair(&self) -> Result<AsymmetricKeyPair> {
        Err(Error::RngFailed)
    }

    fn random_bytes(&self, _buf: &mut [u8]) -> Result<()> {
        Err(Error::RngFailed)
    }

    fn encrypt(&self, _key: &SymmetricKey, _iv: &Iv, _plaintext: &[u8]) -> Result<Vec<u8>> {
        Err(Error::RngFailed)
    }

    fn decrypt(&self, _key: &SymmetricKey, _iv: &Iv, _ciphertext: &[u8]) -> Result<Vec<u8>> {
        Err(Error::RngFailed)
    }

    fn asymmetric_encrypt(&self, _recipient: &PublicKey, _data: &[u8]) -> Result<Vec<u8>> {
        Err(Error::RngFailed)
    }

    fn asymmetric_decrypt(&self, _key: &PrivateKey, _data: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        Err(Error::RngFailed)
    }

    fn derive_key(&self, _password: &[u8], _salt: &[u8], _iterations: u32) -> Result<SymmetricKey> {
        Err(Error::RngFailed)
    }
}

/// Toy provider with no real cryptography
///
/// "Public" and "private" keys are the same random id, the cipher is a
/// keyed XOR with a checksum tag. Good enough to show the envelope and
/// KDF logic only talk to the trait.
pub struct MirrorProvider;

static MIRROR_COUNTER: AtomicU64 = AtomicU64::new(1);

const MIRROR_TAG_LEN: usize = 8;

fn mirror_tag(key: &[u8], iv: &[u8], body: &[u8]) -> [u8; MIRROR_TAG_LEN] {
    let mut acc: u64 = 0xcbf2_9ce4_8422_2325;
    for b in key.iter().chain(iv).chain(body) {
        acc ^= *b as u64;
        acc = acc.wrapping_mul(0x0100_0000_01b3);
    }
    acc.to_be_bytes()
}

fn mirror_xor(key: &[u8], iv: &[u8], data: &[u8]) -> Vec<u8> {
    data.iter()
        .enumerate()
        .map(|(i, b)| b ^ key[i % key.len()] ^ iv[i % iv.len()])
        .collect()
}

impl CryptoProvider for MirrorProvider {
    fn generate_asymmetric_keypair(&self) -> Result<AsymmetricKeyPair> {
        let mut id = [0u8; 16];
        self.random_bytes(&mut id)?;
        Ok(AsymmetricKeyPair {
            public_key: PublicKey::from_der(id.to_vec()),
            private_key: PrivateKey::from_der(id.to_vec()),
        })
    }

    fn random_bytes(&self, buf: &mut [u8]) -> Result<()> {
        for chunk in buf.chunks_mut(8) {
            let n = MIRROR_COUNTER.fetch_add(1, Ordering::Relaxed).to_be_bytes();
            chunk.copy_from_slice(&n[..chunk.len()]);
        }
        Ok(())
    }

    fn encrypt(&self, key: &SymmetricKey, iv: &Iv, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut out = mirror_xor(key.as_bytes(), iv.as_bytes(), plaintext);
        out.extend_from_slice(&mirror_tag(key.as_bytes(), iv.as_bytes(), plaintext));
        Ok(out)
    }

    fn decrypt(&self, key: &SymmetricKey, iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < MIRROR_TAG_LEN {
            return Err(Error::DecryptionFailed("too short".into()));
        }
        let (body, tag) = ciphertext.split_at(ciphertext.len() - MIRROR_TAG_LEN);
        let plaintext = mirror_xor(key.as_bytes(), iv.as_bytes(), body);
        if mirror_tag(key.as_bytes(), iv.as_bytes(), &plaintext) != tag {
            return Err(Error::DecryptionFailed("tag mismatch".into()));
        }
        Ok(plaintext)
    }

    fn asymmetric_encrypt(&self, recipient: &PublicKey, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = recipient.as_der().to_vec();
        out.extend(mirror_xor(recipient.as_der(), &[0x5a], data));
        Ok(out)
    }

    fn asymmetric_decrypt(&self, key: &PrivateKey, data: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let id = key.as_der();
        match data.strip_prefix(id) {
            Some(body) => Ok(Zeroizing::new(mirror_xor(id, &[0x5a], body))),
            None => Err(Error::DecryptionFailed("not addressed to this key".into())),
        }
    }

    fn derive_key(&self, password: &[u8], salt: &[u8], iterations: u32) -> Result<SymmetricKey> {
        let mut out = [0u8; 32];
        for (i, slot) in out.iter_mut().enumerate() {
            let seed = [&[i as u8][..], &iterations.to_be_bytes()].concat();
            *slot = mirror_tag(password, salt, &seed)[i % MIRROR_TAG_LEN];
        }
        Ok(SymmetricKey::from_bytes(out))
    }
}
