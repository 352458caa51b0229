//! Cryptographic provider boundary
//!
//! [`HybridCipher`](crate::HybridCipher) never touches KEM or AEAD
//! internals directly; it drives a [`Provider`]. Any conforming
//! implementation (linked library, co-process, hardware module) can be
//! injected. [`NativeProvider`] is the in-process default.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HybridCipher               │
//! ├─────────────────────────────────────────┤
//! │             Provider Trait              │
//! ├────────────────────┬────────────────────┤
//! │   NativeProvider   │  external provider │
//! ├────────────────────┴────────────────────┤
//! │  ML-KEM │ X25519 │ AES-GCM │ ChaCha20   │
//! └─────────────────────────────────────────┘
//! ```

use crate::{
    kem::{self, SharedSecret},
    keys::KeyPair,
    registry::AlgorithmParams,
    symmetric::{Aead, AeadCipher, Nonce, SymmetricKey},
    Result,
};

/// KEM and AEAD capabilities consumed by the protocol core
///
/// Implementations must be reentrant: calls arrive concurrently from
/// multiple threads with no locking on the caller side.
#[cfg_attr(test, mockall::automock)]
pub trait Provider: Send + Sync {
    /// Generate a key pair for `params.id`
    fn generate(&self, params: &AlgorithmParams) -> Result<KeyPair>;

    /// Encapsulate a fresh shared secret to `public_key`.
    ///
    /// Returns `(kem_ciphertext, shared_secret)`.
    fn encapsulate(
        &self,
        params: &AlgorithmParams,
        public_key: &[u8],
    ) -> Result<(Vec<u8>, SharedSecret)>;

    /// Recover the shared secret from `kem_ciphertext`.
    ///
    /// Must not distinguish a malformed ciphertext from a wrong key by
    /// timing; ML-KEM's implicit rejection satisfies this.
    fn decapsulate(
        &self,
        params: &AlgorithmParams,
        private_key: &[u8],
        kem_ciphertext: &[u8],
    ) -> Result<SharedSecret>;

    /// Encrypt and return `ciphertext || tag`
    fn aead_encrypt(
        &self,
        cipher: AeadCipher,
        key: &SymmetricKey,
        nonce: &Nonce,
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>>;

    /// Verify and decrypt; fails with `AuthenticationFailed` on a bad tag
    fn aead_decrypt(
        &self,
        cipher: AeadCipher,
        key: &SymmetricKey,
        nonce: &Nonce,
        ciphertext: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>>;
}

/// In-process provider backed by pqcrypto-mlkem, x25519-dalek, aes-gcm and
/// chacha20poly1305
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeProvider;

impl NativeProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Provider for NativeProvider {
    fn generate(&self, params: &AlgorithmParams) -> Result<KeyPair> {
        let (public, secret) = kem::generate(params.kem)?;
        Ok(KeyPair::from_parts(public, secret, params.id))
    }

    fn encapsulate(
        &self,
        params: &AlgorithmParams,
        public_key: &[u8],
    ) -> Result<(Vec<u8>, SharedSecret)> {
        kem::encapsulate(params.kem, public_key)
    }

    fn decapsulate(
        &self,
        params: &AlgorithmParams,
        private_key: &[u8],
        kem_ciphertext: &[u8],
    ) -> Result<SharedSecret> {
        kem::decapsulate(params.kem, private_key, kem_ciphertext)
    }

    fn aead_encrypt(
        &self,
        cipher: AeadCipher,
        key: &SymmetricKey,
        nonce: &Nonce,
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>> {
        Aead::new(key, cipher).encrypt(nonce, plaintext, aad)
    }

    fn aead_decrypt(
        &self,
        cipher: AeadCipher,
        key: &SymmetricKey,
        nonce: &Nonce,
        ciphertext: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>> {
        Aead::new(key, cipher).decrypt(nonce, ciphertext, aad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AlgorithmId;

    #[test]
    fn test_native_generate_tags_algorithm() {
        let provider = NativeProvider::new();
        for id in AlgorithmId::ALL {
            let params = id.params();
            let kp = provider.generate(&params).unwrap();
            assert_eq!(kp.algorithm(), id);
            assert_eq!(kp.public_key().len(), params.public_key_size);
            assert_eq!(kp.private_key().len(), params.private_key_size);
        }
    }

    #[test]
    fn test_native_kem_and_aead() {
        let provider = NativeProvider::new();
        let params = AlgorithmId::MlKem1024.params();
        let kp = provider.generate(&params).unwrap();

        let (ct, ss) = provider.encapsulate(&params, kp.public_key()).unwrap();
        let recovered = provider.decapsulate(&params, kp.private_key(), &ct).unwrap();
        assert_eq!(ss.as_bytes(), recovered.as_bytes());

        let key = SymmetricKey::from_bytes(ss.as_bytes()).unwrap();
        let nonce = Nonce::generate();
        let sealed = provider
            .aead_encrypt(params.aead, &key, &nonce, b"payload", b"aad")
            .unwrap();
        let opened = provider
            .aead_decrypt(params.aead, &key, &nonce, &sealed, b"aad")
            .unwrap();
        assert_eq!(opened, b"payload");
    }
}
