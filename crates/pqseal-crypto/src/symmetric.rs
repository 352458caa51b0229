//! Symmetric encryption using AES-GCM and ChaCha20-Poly1305
//!
//! This module provides the AEAD half of the hybrid scheme: a
//! [`SymmetricKey`] derived from a KEM shared secret encrypts the payload
//! under a fresh random [`Nonce`].

use crate::{CryptoError, Result};
use aes_gcm::{
    aead::{Aead as AeadTrait, Payload},
    Aes256Gcm, KeyInit,
};
use chacha20poly1305::ChaCha20Poly1305;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a symmetric key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// Size of a nonce in bytes (96 bits for AES-GCM/ChaCha20-Poly1305)
pub const NONCE_SIZE: usize = 12;

/// Size of the authentication tag appended to every ciphertext
pub const TAG_SIZE: usize = 16;

/// A symmetric AEAD key, bounded to a single seal or open call
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    key: [u8; KEY_SIZE],
}

impl SymmetricKey {
    /// Create a key from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyMaterial {
                what: "symmetric key",
                algorithm: "AEAD",
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self { key })
    }

    /// Generate a random key
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        rand::RngCore::fill_bytes(&mut OsRng, &mut key);
        Self { key }
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymmetricKey([REDACTED])")
    }
}

/// A nonce for AEAD encryption
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nonce {
    bytes: [u8; NONCE_SIZE],
}

impl Nonce {
    /// Generate a random nonce from the operating system CSPRNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        rand::RngCore::fill_bytes(&mut OsRng, &mut bytes);
        Self { bytes }
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != NONCE_SIZE {
            return Err(CryptoError::MalformedEnvelope(format!(
                "nonce must be {} bytes, got {}",
                NONCE_SIZE,
                bytes.len()
            )));
        }
        let mut arr = [0u8; NONCE_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Get the nonce bytes
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.bytes
    }
}

/// Supported AEAD ciphers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AeadCipher {
    /// AES-256-GCM
    #[default]
    #[serde(rename = "AES-256-GCM")]
    Aes256Gcm,
    /// ChaCha20-Poly1305
    #[serde(rename = "ChaCha20-Poly1305")]
    ChaCha20Poly1305,
}

impl AeadCipher {
    /// Get the algorithm identifier string
    pub fn algorithm_id(&self) -> &'static str {
        match self {
            Self::Aes256Gcm => "AES-256-GCM",
            Self::ChaCha20Poly1305 => "ChaCha20-Poly1305",
        }
    }

    /// Get the key size
    pub fn key_size(&self) -> usize {
        KEY_SIZE
    }

    /// Get the nonce size
    pub fn nonce_size(&self) -> usize {
        NONCE_SIZE
    }

    /// Get the authentication tag size
    pub fn tag_size(&self) -> usize {
        TAG_SIZE // Both use 128-bit tags
    }
}

/// AEAD encryption/decryption bound to one key and cipher
pub struct Aead<'k> {
    cipher: AeadCipher,
    key: &'k SymmetricKey,
}

impl<'k> Aead<'k> {
    /// Create a new AEAD instance with the given key and cipher
    pub fn new(key: &'k SymmetricKey, cipher: AeadCipher) -> Self {
        Self { cipher, key }
    }

    /// Encrypt `plaintext`, authenticating `aad` alongside it.
    ///
    /// Returns `ciphertext || tag`.
    pub fn encrypt(&self, nonce: &Nonce, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let payload = Payload { msg: plaintext, aad };

        match self.cipher {
            AeadCipher::Aes256Gcm => {
                let cipher = Aes256Gcm::new_from_slice(self.key.as_bytes())
                    .map_err(|e| CryptoError::Encryption(e.to_string()))?;
                cipher
                    .encrypt(aes_gcm::Nonce::from_slice(nonce.as_bytes()), payload)
                    .map_err(|e| CryptoError::Encryption(e.to_string()))
            }
            AeadCipher::ChaCha20Poly1305 => {
                let cipher = ChaCha20Poly1305::new_from_slice(self.key.as_bytes())
                    .map_err(|e| CryptoError::Encryption(e.to_string()))?;
                cipher
                    .encrypt(chacha20poly1305::Nonce::from_slice(nonce.as_bytes()), payload)
                    .map_err(|e| CryptoError::Encryption(e.to_string()))
            }
        }
    }

    /// Decrypt and verify `ciphertext || tag`.
    ///
    /// Any verification failure is reported as
    /// [`CryptoError::AuthenticationFailed`] and no plaintext is returned.
    pub fn decrypt(&self, nonce: &Nonce, ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < TAG_SIZE {
            return Err(CryptoError::AuthenticationFailed);
        }
        let payload = Payload { msg: ciphertext, aad };

        let result = match self.cipher {
            AeadCipher::Aes256Gcm => Aes256Gcm::new_from_slice(self.key.as_bytes())
                .map_err(|_| CryptoError::AuthenticationFailed)?
                .decrypt(aes_gcm::Nonce::from_slice(nonce.as_bytes()), payload),
            AeadCipher::ChaCha20Poly1305 => ChaCha20Poly1305::new_from_slice(self.key.as_bytes())
                .map_err(|_| CryptoError::AuthenticationFailed)?
                .decrypt(chacha20poly1305::Nonce::from_slice(nonce.as_bytes()), payload),
        };
        result.map_err(|_| CryptoError::AuthenticationFailed)
    }

    /// Get the cipher type
    pub fn cipher(&self) -> AeadCipher {
        self.cipher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AeadCipher::Aes256Gcm)]
    #[case(AeadCipher::ChaCha20Poly1305)]
    fn test_roundtrip(#[case] cipher: AeadCipher) {
        let key = SymmetricKey::generate();
        let nonce = Nonce::generate();
        let aead = Aead::new(&key, cipher);

        let ciphertext = aead.encrypt(&nonce, b"Hello, World!", b"").unwrap();
        assert_eq!(ciphertext.len(), 13 + TAG_SIZE);

        let decrypted = aead.decrypt(&nonce, &ciphertext, b"").unwrap();
        assert_eq!(decrypted, b"Hello, World!");
    }

    #[rstest]
    #[case(AeadCipher::Aes256Gcm)]
    #[case(AeadCipher::ChaCha20Poly1305)]
    fn test_wrong_aad_fails(#[case] cipher: AeadCipher) {
        let key = SymmetricKey::generate();
        let nonce = Nonce::generate();
        let aead = Aead::new(&key, cipher);

        let ciphertext = aead.encrypt(&nonce, b"secret data", b"correct aad").unwrap();
        let result = aead.decrypt(&nonce, &ciphertext, b"wrong aad");

        assert!(matches!(result, Err(CryptoError::AuthenticationFailed)));
    }

    #[test]
    fn test_wrong_key_fails() {
        let key = SymmetricKey::generate();
        let other = SymmetricKey::generate();
        let nonce = Nonce::generate();

        let ciphertext = Aead::new(&key, AeadCipher::Aes256Gcm)
            .encrypt(&nonce, b"secret data", b"")
            .unwrap();
        let result = Aead::new(&other, AeadCipher::Aes256Gcm).decrypt(&nonce, &ciphertext, b"");

        assert!(matches!(result, Err(CryptoError::AuthenticationFailed)));
    }

    #[test]
    fn test_short_ciphertext_rejected() {
        let key = SymmetricKey::generate();
        let nonce = Nonce::generate();
        let result = Aead::new(&key, AeadCipher::Aes256Gcm).decrypt(&nonce, &[0u8; 5], b"");
        assert!(matches!(result, Err(CryptoError::AuthenticationFailed)));
    }

    #[test]
    fn test_nonce_length_checked() {
        assert!(Nonce::from_bytes(&[0u8; NONCE_SIZE]).is_ok());
        assert!(matches!(
            Nonce::from_bytes(&[0u8; 24]),
            Err(CryptoError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_nonces_are_fresh() {
        let a = Nonce::generate();
        let b = Nonce::generate();
        assert_ne!(a, b);
    }
}
