//! Algorithm registry
//!
//! Maps an [`AlgorithmId`] to the KEM, AEAD and byte sizes it implies.
//! Every key, secret and envelope field is checked against the resolved
//! [`AlgorithmParams`] before it is trusted; a mismatch fails closed and is
//! never truncated or padded.

use crate::{
    kem::KemKind,
    symmetric::AeadCipher,
    CryptoError, Result,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a complete KEM + AEAD suite
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AlgorithmId {
    /// ML-KEM-768 with AES-256-GCM
    #[default]
    #[serde(rename = "ML-KEM-768")]
    MlKem768,
    /// ML-KEM-1024 with AES-256-GCM
    #[serde(rename = "ML-KEM-1024")]
    MlKem1024,
    /// ML-KEM-768 with ChaCha20-Poly1305
    #[serde(rename = "ML-KEM-768-CHACHA20")]
    MlKem768ChaCha20,
    /// X25519 + ML-KEM-768 hybrid KEM with AES-256-GCM
    #[serde(rename = "X25519-ML-KEM-768")]
    X25519MlKem768,
}

impl AlgorithmId {
    /// Every algorithm this build knows about, in wire-tag order
    pub const ALL: [AlgorithmId; 4] = [
        AlgorithmId::MlKem768,
        AlgorithmId::MlKem1024,
        AlgorithmId::MlKem768ChaCha20,
        AlgorithmId::X25519MlKem768,
    ];

    /// Canonical name, as used in key records and the JSON envelope form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MlKem768 => "ML-KEM-768",
            Self::MlKem1024 => "ML-KEM-1024",
            Self::MlKem768ChaCha20 => "ML-KEM-768-CHACHA20",
            Self::X25519MlKem768 => "X25519-ML-KEM-768",
        }
    }

    /// One-byte tag used in the binary envelope
    pub fn tag(&self) -> u8 {
        match self {
            Self::MlKem768 => 0x01,
            Self::MlKem1024 => 0x02,
            Self::MlKem768ChaCha20 => 0x03,
            Self::X25519MlKem768 => 0x04,
        }
    }

    /// Reverse of [`AlgorithmId::tag`]
    pub fn from_tag(tag: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.tag() == tag)
            .ok_or_else(|| CryptoError::UnknownAlgorithm(format!("tag 0x{:02x}", tag)))
    }

    /// The built-in parameter set for this identifier
    pub fn params(&self) -> AlgorithmParams {
        let (kem, aead) = match self {
            Self::MlKem768 => (KemKind::MlKem768, AeadCipher::Aes256Gcm),
            Self::MlKem1024 => (KemKind::MlKem1024, AeadCipher::Aes256Gcm),
            Self::MlKem768ChaCha20 => (KemKind::MlKem768, AeadCipher::ChaCha20Poly1305),
            Self::X25519MlKem768 => (KemKind::X25519MlKem768, AeadCipher::Aes256Gcm),
        };
        AlgorithmParams {
            id: *self,
            kem,
            aead,
            public_key_size: kem.public_key_size(),
            private_key_size: kem.secret_key_size(),
            ciphertext_size: kem.ciphertext_size(),
            shared_secret_size: kem.shared_secret_size(),
        }
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmId {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CryptoError::UnknownAlgorithm(s.to_string()))
    }
}

/// Sizes and primitives implied by an [`AlgorithmId`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlgorithmParams {
    pub id: AlgorithmId,
    pub kem: KemKind,
    pub aead: AeadCipher,
    pub public_key_size: usize,
    pub private_key_size: usize,
    pub ciphertext_size: usize,
    pub shared_secret_size: usize,
}

impl AlgorithmParams {
    pub fn kem_name(&self) -> &'static str {
        self.kem.name()
    }

    pub fn aead_name(&self) -> &'static str {
        self.aead.algorithm_id()
    }

    pub fn key_size(&self) -> usize {
        self.aead.key_size()
    }

    pub fn nonce_size(&self) -> usize {
        self.aead.nonce_size()
    }

    pub fn tag_size(&self) -> usize {
        self.aead.tag_size()
    }

    /// Reject a public key whose length does not match
    pub fn check_public_key(&self, key: &[u8]) -> Result<()> {
        self.check_key("public key", self.public_key_size, key.len())
    }

    /// Reject a private key whose length does not match
    pub fn check_private_key(&self, key: &[u8]) -> Result<()> {
        self.check_key("private key", self.private_key_size, key.len())
    }

    /// Reject a shared secret too short to key the AEAD
    pub fn check_shared_secret(&self, secret: &[u8]) -> Result<()> {
        self.check_key("shared secret", self.shared_secret_size, secret.len())
    }

    /// Reject envelope field lengths that disagree with this algorithm
    pub fn check_envelope_fields(
        &self,
        kem_ciphertext_len: usize,
        nonce_len: usize,
        ciphertext_len: usize,
    ) -> Result<()> {
        if kem_ciphertext_len != self.ciphertext_size {
            return Err(CryptoError::MalformedEnvelope(format!(
                "{} KEM ciphertext must be {} bytes, got {}",
                self.id, self.ciphertext_size, kem_ciphertext_len
            )));
        }
        if nonce_len != self.nonce_size() {
            return Err(CryptoError::MalformedEnvelope(format!(
                "nonce must be {} bytes, got {}",
                self.nonce_size(),
                nonce_len
            )));
        }
        if ciphertext_len < self.tag_size() {
            return Err(CryptoError::MalformedEnvelope(format!(
                "ciphertext shorter than the {}-byte tag",
                self.tag_size()
            )));
        }
        Ok(())
    }

    fn check_key(&self, what: &'static str, expected: usize, actual: usize) -> Result<()> {
        if expected != actual {
            return Err(CryptoError::InvalidKeyMaterial {
                what,
                algorithm: self.id.as_str(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}

/// Lookup table of enabled algorithms
#[derive(Clone, Debug)]
pub struct AlgorithmRegistry {
    entries: Vec<AlgorithmParams>,
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::with_algorithms(&AlgorithmId::ALL)
    }
}

impl AlgorithmRegistry {
    /// Registry with every built-in algorithm enabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry restricted to `ids`; anything else resolves as unknown
    pub fn with_algorithms(ids: &[AlgorithmId]) -> Self {
        let mut entries: Vec<AlgorithmParams> = Vec::with_capacity(ids.len());
        for id in ids {
            if !entries.iter().any(|p| p.id == *id) {
                entries.push(id.params());
            }
        }
        Self { entries }
    }

    /// Resolve an identifier to its parameters
    pub fn resolve(&self, id: AlgorithmId) -> Result<&AlgorithmParams> {
        self.entries
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| CryptoError::UnknownAlgorithm(id.as_str().to_string()))
    }

    /// Resolve a textual identifier such as `"ML-KEM-768"`
    pub fn resolve_name(&self, name: &str) -> Result<&AlgorithmParams> {
        self.resolve(name.parse()?)
    }

    /// Resolve a binary envelope tag
    pub fn resolve_tag(&self, tag: u8) -> Result<&AlgorithmParams> {
        self.resolve(AlgorithmId::from_tag(tag)?)
    }

    /// Whether `id` is enabled
    pub fn contains(&self, id: AlgorithmId) -> bool {
        self.entries.iter().any(|p| p.id == id)
    }

    /// Enabled identifiers
    pub fn algorithms(&self) -> impl Iterator<Item = AlgorithmId> + '_ {
        self.entries.iter().map(|p| p.id)
    }
}
