//! Error types for the pqseal-crypto crate

use thiserror::Error;

/// Result type alias using `CryptoError`
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Message shown to callers on the far side of a trust boundary
pub const GENERIC_FAILURE: &str = "decryption failed";

/// Errors that can occur during cryptographic operations
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Algorithm identifier is not recognised or not enabled in the registry
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// Key or secret length does not match the resolved algorithm
    #[error("invalid {what} for {algorithm}: expected {expected} bytes, got {actual}")]
    InvalidKeyMaterial {
        what: &'static str,
        algorithm: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The KEM rejected the ciphertext or key
    #[error("decapsulation failed")]
    DecapsulationFailed,

    /// AEAD tag did not verify
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Envelope could not be parsed or does not match its algorithm's sizes
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Key generation failed
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Encapsulation or AEAD encryption failed
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// A blocking task was cancelled or panicked
    #[error("background task failed: {0}")]
    Task(String),

    /// Base64 decode error
    #[error("base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl CryptoError {
    /// Whether this failure came from processing untrusted ciphertext or keys.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::DecapsulationFailed
                | Self::AuthenticationFailed
                | Self::MalformedEnvelope(_)
                | Self::InvalidKeyMaterial { .. }
                | Self::Base64Decode(_)
        )
    }

    /// Message safe to return across a trust boundary.
    ///
    /// Rejections collapse to [`GENERIC_FAILURE`] so a remote party cannot
    /// tell a bad KEM ciphertext from a bad tag or a wrong key.
    pub fn public_message(&self) -> String {
        if self.is_rejection() {
            GENERIC_FAILURE.to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<serde_json::Error> for CryptoError {
    fn from(err: serde_json::Error) -> Self {
        CryptoError::Serialization(err.to_string())
    }
}
