//! Error types for the pqseal-keystore crate

use thiserror::Error;

/// Result type alias using `KeyStoreError`
pub type Result<T> = std::result::Result<T, KeyStoreError>;

/// Errors that can occur during key store operations
#[derive(Error, Debug)]
pub enum KeyStoreError {
    /// No file exists for the requested key
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// A key file exists but cannot be decoded
    #[error("invalid key file for {name}: {reason}")]
    KeyFormatError { name: String, reason: String },

    /// Key name is empty or would escape the key directory
    #[error("invalid key name: {0:?}")]
    InvalidKeyName(String),

    /// The default key directory could not be resolved
    #[error("cannot determine home directory for the default key directory")]
    NoHomeDirectory,

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Crypto error
    #[error("crypto error: {0}")]
    Crypto(#[from] pqseal_crypto::CryptoError),
}

impl KeyStoreError {
    pub(crate) fn format(name: &str, reason: impl Into<String>) -> Self {
        KeyStoreError::KeyFormatError {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
