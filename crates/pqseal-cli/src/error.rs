//! CLI error types

use pqseal_crypto::CryptoError;
use pqseal_keystore::KeyStoreError;
use thiserror::Error;

/// Result type alias using `CliError`
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// `keygen` without `--force` over an existing name
    #[error("key already exists: {0} (use --force to overwrite)")]
    KeyExists(String),

    #[error("{path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    /// Message safe to print to whoever supplied the input
    ///
    /// Decryption rejections of any kind collapse to one generic message.
    pub fn public_message(&self) -> String {
        match self {
            CliError::Crypto(e) => e.public_message(),
            other => other.to_string(),
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, CliError::Crypto(e) if e.is_rejection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqseal_crypto::GENERIC_FAILURE;

    #[test]
    fn test_rejections_are_generic() {
        let err = CliError::from(CryptoError::AuthenticationFailed);
        assert!(err.is_rejection());
        assert_eq!(err.public_message(), GENERIC_FAILURE);

        let err = CliError::from(CryptoError::MalformedEnvelope("bad magic".into()));
        assert_eq!(err.public_message(), GENERIC_FAILURE);
    }

    #[test]
    fn test_other_errors_keep_detail() {
        let err = CliError::from(KeyStoreError::KeyNotFound("alice".into()));
        assert!(!err.is_rejection());
        assert!(err.public_message().contains("alice"));
    }
}
