//! CLI configuration

use pqseal_crypto::{AlgorithmId, CipherConfig, KeyDerivation};
use pqseal_keystore::{KeyStoreConfig, PublicKeyEncoding};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Wire form written by `seal`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeFormat {
    #[default]
    Binary,
    Base64,
    Json,
}

impl fmt::Display for EnvelopeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Binary => "binary",
            Self::Base64 => "base64",
            Self::Json => "json",
        })
    }
}

impl FromStr for EnvelopeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binary" | "bin" => Ok(Self::Binary),
            "base64" | "b64" => Ok(Self::Base64),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown envelope format: {}", other)),
        }
    }
}

/// Application configuration assembled from flags, environment and `.env`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Key directory
    pub key_dir: PathBuf,
    /// Public key encoding written by `keygen`
    pub public_encoding: PublicKeyEncoding,
    /// Shared-secret key derivation
    pub kdf: KeyDerivation,
    /// Algorithm used when neither a flag nor key metadata names one
    pub default_algorithm: AlgorithmId,
}

impl Default for AppConfig {
    fn default() -> Self {
        let keystore = KeyStoreConfig::default();
        Self {
            key_dir: keystore.directory,
            public_encoding: keystore.public_encoding,
            kdf: KeyDerivation::default(),
            default_algorithm: AlgorithmId::default(),
        }
    }
}

impl AppConfig {
    pub fn with_key_dir(mut self, key_dir: impl Into<PathBuf>) -> Self {
        self.key_dir = key_dir.into();
        self
    }

    pub fn with_public_encoding(mut self, encoding: PublicKeyEncoding) -> Self {
        self.public_encoding = encoding;
        self
    }

    pub fn with_kdf(mut self, kdf: KeyDerivation) -> Self {
        self.kdf = kdf;
        self
    }

    /// Key store settings derived from this config
    pub fn keystore_config(&self) -> KeyStoreConfig {
        KeyStoreConfig::new(&self.key_dir).with_public_encoding(self.public_encoding)
    }

    /// Cipher settings derived from this config
    pub fn cipher_config(&self) -> CipherConfig {
        CipherConfig::default().with_kdf(self.kdf)
    }
}
