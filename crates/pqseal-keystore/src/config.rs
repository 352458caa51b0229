//! Key store configuration

use crate::{KeyStoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Directory name under the user's home holding keys by default
pub const DEFAULT_DIR_NAME: &str = ".pqc-keys";

/// Resolve `~/.pqc-keys`
pub fn default_key_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_DIR_NAME))
        .ok_or(KeyStoreError::NoHomeDirectory)
}

/// Which public key files `save` writes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PublicKeyEncoding {
    /// `<name>.pub`, the raw key bytes; the algorithm is not recorded
    Raw,
    /// `<name>.pub.json`, base64 with algorithm metadata
    Structured,
    /// Both files
    #[default]
    Both,
}

impl PublicKeyEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Structured => "structured",
            Self::Both => "both",
        }
    }

    pub(crate) fn writes_raw(&self) -> bool {
        matches!(self, Self::Raw | Self::Both)
    }

    pub(crate) fn writes_structured(&self) -> bool {
        matches!(self, Self::Structured | Self::Both)
    }
}

impl fmt::Display for PublicKeyEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublicKeyEncoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "structured" | "json" => Ok(Self::Structured),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown public key encoding: {}", other)),
        }
    }
}

/// Key store configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStoreConfig {
    /// Directory holding the key files; must already exist
    pub directory: PathBuf,
    /// Public key encoding written by `save`
    pub public_encoding: PublicKeyEncoding,
}

impl Default for KeyStoreConfig {
    fn default() -> Self {
        Self {
            directory: default_key_dir().unwrap_or_else(|_| PathBuf::from(DEFAULT_DIR_NAME)),
            public_encoding: PublicKeyEncoding::default(),
        }
    }
}

impl KeyStoreConfig {
    /// Create a config rooted at `directory`
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            public_encoding: PublicKeyEncoding::default(),
        }
    }

    /// Set the directory
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Set the public key encoding
    pub fn with_public_encoding(mut self, encoding: PublicKeyEncoding) -> Self {
        self.public_encoding = encoding;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directory() {
        let config = KeyStoreConfig::default();
        assert!(config.directory.ends_with(DEFAULT_DIR_NAME));
        assert_eq!(config.public_encoding, PublicKeyEncoding::Both);
        assert!(config.public_encoding.writes_structured());
    }

    #[test]
    fn test_builders() {
        let config = KeyStoreConfig::new("/tmp/keys")
            .with_public_encoding(PublicKeyEncoding::Both);
        assert_eq!(config.directory, PathBuf::from("/tmp/keys"));
        assert!(config.public_encoding.writes_raw());
        assert!(config.public_encoding.writes_structured());
    }

    #[test]
    fn test_parse_encoding() {
        assert_eq!("RAW".parse::<PublicKeyEncoding>().unwrap(), PublicKeyEncoding::Raw);
        assert_eq!("json".parse::<PublicKeyEncoding>().unwrap(), PublicKeyEncoding::Structured);
        assert!("pem".parse::<PublicKeyEncoding>().is_err());
    }
}
