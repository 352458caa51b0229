//! Filesystem key store
//!
//! Layout of the key directory for a key called `alice`:
//!
//! ```text
//! ~/.pqc-keys/
//! ├── alice.key        private key, raw bytes, mode 0600
//! ├── alice.pub        public key, raw bytes
//! └── alice.pub.json   public key, base64 + metadata
//! ```
//!
//! `load_public_key` prefers `.pub` over `.pub.json` when both exist.
//! Private keys only ever live in the raw `.key` form.

use crate::{
    config::KeyStoreConfig,
    record::{PublicKeyRecord, PublicKeySource, StoredKeyRecord},
    KeyStoreError, Result,
};
use pqseal_crypto::{AlgorithmId, AlgorithmRegistry, KeyPair};
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};
use zeroize::Zeroizing;

const PRIVATE_EXT: &str = ".key";
const PUBLIC_EXT: &str = ".pub";
const STRUCTURED_EXT: &str = ".pub.json";

/// Name-indexed key persistence over a single directory
///
/// The directory must exist before use; the store never creates it.
/// Concurrent `save` calls for the same name race with last-writer-wins.
#[derive(Clone, Debug)]
pub struct KeyStore {
    config: KeyStoreConfig,
}

impl KeyStore {
    pub fn new(config: KeyStoreConfig) -> Self {
        Self { config }
    }

    /// Open a store over `directory` with default settings
    pub fn open(directory: impl Into<PathBuf>) -> Self {
        Self::new(KeyStoreConfig::new(directory))
    }

    pub fn directory(&self) -> &Path {
        &self.config.directory
    }

    pub fn config(&self) -> &KeyStoreConfig {
        &self.config
    }

    /// Load a public key: raw `.pub` first, then `.pub.json`
    #[instrument(skip(self))]
    pub fn load_public_key(&self, name: &str) -> Result<Vec<u8>> {
        Ok(self.load_public_record(name)?.public_key)
    }

    /// Load a public key together with any stored metadata
    ///
    /// When the raw file wins and a structured file for the same key sits
    /// next to it, the structured file's metadata is attached only if its
    /// key bytes agree with the raw file.
    #[instrument(skip(self))]
    pub fn load_public_record(&self, name: &str) -> Result<PublicKeyRecord> {
        validate_name(name)?;

        if let Some(raw) = read_optional(&self.path(name, PUBLIC_EXT))? {
            // The sidecar only contributes metadata; any failure reading it means none
            let sidecar = read_optional(&self.path(name, STRUCTURED_EXT))
                .ok()
                .flatten()
                .and_then(|bytes| parse_structured(name, &bytes).ok());
            let (algorithm, key_id) = match sidecar {
                Some(record) if record.public_key == raw => (record.algorithm, record.key_id),
                Some(_) => {
                    warn!(name, "raw and structured public keys differ, using raw");
                    (None, None)
                }
                None => (None, None),
            };
            debug!(name, source = "raw", "loaded public key");
            return Ok(PublicKeyRecord {
                public_key: raw,
                algorithm,
                key_id,
                source: PublicKeySource::Raw,
            });
        }

        if let Some(bytes) = read_optional(&self.path(name, STRUCTURED_EXT))? {
            let record = parse_structured(name, &bytes)?;
            debug!(name, source = "structured", "loaded public key");
            return Ok(PublicKeyRecord {
                public_key: record.public_key,
                algorithm: record.algorithm,
                key_id: record.key_id,
                source: PublicKeySource::Structured,
            });
        }

        Err(KeyStoreError::KeyNotFound(name.to_string()))
    }

    /// Load a private key from its raw `.key` file
    #[instrument(skip(self))]
    pub fn load_private_key(&self, name: &str) -> Result<Zeroizing<Vec<u8>>> {
        validate_name(name)?;
        match read_optional(&self.path(name, PRIVATE_EXT))? {
            Some(bytes) => {
                debug!(name, "loaded private key");
                Ok(Zeroizing::new(bytes))
            }
            None => Err(KeyStoreError::KeyNotFound(name.to_string())),
        }
    }

    /// Load both halves and check them against `algorithm`'s sizes
    #[instrument(skip(self))]
    pub fn load_key_pair(&self, name: &str, algorithm: AlgorithmId) -> Result<KeyPair> {
        let record = self.load_public_record(name)?;
        if let Some(stored) = record.algorithm {
            if stored != algorithm {
                return Err(KeyStoreError::format(
                    name,
                    format!("stored algorithm {} does not match requested {}", stored, algorithm),
                ));
            }
        }
        let private_key = self.load_private_key(name)?;
        let key_pair = KeyPair::from_parts(record.public_key, private_key, algorithm);
        key_pair.validate(&AlgorithmRegistry::default())?;
        Ok(key_pair)
    }

    /// Names with a public key under either encoding, in no particular order
    #[instrument(skip(self))]
    pub fn list_keys(&self) -> Result<HashSet<String>> {
        let mut names = HashSet::new();
        for entry in fs::read_dir(&self.config.directory)? {
            let entry = entry?;
            // Follows symlinks
            if !entry.path().is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let stem = file_name
                .strip_suffix(STRUCTURED_EXT)
                .or_else(|| file_name.strip_suffix(PUBLIC_EXT));
            if let Some(stem) = stem {
                if validate_name(stem).is_ok() {
                    names.insert(stem.to_string());
                }
            }
        }
        debug!(count = names.len(), "listed keys");
        Ok(names)
    }

    /// Persist `key_pair` under `name`, silently replacing any existing key
    ///
    /// The private key is written owner-only. A public key file in an
    /// encoding not selected by the config is removed so a stale key can
    /// never shadow the new one.
    #[instrument(skip(self, key_pair), fields(algorithm = %key_pair.algorithm(), key_id = key_pair.key_id()))]
    pub fn save(&self, name: &str, key_pair: &KeyPair) -> Result<()> {
        validate_name(name)?;
        let encoding = self.config.public_encoding;

        write_private(&self.path(name, PRIVATE_EXT), key_pair.private_key())?;

        let raw_path = self.path(name, PUBLIC_EXT);
        if encoding.writes_raw() {
            fs::write(&raw_path, key_pair.public_key())?;
        } else {
            remove_optional(&raw_path)?;
        }

        let structured_path = self.path(name, STRUCTURED_EXT);
        if encoding.writes_structured() {
            let record = StoredKeyRecord {
                public_key: key_pair.public_key().to_vec(),
                algorithm: Some(key_pair.algorithm()),
                key_id: Some(key_pair.key_id().to_string()),
            };
            let json = serde_json::to_vec_pretty(&record)
                .map_err(|e| KeyStoreError::format(name, e.to_string()))?;
            fs::write(&structured_path, json)?;
        } else {
            remove_optional(&structured_path)?;
        }

        debug!(name, encoding = %encoding, "saved key pair");
        Ok(())
    }

    /// Remove every file stored for `name`
    #[instrument(skip(self))]
    pub fn delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let mut removed = false;
        for ext in [PRIVATE_EXT, PUBLIC_EXT, STRUCTURED_EXT] {
            removed |= remove_optional(&self.path(name, ext))?;
        }
        if !removed {
            return Err(KeyStoreError::KeyNotFound(name.to_string()));
        }
        debug!(name, "deleted key");
        Ok(())
    }

    /// Whether any file is stored for `name`
    pub fn exists(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        Ok([PRIVATE_EXT, PUBLIC_EXT, STRUCTURED_EXT]
            .iter()
            .any(|ext| self.path(name, ext).is_file()))
    }

    /// Whether a private key file is stored for `name`, without reading it
    pub fn has_private_key(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        Ok(self.path(name, PRIVATE_EXT).is_file())
    }

    fn path(&self, name: &str, ext: &str) -> PathBuf {
        self.config.directory.join(format!("{}{}", name, ext))
    }
}

/// Key names are file stems: `[A-Za-z0-9._-]+`, not starting with `.`
pub fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'));
    if valid {
        Ok(())
    } else {
        Err(KeyStoreError::InvalidKeyName(name.to_string()))
    }
}

fn parse_structured(name: &str, bytes: &[u8]) -> Result<StoredKeyRecord> {
    serde_json::from_slice(bytes).map_err(|e| KeyStoreError::format(name, e.to_string()))
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn remove_optional(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Write with owner-only permissions (0600 on Unix)
fn write_private(path: &Path, content: &[u8]) -> Result<()> {
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        // mode() only applies on create
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
        file.write_all(content)?;
        file.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    {
        fs::write(path, content)?;
        Ok(())
    }
}
