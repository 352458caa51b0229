//! Application state

use crate::config::AppConfig;
use pqseal_crypto::{HybridCipher, NativeProvider};
use pqseal_keystore::KeyStore;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Everything a command needs, built once per invocation
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: AppConfig,
    pub store: KeyStore,
    pub cipher: HybridCipher,
}

impl AppState {
    /// Build state from `config`, creating the key directory if missing
    pub fn new(config: AppConfig) -> std::io::Result<Self> {
        ensure_key_dir(&config.key_dir)?;
        let store = KeyStore::new(config.keystore_config());
        let cipher =
            HybridCipher::with_config(Arc::new(NativeProvider::new()), config.cipher_config());
        Ok(Self {
            config,
            store,
            cipher,
        })
    }
}

/// Create the key directory owner-only (0700 on Unix)
///
/// Permissions of an existing directory are left alone.
pub fn ensure_key_dir(dir: &Path) -> std::io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))?;
    }
    debug!(dir = %dir.display(), "created key directory");
    Ok(())
}
