//! # pqseal keystore
//!
//! Name-indexed persistence of ML-KEM key material on the local filesystem.
//!
//! This crate provides:
//! - **Two public encodings**: raw `.pub` and base64 JSON `.pub.json`, with
//!   raw taking precedence when both exist
//! - **Raw-only private keys**: `.key` files written owner-only
//! - **Enumeration**: every name with a public key, deduplicated
//!
//! No cryptography happens here beyond size validation of loaded pairs.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        HybridCipher / pqseal CLI        │
//! ├─────────────────────────────────────────┤
//! │                KeyStore                 │
//! ├─────────────┬─────────────┬─────────────┤
//! │  <n>.key    │  <n>.pub    │ <n>.pub.json│
//! ├─────────────┴─────────────┴─────────────┤
//! │          key directory (0700)           │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use pqseal_keystore::{KeyStore, KeyStoreConfig};
//!
//! let store = KeyStore::new(KeyStoreConfig::default());
//! store.save("alice", &key_pair)?;
//! let public_key = store.load_public_key("alice")?;
//! ```

pub mod config;
pub mod error;
pub mod record;
pub mod store;

pub use config::{default_key_dir, KeyStoreConfig, PublicKeyEncoding, DEFAULT_DIR_NAME};
pub use error::{KeyStoreError, Result};
pub use record::{PublicKeyRecord, PublicKeySource, StoredKeyRecord};
pub use store::{validate_name, KeyStore};
