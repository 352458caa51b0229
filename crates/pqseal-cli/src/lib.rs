//! # pqseal CLI
//!
//! Command-line front end over the key store and hybrid cipher.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        pqseal <command> [flags]         │
//! ├─────────────────────────────────────────┤
//! │     AppConfig  (flags, env, .env)       │
//! ├─────────────────────────────────────────┤
//! │  keygen │ list │ show │ seal │ open     │
//! ├────────────────────┬────────────────────┤
//! │      KeyStore      │    HybridCipher    │
//! └────────────────────┴────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod state;

pub use config::{AppConfig, EnvelopeFormat};
pub use error::{CliError, Result};
pub use state::{ensure_key_dir, AppState};
