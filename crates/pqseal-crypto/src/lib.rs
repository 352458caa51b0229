//! # pqseal crypto
//!
//! Protocol core for post-quantum envelope encryption.
//!
//! This crate provides:
//! - **ML-KEM-768 / ML-KEM-1024**: NIST FIPS 203 key encapsulation
//! - **X25519 + ML-KEM-768**: hybrid KEM, secure if either half holds
//! - **AES-256-GCM / ChaCha20-Poly1305**: authenticated payload encryption
//! - **Algorithm agility**: a registry of named KEM + AEAD suites
//! - **Envelopes**: self-describing binary, base64 and JSON wire forms
//!
//! ## Security Model
//!
//! - A fresh encapsulation and a fresh nonce are drawn for every seal
//! - Key material sizes are validated before any provider call
//! - Shared secrets and derived keys are zeroized on drop
//! - A failed open never yields partial plaintext
//!
//! ## Example
//!
//! ```rust,ignore
//! use pqseal_crypto::{AlgorithmId, HybridCipher};
//!
//! let cipher = HybridCipher::default();
//! let recipient = cipher.generate_key_pair(AlgorithmId::MlKem768)?;
//!
//! let envelope = cipher.seal(recipient.public_key(), AlgorithmId::MlKem768, b"Hello", None)?;
//! let plaintext = cipher.open(recipient.private_key(), &envelope, None)?;
//! ```

pub mod cipher;
pub mod envelope;
pub mod error;
pub mod kdf;
pub mod kem;
pub mod keys;
pub mod provider;
pub mod registry;
pub mod symmetric;

pub use cipher::{CipherConfig, HybridCipher, MAX_PLAINTEXT_SIZE};
pub use envelope::Envelope;
pub use error::{CryptoError, Result, GENERIC_FAILURE};
pub use kdf::{KeyDerivation, DEFAULT_CONTEXT};
pub use kem::{KemKind, SharedSecret};
pub use keys::{key_id_for, KeyPair};
pub use provider::{NativeProvider, Provider};
pub use registry::{AlgorithmId, AlgorithmParams, AlgorithmRegistry};
pub use symmetric::{Aead, AeadCipher, Nonce, SymmetricKey};

/// The version of the binary envelope format
pub const ENVELOPE_VERSION: u8 = 1;
