//! # pqseal
//!
//! Hybrid post-quantum envelope encryption: a fresh ML-KEM encapsulation
//! keys an AEAD that protects the payload, and the result travels as one
//! self-describing envelope.
//!
//! This facade re-exports the workspace crates:
//! - [`crypto`]: algorithm registry, provider boundary, envelope codec and
//!   the [`HybridCipher`] seal/open protocol
//! - [`keystore`]: name-indexed key files on disk
//!
//! ## Example
//!
//! ```rust,ignore
//! use pqseal::{AlgorithmId, HybridCipher, KeyStore};
//!
//! let store = KeyStore::open("/path/to/keys");
//! let cipher = HybridCipher::default();
//!
//! let alice = cipher.generate_key_pair(AlgorithmId::MlKem768)?;
//! store.save("alice", &alice)?;
//!
//! let envelope = cipher.seal(&store.load_public_key("alice")?, AlgorithmId::MlKem768, b"hi", None)?;
//! let plaintext = cipher.open(&store.load_private_key("alice")?, &envelope, None)?;
//! ```

pub use pqseal_crypto as crypto;
pub use pqseal_keystore as keystore;

pub use pqseal_crypto::{
    AlgorithmId, AlgorithmRegistry, CipherConfig, CryptoError, Envelope, HybridCipher,
    KeyDerivation, KeyPair, NativeProvider, Provider,
};
pub use pqseal_keystore::{KeyStore, KeyStoreConfig, KeyStoreError, PublicKeyEncoding};
