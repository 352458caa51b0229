//! Key Encapsulation Mechanisms
//!
//! This module wraps the KEMs pqseal knows how to drive natively:
//! - **ML-KEM-768** - NIST FIPS 203, security category 3
//! - **ML-KEM-1024** - NIST FIPS 203, security category 5
//! - **X25519 + ML-KEM-768** - classical ECDH and ML-KEM combined with
//!   HKDF-SHA256, so the shared secret survives a break of either half
//!
//! # Hybrid Wire Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Hybrid Encapsulated Key                          │
//! ├───────────────────────────────┬─────────────────────────────────────┤
//! │  X25519 ephemeral (32 bytes)  │  ML-KEM-768 ciphertext (1088 bytes) │
//! └───────────────────────────────┴─────────────────────────────────────┘
//! Total: 1120 bytes
//!
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Hybrid Public Key                                │
//! ├───────────────────────────────┬─────────────────────────────────────┤
//! │  X25519 public (32 bytes)     │  ML-KEM-768 public (1184 bytes)     │
//! └───────────────────────────────┴─────────────────────────────────────┘
//! Total: 1216 bytes
//! ```
//!
//! # Implicit Rejection
//!
//! ML-KEM decapsulation never reports a bad ciphertext: it returns a
//! pseudorandom secret instead, and the AEAD tag check downstream fails.
//! Only structurally unusable inputs (wrong lengths) are errors here, and
//! those are rejected by the registry before this module is reached.

use crate::{CryptoError, Result};
use hkdf::Hkdf;
use pqcrypto_mlkem::{mlkem1024, mlkem768};
use pqcrypto_traits::kem::{Ciphertext as _, PublicKey as _, SecretKey as _, SharedSecret as _};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519Public, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Size of the ML-KEM-768 public (encapsulation) key
pub const MLKEM768_PUBLIC_KEY_SIZE: usize = 1184;

/// Size of the ML-KEM-768 secret (decapsulation) key
pub const MLKEM768_SECRET_KEY_SIZE: usize = 2400;

/// Size of the ML-KEM-768 ciphertext
pub const MLKEM768_CIPHERTEXT_SIZE: usize = 1088;

/// Size of the ML-KEM-1024 public (encapsulation) key
pub const MLKEM1024_PUBLIC_KEY_SIZE: usize = 1568;

/// Size of the ML-KEM-1024 secret (decapsulation) key
pub const MLKEM1024_SECRET_KEY_SIZE: usize = 3168;

/// Size of the ML-KEM-1024 ciphertext
pub const MLKEM1024_CIPHERTEXT_SIZE: usize = 1568;

/// Size of the X25519 public key
pub const X25519_PUBLIC_KEY_SIZE: usize = 32;

/// Size of the X25519 secret key
pub const X25519_SECRET_KEY_SIZE: usize = 32;

/// Size of the hybrid public key (X25519 + ML-KEM-768)
pub const HYBRID_PUBLIC_KEY_SIZE: usize = X25519_PUBLIC_KEY_SIZE + MLKEM768_PUBLIC_KEY_SIZE;

/// Size of the hybrid secret key (X25519 + ML-KEM-768)
pub const HYBRID_SECRET_KEY_SIZE: usize = X25519_SECRET_KEY_SIZE + MLKEM768_SECRET_KEY_SIZE;

/// Size of the hybrid encapsulated key (X25519 ephemeral + ML-KEM ciphertext)
pub const HYBRID_CIPHERTEXT_SIZE: usize = X25519_PUBLIC_KEY_SIZE + MLKEM768_CIPHERTEXT_SIZE;

/// Size of every shared secret produced here
pub const SHARED_SECRET_SIZE: usize = 32;

/// Domain separation for the hybrid combiner
const HYBRID_INFO: &[u8] = b"pqseal-hybrid-kem-v1";

/// The key encapsulation mechanisms pqseal can drive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KemKind {
    #[serde(rename = "ML-KEM-768")]
    MlKem768,
    #[serde(rename = "ML-KEM-1024")]
    MlKem1024,
    #[serde(rename = "X25519+ML-KEM-768")]
    X25519MlKem768,
}

impl KemKind {
    /// Human-readable KEM name
    pub fn name(&self) -> &'static str {
        match self {
            Self::MlKem768 => "ML-KEM-768",
            Self::MlKem1024 => "ML-KEM-1024",
            Self::X25519MlKem768 => "X25519+ML-KEM-768",
        }
    }

    pub fn public_key_size(&self) -> usize {
        match self {
            Self::MlKem768 => MLKEM768_PUBLIC_KEY_SIZE,
            Self::MlKem1024 => MLKEM1024_PUBLIC_KEY_SIZE,
            Self::X25519MlKem768 => HYBRID_PUBLIC_KEY_SIZE,
        }
    }

    pub fn secret_key_size(&self) -> usize {
        match self {
            Self::MlKem768 => MLKEM768_SECRET_KEY_SIZE,
            Self::MlKem1024 => MLKEM1024_SECRET_KEY_SIZE,
            Self::X25519MlKem768 => HYBRID_SECRET_KEY_SIZE,
        }
    }

    pub fn ciphertext_size(&self) -> usize {
        match self {
            Self::MlKem768 => MLKEM768_CIPHERTEXT_SIZE,
            Self::MlKem1024 => MLKEM1024_CIPHERTEXT_SIZE,
            Self::X25519MlKem768 => HYBRID_CIPHERTEXT_SIZE,
        }
    }

    pub fn shared_secret_size(&self) -> usize {
        SHARED_SECRET_SIZE
    }
}

/// Ephemeral output of encapsulation/decapsulation, wiped on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret {
    bytes: Vec<u8>,
}

impl SharedSecret {
    /// Copy a secret out of a provider buffer
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedSecret({} bytes, [REDACTED])", self.bytes.len())
    }
}

/// Freshly generated key material: `(public, secret)`
pub type KemKeyMaterial = (Vec<u8>, Zeroizing<Vec<u8>>);

macro_rules! mlkem_level {
    ($level:ident, $generate:ident, $encapsulate:ident, $decapsulate:ident) => {
        fn $generate() -> KemKeyMaterial {
            let (pk, sk) = $level::keypair();
            (pk.as_bytes().to_vec(), Zeroizing::new(sk.as_bytes().to_vec()))
        }

        fn $encapsulate(public_key: &[u8]) -> Result<(Vec<u8>, SharedSecret)> {
            let pk = $level::PublicKey::from_bytes(public_key).map_err(|e| {
                CryptoError::Encryption(format!("ML-KEM public key rejected: {:?}", e))
            })?;
            let (ss, ct) = $level::encapsulate(&pk);
            Ok((ct.as_bytes().to_vec(), SharedSecret::from_slice(ss.as_bytes())))
        }

        fn $decapsulate(secret_key: &[u8], ciphertext: &[u8]) -> Result<SharedSecret> {
            let sk = $level::SecretKey::from_bytes(secret_key)
                .map_err(|_| CryptoError::DecapsulationFailed)?;
            let ct = $level::Ciphertext::from_bytes(ciphertext)
                .map_err(|_| CryptoError::DecapsulationFailed)?;
            let ss = $level::decapsulate(&ct, &sk);
            Ok(SharedSecret::from_slice(ss.as_bytes()))
        }
    };
}

mlkem_level!(mlkem768, mlkem768_generate, mlkem768_encapsulate, mlkem768_decapsulate);
mlkem_level!(mlkem1024, mlkem1024_generate, mlkem1024_encapsulate, mlkem1024_decapsulate);

/// Generate a key pair for `kind`
pub fn generate(kind: KemKind) -> Result<KemKeyMaterial> {
    Ok(match kind {
        KemKind::MlKem768 => mlkem768_generate(),
        KemKind::MlKem1024 => mlkem1024_generate(),
        KemKind::X25519MlKem768 => hybrid_generate(),
    })
}

/// Encapsulate a fresh shared secret to `public_key` (sender side)
///
/// Returns the KEM ciphertext to send and the shared secret to keep.
pub fn encapsulate(kind: KemKind, public_key: &[u8]) -> Result<(Vec<u8>, SharedSecret)> {
    match kind {
        KemKind::MlKem768 => mlkem768_encapsulate(public_key),
        KemKind::MlKem1024 => mlkem1024_encapsulate(public_key),
        KemKind::X25519MlKem768 => hybrid_encapsulate(public_key),
    }
}

/// Recover the shared secret from `ciphertext` (recipient side)
pub fn decapsulate(kind: KemKind, secret_key: &[u8], ciphertext: &[u8]) -> Result<SharedSecret> {
    match kind {
        KemKind::MlKem768 => mlkem768_decapsulate(secret_key, ciphertext),
        KemKind::MlKem1024 => mlkem1024_decapsulate(secret_key, ciphertext),
        KemKind::X25519MlKem768 => hybrid_decapsulate(secret_key, ciphertext),
    }
}

fn hybrid_generate() -> KemKeyMaterial {
    let x25519_secret = StaticSecret::random_from_rng(OsRng);
    let x25519_public = X25519Public::from(&x25519_secret);
    let (mlkem_public, mlkem_secret) = mlkem768_generate();

    let mut public = Vec::with_capacity(HYBRID_PUBLIC_KEY_SIZE);
    public.extend_from_slice(x25519_public.as_bytes());
    public.extend_from_slice(&mlkem_public);

    let mut secret = Zeroizing::new(Vec::with_capacity(HYBRID_SECRET_KEY_SIZE));
    secret.extend_from_slice(x25519_secret.as_bytes());
    secret.extend_from_slice(&mlkem_secret);

    (public, secret)
}

fn hybrid_encapsulate(public_key: &[u8]) -> Result<(Vec<u8>, SharedSecret)> {
    if public_key.len() != HYBRID_PUBLIC_KEY_SIZE {
        return Err(CryptoError::Encryption(format!(
            "hybrid public key must be {} bytes, got {}",
            HYBRID_PUBLIC_KEY_SIZE,
            public_key.len()
        )));
    }
    let (x25519_bytes, mlkem_bytes) = public_key.split_at(X25519_PUBLIC_KEY_SIZE);
    let recipient_x25519 = X25519Public::from(to_array(x25519_bytes));

    // X25519: ephemeral ECDH against the recipient's static key
    let ephemeral_secret = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = X25519Public::from(&ephemeral_secret);
    let x25519_shared = ephemeral_secret.diffie_hellman(&recipient_x25519);
    if !x25519_shared.was_contributory() {
        return Err(CryptoError::Encryption(
            "recipient X25519 key is a low-order point".to_string(),
        ));
    }

    let (mlkem_ciphertext, mlkem_shared) = mlkem768_encapsulate(mlkem_bytes)?;

    let shared = combine(
        mlkem_shared.as_bytes(),
        x25519_shared.as_bytes(),
        ephemeral_public.as_bytes(),
        recipient_x25519.as_bytes(),
    )?;

    let mut ciphertext = Vec::with_capacity(HYBRID_CIPHERTEXT_SIZE);
    ciphertext.extend_from_slice(ephemeral_public.as_bytes());
    ciphertext.extend_from_slice(&mlkem_ciphertext);

    Ok((ciphertext, shared))
}

fn hybrid_decapsulate(secret_key: &[u8], ciphertext: &[u8]) -> Result<SharedSecret> {
    if secret_key.len() != HYBRID_SECRET_KEY_SIZE || ciphertext.len() != HYBRID_CIPHERTEXT_SIZE {
        return Err(CryptoError::DecapsulationFailed);
    }
    let (x25519_secret_bytes, mlkem_secret) = secret_key.split_at(X25519_SECRET_KEY_SIZE);
    let (ephemeral_bytes, mlkem_ciphertext) = ciphertext.split_at(X25519_PUBLIC_KEY_SIZE);

    let x25519_secret = StaticSecret::from(to_array(x25519_secret_bytes));
    let x25519_public = X25519Public::from(&x25519_secret);
    let ephemeral_public = X25519Public::from(to_array(ephemeral_bytes));

    // No early exit on a non-contributory exchange: the ML-KEM half still
    // binds the secret and the tag check rejects uniformly.
    let x25519_shared = x25519_secret.diffie_hellman(&ephemeral_public);
    let mlkem_shared = mlkem768_decapsulate(mlkem_secret, mlkem_ciphertext)?;

    combine(
        mlkem_shared.as_bytes(),
        x25519_shared.as_bytes(),
        ephemeral_public.as_bytes(),
        x25519_public.as_bytes(),
    )
}

/// HKDF-SHA256 over `mlkem_ss || x25519_ss || ephemeral_pk || recipient_pk`
fn combine(
    mlkem_shared: &[u8],
    x25519_shared: &[u8],
    ephemeral_public: &[u8],
    recipient_public: &[u8],
) -> Result<SharedSecret> {
    let mut ikm = Zeroizing::new(Vec::with_capacity(
        mlkem_shared.len() + x25519_shared.len() + 2 * X25519_PUBLIC_KEY_SIZE,
    ));
    ikm.extend_from_slice(mlkem_shared);
    ikm.extend_from_slice(x25519_shared);
    ikm.extend_from_slice(ephemeral_public);
    ikm.extend_from_slice(recipient_public);

    let hk = Hkdf::<Sha256>::new(None, &ikm);
    let mut out = Zeroizing::new([0u8; SHARED_SECRET_SIZE]);
    hk.expand(HYBRID_INFO, &mut out[..])
        .map_err(|e| CryptoError::Encryption(format!("HKDF expansion failed: {:?}", e)))?;

    Ok(SharedSecret::from_slice(&out[..]))
}

fn to_array(bytes: &[u8]) -> [u8; 32] {
    let mut arr = [0u8; 32];
    arr.copy_from_slice(bytes);
    arr
}
