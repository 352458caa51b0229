//! Shared-secret to AEAD key derivation

use crate::{
    registry::AlgorithmParams,
    symmetric::{SymmetricKey, KEY_SIZE},
    CryptoError, Result,
};
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

/// Default domain-separation context for envelope keys
pub const DEFAULT_CONTEXT: &str = "pqseal-envelope-v1";

/// How a KEM shared secret becomes an AEAD key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum KeyDerivation {
    /// HKDF-SHA256 with `info = context || 0x00 || algorithm name`
    #[default]
    HkdfSha256,
    /// First 32 bytes of the shared secret, no extraction step.
    ///
    /// Interoperates with peers that key the AEAD directly from the KEM
    /// output. Prefer [`KeyDerivation::HkdfSha256`] for new data.
    Truncate,
}

impl KeyDerivation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HkdfSha256 => "hkdf-sha256",
            Self::Truncate => "truncate",
        }
    }
}

impl fmt::Display for KeyDerivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyDerivation {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hkdf-sha256" | "hkdf" => Ok(Self::HkdfSha256),
            "truncate" => Ok(Self::Truncate),
            other => Err(CryptoError::Serialization(format!(
                "unknown key derivation: {}",
                other
            ))),
        }
    }
}

/// Derive the AEAD key for one seal/open call
///
/// The shared secret length is checked against `params` first; a short
/// secret is an error, never padded.
pub fn derive_symmetric_key(
    shared_secret: &[u8],
    params: &AlgorithmParams,
    kdf: KeyDerivation,
    context: &str,
) -> Result<SymmetricKey> {
    params.check_shared_secret(shared_secret)?;
    if shared_secret.len() < KEY_SIZE {
        return Err(CryptoError::InvalidKeyMaterial {
            what: "shared secret",
            algorithm: params.id.as_str(),
            expected: KEY_SIZE,
            actual: shared_secret.len(),
        });
    }

    match kdf {
        KeyDerivation::Truncate => SymmetricKey::from_bytes(&shared_secret[..KEY_SIZE]),
        KeyDerivation::HkdfSha256 => {
            let mut info = Vec::with_capacity(context.len() + 1 + 32);
            info.extend_from_slice(context.as_bytes());
            info.push(0x00);
            info.extend_from_slice(params.id.as_str().as_bytes());

            let hk = Hkdf::<Sha256>::new(None, shared_secret);
            let mut okm = Zeroizing::new([0u8; KEY_SIZE]);
            hk.expand(&info, &mut okm[..])
                .map_err(|e| CryptoError::Encryption(format!("HKDF expansion failed: {:?}", e)))?;
            SymmetricKey::from_bytes(&okm[..])
        }
    }
}
