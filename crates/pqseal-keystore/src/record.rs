//! Public key records
//!
//! The structured encoding is a small JSON document:
//!
//! ```text
//! {"public_key": "<base64>", "algorithm": "ML-KEM-768", "key_id": "9f2c..."}
//! ```
//!
//! Only `public_key` is required. Files written by other tools may omit the
//! metadata or carry extra fields; both are tolerated.

use pqseal_crypto::AlgorithmId;
use serde::{Deserialize, Serialize};

/// On-disk form of `<name>.pub.json`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredKeyRecord {
    #[serde(with = "base64_serde")]
    pub public_key: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<AlgorithmId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
}

/// Which file a public key was read from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublicKeySource {
    Raw,
    Structured,
}

/// A loaded public key with whatever metadata was stored next to it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKeyRecord {
    pub public_key: Vec<u8>,
    pub algorithm: Option<AlgorithmId>,
    pub key_id: Option<String>,
    pub source: PublicKeySource,
}

mod base64_serde {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(d)?;
        STANDARD
            .decode(encoded.trim())
            .map_err(serde::de::Error::custom)
    }
}
