//! Envelope wire format
//!
//! An [`Envelope`] is the self-contained unit of transport and storage:
//! the KEM ciphertext, the AEAD nonce and `ciphertext || tag`, tagged with
//! the algorithm that produced them.
//!
//! # Binary Layout
//!
//! ```text
//! ┌────────┬─────────┬─────┬────────────┬────────┬───────────┬───────┬────────────┬────────────┐
//! │ "PQSE" │ version │ alg │ kem_ct_len │ kem_ct │ nonce_len │ nonce │ ct_len     │ ciphertext │
//! │   4    │    1    │  1  │  2 (BE)    │   n    │     1     │   n   │  4 (BE)    │     n      │
//! └────────┴─────────┴─────┴────────────┴────────┴───────────┴───────┴────────────┴────────────┘
//! ```
//!
//! Every length is cross-checked against the registry entry for `alg`.
//! A JSON form with base64 fields is also provided for text transports.

use crate::{
    registry::{AlgorithmId, AlgorithmParams, AlgorithmRegistry},
    symmetric::Nonce,
    CryptoError, Result, ENVELOPE_VERSION,
};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Magic prefix of the binary encoding
pub const ENVELOPE_MAGIC: &[u8; 4] = b"PQSE";

/// Size of the fixed binary header (magic, version, algorithm tag)
pub const HEADER_SIZE: usize = 6;

/// An encrypted payload ready for transport
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    algorithm: AlgorithmId,
    kem_ciphertext: Vec<u8>,
    nonce: Nonce,
    ciphertext: Vec<u8>,
}

impl Envelope {
    /// Assemble an envelope from its fields.
    ///
    /// Sizes are not checked here; [`Envelope::validate`] and every decode
    /// and open path check them.
    pub fn from_parts(
        algorithm: AlgorithmId,
        kem_ciphertext: Vec<u8>,
        nonce: Nonce,
        ciphertext: Vec<u8>,
    ) -> Self {
        Self {
            algorithm,
            kem_ciphertext,
            nonce,
            ciphertext,
        }
    }

    pub fn algorithm(&self) -> AlgorithmId {
        self.algorithm
    }

    pub fn kem_ciphertext(&self) -> &[u8] {
        &self.kem_ciphertext
    }

    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    /// AEAD output including the trailing tag
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Consume into `(algorithm, kem_ciphertext, nonce, ciphertext)`
    pub fn into_parts(self) -> (AlgorithmId, Vec<u8>, Nonce, Vec<u8>) {
        (self.algorithm, self.kem_ciphertext, self.nonce, self.ciphertext)
    }

    /// Check every field length against the registry entry for the algorithm
    pub fn validate<'r>(&self, registry: &'r AlgorithmRegistry) -> Result<&'r AlgorithmParams> {
        let params = registry.resolve(self.algorithm)?;
        params.check_envelope_fields(
            self.kem_ciphertext.len(),
            self.nonce.as_bytes().len(),
            self.ciphertext.len(),
        )?;
        Ok(params)
    }

    /// Total size of the binary encoding
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + 2 + self.kem_ciphertext.len() + 1 + self.nonce.as_bytes().len() + 4
            + self.ciphertext.len()
    }

    /// Encode to the canonical binary form
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let kem_len = u16::try_from(self.kem_ciphertext.len()).map_err(|_| {
            CryptoError::MalformedEnvelope("KEM ciphertext too large to encode".to_string())
        })?;
        let ct_len = u32::try_from(self.ciphertext.len()).map_err(|_| {
            CryptoError::MalformedEnvelope("ciphertext too large to encode".to_string())
        })?;
        let nonce = self.nonce.as_bytes();

        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(ENVELOPE_MAGIC);
        out.push(ENVELOPE_VERSION);
        out.push(self.algorithm.tag());
        out.extend_from_slice(&kem_len.to_be_bytes());
        out.extend_from_slice(&self.kem_ciphertext);
        out.push(nonce.len() as u8);
        out.extend_from_slice(nonce);
        out.extend_from_slice(&ct_len.to_be_bytes());
        out.extend_from_slice(&self.ciphertext);
        Ok(out)
    }

    /// Decode the binary form, validating against `registry`
    pub fn from_bytes(bytes: &[u8], registry: &AlgorithmRegistry) -> Result<Self> {
        let mut reader = Reader::new(bytes);

        if reader.take(ENVELOPE_MAGIC.len(), "magic")? != ENVELOPE_MAGIC {
            return Err(CryptoError::MalformedEnvelope("bad magic".to_string()));
        }
        let version = reader.u8("version")?;
        if version != ENVELOPE_VERSION {
            return Err(CryptoError::MalformedEnvelope(format!(
                "unsupported version {}",
                version
            )));
        }
        let params = registry.resolve_tag(reader.u8("algorithm")?)?;

        let kem_len = reader.u16("KEM ciphertext length")? as usize;
        if kem_len != params.ciphertext_size {
            return Err(CryptoError::MalformedEnvelope(format!(
                "{} KEM ciphertext must be {} bytes, got {}",
                params.id, params.ciphertext_size, kem_len
            )));
        }
        let kem_ciphertext = reader.take(kem_len, "KEM ciphertext")?.to_vec();

        let nonce_len = reader.u8("nonce length")? as usize;
        let nonce = Nonce::from_bytes(reader.take(nonce_len, "nonce")?)?;

        let ct_len = reader.u32("ciphertext length")? as usize;
        let ciphertext = reader.take(ct_len, "ciphertext")?.to_vec();

        if !reader.is_empty() {
            return Err(CryptoError::MalformedEnvelope(format!(
                "{} trailing bytes",
                reader.remaining()
            )));
        }

        let envelope = Self::from_parts(params.id, kem_ciphertext, nonce, ciphertext);
        envelope.validate(registry)?;
        Ok(envelope)
    }

    /// Encode the binary form as standard base64
    pub fn to_base64(&self) -> Result<String> {
        Ok(base64::engine::general_purpose::STANDARD.encode(self.to_bytes()?))
    }

    /// Decode base64-armoured binary
    pub fn from_base64(s: &str, registry: &AlgorithmRegistry) -> Result<Self> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(s.trim())
            .map_err(|e| CryptoError::MalformedEnvelope(format!("invalid base64: {}", e)))?;
        Self::from_bytes(&bytes, registry)
    }

    /// Encode as a JSON document with base64 fields
    pub fn to_json(&self) -> Result<String> {
        let doc = EnvelopeDocument {
            version: ENVELOPE_VERSION,
            algorithm: self.algorithm.as_str().to_string(),
            kem_ciphertext: self.kem_ciphertext.clone(),
            nonce: self.nonce.as_bytes().to_vec(),
            ciphertext: self.ciphertext.clone(),
        };
        Ok(serde_json::to_string(&doc)?)
    }

    /// Decode the JSON document form, validating against `registry`
    pub fn from_json(s: &str, registry: &AlgorithmRegistry) -> Result<Self> {
        let doc: EnvelopeDocument = serde_json::from_str(s)
            .map_err(|e| CryptoError::MalformedEnvelope(e.to_string()))?;
        if doc.version != ENVELOPE_VERSION {
            return Err(CryptoError::MalformedEnvelope(format!(
                "unsupported version {}",
                doc.version
            )));
        }
        let algorithm: AlgorithmId = doc.algorithm.parse()?;
        let envelope = Self::from_parts(
            algorithm,
            doc.kem_ciphertext,
            Nonce::from_bytes(&doc.nonce)?,
            doc.ciphertext,
        );
        envelope.validate(registry)?;
        Ok(envelope)
    }
}

/// JSON representation
#[derive(Serialize, Deserialize)]
struct EnvelopeDocument {
    version: u8,
    /// Display name, resolved through `AlgorithmId::from_str`
    algorithm: String,
    #[serde(with = "base64_vec_serde")]
    kem_ciphertext: Vec<u8>,
    #[serde(with = "base64_vec_serde")]
    nonce: Vec<u8>,
    #[serde(with = "base64_vec_serde")]
    ciphertext: Vec<u8>,
}

mod base64_vec_serde {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        base64::engine::general_purpose::STANDARD
            .decode(&s)
            .map_err(serde::de::Error::custom)
    }
}

/// Bounds-checked cursor over the binary encoding
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| CryptoError::MalformedEnvelope(format!("truncated {}", field)))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self, field: &str) -> Result<u8> {
        Ok(self.take(1, field)?[0])
    }

    fn u16(&mut self, field: &str) -> Result<u16> {
        let b = self.take(2, field)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, field: &str) -> Result<u32> {
        let b = self.take(4, field)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}
