//! Subcommand implementations
//!
//! Each command returns a value for `main` to print; nothing here writes to
//! stdout.

use crate::{config::EnvelopeFormat, error::CliError, state::AppState, Result};
use pqseal_crypto::{
    envelope::ENVELOPE_MAGIC, key_id_for, AlgorithmId, AlgorithmRegistry, CryptoError, Envelope,
};
use pqseal_keystore::PublicKeySource;
use std::fmt;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Summary of a stored key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyInfo {
    pub name: String,
    pub algorithm: Option<AlgorithmId>,
    pub key_id: String,
    pub public_key_size: usize,
    pub source: PublicKeySource,
    pub has_private_key: bool,
}

impl fmt::Display for KeyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "name:        {}", self.name)?;
        match self.algorithm {
            Some(algorithm) => writeln!(f, "algorithm:   {}", algorithm)?,
            None => writeln!(f, "algorithm:   unknown")?,
        }
        writeln!(f, "key id:      {}", self.key_id)?;
        writeln!(f, "public key:  {} bytes ({:?})", self.public_key_size, self.source)?;
        write!(
            f,
            "private key: {}",
            if self.has_private_key { "present" } else { "absent" }
        )
    }
}

/// Generate and store a key pair
#[instrument(skip(state))]
pub fn keygen(
    state: &AppState,
    name: &str,
    algorithm: Option<AlgorithmId>,
    force: bool,
) -> Result<KeyInfo> {
    if !force && state.store.exists(name)? {
        return Err(CliError::KeyExists(name.to_string()));
    }
    let algorithm = algorithm.unwrap_or(state.config.default_algorithm);
    let key_pair = state.cipher.generate_key_pair(algorithm)?;
    state.store.save(name, &key_pair)?;
    info!(name, key_id = key_pair.key_id(), "generated key");
    show(state, name)
}

/// Stored key names, sorted for display
pub fn list(state: &AppState) -> Result<Vec<String>> {
    let mut names: Vec<String> = state.store.list_keys()?.into_iter().collect();
    names.sort();
    Ok(names)
}

/// Describe a stored key without touching the private half
pub fn show(state: &AppState, name: &str) -> Result<KeyInfo> {
    let record = state.store.load_public_record(name)?;
    let has_private_key = state.store.has_private_key(name)?;
    Ok(KeyInfo {
        name: name.to_string(),
        algorithm: record.algorithm,
        key_id: record
            .key_id
            .unwrap_or_else(|| key_id_for(&record.public_key)),
        public_key_size: record.public_key.len(),
        source: record.source,
        has_private_key,
    })
}

/// Seal `input` to the public key stored as `key`
///
/// The algorithm is taken from the flag, then the key's metadata, then
/// inferred from the public key size. Returns the number of bytes written.
#[instrument(skip(state, aad))]
pub async fn seal(
    state: &AppState,
    key: &str,
    algorithm: Option<AlgorithmId>,
    aad: Option<&str>,
    input: &Path,
    output: &Path,
    format: EnvelopeFormat,
) -> Result<usize> {
    let record = state.store.load_public_record(key)?;
    let algorithm = match algorithm.or(record.algorithm) {
        Some(algorithm) => algorithm,
        None => infer_algorithm(
            state.cipher.registry(),
            state.config.default_algorithm,
            record.public_key.len(),
        ),
    };

    let plaintext = read_file(input).await?;
    let envelope = state
        .cipher
        .seal_async(
            record.public_key,
            algorithm,
            plaintext,
            aad.map(|a| a.as_bytes().to_vec()),
        )
        .await?;

    let encoded = encode_envelope(&envelope, format)?;
    write_file(output, &encoded).await?;
    info!(key, %algorithm, %format, bytes = encoded.len(), "sealed");
    Ok(encoded.len())
}

/// Open the envelope in `input` with the private key stored as `key`
///
/// The envelope encoding is detected from its content. Nothing is written
/// to `output` unless decryption succeeds. Returns the plaintext length.
#[instrument(skip(state, aad))]
pub async fn open(
    state: &AppState,
    key: &str,
    aad: Option<&str>,
    input: &Path,
    output: &Path,
) -> Result<usize> {
    let private_key = state.store.load_private_key(key)?;
    let raw = read_file(input).await?;
    let envelope = decode_envelope(&raw, state.cipher.registry())?;

    let plaintext = state
        .cipher
        .open_async(private_key, envelope, aad.map(|a| a.as_bytes().to_vec()))
        .await?;

    write_file(output, &plaintext).await?;
    info!(key, bytes = plaintext.len(), "opened");
    Ok(plaintext.len())
}

/// Pick an algorithm for a public key stored without metadata
///
/// The default wins whenever its key size fits, otherwise the first
/// registered algorithm with a matching size. Sizes that match nothing fall
/// back to the default so sealing reports the size mismatch.
fn infer_algorithm(registry: &AlgorithmRegistry, default: AlgorithmId, key_len: usize) -> AlgorithmId {
    let fits = |id: AlgorithmId| {
        registry
            .resolve(id)
            .is_ok_and(|params| params.public_key_size == key_len)
    };
    if fits(default) {
        return default;
    }
    match registry.algorithms().find(|id| fits(*id)) {
        Some(id) => {
            warn!(%id, key_len, "key has no stored algorithm, inferred from its size");
            id
        }
        None => default,
    }
}

fn encode_envelope(envelope: &Envelope, format: EnvelopeFormat) -> Result<Vec<u8>> {
    Ok(match format {
        EnvelopeFormat::Binary => envelope.to_bytes()?,
        EnvelopeFormat::Base64 => envelope.to_base64()?.into_bytes(),
        EnvelopeFormat::Json => envelope.to_json()?.into_bytes(),
    })
}

/// Binary if it starts with the magic, JSON if it looks like an object,
/// base64 otherwise
pub fn decode_envelope(
    bytes: &[u8],
    registry: &AlgorithmRegistry,
) -> std::result::Result<Envelope, CryptoError> {
    if bytes.starts_with(ENVELOPE_MAGIC) {
        return Envelope::from_bytes(bytes, registry);
    }
    let text = std::str::from_utf8(bytes)
        .map_err(|_| CryptoError::MalformedEnvelope("unrecognised envelope encoding".into()))?
        .trim();
    if text.starts_with('{') {
        Envelope::from_json(text, registry)
    } else {
        Envelope::from_base64(text, registry)
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|source| CliError::File {
        path: path.display().to_string(),
        source,
    })
}

async fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    tokio::fs::write(path, content)
        .await
        .map_err(|source| CliError::File {
            path: path.display().to_string(),
            source,
        })
}
