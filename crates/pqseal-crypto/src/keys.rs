//! KEM key pairs
//!
//! A [`KeyPair`] is always produced by a single provider `generate` call for
//! one algorithm; the two halves are never mixed across algorithms.

use crate::{
    provider::{NativeProvider, Provider},
    registry::{AlgorithmId, AlgorithmRegistry},
    Result,
};
use zeroize::Zeroizing;

/// Number of hex characters in a key id
pub const KEY_ID_LEN: usize = 16;

/// A KEM key pair tagged with its algorithm
#[derive(Clone)]
pub struct KeyPair {
    public_key: Vec<u8>,
    private_key: Zeroizing<Vec<u8>>,
    algorithm: AlgorithmId,
    key_id: String,
}

impl KeyPair {
    /// Generate a new key pair with the in-process provider
    pub fn generate(algorithm: AlgorithmId) -> Result<Self> {
        let params = *AlgorithmRegistry::default().resolve(algorithm)?;
        NativeProvider::new().generate(&params)
    }

    /// Assemble a key pair from its halves.
    ///
    /// The key id is recomputed from the public key.
    pub fn from_parts(
        public_key: Vec<u8>,
        private_key: Zeroizing<Vec<u8>>,
        algorithm: AlgorithmId,
    ) -> Self {
        let key_id = key_id_for(&public_key);
        Self {
            public_key,
            private_key,
            algorithm,
            key_id,
        }
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Get the private key (handle with care - contains secret material)
    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }

    pub fn algorithm(&self) -> AlgorithmId {
        self.algorithm
    }

    /// Stable fingerprint of the public key
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Check both halves against the registry sizes for this algorithm
    pub fn validate(&self, registry: &AlgorithmRegistry) -> Result<()> {
        let params = registry.resolve(self.algorithm)?;
        params.check_public_key(&self.public_key)?;
        params.check_private_key(&self.private_key)?;
        Ok(())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("algorithm", &self.algorithm)
            .field("key_id", &self.key_id)
            .field("public_key", &format_args!("{} bytes", self.public_key.len()))
            .field("private_key", &format_args!("[REDACTED]"))
            .finish()
    }
}

/// Key id: the first [`KEY_ID_LEN`] hex characters of BLAKE3(public key)
pub fn key_id_for(public_key: &[u8]) -> String {
    let digest = blake3::hash(public_key);
    let mut id = hex::encode(digest.as_bytes());
    id.truncate(KEY_ID_LEN);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CryptoError;

    #[test]
    fn test_keypair_generation() {
        let kp = KeyPair::generate(AlgorithmId::MlKem768).unwrap();
        assert_eq!(kp.public_key().len(), 1184);
        assert_eq!(kp.private_key().len(), 2400);
        assert_eq!(kp.algorithm(), AlgorithmId::MlKem768);
        assert_eq!(kp.key_id().len(), KEY_ID_LEN);
        kp.validate(&AlgorithmRegistry::default()).unwrap();
    }

    #[test]
    fn test_key_ids_differ() {
        let kp1 = KeyPair::generate(AlgorithmId::MlKem768).unwrap();
        let kp2 = KeyPair::generate(AlgorithmId::MlKem768).unwrap();
        assert_ne!(kp1.key_id(), kp2.key_id());
        assert_eq!(kp1.key_id(), key_id_for(kp1.public_key()));
    }

    #[test]
    fn test_mixed_algorithm_rejected() {
        let kp768 = KeyPair::generate(AlgorithmId::MlKem768).unwrap();
        let mixed = KeyPair::from_parts(
            kp768.public_key().to_vec(),
            Zeroizing::new(kp768.private_key().to_vec()),
            AlgorithmId::MlKem1024,
        );
        assert!(matches!(
            mixed.validate(&AlgorithmRegistry::default()),
            Err(CryptoError::InvalidKeyMaterial { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let kp = KeyPair::generate(AlgorithmId::MlKem768).unwrap();
        let rendered = format!("{:?}", kp);
        assert!(rendered.contains("REDACTED"));
        assert!(rendered.contains(kp.key_id()));
    }
}
