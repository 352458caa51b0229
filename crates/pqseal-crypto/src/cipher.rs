//! Hybrid seal/open protocol
//!
//! [`HybridCipher`] orchestrates the registry, a [`Provider`] and the
//! envelope codec:
//!
//! ```text
//! seal: validate pk → encapsulate → derive key → fresh nonce → AEAD encrypt → Envelope
//! open: validate sk + envelope → decapsulate → derive key → AEAD decrypt → plaintext
//! ```
//!
//! The cipher holds no mutable state. Clones share the provider and can be
//! used from any number of threads at once. Every failure is terminal for
//! the call; nothing is retried here.

use crate::{
    envelope::Envelope,
    kdf::{derive_symmetric_key, KeyDerivation, DEFAULT_CONTEXT},
    keys::KeyPair,
    provider::{NativeProvider, Provider},
    registry::{AlgorithmId, AlgorithmRegistry},
    symmetric::Nonce,
    CryptoError, Result,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Largest plaintext the binary envelope can carry
pub const MAX_PLAINTEXT_SIZE: usize = u32::MAX as usize - crate::symmetric::TAG_SIZE;

/// Cipher configuration; both sides of an exchange must agree on it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherConfig {
    /// Shared-secret to AEAD key derivation
    pub kdf: KeyDerivation,
    /// Domain-separation context fed to the KDF
    pub context: String,
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            kdf: KeyDerivation::HkdfSha256,
            context: DEFAULT_CONTEXT.to_string(),
        }
    }
}

impl CipherConfig {
    /// Set the key derivation
    pub fn with_kdf(mut self, kdf: KeyDerivation) -> Self {
        self.kdf = kdf;
        self
    }

    /// Set the KDF context label
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }
}

/// Hybrid KEM + AEAD envelope encryption
#[derive(Clone)]
pub struct HybridCipher {
    provider: Arc<dyn Provider>,
    registry: AlgorithmRegistry,
    config: CipherConfig,
}

impl Default for HybridCipher {
    fn default() -> Self {
        Self::new(Arc::new(NativeProvider::new()))
    }
}

impl HybridCipher {
    /// Create a cipher over `provider` with the default configuration
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            registry: AlgorithmRegistry::default(),
            config: CipherConfig::default(),
        }
    }

    /// Create with custom configuration
    pub fn with_config(provider: Arc<dyn Provider>, config: CipherConfig) -> Self {
        Self {
            provider,
            registry: AlgorithmRegistry::default(),
            config,
        }
    }

    /// Replace the algorithm registry (e.g. to disable algorithms)
    pub fn with_registry(mut self, registry: AlgorithmRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    pub fn config(&self) -> &CipherConfig {
        &self.config
    }

    /// Generate a key pair for `algorithm` through the provider
    #[instrument(skip(self))]
    pub fn generate_key_pair(&self, algorithm: AlgorithmId) -> Result<KeyPair> {
        let params = self.registry.resolve(algorithm)?;
        let key_pair = self.provider.generate(params)?;
        if key_pair.algorithm() != algorithm {
            return Err(CryptoError::KeyGeneration(format!(
                "provider returned a {} key pair for {}",
                key_pair.algorithm(),
                algorithm
            )));
        }
        key_pair
            .validate(&self.registry)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        debug!(key_id = key_pair.key_id(), "generated key pair");
        Ok(key_pair)
    }

    /// Encrypt `plaintext` to `recipient_public_key`
    ///
    /// A fresh KEM encapsulation and a fresh random nonce are drawn on every
    /// call, so sealing the same input twice yields different envelopes.
    #[instrument(skip_all, fields(algorithm = %algorithm, len = plaintext.len()))]
    pub fn seal(
        &self,
        recipient_public_key: &[u8],
        algorithm: AlgorithmId,
        plaintext: &[u8],
        associated_data: Option<&[u8]>,
    ) -> Result<Envelope> {
        let params = self.registry.resolve(algorithm)?;
        params.check_public_key(recipient_public_key)?;
        if plaintext.len() > MAX_PLAINTEXT_SIZE {
            return Err(CryptoError::Encryption(format!(
                "plaintext of {} bytes exceeds maximum {}",
                plaintext.len(),
                MAX_PLAINTEXT_SIZE
            )));
        }

        let (kem_ciphertext, shared_secret) =
            self.provider.encapsulate(params, recipient_public_key)?;
        if kem_ciphertext.len() != params.ciphertext_size {
            return Err(CryptoError::Encryption(format!(
                "provider returned a {}-byte KEM ciphertext, expected {}",
                kem_ciphertext.len(),
                params.ciphertext_size
            )));
        }

        let key = derive_symmetric_key(
            shared_secret.as_bytes(),
            params,
            self.config.kdf,
            &self.config.context,
        )?;
        drop(shared_secret);

        let nonce = Nonce::generate();
        let ciphertext = self.provider.aead_encrypt(
            params.aead,
            &key,
            &nonce,
            plaintext,
            associated_data.unwrap_or_default(),
        )?;
        drop(key);

        if ciphertext.len() != plaintext.len() + params.tag_size() {
            return Err(CryptoError::Encryption(
                "provider returned a ciphertext of unexpected length".to_string(),
            ));
        }

        debug!("sealed envelope");
        Ok(Envelope::from_parts(algorithm, kem_ciphertext, nonce, ciphertext))
    }

    /// Decrypt `envelope` with `recipient_private_key`
    ///
    /// On any failure no plaintext, partial or otherwise, is returned.
    #[instrument(skip_all, fields(algorithm = %envelope.algorithm()))]
    pub fn open(
        &self,
        recipient_private_key: &[u8],
        envelope: &Envelope,
        associated_data: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        let params = envelope.validate(&self.registry)?;
        params.check_private_key(recipient_private_key)?;

        let shared_secret = self.provider.decapsulate(
            params,
            recipient_private_key,
            envelope.kem_ciphertext(),
        )?;

        let key = derive_symmetric_key(
            shared_secret.as_bytes(),
            params,
            self.config.kdf,
            &self.config.context,
        )
        .map_err(|_| CryptoError::DecapsulationFailed)?;
        drop(shared_secret);

        let plaintext = self.provider.aead_decrypt(
            params.aead,
            &key,
            envelope.nonce(),
            envelope.ciphertext(),
            associated_data.unwrap_or_default(),
        );
        drop(key);

        match plaintext {
            Ok(plaintext) => {
                debug!("opened envelope");
                Ok(plaintext)
            }
            Err(CryptoError::AuthenticationFailed) => {
                debug!("envelope rejected");
                Err(CryptoError::AuthenticationFailed)
            }
            Err(other) => Err(other),
        }
    }

    /// Seal and encode to the binary wire form
    pub fn seal_to_bytes(
        &self,
        recipient_public_key: &[u8],
        algorithm: AlgorithmId,
        plaintext: &[u8],
        associated_data: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        self.seal(recipient_public_key, algorithm, plaintext, associated_data)?
            .to_bytes()
    }

    /// Decode the binary wire form and open it
    pub fn open_bytes(
        &self,
        recipient_private_key: &[u8],
        envelope: &[u8],
        associated_data: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        let envelope = Envelope::from_bytes(envelope, &self.registry)?;
        self.open(recipient_private_key, &envelope, associated_data)
    }

    /// [`HybridCipher::seal`] on tokio's blocking pool
    pub async fn seal_async(
        &self,
        recipient_public_key: Vec<u8>,
        algorithm: AlgorithmId,
        plaintext: Vec<u8>,
        associated_data: Option<Vec<u8>>,
    ) -> Result<Envelope> {
        let cipher = self.clone();
        tokio::task::spawn_blocking(move || {
            cipher.seal(
                &recipient_public_key,
                algorithm,
                &plaintext,
                associated_data.as_deref(),
            )
        })
        .await
        .map_err(|e| CryptoError::Task(e.to_string()))?
    }

    /// [`HybridCipher::open`] on tokio's blocking pool
    pub async fn open_async(
        &self,
        recipient_private_key: zeroize::Zeroizing<Vec<u8>>,
        envelope: Envelope,
        associated_data: Option<Vec<u8>>,
    ) -> Result<Vec<u8>> {
        let cipher = self.clone();
        tokio::task::spawn_blocking(move || {
            cipher.open(&recipient_private_key, &envelope, associated_data.as_deref())
        })
        .await
        .map_err(|e| CryptoError::Task(e.to_string()))?
    }
}

impl std::fmt::Debug for HybridCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridCipher")
            .field("algorithms", &self.registry.algorithms().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;
    use rstest::rstest;

    #[rstest]
    #[case(AlgorithmId::MlKem768)]
    #[case(AlgorithmId::MlKem1024)]
    #[case(AlgorithmId::MlKem768ChaCha20)]
    #[case(AlgorithmId::X25519MlKem768)]
    fn test_seal_open_roundtrip(#[case] algorithm: AlgorithmId) {
        let cipher = HybridCipher::default();
        let kp = cipher.generate_key_pair(algorithm).unwrap();

        for plaintext in [&b""[..], b"x", b"quantum-safe", &[0x5Au8; 4096][..]] {
            let envelope = cipher.seal(kp.public_key(), algorithm, plaintext, None).unwrap();
            assert_eq!(envelope.ciphertext().len(), plaintext.len() + 16);
            let opened = cipher.open(kp.private_key(), &envelope, None).unwrap();
            assert_eq!(opened, plaintext);
        }
    }

    #[test]
    fn test_quantum_safe_scenario() {
        let cipher = HybridCipher::default();
        let kp = cipher.generate_key_pair(AlgorithmId::MlKem768).unwrap();

        let envelope = cipher
            .seal(kp.public_key(), AlgorithmId::MlKem768, b"quantum-safe", None)
            .unwrap();
        assert_eq!(envelope.ciphertext().len(), 12 + 16);
        assert_eq!(
            cipher.open(kp.private_key(), &envelope, None).unwrap(),
            b"quantum-safe"
        );
    }

    #[test]
    fn test_seal_is_not_deterministic() {
        let cipher = HybridCipher::default();
        let kp = cipher.generate_key_pair(AlgorithmId::MlKem768).unwrap();

        let a = cipher.seal(kp.public_key(), AlgorithmId::MlKem768, b"same", None).unwrap();
        let b = cipher.seal(kp.public_key(), AlgorithmId::MlKem768, b"same", None).unwrap();

        assert_ne!(a.nonce(), b.nonce());
        assert_ne!(a.kem_ciphertext(), b.kem_ciphertext());
        assert_ne!(a.ciphertext(), b.ciphertext());
    }

    #[test]
    fn test_associated_data_is_bound() {
        let cipher = HybridCipher::default();
        let kp = cipher.generate_key_pair(AlgorithmId::MlKem768).unwrap();
        let envelope = cipher
            .seal(kp.public_key(), AlgorithmId::MlKem768, b"body", Some(b"header"))
            .unwrap();

        assert_eq!(
            cipher.open(kp.private_key(), &envelope, Some(b"header")).unwrap(),
            b"body"
        );
        assert!(matches!(
            cipher.open(kp.private_key(), &envelope, Some(b"other")),
            Err(CryptoError::AuthenticationFailed)
        ));
        assert!(matches!(
            cipher.open(kp.private_key(), &envelope, None),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_kdf_mismatch_fails_authentication() {
        let hkdf = HybridCipher::default();
        let truncate = HybridCipher::with_config(
            Arc::new(NativeProvider::new()),
            CipherConfig::default().with_kdf(KeyDerivation::Truncate),
        );
        let kp = hkdf.generate_key_pair(AlgorithmId::MlKem768).unwrap();

        let envelope = truncate
            .seal(kp.public_key(), AlgorithmId::MlKem768, b"legacy", None)
            .unwrap();
        assert_eq!(truncate.open(kp.private_key(), &envelope, None).unwrap(), b"legacy");
        assert!(matches!(
            hkdf.open(kp.private_key(), &envelope, None),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_wrong_public_key_size_never_reaches_provider() {
        // A mock with no expectations panics if any method is called
        let cipher = HybridCipher::new(Arc::new(MockProvider::new()));
        let result = cipher.seal(&[0u8; 1000], AlgorithmId::MlKem768, b"data", None);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidKeyMaterial { expected: 1184, actual: 1000, .. })
        ));
    }

    #[test]
    fn test_wrong_private_key_size_never_reaches_provider() {
        let sealer = HybridCipher::default();
        let kp = sealer.generate_key_pair(AlgorithmId::MlKem768).unwrap();
        let envelope = sealer
            .seal(kp.public_key(), AlgorithmId::MlKem768, b"data", None)
            .unwrap();

        let cipher = HybridCipher::new(Arc::new(MockProvider::new()));
        let result = cipher.open(&kp.private_key()[..2399], &envelope, None);
        assert!(matches!(result, Err(CryptoError::InvalidKeyMaterial { .. })));
    }

    #[test]
    fn test_authentication_failure_is_not_downgraded() {
        let mut mock = MockProvider::new();
        mock.expect_decapsulate()
            .returning(|_, _, _| Ok(crate::kem::SharedSecret::from_slice(&[9u8; 32])));
        mock.expect_aead_decrypt()
            .returning(|_, _, _, _, _| Err(CryptoError::AuthenticationFailed));

        let cipher = HybridCipher::new(Arc::new(mock));
        let params = AlgorithmId::MlKem768.params();
        let envelope = Envelope::from_parts(
            AlgorithmId::MlKem768,
            vec![0u8; params.ciphertext_size],
            Nonce::generate(),
            vec![0u8; 16],
        );

        let result = cipher.open(&vec![0u8; params.private_key_size], &envelope, None);
        assert!(matches!(result, Err(CryptoError::AuthenticationFailed)));
    }

    #[test]
    fn test_disabled_algorithm_is_unknown() {
        let cipher = HybridCipher::default()
            .with_registry(AlgorithmRegistry::with_algorithms(&[AlgorithmId::MlKem1024]));
        let kp = KeyPair::generate(AlgorithmId::MlKem768).unwrap();
        assert!(matches!(
            cipher.seal(kp.public_key(), AlgorithmId::MlKem768, b"data", None),
            Err(CryptoError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn test_bytes_helpers() {
        let cipher = HybridCipher::default();
        let kp = cipher.generate_key_pair(AlgorithmId::MlKem1024).unwrap();
        let wire = cipher
            .seal_to_bytes(kp.public_key(), AlgorithmId::MlKem1024, b"over the wire", None)
            .unwrap();
        assert_eq!(
            cipher.open_bytes(kp.private_key(), &wire, None).unwrap(),
            b"over the wire"
        );
    }

    #[tokio::test]
    async fn test_async_wrappers() {
        let cipher = HybridCipher::default();
        let kp = cipher.generate_key_pair(AlgorithmId::MlKem768).unwrap();

        let envelope = cipher
            .seal_async(kp.public_key().to_vec(), AlgorithmId::MlKem768, b"async".to_vec(), None)
            .await
            .unwrap();
        let opened = cipher
            .open_async(zeroize::Zeroizing::new(kp.private_key().to_vec()), envelope, None)
            .await
            .unwrap();
        assert_eq!(opened, b"async");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn seal_open_roundtrip(
                plaintext in proptest::collection::vec(any::<u8>(), 0..2048),
                aad in proptest::option::of(proptest::collection::vec(any::<u8>(), 0..64)),
                index in 0usize..AlgorithmId::ALL.len(),
            ) {
                let algorithm = AlgorithmId::ALL[index];
                let cipher = HybridCipher::default();
                let kp = cipher.generate_key_pair(algorithm).unwrap();

                let envelope = cipher
                    .seal(kp.public_key(), algorithm, &plaintext, aad.as_deref())
                    .unwrap();
                prop_assert_eq!(envelope.ciphertext().len(), plaintext.len() + 16);

                let opened = cipher.open(kp.private_key(), &envelope, aad.as_deref()).unwrap();
                prop_assert_eq!(opened, plaintext);
            }

            #[test]
            fn flipped_ciphertext_bit_is_rejected(
                plaintext in proptest::collection::vec(any::<u8>(), 1..256),
                position in any::<prop::sample::Index>(),
                bit in 0u8..8,
            ) {
                let cipher = HybridCipher::default();
                let kp = cipher.generate_key_pair(AlgorithmId::MlKem768).unwrap();
                let envelope = cipher
                    .seal(kp.public_key(), AlgorithmId::MlKem768, &plaintext, None)
                    .unwrap();

                let (algorithm, kem_ct, nonce, mut ciphertext) = envelope.into_parts();
                let i = position.index(ciphertext.len());
                ciphertext[i] ^= 1 << bit;
                let tampered = Envelope::from_parts(algorithm, kem_ct, nonce, ciphertext);

                prop_assert!(matches!(
                    cipher.open(kp.private_key(), &tampered, None),
                    Err(CryptoError::AuthenticationFailed)
                ));
            }
        }
    }
}
