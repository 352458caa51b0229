//! End-to-end seal/open tests across crates

use pqseal::{
    AlgorithmId, CipherConfig, Envelope, HybridCipher, KeyDerivation, KeyStore, KeyStoreConfig,
    NativeProvider, PublicKeyEncoding,
};
use rstest::rstest;
use std::sync::Arc;
use tempfile::TempDir;

#[rstest]
#[case(AlgorithmId::MlKem768)]
#[case(AlgorithmId::MlKem1024)]
#[case(AlgorithmId::MlKem768ChaCha20)]
#[case(AlgorithmId::X25519MlKem768)]
fn test_roundtrip_through_keystore(#[case] algorithm: AlgorithmId) {
    let dir = TempDir::new().unwrap();
    let store = KeyStore::new(
        KeyStoreConfig::new(dir.path()).with_public_encoding(PublicKeyEncoding::Structured),
    );
    let cipher = HybridCipher::default();

    let recipient = cipher.generate_key_pair(algorithm).unwrap();
    store.save("recipient", &recipient).unwrap();

    let public_key = store.load_public_key("recipient").unwrap();
    let wire = cipher
        .seal_to_bytes(&public_key, algorithm, b"end to end", Some(b"aad"))
        .unwrap();

    let private_key = store.load_private_key("recipient").unwrap();
    let plaintext = cipher.open_bytes(&private_key, &wire, Some(b"aad")).unwrap();
    assert_eq!(plaintext, b"end to end");
}

#[test]
fn test_concrete_scenario() {
    let cipher = HybridCipher::default();
    let kp = cipher.generate_key_pair(AlgorithmId::MlKem768).unwrap();

    let envelope = cipher
        .seal(kp.public_key(), AlgorithmId::MlKem768, b"quantum-safe", None)
        .unwrap();

    assert_eq!(envelope.algorithm(), AlgorithmId::MlKem768);
    assert_eq!(envelope.kem_ciphertext().len(), 1088);
    assert_eq!(envelope.ciphertext().len(), 28);
    assert_eq!(cipher.open(kp.private_key(), &envelope, None).unwrap(), b"quantum-safe");
}

#[test]
fn test_empty_plaintext() {
    let cipher = HybridCipher::default();
    let kp = cipher.generate_key_pair(AlgorithmId::MlKem1024).unwrap();
    let envelope = cipher.seal(kp.public_key(), AlgorithmId::MlKem1024, b"", None).unwrap();
    assert_eq!(envelope.ciphertext().len(), 16);
    assert!(cipher.open(kp.private_key(), &envelope, None).unwrap().is_empty());
}

#[test]
fn test_wire_forms_interchangeable() {
    let cipher = HybridCipher::default();
    let kp = cipher.generate_key_pair(AlgorithmId::MlKem768ChaCha20).unwrap();
    let envelope = cipher
        .seal(kp.public_key(), AlgorithmId::MlKem768ChaCha20, b"three forms", None)
        .unwrap();

    let registry = cipher.registry();
    let from_bytes = Envelope::from_bytes(&envelope.to_bytes().unwrap(), registry).unwrap();
    let from_b64 = Envelope::from_base64(&envelope.to_base64().unwrap(), registry).unwrap();
    let from_json = Envelope::from_json(&envelope.to_json().unwrap(), registry).unwrap();

    assert_eq!(from_bytes, envelope);
    assert_eq!(from_b64, envelope);
    assert_eq!(from_json, envelope);

    let json: serde_json::Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();
    assert_eq!(json["algorithm"], "ML-KEM-768-CHACHA20");
}

#[test]
fn test_legacy_truncate_interop() {
    let legacy = HybridCipher::with_config(
        Arc::new(NativeProvider::new()),
        CipherConfig::default().with_kdf(KeyDerivation::Truncate),
    );
    let kp = legacy.generate_key_pair(AlgorithmId::MlKem768).unwrap();
    let envelope = legacy
        .seal(kp.public_key(), AlgorithmId::MlKem768, b"legacy peer", None)
        .unwrap();

    let also_legacy = legacy.clone();
    assert_eq!(
        also_legacy.open(kp.private_key(), &envelope, None).unwrap(),
        b"legacy peer"
    );
}

#[tokio::test]
async fn test_concurrent_seal_open() {
    let cipher = HybridCipher::default();
    let kp = Arc::new(cipher.generate_key_pair(AlgorithmId::MlKem768).unwrap());

    let mut handles = Vec::new();
    for i in 0..16u32 {
        let cipher = cipher.clone();
        let kp = Arc::clone(&kp);
        handles.push(tokio::spawn(async move {
            let message = format!("message {}", i).into_bytes();
            let envelope = cipher
                .seal_async(kp.public_key().to_vec(), AlgorithmId::MlKem768, message.clone(), None)
                .await
                .unwrap();
            let opened = cipher
                .open_async(zeroize_copy(kp.private_key()), envelope, None)
                .await
                .unwrap();
            assert_eq!(opened, message);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
}

fn zeroize_copy(bytes: &[u8]) -> zeroize::Zeroizing<Vec<u8>> {
    zeroize::Zeroizing::new(bytes.to_vec())
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn binary_envelope_survives_encoding(
            plaintext in proptest::collection::vec(any::<u8>(), 0..1024),
        ) {
            let cipher = HybridCipher::default();
            let kp = cipher.generate_key_pair(AlgorithmId::MlKem768).unwrap();
            let wire = cipher
                .seal_to_bytes(kp.public_key(), AlgorithmId::MlKem768, &plaintext, None)
                .unwrap();
            prop_assert_eq!(wire.len(), 6 + 2 + 1088 + 1 + 12 + 4 + plaintext.len() + 16);
            prop_assert_eq!(cipher.open_bytes(kp.private_key(), &wire, None).unwrap(), plaintext);
        }
    }
}
