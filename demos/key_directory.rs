//! Key directory walkthrough
//!
//! This example demonstrates:
//! - Saving key pairs in raw and structured encodings
//! - Listing and loading keys by name
//! - Sealing to a stored public key and opening with the stored private key
//!
//! Run with: cargo run --example key_directory

use pqseal::{AlgorithmId, HybridCipher, KeyStore, KeyStoreConfig, PublicKeyEncoding};
use pqseal_cli::ensure_key_dir;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let tmp = tempfile::TempDir::new()?;
    let dir = tmp.path().join("pqc-keys");
    ensure_key_dir(&dir)?;
    println!("key directory: {}\n", dir.display());

    let store = KeyStore::new(
        KeyStoreConfig::new(&dir).with_public_encoding(PublicKeyEncoding::Both),
    );
    let cipher = HybridCipher::default();

    for (name, algorithm) in [
        ("alice", AlgorithmId::MlKem768),
        ("bob", AlgorithmId::MlKem1024),
        ("carol", AlgorithmId::X25519MlKem768),
    ] {
        let key_pair = cipher.generate_key_pair(algorithm)?;
        store.save(name, &key_pair)?;
        println!("saved {:<6} {} ({})", name, algorithm, key_pair.key_id());
    }

    let mut names: Vec<_> = store.list_keys()?.into_iter().collect();
    names.sort();
    println!("\nstored keys: {}", names.join(", "));

    let record = store.load_public_record("bob")?;
    let algorithm = record.algorithm.unwrap_or_default();
    let envelope = cipher
        .seal_async(record.public_key, algorithm, b"hello bob".to_vec(), None)
        .await?;
    println!("\nsealed to bob: {}", envelope.to_json()?);

    let private_key = store.load_private_key("bob")?;
    let plaintext = cipher.open_async(private_key, envelope, None).await?;
    println!("bob reads: {}", String::from_utf8_lossy(&plaintext));

    store.delete("carol")?;
    println!("\nafter deleting carol: {} keys", store.list_keys()?.len());

    Ok(())
}
