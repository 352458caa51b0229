//! Basic usage of the hybrid cipher
//!
//! This example demonstrates:
//! - Generating a key pair for each algorithm
//! - Sealing a message with associated data
//! - Encoding the envelope in its three wire forms
//! - Opening the envelope and rejecting a tampered copy
//!
//! Run with: cargo run --example basic_usage

use pqseal::{AlgorithmId, Envelope, HybridCipher};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    println!("pqseal - Basic Usage Example\n");

    let cipher = HybridCipher::default();
    let message = b"quantum-safe";
    let aad = b"demo-header";

    for algorithm in AlgorithmId::ALL {
        let params = algorithm.params();
        println!("== {} ({} + {})", algorithm, params.kem_name(), params.aead_name());

        let recipient = cipher.generate_key_pair(algorithm)?;
        println!(
            "   key id {}  public {} bytes  private {} bytes",
            recipient.key_id(),
            recipient.public_key().len(),
            recipient.private_key().len()
        );

        let envelope = cipher.seal(recipient.public_key(), algorithm, message, Some(aad))?;
        let wire = envelope.to_bytes()?;
        println!(
            "   sealed {} bytes -> ciphertext {} bytes, envelope {} bytes",
            message.len(),
            envelope.ciphertext().len(),
            wire.len()
        );
        println!("   base64 form {} chars", envelope.to_base64()?.len());

        let decoded = Envelope::from_bytes(&wire, cipher.registry())?;
        let opened = cipher.open(recipient.private_key(), &decoded, Some(aad))?;
        println!("   opened: {}", String::from_utf8_lossy(&opened));

        let (id, kem_ct, nonce, mut ciphertext) = decoded.into_parts();
        ciphertext[0] ^= 0x01;
        let tampered = Envelope::from_parts(id, kem_ct, nonce, ciphertext);
        match cipher.open(recipient.private_key(), &tampered, Some(aad)) {
            Ok(_) => println!("   tampered envelope opened (unexpected)"),
            Err(e) => println!("   tampered envelope rejected: {}", e.public_message()),
        }
        println!();
    }

    Ok(())
}
