//! Benchmarks for pqseal-crypto

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pqseal_crypto::{
    kem::{self, KemKind},
    symmetric::{Aead, AeadCipher, Nonce, SymmetricKey},
    AlgorithmId, HybridCipher,
};

fn bench_kem(c: &mut Criterion) {
    let mut group = c.benchmark_group("kem");

    for kind in [KemKind::MlKem768, KemKind::MlKem1024, KemKind::X25519MlKem768] {
        group.bench_function(BenchmarkId::new("keygen", kind.name()), |b| {
            b.iter(|| kem::generate(kind).unwrap())
        });

        let (public, secret) = kem::generate(kind).unwrap();
        group.bench_function(BenchmarkId::new("encapsulate", kind.name()), |b| {
            b.iter(|| kem::encapsulate(kind, &public).unwrap())
        });

        let (ct, _) = kem::encapsulate(kind, &public).unwrap();
        group.bench_function(BenchmarkId::new("decapsulate", kind.name()), |b| {
            b.iter(|| kem::decapsulate(kind, &secret, &ct).unwrap())
        });
    }

    group.finish();
}

fn bench_aead(c: &mut Criterion) {
    let mut group = c.benchmark_group("aead");
    let key = SymmetricKey::generate();

    for size in [1024, 64 * 1024, 1024 * 1024].iter() {
        let data = vec![0u8; *size];
        group.throughput(Throughput::Bytes(*size as u64));

        for cipher in [AeadCipher::Aes256Gcm, AeadCipher::ChaCha20Poly1305] {
            let aead = Aead::new(&key, cipher);
            let nonce = Nonce::generate();
            group.bench_with_input(
                BenchmarkId::new(format!("{}-encrypt", cipher.algorithm_id()), size),
                &data,
                |b, data| b.iter(|| aead.encrypt(&nonce, data, b"").unwrap()),
            );

            let sealed = aead.encrypt(&nonce, &data, b"").unwrap();
            group.bench_with_input(
                BenchmarkId::new(format!("{}-decrypt", cipher.algorithm_id()), size),
                &sealed,
                |b, sealed| b.iter(|| aead.decrypt(&nonce, sealed, b"").unwrap()),
            );
        }
    }

    group.finish();
}

fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope");
    let cipher = HybridCipher::default();

    for algorithm in AlgorithmId::ALL {
        let kp = cipher.generate_key_pair(algorithm).unwrap();

        for size in [32, 1024, 64 * 1024].iter() {
            let data = vec![0u8; *size];
            group.throughput(Throughput::Bytes(*size as u64));

            group.bench_with_input(
                BenchmarkId::new(format!("{}-seal", algorithm), size),
                &data,
                |b, data| b.iter(|| cipher.seal(kp.public_key(), algorithm, data, None).unwrap()),
            );

            let envelope = cipher.seal(kp.public_key(), algorithm, &data, None).unwrap();
            group.bench_with_input(
                BenchmarkId::new(format!("{}-open", algorithm), size),
                &envelope,
                |b, envelope| b.iter(|| cipher.open(kp.private_key(), envelope, None).unwrap()),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_kem, bench_aead, bench_envelope);
criterion_main!(benches);
