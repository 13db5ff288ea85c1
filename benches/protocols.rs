#![allow(non_snake_case)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::thread_rng;

use qesa_proofs::lmpa::simple_zk;
use qesa_proofs::test_utils::{linear_instance, product_instance};
use qesa_proofs::{compute_mapping, execute, get_commitment_crs, Crs};

fn bench_simple_zk(c: &mut Criterion) {
    use bls12_381::G1Projective as G;

    let mut group = c.benchmark_group("simple-zk bls12_381 G1");
    let mut rng = thread_rng();

    for cols in [4, 16, 64, 256] {
        let (A, w, t) = linear_instance::<G>(2, cols, &mut rng);
        group.bench_with_input(BenchmarkId::new("2 rows, cols", cols), &cols, |b, _| {
            b.iter(|| {
                let mut prover = simple_zk::ProverContext::begin(&A, &w).unwrap();
                let mut verifier = simple_zk::VerifierContext::begin(&A, &t).unwrap();
                black_box(execute(&mut prover, &mut verifier, &mut thread_rng()).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_copy(c: &mut Criterion) {
    use curve25519_dalek::RistrettoPoint as G;

    let instance = product_instance::<G>(&mut thread_rng());
    c.bench_function("copy ristretto product", |b| {
        b.iter(|| {
            let mut prover = instance.prover().unwrap();
            let mut verifier = instance.verifier().unwrap();
            black_box(execute(&mut prover, &mut verifier, &mut thread_rng()).unwrap())
        })
    });
}

fn bench_mapping(c: &mut Criterion) {
    use curve25519_dalek::RistrettoPoint as G;

    let crs = Crs::<G>::random(1024, &mut thread_rng());
    let com_crs_set: Vec<_> = (0..64)
        .map(|i| get_commitment_crs(&crs, &[512 + 4 * i, 513 + 4 * i]).unwrap())
        .collect();
    c.bench_function("compute_mapping 64 commitments", |b| {
        b.iter(|| compute_mapping(&crs, black_box(128), black_box(&com_crs_set)).unwrap())
    });
}

criterion_group!(benches, bench_simple_zk, bench_copy, bench_mapping);
criterion_main!(benches);
