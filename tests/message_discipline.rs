//! Every step emits a freshly built message whose length is fixed by the round.

#![allow(non_snake_case)]

use bls12_381::G1Projective;
use curve25519_dalek::RistrettoPoint;
use rand::rngs::OsRng;

use qesa_proofs::lmpa::simple_zk;
use qesa_proofs::test_utils::{linear_instance, product_instance};
use qesa_proofs::{InteractiveProver, InteractiveVerifier, Message};

/// Runs both sides step by step and records the length of every message, prover first.
fn transcript_lengths(
    prover: &mut impl InteractiveProver,
    verifier: &mut impl InteractiveVerifier,
) -> Vec<usize> {
    let mut lengths = Vec::new();
    let mut message = Message::empty();
    loop {
        let step = prover.step_prover(message, &mut OsRng).unwrap();
        lengths.push(step.message().len());
        let reply = verifier.step_verifier(step.into_message(), &mut OsRng).unwrap();
        lengths.push(reply.message().len());
        if reply.is_finished() {
            return lengths;
        }
        message = reply.into_message();
    }
}

#[test]
fn simple_zk_message_lengths() {
    // 2x4 over G1: compressed points are 48 bytes, scalars 32
    let (A, w, t) = linear_instance::<G1Projective>(2, 4, &mut OsRng);
    let mut prover = simple_zk::ProverContext::begin(&A, &w).unwrap();
    let mut verifier = simple_zk::VerifierContext::begin(&A, &t).unwrap();
    assert_eq!(
        transcript_lengths(&mut prover, &mut verifier),
        vec![2 * 48, 32, 4 * 48, 32, 4 * 48, 32, 32, 0]
    );
}

#[test]
fn copy_message_lengths() {
    // extended witness of 13 positions, 2 commitments, 2 constraints, 3 keys
    let instance = product_instance::<RistrettoPoint>(&mut OsRng);
    let mut prover = instance.prover().unwrap();
    let mut verifier = instance.verifier().unwrap();
    assert_eq!(
        transcript_lengths(&mut prover, &mut verifier),
        vec![32 + 32, 7 * 32, 3 * 32, 32, (13 + 2) * 32, 0]
    );
}

#[test]
fn repeated_runs_use_fresh_randomness() {
    let instance = product_instance::<RistrettoPoint>(&mut OsRng);
    let first = |instance: &qesa_proofs::test_utils::CopyInstance<RistrettoPoint>| {
        let mut prover = instance.prover().unwrap();
        prover.step_prover(Message::empty(), &mut OsRng).unwrap().into_message()
    };
    // same binding, different blinding of the witness commitment
    let a = first(&instance);
    let b = first(&instance);
    assert_eq!(a.as_bytes()[..32], b.as_bytes()[..32]);
    assert_ne!(a.as_bytes()[32..], b.as_bytes()[32..]);
}
