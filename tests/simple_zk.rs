#![allow(non_snake_case)]

use bls12_381::G1Projective;
use curve25519_dalek::RistrettoPoint;
use ff::Field;
use group::prime::PrimeGroup;
use group::Group;
use rand::rngs::OsRng;
use rand::{rngs::StdRng, SeedableRng};

use qesa_proofs::lmpa::simple_zk::{ProverContext, VerifierContext};
use qesa_proofs::test_utils::linear_instance;
use qesa_proofs::{
    execute, Error, InteractiveProver, InteractiveVerifier, Matrix, Message, MessageWriter,
};

fn completeness<G: PrimeGroup>() {
    for (rows, cols) in [(1, 1), (1, 4), (3, 5), (4, 16), (2, 33)] {
        let (A, w, t) = linear_instance::<G>(rows, cols, &mut OsRng);
        let mut prover = ProverContext::begin(&A, &w).unwrap();
        let mut verifier = VerifierContext::begin(&A, &t).unwrap();
        assert!(
            execute(&mut prover, &mut verifier, &mut OsRng).unwrap(),
            "{rows}x{cols} instance rejected"
        );
    }
}

fn soundness<G: PrimeGroup>() {
    // fresh instance and challenges on every run
    for run in 0..8 {
        let (A, w, mut t) = linear_instance::<G>(3, 6, &mut OsRng);
        t[run % 3] += G::generator();
        let mut prover = ProverContext::begin(&A, &w).unwrap();
        let mut verifier = VerifierContext::begin(&A, &t).unwrap();
        assert!(
            !execute(&mut prover, &mut verifier, &mut OsRng).unwrap(),
            "run {run}: wrong image accepted"
        );
    }
}

#[test]
fn completeness_bls12_381() {
    completeness::<G1Projective>();
}

#[test]
fn completeness_ristretto() {
    completeness::<RistrettoPoint>();
}

#[test]
fn soundness_bls12_381() {
    soundness::<G1Projective>();
}

#[test]
fn soundness_ristretto() {
    soundness::<RistrettoPoint>();
}

#[test]
fn single_generator_with_unit_witness() {
    type G = RistrettoPoint;
    let g = G::random(&mut OsRng);
    let A = Matrix::new(1, 1, vec![g]).unwrap();
    let w = [<G as Group>::Scalar::ONE];

    let mut prover = ProverContext::begin(&A, &w).unwrap();
    let mut verifier = VerifierContext::begin(&A, &[g]).unwrap();
    assert!(execute(&mut prover, &mut verifier, &mut OsRng).unwrap());
}

#[test]
fn wrong_witness_is_rejected() {
    type G = G1Projective;
    let (A, mut w, t) = linear_instance::<G>(2, 4, &mut OsRng);
    w[0] += <G as Group>::Scalar::ONE;
    let mut prover = ProverContext::begin(&A, &w).unwrap();
    let mut verifier = VerifierContext::begin(&A, &t).unwrap();
    assert!(!execute(&mut prover, &mut verifier, &mut OsRng).unwrap());
}

#[test]
fn dimension_mismatches() {
    type G = G1Projective;
    let (A, w, t) = linear_instance::<G>(2, 3, &mut OsRng);
    assert!(matches!(
        ProverContext::begin(&A, &w[..2]),
        Err(Error::InvalidInstance(_))
    ));
    assert!(matches!(
        VerifierContext::begin(&A, &t[..1]),
        Err(Error::InvalidInstance(_))
    ));
}

#[test]
fn round_structure() {
    // 1x8: masking round, then three folds and the final scalar
    type G = G1Projective;
    let (A, w, t) = linear_instance::<G>(1, 8, &mut OsRng);
    let mut prover = ProverContext::begin(&A, &w).unwrap();
    let mut verifier = VerifierContext::begin(&A, &t).unwrap();

    let mut message = Message::empty();
    let mut prover_steps = 0;
    let mut verifier_steps = 0;
    loop {
        let step = prover.step_prover(message, &mut OsRng).unwrap();
        prover_steps += 1;
        let reply = verifier.step_verifier(step.into_message(), &mut OsRng).unwrap();
        verifier_steps += 1;
        if reply.is_finished() {
            assert!(reply.message().is_empty());
            break;
        }
        assert_eq!(verifier.result(), Err(Error::ResultUnavailable));
        message = reply.into_message();
    }
    assert_eq!((prover_steps, verifier_steps), (5, 5));
    assert_eq!(verifier.result(), Ok(true));
    assert_eq!(
        prover.step_prover(Message::empty(), &mut OsRng),
        Err(Error::ProtocolFinished)
    );
    assert_eq!(
        verifier.step_verifier(Message::empty(), &mut OsRng),
        Err(Error::ProtocolFinished)
    );
}

#[test]
fn prover_protocol_violations() {
    type G = G1Projective;
    let (A, w, _) = linear_instance::<G>(1, 2, &mut OsRng);
    let mut prover = ProverContext::begin(&A, &w).unwrap();
    assert_eq!(
        prover.step_prover(Message::from(vec![0u8]), &mut OsRng),
        Err(Error::UnexpectedMessage { state: "Commit" })
    );

    prover.step_prover(Message::empty(), &mut OsRng).unwrap();
    // a truncated challenge leaves the prover waiting for a proper one
    assert_eq!(
        prover.step_prover(Message::from(vec![1u8; 5]), &mut OsRng),
        Err(Error::MalformedMessage)
    );
    let mut challenge = MessageWriter::new();
    challenge.scalar(&<G as Group>::Scalar::ONE);
    assert!(prover.step_prover(challenge.finish(), &mut OsRng).is_ok());
}

#[test]
fn undecodable_commitment_is_a_rejection() {
    type G = RistrettoPoint;
    let (A, _, t) = linear_instance::<G>(2, 2, &mut OsRng);
    let mut verifier = VerifierContext::begin(&A, &t).unwrap();
    let step = verifier
        .step_verifier(Message::from(vec![0xff; 64]), &mut OsRng)
        .unwrap();
    assert!(step.is_finished());
    assert_eq!(verifier.result(), Ok(false));
}

#[test]
fn seeded_runs_are_reproducible() {
    type G = G1Projective;
    let (A, w, t) = linear_instance::<G>(2, 4, &mut OsRng);
    let transcript = |seed: u64| {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut prover = ProverContext::begin(&A, &w).unwrap();
        let mut verifier = VerifierContext::begin(&A, &t).unwrap();
        let mut messages = Vec::new();
        let mut message = Message::empty();
        loop {
            let step = prover.step_prover(message, &mut rng).unwrap();
            messages.push(step.message().clone());
            let reply = verifier.step_verifier(step.into_message(), &mut rng).unwrap();
            if reply.is_finished() {
                break;
            }
            messages.push(reply.message().clone());
            message = reply.into_message();
        }
        messages
    };
    assert_eq!(transcript(7), transcript(7));
    assert_ne!(transcript(7), transcript(8));
}
