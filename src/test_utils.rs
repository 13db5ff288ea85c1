//! Instances used in tests and benchmarks for this crate.

use alloc::vec;
use alloc::vec::Vec;

use ff::Field;
use group::prime::PrimeGroup;
use rand_core::{CryptoRng, RngCore};

use crate::crs::Crs;
use crate::errors::Error;
use crate::matrix::{Matrix, SparseMatrix};
use crate::qesa::copy::{self, Opening};
use crate::qesa::mapping::{commit, compute_mapping, get_commitment_crs, Mapping};
use crate::traits::Prng;

/// Random `rows × cols` linear map with a random preimage `w` and its image `t`.
pub fn linear_instance<G: PrimeGroup>(
    rows: usize,
    cols: usize,
    rng: &mut (impl RngCore + CryptoRng),
) -> (Matrix<G>, Vec<G::Scalar>, Vec<G>) {
    let entries = (0..rows * cols).map(|_| G::random(&mut *rng)).collect();
    let A = Matrix::new(rows, cols, entries).unwrap();
    let w = rng.random_scalars_vec::<G>(cols);
    let t = A.mul_vec(&w);
    (A, w, t)
}

/// Everything both parties of a copy argument need, prover secrets included.
#[derive(Clone, Debug)]
pub struct CopyInstance<G: PrimeGroup> {
    pub crs: Crs<G>,
    pub matrices: Vec<SparseMatrix<G::Scalar>>,
    pub mapping: Mapping,
    pub witness: Vec<G::Scalar>,
    pub openings: Vec<Opening<G::Scalar>>,
    pub commitments: Vec<G>,
}

impl<G: PrimeGroup> CopyInstance<G> {
    /// Commits to `messages` under the given generator selections and maps them
    /// next to `witness`.
    pub fn new(
        crs: Crs<G>,
        matrices: Vec<SparseMatrix<G::Scalar>>,
        witness: Vec<G::Scalar>,
        selections: &[&[u32]],
        messages: Vec<Vec<G::Scalar>>,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Self {
        let com_crs_set: Vec<_> = selections
            .iter()
            .map(|indices| get_commitment_crs(&crs, indices).unwrap())
            .collect();
        let mapping = compute_mapping(&crs, witness.len() as u32, &com_crs_set).unwrap();
        let openings: Vec<Opening<G::Scalar>> = messages
            .into_iter()
            .map(|message| (message, rng.random_scalar::<G>()))
            .collect();
        let commitments = com_crs_set
            .iter()
            .zip(&openings)
            .map(|(crs_com, (message, blinding))| commit(&crs, crs_com, message, blinding).unwrap())
            .collect();
        Self {
            crs,
            matrices,
            mapping,
            witness,
            openings,
            commitments,
        }
    }

    pub fn prover(&self) -> Result<copy::ProverContext<G>, Error> {
        copy::ProverContext::begin(
            &self.crs,
            &self.matrices,
            &self.mapping,
            &self.witness,
            &self.openings,
        )
    }

    pub fn verifier(&self) -> Result<copy::VerifierContext<G>, Error> {
        copy::VerifierContext::begin(&self.crs, &self.matrices, &self.mapping, &self.commitments)
    }
}

/// Committed `(a, b)` and `(c)` with `c = a·b`, and a witness `(1, p)` with `p = a + c`.
///
/// Generator selections `[10, 11]` and `[12]` over a CRS of 16 generators; the
/// messages land at extended positions 2, 3 and 4.
pub fn product_instance<G: PrimeGroup>(rng: &mut (impl RngCore + CryptoRng)) -> CopyInstance<G> {
    let one = G::Scalar::ONE;
    let [a, b] = rng.random_scalars::<G, 2>();
    let c = a * b;
    let p = a + c;

    // a·b - c = 0
    let product = SparseMatrix::from_entries(5, [(2, 3, one), (0, 4, -one)]);
    // a + c - p = 0
    let sum = SparseMatrix::from_entries(5, [(0, 2, one), (0, 4, one), (0, 1, -one)]);

    let crs = Crs::random(16, &mut *rng);
    CopyInstance::new(
        crs,
        vec![product, sum],
        vec![one, p],
        &[&[10, 11], &[12]],
        vec![vec![a, b], vec![c]],
        rng,
    )
}

/// Two commitments under the same selection `[4, 6]`, whose key positions sit
/// in the way of the first blocks, with the witness `(1, x, y)` where
/// `x = v0[0] + v1[1]` and `y = v0[1]·v1[0]`.
///
/// The messages land at extended positions 7, 8, 9 and 10.
pub fn shared_selection_instance<G: PrimeGroup>(rng: &mut (impl RngCore + CryptoRng)) -> CopyInstance<G> {
    let one = G::Scalar::ONE;
    let v0 = rng.random_scalars_vec::<G>(2);
    let v1 = rng.random_scalars_vec::<G>(2);
    let x = v0[0] + v1[1];
    let y = v0[1] * v1[0];

    let sum = SparseMatrix::from_entries(11, [(0, 7, one), (0, 10, one), (0, 1, -one)]);
    let product = SparseMatrix::from_entries(11, [(8, 9, one), (0, 2, -one)]);

    let crs = Crs::random(12, &mut *rng);
    CopyInstance::new(
        crs,
        vec![sum, product],
        vec![one, x, y],
        &[&[4, 6], &[4, 6]],
        vec![v0, v1],
        rng,
    )
}
