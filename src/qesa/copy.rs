//! Quadratic equations over a witness that shares values with external commitments.
//!
//! The prover knows a witness `w` (with `w[0] = 1`) and openings `(v_j, r_j)`
//! of commitments `C_j = commit(crs, crs_j, v_j, r_j)` that other parties hold.
//! It shows that the *extended witness* (`w` followed by every `v_j` at the
//! positions the [`Mapping`] assigns) satisfies `w_extᵀ Γ_i w_ext = 0` for
//! every constraint `Γ_i`, and that the `v_j` it used are the committed ones.
//!
//! ```text
//! P → V   binding = SHA3-256(mapping digest ‖ C_0 ‖ … ‖ C_{M-1})
//!         C_w     = <g, w_int> + ρ·h
//! V → P   δ_j (per commitment), α_i (per constraint), β_k (per generator key)
//! P ↔ V   inner argument on D = C_w + Σ δ_j·C_j and the batched Γ
//! ```
//!
//! `w_int` is the extended witness with zeros at the key positions. Adding
//! `Σ δ_j·C_j` to `C_w` puts `Σ δ_{c(m)}·v_{c(m)}[pos(m)]` at every key `k`,
//! and the copy constraint for `k` (weighted by `β_k`) checks that this
//! combination equals the same combination over the block positions of the
//! extended witness. The user constraints (weighted by `α_i`) never touch a
//! key position.

use alloc::vec::Vec;

use ff::Field;
use group::prime::PrimeGroup;
use rand_core::{CryptoRng, RngCore};
use sha3::{Digest, Sha3_256};
use subtle::ConstantTimeEq;
use tracing::{debug, instrument, warn};

use crate::buffer::{Message, MessageReader, MessageWriter};
use crate::crs::Crs;
use crate::errors::{Error, InvalidInstance};
use crate::group::msm::MultiScalarMul;
use crate::group::serialization::serialize_elements;
use crate::matrix::SparseMatrix;
use crate::protocol::{InteractiveProver, InteractiveVerifier, Step};
use crate::qesa::inner;
use crate::qesa::mapping::{commit, Mapping};
use crate::traits::Prng;

const BINDING_DOMAIN: &[u8] = b"qesa-proofs/copy-binding/v1";

/// Opening of one commitment: the committed message and its blinding.
pub type Opening<F> = (Vec<F>, F);

/// Binds the mapping to the ordered list of commitments the proof is about.
fn commitment_binding<G: PrimeGroup>(mapping: &Mapping, commitments: &[G]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(BINDING_DOMAIN);
    hasher.update(mapping.digest());
    hasher.update(serialize_elements(commitments));
    hasher.finalize().into()
}

fn as_index(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

/// Checks that the constraints and the mapping fit the CRS and returns the
/// length of the extended witness.
///
/// Constraints may only reference the witness and the message blocks, that is
/// positions below `mapping.last_index()` that are not generator keys. The
/// extended witness additionally covers every key position.
fn check_instance<G: PrimeGroup>(
    crs: &Crs<G>,
    matrices: &[SparseMatrix<G::Scalar>],
    mapping: &Mapping,
) -> Result<usize, Error> {
    let size = crs.len();
    let keys = mapping.unique_key_indices();
    if let Some(&key) = keys.iter().find(|&&key| key as usize >= size) {
        return Err(Error::GeneratorOutOfRange { index: key, size });
    }
    let last_index = mapping.last_index() as usize;
    if last_index > size {
        return Err(InvalidInstance::new("the mapping does not fit the CRS").into());
    }

    for matrix in matrices {
        if let Some(index) = matrix.max_index() {
            if index >= size {
                return Err(Error::GeneratorOutOfRange {
                    index: as_index(index),
                    size,
                });
            }
            if index >= last_index {
                return Err(InvalidInstance::new(alloc::format!(
                    "constraint entry at position {index} lies past the mapped positions [0, {last_index})"
                ))
                .into());
            }
        }
        if let Some(index) = matrix.indices().find(|&index| keys.contains(&as_index(index))) {
            return Err(InvalidInstance::new(alloc::format!(
                "constraint entry at position {index} touches a commitment key"
            ))
            .into());
        }
        if matrix.num_rows() > last_index || matrix.num_cols() > last_index {
            return Err(InvalidInstance::new("constraint matrix is larger than the mapped positions").into());
        }
    }

    let key_end = keys.last().map_or(0, |&key| key as usize + 1);
    Ok(last_index.max(key_end))
}

/// Folds the user constraints and one copy constraint per key into a single matrix.
///
/// The copy constraint of key `k` is row 0 with `+1` at column `k` and
/// `-δ_{c(m)}` at the block position of every message `m` committed under `k`.
/// As `w[0] = 1`, it evaluates to `w[k] - Σ δ_{c(m)}·w[position(m)]`.
fn batched_constraint<F: Field>(
    dim: usize,
    matrices: &[SparseMatrix<F>],
    mapping: &Mapping,
    delta: &[F],
    alpha: &[F],
    beta: &[F],
) -> SparseMatrix<F> {
    let mut copy = SparseMatrix::new(dim, dim);
    for ((&key, messages), beta) in mapping.messages_for_key().iter().zip(beta) {
        copy.add_entry(0, key as usize, *beta);
        for message in messages {
            let position = mapping.key_position_for_message()[message] as usize;
            let commitment = mapping.commitment_for_message()[message] as usize;
            copy.add_entry(0, position, -(*beta * delta[commitment]));
        }
    }
    SparseMatrix::combine(core::iter::once((F::ONE, &copy)).chain(alpha.iter().copied().zip(matrices)))
}

#[derive(Clone, Debug)]
enum ProverState<G: PrimeGroup> {
    Commit,
    AwaitingChallenges,
    Inner(inner::ProverContext<G>),
    Finished,
}

impl<G: PrimeGroup> ProverState<G> {
    fn name(&self) -> &'static str {
        match self {
            Self::Commit => "Commit",
            Self::AwaitingChallenges => "AwaitingChallenges",
            Self::Inner(_) => "Inner",
            Self::Finished => "Finished",
        }
    }
}

/// Prover side of the copy argument.
#[derive(Clone, Debug)]
pub struct ProverContext<G: PrimeGroup> {
    crs: Crs<G>,
    matrices: Vec<SparseMatrix<G::Scalar>>,
    mapping: Mapping,
    /// Extended witness with zeros at the key positions.
    extended: Vec<G::Scalar>,
    openings: Vec<Opening<G::Scalar>>,
    /// Blinding of `C_w`, sampled in the first round.
    blinding: G::Scalar,
    state: ProverState<G>,
}

impl<G: PrimeGroup> ProverContext<G> {
    /// Starts a proof for `witness` and the openings of the commitments, in mapping order.
    ///
    /// Whether the witness satisfies the constraints is not checked; an
    /// unsatisfying witness produces a proof that gets rejected.
    ///
    /// # Errors
    /// - [`Error::InvalidInstance`] if `witness.len()` differs from
    ///   `mapping.witness_size()`, `witness[0] != 1`, the openings disagree with
    ///   the mapping, or a constraint touches a key position.
    /// - [`Error::GeneratorOutOfRange`] if a constraint or the mapping exceeds the CRS.
    #[instrument(skip_all, fields(
        witness = witness.len(),
        constraints = matrices.len(),
        commitments = openings.len(),
    ))]
    pub fn begin(
        crs: &Crs<G>,
        matrices: &[SparseMatrix<G::Scalar>],
        mapping: &Mapping,
        witness: &[G::Scalar],
        openings: &[Opening<G::Scalar>],
    ) -> Result<Self, Error> {
        if witness.len() != mapping.witness_size() as usize {
            return Err(InvalidInstance::new("witness length differs from the mapping's witness size").into());
        }
        if witness[0] != G::Scalar::ONE {
            return Err(InvalidInstance::new("witness[0] must be 1").into());
        }
        if openings.len() != mapping.num_commitments() {
            return Err(InvalidInstance::new("one opening per mapped commitment is required").into());
        }
        for (j, (message, _)) in openings.iter().enumerate() {
            if mapping.commitment_crs(j).map(|crs_com| crs_com.len()) != Some(message.len()) {
                return Err(InvalidInstance::new(alloc::format!(
                    "opening {j} does not match its commitment configuration"
                ))
                .into());
            }
        }
        let dim = check_instance(crs, matrices, mapping)?;

        let mut extended = witness.to_vec();
        extended.resize(dim, G::Scalar::ZERO);
        for (_, position, commitment, offset) in mapping.slots() {
            extended[position] = openings[commitment].0[offset];
        }

        Ok(Self {
            crs: crs.clone(),
            matrices: matrices.to_vec(),
            mapping: mapping.clone(),
            extended,
            openings: openings.to_vec(),
            blinding: G::Scalar::ZERO,
            state: ProverState::Commit,
        })
    }

    fn delegate(
        &mut self,
        mut inner: inner::ProverContext<G>,
        incoming: Message,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Step, Error> {
        let step = match inner.step_prover(incoming, rng) {
            Ok(step) => step,
            Err(e) => {
                self.state = ProverState::Inner(inner);
                return Err(e);
            }
        };
        self.state = if step.is_finished() {
            ProverState::Finished
        } else {
            ProverState::Inner(inner)
        };
        Ok(step)
    }

    fn commit_round(&mut self, rng: &mut (impl RngCore + CryptoRng)) -> Result<Step, Error> {
        let commitments = self
            .openings
            .iter()
            .enumerate()
            .map(|(j, (message, blinding))| {
                let crs_com = self
                    .mapping
                    .commitment_crs(j)
                    .ok_or_else(|| InvalidInstance::new("commitment missing from the mapping"))?;
                commit(&self.crs, crs_com, message, blinding)
            })
            .collect::<Result<Vec<G>, Error>>()?;

        self.blinding = rng.random_scalar::<G>();
        let generators = &self.crs.generators()[..self.extended.len()];
        let witness_commitment = G::msm(&self.extended, generators) + *self.crs.blinding() * self.blinding;

        let mut out = MessageWriter::new();
        out.bytes(&commitment_binding(&self.mapping, &commitments))
            .element(&witness_commitment);
        Ok(Step::Continue(out.finish()))
    }

    /// Opening of `C_w + Σ δ_j·C_j`: the extended witness with the δ-combined
    /// messages at the key positions.
    fn folded_opening(&self, delta: &[G::Scalar]) -> (Vec<G::Scalar>, G::Scalar) {
        let mut witness = self.extended.clone();
        for (&key, messages) in self.mapping.messages_for_key() {
            witness[key as usize] = messages
                .iter()
                .map(|message| {
                    let commitment = self.mapping.commitment_for_message()[message] as usize;
                    let offset = self.mapping.msg_id_to_msg_position()[message] as usize;
                    delta[commitment] * self.openings[commitment].0[offset]
                })
                .sum();
        }
        let blinding = self.blinding
            + delta
                .iter()
                .zip(&self.openings)
                .map(|(d, (_, r))| *d * r)
                .sum::<G::Scalar>();
        (witness, blinding)
    }

    fn challenge_round(&self, incoming: &Message) -> Result<inner::ProverContext<G>, Error> {
        let mut reader = MessageReader::new(incoming);
        let delta: Vec<G::Scalar> = reader.scalars(self.mapping.num_commitments())?;
        let alpha: Vec<G::Scalar> = reader.scalars(self.matrices.len())?;
        let beta: Vec<G::Scalar> = reader.scalars(self.mapping.unique_key_indices().len())?;
        reader.finish()?;

        let (witness, blinding) = self.folded_opening(&delta);
        let gamma = batched_constraint(witness.len(), &self.matrices, &self.mapping, &delta, &alpha, &beta);
        inner::ProverContext::begin(&self.crs, &gamma, &witness, &blinding)
    }
}

impl<G: PrimeGroup> InteractiveProver for ProverContext<G> {
    #[instrument(skip_all, fields(state = self.state.name()))]
    fn step_prover(
        &mut self,
        incoming: Message,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Step, Error> {
        match core::mem::replace(&mut self.state, ProverState::Finished) {
            ProverState::Commit => {
                self.state = ProverState::Commit;
                if !incoming.is_empty() {
                    return Err(Error::UnexpectedMessage { state: "Commit" });
                }
                let step = self.commit_round(rng)?;
                self.state = ProverState::AwaitingChallenges;
                Ok(step)
            }
            ProverState::AwaitingChallenges => {
                self.state = ProverState::AwaitingChallenges;
                let inner = self.challenge_round(&incoming)?;
                self.delegate(inner, Message::empty(), rng)
            }
            ProverState::Inner(inner) => self.delegate(inner, incoming, rng),
            ProverState::Finished => Err(Error::ProtocolFinished),
        }
    }
}

#[derive(Clone, Debug)]
enum VerifierState<G: PrimeGroup> {
    AwaitingCommitment,
    Inner(inner::VerifierContext<G>),
    Finished { accepted: bool },
}

impl<G: PrimeGroup> VerifierState<G> {
    fn name(&self) -> &'static str {
        match self {
            Self::AwaitingCommitment => "AwaitingCommitment",
            Self::Inner(_) => "Inner",
            Self::Finished { .. } => "Finished",
        }
    }
}

/// Verifier side of the copy argument.
#[derive(Clone, Debug)]
pub struct VerifierContext<G: PrimeGroup> {
    crs: Crs<G>,
    matrices: Vec<SparseMatrix<G::Scalar>>,
    mapping: Mapping,
    commitments: Vec<G>,
    dim: usize,
    state: VerifierState<G>,
}

impl<G: PrimeGroup> VerifierContext<G> {
    /// Starts verifying against `commitments`, listed in the order the mapping was computed for.
    ///
    /// # Errors
    /// - [`Error::InvalidInstance`] if the commitment count differs from the
    ///   mapping, or a constraint touches a key position.
    /// - [`Error::GeneratorOutOfRange`] if a constraint or the mapping exceeds the CRS.
    #[instrument(skip_all, fields(constraints = matrices.len(), commitments = commitments.len()))]
    pub fn begin(
        crs: &Crs<G>,
        matrices: &[SparseMatrix<G::Scalar>],
        mapping: &Mapping,
        commitments: &[G],
    ) -> Result<Self, Error> {
        if commitments.len() != mapping.num_commitments() {
            return Err(InvalidInstance::new("one commitment per mapped configuration is required").into());
        }
        let dim = check_instance(crs, matrices, mapping)?;
        Ok(Self {
            crs: crs.clone(),
            matrices: matrices.to_vec(),
            mapping: mapping.clone(),
            commitments: commitments.to_vec(),
            dim,
            state: VerifierState::AwaitingCommitment,
        })
    }

    fn delegate(
        &mut self,
        mut inner: inner::VerifierContext<G>,
        incoming: Message,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Step, Error> {
        let step = match inner.step_verifier(incoming, rng) {
            Ok(step) => step,
            Err(e) => {
                self.state = VerifierState::Inner(inner);
                return Err(e);
            }
        };
        self.state = if step.is_finished() {
            VerifierState::Finished {
                accepted: inner.result()?,
            }
        } else {
            VerifierState::Inner(inner)
        };
        Ok(step)
    }

    fn reject(&mut self) -> Result<Step, Error> {
        self.state = VerifierState::Finished { accepted: false };
        Ok(Step::Finished(Message::empty()))
    }
}

impl<G: PrimeGroup> InteractiveVerifier for VerifierContext<G> {
    #[instrument(skip_all, fields(state = self.state.name()))]
    fn step_verifier(
        &mut self,
        incoming: Message,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Step, Error> {
        match core::mem::replace(&mut self.state, VerifierState::Finished { accepted: false }) {
            VerifierState::AwaitingCommitment => {
                let mut reader = MessageReader::new(&incoming);
                let decoded = reader.digest::<32>().and_then(|binding| {
                    let witness_commitment: G = reader.element()?;
                    reader.finish()?;
                    Ok((binding, witness_commitment))
                });
                let Ok((binding, witness_commitment)) = decoded else {
                    debug!("rejecting undecodable witness commitment");
                    return self.reject();
                };

                let expected = commitment_binding(&self.mapping, &self.commitments);
                if !bool::from(binding[..].ct_eq(&expected[..])) {
                    warn!("prover's commitments differ from the verifier's, rejecting");
                    return self.reject();
                }

                let delta = rng.random_scalars_vec::<G>(self.mapping.num_commitments());
                let alpha = rng.random_scalars_vec::<G>(self.matrices.len());
                let beta = rng.random_scalars_vec::<G>(self.mapping.unique_key_indices().len());

                let combined = witness_commitment + G::msm(&delta, &self.commitments);
                let gamma = batched_constraint(self.dim, &self.matrices, &self.mapping, &delta, &alpha, &beta);
                let inner = inner::VerifierContext::begin(&self.crs, &gamma, &combined)?;
                self.state = VerifierState::Inner(inner);

                let mut out = MessageWriter::new();
                out.scalars(&delta).scalars(&alpha).scalars(&beta);
                Ok(Step::Continue(out.finish()))
            }
            VerifierState::Inner(inner) => self.delegate(inner, incoming, rng),
            finished @ VerifierState::Finished { .. } => {
                self.state = finished;
                Err(Error::ProtocolFinished)
            }
        }
    }

    fn result(&self) -> Result<bool, Error> {
        match self.state {
            VerifierState::Finished { accepted } => Ok(accepted),
            _ => Err(Error::ResultUnavailable),
        }
    }
}
