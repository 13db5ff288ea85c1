//! Linear map preimage argument without zero-knowledge.
//!
//! Proves knowledge of `w` with `A·w = t` by halving the witness every round:
//! the prover sends the cross terms `u₋ = A_L·w_R` and `u₊ = A_R·w_L`, the
//! verifier answers with a challenge `x`, and both sides fold
//!
//! ```text
//! A ← x·A_L + A_R        w ← w_L + x·w_R        t ← u₊ + x·t + x²·u₋
//! ```
//!
//! until a single column is left, at which point the prover reveals its last
//! scalar. The witness leaks, so this is only used on masked witnesses
//! (see [`simple_zk`](crate::lmpa::simple_zk)).

use alloc::vec::Vec;

use ff::Field;
use group::prime::PrimeGroup;
use rand_core::{CryptoRng, RngCore};
use tracing::{debug, instrument};

use crate::buffer::{Message, MessageReader, MessageWriter};
use crate::errors::{Error, InvalidInstance};
use crate::matrix::Matrix;
use crate::protocol::{InteractiveProver, InteractiveVerifier, Step};
use crate::traits::Prng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ProverState {
    Ready,
    AwaitingChallenge,
    Finished,
}

/// Prover side of the no-ZK linear map argument.
#[derive(Clone, Debug)]
pub struct ProverContext<G: PrimeGroup> {
    matrix: Matrix<G>,
    witness: Vec<G::Scalar>,
    state: ProverState,
}

impl<G: PrimeGroup> ProverContext<G> {
    /// # Errors
    /// - [`Error::InvalidInstance`] if `witness.len() != matrix.cols()`.
    #[instrument(skip_all, fields(rows = matrix.rows(), cols = matrix.cols()))]
    pub fn begin(matrix: &Matrix<G>, witness: &[G::Scalar]) -> Result<Self, Error> {
        if witness.len() != matrix.cols() {
            return Err(InvalidInstance::new("witness length must equal the number of matrix columns").into());
        }
        let width = matrix.cols().next_power_of_two();
        let mut matrix = matrix.clone();
        matrix.pad_columns(width);
        let mut witness = witness.to_vec();
        witness.resize(width, G::Scalar::ZERO);

        Ok(Self {
            matrix,
            witness,
            state: ProverState::Ready,
        })
    }

    fn round_message(&mut self) -> Step {
        let mut out = MessageWriter::new();
        if self.matrix.cols() == 1 {
            out.scalar(&self.witness[0]);
            self.state = ProverState::Finished;
            Step::Finished(out.finish())
        } else {
            let (minus, plus) = self.matrix.cross_terms(&self.witness);
            out.elements(&minus).elements(&plus);
            self.state = ProverState::AwaitingChallenge;
            Step::Continue(out.finish())
        }
    }
}

impl<G: PrimeGroup> InteractiveProver for ProverContext<G> {
    #[instrument(skip_all, fields(state = ?self.state, width = self.matrix.cols()))]
    fn step_prover(
        &mut self,
        incoming: Message,
        _rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Step, Error> {
        match self.state {
            ProverState::Ready => {
                if !incoming.is_empty() {
                    return Err(Error::UnexpectedMessage { state: "Ready" });
                }
                Ok(self.round_message())
            }
            ProverState::AwaitingChallenge => {
                let mut reader = MessageReader::new(&incoming);
                let x: G::Scalar = reader.scalar()?;
                reader.finish()?;

                let half = self.matrix.cols() / 2;
                let (left, right) = self.witness.split_at(half);
                self.witness = left.iter().zip(right).map(|(l, r)| *l + x * r).collect();
                self.matrix = self.matrix.fold(&x);
                Ok(self.round_message())
            }
            ProverState::Finished => Err(Error::ProtocolFinished),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VerifierState {
    AwaitingRound,
    Finished { accepted: bool },
}

/// Verifier side of the no-ZK linear map argument.
#[derive(Clone, Debug)]
pub struct VerifierContext<G: PrimeGroup> {
    matrix: Matrix<G>,
    image: Vec<G>,
    state: VerifierState,
}

impl<G: PrimeGroup> VerifierContext<G> {
    /// # Errors
    /// - [`Error::InvalidInstance`] if `image.len() != matrix.rows()`.
    #[instrument(skip_all, fields(rows = matrix.rows(), cols = matrix.cols()))]
    pub fn begin(matrix: &Matrix<G>, image: &[G]) -> Result<Self, Error> {
        if image.len() != matrix.rows() {
            return Err(InvalidInstance::new("image length must equal the number of matrix rows").into());
        }
        let mut matrix = matrix.clone();
        matrix.pad_columns(matrix.cols().next_power_of_two());

        Ok(Self {
            matrix,
            image: image.to_vec(),
            state: VerifierState::AwaitingRound,
        })
    }

    fn process(
        &mut self,
        incoming: &Message,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Step, Error> {
        let rows = self.matrix.rows();
        let mut reader = MessageReader::new(incoming);

        if self.matrix.cols() == 1 {
            let w: G::Scalar = reader.scalar()?;
            reader.finish()?;
            let accepted = self
                .matrix
                .column(0)
                .iter()
                .zip(&self.image)
                .all(|(a, t)| *a * w == *t);
            if !accepted {
                debug!("final linear check failed");
            }
            self.state = VerifierState::Finished { accepted };
            return Ok(Step::Finished(Message::empty()));
        }

        let minus = reader.elements::<G>(rows)?;
        let plus = reader.elements::<G>(rows)?;
        reader.finish()?;

        let x = rng.random_scalar::<G>();
        let x_sq = x.square();
        self.image = self
            .image
            .iter()
            .zip(minus.iter().zip(&plus))
            .map(|(t, (m, p))| *p + *t * x + *m * x_sq)
            .collect();
        self.matrix = self.matrix.fold(&x);

        let mut out = MessageWriter::new();
        out.scalar(&x);
        Ok(Step::Continue(out.finish()))
    }
}

impl<G: PrimeGroup> InteractiveVerifier for VerifierContext<G> {
    #[instrument(skip_all, fields(state = ?self.state, width = self.matrix.cols()))]
    fn step_verifier(
        &mut self,
        incoming: Message,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Step, Error> {
        match self.state {
            VerifierState::Finished { .. } => Err(Error::ProtocolFinished),
            VerifierState::AwaitingRound => match self.process(&incoming, rng) {
                Err(Error::MalformedMessage) => {
                    debug!("rejecting undecodable prover message");
                    self.state = VerifierState::Finished { accepted: false };
                    Ok(Step::Finished(Message::empty()))
                }
                other => other,
            },
        }
    }

    fn result(&self) -> Result<bool, Error> {
        match self.state {
            VerifierState::Finished { accepted } => Ok(accepted),
            _ => Err(Error::ResultUnavailable),
        }
    }
}
