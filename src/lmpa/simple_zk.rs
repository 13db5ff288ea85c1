//! Zero-knowledge linear map preimage argument.
//!
//! Proves knowledge of `w` with `A·w = t` without revealing `w`. The prover
//! first commits to a masking vector by sending `a = A·r`. The verifier then
//! picks a challenge `β`. From there the no-ZK argument runs on the masked
//! witness `z = r + β·w`, whose image is `a + β·t`. `z` is uniformly
//! distributed, so revealing it through the no-ZK rounds leaks nothing about `w`.
//!
//! The contexts own the [`no_zk`] contexts they delegate to; the no-ZK messages
//! travel unchanged once the masking round is over.

use alloc::vec::Vec;

use group::prime::PrimeGroup;
use rand_core::{CryptoRng, RngCore};
use tracing::{debug, instrument};

use crate::buffer::{Message, MessageReader, MessageWriter};
use crate::errors::{Error, InvalidInstance};
use crate::lmpa::no_zk;
use crate::matrix::Matrix;
use crate::protocol::{InteractiveProver, InteractiveVerifier, Step};
use crate::traits::Prng;

#[derive(Clone, Debug)]
enum ProverState<G: PrimeGroup> {
    Commit,
    AwaitingChallenge,
    Delegating(no_zk::ProverContext<G>),
    Finished,
}

impl<G: PrimeGroup> ProverState<G> {
    fn name(&self) -> &'static str {
        match self {
            Self::Commit => "Commit",
            Self::AwaitingChallenge => "AwaitingChallenge",
            Self::Delegating(_) => "Delegating",
            Self::Finished => "Finished",
        }
    }
}

/// Prover side of the zero-knowledge linear map argument.
#[derive(Clone, Debug)]
pub struct ProverContext<G: PrimeGroup> {
    matrix: Matrix<G>,
    witness: Vec<G::Scalar>,
    /// Masking vector, sampled in the first round.
    r: Vec<G::Scalar>,
    /// `A·r`, the first prover message.
    a: Vec<G>,
    state: ProverState<G>,
}

impl<G: PrimeGroup> ProverContext<G> {
    /// # Errors
    /// - [`Error::InvalidInstance`] if `witness.len() != matrix.cols()`.
    #[instrument(skip_all, fields(rows = matrix.rows(), cols = matrix.cols()))]
    pub fn begin(matrix: &Matrix<G>, witness: &[G::Scalar]) -> Result<Self, Error> {
        if witness.len() != matrix.cols() {
            return Err(InvalidInstance::new("witness length must equal the number of matrix columns").into());
        }
        Ok(Self {
            matrix: matrix.clone(),
            witness: witness.to_vec(),
            r: Vec::new(),
            a: Vec::new(),
            state: ProverState::Commit,
        })
    }

    fn delegate(
        &mut self,
        mut inner: no_zk::ProverContext<G>,
        incoming: Message,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Step, Error> {
        let step = match inner.step_prover(incoming, rng) {
            Ok(step) => step,
            Err(e) => {
                self.state = ProverState::Delegating(inner);
                return Err(e);
            }
        };
        self.state = if step.is_finished() {
            ProverState::Finished
        } else {
            ProverState::Delegating(inner)
        };
        Ok(step)
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
                if !incoming.is_empty() {
                    self.state = ProverState::Commit;
                    return Err(Error::UnexpectedMessage { state: "Commit" });
                }
                self.r = rng.random_scalars_vec::<G>(self.matrix.cols());
                self.a = self.matrix.mul_vec(&self.r);

                let mut out = MessageWriter::new();
                out.elements(&self.a);
                self.state = ProverState::AwaitingChallenge;
                Ok(Step::Continue(out.finish()))
            }
            ProverState::AwaitingChallenge => {
                let mut reader = MessageReader::new(&incoming);
                let challenge = reader.scalar::<G::Scalar>().and_then(|beta| {
                    reader.finish()?;
                    Ok(beta)
                });
                let beta = match challenge {
                    Ok(beta) => beta,
                    Err(e) => {
                        self.state = ProverState::AwaitingChallenge;
                        return Err(e);
                    }
                };

                let masked: Vec<G::Scalar> = self
                    .r
                    .iter()
                    .zip(&self.witness)
                    .map(|(r, w)| *r + beta * w)
                    .collect();
                let inner = no_zk::ProverContext::begin(&self.matrix, &masked)?;
                self.delegate(inner, Message::empty(), rng)
            }
            ProverState::Delegating(inner) => self.delegate(inner, incoming, rng),
            ProverState::Finished => Err(Error::ProtocolFinished),
        }
    }
}

#[derive(Clone, Debug)]
enum VerifierState<G: PrimeGroup> {
    AwaitingCommitment,
    Delegating(no_zk::VerifierContext<G>),
    Finished { accepted: bool },
}

impl<G: PrimeGroup> VerifierState<G> {
    fn name(&self) -> &'static str {
        match self {
            Self::AwaitingCommitment => "AwaitingCommitment",
            Self::Delegating(_) => "Delegating",
            Self::Finished { .. } => "Finished",
        }
    }
}

/// Verifier side of the zero-knowledge linear map argument.
#[derive(Clone, Debug)]
pub struct VerifierContext<G: PrimeGroup> {
    matrix: Matrix<G>,
    image: Vec<G>,
    state: VerifierState<G>,
}

impl<G: PrimeGroup> VerifierContext<G> {
    /// # Errors
    /// - [`Error::InvalidInstance`] if `image.len() != matrix.rows()`.
    #[instrument(skip_all, fields(rows = matrix.rows(), cols = matrix.cols()))]
    pub fn begin(matrix: &Matrix<G>, image: &[G]) -> Result<Self, Error> {
        if image.len() != matrix.rows() {
            return Err(InvalidInstance::new("image length must equal the number of matrix rows").into());
        }
        Ok(Self {
            matrix: matrix.clone(),
            image: image.to_vec(),
            state: VerifierState::AwaitingCommitment,
        })
    }

    fn delegate(
        &mut self,
        mut inner: no_zk::VerifierContext<G>,
        incoming: Message,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Step, Error> {
        let step = match inner.step_verifier(incoming, rng) {
            Ok(step) => step,
            Err(e) => {
                self.state = VerifierState::Delegating(inner);
                return Err(e);
            }
        };
        self.state = if step.is_finished() {
            VerifierState::Finished {
                accepted: inner.result()?,
            }
        } else {
            VerifierState::Delegating(inner)
        };
        Ok(step)
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
                let a = match reader
                    .elements::<G>(self.matrix.rows())
                    .and_then(|a| reader.finish().map(|_| a))
                {
                    Ok(a) => a,
                    Err(_) => {
                        debug!("rejecting undecodable masking commitment");
                        return Ok(Step::Finished(Message::empty()));
                    }
                };

                let beta = rng.random_scalar::<G>();
                let shifted: Vec<G> = a
                    .iter()
                    .zip(&self.image)
                    .map(|(a, t)| *a + *t * beta)
                    .collect();
                let inner = no_zk::VerifierContext::begin(&self.matrix, &shifted)?;
                self.state = VerifierState::Delegating(inner);

                let mut out = MessageWriter::new();
                out.scalar(&beta);
                Ok(Step::Continue(out.finish()))
            }
            VerifierState::Delegating(inner) => self.delegate(inner, incoming, rng),
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
