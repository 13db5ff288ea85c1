//! Quadratic equation satisfiability, single-constraint core.
//!
//! Proves knowledge of an opening `(w, ρ)` of `D = <g, w> + ρ·h` such that
//! `w[0] = 1` and `wᵀΓw = 0` for one (already batched) sparse matrix `Γ`.
//!
//! ```text
//! P → V   S  = <g, s> + σ·h           s[0] = 0
//!         T₁ = t₁·u + τ₁·h            t₁ = wᵀΓs + sᵀΓw
//!         T₂ = t₂·u + τ₂·h            t₂ = sᵀΓs
//! V → P   x
//! P → V   z = w + x·s,  ζ = ρ + x·σ,  τ = x·τ₁ + x²·τ₂
//! ```
//!
//! The verifier accepts iff `z[0] = 1`, `<g, z> + ζ·h = D + x·S` and
//! `(zᵀΓz)·u + τ·h = x·T₁ + x²·T₂`. Since `zᵀΓz = wᵀΓw + x·t₁ + x²·t₂`, the
//! last check can only hold for a random `x` if `wᵀΓw = 0`.
//!
//! The witness length is the dimension of `Γ`, which must be square.

use alloc::vec::Vec;

use ff::Field;
use group::prime::PrimeGroup;
use rand_core::{CryptoRng, RngCore};
use tracing::{debug, instrument};

use crate::buffer::{Message, MessageReader, MessageWriter};
use crate::crs::Crs;
use crate::errors::{Error, InvalidInstance};
use crate::group::msm::MultiScalarMul;
use crate::matrix::SparseMatrix;
use crate::protocol::{InteractiveProver, InteractiveVerifier, Step};
use crate::traits::Prng;

fn check_dimensions<G: PrimeGroup>(crs: &Crs<G>, gamma: &SparseMatrix<G::Scalar>) -> Result<usize, Error> {
    let dim = gamma.num_rows();
    if dim != gamma.num_cols() {
        return Err(InvalidInstance::new("the constraint matrix must be square").into());
    }
    if dim == 0 {
        return Err(InvalidInstance::new("the constraint matrix must cover position 0").into());
    }
    if dim > crs.len() {
        return Err(InvalidInstance::new("the constraint matrix is larger than the CRS").into());
    }
    Ok(dim)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ProverState {
    Commit,
    AwaitingChallenge,
    Finished,
}

/// Prover side of the single-constraint quadratic argument.
#[derive(Clone, Debug)]
pub struct ProverContext<G: PrimeGroup> {
    crs: Crs<G>,
    gamma: SparseMatrix<G::Scalar>,
    witness: Vec<G::Scalar>,
    blinding: G::Scalar,
    s: Vec<G::Scalar>,
    sigma: G::Scalar,
    tau1: G::Scalar,
    tau2: G::Scalar,
    state: ProverState,
}

impl<G: PrimeGroup> ProverContext<G> {
    /// Starts a proof for the opening `(witness, blinding)`.
    ///
    /// The commitment is not an input: the prover never needs it, and it is
    /// the caller's job to publish `<g, witness> + blinding·h`. Whether the
    /// witness satisfies `Γ` is not checked here; an unsatisfying witness just
    /// produces a proof that gets rejected.
    ///
    /// # Errors
    /// - [`Error::InvalidInstance`] if `Γ` is not square, does not fit the CRS,
    ///   or its dimension differs from `witness.len()`, or if `witness[0] != 1`.
    #[instrument(skip_all, fields(dim = gamma.num_rows(), entries = gamma.entries().len()))]
    pub fn begin(
        crs: &Crs<G>,
        gamma: &SparseMatrix<G::Scalar>,
        witness: &[G::Scalar],
        blinding: &G::Scalar,
    ) -> Result<Self, Error> {
        let dim = check_dimensions(crs, gamma)?;
        if witness.len() != dim {
            return Err(InvalidInstance::new("witness length must equal the constraint dimension").into());
        }
        if witness[0] != G::Scalar::ONE {
            return Err(InvalidInstance::new("witness[0] must be 1").into());
        }
        Ok(Self {
            crs: crs.clone(),
            gamma: gamma.clone(),
            witness: witness.to_vec(),
            blinding: *blinding,
            s: Vec::new(),
            sigma: G::Scalar::ZERO,
            tau1: G::Scalar::ZERO,
            tau2: G::Scalar::ZERO,
            state: ProverState::Commit,
        })
    }
}

impl<G: PrimeGroup> InteractiveProver for ProverContext<G> {
    #[instrument(skip_all, fields(state = ?self.state))]
    fn step_prover(
        &mut self,
        incoming: Message,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Step, Error> {
        match self.state {
            ProverState::Commit => {
                if !incoming.is_empty() {
                    return Err(Error::UnexpectedMessage { state: "Commit" });
                }
                let dim = self.witness.len();
                let mut s = rng.random_scalars_vec::<G>(dim);
                s[0] = G::Scalar::ZERO;
                let [sigma, tau1, tau2] = rng.random_scalars::<G, 3>();

                let t1 = self.gamma.bilinear(&self.witness, &s) + self.gamma.bilinear(&s, &self.witness);
                let t2 = self.gamma.quadratic_form(&s);
                let h = *self.crs.blinding();
                let u = *self.crs.value();
                let big_s = G::msm(&s, &self.crs.generators()[..dim]) + h * sigma;
                let big_t1 = u * t1 + h * tau1;
                let big_t2 = u * t2 + h * tau2;

                self.s = s;
                self.sigma = sigma;
                self.tau1 = tau1;
                self.tau2 = tau2;

                let mut out = MessageWriter::new();
                out.element(&big_s).element(&big_t1).element(&big_t2);
                self.state = ProverState::AwaitingChallenge;
                Ok(Step::Continue(out.finish()))
            }
            ProverState::AwaitingChallenge => {
                let mut reader = MessageReader::new(&incoming);
                let x: G::Scalar = reader.scalar()?;
                reader.finish()?;

                let z: Vec<G::Scalar> = self
                    .witness
                    .iter()
                    .zip(&self.s)
                    .map(|(w, s)| *w + x * s)
                    .collect();
                let zeta = self.blinding + x * self.sigma;
                let tau = x * self.tau1 + x.square() * self.tau2;

                let mut out = MessageWriter::new();
                out.scalars(&z).scalar(&zeta).scalar(&tau);
                self.state = ProverState::Finished;
                Ok(Step::Finished(out.finish()))
            }
            ProverState::Finished => Err(Error::ProtocolFinished),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum VerifierState<G: PrimeGroup> {
    AwaitingCommitment,
    AwaitingResponse {
        x: G::Scalar,
        big_s: G,
        big_t1: G,
        big_t2: G,
    },
    Finished {
        accepted: bool,
    },
}

impl<G: PrimeGroup> VerifierState<G> {
    fn name(&self) -> &'static str {
        match self {
            Self::AwaitingCommitment => "AwaitingCommitment",
            Self::AwaitingResponse { .. } => "AwaitingResponse",
            Self::Finished { .. } => "Finished",
        }
    }
}

/// Verifier side of the single-constraint quadratic argument.
#[derive(Clone, Debug)]
pub struct VerifierContext<G: PrimeGroup> {
    crs: Crs<G>,
    gamma: SparseMatrix<G::Scalar>,
    commitment: G,
    state: VerifierState<G>,
}

impl<G: PrimeGroup> VerifierContext<G> {
    /// # Errors
    /// - [`Error::InvalidInstance`] if `Γ` is not square or does not fit the CRS.
    #[instrument(skip_all, fields(dim = gamma.num_rows(), entries = gamma.entries().len()))]
    pub fn begin(crs: &Crs<G>, gamma: &SparseMatrix<G::Scalar>, commitment: &G) -> Result<Self, Error> {
        check_dimensions(crs, gamma)?;
        Ok(Self {
            crs: crs.clone(),
            gamma: gamma.clone(),
            commitment: *commitment,
            state: VerifierState::AwaitingCommitment,
        })
    }

    fn process(
        &mut self,
        incoming: &Message,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Step, Error> {
        let mut reader = MessageReader::new(incoming);
        match self.state {
            VerifierState::AwaitingCommitment => {
                let big_s: G = reader.element()?;
                let big_t1: G = reader.element()?;
                let big_t2: G = reader.element()?;
                reader.finish()?;

                let x = rng.random_scalar::<G>();
                self.state = VerifierState::AwaitingResponse {
                    x,
                    big_s,
                    big_t1,
                    big_t2,
                };
                let mut out = MessageWriter::new();
                out.scalar(&x);
                Ok(Step::Continue(out.finish()))
            }
            VerifierState::AwaitingResponse {
                x,
                big_s,
                big_t1,
                big_t2,
            } => {
                let dim = self.gamma.num_rows();
                let z: Vec<G::Scalar> = reader.scalars(dim)?;
                let zeta: G::Scalar = reader.scalar()?;
                let tau: G::Scalar = reader.scalar()?;
                reader.finish()?;

                let h = *self.crs.blinding();
                let constant_ok = z[0] == G::Scalar::ONE;
                let opening_ok =
                    G::msm(&z, &self.crs.generators()[..dim]) + h * zeta == self.commitment + big_s * x;
                let quadratic_ok = *self.crs.value() * self.gamma.quadratic_form(&z) + h * tau
                    == big_t1 * x + big_t2 * x.square();
                if !constant_ok {
                    debug!("constant position of the response is not 1");
                }
                if !opening_ok {
                    debug!("response does not open the masked commitment");
                }
                if !quadratic_ok {
                    debug!("quadratic check failed");
                }

                self.state = VerifierState::Finished {
                    accepted: constant_ok && opening_ok && quadratic_ok,
                };
                Ok(Step::Finished(Message::empty()))
            }
            VerifierState::Finished { .. } => Err(Error::ProtocolFinished),
        }
    }
}

impl<G: PrimeGroup> InteractiveVerifier for VerifierContext<G> {
    #[instrument(skip_all, fields(state = self.state.name()))]
    fn step_verifier(
        &mut self,
        incoming: Message,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Step, Error> {
        match self.process(&incoming, rng) {
            Err(Error::MalformedMessage) => {
                debug!("rejecting undecodable prover message");
                self.state = VerifierState::Finished { accepted: false };
                Ok(Step::Finished(Message::empty()))
            }
            other => other,
        }
    }

    fn result(&self) -> Result<bool, Error> {
        match self.state {
            VerifierState::Finished { accepted } => Ok(accepted),
            _ => Err(Error::ResultUnavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::execute;
    use curve25519_dalek::{RistrettoPoint as G, Scalar};
    use rand::rngs::OsRng;

    // w = (1, a, b, a·b) with the single constraint w1·w2 - w0·w3 = 0
    fn instance(a: u64, b: u64, c: u64) -> (Crs<G>, SparseMatrix<Scalar>, Vec<Scalar>, Scalar, G) {
        let crs = Crs::random(4, &mut OsRng);
        let gamma = SparseMatrix::from_entries(4, [(1, 2, Scalar::ONE), (0, 3, -Scalar::ONE)]);
        let w = vec![Scalar::ONE, Scalar::from(a), Scalar::from(b), Scalar::from(c)];
        let rho = OsRng.random_scalar::<G>();
        let d = G::msm(&w, crs.generators()) + *crs.blinding() * rho;
        (crs, gamma, w, rho, d)
    }

    #[test]
    fn accepts_a_satisfying_opening() {
        let (crs, gamma, w, rho, d) = instance(6, 7, 42);
        let mut prover = ProverContext::begin(&crs, &gamma, &w, &rho).unwrap();
        let mut verifier = VerifierContext::begin(&crs, &gamma, &d).unwrap();
        assert!(execute(&mut prover, &mut verifier, &mut OsRng).unwrap());
    }

    #[test]
    fn rejects_an_unsatisfying_opening() {
        let (crs, gamma, w, rho, d) = instance(6, 7, 41);
        let mut prover = ProverContext::begin(&crs, &gamma, &w, &rho).unwrap();
        let mut verifier = VerifierContext::begin(&crs, &gamma, &d).unwrap();
        assert!(!execute(&mut prover, &mut verifier, &mut OsRng).unwrap());
    }

    #[test]
    fn rejects_a_foreign_commitment() {
        let (crs, gamma, w, rho, d) = instance(2, 3, 6);
        let mut prover = ProverContext::begin(&crs, &gamma, &w, &rho).unwrap();
        let other = d + *crs.blinding();
        let mut verifier = VerifierContext::begin(&crs, &gamma, &other).unwrap();
        assert!(!execute(&mut prover, &mut verifier, &mut OsRng).unwrap());
    }

    #[test]
    fn witness_must_start_with_one() {
        let (crs, gamma, mut w, rho, _) = instance(2, 3, 6);
        w[0] = Scalar::from(2u64);
        assert!(matches!(
            ProverContext::begin(&crs, &gamma, &w, &rho),
            Err(Error::InvalidInstance(_))
        ));
        assert!(ProverContext::begin(&crs, &gamma, &w[..3], &rho).is_err());
    }

    #[test]
    fn two_rounds_each() {
        let (crs, gamma, w, rho, d) = instance(2, 3, 6);
        let mut prover = ProverContext::begin(&crs, &gamma, &w, &rho).unwrap();
        let mut verifier = VerifierContext::begin(&crs, &gamma, &d).unwrap();

        let first = prover.step_prover(Message::empty(), &mut OsRng).unwrap();
        assert_eq!(first.message().len(), 3 * 32);
        let x = verifier.step_verifier(first.into_message(), &mut OsRng).unwrap();
        assert_eq!(verifier.result(), Err(Error::ResultUnavailable));
        let last = prover.step_prover(x.into_message(), &mut OsRng).unwrap();
        assert!(last.is_finished());
        assert_eq!(last.message().len(), (4 + 2) * 32);
        assert!(verifier.step_verifier(last.into_message(), &mut OsRng).unwrap().is_finished());
        assert_eq!(verifier.result(), Ok(true));
        assert_eq!(
            prover.step_prover(Message::empty(), &mut OsRng),
            Err(Error::ProtocolFinished)
        );
    }
}
