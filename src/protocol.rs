//! The step-driven argument contract.
//!
//! Every argument in this crate, base primitives included, is a pair of state
//! machines driven from the outside:
//!
//! 1. Both sides are constructed with `begin`, the prover with its secret inputs.
//! 2. The caller alternates [`InteractiveProver::step_prover`] and
//!    [`InteractiveVerifier::step_verifier`], prover first, handing each side
//!    the message produced by the other. The prover's first incoming message is
//!    [`Message::empty`].
//! 3. Once the verifier returns [`Step::Finished`], [`InteractiveVerifier::result`]
//!    reports whether the proof was accepted.
//!
//! Transporting messages between the two parties is left to the caller;
//! [`execute`] runs both sides in-process.

use rand_core::{CryptoRng, RngCore};
use tracing::trace;

use crate::buffer::Message;
use crate::errors::Error;

/// Outcome of a single step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// More rounds follow; send the message to the partner.
    Continue(Message),
    /// This party has reached its terminal round.
    Finished(Message),
}

impl Step {
    pub fn is_finished(&self) -> bool {
        matches!(self, Step::Finished(_))
    }

    pub fn message(&self) -> &Message {
        match self {
            Step::Continue(m) | Step::Finished(m) => m,
        }
    }

    pub fn into_message(self) -> Message {
        match self {
            Step::Continue(m) | Step::Finished(m) => m,
        }
    }
}

/// The prover side of an interactive argument.
pub trait InteractiveProver {
    /// Consumes the verifier's last message and produces the next prover message.
    ///
    /// # Errors
    /// - [`Error::ProtocolFinished`] if called after the prover finished.
    /// - [`Error::UnexpectedMessage`] or [`Error::MalformedMessage`] if `incoming`
    ///   does not fit the current round.
    fn step_prover(
        &mut self,
        incoming: Message,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Step, Error>;
}

/// The verifier side of an interactive argument.
///
/// A prover message that cannot be decoded is a failed proof, not an error: the
/// verifier finishes and [`result`](InteractiveVerifier::result) returns `Ok(false)`.
pub trait InteractiveVerifier {
    /// Consumes the prover's last message and produces the next challenge.
    ///
    /// # Errors
    /// - [`Error::ProtocolFinished`] if called after the verifier finished.
    fn step_verifier(
        &mut self,
        incoming: Message,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Step, Error>;

    /// Whether every check accumulated during the rounds succeeded.
    ///
    /// # Errors
    /// - [`Error::ResultUnavailable`] before the verifier finished.
    fn result(&self) -> Result<bool, Error>;
}

/// Runs both sides of an argument to completion in-process.
///
/// Returns the verifier's decision.
///
/// # Errors
/// Propagates step errors, and returns [`Error::ProtocolOutOfSync`] if the
/// prover finishes while the verifier still expects a message.
pub fn execute<P, V>(
    prover: &mut P,
    verifier: &mut V,
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<bool, Error>
where
    P: InteractiveProver,
    V: InteractiveVerifier,
{
    let mut message = Message::empty();
    let mut round = 0usize;
    loop {
        let prover_step = prover.step_prover(message, &mut *rng)?;
        let prover_done = prover_step.is_finished();
        let verifier_step = verifier.step_verifier(prover_step.into_message(), &mut *rng)?;
        round += 1;
        trace!(round, "exchanged messages");
        if verifier_step.is_finished() {
            break;
        }
        if prover_done {
            return Err(Error::ProtocolOutOfSync);
        }
        message = verifier_step.into_message();
    }
    verifier.result()
}
