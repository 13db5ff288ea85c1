//! # Error: Error Types for Interactive Arguments.
//!
//! This module defines the [`Error`] enum, which enumerates the ways the argument
//! engine can be misused or fed unusable input.
//!
//! A proof that is *rejected* is not an error: the verifier simply reports
//! `Ok(false)` from [`InteractiveVerifier::result`](crate::protocol::InteractiveVerifier::result).
//! Every variant below signals a contract violation by the caller, so callers can
//! always tell "proof rejected" apart from "engine misused".

use alloc::string::String;

/// Represents an invalid instance error.
///
/// Raised by the `begin` constructors and the commitment helpers when dimensions
/// or indices do not fit together.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid instance: {message}")]
pub struct InvalidInstance {
    /// The error message describing what's invalid about the instance.
    pub message: String,
}

impl InvalidInstance {
    /// Create a new InvalidInstance error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Represents an error encountered while setting up or driving an argument.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Public inputs, witness or openings have inconsistent shapes.
    #[error(transparent)]
    InvalidInstance(#[from] InvalidInstance),
    /// A generator index does not exist in the CRS.
    #[error("Generator index {index} is out of range for a CRS of {size} generators.")]
    GeneratorOutOfRange {
        /// The offending index.
        index: u32,
        /// Number of generators in the CRS.
        size: usize,
    },
    /// The partner's message could not be decoded.
    #[error("Malformed protocol message.")]
    MalformedMessage,
    /// A message arrived that does not fit the current round.
    #[error("Unexpected message in state {state}.")]
    UnexpectedMessage {
        /// Name of the state the context was in.
        state: &'static str,
    },
    /// A step function was called on a context that already terminated.
    #[error("The protocol has already finished.")]
    ProtocolFinished,
    /// The verification result was requested before the verifier finished.
    #[error("The verifier has not finished yet.")]
    ResultUnavailable,
    /// Prover and verifier disagree about the number of rounds.
    #[error("Prover finished while the verifier expects more rounds.")]
    ProtocolOutOfSync,
}
