//! # qesa-proofs
//!
//! This crate implements interactive arguments of knowledge in the discrete-log
//! setting, over any prime-order group implementing `group::prime::PrimeGroup`:
//!
//! - [`lmpa::simple_zk`]: zero-knowledge preimage of a linear map `A·w = t`
//!   (built on [`lmpa::no_zk`]).
//! - [`qesa::copy`]: a witness satisfies a set of quadratic equations
//!   `wᵀΓ_i w = 0` and shares values with Pedersen-style commitments produced
//!   elsewhere (built on [`qesa::inner`]).
//!
//! Prover and verifier are explicit state machines exchanging
//! [`Message`]s, see [`protocol`]. The arguments are interactive and
//! honest-verifier zero-knowledge: no Fiat-Shamir transform is applied.
//!
//! ```ignore
//! let mut prover = simple_zk::ProverContext::begin(&a, &w)?;
//! let mut verifier = simple_zk::VerifierContext::begin(&a, &t)?;
//! assert!(execute(&mut prover, &mut verifier, &mut OsRng)?);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![allow(non_snake_case)]
#![deny(unused_variables)]
#![deny(unused_mut)]

extern crate alloc;

pub mod buffer;
pub mod crs;
pub mod errors;
pub mod group;
pub mod lmpa;
pub mod matrix;
pub mod protocol;
pub mod qesa;
pub mod traits;

mod prng;


#[doc(hidden)]
pub mod test_utils;

pub use crate::buffer::{Message, MessageReader, MessageWriter};
pub use crate::crs::Crs;
pub use crate::errors::{Error, InvalidInstance};
pub use crate::group::msm::MultiScalarMul;
pub use crate::matrix::{Matrix, SparseMatrix};
pub use crate::protocol::{execute, InteractiveProver, InteractiveVerifier, Step};
pub use crate::qesa::copy::Opening;
pub use crate::qesa::mapping::{
    commit, compute_mapping, get_commitment_crs, CommitmentCrs, Mapping,
};
pub use crate::traits::Prng;
