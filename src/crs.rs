//! The common reference string shared by the quadratic arguments.

use alloc::vec::Vec;

use group::prime::PrimeGroup;
use rand_core::RngCore;

use crate::errors::{Error, InvalidInstance};

/// Public generators from which every commitment and argument message is derived.
///
/// - `generators`: `g_0, …, g_{N-1}`, one per position of the (extended) witness.
/// - `blinding`: `h`, the dedicated blinding generator.
/// - `value`: `u`, used to commit to the cross terms of quadratic forms.
///
/// The generators must have unknown discrete-log relations to each other.
/// A CRS is immutable once built and may be shared by any number of sessions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Crs<G> {
    generators: Vec<G>,
    blinding: G,
    value: G,
}

impl<G: PrimeGroup> Crs<G> {
    /// # Errors
    /// - [`Error::InvalidInstance`] if `generators` is empty.
    pub fn new(generators: Vec<G>, blinding: G, value: G) -> Result<Self, Error> {
        if generators.is_empty() {
            return Err(InvalidInstance::new("a CRS needs at least one generator").into());
        }
        Ok(Self {
            generators,
            blinding,
            value,
        })
    }

    /// Samples a CRS of `size` generators uniformly at random.
    ///
    /// # Panics
    /// Panics if `size` is zero.
    pub fn random(size: usize, rng: &mut impl RngCore) -> Self {
        assert!(size > 0, "a CRS needs at least one generator");
        let generators = (0..size).map(|_| G::random(&mut *rng)).collect();
        Self {
            generators,
            blinding: G::random(&mut *rng),
            value: G::random(&mut *rng),
        }
    }

    /// Number of position generators `N`.
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    pub fn generators(&self) -> &[G] {
        &self.generators
    }

    pub fn blinding(&self) -> &G {
        &self.blinding
    }

    pub fn value(&self) -> &G {
        &self.value
    }
}
