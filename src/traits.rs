//! Randomness helpers shared by every argument.
//!
//! Provers sample masking vectors and verifiers sample challenges; both go
//! through the [`Prng`] extension trait so that the sampling code reads the same
//! everywhere.

use alloc::vec::Vec;

use group::Group;

/// Extension trait for random number generators that sample scalars of a group.
///
/// Implemented for every [`rand_core::RngCore`] in [`crate::prng`].
pub trait Prng {
    /// Samples a fixed-size array of uniformly random scalars.
    fn random_scalars<G: Group, const N: usize>(&mut self) -> [G::Scalar; N];

    /// Samples `n` uniformly random scalars.
    fn random_scalars_vec<G: Group>(&mut self, n: usize) -> Vec<G::Scalar>;

    /// Samples a single uniformly random scalar.
    fn random_scalar<G: Group>(&mut self) -> G::Scalar {
        let [x] = self.random_scalars::<G, 1>();
        x
    }
}
