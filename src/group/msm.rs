use alloc::vec;
use alloc::vec::Vec;
use ff::PrimeField;
use group::prime::PrimeGroup;

/// Window width for the bucket method, roughly `ln(n)`. Inherited from Zexe and libsnark.
#[inline]
const fn window_width(n: usize) -> usize {
    if n < 2 {
        return 1;
    }
    // log2(n) * ln(2), with a minimum of 1
    let w = (usize::BITS - (n - 1).leading_zeros()) as usize * 69 / 100;
    if w == 0 {
        1
    } else {
        w
    }
}

/// Multi-scalar multiplication `Σ scalars[i] · bases[i]`.
///
/// Every Pedersen-style commitment and every row of a group matrix product in
/// this crate goes through this trait.
pub trait MultiScalarMul: PrimeGroup {
    /// Computes the MSM of `scalars` against `bases`.
    ///
    /// # Panics
    /// Panics if `scalars.len() != bases.len()`.
    fn msm(scalars: &[Self::Scalar], bases: &[Self]) -> Self {
        assert_eq!(
            scalars.len(),
            bases.len(),
            "msm: scalar and base counts differ"
        );
        match scalars.len() {
            0 => Self::identity(),
            1..32 => msm_naive(bases, scalars),
            32.. => msm_buckets(bases, scalars),
        }
    }
}

impl<G: PrimeGroup> MultiScalarMul for G {}

fn msm_naive<G: PrimeGroup>(bases: &[G], scalars: &[G::Scalar]) -> G {
    core::iter::zip(bases, scalars).map(|(g, x)| *g * x).sum()
}

/// Reads `width` bits of a little-endian scalar representation starting at `start`.
fn window_bits(bytes: &[u8], start: usize, width: usize) -> usize {
    let end = (start + width).min(bytes.len() * 8);
    let mut bits = 0usize;
    for bit in start..end {
        let b = (bytes[bit / 8] >> (bit % 8)) & 1;
        bits |= (b as usize) << (bit - start);
    }
    bits
}

/// Pippenger's bucket method.
///
/// Assumes the scalar representation is little-endian, as it is for the
/// curves this crate is tested against.
fn msm_buckets<G: PrimeGroup>(bases: &[G], scalars: &[G::Scalar]) -> G {
    let c = window_width(scalars.len());
    let num_bits = <G::Scalar as PrimeField>::NUM_BITS as usize;
    let reprs: Vec<_> = scalars.iter().map(|s| s.to_repr()).collect();

    let mut total = G::identity();
    let windows: Vec<usize> = (0..num_bits).step_by(c).collect();
    for &start in windows.iter().rev() {
        for _ in 0..c {
            total = total.double();
        }

        // bucket i collects the bases whose window value is i + 1
        let mut buckets = vec![G::identity(); (1 << c) - 1];
        for (repr, base) in reprs.iter().zip(bases) {
            let idx = window_bits(repr.as_ref(), start, c);
            if idx != 0 {
                buckets[idx - 1] += base;
            }
        }

        let mut running = G::identity();
        let mut window_sum = G::identity();
        for bucket in buckets.iter().rev() {
            running += bucket;
            window_sum += running;
        }
        total += window_sum;
    }
    total
}
