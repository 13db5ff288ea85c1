//! Public constraint matrices.
//!
//! - [`Matrix`]: a dense matrix of group elements, the statement of the linear
//!   map arguments (`A·w = t`).
//! - [`SparseMatrix`]: a sparse matrix of scalars, one quadratic constraint
//!   `wᵀΓw = 0` of the quadratic arguments. Evaluation cost is linear in the
//!   number of non-zero entries.

use alloc::vec::Vec;

use ff::Field;
use group::prime::PrimeGroup;

use crate::errors::{Error, InvalidInstance};
use crate::group::msm::MultiScalarMul;

/// A dense `rows × cols` matrix of group elements, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Matrix<G> {
    rows: usize,
    cols: usize,
    entries: Vec<G>,
}

impl<G: PrimeGroup> Matrix<G> {
    /// Creates a matrix from its row-major entries.
    ///
    /// # Errors
    /// - [`Error::InvalidInstance`] if a dimension is zero or `entries.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, entries: Vec<G>) -> Result<Self, Error> {
        if rows == 0 || cols == 0 {
            return Err(InvalidInstance::new("matrix dimensions must be non-zero").into());
        }
        if entries.len() != rows * cols {
            return Err(InvalidInstance::new("matrix entry count does not match its dimensions").into());
        }
        Ok(Self {
            rows,
            cols,
            entries,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    fn row(&self, r: usize) -> &[G] {
        &self.entries[r * self.cols..(r + 1) * self.cols]
    }

    pub fn column(&self, c: usize) -> Vec<G> {
        (0..self.rows).map(|r| self.entries[r * self.cols + c]).collect()
    }

    /// Computes `A·w`.
    ///
    /// # Panics
    /// Panics if `w.len() != self.cols()`.
    pub fn mul_vec(&self, w: &[G::Scalar]) -> Vec<G> {
        assert_eq!(w.len(), self.cols, "mul_vec: witness length mismatch");
        (0..self.rows).map(|r| G::msm(w, self.row(r))).collect()
    }

    /// Pads with identity columns up to `cols`. Does nothing if already that wide.
    pub(crate) fn pad_columns(&mut self, cols: usize) {
        if cols <= self.cols {
            return;
        }
        let mut entries = Vec::with_capacity(self.rows * cols);
        for r in 0..self.rows {
            entries.extend_from_slice(self.row(r));
            entries.extend(core::iter::repeat(G::identity()).take(cols - self.cols));
        }
        self.entries = entries;
        self.cols = cols;
    }

    /// Computes `(A_L·w_R, A_R·w_L)` for the halves of an even-width matrix.
    pub(crate) fn cross_terms(&self, w: &[G::Scalar]) -> (Vec<G>, Vec<G>) {
        let half = self.cols / 2;
        let (w_left, w_right) = w.split_at(half);
        let mut minus = Vec::with_capacity(self.rows);
        let mut plus = Vec::with_capacity(self.rows);
        for r in 0..self.rows {
            let (a_left, a_right) = self.row(r).split_at(half);
            minus.push(G::msm(w_right, a_left));
            plus.push(G::msm(w_left, a_right));
        }
        (minus, plus)
    }

    /// Folds the column halves `(A_L | A_R)` into `x·A_L + A_R`.
    pub(crate) fn fold(&self, x: &G::Scalar) -> Self {
        let half = self.cols / 2;
        let mut entries = Vec::with_capacity(self.rows * half);
        for r in 0..self.rows {
            let (a_left, a_right) = self.row(r).split_at(half);
            entries.extend(a_left.iter().zip(a_right).map(|(l, r)| *l * x + r));
        }
        Self {
            rows: self.rows,
            cols: half,
            entries,
        }
    }
}

/// A sparse matrix stored as `(row, col, value)` triples.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SparseMatrix<F> {
    num_rows: usize,
    num_cols: usize,
    entries: Vec<(usize, usize, F)>,
}

impl<F: Field> SparseMatrix<F> {
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            entries: Vec::new(),
        }
    }

    /// Creates a square matrix from its non-zero entries.
    ///
    /// # Panics
    /// Panics if an entry lies outside `dim × dim`.
    pub fn from_entries(dim: usize, entries: impl IntoIterator<Item = (usize, usize, F)>) -> Self {
        let mut m = Self::new(dim, dim);
        for (row, col, value) in entries {
            m.add_entry(row, col, value);
        }
        m
    }

    /// Add an entry (row, col, value). Entries at the same position add up.
    ///
    /// # Panics
    /// Panics if the position is out of bounds.
    pub fn add_entry(&mut self, row: usize, col: usize, value: F) {
        assert!(row < self.num_rows, "row out of bounds");
        assert!(col < self.num_cols, "col out of bounds");
        self.entries.push((row, col, value));
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn entries(&self) -> &[(usize, usize, F)] {
        &self.entries
    }

    /// Every row and column index that carries an entry.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().flat_map(|&(r, c, _)| [r, c])
    }

    /// The largest row or column index that carries an entry.
    pub fn max_index(&self) -> Option<usize> {
        self.indices().max()
    }

    /// Computes `aᵀ·Γ·b`.
    ///
    /// # Panics
    /// Panics if `a` is shorter than the row count or `b` than the column count.
    pub fn bilinear(&self, a: &[F], b: &[F]) -> F {
        assert!(a.len() >= self.num_rows, "bilinear: left vector too short");
        assert!(b.len() >= self.num_cols, "bilinear: right vector too short");
        self.entries
            .iter()
            .fold(F::ZERO, |acc, &(r, c, v)| acc + a[r] * v * b[c])
    }

    /// Computes `wᵀ·Γ·w`.
    pub fn quadratic_form(&self, w: &[F]) -> F {
        self.bilinear(w, w)
    }

    /// Computes the linear combination `Σ coeff_i · Γ_i`.
    ///
    /// The result is as large as the largest input.
    pub fn combine<'a>(terms: impl IntoIterator<Item = (F, &'a SparseMatrix<F>)>) -> Self
    where
        F: 'a,
    {
        let mut out = Self::new(0, 0);
        for (coeff, m) in terms {
            out.num_rows = out.num_rows.max(m.num_rows);
            out.num_cols = out.num_cols.max(m.num_cols);
            out.entries
                .extend(m.entries.iter().map(|&(r, c, v)| (r, c, coeff * v)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bls12_381::{G1Projective as G, Scalar};
    use group::Group;

    fn s(x: u64) -> Scalar {
        Scalar::from(x)
    }

    #[test]
    fn test_mul_vec() {
        let g = G::generator();
        // [g  2g]
        // [3g 0 ]
        let a = Matrix::new(2, 2, vec![g, g * s(2), g * s(3), G::identity()]).unwrap();
        let t = a.mul_vec(&[s(5), s(7)]);
        assert_eq!(t, vec![g * s(19), g * s(15)]);
    }

    #[test]
    fn test_bad_dimensions() {
        assert!(Matrix::<G>::new(0, 1, vec![]).is_err());
        assert!(Matrix::new(1, 2, vec![G::generator()]).is_err());
    }

    #[test]
    fn folding_preserves_the_image() {
        let mut rng = rand::thread_rng();
        let a = Matrix::new(2, 4, (0..8).map(|_| G::random(&mut rng)).collect()).unwrap();
        let w = [s(1), s(2), s(3), s(4)];
        let t = a.mul_vec(&w);
        let (minus, plus) = a.cross_terms(&w);

        let x = s(11);
        let folded = a.fold(&x);
        let w_folded = [w[0] + x * w[2], w[1] + x * w[3]];
        let expected: Vec<G> = (0..2)
            .map(|i| plus[i] + t[i] * x + minus[i] * (x * x))
            .collect();
        assert_eq!(folded.mul_vec(&w_folded), expected);
    }

    #[test]
    fn padding_adds_identity_columns() {
        let mut a = Matrix::new(1, 3, vec![G::generator(); 3]).unwrap();
        a.pad_columns(4);
        assert_eq!(a.cols(), 4);
        assert_eq!(a.column(3), vec![G::identity()]);
        assert_eq!(a.mul_vec(&[s(1), s(1), s(1), s(9)]), vec![G::generator() * s(3)]);
    }

    #[test]
    fn test_quadratic_form() {
        // w0 * w1 - w2 = 0 for w = (1, x, x)
        let m = SparseMatrix::from_entries(3, [(0, 1, s(1)), (0, 2, -s(1))]);
        assert_eq!(m.quadratic_form(&[s(1), s(4), s(4)]), Scalar::ZERO);
        assert_eq!(m.quadratic_form(&[s(1), s(4), s(5)]), -s(1));
    }

    #[test]
    fn test_combine() {
        let a = SparseMatrix::from_entries(2, [(0, 0, s(1))]);
        let b = SparseMatrix::from_entries(3, [(1, 2, s(1))]);
        let c = SparseMatrix::combine([(s(2), &a), (s(3), &b)]);
        assert_eq!(c.num_rows(), 3);
        assert_eq!(c.max_index(), Some(2));
        let w = [s(5), s(6), s(7)];
        assert_eq!(c.quadratic_form(&w), s(2) * s(25) + s(3) * s(42));
    }

    #[test]
    #[should_panic(expected = "col out of bounds")]
    fn test_entry_out_of_bounds() {
        SparseMatrix::<Scalar>::new(2, 2).add_entry(0, 2, Scalar::ONE);
    }
}
