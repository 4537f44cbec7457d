//! # Stabilized singular value decomposition
//!
//! General-purpose SVD routines are not uniformly well behaved: some only support tall
//! matrices, some return singular values in no particular order, and some occasionally produce
//! garbage. [`StabilizedSVD`] wraps any [`SVDImplementation`] so that callers always receive a
//! [`Decomposition`] for the original orientation, with singular values sorted by descending
//! magnitude and, when requested, verified against its input.

use log::{debug, error, warn};
use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::error::MCAError;
use crate::utils::{all_finite, format_matrix, is_sorted_by_magnitude, magnitude_order};

#[cfg(feature = "faer")]
pub mod faer;
pub mod nalgebra;

#[cfg(feature = "faer")]
pub use self::faer::FaerSVD;
pub use self::nalgebra::NalgebraSVD;

/// A raw SVD routine.
///
/// Returns `(U, s, V^T)` with `U · diag(s) · V^T ≈ matrix`, where `epsilon` steers convergence.
/// Implementations need not order `s` and need not support matrices with more columns than rows.
pub trait SVDImplementation: Send + Sync {
    fn compute(
        &self,
        matrix: ArrayView2<f64>,
        epsilon: f64,
    ) -> anyhow::Result<(Array2<f64>, Array1<f64>, Array2<f64>)>;
}

/// `P · diag(s) · Q^T`, with the singular vectors stored column-wise in `p` and `q`.
#[derive(Debug, Clone)]
pub struct Decomposition {
    /// Left factor, one row per row of the input.
    pub p: Array2<f64>,
    /// Singular values, non-increasing in absolute value.
    pub s: Array1<f64>,
    /// Right factor, one row per column of the input.
    pub q: Array2<f64>,
}

impl Decomposition {
    pub fn reconstruct(&self) -> Array2<f64> {
        let scaled = &self.p * &self.s;
        scaled.dot(&self.q.t())
    }

    pub fn len(&self) -> usize {
        self.s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.s.is_empty()
    }
}

pub struct StabilizedSVD<S: SVDImplementation> {
    primitive: S,
    epsilon: f64,
    check_tolerance: f64,
}

impl<S: SVDImplementation> StabilizedSVD<S> {
    pub fn new(primitive: S) -> Self {
        StabilizedSVD {
            primitive,
            epsilon: 0.0,
            check_tolerance: 0.0,
        }
    }

    /// Convergence parameter forwarded to the primitive.
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Enables reconstruction checking when `tolerance > 0`.
    pub fn check_tolerance(mut self, tolerance: f64) -> Self {
        self.check_tolerance = tolerance;
        self
    }

    pub fn primitive(&self) -> &S {
        &self.primitive
    }

    pub fn decompose(&self, a: ArrayView2<f64>) -> anyhow::Result<Decomposition> {
        let decomposition = self.oriented(a)?;
        let decomposition = Self::sorted(decomposition);
        if self.check_tolerance > 0.0 {
            Self::verify(a, &decomposition, self.check_tolerance)?;
        }
        Ok(decomposition)
    }

    /// Calls the primitive on a matrix that is at least as tall as it is wide. A wide matrix is
    /// transposed first; from `A^T = U S V^T` follows `A = V S U^T`.
    fn oriented(&self, a: ArrayView2<f64>) -> anyhow::Result<Decomposition> {
        let (n_rows, n_cols) = a.dim();
        let (p, s, q) = if n_cols <= n_rows {
            let (u, s, vt) = self.primitive.compute(a, self.epsilon)?;
            (u, s, vt.reversed_axes())
        } else {
            debug!("Decomposing transpose of wide {} x {} matrix", n_rows, n_cols);
            let (u, s, vt) = self.primitive.compute(a.t(), self.epsilon)?;
            (vt.reversed_axes(), s, u)
        };

        if p.nrows() != n_rows || q.nrows() != n_cols || p.ncols() != s.len() || q.ncols() != s.len()
        {
            return Err(MCAError::DecompositionFailed(format!(
                "factor shapes {:?}, {}, {:?} do not fit a {} x {} matrix",
                p.dim(),
                s.len(),
                q.dim(),
                n_rows,
                n_cols
            ))
            .into());
        }

        Ok(Decomposition { p, s, q })
    }

    /// Orders singular values by descending magnitude, moving the singular vector columns of
    /// both factors with the same permutation.
    fn sorted(decomposition: Decomposition) -> Decomposition {
        let values = decomposition.s.to_vec();
        if is_sorted_by_magnitude(&values) {
            return decomposition;
        }

        warn!("SVD returned unsorted singular values, reordering");
        let perm = magnitude_order(&values);
        Decomposition {
            p: decomposition.p.select(Axis(1), &perm),
            s: perm.iter().map(|&i| values[i]).collect(),
            q: decomposition.q.select(Axis(1), &perm),
        }
    }

    fn verify(
        expected: ArrayView2<f64>,
        decomposition: &Decomposition,
        tolerance: f64,
    ) -> anyhow::Result<()> {
        for (factor, finite) in [
            ("P", all_finite(&decomposition.p)),
            ("s", all_finite(&decomposition.s)),
            ("Q", all_finite(&decomposition.q)),
        ] {
            if !finite {
                error!("SVD produced non-finite values in {}", factor);
                return Err(MCAError::NonFiniteDecomposition { factor }.into());
            }
        }

        let actual = decomposition.reconstruct();
        for ((row, col), &e) in expected.indexed_iter() {
            let a = actual[[row, col]];
            if (e - a).abs() > tolerance {
                let expected_fmt = format_matrix(expected, tolerance);
                let actual_fmt = format_matrix(actual.view(), tolerance);
                error!(
                    "Catastrophic failure in SVD subroutine.\nExpected Z=\n {}\nActual P*s*Q=\n {}",
                    expected_fmt, actual_fmt
                );
                return Err(MCAError::ReconstructionMismatch {
                    row,
                    col,
                    expected_value: e,
                    actual_value: a,
                    tolerance,
                    expected: expected_fmt,
                    actual: actual_fmt,
                }
                .into());
            }
        }

        Ok(())
    }
}
