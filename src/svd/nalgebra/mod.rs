use ::nalgebra::linalg::SVD;
use ::nalgebra::DMatrix;
use ndarray::{Array1, Array2, ArrayView2};
use nshare::{IntoNalgebra, IntoNdarray2};

use super::SVDImplementation;
use crate::error::MCAError;

/// Convergence threshold used when none is given.
///
/// At machine precision the QR sweeps on wide, rank-deficient residuals can stop on a wrong
/// factorization, so the default stays a few orders of magnitude above it.
pub const DEFAULT_EPSILON: f64 = 1e-10;

/// Dense SVD backed by nalgebra's bidiagonal QR iteration.
///
/// Uses the unordered variant, so singular values come back in whatever order the iteration
/// converged them. A non-positive `epsilon` selects [`DEFAULT_EPSILON`].
#[derive(Debug, Clone, Copy)]
pub struct NalgebraSVD {
    max_iterations: usize,
}

impl NalgebraSVD {
    pub fn new(max_iterations: usize) -> Self {
        NalgebraSVD { max_iterations }
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

impl Default for NalgebraSVD {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl SVDImplementation for NalgebraSVD {
    fn compute(
        &self,
        matrix: ArrayView2<f64>,
        epsilon: f64,
    ) -> anyhow::Result<(Array2<f64>, Array1<f64>, Array2<f64>)> {
        let (n_rows, n_cols) = matrix.dim();
        let m: DMatrix<f64> = matrix.into_nalgebra().clone_owned();
        let eps = if epsilon > 0.0 { epsilon } else { DEFAULT_EPSILON };

        let svd = SVD::try_new_unordered(m, true, true, eps, self.max_iterations).ok_or_else(|| {
            MCAError::DecompositionFailed(format!(
                "no convergence for {} x {} matrix within {} iterations (epsilon {})",
                n_rows, n_cols, self.max_iterations, eps
            ))
        })?;

        let u = svd
            .u
            .ok_or_else(|| MCAError::DecompositionFailed("left singular vectors missing".into()))?;
        let vt = svd
            .v_t
            .ok_or_else(|| MCAError::DecompositionFailed("right singular vectors missing".into()))?;

        Ok((
            u.into_ndarray2(),
            Array1::from(svd.singular_values.as_slice().to_vec()),
            vt.into_ndarray2(),
        ))
    }
}
