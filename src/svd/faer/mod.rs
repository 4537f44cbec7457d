use faer_ext::*;
use ndarray::{Array1, Array2, ArrayView2};

use super::SVDImplementation;

/// Dense thin SVD from faer. faer picks its own convergence criterion, so `epsilon` is unused.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaerSVD;

impl SVDImplementation for FaerSVD {
    fn compute(
        &self,
        matrix: ArrayView2<f64>,
        _epsilon: f64,
    ) -> anyhow::Result<(Array2<f64>, Array1<f64>, Array2<f64>)> {
        let faer_mat = matrix.into_faer();
        let svd = faer_mat.thin_svd();
        let u = svd.u().into_ndarray().to_owned();
        let s: Array1<f64> = Array1::from_iter(svd.s_diagonal().iter().cloned());
        let vt = svd.v().into_ndarray().t().to_owned();

        Ok((u, s, vt))
    }
}
