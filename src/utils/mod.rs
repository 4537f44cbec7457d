use ndarray::{ArrayBase, ArrayView2, Data, Dimension};
use num_traits::Float;

/// Marginal masses at or below this are treated as empty.
pub const MASS_EPSILON: f64 = 1e-6;

/// `1 / sqrt(x)`, or zero when `x` is below numerical noise.
pub fn inv_sqrt<T: Float>(x: T) -> T {
    if x > T::from(MASS_EPSILON).unwrap_or_else(T::epsilon) {
        T::one() / x.sqrt()
    } else {
        T::zero()
    }
}

/// True when the values are non-increasing in absolute value.
pub fn is_sorted_by_magnitude<T: Float>(values: &[T]) -> bool {
    values.windows(2).all(|w| w[0].abs() >= w[1].abs())
}

/// Stable permutation that orders `values` by descending absolute value.
pub fn magnitude_order<T: Float>(values: &[T]) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..values.len()).collect();
    perm.sort_by(|&a, &b| {
        values[b]
            .abs()
            .partial_cmp(&values[a].abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    perm
}

pub fn all_finite<S, D>(x: &ArrayBase<S, D>) -> bool
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    x.iter().all(|v| v.is_finite())
}

/// Renders a matrix with as many decimals as `tolerance` resolves.
pub fn format_matrix(m: ArrayView2<f64>, tolerance: f64) -> String {
    let precision = if tolerance > 0.0 {
        (-tolerance.log10().ceil()).max(0.0) as usize
    } else {
        6
    };
    let rows: Vec<String> = m
        .rows()
        .into_iter()
        .map(|row| {
            let cells: Vec<String> = row.iter().map(|x| format!("{:.*}", precision, x)).collect();
            format!("[{}]", cells.join(", "))
        })
        .collect();
    format!("[{}]", rows.join(",\n  "))
}
