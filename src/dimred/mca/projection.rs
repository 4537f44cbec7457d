//! Eigenvalue correction, rank trimming and projection into factor space.

use log::warn;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::categorical::CategoryValue;
use crate::indicator::VariableBlock;

/// A category's weight on one factor.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryWeight {
    pub category: CategoryValue,
    pub weight: f64,
}

/// The significant categories of one variable on one factor.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableWeights {
    pub variable: String,
    pub categories: Vec<CategoryWeight>,
}

impl VariableWeights {
    pub fn weight(&self, category: &CategoryValue) -> Option<f64> {
        self.categories
            .iter()
            .find(|c| &c.category == category)
            .map(|c| c.weight)
    }

    /// Sum of absolute category weights.
    pub fn magnitude(&self) -> f64 {
        self.categories.iter().map(|c| c.weight.abs()).sum()
    }
}

/// Sparse attribution of one factor to named categories, in schema order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComponentWeights {
    pub variables: Vec<VariableWeights>,
}

impl ComponentWeights {
    pub fn get(&self, variable: &str) -> Option<&VariableWeights> {
        self.variables.iter().find(|v| v.variable == variable)
    }

    /// Absolute weight carried by `variable`, zero if it was dropped.
    pub fn magnitude(&self, variable: &str) -> f64 {
        self.get(variable).map_or(0.0, VariableWeights::magnitude)
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Squared singular values, optionally with Benzécri's correction for `n_variables` variables.
pub(crate) fn eigenvalues(s: ArrayView1<f64>, n_variables: usize, benzecri: bool) -> Array1<f64> {
    if !benzecri {
        return s.mapv(|x| x * x);
    }

    let k = n_variables as f64;
    let floor = 1.0 / k;
    s.mapv(|x| {
        let lambda = x * x;
        if lambda < floor {
            0.0
        } else {
            (k / (k - 1.0) * (lambda - floor)).powi(2)
        }
    })
}

/// Number of leading eigenvalues to keep and the inertia they carry.
///
/// Retention stops at the first eigenvalue below `tolerance` or at the component cap, whichever
/// comes first. A zero rank falls back to every eigenvalue up to the cap.
pub(crate) fn retained_rank(
    eigenvalues: ArrayView1<f64>,
    tolerance: f64,
    n_components: Option<usize>,
) -> (usize, f64) {
    let cap = n_components.unwrap_or(usize::MAX);
    let mut rank = eigenvalues.len().min(cap);
    let mut inertia = 0.0;
    for (i, &e) in eigenvalues.iter().enumerate() {
        if e < tolerance || i >= cap {
            rank = i;
            break;
        }
        inertia += e;
    }

    if rank == 0 {
        rank = eigenvalues.len().min(cap);
        inertia = eigenvalues.iter().take(rank).sum();
    }

    (rank, inertia)
}

/// Greenacre's adjusted total inertia for `n_variables` variables over `n_categories` columns.
pub(crate) fn greenacre_inertia(s: ArrayView1<f64>, n_variables: usize, n_categories: usize) -> f64 {
    let k = n_variables as f64;
    let j = n_categories as f64;
    let fourth: f64 = s.iter().map(|x| x.powi(4)).sum();
    k / (k - 1.0) * (fourth - (j - k) / (k * k))
}

/// Picks the explained-variance denominator for the corrected eigenvalues.
///
/// Declared categories that no row uses still count towards Greenacre's category total, which
/// can push the adjusted inertia down to or below what the retained components carry. The
/// retained inertia is used whenever the adjusted value does not exceed it or `tolerance`.
pub(crate) fn corrected_inertia(adjusted: f64, retained: f64, tolerance: f64) -> f64 {
    if adjusted > retained && adjusted > tolerance {
        adjusted
    } else {
        warn!(
            "Greenacre inertia {:e} does not exceed retained inertia {:e}, using the latter",
            adjusted, retained
        );
        retained
    }
}

pub(crate) fn explained_variance(retained: ArrayView1<f64>, denominator: f64) -> Array1<f64> {
    if denominator > 0.0 {
        retained.mapv(|e| e / denominator)
    } else {
        Array1::zeros(retained.len())
    }
}

/// Per-component factor applied to the singular vectors.
pub(crate) fn scaling(retained: ArrayView1<f64>, benzecri: bool) -> Array1<f64> {
    if benzecri {
        retained.mapv(|e| -e.sqrt())
    } else {
        retained.to_owned()
    }
}

/// `F[i][j] = row_scale[i] * scaling[j] * P[i][j]` over the retained components.
pub(crate) fn row_factors(
    p: ArrayView2<f64>,
    row_scale: ArrayView1<f64>,
    scaling: ArrayView1<f64>,
) -> Array2<f64> {
    let rank = scaling.len();
    Array2::from_shape_fn((p.nrows(), rank), |(i, j)| row_scale[i] * scaling[j] * p[[i, j]])
}

/// `G[c][i] = col_inv_sqrt[c] * scaling[i] * Q[c][i]` over the retained components.
pub(crate) fn column_coordinates(
    q: ArrayView2<f64>,
    col_inv_sqrt: ArrayView1<f64>,
    scaling: ArrayView1<f64>,
) -> Array2<f64> {
    let rank = scaling.len();
    Array2::from_shape_fn((q.nrows(), rank), |(c, i)| {
        col_inv_sqrt[c] * scaling[i] * q[[c, i]]
    })
}

/// Splits each component's column coordinates back into variable blocks, keeping categories
/// whose weight exceeds `tolerance` and variables whose kept weights sum past it.
pub(crate) fn category_weights(
    coordinates: ArrayView2<f64>,
    blocks: &[VariableBlock],
    tolerance: f64,
) -> Vec<ComponentWeights> {
    coordinates
        .axis_iter(Axis(1))
        .map(|component| {
            let variables = blocks
                .iter()
                .filter_map(|block| {
                    let categories: Vec<CategoryWeight> = block
                        .categories
                        .iter()
                        .zip(block.columns())
                        .filter(|(_, col)| component[*col].abs() > tolerance)
                        .map(|(category, col)| CategoryWeight {
                            category: category.clone(),
                            weight: component[col],
                        })
                        .collect();
                    let weights = VariableWeights {
                        variable: block.name.clone(),
                        categories,
                    };
                    (weights.magnitude() > tolerance).then_some(weights)
                })
                .collect();
            ComponentWeights { variables }
        })
        .collect()
}
