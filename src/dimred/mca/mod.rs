//! # Multiple Correspondence Analysis
//!
//! MCA is the categorical counterpart of PCA. Observations are expanded into an indicator
//! matrix, normalized by their row and column masses, and decomposed; the singular triplets
//! then place both observations and categories in a shared low-dimensional factor space.
//!
//! ## Pipeline
//! 1. [`NormalizedTable`] builds the residual matrix from rows and schema.
//! 2. [`StabilizedSVD`] decomposes it with the configured [`SVDImplementation`].
//! 3. Eigenvalues are corrected (Benzécri), trimmed to the retained rank and turned into
//!    explained-variance ratios (optionally against Greenacre's adjusted inertia).
//! 4. Rows and categories are projected; category coordinates are split back into sparse
//!    per-variable weights.
//!
//! The defaults reproduce the full analysis. The plain variant (uncorrected eigenvalues, row
//! factors weighted by mass, no column output) is available through [`MCABuilder`].

mod projection;

use log::{debug, warn};
use ndarray::{s, Array1, Array2};

use crate::categorical::{CategorySchema, Observation};
use crate::error::MCAError;
use crate::indicator::NormalizedTable;
use crate::svd::{NalgebraSVD, SVDImplementation, StabilizedSVD};

pub use projection::{CategoryWeight, ComponentWeights, VariableWeights};

/// How row coordinates are weighted by the row masses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowScaling {
    /// Multiply by `1 / sqrt(row mass)`, the principal-coordinate convention.
    #[default]
    InverseSqrtMass,
    /// Multiply by the row mass itself.
    Mass,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MCAOptions {
    /// Apply Benzécri's eigenvalue correction.
    pub benzecri: bool,
    /// With the correction active, divide by Greenacre's adjusted inertia.
    pub greenacre: bool,
    /// Threshold for eigenvalue significance and category weight inclusion.
    pub tolerance: f64,
    /// Upper bound on the retained rank; `None` is unbounded.
    pub n_components: Option<usize>,
    /// Convergence parameter forwarded to the SVD routine; zero picks the routine's default.
    pub epsilon: f64,
    /// Reconstruction tolerance for checking the SVD; zero disables the check.
    pub svd_tolerance: f64,
    /// Compute column coordinates and category weights.
    pub column_factors: bool,
    /// Weighting of row coordinates by the row masses.
    pub row_scaling: RowScaling,
}

impl Default for MCAOptions {
    fn default() -> Self {
        Self {
            benzecri: true,
            greenacre: true,
            tolerance: 1e-4,
            n_components: None,
            epsilon: 0.0,
            svd_tolerance: 0.0,
            column_factors: true,
            row_scaling: RowScaling::default(),
        }
    }
}

impl MCAOptions {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.tolerance >= 0.0) {
            return Err(MCAError::InvalidOption(format!(
                "tolerance must be non-negative, got {}",
                self.tolerance
            ))
            .into());
        }
        if !(self.svd_tolerance >= 0.0) {
            return Err(MCAError::InvalidOption(format!(
                "svd_tolerance must be non-negative, got {}",
                self.svd_tolerance
            ))
            .into());
        }
        if !self.epsilon.is_finite() {
            return Err(MCAError::InvalidOption(format!(
                "epsilon must be finite, got {}",
                self.epsilon
            ))
            .into());
        }
        if self.n_components == Some(0) {
            return Err(MCAError::InvalidOption("n_components must be at least 1".into()).into());
        }
        Ok(())
    }
}

/// Output of one analysis.
#[derive(Debug, Clone)]
pub struct MCAResult {
    /// Share of inertia per retained component.
    pub explained_variance: Array1<f64>,
    /// Observation coordinates, one row per observation and one column per component.
    pub row_factors: Array2<f64>,
    /// Category coordinates, one row per indicator column.
    pub column_coordinates: Option<Array2<f64>>,
    /// Per-component attribution to named categories.
    pub column_factors: Option<Vec<ComponentWeights>>,
    /// Eigenvalues of every component, retained or not.
    pub eigenvalues: Array1<f64>,
    pub singular_values: Array1<f64>,
    /// Denominator of `explained_variance`.
    pub inertia: f64,
    pub rank: usize,
}

impl MCAResult {
    pub fn n_components(&self) -> usize {
        self.rank
    }

    pub fn cumulative_explained_variance(&self) -> Array1<f64> {
        let mut sum = 0.0;
        self.explained_variance.mapv(|v| {
            sum += v;
            sum
        })
    }
}

pub struct MCA<S: SVDImplementation = NalgebraSVD> {
    options: MCAOptions,
    svd: StabilizedSVD<S>,
}

impl<S: SVDImplementation> MCA<S> {
    pub fn options(&self) -> &MCAOptions {
        &self.options
    }

    pub fn fit(&self, rows: &[Observation], schema: &CategorySchema) -> anyhow::Result<MCAResult> {
        self.options.validate()?;
        let options = &self.options;

        let table = NormalizedTable::build(rows, schema)?;
        let k = table.n_variables();
        let decomposition = self.svd.decompose(table.residual.view())?;

        let benzecri = options.benzecri && k > 1;
        if options.benzecri && !benzecri {
            warn!("Benzécri correction needs at least two variables, using raw eigenvalues");
        }

        let eigenvalues = projection::eigenvalues(decomposition.s.view(), k, benzecri);
        let (rank, retained_inertia) =
            projection::retained_rank(eigenvalues.view(), options.tolerance, options.n_components);
        let retained = eigenvalues.slice(s![..rank]);

        let inertia = if benzecri && options.greenacre {
            let adjusted =
                projection::greenacre_inertia(decomposition.s.view(), k, table.n_categories());
            projection::corrected_inertia(adjusted, retained_inertia, options.tolerance)
        } else {
            retained_inertia
        };
        let explained_variance = projection::explained_variance(retained, inertia);
        debug!(
            "Retained {} of {} components, explained variance {:?}",
            rank,
            eigenvalues.len(),
            explained_variance.as_slice()
        );

        let scaling = projection::scaling(retained, benzecri);
        let row_scale = match options.row_scaling {
            RowScaling::InverseSqrtMass => table.row_inv_sqrt.view(),
            RowScaling::Mass => table.row_mass.view(),
        };
        let row_factors =
            projection::row_factors(decomposition.p.view(), row_scale, scaling.view());

        let (column_coordinates, column_factors) = if options.column_factors {
            let coordinates = projection::column_coordinates(
                decomposition.q.view(),
                table.col_inv_sqrt.view(),
                scaling.view(),
            );
            let weights =
                projection::category_weights(coordinates.view(), &table.blocks, options.tolerance);
            (Some(coordinates), Some(weights))
        } else {
            (None, None)
        };

        Ok(MCAResult {
            explained_variance,
            row_factors,
            column_coordinates,
            column_factors,
            eigenvalues,
            singular_values: decomposition.s,
            inertia,
            rank,
        })
    }
}

/// Builder for [`MCA`].
///
/// ```ignore
/// let mca = MCABuilder::new()
///     .n_components(2)
///     .svd_tolerance(1e-6)
///     .build();
/// let result = mca.fit(&rows, &schema)?;
/// ```
pub struct MCABuilder<S: SVDImplementation = NalgebraSVD> {
    options: MCAOptions,
    svd_implementation: S,
}

impl MCABuilder<NalgebraSVD> {
    pub fn new() -> Self {
        Self::with_svd(NalgebraSVD::default())
    }
}

impl Default for MCABuilder<NalgebraSVD> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SVDImplementation> MCABuilder<S> {
    /// Starts from default options with a custom SVD routine.
    pub fn with_svd(svd_implementation: S) -> Self {
        MCABuilder {
            options: MCAOptions::default(),
            svd_implementation,
        }
    }

    pub fn options(mut self, options: MCAOptions) -> Self {
        self.options = options;
        self
    }

    pub fn benzecri(mut self, benzecri: bool) -> Self {
        self.options.benzecri = benzecri;
        self
    }

    pub fn greenacre(mut self, greenacre: bool) -> Self {
        self.options.greenacre = greenacre;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.options.tolerance = tolerance;
        self
    }

    pub fn n_components(mut self, n_components: usize) -> Self {
        self.options.n_components = Some(n_components);
        self
    }

    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.options.epsilon = epsilon;
        self
    }

    pub fn svd_tolerance(mut self, svd_tolerance: f64) -> Self {
        self.options.svd_tolerance = svd_tolerance;
        self
    }

    pub fn column_factors(mut self, column_factors: bool) -> Self {
        self.options.column_factors = column_factors;
        self
    }

    pub fn row_scaling(mut self, row_scaling: RowScaling) -> Self {
        self.options.row_scaling = row_scaling;
        self
    }

    pub fn build(self) -> MCA<S> {
        let svd = StabilizedSVD::new(self.svd_implementation)
            .epsilon(self.options.epsilon)
            .check_tolerance(self.options.svd_tolerance);
        MCA {
            options: self.options,
            svd,
        }
    }
}

/// Runs MCA with the default SVD routine.
pub fn mca(
    rows: &[Observation],
    schema: &CategorySchema,
    options: MCAOptions,
) -> anyhow::Result<MCAResult> {
    MCABuilder::new().options(options).build().fit(rows, schema)
}
