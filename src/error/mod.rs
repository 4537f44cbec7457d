use thiserror::Error;

/// Failures raised by the MCA pipeline.
///
/// Public entry points return `anyhow::Result`; callers that need to branch on
/// the failure kind can `downcast_ref::<MCAError>()` the returned error.
#[derive(Debug, Error)]
pub enum MCAError {
    #[error("category schema has no variable with at least one category")]
    EmptySchema,

    #[error("no observations supplied")]
    NoObservations,

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("SVD computation failed: {0}")]
    DecompositionFailed(String),

    #[error("SVD produced a non-finite value in {factor}")]
    NonFiniteDecomposition { factor: &'static str },

    /// The factorization does not reproduce its input. `expected` and
    /// `actual` hold the formatted residual matrix and its reconstruction.
    #[error(
        "SVD reconstruction failed at entry ({row}, {col}): expected {expected_value}, got {actual_value} (tolerance {tolerance})\nexpected Z=\n {expected}\nactual P*s*Q=\n {actual}"
    )]
    ReconstructionMismatch {
        row: usize,
        col: usize,
        expected_value: f64,
        actual_value: f64,
        tolerance: f64,
        expected: String,
        actual: String,
    },
}
