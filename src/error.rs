use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by clustering runs and the comparison engine.
///
/// Degenerate input (fewer points than the density parameters require) is
/// deliberately *not* an error: those runs return an all-noise assignment.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Input points have inconsistent dimensionality.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A coordinate is NaN or infinite.
    #[error("non-finite coordinate: {0}")]
    NonFiniteCoordinate(String),

    /// A parameter was rejected at construction time.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        name: &'static str,
        message: &'static str,
    },

    /// A comparison was requested against a window holding no arrests, so a
    /// relative change or a composition share is undefined. Surfaced to the
    /// caller, never coerced to zero or infinity.
    #[error("comparison undefined: {context} holds no arrests")]
    DivisionUndefined { context: String },

    /// A clustering run exceeded its time budget and was abandoned.
    /// Retrying with identical input and parameters would not change the
    /// outcome, so the caller must adjust parameters instead.
    #[error("clustering run exceeded its time budget of {budget:?}")]
    Timeout { budget: Duration },

    /// A CSV input could not be read at all. Individual malformed rows are
    /// dropped by the loader rather than reported here.
    #[error("failed to read input data: {0}")]
    Csv(String),

    /// A background run ended without producing a result.
    #[error("{0}")]
    RunFailed(String),
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Csv(e.to_string())
    }
}

/// Result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
