//! Error types for the epitrend-ssm crate.

/// Error type for all fallible operations in the epitrend-ssm crate.
///
/// Structural variants (`InvalidSeasonPeriod`, `DimensionMismatch`,
/// `FingerprintMismatch`) indicate a broken model definition and are fatal
/// to a run. Numerical variants (`NonPositiveVariance`, `NonFiniteState`)
/// are raised by the Kalman recursions for a particular data set and
/// parameter value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Returned when a model is requested for a series of length zero.
    #[error("series is empty")]
    EmptySeries,

    /// Returned when the seasonal period leaves no seasonal state.
    #[error("invalid season period: {period} (must be >= 2)")]
    InvalidSeasonPeriod {
        /// The rejected period.
        period: usize,
    },

    /// Returned when a model matrix does not have the declared shape.
    #[error("matrix '{name}' has shape {got:?}, expected {expected:?}")]
    DimensionMismatch {
        /// Name of the offending matrix.
        name: String,
        /// Shape implied by the model definition.
        expected: Vec<usize>,
        /// Actual shape.
        got: Vec<usize>,
    },

    /// Returned when the observation vector length differs from the model's step count.
    #[error("observation length {got} does not match model length {expected}")]
    ObservationLength {
        /// Number of steps the model was built for.
        expected: usize,
        /// Number of observations supplied.
        got: usize,
    },

    /// Returned when a noise variance is negative or non-finite.
    #[error("invalid {name} variance: {value}")]
    InvalidVariance {
        /// Which variance was rejected.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Returned when the one-step prediction variance is not strictly positive.
    #[error("prediction variance is not positive at step {step}")]
    NonPositiveVariance {
        /// Time step (0-based) of the failure.
        step: usize,
    },

    /// Returned when the filter state becomes NaN or infinite.
    #[error("non-finite filter state at step {step}")]
    NonFiniteState {
        /// Time step (0-based) of the failure.
        step: usize,
    },

    /// Returned when a covariance matrix cannot be factorised.
    #[error("matrix '{name}' is not positive semi-definite")]
    NotPositiveSemiDefinite {
        /// Name of the matrix.
        name: String,
    },

    /// Returned when a compiled artifact does not belong to its definition.
    #[error("fingerprint mismatch: expected {expected}, got {got}")]
    FingerprintMismatch {
        /// Fingerprint of the requested definition.
        expected: String,
        /// Fingerprint stored in the artifact.
        got: String,
    },
}
