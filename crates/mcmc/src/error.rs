//! Error types for the epitrend-mcmc crate.

use std::time::Duration;

use epitrend_ssm::ModelError;

/// Error type for all fallible operations in the epitrend-mcmc crate.
///
/// Every variant is local to one region: the driver records it and moves
/// on to the next region.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SamplerError {
    /// Returned when the observation slice is empty.
    #[error("observations are empty")]
    EmptyObservations,

    /// Returned when an observation is NaN or infinite.
    #[error("non-finite observation at index {index}")]
    NonFiniteObservations {
        /// Position of the first offending value.
        index: usize,
    },

    /// Returned when the observation count differs from the model length.
    #[error("observation length {got} does not match model length {expected}")]
    LengthMismatch {
        /// Number of steps the model was built for.
        expected: usize,
        /// Number of observations supplied.
        got: usize,
    },

    /// Returned when a sampler setting is out of range.
    #[error("invalid sampler configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },

    /// Returned when hand-assembled draws have inconsistent shapes.
    #[error("inconsistent posterior draws: {reason}")]
    InconsistentDraws {
        /// Human-readable description of the problem.
        reason: String,
    },

    /// Returned when sampling runs past the per-region wall-clock budget.
    #[error("time budget of {budget:?} exceeded")]
    TimeBudgetExceeded {
        /// The configured budget.
        budget: Duration,
    },

    /// Returned when chains disagree or too many transitions diverged.
    #[error("sampler did not converge: max R-hat {max_rhat:.3}, {divergences} divergences")]
    NonConvergence {
        /// Worst split R-hat over the monitored quantities.
        max_rhat: f64,
        /// Divergent transitions summed over chains.
        divergences: usize,
    },

    /// A Kalman recursion failed while drawing states.
    #[error(transparent)]
    Kalman(#[from] ModelError),
}
