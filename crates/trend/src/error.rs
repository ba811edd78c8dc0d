//! Error types for epitrend-trend.

use std::path::PathBuf;

use epitrend_ssm::ModelError;

/// Error raised while reducing posterior draws to a trend series.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractError {
    /// Returned when the posterior holds no draws.
    #[error("posterior holds no draws")]
    NoDraws,

    /// Returned when the draws and the series cover different numbers of days.
    #[error("posterior covers {draws} steps but the series has {series} days")]
    LengthMismatch {
        /// Steps in the posterior trajectories.
        draws: usize,
        /// Days in the region series.
        series: usize,
    },

    /// Returned when the state vector has no slope component.
    #[error("state dimension {state_dim} has no slope component")]
    MissingSlope {
        /// State dimension of the draws.
        state_dim: usize,
    },

    /// Returned when a posterior growth value is NaN or infinite.
    #[error("non-finite growth at step {step}")]
    NonFinite {
        /// Time step (0-based).
        step: usize,
    },
}

/// Error that stops a whole estimation run.
///
/// Failures of a single region never surface here; they are recorded as
/// [`RegionFailure`](crate::RegionFailure)s in the report.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Returned when the shared model structure fails validation.
    #[error("model structure is invalid: {0}")]
    Structural(#[source] ModelError),

    /// Returned when two input series share a region id.
    #[error("duplicate region id: {region_id}")]
    DuplicateRegion {
        /// The repeated id.
        region_id: String,
    },

    /// Returned when the driver configuration is out of range.
    #[error("invalid driver configuration: {reason}")]
    InvalidConfig {
        /// What is wrong.
        reason: String,
    },

    /// Returned when the worker pool cannot be created.
    #[error("cannot start worker pool: {reason}")]
    ThreadPool {
        /// Description of the underlying failure.
        reason: String,
    },

    /// Returned when the diagnostics file cannot be written.
    #[error("cannot write diagnostics to {}: {reason}", path.display())]
    Diagnostics {
        /// Target path.
        path: PathBuf,
        /// Description of the underlying failure.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_extract_errors() {
        assert_eq!(ExtractError::NoDraws.to_string(), "posterior holds no draws");
        assert_eq!(
            ExtractError::LengthMismatch {
                draws: 30,
                series: 31
            }
            .to_string(),
            "posterior covers 30 steps but the series has 31 days"
        );
        assert_eq!(
            ExtractError::MissingSlope { state_dim: 1 }.to_string(),
            "state dimension 1 has no slope component"
        );
        assert_eq!(
            ExtractError::NonFinite { step: 4 }.to_string(),
            "non-finite growth at step 4"
        );
    }

    #[test]
    fn display_structural() {
        let err = DriverError::Structural(ModelError::InvalidSeasonPeriod { period: 1 });
        assert_eq!(
            err.to_string(),
            "model structure is invalid: invalid season period: 1 (must be >= 2)"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn display_duplicate_region() {
        let err = DriverError::DuplicateRegion {
            region_id: "Ohio".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate region id: Ohio");
    }

    #[test]
    fn display_diagnostics() {
        let err = DriverError::Diagnostics {
            path: PathBuf::from("/tmp/diag.json"),
            reason: "disk full".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot write diagnostics to /tmp/diag.json: disk full"
        );
    }

    #[test]
    fn errors_are_send_sync_and_std_error() {
        fn assert_bounds<T: Send + Sync + std::error::Error>() {}
        assert_bounds::<ExtractError>();
        assert_bounds::<DriverError>();
    }
}
