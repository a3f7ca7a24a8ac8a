// vitrack_core/src/error.rs

use thiserror::Error;

/// Everything that can go wrong while predicting or correcting a tracked body.
///
/// Precondition violations (negative `dt`, a measurement covariance that is not
/// positive definite) and numerical degeneracy are both reported here; the core
/// never commits a result that produced one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("cannot predict backwards in time (dt = {0})")]
    NegativeTimeStep(f64),

    #[error("measurement at t = {measurement} is older than the state at t = {state}")]
    OutOfOrder { measurement: f64, state: f64 },

    #[error("state covariance is not positive semi-definite")]
    CovarianceNotPositiveDefinite,

    #[error("measurement covariance is not positive definite")]
    MeasurementCovarianceNotPositiveDefinite,

    #[error("innovation covariance is singular or ill-conditioned")]
    InnovationCovarianceSingular,

    #[error("state correction contains non-finite values")]
    NonFiniteCorrection,

    #[error("corrected covariance is not symmetric positive semi-definite")]
    InvalidCommittedCovariance,

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl FilterError {
    /// Whether the failure comes from the filter's own state rather than from
    /// the input it was given. Only these count towards covariance recovery.
    pub fn originates_in_state(&self) -> bool {
        matches!(
            self,
            FilterError::CovarianceNotPositiveDefinite
                | FilterError::InnovationCovarianceSingular
                | FilterError::NonFiniteCorrection
                | FilterError::InvalidCommittedCovariance
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_do_not_blame_the_state() {
        assert!(FilterError::CovarianceNotPositiveDefinite.originates_in_state());
        assert!(FilterError::InnovationCovarianceSingular.originates_in_state());
        assert!(FilterError::NonFiniteCorrection.originates_in_state());
        assert!(FilterError::InvalidCommittedCovariance.originates_in_state());

        assert!(!FilterError::MeasurementCovarianceNotPositiveDefinite.originates_in_state());
        assert!(!FilterError::NegativeTimeStep(-1.0).originates_in_state());
        assert!(!FilterError::DimensionMismatch {
            expected: 3,
            actual: 2
        }
        .originates_in_state());
    }
}
