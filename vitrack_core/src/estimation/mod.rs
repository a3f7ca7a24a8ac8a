// vitrack_core/src/estimation/mod.rs

use crate::error::FilterError;
use crate::messages::ModuleInput;
use crate::models::measurement::MeasurementModel;
use crate::models::process::ProcessModel;
use crate::state::FilterState;
use crate::utils::validity::symmetrize;
use tracing::{debug, warn};

pub mod tracker;
pub mod ukf;

pub use tracker::{BodyTracker, CorrectionOutcome};
pub use ukf::{SigmaPointSet, SigmaWeights, UkfParams, UnscentedCorrection};

/// The contract for any algorithm that performs the "State Estimator" role.
/// Its sole responsibility is to estimate the state of one tracked body.
pub trait StateEstimator: Send + Sync {
    type State: FilterState;

    /// The single, unified method for processing all types of input data.
    /// The implementation is responsible for interpreting the `ModuleInput`.
    fn process(&mut self, input: &ModuleInput) -> Result<CorrectionOutcome, FilterError>;

    /// Returns a reference to the current best estimate of the state.
    fn get_state(&self) -> &Self::State;
}

/// Advances `state` by `dt` seconds under `model`, in place.
///
/// The process noise is added to the propagated covariance and the result is
/// symmetrized. A negative or non-finite `dt`, or a covariance of the wrong
/// size, is rejected and leaves `state` untouched; `dt == 0` is allowed and
/// only re-symmetrizes.
pub fn predict<S, P>(state: &mut S, model: &P, dt: f64) -> Result<(), FilterError>
where
    S: FilterState,
    P: ProcessModel<S> + ?Sized,
{
    if dt < 0.0 {
        return Err(FilterError::NegativeTimeStep(dt));
    }
    if !dt.is_finite() {
        return Err(FilterError::InvalidParameter {
            name: "dt",
            reason: format!("must be finite, got {dt}"),
        });
    }

    state.check_covariance_shape()?;
    let n = state.dim();
    let (mut predicted, q) = model.predict(state, dt);
    if q.shape() != (n, n) {
        return Err(FilterError::DimensionMismatch {
            expected: n,
            actual: q.nrows(),
        });
    }

    let mut covariance = predicted.covariance() + q;
    symmetrize(&mut covariance);
    predicted.set_covariance(covariance);

    if predicted.state_contents_invalid() || predicted.covariance_contents_invalid() {
        warn!(dt, "prediction produced non-finite values");
    } else {
        debug!(dt, "predicted state");
    }

    *state = predicted;
    Ok(())
}

/// Starts an unscented correction of `state` by `model` with default parameters.
///
/// Nothing is written until the returned correction is committed.
pub fn begin_correction<'a, S, M>(state: &'a mut S, model: &M) -> UnscentedCorrection<'a, S>
where
    S: FilterState,
    M: MeasurementModel<S>,
{
    begin_correction_with(state, model, &UkfParams::default())
}

pub fn begin_correction_with<'a, S, M>(
    state: &'a mut S,
    model: &M,
    params: &UkfParams,
) -> UnscentedCorrection<'a, S>
where
    S: FilterState,
    M: MeasurementModel<S>,
{
    UnscentedCorrection::begin(state, model, params)
}
