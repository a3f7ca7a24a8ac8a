// vitrack_core/src/estimation/tracker.rs

use tracing::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::error::FilterError;
use crate::estimation::{begin_correction_with, predict, StateEstimator};
use crate::messages::{MeasurementData, MeasurementMessage, ModuleInput, PoseEstimate};
use crate::models::measurement::{
    AbsoluteOrientationMeasurement, AbsolutePoseMeasurement, AbsolutePositionMeasurement,
    AngularVelocityMeasurement, MeasurementModel,
};
use crate::models::process::ProcessModel;
use crate::state::{FilterState, PoseState};
use crate::types::BodyHandle;

/// What happened to one input.
#[derive(Debug, Clone, PartialEq)]
pub enum CorrectionOutcome {
    /// Time advanced; no measurement was involved.
    Predicted,
    Applied { mahalanobis_squared: f64 },
    /// Valid, but farther from the prediction than the configured gate.
    RejectedOutlier { mahalanobis_squared: f64 },
    /// Numerically unusable; the state was left as it was.
    RejectedInvalid(FilterError),
}

/// Timestamped predict/correct sequencing for one tracked body.
///
/// Owns the body's state and its process model. Measurements must arrive in
/// non-decreasing time order; several may share a timestamp and are then
/// applied one after another against the same prediction.
#[derive(Debug)]
pub struct BodyTracker {
    handle: BodyHandle,
    config: TrackerConfig,
    process_model: Box<dyn ProcessModel<PoseState>>,
    state: PoseState,
    timestamp: f64,

    applied: u64,
    rejected_outliers: u64,
    rejected_invalid: u64,
    consecutive_failures: u32,
}

impl BodyTracker {
    /// A tracker at rest at the origin at `t = 0`.
    pub fn new(handle: BodyHandle, config: TrackerConfig) -> Result<Self, FilterError> {
        let mut state = PoseState::new();
        state.reset_covariance(config.initial_covariance);
        Self::with_state(handle, config, state, 0.0)
    }

    pub fn with_state(
        handle: BodyHandle,
        config: TrackerConfig,
        state: PoseState,
        timestamp: f64,
    ) -> Result<Self, FilterError> {
        config.validate()?;
        let process_model = config.process_model.build()?;
        info!(body = %handle, process_model = ?config.process_model, "created body tracker");
        Ok(Self {
            handle,
            config,
            process_model,
            state,
            timestamp,
            applied: 0,
            rejected_outliers: 0,
            rejected_invalid: 0,
            consecutive_failures: 0,
        })
    }

    pub fn handle(&self) -> BodyHandle {
        self.handle
    }

    pub fn state(&self) -> &PoseState {
        &self.state
    }

    /// Time of the last prediction or correction.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn applied_count(&self) -> u64 {
        self.applied
    }

    pub fn rejected_outlier_count(&self) -> u64 {
        self.rejected_outliers
    }

    pub fn rejected_invalid_count(&self) -> u64 {
        self.rejected_invalid
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Predicts forward to `time`. Earlier times are an error.
    pub fn predict_to(&mut self, time: f64) -> Result<(), FilterError> {
        if time < self.timestamp {
            return Err(FilterError::OutOfOrder {
                measurement: time,
                state: self.timestamp,
            });
        }
        predict(&mut self.state, self.process_model.as_ref(), time - self.timestamp)?;
        self.timestamp = time;
        Ok(())
    }

    /// Corrects the current state with an arbitrary measurement model.
    ///
    /// No prediction happens here; the caller is responsible for having
    /// brought the state to the measurement time.
    pub fn correct<M>(&mut self, model: &M) -> CorrectionOutcome
    where
        M: MeasurementModel<PoseState>,
    {
        let params = self.config.ukf;
        let gate = self.config.gate;

        let outcome = {
            let correction = begin_correction_with(&mut self.state, model, &params);
            let rejection = correction.rejection().cloned();
            if let Some(err) = rejection {
                CorrectionOutcome::RejectedInvalid(err)
            } else {
                let mahalanobis_squared = correction.mahalanobis_squared();
                match gate {
                    Some(gate) if mahalanobis_squared > gate => {
                        CorrectionOutcome::RejectedOutlier { mahalanobis_squared }
                    }
                    _ => match correction.commit() {
                        Ok(()) => CorrectionOutcome::Applied { mahalanobis_squared },
                        Err(err) => CorrectionOutcome::RejectedInvalid(err),
                    },
                }
            }
        };

        match &outcome {
            CorrectionOutcome::Applied { .. } => {
                self.applied += 1;
                self.consecutive_failures = 0;
            }
            CorrectionOutcome::RejectedOutlier { mahalanobis_squared } => {
                self.rejected_outliers += 1;
                debug!(body = %self.handle, mahalanobis_squared, "gated out measurement");
            }
            CorrectionOutcome::RejectedInvalid(err) => {
                self.rejected_invalid += 1;
                warn!(body = %self.handle, reason = %err, "rejected invalid correction");
                if err.originates_in_state() {
                    self.consecutive_failures += 1;
                    self.recover_if_stuck();
                }
            }
            CorrectionOutcome::Predicted => {}
        }
        outcome
    }

    fn recover_if_stuck(&mut self) {
        let limit = self.config.max_consecutive_failures;
        if limit > 0 && self.consecutive_failures >= limit {
            warn!(
                body = %self.handle,
                failures = self.consecutive_failures,
                variance = self.config.initial_covariance,
                "resetting covariance after repeated failures"
            );
            self.state.reset_covariance(self.config.initial_covariance);
            self.consecutive_failures = 0;
        }
    }

    fn handle_measurement(
        &mut self,
        message: &MeasurementMessage,
    ) -> Result<CorrectionOutcome, FilterError> {
        if message.body_handle != self.handle {
            return Err(FilterError::InvalidParameter {
                name: "body_handle",
                reason: format!(
                    "message for {} sent to tracker of {}",
                    message.body_handle, self.handle
                ),
            });
        }
        self.predict_to(message.timestamp)?;

        let outcome = match &message.data {
            MeasurementData::Orientation {
                orientation,
                covariance,
            } => self.correct(&AbsoluteOrientationMeasurement::new(*orientation, *covariance)),
            MeasurementData::Position {
                position,
                covariance,
            } => self.correct(&AbsolutePositionMeasurement::new(*position, *covariance)),
            MeasurementData::Pose { pose, covariance } => {
                self.correct(&AbsolutePoseMeasurement::new(*pose, *covariance))
            }
            MeasurementData::AngularVelocity {
                angular_velocity,
                covariance,
            } => {
                self.correct(&AngularVelocityMeasurement::new(*angular_velocity, *covariance))
            }
        };
        debug!(
            body = %self.handle,
            sensor = %message.sensor_handle,
            kind = message.data.kind(),
            t = message.timestamp,
            ?outcome,
            "processed measurement"
        );
        Ok(outcome)
    }

    pub fn estimate(&self) -> PoseEstimate {
        PoseEstimate {
            body_handle: self.handle,
            timestamp: self.timestamp,
            pose: self.state.pose(),
            linear_velocity: self.state.velocity,
            angular_velocity: self.state.angular_velocity,
            pose_covariance: self.state.pose_covariance(),
            state_contents_invalid: self.state.state_contents_invalid(),
            covariance_contents_invalid: self.state.covariance_contents_invalid(),
        }
    }
}

impl StateEstimator for BodyTracker {
    type State = PoseState;

    fn process(&mut self, input: &ModuleInput) -> Result<CorrectionOutcome, FilterError> {
        match input {
            ModuleInput::TimeStep { current_time } => {
                if *current_time > self.timestamp {
                    self.predict_to(*current_time)?;
                }
                Ok(CorrectionOutcome::Predicted)
            }
            ModuleInput::Measurement { message } => self.handle_measurement(message),
        }
    }

    fn get_state(&self) -> &PoseState {
        &self.state
    }
}
