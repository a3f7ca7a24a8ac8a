// vitrack_sim/src/simulation/state_error.rs

use nalgebra::Isometry3;
use serde::Serialize;
use vitrack_core::utils::exp_map::angular_distance;

/// Position and attitude error of one estimate against the truth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoseError {
    /// m
    pub position: f64,
    /// degrees
    pub attitude_deg: f64,
}

impl PoseError {
    pub fn between(truth: &Isometry3<f64>, estimate: &Isometry3<f64>) -> Self {
        // --- 1. Position: Euclidean distance ---
        let position = (truth.translation.vector - estimate.translation.vector).norm();

        // --- 2. Attitude: angle of the rotation taking the estimate to the truth ---
        let attitude_deg = angular_distance(&truth.rotation, &estimate.rotation).to_degrees();

        Self {
            position,
            attitude_deg,
        }
    }
}

/// Running error statistics over a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorStats {
    pub samples: u64,
    sum_sq_position: f64,
    sum_sq_attitude: f64,
    pub max_position: f64,
    pub max_attitude_deg: f64,
    pub last: Option<PoseError>,
}

impl ErrorStats {
    pub fn record(&mut self, error: PoseError) {
        self.samples += 1;
        self.sum_sq_position += error.position * error.position;
        self.sum_sq_attitude += error.attitude_deg * error.attitude_deg;
        self.max_position = self.max_position.max(error.position);
        self.max_attitude_deg = self.max_attitude_deg.max(error.attitude_deg);
        self.last = Some(error);
    }

    pub fn rms_position(&self) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        (self.sum_sq_position / self.samples as f64).sqrt()
    }

    pub fn rms_attitude_deg(&self) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        (self.sum_sq_attitude / self.samples as f64).sqrt()
    }
}
