// vitrack_sim/src/simulation/sensors.rs

use nalgebra::{Isometry3, Matrix3, Matrix6, Translation3, Vector3};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::info;
use vitrack_core::messages::{MeasurementData, MeasurementMessage};
use vitrack_core::types::{BodyHandle, SensorHandle};
use vitrack_core::utils::exp_map::rotation_vector_to_quat;

use crate::error::SimError;
use crate::simulation::config::{CameraConfig, CameraOutput, GyroConfig, SensorConfig};
use crate::simulation::prng::SimulationRng;
use crate::simulation::truth::GroundTruthState;

// =========================================================================
// == Scheduling ==
// =========================================================================

/// Fires at `period, 2 * period, ...` without accumulating rounding drift.
#[derive(Debug, Clone)]
pub struct RateSchedule {
    period: f64,
    fired: u64,
}

impl RateSchedule {
    pub fn new(rate_hz: f64) -> Self {
        Self {
            period: 1.0 / rate_hz,
            fired: 0,
        }
    }

    pub fn next_time(&self) -> f64 {
        (self.fired + 1) as f64 * self.period
    }

    /// Timestamps of every firing up to and including `now`, oldest first.
    pub fn drain_due(&mut self, now: f64) -> Vec<f64> {
        let mut due = Vec::new();
        while self.next_time() <= now {
            due.push(self.next_time());
            self.fired += 1;
        }
        due
    }
}

// =========================================================================
// == Sensor Models ==
// =========================================================================

#[derive(Debug, Clone)]
enum SensorKind {
    Camera {
        output: CameraOutput,
        position_noise: Normal<f64>,
        orientation_noise: Normal<f64>,
        dropout_probability: f64,
    },
    Gyro {
        noise: Normal<f64>,
    },
}

/// A configured sensor with its runtime noise sources.
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    pub name: String,
    pub handle: SensorHandle,
    pub schedule: RateSchedule,
    kind: SensorKind,
}

impl SimulatedSensor {
    pub fn from_config(config: &SensorConfig, handle: SensorHandle) -> Result<Self, SimError> {
        let kind = match config {
            SensorConfig::Camera(CameraConfig {
                output,
                position_noise_stddev,
                orientation_noise_stddev_deg,
                dropout_probability,
                ..
            }) => SensorKind::Camera {
                output: *output,
                position_noise: Normal::new(0.0, *position_noise_stddev)?,
                orientation_noise: Normal::new(0.0, orientation_noise_stddev_deg.to_radians())?,
                dropout_probability: *dropout_probability,
            },
            SensorConfig::Gyro(GyroConfig { noise_stddev_deg, .. }) => SensorKind::Gyro {
                noise: Normal::new(0.0, noise_stddev_deg.to_radians())?,
            },
        };
        info!(
            "  -> Created {} '{}' ({}) at {:.1} Hz",
            config.get_kind_str(),
            config.name(),
            handle,
            config.rate()
        );
        Ok(Self {
            name: config.name().to_string(),
            handle,
            schedule: RateSchedule::new(config.rate()),
            kind,
        })
    }

    /// One noisy observation of `truth`, or `None` if the frame was dropped.
    pub fn observe(
        &self,
        body: BodyHandle,
        timestamp: f64,
        truth: &GroundTruthState,
        rng: &mut SimulationRng,
    ) -> Option<MeasurementMessage> {
        let data = match &self.kind {
            SensorKind::Camera {
                output,
                position_noise,
                orientation_noise,
                dropout_probability,
            } => {
                if *dropout_probability > 0.0 && rng.0.gen_bool(*dropout_probability) {
                    return None;
                }
                let position_var = position_noise.std_dev().powi(2);
                let orientation_var = orientation_noise.std_dev().powi(2);
                let position = truth.pose.translation.vector + sample3(position_noise, rng);
                let orientation =
                    rotation_vector_to_quat(&sample3(orientation_noise, rng)) * truth.pose.rotation;
                match output {
                    CameraOutput::Orientation => MeasurementData::Orientation {
                        orientation,
                        covariance: Matrix3::identity() * orientation_var,
                    },
                    CameraOutput::Position => MeasurementData::Position {
                        position,
                        covariance: Matrix3::identity() * position_var,
                    },
                    CameraOutput::Pose => {
                        let mut covariance = Matrix6::identity() * position_var;
                        covariance
                            .fixed_view_mut::<3, 3>(3, 3)
                            .copy_from(&(Matrix3::identity() * orientation_var));
                        MeasurementData::Pose {
                            pose: Isometry3::from_parts(Translation3::from(position), orientation),
                            covariance,
                        }
                    }
                }
            }
            SensorKind::Gyro { noise } => MeasurementData::AngularVelocity {
                angular_velocity: truth.angular_velocity + sample3(noise, rng),
                covariance: Matrix3::identity() * noise.std_dev().powi(2),
            },
        };
        Some(MeasurementMessage {
            body_handle: body,
            sensor_handle: self.handle,
            timestamp,
            data,
        })
    }
}

fn sample3(noise: &Normal<f64>, rng: &mut SimulationRng) -> Vector3<f64> {
    Vector3::new(
        noise.sample(&mut rng.0),
        noise.sample(&mut rng.0),
        noise.sample(&mut rng.0),
    )
}
