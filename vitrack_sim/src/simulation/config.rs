// vitrack_sim/src/simulation/config.rs

use std::path::Path;

use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use tracing::info;
use vitrack_core::config::TrackerConfig;

use crate::error::SimError;
use crate::simulation::utils::serde_helpers;

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// # ScenarioConfig
/// The root of the data parsed from a `scenario.toml` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct ScenarioConfig {
    #[serde(default)] // Use default if the [simulation] section is missing
    pub simulation: Simulation,

    #[serde(default)]
    pub body: BodyConfig,

    // The TOML has `[[sensors]]`, which becomes a Vec of SensorConfig.
    #[serde(default = "default_sensors")]
    pub sensors: Vec<SensorConfig>,

    #[serde(default)]
    pub tracker: TrackerConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            simulation: Simulation::default(),
            body: BodyConfig::default(),
            sensors: default_sensors(),
            tracker: TrackerConfig::default(),
        }
    }
}

// =========================================================================
// == Configuration Sub-Structs ==
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Simulation {
    /// Seed for the pseudo-random number generator.
    pub seed: u64,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
    /// Rate of the driver loop; every tick predicts the tracker forward.
    pub step_hz: f64,
    /// How often the estimation error is logged, in seconds of sim time.
    pub report_interval_seconds: f64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            seed: 0,
            duration_seconds: 10.0,
            step_hz: 100.0,
            report_interval_seconds: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BodyConfig {
    pub name: String,
    #[serde(default)]
    pub start: Pose,
    /// World-frame linear velocity, m/s.
    #[serde(with = "serde_helpers::vec3_from_array", default = "Vector3::zeros")]
    pub linear_velocity: Vector3<f64>,
    /// World-frame angular velocity, deg/s in the file.
    #[serde(
        rename = "angular_velocity_deg",
        with = "serde_helpers::vec3_deg_to_rad",
        default = "Vector3::zeros"
    )]
    pub angular_velocity: Vector3<f64>,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            name: "handheld".to_string(),
            start: Pose::default(),
            linear_velocity: Vector3::new(0.2, 0.0, 0.0),
            angular_velocity: Vector3::new(0.0, 0.0, 30f64.to_radians()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Pose {
    #[serde(with = "serde_helpers::vec3_from_array", default = "Vector3::zeros")]
    pub translation: Vector3<f64>,

    #[serde(with = "serde_helpers::quat_from_euler_deg", default = "UnitQuaternion::identity")]
    pub rotation: UnitQuaternion<f64>,
}

impl Pose {
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.translation), self.rotation)
    }
}

// =========================================================================
// == Sensors ==
// =========================================================================

/// Any sensor that might appear in the `[[sensors]]` list, selected by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
#[serde(rename_all = "PascalCase")] // "Camera" in TOML maps to Camera variant
pub enum SensorConfig {
    Camera(CameraConfig),
    Gyro(GyroConfig),
}

impl SensorConfig {
    pub fn name(&self) -> &str {
        match self {
            SensorConfig::Camera(c) => &c.name,
            SensorConfig::Gyro(g) => &g.name,
        }
    }

    pub fn rate(&self) -> f64 {
        match self {
            SensorConfig::Camera(c) => c.rate,
            SensorConfig::Gyro(g) => g.rate,
        }
    }

    pub fn get_kind_str(&self) -> &str {
        match self {
            SensorConfig::Camera(_) => "Camera",
            SensorConfig::Gyro(_) => "Gyro",
        }
    }
}

/// What a camera tracker reports about the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CameraOutput {
    Orientation,
    Position,
    Pose,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub name: String,
    /// Hz
    pub rate: f64,
    pub output: CameraOutput,
    /// Per-axis position noise, m.
    #[serde(default = "default_position_stddev")]
    pub position_noise_stddev: f64,
    /// Per-axis rotation-vector noise, degrees.
    #[serde(default = "default_orientation_stddev_deg")]
    pub orientation_noise_stddev_deg: f64,
    /// Chance that a frame is lost.
    #[serde(default)]
    pub dropout_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GyroConfig {
    pub name: String,
    pub rate: f64,
    /// Per-axis angular-rate noise, deg/s.
    #[serde(default = "default_gyro_stddev_deg")]
    pub noise_stddev_deg: f64,
}

fn default_position_stddev() -> f64 {
    0.002
}

fn default_orientation_stddev_deg() -> f64 {
    0.5
}

fn default_gyro_stddev_deg() -> f64 {
    0.5
}

fn default_sensors() -> Vec<SensorConfig> {
    vec![
        SensorConfig::Camera(CameraConfig {
            name: "camera".to_string(),
            rate: 30.0,
            output: CameraOutput::Pose,
            position_noise_stddev: default_position_stddev(),
            orientation_noise_stddev_deg: default_orientation_stddev_deg(),
            dropout_probability: 0.0,
        }),
        SensorConfig::Gyro(GyroConfig {
            name: "gyro".to_string(),
            rate: 200.0,
            noise_stddev_deg: default_gyro_stddev_deg(),
        }),
    ]
}

// =========================================================================
// == Loading and Validation ==
// =========================================================================

/// The built-in defaults every scenario file is layered over.
pub fn scenario_figment() -> Figment {
    Figment::from(Serialized::defaults(ScenarioConfig::default()))
}

/// Loads, layers and validates a scenario file.
pub fn load_scenario(path: &Path) -> Result<ScenarioConfig, SimError> {
    if !path.is_file() {
        return Err(SimError::ScenarioNotFound(path.to_path_buf()));
    }
    info!("Loading scenario from: {}", path.display());
    extract_scenario(scenario_figment().merge(Toml::file(path)))
}

pub fn extract_scenario(figment: Figment) -> Result<ScenarioConfig, SimError> {
    let config: ScenarioConfig = figment.extract()?;
    config.validate()?;
    Ok(config)
}

fn positive(name: &str, value: f64) -> Result<(), SimError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidScenario(format!(
            "{name} must be finite and positive, got {value}"
        )))
    }
}

impl ScenarioConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        positive("simulation.duration_seconds", self.simulation.duration_seconds)?;
        positive("simulation.step_hz", self.simulation.step_hz)?;
        positive(
            "simulation.report_interval_seconds",
            self.simulation.report_interval_seconds,
        )?;

        if self.sensors.is_empty() {
            return Err(SimError::InvalidScenario("no sensors configured".to_string()));
        }
        for sensor in &self.sensors {
            let name = sensor.name();
            positive(&format!("sensor '{name}' rate"), sensor.rate())?;
            match sensor {
                SensorConfig::Camera(camera) => {
                    positive(
                        &format!("sensor '{name}' position_noise_stddev"),
                        camera.position_noise_stddev,
                    )?;
                    positive(
                        &format!("sensor '{name}' orientation_noise_stddev_deg"),
                        camera.orientation_noise_stddev_deg,
                    )?;
                    if !(0.0..=1.0).contains(&camera.dropout_probability) {
                        return Err(SimError::InvalidScenario(format!(
                            "sensor '{name}' dropout_probability must lie in [0, 1], got {}",
                            camera.dropout_probability
                        )));
                    }
                }
                SensorConfig::Gyro(gyro) => {
                    positive(&format!("sensor '{name}' noise_stddev_deg"), gyro.noise_stddev_deg)?;
                }
            }
        }

        self.tracker.validate()?;
        Ok(())
    }
}
