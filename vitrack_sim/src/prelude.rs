// vitrack_sim/src/prelude.rs

// Re-export the entire vitrack_core prelude so you can easily access
// pure types like `PoseState`, `BodyTracker`, `MeasurementModel`, etc.
pub use vitrack_core::prelude::*;

pub use crate::error::SimError;
pub use crate::simulation::config::{
    BodyConfig, CameraConfig, CameraOutput, GyroConfig, Pose, ScenarioConfig, SensorConfig,
    Simulation,
};
pub use crate::simulation::prng::SimulationRng;
pub use crate::simulation::runner::{RunSummary, SimulationRunner};
pub use crate::simulation::state_error::{ErrorStats, PoseError};
pub use crate::simulation::truth::{GroundTruth, GroundTruthState};
