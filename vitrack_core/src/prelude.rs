// vitrack_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::estimation::StateEstimator;
pub use crate::models::measurement::MeasurementModel;
pub use crate::models::process::ProcessModel;
pub use crate::state::FilterState;

// --- Core Data Structures (The "nouns" of the library) ---
pub use crate::config::{ProcessModelConfig, TrackerConfig};
pub use crate::error::FilterError;
pub use crate::messages::{MeasurementData, MeasurementMessage, ModuleInput, PoseEstimate};
pub use crate::state::PoseState;
pub use crate::types::{BodyHandle, SensorHandle};

// --- Estimation Algorithms ---
pub use crate::estimation::{
    begin_correction, begin_correction_with, predict, BodyTracker, CorrectionOutcome, UkfParams,
    UnscentedCorrection,
};

// --- Concrete Model Implementations ---
pub use crate::models::measurement::{
    AbsoluteOrientationMeasurement, AbsolutePoseMeasurement, AbsolutePositionMeasurement,
    AngularVelocityMeasurement,
};
pub use crate::models::process::{ConstantVelocityProcessModel, DampedConstantVelocityProcessModel};

// --- Rotation helpers ---
pub use crate::utils::exp_map::{
    quat_exp, quat_ln, quat_to_rotation_vector, rotation_vector_to_quat,
};
