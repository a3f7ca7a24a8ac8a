// vitrack_core/src/types.rs

use nalgebra::{DMatrix, DVector};

// --- Core Type Aliases ---
/// A flat tangent-space vector: sigma offsets, corrections, innovations.
pub type TangentVector = DVector<f64>;
pub type Covariance = DMatrix<f64>;

// --- Core Identifiers ---
/// Identifies one tracked body (a headset, a controller).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct BodyHandle(pub u64);

/// Identifies the sensor a measurement came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct SensorHandle(pub u64);

impl std::fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

impl std::fmt::Display for SensorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sensor#{}", self.0)
    }
}
