// vitrack_sim/src/simulation/truth.rs

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use vitrack_core::utils::exp_map::rotation_vector_to_quat;

use crate::simulation::config::BodyConfig;

/// The true state of the body at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundTruthState {
    pub pose: Isometry3<f64>,
    pub linear_velocity: Vector3<f64>,
    pub angular_velocity: Vector3<f64>,
}

/// Constant-twist motion: straight-line translation and a steady spin about a
/// fixed world axis, both from the configured start pose at `t = 0`.
#[derive(Debug, Clone)]
pub struct GroundTruth {
    start_position: Vector3<f64>,
    start_rotation: UnitQuaternion<f64>,
    linear_velocity: Vector3<f64>,
    angular_velocity: Vector3<f64>,
}

impl GroundTruth {
    pub fn new(body: &BodyConfig) -> Self {
        Self {
            start_position: body.start.translation,
            start_rotation: body.start.rotation,
            linear_velocity: body.linear_velocity,
            angular_velocity: body.angular_velocity,
        }
    }

    pub fn at(&self, t: f64) -> GroundTruthState {
        let position = self.start_position + self.linear_velocity * t;
        let rotation = rotation_vector_to_quat(&(self.angular_velocity * t)) * self.start_rotation;
        GroundTruthState {
            pose: Isometry3::from_parts(Translation3::from(position), rotation),
            linear_velocity: self.linear_velocity,
            angular_velocity: self.angular_velocity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use vitrack_core::utils::exp_map::angular_distance;

    #[test]
    fn start_pose_holds_at_time_zero() {
        let body = BodyConfig::default();
        let truth = GroundTruth::new(&body).at(0.0);
        assert_eq!(truth.pose.translation.vector, body.start.translation);
        assert_abs_diff_eq!(
            angular_distance(&truth.pose.rotation, &body.start.rotation),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn spin_accumulates_about_the_world_axis() {
        let body = BodyConfig {
            angular_velocity: Vector3::new(0.0, 0.0, 0.5),
            linear_velocity: Vector3::new(1.0, 0.0, 0.0),
            ..BodyConfig::default()
        };
        let truth = GroundTruth::new(&body).at(2.0);
        assert_abs_diff_eq!(
            truth.pose.translation.vector,
            Vector3::new(2.0, 0.0, 0.0),
            epsilon = 1e-15
        );
        let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 1.0);
        assert_abs_diff_eq!(
            angular_distance(&truth.pose.rotation, &expected),
            0.0,
            epsilon = 1e-12
        );
    }
}
