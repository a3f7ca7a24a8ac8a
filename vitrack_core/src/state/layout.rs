// vitrack_core/src/state/layout.rs

use std::ops::Range;

/// Dimension of the full pose-and-velocity error state.
pub const POSE_STATE_DIM: usize = 12;

/// Dimension of the pose block (position + rotation) at the head of the state.
pub const POSE_DIM: usize = 6;

/// Tangent-space layout of [`PoseState`](super::PoseState).
///
/// - Position (3), world frame: indices 0-2
/// - Rotation vector (3), world frame, applied on the left: indices 3-5
/// - Linear velocity (3), world frame: indices 6-8
/// - Angular velocity (3), world frame: indices 9-11
pub const POSITION: Range<usize> = 0..3;
pub const ROTATION: Range<usize> = 3..6;
pub const VELOCITY: Range<usize> = 6..9;
pub const ANGULAR_VELOCITY: Range<usize> = 9..12;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_tile_the_state() {
        let blocks = [POSITION, ROTATION, VELOCITY, ANGULAR_VELOCITY];
        let mut next = 0;
        for block in blocks {
            assert_eq!(block.start, next);
            assert_eq!(block.len(), 3);
            next = block.end;
        }
        assert_eq!(next, POSE_STATE_DIM);
        assert_eq!(ROTATION.end, POSE_DIM);
    }
}
