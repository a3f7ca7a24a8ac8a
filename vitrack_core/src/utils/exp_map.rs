// vitrack_core/src/utils/exp_map.rs

//! The quaternion exponential and logarithm maps.
//!
//! These connect the flat 3-vector tangent space used by all of the Kalman
//! arithmetic with unit quaternions, so orientation can be corrected additively
//! without ever doing linear algebra on quaternion components.
//!
//! `quat_exp` and `quat_ln` are the pure quaternion maps: `quat_exp(v)` has
//! scalar part `cos(|v|)` and therefore describes a rotation by `2|v|`. The
//! filter works in rotation vectors (radians), so it goes through
//! [`rotation_vector_to_quat`] and [`quat_to_rotation_vector`], which carry the
//! factor of two. Keeping the raw maps free of that factor is what lets them
//! round-trip exactly.

use nalgebra::{Quaternion, RealField, UnitQuaternion, Vector3};
use num_traits::Float;

/// Below this vector-part norm, [`quat_ln`] switches to the Taylor expansion.
pub const LN_TAYLOR_THRESHOLD: f64 = 1.0e-4;

/// Cutoff between the Taylor expansion and the direct formula of [`sinc`].
///
/// The fourth root of machine epsilon is the recommended switch-over point
/// (Grassia 1998, "Practical Parameterization of Rotations Using the
/// Exponential Map").
pub trait FourthRootMachineEps: Copy {
    fn fourth_root_machine_eps() -> Self;
}

impl FourthRootMachineEps for f64 {
    fn fourth_root_machine_eps() -> Self {
        1.0e-13
    }
}

impl FourthRootMachineEps for f32 {
    fn fourth_root_machine_eps() -> Self {
        1.0e-6
    }
}

// Conversions from literals always succeed for f32/f64.
fn lit<T: Float>(value: f64) -> T {
    T::from(value).unwrap_or_else(T::nan)
}

/// The un-normalized sinc, `sin(theta) / theta`, with value 1 at 0.
pub fn sinc<T: Float + FourthRootMachineEps>(theta: T) -> T {
    if theta < T::fourth_root_machine_eps() {
        // 1 - theta^2 / 6
        return T::one() - theta * theta / lit(6.0);
    }
    theta.sin() / theta
}

/// Taylor expansion of `theta / sin(theta)` about 0, through the sixth order.
///
/// `1 + θ²/6 + 7θ⁴/360 + 31θ⁶/15120`
pub fn csc_taylor_expansion<T: Float>(theta: T) -> T {
    let theta2 = theta * theta;
    let theta4 = theta2 * theta2;
    let theta6 = theta4 * theta2;
    T::one() + theta2 / lit(6.0) + lit::<T>(7.0) * theta4 / lit(360.0)
        + lit::<T>(31.0) * theta6 / lit(15120.0)
}

/// Quaternion exponential of a pure-vector quaternion.
///
/// Continuous and well defined at `vec == 0` (identity). The result is
/// explicitly re-normalized.
pub fn quat_exp<T>(vec: &Vector3<T>) -> UnitQuaternion<T>
where
    T: RealField + Float + FourthRootMachineEps,
{
    let theta = Float::sqrt(vec.dot(vec));
    let vecscale = sinc(theta);
    let q = Quaternion::from_parts(Float::cos(theta), vec * vecscale);
    UnitQuaternion::new_normalize(q)
}

/// Quaternion logarithm of a unit quaternion; the inverse of [`quat_exp`].
///
/// `phi = atan2(|q.vec|, q.w)` is used instead of `asin`/`acos` because it
/// stays accurate over the whole rotation range. The vector part is scaled by
/// `phi / sin(phi)`, replaced near the identity by its Taylor expansion.
///
/// The result is the plain `(phi / sin(phi)) * q.vec` with no extra factor of
/// one half; under some conventions this reads as off by two.
pub fn quat_ln<T>(quat: &UnitQuaternion<T>) -> Vector3<T>
where
    T: RealField + Float,
{
    let vec = quat.imag();
    let vecnorm = Float::sqrt(vec.dot(&vec));
    let phi = Float::atan2(vecnorm, quat.w);

    let phi_over_sin = if vecnorm < lit(LN_TAYLOR_THRESHOLD) {
        csc_taylor_expansion(phi)
    } else {
        phi / Float::sin(phi)
    };
    vec * phi_over_sin
}

/// `quat_ln` of whichever of `q` / `-q` has a non-negative scalar part.
///
/// Both describe the same rotation; this one is the "short way" round.
pub fn smallest_quat_ln<T>(quat: &UnitQuaternion<T>) -> Vector3<T>
where
    T: RealField + Float,
{
    if quat.w < T::zero() {
        quat_ln(&UnitQuaternion::new_unchecked(-quat.quaternion().clone()))
    } else {
        quat_ln(quat)
    }
}

/// Rotation vector (axis times angle in radians) to unit quaternion.
pub fn rotation_vector_to_quat<T>(rotation: &Vector3<T>) -> UnitQuaternion<T>
where
    T: RealField + Float + FourthRootMachineEps,
{
    quat_exp(&(rotation * lit::<T>(0.5)))
}

/// Unit quaternion to the rotation vector of angle at most pi.
pub fn quat_to_rotation_vector<T>(quat: &UnitQuaternion<T>) -> Vector3<T>
where
    T: RealField + Float,
{
    smallest_quat_ln(quat) * lit::<T>(2.0)
}

/// Rotation vector taking `b` onto `a`: `a = exp(r) * b`.
pub fn rotation_difference(a: &UnitQuaternion<f64>, b: &UnitQuaternion<f64>) -> Vector3<f64> {
    quat_to_rotation_vector(&(a * b.inverse()))
}

/// Angle in radians of the rotation between `a` and `b`, in `[0, pi]`.
///
/// Accurate for tiny angles, where an `acos` of the scalar part is not.
pub fn angular_distance(a: &UnitQuaternion<f64>, b: &UnitQuaternion<f64>) -> f64 {
    rotation_difference(a, b).norm()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_vector_f64(rng: &mut ChaCha8Rng, max_norm: f64) -> Vector3<f64> {
        let axis = Vector3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let axis = if axis.norm() < 1e-3 { Vector3::x() } else { axis.normalize() };
        axis * rng.gen_range(0.0..max_norm)
    }

    fn assert_quat_eq_up_to_sign(a: &UnitQuaternion<f64>, b: &UnitQuaternion<f64>, eps: f64) {
        let dot = a.coords.dot(&b.coords);
        assert!(
            (dot.abs() - 1.0).abs() < eps,
            "quaternions differ: {:?} vs {:?}",
            a.coords,
            b.coords
        );
    }

    #[test]
    fn sinc_is_continuous_across_the_cutoff() {
        let eps = f64::fourth_root_machine_eps();
        assert_abs_diff_eq!(sinc(0.0_f64), 1.0);
        assert_abs_diff_eq!(sinc(eps * 0.999), sinc(eps * 1.001), epsilon = 1e-15);
        assert_abs_diff_eq!(sinc(0.5_f64), 0.5_f64.sin() / 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(sinc(0.0_f32), 1.0_f32);
    }

    #[test]
    fn csc_taylor_expansion_matches_direct_formula_near_zero() {
        for &theta in &[1e-5_f64, 1e-4, 1e-3] {
            assert_abs_diff_eq!(
                csc_taylor_expansion(theta),
                theta / theta.sin(),
                epsilon = 1e-14
            );
        }
    }

    #[test]
    fn exp_of_zero_is_identity() {
        let q = quat_exp(&Vector3::<f64>::zeros());
        assert_abs_diff_eq!(q.w, 1.0);
        assert_abs_diff_eq!(q.imag().norm(), 0.0);

        let q32 = quat_exp(&Vector3::<f32>::zeros());
        assert_abs_diff_eq!(q32.w, 1.0_f32);
    }

    #[test]
    fn exp_converges_to_identity_near_zero() {
        for k in 1..12 {
            let v = Vector3::new(1.0, -2.0, 0.5) * 10f64.powi(-k);
            let q = quat_exp(&v);
            assert!(q.coords.iter().all(|c| c.is_finite()));
            assert!(1.0 - q.w <= v.norm());
            assert_abs_diff_eq!(q.imag().norm(), v.norm().sin(), epsilon = 1e-15);
        }
    }

    #[test]
    fn exp_output_is_unit_norm() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            let v = random_vector_f64(&mut rng, 3.0);
            let q = quat_exp(&v);
            assert_abs_diff_eq!(q.coords.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn ln_of_exp_round_trips_f64() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..500 {
            let v = random_vector_f64(&mut rng, 3.0);
            let back = quat_ln(&quat_exp(&v));
            assert_abs_diff_eq!(back, v, epsilon = 1e-9);
        }
    }

    #[test]
    fn ln_of_exp_round_trips_f32() {
        let mut rng = ChaCha8Rng::seed_from_u64(43);
        for _ in 0..200 {
            let v = random_vector_f64(&mut rng, 2.5);
            let v32 = Vector3::new(v.x as f32, v.y as f32, v.z as f32);
            let back = quat_ln(&quat_exp(&v32));
            assert_abs_diff_eq!(back, v32, epsilon = 1e-5);
        }
    }

    #[test]
    fn exp_of_ln_round_trips_up_to_sign() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..200 {
            let coords = nalgebra::Vector4::<f64>::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            if coords.norm() < 1e-3 {
                continue;
            }
            let q = UnitQuaternion::new_normalize(Quaternion::from(coords));
            assert_quat_eq_up_to_sign(&quat_exp(&quat_ln(&q)), &q, 1e-12);
        }
    }

    #[test]
    fn ln_uses_taylor_branch_continuously() {
        // Straddle the 1e-4 switch-over on the vector norm.
        let below = quat_exp(&Vector3::new(0.999e-4, 0.0, 0.0));
        let above = quat_exp(&Vector3::new(1.001e-4, 0.0, 0.0));
        assert_abs_diff_eq!(quat_ln(&below).x, 0.999e-4, epsilon = 1e-15);
        assert_abs_diff_eq!(quat_ln(&above).x, 1.001e-4, epsilon = 1e-15);
        assert_abs_diff_eq!(quat_ln(&UnitQuaternion::<f64>::identity()), Vector3::zeros());
    }

    #[test]
    fn rotation_vector_helpers_use_full_angles() {
        let r = Vector3::new(0.0, 0.0, 1.2);
        let q = rotation_vector_to_quat(&r);
        let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 1.2);
        assert_quat_eq_up_to_sign(&q, &expected, 1e-12);
        assert_abs_diff_eq!(quat_to_rotation_vector(&q), r, epsilon = 1e-12);
    }

    #[test]
    fn rotation_vector_takes_the_short_way() {
        let q = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.3);
        let flipped = UnitQuaternion::new_unchecked(-q.into_inner());
        assert_abs_diff_eq!(
            quat_to_rotation_vector(&flipped),
            Vector3::new(0.3, 0.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn rotation_difference_composes_on_the_left() {
        let b = UnitQuaternion::from_euler_angles(0.2, -0.4, 1.0);
        let r = Vector3::new(0.05, 0.1, -0.2);
        let a = rotation_vector_to_quat(&r) * b;
        assert_abs_diff_eq!(rotation_difference(&a, &b), r, epsilon = 1e-12);
        assert_abs_diff_eq!(angular_distance(&a, &b), r.norm(), epsilon = 1e-12);
        assert_abs_diff_eq!(angular_distance(&b, &b), 0.0, epsilon = 1e-15);
    }
}
