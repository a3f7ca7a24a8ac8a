// vitrack_sim/src/simulation/utils/serde_helpers.rs

//! `#[serde(with = ...)]` adapters so scenario files can spell vectors as
//! plain arrays and orientations as roll/pitch/yaw in degrees.

pub mod vec3_from_array {
    use nalgebra::Vector3;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(vec: &Vector3<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq([vec.x, vec.y, vec.z].iter())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vector3<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let arr: [f64; 3] = Deserialize::deserialize(deserializer)?;
        Ok(Vector3::from(arr))
    }
}

/// Roll, pitch, yaw in degrees, applied as nalgebra's `from_euler_angles`.
pub mod quat_from_euler_deg {
    use nalgebra::UnitQuaternion;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(quat: &UnitQuaternion<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let (roll, pitch, yaw) = quat.euler_angles();
        let arr = [roll.to_degrees(), pitch.to_degrees(), yaw.to_degrees()];
        serializer.collect_seq(arr.iter())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<UnitQuaternion<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let arr: [f64; 3] = Deserialize::deserialize(deserializer)?;
        Ok(UnitQuaternion::from_euler_angles(
            arr[0].to_radians(),
            arr[1].to_radians(),
            arr[2].to_radians(),
        ))
    }
}

/// A vector given in degrees (per second, usually), stored in radians.
pub mod vec3_deg_to_rad {
    use nalgebra::Vector3;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(vec: &Vector3<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let deg = vec.map(f64::to_degrees);
        serializer.collect_seq(deg.iter())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vector3<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let arr: [f64; 3] = Deserialize::deserialize(deserializer)?;
        Ok(Vector3::from(arr).map(f64::to_radians))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use nalgebra::{UnitQuaternion, Vector3};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "super::vec3_from_array")]
        translation: Vector3<f64>,
        #[serde(with = "super::quat_from_euler_deg")]
        rotation: UnitQuaternion<f64>,
        #[serde(with = "super::vec3_deg_to_rad")]
        rate: Vector3<f64>,
    }

    #[test]
    fn arrays_and_degrees_parse() {
        let sample: Sample = toml::from_str(
            "translation = [1.0, 2.0, 3.0]\n\
             rotation = [0.0, 0.0, 90.0]\n\
             rate = [0.0, 180.0, 0.0]\n",
        )
        .unwrap();
        assert_eq!(sample.translation, Vector3::new(1.0, 2.0, 3.0));
        let expected =
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2);
        assert_abs_diff_eq!(sample.rotation.coords, expected.coords, epsilon = 1e-12);
        assert_abs_diff_eq!(sample.rate.y, std::f64::consts::PI, epsilon = 1e-12);
    }

    #[test]
    fn degrees_survive_a_round_trip_through_toml() {
        let sample = Sample {
            translation: Vector3::new(0.5, -0.5, 0.0),
            rotation: UnitQuaternion::from_euler_angles(0.1, -0.2, 0.3),
            rate: Vector3::new(0.0, 0.0, 1.0),
        };
        let text = toml::to_string(&sample).unwrap();
        let parsed: Sample = toml::from_str(&text).unwrap();
        assert_abs_diff_eq!(parsed.rotation.coords, sample.rotation.coords, epsilon = 1e-12);
        assert_abs_diff_eq!(parsed.rate, sample.rate, epsilon = 1e-12);
    }
}
