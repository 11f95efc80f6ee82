//! Coordinate and joint-angle value types, plus the homogeneous transform
//! builder (§4.1) shared by forward and inverse kinematics.

use nalgebra::{Matrix3, Matrix4, Point3};
use serde::{Deserialize, Serialize};

/// A point in the pod's base reference frame.
pub type Coordinate = Point3<f64>;

/// A per-joint angle triple, in degrees.
///
/// Also used to describe a leg's rest/neutral angles in [`crate::body::BodyDefinition`].
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy, Default)]
pub struct JointTriple {
    pub coxa: f64,
    pub femur: f64,
    pub tibia: f64,
}

impl JointTriple {
    pub fn new(coxa: f64, femur: f64, tibia: f64) -> Self {
        JointTriple { coxa, femur, tibia }
    }

    pub fn zero() -> Self {
        JointTriple::new(0.0, 0.0, 0.0)
    }
}

/// Lengths of the three leg segments, coxa -> femur -> tibia.
///
/// All three must be positive; the sum of the three bounds the reach of the
/// inverse kinematics solver (see [`crate::kinematics::solve_ik`]).
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy)]
pub struct SegmentLengths {
    pub coxa: f64,
    pub femur: f64,
    pub tibia: f64,
}

impl SegmentLengths {
    pub fn new(coxa: f64, femur: f64, tibia: f64) -> Self {
        SegmentLengths { coxa, femur, tibia }
    }
}

/// Builds the 4x4 homogeneous transform `H` for one joint: rotation block
/// `Rz(theta) * projection`, translation column `(L cos(theta), L sin(theta), 0, 1)`.
///
/// `theta` is in radians. `projection` re-orients the joint's swing plane
/// (identity for femur/tibia, a Y/Z swap for coxa, per §4.2).
pub fn homogeneous_transform(projection: &Matrix3<f64>, theta: f64, length: f64) -> Matrix4<f64> {
    let rotation_z = Matrix3::new(
        theta.cos(),
        -theta.sin(),
        0.0,
        theta.sin(),
        theta.cos(),
        0.0,
        0.0,
        0.0,
        1.0,
    );
    let rotation = rotation_z * projection;
    let translation = [length * theta.cos(), length * theta.sin(), 0.0];

    #[rustfmt::skip]
    let h = Matrix4::new(
        rotation[(0, 0)], rotation[(0, 1)], rotation[(0, 2)], translation[0],
        rotation[(1, 0)], rotation[(1, 1)], rotation[(1, 2)], translation[1],
        rotation[(2, 0)], rotation[(2, 1)], rotation[(2, 2)], translation[2],
        0.0, 0.0, 0.0, 1.0,
    );
    h
}

/// Extracts the translation column of a 4x4 transform as a [`Coordinate`].
pub fn translation_of(h: &Matrix4<f64>) -> Coordinate {
    Coordinate::new(h[(0, 3)], h[(1, 3)], h[(2, 3)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_projection_matches_planar_rotation() {
        let identity = Matrix3::identity();
        let h = homogeneous_transform(&identity, std::f64::consts::FRAC_PI_2, 10.0);
        let translation = translation_of(&h);
        assert_relative_eq!(translation.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(translation.y, 10.0, epsilon = 1e-9);
        assert_relative_eq!(translation.z, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_angle_places_translation_on_the_x_axis() {
        let identity = Matrix3::identity();
        let h = homogeneous_transform(&identity, 0.0, 42.0);
        let translation = translation_of(&h);
        assert_relative_eq!(translation.x, 42.0, epsilon = 1e-9);
        assert_relative_eq!(translation.y, 0.0, epsilon = 1e-9);
    }
}
