//! Forward and inverse kinematics for a single leg.
//!
//! Both are pure functions over [`crate::leg::Leg`]'s fixed geometry; neither
//! stores a reference to the leg, so the pod can call them freely from the
//! swing/stance/revert operations without borrow-checker gymnastics.

use crate::error::{PodError, PodResult};
use crate::geometry::{homogeneous_transform, translation_of, Coordinate, JointTriple};
use crate::leg::Leg;
use nalgebra::Matrix3;

/// Projection for the coxa joint: swings the kinematic chain into the
/// vertical plane (femur/tibia rotate around what was the Y axis).
#[rustfmt::skip]
fn coxa_projection() -> Matrix3<f64> {
    Matrix3::new(
        1.0, 0.0, 0.0,
        0.0, 0.0, -1.0,
        0.0, 1.0, 0.0,
    )
}

/// Recomputes `leg.joints`, `leg.current_angles`, and `leg.effector_target`
/// from `angles` and the leg's fixed offset transform and segment lengths.
pub fn forward_kinematics(leg: &mut Leg, angles: JointTriple) {
    let h_coxa = homogeneous_transform(
        &coxa_projection(),
        angles.coxa.to_radians(),
        leg.segments.coxa,
    );
    let h_femur = homogeneous_transform(
        &Matrix3::identity(),
        angles.femur.to_radians(),
        leg.segments.femur,
    );
    let h_tibia = homogeneous_transform(
        &Matrix3::identity(),
        angles.tibia.to_radians(),
        leg.segments.tibia,
    );

    let m1 = leg.offset_transform * h_coxa;
    let m2 = m1 * h_femur;
    let m3 = m2 * h_tibia;

    leg.joints[Leg::COXA_ORIGIN] = translation_of(&leg.offset_transform);
    leg.joints[Leg::FEMUR_ORIGIN] = translation_of(&m1);
    leg.joints[Leg::TIBIA_ORIGIN] = translation_of(&m2);
    leg.joints[Leg::EFFECTOR] = translation_of(&m3);

    leg.current_angles = angles;
    leg.effector_target = leg.joints[Leg::EFFECTOR];
}

/// Solves for the joint triple that places the end effector at `target`.
/// Fails with [`PodError::Unreachable`] if either `acos` argument is out of
/// domain.
///
/// The caller is responsible for re-running [`forward_kinematics`] with the
/// result to bring `leg.joints` back in sync.
pub fn solve_ik(leg: &Leg, target: Coordinate) -> PodResult<JointTriple> {
    let coxa_origin = leg.joints[Leg::COXA_ORIGIN];
    let femur_origin_z = leg.joints[Leg::FEMUR_ORIGIN].z;

    let dx = target.x - coxa_origin.x;
    let dy = target.y - coxa_origin.y;

    let mut coxa = dy.atan2(dx).to_degrees() + 360.0 - leg.coxa_separation_angle;
    if coxa >= 180.0 {
        coxa -= 360.0;
    }

    let l1 = (dx * dx + dy * dy).sqrt() - leg.segments.coxa;
    let l2 = target.z - femur_origin_z;
    let l = (l1 * l1 + l2 * l2).sqrt();

    let alpha_1 = (l2 / l).acos();
    if alpha_1.is_nan() {
        return Err(PodError::Unreachable(format!(
            "leg {}: target {target:?} too far (alpha_1 undefined)",
            leg.index
        )));
    }

    let femur_len = leg.segments.femur;
    let tibia_len = leg.segments.tibia;

    let alpha_2 = ((tibia_len * tibia_len - femur_len * femur_len - l * l) / (-2.0 * femur_len * l))
        .acos();
    if alpha_2.is_nan() {
        return Err(PodError::Unreachable(format!(
            "leg {}: target {target:?} too far (alpha_2 undefined)",
            leg.index
        )));
    }

    let femur = 90.0 - (alpha_1 + alpha_2).to_degrees();
    let tibia = 180.0
        - ((l * l - femur_len * femur_len - tibia_len * tibia_len) / (-2.0 * tibia_len * femur_len))
            .acos()
            .to_degrees();

    Ok(JointTriple::new(coxa, femur, tibia))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::example_hexapod_1;
    use crate::pod::Pod;
    use approx::assert_relative_eq;

    fn fresh_leg() -> Leg {
        let pod = Pod::new(example_hexapod_1()).unwrap();
        pod.legs[0].clone()
    }

    #[test]
    fn coxa_output_wraps_into_half_open_interval() {
        let leg = fresh_leg();
        // A target almost directly behind the leg's mount forces the wrap branch.
        let target = Coordinate::new(-100.0, -0.001, leg.joints[Leg::FEMUR_ORIGIN].z - 20.0);
        let angles = solve_ik(&leg, target).unwrap();
        assert!(angles.coxa > -180.0 && angles.coxa <= 180.0);
    }

    #[test]
    fn fk_ik_round_trip_reproduces_effector() {
        let mut leg = fresh_leg();
        let start_angles = JointTriple::new(10.0, -30.0, 40.0);
        forward_kinematics(&mut leg, start_angles);
        let effector = leg.joints[Leg::EFFECTOR];

        let solved = solve_ik(&leg, effector).unwrap();
        forward_kinematics(&mut leg, solved);
        let round_tripped = leg.joints[Leg::EFFECTOR];

        assert_relative_eq!(effector.x, round_tripped.x, epsilon = 1e-6);
        assert_relative_eq!(effector.y, round_tripped.y, epsilon = 1e-6);
        assert_relative_eq!(effector.z, round_tripped.z, epsilon = 1e-6);
    }

    #[test]
    fn unreachable_target_fails() {
        let mut leg = fresh_leg();
        leg.segments = crate::geometry::SegmentLengths::new(10.0, 10.0, 10.0);
        let result = solve_ik(&leg, Coordinate::new(1000.0, 0.0, 0.0));
        assert!(matches!(result, Err(PodError::Unreachable(_))));
    }
}
