//! Per-leg kinematic state: joints, interpolation tables, and the phase
//! indices that [`crate::pod::Pod`] drives every tick.

use crate::error::PodResult;
use crate::geometry::{Coordinate, JointTriple, SegmentLengths};
use crate::kinematics::{forward_kinematics, solve_ik};
use nalgebra::Matrix4;

/// Number of discrete samples in a swing/stance/revert interpolation table.
/// Kept odd so the midpoint index exists for [`Leg::reset_interpolator`].
pub const INTERPOLATION_STEPS: usize = 21;

/// Direction of travel: `Forward` advances swing/gait indices upward,
/// `Reverse` downward.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    fn signum(self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }

    pub fn reversed(self) -> Direction {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

/// One leg's kinematic chain, owned exclusively by the pod and mutated only
/// through these operations or the free-function FK/IK in
/// [`crate::kinematics`].
#[derive(Debug, Clone)]
pub struct Leg {
    pub index: usize,
    pub coxa_separation_angle: f64,
    pub offset_transform: Matrix4<f64>,
    pub segments: SegmentLengths,
    /// `[coxa_origin, femur_origin, tibia_origin, effector]`, in the base
    /// reference frame.
    pub joints: [Coordinate; 4],
    pub effector_target: Coordinate,
    /// `[coxa, femur, tibia]` interpolation tables, `INTERPOLATION_STEPS`
    /// columns each.
    pub intermediate_angles: [[f64; INTERPOLATION_STEPS]; 3],
    pub intermediate_effector_coords: [Coordinate; INTERPOLATION_STEPS],
    pub current_angles: JointTriple,
    pub swing_index: i64,
    pub stance_index: f64,
    pub neutral_effector: Coordinate,
    pub is_reverting: bool,
    pub revert_index: usize,
}

impl Leg {
    pub const COXA_ORIGIN: usize = 0;
    pub const FEMUR_ORIGIN: usize = 1;
    pub const TIBIA_ORIGIN: usize = 2;
    pub const EFFECTOR: usize = 3;

    pub fn new(
        index: usize,
        coxa_separation_angle: f64,
        offset_transform: Matrix4<f64>,
        segments: SegmentLengths,
        rest_angles: JointTriple,
    ) -> Self {
        let mut leg = Leg {
            index,
            coxa_separation_angle,
            offset_transform,
            segments,
            joints: [Coordinate::origin(); 4],
            effector_target: Coordinate::origin(),
            intermediate_angles: [[0.0; INTERPOLATION_STEPS]; 3],
            intermediate_effector_coords: [Coordinate::origin(); INTERPOLATION_STEPS],
            current_angles: JointTriple::zero(),
            swing_index: (INTERPOLATION_STEPS as i64 - 1) / 2,
            stance_index: (INTERPOLATION_STEPS as f64 - 1.0) / 2.0,
            neutral_effector: Coordinate::origin(),
            is_reverting: false,
            revert_index: 0,
        };
        forward_kinematics(&mut leg, rest_angles);
        leg.neutral_effector = leg.joints[Leg::EFFECTOR];
        leg
    }

    fn lifted_target(&self, lift: f64, phase_numerator: f64) -> Coordinate {
        let effector = self.joints[Leg::EFFECTOR];
        let phase_step = std::f64::consts::PI / (INTERPOLATION_STEPS as f64 - 1.0);
        let z_drop = lift * (phase_step * phase_numerator).sin();
        Coordinate::new(effector.x, effector.y, effector.z - z_drop)
    }

    /// Advances the swing interpolation index by one step, tracing a lifted
    /// arc (peak height `z_lift`) over the table's Cartesian targets.
    /// Returns `true` exactly when the swing phase has completed and wrapped.
    pub fn update_swing(&mut self, direction: Direction, z_lift: f64) -> PodResult<bool> {
        let index = self.swing_index as usize;
        let angles = JointTriple::new(
            self.intermediate_angles[0][index],
            self.intermediate_angles[1][index],
            self.intermediate_angles[2][index],
        );
        forward_kinematics(self, angles);

        let lifted = self.lifted_target(z_lift, self.swing_index as f64);
        let solved = solve_ik(self, lifted)?;
        forward_kinematics(self, solved);

        self.swing_index += direction.signum();

        let steps = INTERPOLATION_STEPS as i64;
        match direction {
            Direction::Forward if self.swing_index > steps - 1 => {
                self.swing_index = 0;
                self.stance_index = (steps - 1) as f64;
                Ok(true)
            }
            Direction::Reverse if self.swing_index < 0 => {
                self.swing_index = steps - 1;
                self.stance_index = 0.0;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Advances the stance interpolation index by `stance_return_factor`,
    /// grounded (no lift applied).
    pub fn update_stance(&mut self, direction: Direction, stance_return_factor: f64) {
        let index = self.stance_index.floor() as usize;
        let angles = JointTriple::new(
            self.intermediate_angles[0][index],
            self.intermediate_angles[1][index],
            self.intermediate_angles[2][index],
        );
        forward_kinematics(self, angles);

        self.stance_index -= direction.signum() as f64 * stance_return_factor;

        let steps = INTERPOLATION_STEPS as f64;
        match direction {
            Direction::Forward if self.stance_index < 0.0 => {
                self.stance_index = steps - 1.0;
                self.swing_index = 0;
            }
            Direction::Reverse if self.stance_index > steps - 1.0 => {
                self.stance_index = 0.0;
                self.swing_index = INTERPOLATION_STEPS as i64 - 1;
            }
            _ => {}
        }
    }

    /// Fills the interpolation tables with a straight-line Cartesian path
    /// from the current effector position to [`Leg::neutral_effector`],
    /// ready to be driven by [`Leg::update_revert_phase0`] /
    /// [`Leg::update_revert_phase1`].
    pub fn revert_to_neutral(&mut self) -> PodResult<()> {
        let start = self.joints[Leg::EFFECTOR];
        let target = self.neutral_effector;
        let steps = INTERPOLATION_STEPS as f64 - 1.0;
        let step = Coordinate::new(
            (target.x - start.x) / steps,
            (target.y - start.y) / steps,
            (target.z - start.z) / steps,
        );

        for i in 0..INTERPOLATION_STEPS {
            let sample = Coordinate::new(
                start.x + step.x * i as f64,
                start.y + step.y * i as f64,
                start.z + step.z * i as f64,
            );
            let angles = solve_ik(self, sample)?;
            self.intermediate_angles[0][i] = angles.coxa;
            self.intermediate_angles[1][i] = angles.femur;
            self.intermediate_angles[2][i] = angles.tibia;
            self.intermediate_effector_coords[i] = sample;
        }
        Ok(())
    }

    /// Grounds the leg at `pod_z_height` from the current revert table
    /// column, without advancing the index.
    pub fn update_revert_phase0(&mut self, pod_z_height: f64) -> PodResult<()> {
        let index = self.revert_index;
        let angles = JointTriple::new(
            self.intermediate_angles[0][index],
            self.intermediate_angles[1][index],
            self.intermediate_angles[2][index],
        );
        forward_kinematics(self, angles);

        let effector = self.joints[Leg::EFFECTOR];
        let grounded = Coordinate::new(effector.x, effector.y, pod_z_height);
        let solved = solve_ik(self, grounded)?;
        forward_kinematics(self, solved);
        Ok(())
    }

    /// Like [`Leg::update_swing`] but forward-only and lifted by
    /// `revert_lift`. Returns the next leg index the pod should drive:
    /// `self.index` while still reverting, `self.index + 1` once this leg's
    /// revert table is exhausted.
    pub fn update_revert_phase1(&mut self, revert_lift: f64) -> PodResult<usize> {
        let index = self.revert_index;
        let angles = JointTriple::new(
            self.intermediate_angles[0][index],
            self.intermediate_angles[1][index],
            self.intermediate_angles[2][index],
        );
        forward_kinematics(self, angles);

        self.revert_index += 1;

        if self.revert_index >= INTERPOLATION_STEPS {
            self.is_reverting = false;
            self.revert_index = 0;
            return Ok(self.index + 1);
        }

        let lifted = self.lifted_target(revert_lift, self.revert_index as f64);
        let solved = solve_ik(self, lifted)?;
        forward_kinematics(self, solved);

        Ok(self.index)
    }

    /// Resets both swing and stance indices to the midpoint of their
    /// interpolation tables, so swing and stance stay in phase.
    pub fn reset_interpolator(&mut self) {
        self.swing_index = (INTERPOLATION_STEPS as i64 - 1) / 2;
        self.stance_index = self.swing_index as f64;
    }

    /// Sets all joint angles to zero (fully extended leg).
    pub fn zero(&mut self) {
        forward_kinematics(self, JointTriple::zero());
    }

    /// Anchors the end effector to Z height `height` at its current XY.
    pub fn ground(&mut self, height: f64) -> PodResult<()> {
        let effector = self.joints[Leg::EFFECTOR];
        let target = Coordinate::new(effector.x, effector.y, height);
        let angles = solve_ik(self, target)?;
        forward_kinematics(self, angles);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::example_hexapod_1;
    use crate::pod::Pod;
    use approx::assert_relative_eq;

    #[test]
    fn reset_interpolator_synchronizes_swing_and_stance() {
        let mut pod = Pod::new(example_hexapod_1()).unwrap();
        let leg = &mut pod.legs[0];
        leg.swing_index = 3;
        leg.stance_index = 17.0;
        leg.reset_interpolator();
        assert_eq!(leg.swing_index, (INTERPOLATION_STEPS as i64 - 1) / 2);
        assert_relative_eq!(leg.stance_index, leg.swing_index as f64);
    }

    #[test]
    fn zero_extends_leg_fully() {
        let mut pod = Pod::new(example_hexapod_1()).unwrap();
        let leg = &mut pod.legs[0];
        leg.zero();
        assert_relative_eq!(leg.current_angles.coxa, 0.0);
        assert_relative_eq!(leg.current_angles.femur, 0.0);
        assert_relative_eq!(leg.current_angles.tibia, 0.0);
    }

    #[test]
    fn ground_sets_effector_z() {
        let mut pod = Pod::new(example_hexapod_1()).unwrap();
        let leg = &mut pod.legs[0];
        leg.ground(-42.0).unwrap();
        assert_relative_eq!(leg.joints[Leg::EFFECTOR].z, -42.0, epsilon = 1e-9);
    }
}
