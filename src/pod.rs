//! The pod: owns all legs, the active gait, the direction of travel, and the
//! revert-to-neutral state machine. Drives legs one tick at a time (§4.5).

use crate::body::BodyDefinition;
use crate::config::EngineConfig;
use crate::gait::build_gait;
use crate::error::{PodError, PodResult};
use crate::geometry::{Coordinate, JointTriple};
use crate::kinematics::solve_ik;
use crate::leg::{Direction, Leg, INTERPOLATION_STEPS};
use crate::recorder::MotionPrimitive;
use nalgebra::Matrix4;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A bounded, drop-on-full producer/single-consumer string queue (§9). Never
/// blocks the update loop: a full sink silently discards the newest message.
#[derive(Clone)]
pub struct DebugSink {
    inner: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl DebugSink {
    pub fn new(capacity: usize) -> Self {
        DebugSink {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn push(&self, message: impl Into<String>) {
        let mut queue = self.inner.lock().expect("debug sink mutex poisoned");
        if queue.len() >= self.capacity {
            return;
        }
        queue.push_back(message.into());
    }

    pub fn drain(&self) -> Vec<String> {
        let mut queue = self.inner.lock().expect("debug sink mutex poisoned");
        queue.drain(..).collect()
    }
}

impl Default for DebugSink {
    fn default() -> Self {
        DebugSink::new(256)
    }
}

/// Two-phase state machine driving the return to a neutral stance (§4.5).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RevertPhase {
    Ground,
    MoveToNeutral,
}

/// Owns all legs, the body definition, and the per-tick scheduling state.
pub struct Pod {
    pub legs: Vec<Leg>,
    pub body: BodyDefinition,
    pub config: EngineConfig,
    pub has_defined_stride: bool,
    pub is_walking: bool,
    target_gait_cycles: i64,
    current_gait_cycle: i64,
    current_gait_index: i64,
    pub is_reverting: bool,
    reverting_leg_index: usize,
    revert_phase: RevertPhase,
    pub direction: Direction,
    tick: u64,
    is_recording: bool,
    pub motion_primitive: MotionPrimitive,
    /// Distance from the base reference frame's Z to the end effector Z in
    /// the neutral stance. Captured from leg 0 at construction, per §9.
    pub pod_z_height: f64,
    pub debug_sink: DebugSink,
}

fn offset_transform(coxa_angle_deg: f64, anchor: Coordinate) -> Matrix4<f64> {
    let theta = coxa_angle_deg.to_radians();
    #[rustfmt::skip]
    let transform = Matrix4::new(
        theta.cos(), -theta.sin(), 0.0, anchor.x,
        theta.sin(), theta.cos(), 0.0, anchor.y,
        0.0, 0.0, 1.0, anchor.z,
        0.0, 0.0, 0.0, 1.0,
    );
    transform
}

impl Pod {
    pub fn new(body: BodyDefinition) -> PodResult<Self> {
        Self::with_config(body, EngineConfig::default())
    }

    pub fn with_config(body: BodyDefinition, config: EngineConfig) -> PodResult<Self> {
        let legs = Self::build_legs(&body);
        let pod_z_height = legs[0].joints[Leg::EFFECTOR].z;
        Ok(Pod {
            legs,
            body,
            config,
            has_defined_stride: false,
            is_walking: false,
            target_gait_cycles: 0,
            current_gait_cycle: 0,
            current_gait_index: 0,
            is_reverting: false,
            reverting_leg_index: 0,
            revert_phase: RevertPhase::Ground,
            direction: Direction::Forward,
            tick: 0,
            is_recording: false,
            motion_primitive: MotionPrimitive::default(),
            pod_z_height,
            debug_sink: DebugSink::default(),
        })
    }

    fn build_legs(body: &BodyDefinition) -> Vec<Leg> {
        (0..body.num_legs)
            .map(|i| {
                let transform = offset_transform(body.coxa_angles[i], body.coxa_coordinates[i]);
                Leg::new(
                    i,
                    body.coxa_angles[i],
                    transform,
                    body.segments[i],
                    body.rest_angles[i],
                )
            })
            .collect()
    }

    /// Rebuilds every leg in place from the current `body` definition. Called
    /// after any of the typed setters below mutate `body`.
    fn rebuild_legs(&mut self) {
        self.legs = Self::build_legs(&self.body);
    }

    pub fn load_body_definition(&mut self, body: BodyDefinition) {
        self.body = body;
        self.direction = Direction::Forward;
        self.motion_primitive = MotionPrimitive::default();
        self.rebuild_legs();
        self.pod_z_height = self.legs[0].joints[Leg::EFFECTOR].z;
    }

    fn check_leg_index(&self, leg_index: usize) -> PodResult<()> {
        if leg_index >= self.body.num_legs {
            return Err(PodError::InvalidArgument(format!(
                "leg {leg_index} out of range for a {}-legged body",
                self.body.num_legs
            )));
        }
        Ok(())
    }

    pub fn set_coxa_length(&mut self, leg_index: usize, length: f64) -> PodResult<()> {
        self.check_leg_index(leg_index)?;
        self.body.segments[leg_index].coxa = length;
        self.rebuild_legs();
        Ok(())
    }

    pub fn set_femur_length(&mut self, leg_index: usize, length: f64) -> PodResult<()> {
        self.check_leg_index(leg_index)?;
        self.body.segments[leg_index].femur = length;
        self.rebuild_legs();
        Ok(())
    }

    pub fn set_tibia_length(&mut self, leg_index: usize, length: f64) -> PodResult<()> {
        self.check_leg_index(leg_index)?;
        self.body.segments[leg_index].tibia = length;
        self.rebuild_legs();
        Ok(())
    }

    pub fn set_coxa_rest_angle(&mut self, leg_index: usize, angle: f64) -> PodResult<()> {
        self.check_leg_index(leg_index)?;
        self.body.rest_angles[leg_index].coxa = angle;
        self.rebuild_legs();
        Ok(())
    }

    pub fn set_femur_rest_angle(&mut self, leg_index: usize, angle: f64) -> PodResult<()> {
        self.check_leg_index(leg_index)?;
        self.body.rest_angles[leg_index].femur = angle;
        self.rebuild_legs();
        Ok(())
    }

    pub fn set_tibia_rest_angle(&mut self, leg_index: usize, angle: f64) -> PodResult<()> {
        self.check_leg_index(leg_index)?;
        self.body.rest_angles[leg_index].tibia = angle;
        self.rebuild_legs();
        Ok(())
    }

    /// Replaces the active gait for the pod's leg count. Does not touch leg
    /// geometry, so it takes effect at the next gait-index boundary without a
    /// leg rebuild.
    pub fn set_gait(&mut self, gait_type: crate::gait::GaitType) -> PodResult<()> {
        self.body.gait = build_gait(self.body.num_legs, gait_type)?;
        self.current_gait_index = 0;
        Ok(())
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn current_gait_cycle(&self) -> i64 {
        self.current_gait_cycle
    }

    pub fn current_gait_index(&self) -> i64 {
        self.current_gait_index
    }

    pub fn reset_ticks(&mut self) {
        self.tick = 0;
    }

    pub fn reverse_direction(&mut self) {
        self.direction = self.direction.reversed();
    }

    pub fn add_target_gait_cycles(&mut self, n: i64) {
        self.target_gait_cycles += n;
    }

    pub fn reset_interpolator(&mut self) {
        for leg in &mut self.legs {
            leg.reset_interpolator();
        }
    }

    pub fn is_swing_phase(&self, leg_index: usize) -> bool {
        self.body.gait.is_swing_phase(leg_index, self.current_gait_index)
    }

    pub fn end_effector_positions(&self) -> Vec<Coordinate> {
        self.legs.iter().map(|leg| leg.joints[Leg::EFFECTOR]).collect()
    }

    /// Samples a straight Cartesian path of `INTERPOLATION_STEPS` points from
    /// `(ee.x - dx, ee.y - dy)` to `(ee.x + dx, ee.y + dy)` at `pod_z_height`,
    /// solving IK at each sample and filling the leg's interpolation tables.
    pub fn set_stride_vector(&mut self, nrepeats: i64, dx: f64, dy: f64) -> PodResult<()> {
        self.target_gait_cycles = nrepeats;

        for leg in &mut self.legs {
            let effector = leg.joints[Leg::EFFECTOR];
            let x_min = effector.x - dx;
            let y_min = effector.y - dy;
            let x_step = (2.0 * dx) / (INTERPOLATION_STEPS as f64 - 1.0);
            let y_step = (2.0 * dy) / (INTERPOLATION_STEPS as f64 - 1.0);

            let mut delta_x = 0.0;
            let mut delta_y = 0.0;
            for i in 0..INTERPOLATION_STEPS {
                let target = Coordinate::new(x_min + delta_x, y_min + delta_y, self.pod_z_height);
                let angles = solve_ik(leg, target)?;
                leg.intermediate_angles[0][i] = angles.coxa;
                leg.intermediate_angles[1][i] = angles.femur;
                leg.intermediate_angles[2][i] = angles.tibia;
                leg.intermediate_effector_coords[i] =
                    Coordinate::new(x_min + delta_x, y_min + delta_y, 0.0);

                delta_x += x_step;
                delta_y += y_step;
            }
        }

        self.has_defined_stride = true;
        Ok(())
    }

    /// Like [`Pod::set_stride_vector`] but the end effector follows a
    /// circular arc of `degrees` (see §4.5/§9: the `degrees * pi / 360` and
    /// half-offset scaling are preserved verbatim from the reference).
    pub fn set_rotation(&mut self, nrepeats: i64, degrees: f64) -> PodResult<()> {
        self.target_gait_cycles = nrepeats;

        for leg in &mut self.legs {
            let effector = leg.joints[Leg::EFFECTOR];
            let radius = (effector.x * effector.x + effector.y * effector.y).sqrt();
            let step_radians = (degrees * std::f64::consts::PI / 360.0) / (INTERPOLATION_STEPS as f64 - 1.0);
            let angle = effector.y.atan2(effector.x) - 0.5 * degrees * std::f64::consts::PI / 360.0;

            let mut delta = 0.0;
            for i in 0..INTERPOLATION_STEPS {
                let x = radius * (angle + delta).cos();
                let y = radius * (angle + delta).sin();
                let target = Coordinate::new(x, y, self.pod_z_height);
                let angles = solve_ik(leg, target)?;
                leg.intermediate_angles[0][i] = angles.coxa;
                leg.intermediate_angles[1][i] = angles.femur;
                leg.intermediate_angles[2][i] = angles.tibia;
                leg.intermediate_effector_coords[i] = Coordinate::new(x, y, 0.0);

                delta += step_radians;
            }
        }

        self.has_defined_stride = true;
        Ok(())
    }

    pub fn start(&mut self) -> PodResult<()> {
        if !self.has_defined_stride {
            return Err(PodError::NotConfigured(
                "no target / stride has been defined".to_owned(),
            ));
        }
        self.is_walking = true;
        Ok(())
    }

    pub fn stop(&mut self) {
        self.target_gait_cycles = self.current_gait_cycle;
        self.current_gait_index = 0;
    }

    pub fn zero(&mut self) {
        for leg in &mut self.legs {
            leg.zero();
        }
    }

    pub fn ground(&mut self, height: f64) -> PodResult<()> {
        for leg in &mut self.legs {
            leg.ground(height)?;
        }
        Ok(())
    }

    pub fn clear_primitives(&mut self) {
        self.motion_primitive.clear();
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn start_recording(&mut self) {
        self.is_recording = true;
    }

    /// Stops recording and clears the buffered motion primitive (§3: the
    /// primitive is "cleared on record off", not on the next record-on).
    pub fn stop_recording(&mut self) {
        self.is_recording = false;
        self.motion_primitive.clear();
    }

    /// Begins the revert-to-neutral state machine (§4.5): each leg computes
    /// its straight-line path home, then `update` drives them through the
    /// two revert phases.
    pub fn revert_to_neutral(&mut self) -> PodResult<()> {
        if self.has_defined_stride {
            self.is_reverting = true;
            self.is_walking = false;
        }
        for leg in &mut self.legs {
            leg.revert_to_neutral()?;
        }
        Ok(())
    }

    /// One full swing/stance advance for every leg, then gait-index/cycle
    /// bookkeeping (§4.5 `updateMovement`).
    fn update_movement(&mut self) {
        let mut end_of_swing = false;
        let direction = self.direction;
        let stance_factor = self.body.gait.stance_return_speed_factor;

        for i in 0..self.legs.len() {
            if self.body.gait.is_swing_phase(i, self.current_gait_index) {
                match self.legs[i].update_swing(direction, self.config.z_lift) {
                    Ok(wrapped) => end_of_swing = end_of_swing || wrapped,
                    Err(error) => {
                        tracing::warn!(leg = i, tick = self.tick, %error, "swing IK failed");
                        self.debug_sink
                            .push(format!("leg {i} swing IK failed: {error}"));
                    }
                }
            } else {
                self.legs[i].update_stance(direction, stance_factor);
            }
        }

        if end_of_swing {
            match direction {
                Direction::Forward => self.current_gait_index += 1,
                Direction::Reverse => self.current_gait_index -= 1,
            }
        }

        self.tick += 1;

        let num_indices = self.body.gait.num_indices_in_pattern as i64;
        let wrapped = match direction {
            Direction::Forward => self.current_gait_index >= num_indices,
            Direction::Reverse => self.current_gait_index < 0,
        };
        if wrapped {
            self.current_gait_index = self.current_gait_index.rem_euclid(num_indices);
            self.current_gait_cycle += 1;
            if self.target_gait_cycles != 0 && self.current_gait_cycle > self.target_gait_cycles {
                self.is_walking = false;
            }
        }

        if self.is_recording {
            for leg in &self.legs {
                self.motion_primitive.add(leg.current_angles);
            }
        }
    }

    /// Drives the two-phase revert state machine one step (§4.5
    /// `updateRevertingToNeutral`).
    fn update_reverting_to_neutral(&mut self) {
        if !self.is_reverting {
            return;
        }

        if self.reverting_leg_index >= self.legs.len() {
            self.is_reverting = false;
            self.reverting_leg_index = 0;
            self.has_defined_stride = false;
            self.revert_phase = RevertPhase::Ground;
            return;
        }

        match self.revert_phase {
            RevertPhase::Ground => {
                for i in 0..self.legs.len() {
                    if let Err(error) = self.legs[i].update_revert_phase0(self.pod_z_height) {
                        tracing::warn!(leg = i, %error, "revert grounding IK failed");
                        self.debug_sink
                            .push(format!("leg {i} revert grounding IK failed: {error}"));
                    } else if self.is_recording {
                        self.motion_primitive.add(self.legs[i].current_angles);
                    }
                }
                self.revert_phase = RevertPhase::MoveToNeutral;
            }
            RevertPhase::MoveToNeutral => {
                let leg_index = self.reverting_leg_index;
                match self.legs[leg_index].update_revert_phase1(self.config.revert_lift) {
                    Ok(next) => self.reverting_leg_index = next,
                    Err(error) => {
                        tracing::warn!(leg = leg_index, %error, "revert IK failed");
                        self.debug_sink
                            .push(format!("leg {leg_index} revert IK failed: {error}"));
                        self.reverting_leg_index += 1;
                    }
                }
                if self.is_recording {
                    for leg in &self.legs {
                        self.motion_primitive.add(leg.current_angles);
                    }
                }
            }
        }
    }

    /// Advances the pod by one tick (§4.5 `Update`). Never blocks; reads and
    /// mutates only the pod's own state.
    pub fn update(&mut self) {
        if self.is_walking && !self.is_reverting {
            if self.target_gait_cycles == 0 || self.current_gait_cycle < self.target_gait_cycles {
                self.update_movement();
            } else {
                self.stop();
            }
        }

        if self.has_defined_stride && self.is_reverting {
            self.update_reverting_to_neutral();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{example_hexapod_1, example_hexapod_2};
    use crate::gait::GaitType;
    use approx::assert_relative_eq;

    #[test]
    fn start_without_stride_is_not_configured() {
        let mut pod = Pod::new(example_hexapod_1()).unwrap();
        let result = pod.start();
        assert!(matches!(result, Err(PodError::NotConfigured(_))));
    }

    #[test]
    fn full_gait_cycle_returns_effectors_to_start_xy() {
        let mut pod = Pod::new(example_hexapod_2()).unwrap();
        let start_positions = pod.end_effector_positions();
        pod.set_stride_vector(1, 10.0, 10.0).unwrap();
        pod.start().unwrap();

        let ticks = INTERPOLATION_STEPS as u64 * pod.body.gait.num_indices_in_pattern as u64;
        for _ in 0..ticks {
            pod.update();
        }

        assert_eq!(pod.current_gait_cycle(), 1);
        assert!(!pod.is_walking);

        let end_positions = pod.end_effector_positions();
        for (start, end) in start_positions.iter().zip(end_positions.iter()) {
            assert_relative_eq!(start.x, end.x, epsilon = 1e-3);
            assert_relative_eq!(start.y, end.y, epsilon = 1e-3);
        }
    }

    #[test]
    fn wave_gait_swing_phase_lasts_one_full_table() {
        let mut pod = Pod::new(example_hexapod_1()).unwrap();
        pod.body.gait = crate::gait::build_gait(6, GaitType::Wave).unwrap();
        pod.set_stride_vector(6, 10.0, 0.0).unwrap();
        pod.start().unwrap();

        let mut swing_ticks = 0u64;
        let num_indices = pod.body.gait.num_indices_in_pattern as u64;
        for _ in 0..(INTERPOLATION_STEPS as u64 * num_indices) {
            if pod.is_swing_phase(0) {
                swing_ticks += 1;
            }
            pod.update();
        }
        assert_eq!(swing_ticks, INTERPOLATION_STEPS as u64);
    }

    #[test]
    fn revert_terminates_at_neutral() {
        let mut pod = Pod::new(example_hexapod_1()).unwrap();
        pod.set_stride_vector(1, 10.0, 10.0).unwrap();
        pod.start().unwrap();
        for _ in 0..5 {
            pod.update();
        }

        pod.revert_to_neutral().unwrap();
        let ticks = INTERPOLATION_STEPS as u64 * (pod.legs.len() as u64 + 1);
        for _ in 0..ticks {
            pod.update();
        }

        assert!(!pod.is_reverting);
        assert!(!pod.has_defined_stride);
        for leg in &pod.legs {
            assert_relative_eq!(
                leg.joints[Leg::EFFECTOR].x,
                leg.neutral_effector.x,
                epsilon = 1e-2
            );
            assert_relative_eq!(
                leg.joints[Leg::EFFECTOR].y,
                leg.neutral_effector.y,
                epsilon = 1e-2
            );
        }
    }

    #[test]
    fn ground_sets_every_effector_to_height() {
        let mut pod = Pod::new(example_hexapod_1()).unwrap();
        pod.ground(-25.0).unwrap();
        for leg in &pod.legs {
            assert_relative_eq!(leg.joints[Leg::EFFECTOR].z, -25.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn invalid_leg_index_is_rejected() {
        let mut pod = Pod::new(example_hexapod_1()).unwrap();
        let result = pod.set_coxa_length(99, 10.0);
        assert!(matches!(result, Err(PodError::InvalidArgument(_))));
    }

    #[test]
    fn stopping_a_recording_clears_the_buffered_primitive() {
        let mut pod = Pod::new(example_hexapod_1()).unwrap();
        pod.set_stride_vector(2, 10.0, 0.0).unwrap();
        pod.start().unwrap();

        let ticks = INTERPOLATION_STEPS as u64 * pod.body.gait.num_indices_in_pattern as u64;

        pod.start_recording();
        for _ in 0..ticks {
            pod.update();
        }
        assert!(!pod.motion_primitive.is_empty());

        pod.stop_recording();
        assert!(pod.motion_primitive.is_empty());

        pod.start_recording();
        for _ in 0..ticks {
            pod.update();
        }
        let second_cycle_len = pod.motion_primitive.len();
        assert_eq!(second_cycle_len, ticks as usize * pod.legs.len());
    }

    #[test]
    fn set_gait_replaces_the_pattern_and_resets_the_gait_index() {
        let mut pod = Pod::new(example_hexapod_1()).unwrap();
        pod.set_stride_vector(1, 10.0, 0.0).unwrap();
        pod.start().unwrap();
        for _ in 0..(INTERPOLATION_STEPS as u64) {
            pod.update();
        }
        assert_ne!(pod.current_gait_index(), 0);

        pod.set_gait(GaitType::Wave).unwrap();
        assert_eq!(pod.current_gait_index(), 0);
        assert_eq!(pod.body.gait.num_indices_in_pattern, 6);
    }
}
