//! # Simulated drive controller
//!
//! A fixed-step kinematic model of a tank drivetrain, used to run routines on a host. Each motion
//! approaches its target with a proportional law capped by the motion's speed, ramped by slew.
//! Motions exit with the same small/big error timers as the real controller, and a motion pushed
//! against the optional wall stalls and exits interfered.
//!
//! Simulated time only advances inside [`DriveController::wait`], so runs are deterministic.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, time::Duration};

use auton_if::{
    motion::{AngleBehavior, Direction, MotionCommand, OdomTarget, PoseTarget, SwingSide},
    MAX_SPEED,
};
use util::maths::{clamp, lin_map, rem_euclid, sgn, wrap_angle_deg};

use super::{
    BrakeMode, DriveConfig, DriveController, DriveError, ExitConditions, MotionHandle,
    MotionStatus, Pose, TrackerOffset, TrackingWheel, WheelMap, WheelPosition,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Longest distance ahead of a boomerang target at which the carrot point may be placed.
///
/// Units: inches
const BOOMERANG_MAX_LEAD_IN: f64 = 16.0;

/// Fraction of the remaining distance used to lead a boomerang carrot point.
const BOOMERANG_DLEAD: f64 = 0.625;

/// Fraction of the commanded speed below which a motion is considered to be stalled.
const STALL_SPEED_FRACTION: f64 = 0.05;

/// Largest ratio of the still-side to the moving-side speed in a swing.
const MAX_SWING_SPEED_RATIO: f64 = 0.9;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the simulated drivetrain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Physics step.
    ///
    /// Units: milliseconds
    pub step_ms: u64,

    /// Drive speed at full power.
    ///
    /// Units: inches/second
    pub max_drive_speed_ips: f64,

    /// Turn rate at full power.
    ///
    /// Units: degrees/second
    pub max_turn_rate_dps: f64,

    /// Proportional gain of straight motions.
    ///
    /// Units: (inches/second)/inch
    pub drive_kp: f64,

    /// Proportional gain of turning motions.
    ///
    /// Units: (degrees/second)/degree
    pub turn_kp: f64,

    /// Distance between the left and right drive wheels.
    ///
    /// Units: inches
    pub track_width_in: f64,

    /// Tracking wheels physically fitted to the robot and their true offsets.
    pub trackers: Vec<TrackerOffset>,

    /// An obstruction across the field at this y position which the robot cannot drive through
    /// in the +y direction.
    ///
    /// Units: inches
    pub wall_y_in: Option<f64>,
}

/// A simulated drive controller.
pub struct SimDrive {
    config: DriveConfig,
    params: SimParams,

    pose: Pose,
    trackers: WheelMap<SimTracker>,
    drive_sensor_in: f64,
    brake_mode: BrakeMode,

    time_ms: u64,
    next_handle: u64,
    active: Option<SimMotion>,
    /// Final progress of each motion which is no longer active.
    finished: HashMap<MotionHandle, f64>,
    interfered: bool,
}

struct SimTracker {
    true_offset_in: f64,
    offset_in: f64,
    distance_in: f64,
}

struct SimMotion {
    handle: MotionHandle,
    kind: MotionKind,
    max_speed: i32,
    slew: bool,
    exit: ExitConditions,
    chain_threshold: f64,

    progress: f64,
    settled: bool,
    chain_ready: bool,
    small_timer_ms: u64,
    big_timer_ms: u64,
    stall_timer_ms: u64,
}

/// Result of advancing a motion by one step.
struct StepResult {
    /// Remaining error, in the units of the motion.
    error: f64,

    /// Whether the exit condition's angular requirement (if any) is satisfied.
    aligned: bool,

    /// Speed the motion asked for and speed achieved, in the units of the motion per second.
    commanded: f64,
    achieved: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

enum MotionKind {
    Drive {
        target_in: f64,
    },
    Turn {
        target_delta_deg: f64,
    },
    Swing {
        side: SwingSide,
        target_delta_deg: f64,
        speed_ratio: f64,
    },
    Path {
        waypoints: Vec<PoseTarget>,
        index: usize,
        reverse: bool,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            step_ms: 10,
            max_drive_speed_ips: 60.0,
            max_turn_rate_dps: 360.0,
            drive_kp: 6.0,
            turn_kp: 8.0,
            track_width_in: 12.0,
            trackers: vec![
                TrackerOffset {
                    position: WheelPosition::Left,
                    offset_in: 5.75,
                },
                TrackerOffset {
                    position: WheelPosition::Back,
                    offset_in: 2.5,
                },
            ],
            wall_y_in: None,
        }
    }
}

impl TrackingWheel for SimTracker {
    fn reset(&mut self) {
        self.distance_in = 0.0;
    }

    fn distance_in(&self) -> f64 {
        self.distance_in
    }

    fn center_offset_in(&self) -> f64 {
        self.offset_in
    }

    fn set_center_offset_in(&mut self, offset_in: f64) {
        self.offset_in = offset_in;
    }

    fn is_present(&self) -> bool {
        true
    }
}

impl SimDrive {
    /// Create a new simulated drive at the origin.
    ///
    /// Tracking wheels are fitted as listed in `params`, starting with the offsets given in
    /// `config` (or zero if `config` has no offset for a wheel).
    pub fn new(config: DriveConfig, params: SimParams) -> Self {
        let configured = config.offsets();

        let trackers = params
            .trackers
            .iter()
            .map(|t| {
                (
                    t.position,
                    SimTracker {
                        true_offset_in: t.offset_in,
                        offset_in: configured.get(t.position).copied().unwrap_or(0.0),
                        distance_in: 0.0,
                    },
                )
            })
            .collect();

        Self {
            config,
            params,
            pose: Pose::default(),
            trackers,
            drive_sensor_in: 0.0,
            brake_mode: BrakeMode::Coast,
            time_ms: 0,
            next_handle: 0,
            active: None,
            finished: HashMap::new(),
            interfered: false,
        }
    }

    /// The controller's configuration, including the current tracking wheel offsets.
    pub fn config(&self) -> DriveConfig {
        let mut config = self.config.clone();
        config.tracker_offsets_in = self
            .trackers
            .iter()
            .map(|(position, t)| TrackerOffset {
                position,
                offset_in: t.offset_in,
            })
            .collect();
        config
    }

    /// Simulated time since creation.
    pub fn time_ms(&self) -> u64 {
        self.time_ms
    }

    pub fn brake_mode(&self) -> BrakeMode {
        self.brake_mode
    }

    /// Average drive motor encoder distance since the last sensor reset.
    pub fn drive_sensor_in(&self) -> f64 {
        self.drive_sensor_in
    }

    /// Check a command is one the controller can execute.
    fn validate(cmd: &MotionCommand) -> Result<(), String> {
        let speed_ok = |s: i32| (0..=MAX_SPEED).contains(&s);

        // A motion capped at zero would never move, stall or settle
        if !(1..=MAX_SPEED).contains(&cmd.max_speed()) {
            return Err(format!(
                "max speed {} outside 1..={}",
                cmd.max_speed(),
                MAX_SPEED
            ));
        }

        match cmd {
            MotionCommand::Drive { distance_in, .. } if !distance_in.is_finite() => {
                return Err("distance is not finite".into())
            }
            MotionCommand::Turn { angle_deg, .. } | MotionCommand::Swing { angle_deg, .. }
                if !angle_deg.is_finite() =>
            {
                return Err("angle is not finite".into())
            }
            MotionCommand::Swing {
                moving_side_speed,
                still_side_speed,
                ..
            } if !speed_ok(*still_side_speed) || *still_side_speed >= *moving_side_speed => {
                return Err(format!(
                    "still side speed {} must be in 0..{}",
                    still_side_speed, moving_side_speed
                ))
            }
            MotionCommand::OdomDrive {
                target: OdomTarget::Path(p),
                ..
            } if p.is_empty() => return Err("path has no waypoints".into()),
            MotionCommand::OdomDrive {
                target: OdomTarget::Distance(d),
                ..
            } if !d.is_finite() => return Err("distance is not finite".into()),
            _ => (),
        }

        Ok(())
    }

    /// Angle to turn through to reach `target_deg` from the current heading.
    fn turn_delta(&self, target_deg: f64, mode: AngleBehavior) -> f64 {
        let heading = self.pose.theta_deg;
        let shortest = wrap_angle_deg(target_deg - heading);

        match mode {
            AngleBehavior::Shortest => shortest,
            AngleBehavior::Longest if shortest > 0.0 => shortest - 360.0,
            AngleBehavior::Longest if shortest < 0.0 => shortest + 360.0,
            AngleBehavior::Longest => 0.0,
            AngleBehavior::Clockwise => rem_euclid(target_deg - heading, 360.0),
            AngleBehavior::CounterClockwise => -rem_euclid(heading - target_deg, 360.0),
            AngleBehavior::Raw => target_deg - heading,
        }
    }

    fn build_motion(&self, cmd: &MotionCommand, handle: MotionHandle) -> SimMotion {
        let c = &self.config;

        let (kind, slew, exit, chain_threshold) = match cmd {
            MotionCommand::Drive {
                distance_in, slew, ..
            } => (
                MotionKind::Drive {
                    target_in: *distance_in,
                },
                *slew,
                c.drive_exit,
                c.drive_chain_in,
            ),
            MotionCommand::Turn {
                angle_deg,
                angle_mode,
                ..
            } => (
                MotionKind::Turn {
                    target_delta_deg: self.turn_delta(*angle_deg, *angle_mode),
                },
                false,
                c.turn_exit,
                c.turn_chain_deg,
            ),
            MotionCommand::Swing {
                side,
                angle_deg,
                moving_side_speed,
                still_side_speed,
            } => (
                MotionKind::Swing {
                    side: *side,
                    target_delta_deg: self.turn_delta(*angle_deg, AngleBehavior::Shortest),
                    speed_ratio: clamp(
                        &(*still_side_speed as f64 / (*moving_side_speed).max(1) as f64),
                        &0.0,
                        &MAX_SWING_SPEED_RATIO,
                    ),
                },
                false,
                c.swing_exit,
                c.swing_chain_deg,
            ),
            MotionCommand::OdomDrive {
                target,
                direction,
                slew,
                ..
            } => {
                let kind = match target {
                    OdomTarget::Distance(d) => MotionKind::Drive { target_in: *d },
                    OdomTarget::Pose(p) => MotionKind::Path {
                        waypoints: vec![*p],
                        index: 0,
                        reverse: *direction == Direction::Reverse,
                    },
                    OdomTarget::Path(p) => MotionKind::Path {
                        waypoints: p.clone(),
                        index: 0,
                        reverse: *direction == Direction::Reverse,
                    },
                };
                (kind, *slew, c.odom_drive_exit, c.drive_chain_in)
            }
        };

        SimMotion {
            handle,
            kind,
            max_speed: cmd.max_speed(),
            slew,
            exit,
            chain_threshold,
            progress: 0.0,
            settled: false,
            chain_ready: false,
            small_timer_ms: 0,
            big_timer_ms: 0,
            stall_timer_ms: 0,
        }
    }

    /// Advance the simulation by one physics step.
    fn step(&mut self) {
        let step_ms = self.params.step_ms;
        self.time_ms += step_ms;

        let mut motion = match self.active.take() {
            Some(m) if !m.settled => m,
            other => {
                self.active = other;
                return;
            }
        };

        let dt = step_ms as f64 / 1000.0;
        let result = match motion.kind {
            MotionKind::Drive { target_in } => self.step_drive(&mut motion, target_in, dt),
            MotionKind::Turn { target_delta_deg } => {
                self.step_turn(&mut motion, target_delta_deg, dt)
            }
            MotionKind::Swing {
                side,
                target_delta_deg,
                speed_ratio,
            } => self.step_swing(&mut motion, side, target_delta_deg, speed_ratio, dt),
            MotionKind::Path { .. } => self.step_path(&mut motion, dt),
        };

        self.check_exit(&mut motion, &result, step_ms);

        trace!(
            "t={} ms pose={} progress={:.3} error={:.3}",
            self.time_ms,
            self.pose,
            motion.progress,
            result.error
        );

        self.active = Some(motion);
    }

    /// Speed cap of a motion at its current progress, as a fraction of full power.
    fn speed_fraction(&self, motion: &SimMotion) -> f64 {
        let max = motion.max_speed as f64;
        let min = self.config.slew_min_speed as f64;

        let speed = if motion.slew && max > min && motion.progress.abs() < self.config.slew_distance
        {
            lin_map(
                (0.0, self.config.slew_distance),
                (min, max),
                motion.progress.abs(),
            )
        } else {
            max
        };

        speed / MAX_SPEED as f64
    }

    /// Move the robot along the given heading, stopping at the wall. Returns the distance moved.
    fn translate(&mut self, distance_in: f64, heading_deg: f64) -> f64 {
        let (sin, cos) = heading_deg.to_radians().sin_cos();
        let mut scale = 1.0;

        if let Some(wall) = self.params.wall_y_in {
            let dy = distance_in * cos;
            if dy > 0.0 && self.pose.y_in + dy > wall {
                scale = clamp(&((wall - self.pose.y_in) / dy), &0.0, &1.0);
            }
        }

        let moved = distance_in * scale;
        self.pose.x_in += moved * sin;
        self.pose.y_in += moved * cos;
        self.drive_sensor_in += moved;

        for (p, t) in self.trackers.iter_mut() {
            if p.is_vertical() {
                t.distance_in += moved;
            }
        }

        moved
    }

    /// Rotate the robot in place by the given angle.
    fn rotate(&mut self, angle_deg: f64) {
        self.pose.theta_deg += angle_deg;

        for (_, t) in self.trackers.iter_mut() {
            t.distance_in += t.true_offset_in * angle_deg.to_radians();
        }
    }

    fn step_drive(&mut self, motion: &mut SimMotion, target_in: f64, dt: f64) -> StepResult {
        let error = target_in - motion.progress;
        let cap = self.speed_fraction(motion) * self.params.max_drive_speed_ips;
        let speed = clamp(&(self.params.drive_kp * error), &-cap, &cap);

        let heading = self.pose.theta_deg;
        let moved = self.translate(speed * dt, heading);
        motion.progress += moved;

        StepResult {
            error: target_in - motion.progress,
            aligned: true,
            commanded: speed,
            achieved: moved / dt,
        }
    }

    fn step_turn(&mut self, motion: &mut SimMotion, target_delta_deg: f64, dt: f64) -> StepResult {
        let error = target_delta_deg - motion.progress;
        let cap = self.speed_fraction(motion) * self.params.max_turn_rate_dps;
        let rate = clamp(&(self.params.turn_kp * error), &-cap, &cap);

        self.rotate(rate * dt);
        motion.progress += rate * dt;

        StepResult {
            error: target_delta_deg - motion.progress,
            aligned: true,
            commanded: rate,
            achieved: rate,
        }
    }

    fn step_swing(
        &mut self,
        motion: &mut SimMotion,
        side: SwingSide,
        target_delta_deg: f64,
        speed_ratio: f64,
        dt: f64,
    ) -> StepResult {
        let p = &self.params;

        // Turn rate when the moving side is at full speed
        let outer_ips = self.speed_fraction(motion) * p.max_drive_speed_ips;
        let full_rate_dps = (outer_ips * (1.0 - speed_ratio) / p.track_width_in).to_degrees();

        let error = target_delta_deg - motion.progress;
        let rate = clamp(&(p.turn_kp * error), &-full_rate_dps, &full_rate_dps);
        let dtheta = rate * dt;

        // The center of the robot sweeps an arc whose radius depends on the still side speed.
        // It moves forwards when the moving side is driving forwards.
        let radius_in = p.track_width_in / 2.0 * (1.0 + speed_ratio) / (1.0 - speed_ratio);
        let forwards = match side {
            SwingSide::Left => sgn(dtheta),
            SwingSide::Right => -sgn(dtheta),
        };
        let arc_in = forwards * radius_in * dtheta.abs().to_radians();

        let mid_heading = self.pose.theta_deg + dtheta / 2.0;
        self.rotate(dtheta);
        let moved = self.translate(arc_in, mid_heading);

        // A blocked swing stops turning as well
        let achieved = if arc_in.abs() > 0.0 {
            rate * moved / arc_in
        } else {
            rate
        };
        motion.progress += dtheta;

        StepResult {
            error: target_delta_deg - motion.progress,
            aligned: true,
            commanded: rate,
            achieved,
        }
    }

    fn step_path(&mut self, motion: &mut SimMotion, dt: f64) -> StepResult {
        let (waypoints, index, reverse) = match &mut motion.kind {
            MotionKind::Path {
                waypoints,
                index,
                reverse,
            } => (waypoints.clone(), index, *reverse),
            _ => unreachable!("step_path called on a non-path motion"),
        };

        let dist_to = |pose: &Pose, w: &PoseTarget| (w.x_in - pose.x_in).hypot(w.y_in - pose.y_in);

        // Move on to the next waypoint once the current one is inside the look ahead
        let last = waypoints.len() - 1;
        while *index < last && dist_to(&self.pose, &waypoints[*index]) < self.config.look_ahead_in
        {
            *index += 1;
            debug!("Path moving to waypoint {}", *index);
        }
        let target = waypoints[*index];
        let on_last = *index == last;

        // Remaining path length
        let mut remaining = dist_to(&self.pose, &target);
        for pair in waypoints[*index..].windows(2) {
            remaining += (pair[1].x_in - pair[0].x_in).hypot(pair[1].y_in - pair[0].y_in);
        }

        // Aim point, led ahead of the target for a boomerang approach
        let final_heading = if on_last { target.theta_deg } else { None };
        let (aim_x, aim_y) = match final_heading {
            Some(theta) => {
                let lead = (BOOMERANG_DLEAD * remaining).min(BOOMERANG_MAX_LEAD_IN);
                let lead = if reverse { lead } else { -lead };
                let (sin, cos) = theta.to_radians().sin_cos();
                (target.x_in + lead * sin, target.y_in + lead * cos)
            }
            None => (target.x_in, target.y_in),
        };

        let small_error = motion.exit.small_error;
        let arrived = on_last && remaining < small_error;

        let desired_heading = match (arrived, final_heading) {
            (true, Some(theta)) => theta,
            (true, None) => self.pose.theta_deg,
            _ => {
                let bearing = (aim_x - self.pose.x_in)
                    .atan2(aim_y - self.pose.y_in)
                    .to_degrees();
                if reverse {
                    bearing + 180.0
                } else {
                    bearing
                }
            }
        };
        let heading_error = wrap_angle_deg(desired_heading - self.pose.theta_deg);

        let fraction = self.speed_fraction(motion);
        let turn_cap = fraction * self.params.max_turn_rate_dps;
        let rate = clamp(&(self.params.turn_kp * heading_error), &-turn_cap, &turn_cap);
        self.rotate(rate * dt);

        // Drive slower the further the robot is from facing its aim point
        let drive_cap = fraction * self.params.max_drive_speed_ips;
        let mut speed = if arrived {
            0.0
        } else {
            clamp(&(self.params.drive_kp * remaining), &0.0, &drive_cap)
                * heading_error.to_radians().cos().max(0.0)
        };
        if reverse {
            speed = -speed;
        }

        let heading = self.pose.theta_deg;
        let moved = self.translate(speed * dt, heading);
        motion.progress += moved;

        let aligned = match final_heading {
            Some(theta) => {
                wrap_angle_deg(theta - self.pose.theta_deg).abs() < self.config.turn_exit.big_error
            }
            None => true,
        };

        StepResult {
            error: if on_last {
                dist_to(&self.pose, &target)
            } else {
                remaining
            },
            aligned,
            commanded: speed,
            achieved: moved / dt,
        }
    }

    /// Update the exit timers of a motion after a step.
    fn check_exit(&mut self, motion: &mut SimMotion, result: &StepResult, step_ms: u64) {
        let error = result.error.abs();

        if error < motion.chain_threshold {
            motion.chain_ready = true;
        }

        if error < motion.exit.small_error && result.aligned {
            motion.small_timer_ms += step_ms;
        } else {
            motion.small_timer_ms = 0;
        }

        if error < motion.exit.big_error && result.aligned {
            motion.big_timer_ms += step_ms;
        } else {
            motion.big_timer_ms = 0;
        }

        // A motion asking for speed but not achieving it is pushing against something
        let stalled = result.commanded.abs() > 0.0
            && result.achieved.abs() < STALL_SPEED_FRACTION * result.commanded.abs();
        if stalled {
            motion.stall_timer_ms += step_ms;
        } else {
            motion.stall_timer_ms = 0;
        }

        if motion.small_timer_ms >= motion.exit.small_time_ms
            || motion.big_timer_ms >= motion.exit.big_time_ms
        {
            motion.settled = true;
            debug!(
                "Motion {:?} settled at t={} ms, error {:.3}",
                motion.handle, self.time_ms, result.error
            );
        } else if motion.stall_timer_ms >= motion.exit.velocity_time_ms {
            motion.settled = true;
            self.interfered = true;
            warn!(
                "Motion {:?} stalled at {} with error {:.3}",
                motion.handle, self.pose, result.error
            );
        }

        if motion.settled {
            motion.chain_ready = true;
        }
    }
}

impl DriveController for SimDrive {
    fn issue(&mut self, cmd: &MotionCommand) -> Result<MotionHandle, DriveError> {
        Self::validate(cmd).map_err(|e| DriveError::InvalidCommand(cmd.clone(), e))?;

        if let Some(old) = self.active.take() {
            self.finished.insert(old.handle, old.progress);
        }

        let handle = MotionHandle(self.next_handle);
        self.next_handle += 1;
        self.interfered = false;
        self.active = Some(self.build_motion(cmd, handle));

        Ok(handle)
    }

    fn status(&self, handle: MotionHandle) -> Result<MotionStatus, DriveError> {
        match self.active.as_ref() {
            Some(m) if m.handle == handle => {
                let target_waypoint = match &m.kind {
                    MotionKind::Path { waypoints, .. } if m.settled => Some(waypoints.len()),
                    MotionKind::Path { index, .. } => Some(*index),
                    _ => None,
                };

                Ok(MotionStatus {
                    settled: m.settled,
                    chain_ready: m.chain_ready,
                    progress: m.progress,
                    target_waypoint,
                })
            }
            _ => self
                .finished
                .get(&handle)
                .map(|p| MotionStatus::superseded(*p))
                .ok_or(DriveError::UnknownHandle(handle)),
        }
    }

    fn interfered(&self) -> bool {
        self.interfered
    }

    fn set_max_speed(&mut self, max_speed: i32) {
        if let Some(m) = self.active.as_mut() {
            m.max_speed = max_speed.max(1).min(MAX_SPEED);
        }
    }

    fn reset_position_sensors(&mut self) {
        self.drive_sensor_in = 0.0;
    }

    fn reset_targets(&mut self) {
        if let Some(old) = self.active.take() {
            self.finished.insert(old.handle, old.progress);
        }
    }

    fn reset_heading(&mut self) {
        self.pose.theta_deg = 0.0;
    }

    fn set_brake_mode(&mut self, mode: BrakeMode) {
        self.brake_mode = mode;
    }

    fn heading_deg(&self) -> f64 {
        self.pose.theta_deg
    }

    fn pose(&self) -> Pose {
        self.pose
    }

    fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    fn tracker(&mut self, position: WheelPosition) -> Option<&mut dyn TrackingWheel> {
        self.trackers
            .get_mut(position)
            .map(|t| t as &mut dyn TrackingWheel)
    }

    fn wait(&mut self, duration: Duration) {
        let step_ms = self.params.step_ms.max(1);
        let steps = (duration.as_millis() as u64 + step_ms - 1) / step_ms;

        for _ in 0..steps {
            self.step();
        }
    }
}
