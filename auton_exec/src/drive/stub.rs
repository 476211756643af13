//! Scripted drive controller for unit tests.
//!
//! Time in the stub is counted in calls to `wait`: each call advances the active motion by one
//! tick, regardless of the duration asked for. Every call made into the stub is recorded so that
//! tests can assert on ordering.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Duration;

use auton_if::motion::MotionCommand;
use util::maths::rem_euclid;

use super::*;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Behaviour of one motion issued to the stub.
#[derive(Debug, Clone)]
pub(crate) struct StubMotion {
    /// Ticks after which the motion reports chain ready.
    pub chain_after: u32,

    /// Ticks after which the motion reports settled.
    pub settle_after: u32,

    /// Progress made on each tick.
    pub progress_per_tick: f64,

    /// If set the motion is a path, moving on to the next waypoint every this many ticks.
    pub ticks_per_waypoint: Option<u32>,

    /// The motion exits interfered.
    pub interfered: bool,

    /// Change of heading applied when the motion settles.
    pub heading_change_deg: f64,

    /// Distance added to each tracker when the motion settles.
    pub tracker_distances_in: WheelMap<f64>,
}

#[derive(Debug, Clone)]
pub(crate) struct StubTracker {
    pub distance_in: f64,
    pub offset_in: f64,
    pub present: bool,
    pub resets: u32,
}

struct ActiveMotion {
    handle: MotionHandle,
    motion: StubMotion,
    ticks: u32,
}

pub(crate) struct StubDrive {
    pub calls: Vec<StubCall>,
    pub trackers: WheelMap<StubTracker>,

    /// Heading the stub reads after `reset_heading`.
    pub heading_reset_deg: f64,

    /// Reject the next issued command.
    pub fail_next_issue: bool,

    heading_deg: f64,
    pose: Pose,
    interfered: bool,
    next_handle: u64,
    active: Option<ActiveMotion>,
    profile: Box<dyn FnMut(&MotionCommand) -> StubMotion>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StubCall {
    Issue(MotionCommand),
    Wait(Duration),
    SetMaxSpeed(i32),
    ResetSensors,
    ResetTargets,
    ResetHeading,
    Brake(BrakeMode),
    SetPose(Pose),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for StubMotion {
    fn default() -> Self {
        Self {
            chain_after: 2,
            settle_after: 4,
            progress_per_tick: 1.0,
            ticks_per_waypoint: None,
            interfered: false,
            heading_change_deg: 0.0,
            tracker_distances_in: WheelMap::new(),
        }
    }
}

impl StubTracker {
    pub fn new(offset_in: f64) -> Self {
        Self {
            distance_in: 0.0,
            offset_in,
            present: true,
            resets: 0,
        }
    }

    pub fn absent(offset_in: f64) -> Self {
        Self {
            present: false,
            ..Self::new(offset_in)
        }
    }
}

impl TrackingWheel for StubTracker {
    fn reset(&mut self) {
        self.distance_in = 0.0;
        self.resets += 1;
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
        self.present
    }
}

impl StubDrive {
    /// A stub where every motion uses the default [`StubMotion`].
    pub fn new() -> Self {
        Self::with_profile(|_| StubMotion::default())
    }

    /// A stub where each issued motion's behaviour is chosen by `profile`.
    pub fn with_profile<F>(profile: F) -> Self
    where
        F: FnMut(&MotionCommand) -> StubMotion + 'static,
    {
        Self {
            calls: Vec::new(),
            trackers: WheelMap::new(),
            heading_reset_deg: 0.0,
            fail_next_issue: false,
            heading_deg: 0.0,
            pose: Pose::default(),
            interfered: false,
            next_handle: 0,
            active: None,
            profile: Box::new(profile),
        }
    }

    /// All commands issued, in order.
    pub fn issued(&self) -> Vec<MotionCommand> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                StubCall::Issue(cmd) => Some(cmd.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of calls to `wait` made.
    pub fn num_waits(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, StubCall::Wait(_)))
            .count()
    }

    /// Apply the effects of the active motion once it reaches its settle tick.
    fn check_settle(&mut self) {
        let active = match self.active.as_ref() {
            Some(a) if a.ticks == a.motion.settle_after => a,
            _ => return,
        };

        self.interfered = active.motion.interfered;
        self.heading_deg = rem_euclid(self.heading_deg + active.motion.heading_change_deg, 360.0);

        for (p, d) in active.motion.tracker_distances_in.iter() {
            if let Some(t) = self.trackers.get_mut(p) {
                t.distance_in += d;
            }
        }
    }
}

impl DriveController for StubDrive {
    fn issue(&mut self, cmd: &MotionCommand) -> Result<MotionHandle, DriveError> {
        self.calls.push(StubCall::Issue(cmd.clone()));

        if self.fail_next_issue {
            self.fail_next_issue = false;
            return Err(DriveError::InvalidCommand(cmd.clone(), "stub rejection".into()));
        }

        let handle = MotionHandle(self.next_handle);
        self.next_handle += 1;
        self.interfered = false;
        self.active = Some(ActiveMotion {
            handle,
            motion: (self.profile)(cmd),
            ticks: 0,
        });
        self.check_settle();

        Ok(handle)
    }

    fn status(&self, handle: MotionHandle) -> Result<MotionStatus, DriveError> {
        match self.active.as_ref() {
            Some(a) if a.handle == handle => Ok(MotionStatus {
                settled: a.ticks >= a.motion.settle_after,
                chain_ready: a.ticks >= a.motion.chain_after,
                progress: a.ticks as f64 * a.motion.progress_per_tick,
                target_waypoint: a.motion.ticks_per_waypoint.map(|n| (a.ticks / n) as usize),
            }),
            _ if handle.0 < self.next_handle => Ok(MotionStatus::superseded(0.0)),
            _ => Err(DriveError::UnknownHandle(handle)),
        }
    }

    fn interfered(&self) -> bool {
        self.interfered
    }

    fn set_max_speed(&mut self, max_speed: i32) {
        self.calls.push(StubCall::SetMaxSpeed(max_speed));
    }

    fn reset_position_sensors(&mut self) {
        self.calls.push(StubCall::ResetSensors);
    }

    fn reset_targets(&mut self) {
        self.calls.push(StubCall::ResetTargets);
        self.active = None;
    }

    fn reset_heading(&mut self) {
        self.calls.push(StubCall::ResetHeading);
        self.heading_deg = self.heading_reset_deg;
    }

    fn set_brake_mode(&mut self, mode: BrakeMode) {
        self.calls.push(StubCall::Brake(mode));
    }

    fn heading_deg(&self) -> f64 {
        self.heading_deg
    }

    fn pose(&self) -> Pose {
        self.pose
    }

    fn set_pose(&mut self, pose: Pose) {
        self.calls.push(StubCall::SetPose(pose));
        self.pose = pose;
    }

    fn tracker(&mut self, position: WheelPosition) -> Option<&mut dyn TrackingWheel> {
        self.trackers
            .get_mut(position)
            .map(|t| t as &mut dyn TrackingWheel)
    }

    fn wait(&mut self, duration: Duration) {
        self.calls.push(StubCall::Wait(duration));

        if let Some(a) = self.active.as_mut() {
            a.ticks += 1;
        }
        self.check_settle();
    }
}
