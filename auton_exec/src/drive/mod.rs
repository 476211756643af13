//! # Drive Controller
//!
//! The Drive Controller owns the closed-loop motion of the drivetrain: the PID loops, heading and
//! odometry fusion, and the pure pursuit/boomerang path follower. This module defines the seam
//! through which the rest of the software drives it, the [`DriveController`] trait, along with
//! the host-side [`SimDrive`] implementation.
//!
//! Motions run asynchronously inside the controller. Issuing a command returns a
//! [`MotionHandle`], which can then be polled for a [`MotionStatus`]. Only the most recently
//! issued motion is active. Issuing a new motion supersedes the previous one, whose handle then
//! reports settled.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod config;
mod sim;
#[cfg(test)]
pub(crate) mod stub;
mod tracker;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::time::Duration;

use auton_if::motion::MotionCommand;

pub use config::*;
pub use sim::*;
pub use tracker::*;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The capabilities the autonomous software requires of a drive controller.
pub trait DriveController {
    /// Begin executing a motion, superseding any motion in progress.
    ///
    /// Malformed commands are rejected here with [`DriveError::InvalidCommand`].
    fn issue(&mut self, cmd: &MotionCommand) -> Result<MotionHandle, DriveError>;

    /// Query the live status of a motion.
    fn status(&self, handle: MotionHandle) -> Result<MotionStatus, DriveError>;

    /// True if the most recent motion exited because it stalled against an obstruction.
    ///
    /// Cleared when a new motion is issued.
    fn interfered(&self) -> bool;

    /// Change the speed cap of the active motion.
    fn set_max_speed(&mut self, max_speed: i32);

    /// Zero the drive motor encoders.
    fn reset_position_sensors(&mut self);

    /// Cancel the active motion and clear all PID targets.
    fn reset_targets(&mut self);

    /// Zero the heading reference, so that the current heading reads as 0 degrees.
    fn reset_heading(&mut self);

    fn set_brake_mode(&mut self, mode: BrakeMode);

    /// Units: degrees, clockwise positive. Not wrapped.
    fn heading_deg(&self) -> f64;

    fn pose(&self) -> Pose;

    fn set_pose(&mut self, pose: Pose);

    /// Access the tracking wheel at `position`, or `None` if no wheel is fitted there.
    fn tracker(&mut self, position: WheelPosition) -> Option<&mut dyn TrackingWheel>;

    /// Block the calling sequence for `duration` while the controller keeps running.
    fn wait(&mut self, duration: Duration);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Identifies one issued motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MotionHandle(pub u64);

/// A snapshot of the state of a motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionStatus {
    /// The motion has reached its exit condition (or was superseded or cancelled).
    pub settled: bool,

    /// The motion is close enough to its target to be blended into the next one.
    pub chain_ready: bool,

    /// Signed distance (inches) or angle (degrees) travelled since the motion was issued.
    pub progress: f64,

    /// Index of the waypoint currently being driven towards, for path motions.
    pub target_waypoint: Option<usize>,
}

/// Robot pose in the field frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// Units: inches
    pub x_in: f64,

    /// Units: inches
    pub y_in: f64,

    /// Units: degrees, clockwise positive, 0 along +y.
    pub theta_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Behaviour of the drive motors when given no power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrakeMode {
    Coast,
    Brake,
    Hold,
}

#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error("No motion with handle {0:?} has been issued")]
    UnknownHandle(MotionHandle),

    #[error("Rejected command {0}: {1}")]
    InvalidCommand(MotionCommand, String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotionStatus {
    /// Status reported by a motion which has been superseded by a newer one, with the progress it
    /// had made when it was superseded.
    pub fn superseded(progress: f64) -> Self {
        Self {
            settled: true,
            chain_ready: true,
            progress,
            target_waypoint: None,
        }
    }
}

impl Pose {
    pub fn new(x_in: f64, y_in: f64, theta_deg: f64) -> Self {
        Self {
            x_in,
            y_in,
            theta_deg,
        }
    }
}

impl std::fmt::Display for Pose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:.2} in, {:.2} in, {:.2} deg)",
            self.x_in, self.y_in, self.theta_deg
        )
    }
}
