//! # Motion commands
//!
//! A [`MotionCommand`] describes one primitive the Drive Controller can execute. Each command is
//! issued together with a [`WaitMode`], which decides how long the script blocks before it moves
//! on to its next step.
//!
//! Conventions:
//! - Distances are in inches, positive forwards.
//! - Angles are in degrees, positive clockwise (compass convention, as reported by the IMU).
//! - Speeds are motor power out of [`crate::MAX_SPEED`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt::Display;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A motion primitive to be executed by the Drive Controller.
///
/// Commands are immutable once issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MotionCommand {
    /// Drive straight by a relative distance, holding the current heading.
    Drive {
        /// Signed distance to travel.
        ///
        /// Units: inches
        distance_in: f64,

        /// Speed cap for the motion, out of 127.
        max_speed: i32,

        /// Ramp the speed up at the start of the motion instead of stepping to `max_speed`.
        slew: bool,
    },

    /// Turn in place to an absolute heading.
    Turn {
        /// The target heading.
        ///
        /// Units: degrees
        angle_deg: f64,

        /// Speed cap for the motion, out of 127.
        max_speed: i32,

        /// How the target is interpreted relative to the current heading.
        angle_mode: AngleBehavior,
    },

    /// Turn to an absolute heading by driving one side of the drivetrain faster than the other.
    Swing {
        /// The side of the robot the turn is performed towards.
        side: SwingSide,

        /// The target heading.
        ///
        /// Units: degrees
        angle_deg: f64,

        /// Speed cap of the moving (outside) side, out of 127.
        moving_side_speed: i32,

        /// Speed of the still (inside) side, out of 127. Zero pivots about the inside wheels, a
        /// non-zero value produces an arc.
        still_side_speed: i32,
    },

    /// Drive using odometry, either a relative distance, to a single pose, or along a path of
    /// waypoints (pure pursuit, with boomerang approaches to waypoints that carry a heading).
    OdomDrive {
        /// Where to drive to.
        target: OdomTarget,

        /// Whether the robot faces its target (`Forward`) or backs into it (`Reverse`).
        direction: Direction,

        /// Speed cap for the motion, out of 127.
        max_speed: i32,

        /// Ramp the speed up at the start of the motion.
        slew: bool,
    },
}

/// Completion wait mode for a command.
///
/// Chosen per call site and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WaitMode {
    /// Block until the motion has reached its exit condition and physically settled.
    FullSettle,

    /// Block only until the motion is close enough to its target that the next motion may begin
    /// blending into it. A chain of commands must end with a `FullSettle`.
    QuickChain,

    /// Block until the motion has travelled past the given signed threshold (inches for drives,
    /// degrees for turns and swings), then return while it continues.
    UntilProgress(f64),

    /// Block until a path-following motion has passed the waypoint with the given index, then
    /// return while it continues.
    UntilWaypoint(usize),
}

/// How a turn target is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AngleBehavior {
    /// Take the shortest way round to the target heading.
    Shortest,

    /// Take the longest way round to the target heading.
    Longest,

    /// Always turn clockwise.
    Clockwise,

    /// Always turn counter-clockwise.
    CounterClockwise,

    /// Use the target exactly as given, with no wrapping, relative to the heading reference.
    Raw,
}

/// Side of the robot towards which a swing is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwingSide {
    Left,
    Right,
}

/// Facing direction of an odometry motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Target of an [`MotionCommand::OdomDrive`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OdomTarget {
    /// Drive a signed distance along the current heading, corrected by odometry.
    Distance(f64),

    /// Drive to a single point or pose.
    Pose(PoseTarget),

    /// Drive through each waypoint in order.
    Path(Vec<PoseTarget>),
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A field position to drive to, optionally with a heading to arrive at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseTarget {
    /// Units: inches
    pub x_in: f64,

    /// Units: inches
    pub y_in: f64,

    /// Heading to arrive at. If `Some` the point is approached with a boomerang motion.
    ///
    /// Units: degrees
    pub theta_deg: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotionCommand {
    /// Shorthand for a slewed drive.
    pub fn drive(distance_in: f64, max_speed: i32) -> Self {
        MotionCommand::Drive {
            distance_in,
            max_speed,
            slew: true,
        }
    }

    /// Shorthand for a shortest-path turn.
    pub fn turn(angle_deg: f64, max_speed: i32) -> Self {
        MotionCommand::Turn {
            angle_deg,
            max_speed,
            angle_mode: AngleBehavior::Shortest,
        }
    }

    /// The speed cap of the command.
    pub fn max_speed(&self) -> i32 {
        match self {
            MotionCommand::Drive { max_speed, .. }
            | MotionCommand::Turn { max_speed, .. }
            | MotionCommand::OdomDrive { max_speed, .. } => *max_speed,
            MotionCommand::Swing {
                moving_side_speed, ..
            } => *moving_side_speed,
        }
    }

    /// Returns true if progress of this command is measured as an angle (degrees) rather than a
    /// distance (inches).
    pub fn is_angular(&self) -> bool {
        matches!(
            self,
            MotionCommand::Turn { .. } | MotionCommand::Swing { .. }
        )
    }

    /// Number of waypoints in the command, zero for commands which don't follow a path.
    pub fn num_waypoints(&self) -> usize {
        match self {
            MotionCommand::OdomDrive {
                target: OdomTarget::Path(p),
                ..
            } => p.len(),
            MotionCommand::OdomDrive {
                target: OdomTarget::Pose(_),
                ..
            } => 1,
            _ => 0,
        }
    }
}

impl PoseTarget {
    pub fn point(x_in: f64, y_in: f64) -> Self {
        Self {
            x_in,
            y_in,
            theta_deg: None,
        }
    }

    pub fn pose(x_in: f64, y_in: f64, theta_deg: f64) -> Self {
        Self {
            x_in,
            y_in,
            theta_deg: Some(theta_deg),
        }
    }
}

impl Display for MotionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MotionCommand::Drive {
                distance_in,
                max_speed,
                ..
            } => write!(f, "Drive({:.2} in @ {})", distance_in, max_speed),
            MotionCommand::Turn {
                angle_deg,
                max_speed,
                angle_mode,
            } => write!(
                f,
                "Turn({:.2} deg @ {}, {:?})",
                angle_deg, max_speed, angle_mode
            ),
            MotionCommand::Swing {
                side,
                angle_deg,
                moving_side_speed,
                still_side_speed,
            } => write!(
                f,
                "Swing({:?}, {:.2} deg @ {}/{})",
                side, angle_deg, moving_side_speed, still_side_speed
            ),
            MotionCommand::OdomDrive {
                target,
                direction,
                max_speed,
                ..
            } => match target {
                OdomTarget::Distance(d) => {
                    write!(f, "OdomDrive({:.2} in, {:?} @ {})", d, direction, max_speed)
                }
                OdomTarget::Pose(p) => write!(
                    f,
                    "OdomDrive(({:.2}, {:.2}), {:?} @ {})",
                    p.x_in, p.y_in, direction, max_speed
                ),
                OdomTarget::Path(p) => write!(
                    f,
                    "OdomDrive({} waypoints, {:?} @ {})",
                    p.len(),
                    direction,
                    max_speed
                ),
            },
        }
    }
}
