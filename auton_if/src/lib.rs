//! # Autonomous interface crate.
//!
//! Provides the data types shared between motion scripts, the routine dispatcher and the motion
//! script executor.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Motion commands and the wait modes that accompany them
pub mod motion;

/// Identifiers for the robot's non-drive mechanisms (intake motors, pneumatics)
pub mod mech;

/// Steps that make up a motion script
pub mod script;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The largest speed or power magnitude accepted by the drive and mechanism motors.
pub const MAX_SPEED: i32 = 127;
