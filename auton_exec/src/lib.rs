//! # Autonomous library.
//!
//! This library contains the motion script execution and recovery layer of the autonomous
//! software. Routines and scripts issue motions through the executor, which blocks them according
//! to each motion's wait mode.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Autonomous context - the executor and mechanisms handed to each routine
pub mod auton;

/// Tracking wheel calibration - measures and installs each tracking wheel's offset
pub mod calib;

/// Drive controller seam and the simulated drivetrain
pub mod drive;

/// Motion script executor - issues motions and blocks per wait mode
pub mod exec;

/// Mechanisms seam - motors and pneumatics outside the drivetrain
pub mod mech;

/// Parameters of the executable
pub mod params;

/// Interference recovery - bounded retry of an escape drive after a stall
pub mod recovery;

/// Routine dispatcher and the bundled routines
pub mod routines;

/// Motion script runner
pub mod script;
