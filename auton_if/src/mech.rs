//! # Mechanism identifiers
//!
//! The mechanisms are actuated directly by autonomous scripts, outside of the Drive Controller.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of the mechanism motors available to the robot.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum MotorId {
    /// Front intake rollers
    Intake,
    /// Conveyor between the intake and the hood
    Combine,
    /// Scoring hood rollers
    Hood,
}

/// IDs of the pneumatic actuators available to the robot.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum PneumaticId {
    /// Match-load block collector
    BlockCollector,
    /// Descoring arm
    DescoreMech,
}
