//! # Motion script steps
//!
//! A motion script is an ordered list of [`ScriptStep`]s. Each step is serialised as a single
//! externally tagged JSON object, for example:
//!
//! ```text
//! {"Run": {"cmd": {"Drive": {"distance_in": 24.0, "max_speed": 110, "slew": true}}, "wait": "FullSettle"}}
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    mech::{MotorId, PneumaticId},
    motion::{MotionCommand, WaitMode},
};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A single step of a motion script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptStep {
    /// Issue a command and block according to the wait mode.
    Run { cmd: MotionCommand, wait: WaitMode },

    /// Issue a command without waiting for it.
    Start { cmd: MotionCommand },

    /// Block on the most recently issued command according to the wait mode.
    Wait { wait: WaitMode },

    /// Block the script for a fixed time.
    Delay { ms: u64 },

    /// Change the speed cap of the active motion.
    SetMaxSpeed { speed: i32 },

    /// Set the power of a mechanism motor, between -127 and 127.
    Motor { id: MotorId, power: i32 },

    /// Extend or retract a pneumatic.
    Pneumatic { id: PneumaticId, extended: bool },

    /// If the last motion was interfered with, run the interference recovery protocol and end
    /// the script. Otherwise do nothing.
    Recover { max_attempts: u32 },
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum StepParseError {
    #[error("Step contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ScriptStep {
    /// Parse a step from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, StepParseError> {
        serde_json::from_str(json_str).map_err(StepParseError::InvalidJson)
    }
}
