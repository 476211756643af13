//! # Autonomous Executable Parameters
//!
//! Every section is optional, a missing section or key takes its default value.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::{
    calib::CalibParams,
    drive::{DriveConfig, SimParams},
    exec::ExecParams,
    recovery::RecoveryParams,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutonExecParams {
    pub exec: ExecParams,

    pub recovery: RecoveryParams,

    pub calib: CalibParams,

    /// Configuration of the drive controller, including the installed tracking wheel offsets
    pub drive: DriveConfig,

    /// The simulated drivetrain the executable runs against
    pub sim: SimParams,
}
