//! # Motion Script Executor
//!
//! The [`Executor`] issues motion commands to the drive controller one at a time, blocking the
//! calling script according to each command's [`WaitMode`](auton_if::motion::WaitMode):
//!
//! - `FullSettle` - block until the motion has reached its exit condition.
//! - `QuickChain` - block until the motion is close enough to its target to blend into the next
//!   command.
//! - `UntilProgress(t)` - block until the motion has travelled past `t`, then return while it
//!   continues.
//! - `UntilWaypoint(i)` - block until a path motion has passed waypoint `i`, then return while
//!   it continues.
//!
//! Blocking is implemented by polling the controller's motion status, waiting one poll period
//! between each query.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod state;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use params::ExecParams;
pub use state::*;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::drive::DriveError;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Possible errors that can occur during execution of a command.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Drive controller error: {0}")]
    DriveError(#[from] DriveError),
}
