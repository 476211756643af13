//! # Interference Recovery
//!
//! Recovers from a drive motion which stalled against an obstruction, for example the robot being
//! wedged against a wall or held by an opponent, by repeatedly trying to escape backwards.
//!
//! The [`InterferenceRecovery`] state machine has the following states:
//!
//! - `Attempting` - Drive backwards at high speed and wait for the motion to settle.
//! - `Recovering` - The escape was interfered with. Reset the drive sensors, nudge gently and
//!   wait before trying again.
//! - `Succeeded` - An escape completed without interference.
//! - `Exhausted` - Every attempt was interfered with. The caller decides what to do next.
//!
//! Stalling is a physical condition rather than a software fault, so running out of attempts is
//! reported in the [`RecoveryOutcome`] and is never an error.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod state;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use params::RecoveryParams;
pub use state::*;
