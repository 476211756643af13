//! # Tracking wheel offset calibration
//!
//! Measures the offset of each fitted tracking wheel from the robot's center of rotation by
//! turning in place a number of times. For each trial the distance travelled by each wheel is
//! divided by the angle turned, giving the wheel's turning radius. The radii are averaged over all
//! valid trials and written back to the wheels.
//!
//! A trial in which the robot didn't measurably turn can't be used, as dividing by its angle
//! would give an infinite offset. Such trials are rejected and excluded from the average.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod state;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use params::CalibParams;
pub use state::*;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::exec::ExecError;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CalibrationError {
    #[error("No tracking wheels are fitted to calibrate")]
    NoTrackers,

    #[error("None of the {0} trials turned far enough to measure, no offsets were changed")]
    NoValidTrials(u32),

    #[error("Could not execute a calibration turn: {0}")]
    Exec(#[from] ExecError),
}
