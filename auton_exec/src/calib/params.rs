//! Parameters of the offset calibration

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use auton_if::motion::AngleBehavior;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibParams {
    /// Number of turns to make.
    pub iterations: u32,

    /// Turn target of even and odd numbered trials.
    ///
    /// Units: degrees
    pub targets_deg: [f64; 2],

    /// Speed of the calibration turns, out of 127.
    pub turn_speed: i32,

    pub angle_mode: AngleBehavior,

    /// Time to hold still after each turn before sampling the wheels.
    ///
    /// Units: milliseconds
    pub hold_ms: u64,

    /// Trials turning through less than this are rejected.
    ///
    /// Units: radians
    pub min_angle_delta_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CalibParams {
    /// Turn target of the given trial.
    pub fn target_deg(&self, trial: u32) -> f64 {
        self.targets_deg[(trial % 2) as usize]
    }
}

impl Default for CalibParams {
    fn default() -> Self {
        Self {
            iterations: 10,
            targets_deg: [90.0, 270.0],
            turn_speed: 63,
            angle_mode: AngleBehavior::Raw,
            hold_ms: 250,
            min_angle_delta_rad: 0.01,
        }
    }
}
