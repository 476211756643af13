//! Parameters of the interference recovery

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryParams {
    /// Number of escape drives to make before giving up.
    pub max_attempts: u32,

    /// Units: inches
    pub escape_distance_in: f64,

    /// Speed of the escape drive, out of 127.
    pub escape_speed: i32,

    /// Units: inches
    pub nudge_distance_in: f64,

    /// Speed of the nudge between attempts, out of 127.
    pub nudge_speed: i32,

    /// Time to wait after the nudge before the next attempt.
    ///
    /// Units: milliseconds
    pub settle_delay_ms: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for RecoveryParams {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            escape_distance_in: -24.0,
            escape_speed: 127,
            nudge_distance_in: -2.0,
            nudge_speed: 20,
            settle_delay_ms: 1000,
        }
    }
}
