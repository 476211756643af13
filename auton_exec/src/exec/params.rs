//! Parameters structure for the Executor

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the Executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecParams {
    /// Time to wait between each query of the status of a motion while blocking.
    ///
    /// Units: milliseconds
    pub poll_period_ms: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ExecParams {
    fn default() -> Self {
        Self { poll_period_ms: 10 }
    }
}
