//! Host platform utility functions

use std::path::PathBuf;

/// Name of the environment variable pointing at the software root directory, the directory
/// containing `params/`, `scripts/` and `sessions/`.
pub const SW_ROOT_ENV_VAR: &str = "AUTON_SW_ROOT";

/// Get the software root directory from the environment.
pub fn get_sw_root() -> Result<PathBuf, std::env::VarError> {
    std::env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
