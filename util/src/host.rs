//! Host platform utility functions

use std::path::PathBuf;

/// Environment variable which points at the root of the software checkout.
///
/// Parameter files are read from `$SWARM_SW_ROOT/params` and sessions are
/// written into `$SWARM_SW_ROOT/sessions`.
pub const SW_ROOT_ENV_VAR: &str = "SWARM_SW_ROOT";

/// Get the software root directory from the environment.
pub fn get_swarm_sw_root() -> Result<PathBuf, std::env::VarError> {
    std::env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
