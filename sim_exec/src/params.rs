//! # Simulation Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
pub struct SimExecParams {
    /// Endpoint the platform server binds to
    pub platform_endpoint: String,

    /// Fraction of each demand's duration which is simulated
    pub time_scale: f64,
}
