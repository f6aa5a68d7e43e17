//! # Swarm Executable Parameters
//!
//! This module provide parameters for the swarm executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::fleet::LayoutParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SwarmExecParams {
    /// Number of vehicles in the fleet
    pub num_vehicles: usize,

    /// Spacing between vehicles along a row of the initial layout.
    ///
    /// Units: meters
    pub separation_m: f64,

    /// Number of vehicles per row of the initial layout
    pub row_length: usize,

    /// X coordinate rows are laid out back from.
    ///
    /// Units: meters
    pub origin_x_m: f64,

    /// Spacing between columns of the initial layout.
    ///
    /// Units: meters
    pub col_spacing_m: f64,

    /// Altitude the fleet takes off to.
    ///
    /// Units: meters
    pub altitude_m: f64,

    /// Duration of the hold demand sent to every vehicle before control starts.
    ///
    /// Units: seconds
    pub takeoff_duration_s: f64,

    /// Time scale of the in-process simulation used with `--sim`.
    pub sim_time_scale: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SwarmExecParams {
    /// The initial layout of the fleet.
    pub fn layout(&self) -> LayoutParams {
        LayoutParams {
            num_vehicles: self.num_vehicles,
            separation_m: self.separation_m,
            row_length: self.row_length,
            origin_x_m: self.origin_x_m,
            col_spacing_m: self.col_spacing_m,
            altitude_m: self.altitude_m,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::intent::SeekParams;

    #[test]
    fn test_shipped_params_load() {
        let p: SwarmExecParams =
            util::params::from_str(include_str!("../../params/swarm_exec.toml")).unwrap();
        let layout = p.layout();
        assert_eq!(layout.num_vehicles, p.num_vehicles);
        assert_eq!(layout.altitude_m, p.altitude_m);

        let _: SeekParams =
            util::params::from_str(include_str!("../../params/seek_intent.toml")).unwrap();
    }
}
