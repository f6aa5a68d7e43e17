//! # Swarm library.
//!
//! This library allows other crates in the workspace to access items defined inside the swarm
//! crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arrival and offset policy - sub-target assignment, arrival checks, and the arrival tally
pub mod arrival;

/// Fleet - vehicle records, their strategies, and the initial layout
pub mod fleet;

/// Formation control - flies the fleet through a queue of shared waypoints
pub mod form_ctrl;

/// Heading smoother - damped heading integration and velocity vectors
pub mod heading;

/// Motion intent strategies - per vehicle speed and turn demands
pub mod intent;

/// Orbit control - circles the fleet around a target until cancelled
pub mod orbit_ctrl;

/// Executable parameters
pub mod params;

/// Platform - access to the vehicles, simulated or networked
pub mod platform;

/// Telemetry log - tabular record of the fleet's positions and metrics
pub mod telem_log;
