//! # Formation control module
//!
//! Flies the fleet through an ordered queue of shared waypoints. Each vehicle is given its own
//! de-conflicted sub-target around the current waypoint, and the queue only advances once every
//! vehicle is simultaneously within tolerance of its sub-target.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod state;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

pub use params::*;
pub use state::*;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Modes of the formation controller state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormCtrlMode {
    /// Vehicles without a sub-target are being given one from the current waypoint.
    AssigningTargets,

    /// Vehicles are flying to their sub-targets.
    EnRoute,

    /// Checking whether every vehicle has arrived.
    ConsensusCheck,

    /// Every vehicle arrived, moving on to the next waypoint.
    AdvanceWaypoint,

    /// The waypoint queue is exhausted, no further commands are issued.
    Done,
}

/// Possible errors that can occur during FormCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum FormCtrlError {
    #[error("The waypoint queue is empty")]
    EmptyWaypoints,

    #[error("The fleet has no vehicles")]
    EmptyFleet,

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("The waypoint queue was not completed within {0} ticks")]
    TickLimitExceeded(u64),
}
