//! # Platform module
//!
//! The platform is whatever actually flies the vehicles, a simulator or a real fleet. The
//! controllers only talk to it through the [`Platform`] trait, reading telemetry and sending
//! actuation demands one vehicle at a time.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod net;
pub mod sim;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::platform::{ActDems, Telemetry},
    net::{JsonMsgError, MonitoredSocketError},
};
use log::warn;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum PlatformError {
    #[error("The platform is not connected")]
    NotConnected,

    #[error("The platform has no vehicle called {0}")]
    UnknownVehicle(String),

    #[error("The platform rejected the demands for {0}")]
    DemsRejected(String),

    #[error("Socket error: {0}")]
    Socket(MonitoredSocketError),

    #[error("Message error: {0}")]
    Json(JsonMsgError),

    #[error("Unexpected response from the platform: {0}")]
    UnexpectedResponse(String),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Access to the vehicles being controlled.
pub trait Platform {
    /// Get the latest telemetry of a vehicle.
    fn get_telemetry(&mut self, vehicle_id: &str) -> Result<Telemetry, PlatformError>;

    /// Send actuation demands to the vehicle they are addressed to.
    fn actuate(&mut self, dems: &ActDems) -> Result<(), PlatformError>;

    /// Release the platform, after which no further demands will be sent.
    fn release(&mut self);
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Run a platform operation, retrying it once if it fails.
///
/// The first failure is logged as a warning, the second is returned to the caller.
pub fn retry_once<T, F>(desc: &str, mut op: F) -> Result<T, PlatformError>
where
    F: FnMut() -> Result<T, PlatformError>,
{
    match op() {
        Ok(t) => Ok(t),
        Err(e) => {
            warn!("{} failed, retrying: {}", desc, e);
            op()
        }
    }
}
