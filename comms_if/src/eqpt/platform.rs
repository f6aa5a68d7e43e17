//! # Vehicle Platform Interface
//!
//! Structures exchanged between the swarm controller and the platform (simulated or physical)
//! that flies the vehicles.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Kinematic state of one vehicle as reported by the platform.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    /// Position of the vehicle in the platform frame.
    ///
    /// Units: meters
    pub position_m: [f64; 3],

    /// Heading (yaw) of the vehicle. The platform may report this in any range, the controller
    /// normalises it.
    ///
    /// Units: radians
    pub heading_rad: f64,
}

/// Actuation demands for a single vehicle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActDems {
    /// The vehicle the demands are addressed to
    pub vehicle_id: String,

    /// Horizontal velocity demand (x, y).
    ///
    /// Units: meters/second
    pub velocity_ms: [f64; 2],

    /// Altitude to hold while executing the demand.
    ///
    /// Units: meters
    pub altitude_m: f64,

    /// How long the demand shall be executed for.
    ///
    /// Units: seconds
    pub duration_s: f64,

    /// Heading the vehicle shall face while executing the demand.
    ///
    /// Units: radians
    pub heading_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Requests sent from the platform client to the platform server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum PlatformRequest {
    /// Request the latest telemetry of the given vehicle
    GetTelemetry { vehicle_id: String },

    /// Actuate the given demands
    Actuate(ActDems),

    /// The client is releasing its connection, the server may stop all vehicles
    Release,
}

/// Response from the platform server to a [`PlatformRequest`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum PlatformResponse {
    /// Telemetry for the requested vehicle
    Telemetry(Telemetry),

    /// Demands were valid and will be executed
    DemsOk,

    /// Demands were invalid and have been rejected
    DemsInvalid,

    /// The requested vehicle does not exist on the platform
    UnknownVehicle(String),

    /// Release acknowledged
    Released,

    /// The request could not be understood
    InvalidRequest(String),
}

impl ActDems {
    /// Demands which hold the vehicle in place at the given altitude.
    pub fn hold(vehicle_id: &str, altitude_m: f64, duration_s: f64, heading_rad: f64) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            velocity_ms: [0.0, 0.0],
            altitude_m,
            duration_s,
            heading_rad,
        }
    }

    /// Check that every field of the demands is finite and the duration is positive.
    pub fn is_valid(&self) -> bool {
        self.velocity_ms.iter().all(|v| v.is_finite())
            && self.altitude_m.is_finite()
            && self.heading_rad.is_finite()
            && self.duration_s.is_finite()
            && self.duration_s > 0.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_request_json() {
        let req = PlatformRequest::GetTelemetry {
            vehicle_id: "Drone1".into(),
        };
        let s = serde_json::to_string(&req).unwrap();
        assert_eq!(s, r#"{"GetTelemetry":{"vehicle_id":"Drone1"}}"#);
        assert_eq!(serde_json::from_str::<PlatformRequest>(&s).unwrap(), req);
    }

    #[test]
    fn test_dems_validity() {
        let mut dems = ActDems::hold("Drone1", -2.0, 1.0, 0.0);
        assert!(dems.is_valid());

        dems.velocity_ms[0] = std::f64::NAN;
        assert!(!dems.is_valid());

        let dems = ActDems::hold("Drone1", -2.0, 0.0, 0.0);
        assert!(!dems.is_valid());
    }
}
