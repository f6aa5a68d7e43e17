//! # Kinematic simulation platform
//!
//! An in-process platform which integrates velocity demands directly into vehicle positions. Used
//! by the simulation executable, for offline runs of the controllers, and in tests.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::platform::{ActDems, Telemetry};
use log::{debug, info};
use std::collections::HashMap;

use super::{Platform, PlatformError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Simulated vehicle body.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Body {
    position_m: [f64; 3],
    heading_rad: f64,
}

pub struct KinematicSim {
    bodies: HashMap<String, Body>,

    /// Fraction of each demand's duration which is simulated. A value of 1 moves the vehicle by
    /// the full `velocity * duration`.
    time_scale: f64,

    num_actuations: usize,

    actuations_per_vehicle: HashMap<String, usize>,

    released: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl KinematicSim {
    pub fn new(time_scale: f64) -> Self {
        Self {
            bodies: HashMap::new(),
            time_scale,
            num_actuations: 0,
            actuations_per_vehicle: HashMap::new(),
            released: false,
        }
    }

    /// Add a vehicle to the simulation, replacing any existing vehicle with the same id.
    pub fn add_vehicle(&mut self, vehicle_id: &str, position_m: [f64; 3], heading_rad: f64) {
        debug!("Simulating {} at {:?}", vehicle_id, position_m);

        self.bodies.insert(
            vehicle_id.to_string(),
            Body {
                position_m,
                heading_rad,
            },
        );
    }

    /// Total number of accepted demands since creation.
    pub fn num_actuations(&self) -> usize {
        self.num_actuations
    }

    /// Number of accepted demands for one vehicle.
    pub fn num_actuations_of(&self, vehicle_id: &str) -> usize {
        self.actuations_per_vehicle
            .get(vehicle_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Move a vehicle without going through demands.
    pub fn teleport(&mut self, vehicle_id: &str, position_m: [f64; 3]) -> Result<(), PlatformError> {
        let body = self
            .bodies
            .get_mut(vehicle_id)
            .ok_or_else(|| PlatformError::UnknownVehicle(vehicle_id.to_string()))?;

        body.position_m = position_m;
        Ok(())
    }
}

impl Platform for KinematicSim {
    fn get_telemetry(&mut self, vehicle_id: &str) -> Result<Telemetry, PlatformError> {
        self.bodies
            .get(vehicle_id)
            .map(|b| Telemetry {
                position_m: b.position_m,
                heading_rad: b.heading_rad,
            })
            .ok_or_else(|| PlatformError::UnknownVehicle(vehicle_id.to_string()))
    }

    fn actuate(&mut self, dems: &ActDems) -> Result<(), PlatformError> {
        if !dems.is_valid() {
            return Err(PlatformError::DemsRejected(dems.vehicle_id.clone()));
        }

        let body = self
            .bodies
            .get_mut(&dems.vehicle_id)
            .ok_or_else(|| PlatformError::UnknownVehicle(dems.vehicle_id.clone()))?;

        let dt_s = dems.duration_s * self.time_scale;
        body.position_m[0] += dems.velocity_ms[0] * dt_s;
        body.position_m[1] += dems.velocity_ms[1] * dt_s;
        body.position_m[2] = dems.altitude_m;
        body.heading_rad = dems.heading_rad;

        self.num_actuations += 1;
        *self
            .actuations_per_vehicle
            .entry(dems.vehicle_id.clone())
            .or_insert(0) += 1;

        Ok(())
    }

    fn release(&mut self) {
        if !self.released {
            info!("Simulated platform released");
        }
        self.released = true;
    }
}
