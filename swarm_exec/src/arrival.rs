//! # Arrival and offset policy
//!
//! Decides when a vehicle has reached its sub-target, spreads the vehicles converging on a shared
//! waypoint over distinct sub-targets, and tallies how many vehicles have arrived in a tick.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Point2;
use serde::Serialize;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Outcome of processing one vehicle in a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArrivalStatus {
    /// Not yet processed this tick.
    Pending,

    /// A fresh sub-target was assigned this tick, the vehicle is moving towards it.
    Assigned,

    /// The vehicle is moving towards its sub-target.
    EnRoute,

    /// The vehicle is within tolerance of its sub-target and holding position.
    Arrived,

    /// The strategy returned an unusable intent, no command was sent.
    Stalled,

    /// The platform could not be reached for this vehicle.
    Faulted,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Per-tick record of each vehicle's arrival status.
///
/// The tally is rebuilt every tick, nothing carries over, so a vehicle drifting away from its
/// sub-target immediately stops counting as arrived.
#[derive(Debug, Clone)]
pub struct ArrivalTally {
    statuses: Vec<ArrivalStatus>,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Spacing between neighbouring sub-targets around a shared waypoint.
pub fn sub_target_offset_m(min_distance_m: f64) -> f64 {
    2.0 * min_distance_m
}

/// Sub-target of the `k`th vehicle assigned around `waypoint`.
///
/// Vehicles are staggered diagonally, `-x` and `+y`, so that none converge on the same point.
pub fn assign_sub_target(waypoint_m: &Point2<f64>, k: usize, offset_m: f64) -> Point2<f64> {
    let shift = k as f64 * offset_m;
    Point2::new(waypoint_m.x - shift, waypoint_m.y + shift)
}

/// Horizontal distance between a position and a sub-target.
pub fn distance_to_sub_target(position_m: &Point2<f64>, sub_target_m: &Point2<f64>) -> f64 {
    nalgebra::distance(position_m, sub_target_m)
}

/// A vehicle has arrived when it is strictly closer than `close_enough_m` to its sub-target.
pub fn is_arrived(position_m: &Point2<f64>, sub_target_m: &Point2<f64>, close_enough_m: f64) -> bool {
    distance_to_sub_target(position_m, sub_target_m) < close_enough_m
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArrivalTally {
    /// Create a tally for a fleet of the given size with every vehicle pending.
    pub fn new(fleet_size: usize) -> Self {
        Self {
            statuses: vec![ArrivalStatus::Pending; fleet_size],
        }
    }

    /// Record the outcome for the vehicle at `index`.
    pub fn set(&mut self, index: usize, status: ArrivalStatus) {
        if let Some(s) = self.statuses.get_mut(index) {
            *s = status;
        }
    }

    /// Status of the vehicle at `index`.
    pub fn get(&self, index: usize) -> Option<ArrivalStatus> {
        self.statuses.get(index).copied()
    }

    pub fn fleet_size(&self) -> usize {
        self.statuses.len()
    }

    /// Number of vehicles with the given status.
    pub fn count(&self, status: ArrivalStatus) -> usize {
        self.statuses.iter().filter(|s| **s == status).count()
    }

    pub fn num_arrived(&self) -> usize {
        self.count(ArrivalStatus::Arrived)
    }

    /// True only if the fleet is not empty and every vehicle arrived in this tick.
    pub fn is_consensus(&self) -> bool {
        !self.statuses.is_empty() && self.num_arrived() == self.statuses.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_offset_deconfliction() {
        let wp = Point2::new(25.0, 100.0);
        let offset = sub_target_offset_m(5.0);

        assert_eq!(offset, 10.0);
        assert_eq!(assign_sub_target(&wp, 0, offset), Point2::new(25.0, 100.0));
        assert_eq!(assign_sub_target(&wp, 1, offset), Point2::new(15.0, 110.0));
        assert_eq!(assign_sub_target(&wp, 2, offset), Point2::new(5.0, 120.0));
    }

    #[test]
    fn test_arrival_threshold() {
        let target = Point2::new(10.0, 10.0);

        assert!(is_arrived(&Point2::new(10.999, 10.0), &target, 1.0));
        assert!(!is_arrived(&Point2::new(11.0, 10.0), &target, 1.0));
        assert!(!is_arrived(&Point2::new(10.0, 12.5), &target, 1.0));
        assert!(is_arrived(&target, &target, 1.0));
    }

    #[test]
    fn test_tally_consensus() {
        let mut tally = ArrivalTally::new(3);
        assert!(!tally.is_consensus());

        tally.set(0, ArrivalStatus::Arrived);
        tally.set(1, ArrivalStatus::Arrived);
        tally.set(2, ArrivalStatus::EnRoute);
        assert_eq!(tally.num_arrived(), 2);
        assert!(!tally.is_consensus());

        tally.set(2, ArrivalStatus::Arrived);
        assert!(tally.is_consensus());

        // A faulted vehicle never counts as arrived
        tally.set(1, ArrivalStatus::Faulted);
        assert!(!tally.is_consensus());
        assert_eq!(tally.count(ArrivalStatus::Faulted), 1);

        // Out of range indices are ignored
        tally.set(10, ArrivalStatus::Arrived);
        assert_eq!(tally.fleet_size(), 3);
    }

    #[test]
    fn test_empty_tally_is_never_consensus() {
        assert!(!ArrivalTally::new(0).is_consensus());
    }
}
