//! # Fleet
//!
//! Vehicle records, the fleet that owns them alongside their motion intent strategies, and the
//! grid layout used to place the fleet at the start of a run.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::platform::Telemetry;
use log::debug;
use nalgebra::{Point2, Point3};
use serde::Deserialize;

use crate::{
    heading::normalise_heading,
    intent::{IntentFactory, MotionIntent},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Kinematic and mission state of one vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    /// Unique id of the vehicle on the platform.
    pub id: String,

    /// Position in the platform frame.
    ///
    /// Units: meters
    pub position_m: Point3<f64>,

    /// Heading, kept in [0, 2pi).
    ///
    /// Units: radians
    pub heading_rad: f64,

    /// Sub-target the vehicle is flying to, `None` until one has been assigned from the current
    /// waypoint.
    pub sub_target_m: Option<Point2<f64>>,

    /// Metric published by the vehicle's strategy.
    pub metric: f64,
}

/// The set of vehicles under control together with one strategy per vehicle.
///
/// Vehicles keep the order they were created in, which fixes the order they are processed in each
/// tick.
pub struct Fleet {
    vehicles: Vec<Vehicle>,

    /// Strategy for each vehicle, same indexing as `vehicles`.
    intents: Vec<Box<dyn MotionIntent>>,
}

/// Parameters of the initial grid layout of the fleet.
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutParams {
    /// Number of vehicles in the fleet
    pub num_vehicles: usize,

    /// Spacing between vehicles along a row.
    ///
    /// Units: meters
    pub separation_m: f64,

    /// Number of vehicles per row
    pub row_length: usize,

    /// X coordinate rows are laid out back from.
    ///
    /// Units: meters
    pub origin_x_m: f64,

    /// Spacing between columns.
    ///
    /// Units: meters
    pub col_spacing_m: f64,

    /// Starting altitude.
    ///
    /// Units: meters
    pub altitude_m: f64,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Ids and starting positions of the fleet described by the layout.
///
/// Vehicles are named `Drone1..DroneN`. The row index cycles through `1..=row_length` and the
/// column increments each time a row is filled.
pub fn layout_positions(params: &LayoutParams) -> Vec<(String, Point3<f64>)> {
    let row_length = params.row_length.max(1);

    (0..params.num_vehicles)
        .map(|i| {
            let row = (i % row_length + 1) as f64;
            let col = (i / row_length + 1) as f64;

            (
                format!("Drone{}", i + 1),
                Point3::new(
                    params.origin_x_m - params.separation_m * row,
                    params.col_spacing_m * col,
                    params.altitude_m,
                ),
            )
        })
        .collect()
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Vehicle {
    pub fn new(id: &str, position_m: Point3<f64>) -> Self {
        Self {
            id: id.to_string(),
            position_m,
            heading_rad: 0.0,
            sub_target_m: None,
            metric: 0.0,
        }
    }

    /// Horizontal position.
    pub fn position_xy(&self) -> Point2<f64> {
        Point2::new(self.position_m.x, self.position_m.y)
    }

    /// Update the kinematic state from platform telemetry, normalising the heading.
    pub fn update_from_telemetry(&mut self, telem: &Telemetry) {
        let [x, y, z] = telem.position_m;
        self.position_m = Point3::new(x, y, z);
        self.heading_rad = normalise_heading(telem.heading_rad);
    }
}

impl Fleet {
    /// Build a fleet, creating one strategy per vehicle from the factory.
    pub fn new<F>(vehicles: Vec<Vehicle>, factory: &F) -> Self
    where
        F: IntentFactory + ?Sized,
    {
        let intents = vehicles
            .iter()
            .map(|v| {
                let intent = factory.create(&v.id);
                debug_assert_eq!(intent.vehicle_id(), v.id);
                intent
            })
            .collect();

        Self { vehicles, intents }
    }

    /// Build a fleet placed according to the layout parameters.
    pub fn from_layout<F>(params: &LayoutParams, factory: &F) -> Self
    where
        F: IntentFactory + ?Sized,
    {
        let vehicles = layout_positions(params)
            .into_iter()
            .map(|(id, pos)| {
                debug!("{} placed at {}", id, pos);
                Vehicle::new(&id, pos)
            })
            .collect();

        Self::new(vehicles, factory)
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, index: usize) -> Option<&Vehicle> {
        self.vehicles.get(index)
    }

    pub fn vehicle_mut(&mut self, index: usize) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(index)
    }

    /// Horizontal positions of every vehicle except the one at `index`.
    pub fn others_xy(&self, index: usize) -> Vec<Point2<f64>> {
        self.vehicles
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, v)| v.position_xy())
            .collect()
    }

    /// Mutable access to a vehicle and its strategy at the same time.
    pub fn split_mut(&mut self, index: usize) -> Option<(&mut Vehicle, &mut Box<dyn MotionIntent>)> {
        match (self.vehicles.get_mut(index), self.intents.get_mut(index)) {
            (Some(v), Some(i)) => Some((v, i)),
            _ => None,
        }
    }

    /// Clear every vehicle's sub-target, forcing fresh assignment from the next waypoint.
    pub fn clear_sub_targets(&mut self) {
        for v in self.vehicles.iter_mut() {
            v.sub_target_m = None;
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::intent::{MoveIntent, OrbitIntent, OrbitTarget};

    /// Strategy which always asks for the same motion.
    pub(crate) struct ConstIntent {
        pub id: String,
        pub intent: MoveIntent,
        pub orbit: OrbitIntent,
        pub metric: f64,
    }

    impl MotionIntent for ConstIntent {
        fn vehicle_id(&self) -> &str {
            &self.id
        }

        fn next_move(&mut self, _own: &Vehicle, _others: &[Point2<f64>]) -> MoveIntent {
            self.intent
        }

        fn orbit(
            &mut self,
            _own: &Vehicle,
            _moving_heading_rad: f64,
            _target: &OrbitTarget,
        ) -> OrbitIntent {
            self.orbit
        }

        fn metric(&self) -> f64 {
            self.metric
        }
    }

    pub(crate) fn const_factory(intent: MoveIntent) -> impl Fn(&str) -> Box<dyn MotionIntent> {
        move |id: &str| {
            Box::new(ConstIntent {
                id: id.to_string(),
                intent,
                orbit: OrbitIntent {
                    speed_ms: intent.speed_ms,
                    turn_rate_rads: intent.turn_rate_rads,
                    facing_rate_rads: None,
                },
                metric: 0.0,
            }) as Box<dyn MotionIntent>
        }
    }

    fn layout(num_vehicles: usize, row_length: usize) -> LayoutParams {
        LayoutParams {
            num_vehicles,
            separation_m: 10.0,
            row_length,
            origin_x_m: 100.0,
            col_spacing_m: 25.0,
            altitude_m: -2.0,
        }
    }

    #[test]
    fn test_layout_positions() {
        let positions = layout_positions(&layout(5, 2));

        let expected = vec![
            ("Drone1", [90.0, 25.0]),
            ("Drone2", [80.0, 25.0]),
            ("Drone3", [90.0, 50.0]),
            ("Drone4", [80.0, 50.0]),
            ("Drone5", [90.0, 75.0]),
        ];

        assert_eq!(positions.len(), expected.len());
        for ((id, pos), (e_id, e_xy)) in positions.iter().zip(expected.iter()) {
            assert_eq!(id, e_id);
            assert_eq!(pos.x, e_xy[0]);
            assert_eq!(pos.y, e_xy[1]);
            assert_eq!(pos.z, -2.0);
        }
    }

    #[test]
    fn test_fleet_binds_one_strategy_per_vehicle() {
        let mut fleet = Fleet::from_layout(&layout(3, 3), &const_factory(MoveIntent::hold()));

        assert_eq!(fleet.len(), 3);
        for i in 0..3 {
            let (v, intent) = fleet.split_mut(i).unwrap();
            assert_eq!(intent.vehicle_id(), v.id);
        }
        assert!(fleet.split_mut(3).is_none());
    }

    #[test]
    fn test_others_excludes_self() {
        let fleet = Fleet::from_layout(&layout(3, 3), &const_factory(MoveIntent::hold()));

        let others = fleet.others_xy(1);
        assert_eq!(others, vec![Point2::new(90.0, 25.0), Point2::new(70.0, 25.0)]);
    }

    #[test]
    fn test_telemetry_update_normalises_heading() {
        let mut v = Vehicle::new("Drone1", Point3::new(0.0, 0.0, 0.0));

        v.update_from_telemetry(&Telemetry {
            position_m: [1.0, 2.0, -2.0],
            heading_rad: -std::f64::consts::FRAC_PI_2,
        });

        assert_eq!(v.position_m, Point3::new(1.0, 2.0, -2.0));
        assert!((v.heading_rad - 1.5 * std::f64::consts::PI).abs() < 1e-12);
    }
}
