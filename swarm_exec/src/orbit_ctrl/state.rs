//! Implementations for the OrbitCtrl state structure

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::platform::ActDems;
use log::{debug, info, trace, warn};
use nalgebra::Point2;
use std::time::Instant;
use util::time::sleep_remainder;

use super::{CancelToken, OrbitCtrlError, Params};
use crate::{
    fleet::Fleet,
    heading::{smooth_orbit_headings, velocity_vector, OrbitHeadings},
    intent::OrbitTarget,
    platform::{retry_once, Platform},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Orbit control state
pub struct OrbitCtrl {
    params: Params,

    target: OrbitTarget,

    cancel: CancelToken,

    num_ticks: u64,

    /// Heading each vehicle is translating along, `None` until its first telemetry.
    moving_headings: Vec<Option<f64>>,

    report: StatusReport,
}

/// Status report for OrbitCtrl processing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatusReport {
    pub tick: u64,

    /// Vehicles circling the target.
    pub num_orbiting: usize,

    /// Vehicles still flying towards the target.
    pub num_approaching: usize,

    pub num_stalled: usize,
    pub num_faulted: usize,

    pub num_commands: usize,
}

/// Outcome of processing one vehicle in a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
enum VehicleOutcome {
    Orbiting,
    Approaching,
    Stalled,
    Faulted,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl OrbitCtrl {
    pub fn new(params: Params) -> Result<Self, OrbitCtrlError> {
        params.validate()?;

        let target = OrbitTarget {
            name: params.target_name.clone(),
            position_m: Point2::new(params.target_position_m[0], params.target_position_m[1]),
        };

        Ok(Self {
            params,
            target,
            cancel: CancelToken::new(),
            num_ticks: 0,
            moving_headings: Vec::new(),
            report: StatusReport::default(),
        })
    }

    /// A token which stops the controller when cancelled.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Request the controller to stop at the next tick boundary.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn target(&self) -> &OrbitTarget {
        &self.target
    }

    pub fn num_ticks(&self) -> u64 {
        self.num_ticks
    }

    pub fn report(&self) -> StatusReport {
        self.report
    }

    /// Run the controller until it is cancelled, returning the number of ticks executed.
    ///
    /// The platform is released when the run ends.
    pub fn run(
        &mut self,
        fleet: &mut Fleet,
        platform: &mut dyn Platform,
    ) -> Result<u64, OrbitCtrlError> {
        info!("Orbiting {} at {}", self.target.name, self.target.position_m);

        let res = self.run_until_cancelled(fleet, platform);
        platform.release();

        if res.is_ok() {
            info!("Orbit cancelled after {} ticks", self.num_ticks);
        }
        res
    }

    fn run_until_cancelled(
        &mut self,
        fleet: &mut Fleet,
        platform: &mut dyn Platform,
    ) -> Result<u64, OrbitCtrlError> {
        while !self.cancel.is_cancelled() {
            let cycle_start = Instant::now();

            self.proc(fleet, platform)?;

            if self.params.cycle_period_s > 0.0 {
                if let Some(overrun_s) = sleep_remainder(cycle_start, self.params.cycle_period_s)
                {
                    warn!("Cycle overran by {:.06} s", overrun_s);
                }
            }
        }

        Ok(self.num_ticks)
    }

    /// Perform one tick of orbit control.
    pub fn proc(
        &mut self,
        fleet: &mut Fleet,
        platform: &mut dyn Platform,
    ) -> Result<StatusReport, OrbitCtrlError> {
        if fleet.is_empty() {
            return Err(OrbitCtrlError::EmptyFleet);
        }

        let is_first_tick = self.num_ticks == 0;
        self.moving_headings.resize(fleet.len(), None);

        let mut report = StatusReport {
            tick: self.num_ticks,
            ..Default::default()
        };

        for i in 0..fleet.len() {
            match self.proc_vehicle(fleet, platform, i, is_first_tick) {
                VehicleOutcome::Orbiting => report.num_orbiting += 1,
                VehicleOutcome::Approaching => report.num_approaching += 1,
                VehicleOutcome::Stalled => report.num_stalled += 1,
                VehicleOutcome::Faulted => report.num_faulted += 1,
            }
        }
        report.num_commands = report.num_orbiting + report.num_approaching;

        trace!("OrbitCtrl report: {:?}", report);

        self.num_ticks += 1;
        self.report = report;

        Ok(report)
    }

    fn proc_vehicle(
        &mut self,
        fleet: &mut Fleet,
        platform: &mut dyn Platform,
        index: usize,
        is_first_tick: bool,
    ) -> VehicleOutcome {
        let (vehicle, intent) = match fleet.split_mut(index) {
            Some(p) => p,
            None => return VehicleOutcome::Faulted,
        };
        let id = vehicle.id.clone();

        let telem = match retry_once(&format!("Telemetry request for {}", id), || {
            platform.get_telemetry(&id)
        }) {
            Ok(t) => t,
            Err(e) => {
                warn!("{} faulted, no telemetry: {}", id, e);
                return VehicleOutcome::Faulted;
            }
        };
        vehicle.update_from_telemetry(&telem);

        let current = OrbitHeadings {
            moving_rad: self.moving_headings[index].unwrap_or(vehicle.heading_rad),
            facing_rad: vehicle.heading_rad,
        };

        let orbit_intent = intent.orbit(vehicle, current.moving_rad, &self.target);
        vehicle.metric = intent.metric();

        if let Err(e) = orbit_intent.validate(self.params.v_max_ms) {
            warn!("{} stalled: {}", id, e);
            return VehicleOutcome::Stalled;
        }

        let headings = smooth_orbit_headings(
            current,
            orbit_intent.turn_rate_rads,
            orbit_intent.facing_rate_rads,
            is_first_tick,
            self.params.heading_damping,
        );
        let velocity_ms = velocity_vector(orbit_intent.speed_ms, headings.moving_rad);

        let dems = ActDems {
            vehicle_id: id.clone(),
            velocity_ms: [velocity_ms.x, velocity_ms.y],
            altitude_m: self.params.altitude_m,
            duration_s: self.params.cmd_duration_s,
            heading_rad: headings.facing_rad,
        };

        if let Err(e) = retry_once(&format!("Actuation of {}", id), || platform.actuate(&dems)) {
            warn!("{} faulted, demands not actuated: {}", id, e);
            return VehicleOutcome::Faulted;
        }

        if self.moving_headings[index].is_none() {
            debug!("{} joined the orbit of {}", id, self.target.name);
        }
        self.moving_headings[index] = Some(headings.moving_rad);

        match orbit_intent.facing_rate_rads {
            Some(_) => VehicleOutcome::Orbiting,
            None => VehicleOutcome::Approaching,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        fleet::{test::ConstIntent, Vehicle},
        intent::{IntentFactory, MotionIntent, MoveIntent, OrbitIntent, SeekIntent, SeekParams},
        platform::sim::KinematicSim,
    };
    use nalgebra::Point3;
    use std::{f64::consts::TAU, thread, time::Duration};

    fn params() -> Params {
        Params {
            target_name: "Cube".into(),
            target_position_m: [50.0, 0.0],
            v_max_ms: 2.0,
            cmd_duration_s: 0.1,
            altitude_m: -2.0,
            heading_damping: 0.5,
            cycle_period_s: 0.0,
        }
    }

    fn build_fleet<F>(positions: &[[f64; 2]], factory: &F) -> (Fleet, KinematicSim)
    where
        F: IntentFactory,
    {
        let mut sim = KinematicSim::new(1.0);
        let vehicles = positions
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let id = format!("Drone{}", i + 1);
                sim.add_vehicle(&id, [p[0], p[1], -2.0], 0.0);
                Vehicle::new(&id, Point3::new(p[0], p[1], -2.0))
            })
            .collect();

        (Fleet::new(vehicles, factory), sim)
    }

    fn const_orbit_factory(orbit: OrbitIntent) -> impl Fn(&str) -> Box<dyn MotionIntent> {
        move |id: &str| {
            Box::new(ConstIntent {
                id: id.to_string(),
                intent: MoveIntent::hold(),
                orbit,
                metric: 0.0,
            }) as Box<dyn MotionIntent>
        }
    }

    #[test]
    fn test_moving_and_facing_split() {
        let orbit = OrbitIntent {
            speed_ms: 1.0,
            turn_rate_rads: 0.4,
            facing_rate_rads: Some(-0.4),
        };
        let mut ctrl = OrbitCtrl::new(params()).unwrap();
        let (mut fleet, mut sim) = build_fleet(&[[0.0, 0.0]], &const_orbit_factory(orbit));

        // First tick holds both headings
        let report = ctrl.proc(&mut fleet, &mut sim).unwrap();
        assert_eq!(report.num_orbiting, 1);
        let t = sim.get_telemetry("Drone1").unwrap();
        assert_eq!(t.heading_rad, 0.0);
        assert_eq!(t.position_m, [0.1, 0.0, -2.0]);

        // Then translates along the moving heading while facing the other way
        ctrl.proc(&mut fleet, &mut sim).unwrap();
        let t = sim.get_telemetry("Drone1").unwrap();
        assert!((t.heading_rad - (TAU - 0.2)).abs() < 1e-12);
        assert!((t.position_m[0] - (0.1 + 0.1 * 0.2f64.cos())).abs() < 1e-4);
        assert!((t.position_m[1] - 0.1 * 0.2f64.sin()).abs() < 1e-4);
    }

    #[test]
    fn test_invalid_orbit_stalls() {
        let orbit = OrbitIntent {
            speed_ms: 1.0,
            turn_rate_rads: 0.0,
            facing_rate_rads: Some(std::f64::NAN),
        };
        let mut ctrl = OrbitCtrl::new(params()).unwrap();
        let (mut fleet, mut sim) = build_fleet(&[[0.0, 0.0]], &const_orbit_factory(orbit));

        let report = ctrl.proc(&mut fleet, &mut sim).unwrap();
        assert_eq!(report.num_stalled, 1);
        assert_eq!(sim.num_actuations(), 0);
    }

    #[test]
    fn test_empty_fleet() {
        let mut ctrl = OrbitCtrl::new(params()).unwrap();
        let (mut fleet, mut sim) = build_fleet(&[], &const_orbit_factory(OrbitIntent {
            speed_ms: 0.0,
            turn_rate_rads: 0.0,
            facing_rate_rads: None,
        }));

        assert!(matches!(
            ctrl.run(&mut fleet, &mut sim),
            Err(OrbitCtrlError::EmptyFleet)
        ));
        assert!(sim.is_released());
    }

    #[test]
    fn test_cancelled_before_start() {
        let mut ctrl = OrbitCtrl::new(params()).unwrap();
        let (mut fleet, mut sim) = build_fleet(&[[0.0, 0.0]], &const_orbit_factory(OrbitIntent {
            speed_ms: 1.0,
            turn_rate_rads: 0.0,
            facing_rate_rads: None,
        }));

        ctrl.stop();
        assert_eq!(ctrl.run(&mut fleet, &mut sim).unwrap(), 0);
        assert_eq!(sim.num_actuations(), 0);
        assert!(sim.is_released());
    }

    #[test]
    fn test_cancelled_from_another_thread() {
        let mut p = params();
        p.cycle_period_s = 0.005;

        let mut ctrl = OrbitCtrl::new(p).unwrap();
        let (mut fleet, mut sim) = build_fleet(&[[0.0, 0.0], [0.0, 10.0]], &const_orbit_factory(
            OrbitIntent {
                speed_ms: 1.0,
                turn_rate_rads: 0.1,
                facing_rate_rads: None,
            },
        ));

        let token = ctrl.cancel_token();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            token.cancel();
        });

        let num_ticks = ctrl.run(&mut fleet, &mut sim).unwrap();
        canceller.join().unwrap();

        assert!(num_ticks > 0);
        assert_eq!(sim.num_actuations(), 2 * num_ticks as usize);
        assert!(sim.is_released());
    }

    #[test]
    fn test_seek_settles_into_orbit() {
        let seek = SeekParams {
            v_max_ms: 2.0,
            min_distance_m: 1.0,
            max_distance_m: 100.0,
            speed_gain: 0.5,
            orbit_radius_m: 10.0,
            orbit_band_m: 2.0,
        };
        let mut ctrl = OrbitCtrl::new(params()).unwrap();
        let (mut fleet, mut sim) = build_fleet(&[[0.0, 0.0]], &SeekIntent::factory(seek));

        for _ in 0..600 {
            ctrl.proc(&mut fleet, &mut sim).unwrap();
        }

        let t = sim.get_telemetry("Drone1").unwrap();
        let target = ctrl.target().position_m;
        let dx = target.x - t.position_m[0];
        let dy = target.y - t.position_m[1];
        let dist_m = (dx * dx + dy * dy).sqrt();
        assert!(dist_m > 7.5 && dist_m < 12.5, "orbit distance {}", dist_m);

        // Facing the target
        let bearing = dy.atan2(dx);
        let facing_err = util::maths::get_ang_dist_2pi(
            t.heading_rad,
            util::maths::map_pi_to_2pi(bearing),
        );
        assert!(facing_err.abs() < 0.25, "facing error {}", facing_err);
        assert_eq!(ctrl.report().num_orbiting, 1);
    }
}
