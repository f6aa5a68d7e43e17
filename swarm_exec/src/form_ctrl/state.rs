//! Implementations for the FormCtrl state structure

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::platform::ActDems;
use log::{debug, info, trace, warn};
use nalgebra::Point2;
use serde::Serialize;
use std::{collections::VecDeque, time::Instant};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    time::sleep_remainder,
};

use super::{FormCtrlError, FormCtrlMode, Params};
use crate::{
    arrival::{assign_sub_target, is_arrived, sub_target_offset_m, ArrivalStatus, ArrivalTally},
    fleet::Fleet,
    heading::{smooth_heading_damped, velocity_vector},
    platform::{retry_once, Platform},
    telem_log::{TelemLog, TelemSample},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Formation control state
pub struct FormCtrl {
    params: Params,

    /// Waypoints still to be flown after the current one.
    waypoints: VecDeque<Point2<f64>>,

    /// Waypoint the fleet is currently converging on, `None` once the queue is exhausted.
    current_wp_m: Option<Point2<f64>>,

    /// Index of the current waypoint in the original queue.
    wp_index: usize,

    mode: FormCtrlMode,

    num_ticks: u64,

    /// Arrival status of each vehicle in the last tick.
    tally: ArrivalTally,

    /// Set on the first tick.
    run_start: Option<Instant>,

    telem_log: Option<TelemLog>,

    report: StatusReport,
    arch_report: Option<Archiver>,
}

/// Status report for FormCtrl processing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusReport {
    pub tick: u64,

    /// Mode at the end of the tick.
    pub mode: FormCtrlMode,

    pub waypoint_index: usize,

    pub num_assigned: usize,
    pub num_en_route: usize,
    pub num_arrived: usize,
    pub num_stalled: usize,
    pub num_faulted: usize,

    /// Number of actuation demands accepted by the platform during the tick.
    pub num_commands: usize,

    /// True if the fleet reached consensus on this tick.
    pub advanced: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FormCtrl {
    /// Create a new formation controller, popping the first waypoint as the current target.
    pub fn new(params: Params) -> Result<Self, FormCtrlError> {
        params.validate()?;

        let mut waypoints: VecDeque<Point2<f64>> = params
            .waypoints_m
            .iter()
            .map(|w| Point2::new(w[0], w[1]))
            .collect();

        let current_wp_m = waypoints.pop_front().ok_or(FormCtrlError::EmptyWaypoints)?;

        Ok(Self {
            params,
            waypoints,
            current_wp_m: Some(current_wp_m),
            wp_index: 0,
            mode: FormCtrlMode::AssigningTargets,
            num_ticks: 0,
            tally: ArrivalTally::new(0),
            run_start: None,
            telem_log: None,
            report: StatusReport::new(0, FormCtrlMode::AssigningTargets, 0),
            arch_report: None,
        })
    }

    /// Record the fleet's telemetry into the given log.
    pub fn with_telem_log(mut self, telem_log: TelemLog) -> Self {
        self.telem_log = Some(telem_log);
        self
    }

    /// Archive the status report of each tick into the given archiver.
    pub fn with_report_archive(mut self, arch: Archiver) -> Self {
        self.arch_report = Some(arch);
        self
    }

    pub fn mode(&self) -> FormCtrlMode {
        self.mode
    }

    pub fn current_waypoint(&self) -> Option<Point2<f64>> {
        self.current_wp_m
    }

    /// Number of waypoints still queued behind the current one.
    pub fn num_queued_waypoints(&self) -> usize {
        self.waypoints.len()
    }

    pub fn num_ticks(&self) -> u64 {
        self.num_ticks
    }

    /// Arrival status of every vehicle as of the last tick.
    pub fn tally(&self) -> &ArrivalTally {
        &self.tally
    }

    /// Report of the last tick.
    pub fn report(&self) -> StatusReport {
        self.report
    }

    /// Run the controller until the waypoint queue is exhausted.
    ///
    /// The platform is released when the run ends, whether or not it succeeded.
    pub fn run(
        &mut self,
        fleet: &mut Fleet,
        platform: &mut dyn Platform,
    ) -> Result<(), FormCtrlError> {
        let res = self.run_until_done(fleet, platform);
        platform.release();
        res
    }

    fn run_until_done(
        &mut self,
        fleet: &mut Fleet,
        platform: &mut dyn Platform,
    ) -> Result<(), FormCtrlError> {
        while self.mode != FormCtrlMode::Done {
            if let Some(max_ticks) = self.params.max_ticks {
                if self.num_ticks >= max_ticks {
                    return Err(FormCtrlError::TickLimitExceeded(max_ticks));
                }
            }

            let cycle_start = Instant::now();

            self.proc(fleet, platform)?;

            if let Err(e) = self.write() {
                warn!("Could not archive the FormCtrl status report: {}", e);
            }

            // ---- CYCLE MANAGEMENT ----

            if self.params.cycle_period_s > 0.0 {
                if let Some(overrun_s) = sleep_remainder(cycle_start, self.params.cycle_period_s)
                {
                    warn!("Cycle overran by {:.06} s", overrun_s);
                }
            }
        }

        Ok(())
    }

    /// Perform one tick of formation control.
    ///
    /// Once the controller is done this returns immediately without touching the platform.
    pub fn proc(
        &mut self,
        fleet: &mut Fleet,
        platform: &mut dyn Platform,
    ) -> Result<StatusReport, FormCtrlError> {
        let wp_m = match (self.mode, self.current_wp_m) {
            (FormCtrlMode::Done, _) | (_, None) => {
                self.report = StatusReport::new(self.num_ticks, FormCtrlMode::Done, self.wp_index);
                return Ok(self.report);
            }
            (_, Some(w)) => w,
        };

        if fleet.is_empty() {
            return Err(FormCtrlError::EmptyFleet);
        }

        let is_first_tick = self.run_start.is_none();
        let run_start = *self.run_start.get_or_insert_with(Instant::now);

        let prev_tally = std::mem::replace(&mut self.tally, ArrivalTally::new(fleet.len()));

        // ---- SUB-TARGET ASSIGNMENT ----

        // Offset index follows fleet order so assignment is deterministic
        let offset_m = sub_target_offset_m(self.params.min_distance_m);
        let mut just_assigned = vec![false; fleet.len()];
        let mut k = 0;

        for (i, assigned) in just_assigned.iter_mut().enumerate() {
            if let Some(v) = fleet.vehicle_mut(i) {
                if v.sub_target_m.is_none() {
                    let sub_target_m = assign_sub_target(&wp_m, k, offset_m);
                    debug!(
                        "{} assigned sub-target ({:.3}, {:.3})",
                        v.id, sub_target_m.x, sub_target_m.y
                    );

                    v.sub_target_m = Some(sub_target_m);
                    *assigned = true;
                    k += 1;
                }
            }
        }

        self.mode = FormCtrlMode::EnRoute;

        // ---- TELEMETRY ----

        // Every vehicle is refreshed before any strategy is queried, so all strategies in a tick
        // see the same snapshot of the fleet
        let has_telem = Self::refresh_telemetry(fleet, platform);

        // ---- PER VEHICLE PROCESSING ----

        let mut num_commands = 0;

        for (i, assigned) in just_assigned.iter().enumerate() {
            let status = match has_telem[i] {
                true => self.proc_vehicle(
                    fleet,
                    platform,
                    i,
                    *assigned,
                    is_first_tick,
                    &mut num_commands,
                ),
                false => ArrivalStatus::Faulted,
            };

            if status == ArrivalStatus::Arrived && prev_tally.get(i) != Some(ArrivalStatus::Arrived)
            {
                if let Some(v) = fleet.vehicle(i) {
                    info!("{} reached its sub-target", v.id);
                }
            }

            self.tally.set(i, status);
        }

        // ---- TELEMETRY LOG ----

        let log_period = self.params.telem_log_period_ticks;
        if let Some(log) = self.telem_log.as_mut() {
            if log_period > 0 && self.num_ticks % log_period == 0 {
                let samples: Vec<TelemSample> = fleet
                    .vehicles()
                    .iter()
                    .map(|v| TelemSample {
                        x_m: v.position_m.x,
                        y_m: v.position_m.y,
                        metric: v.metric,
                    })
                    .collect();

                if let Err(e) = log.write_record(&samples, run_start.elapsed().as_secs_f64()) {
                    warn!("Could not write to the telemetry log: {}", e);
                }
            }
        }

        // ---- CONSENSUS ----

        self.mode = FormCtrlMode::ConsensusCheck;
        let advanced = self.tally.is_consensus();

        if advanced {
            self.mode = FormCtrlMode::AdvanceWaypoint;
            self.advance_waypoint(fleet);
        } else {
            self.mode = FormCtrlMode::EnRoute;
        }

        let report = StatusReport {
            tick: self.num_ticks,
            mode: self.mode,
            waypoint_index: self.wp_index,
            num_assigned: self.tally.count(ArrivalStatus::Assigned),
            num_en_route: self.tally.count(ArrivalStatus::EnRoute),
            num_arrived: self.tally.num_arrived(),
            num_stalled: self.tally.count(ArrivalStatus::Stalled),
            num_faulted: self.tally.count(ArrivalStatus::Faulted),
            num_commands,
            advanced,
        };

        let print_period = self.params.status_print_period_ticks;
        if print_period > 0 && self.num_ticks % print_period == 0 {
            info!(
                "Tick {}: waypoint {}, {}/{} arrived, {} stalled, {} faulted",
                report.tick,
                report.waypoint_index,
                report.num_arrived,
                fleet.len(),
                report.num_stalled,
                report.num_faulted
            );
        }

        self.num_ticks += 1;
        self.report = report;

        Ok(report)
    }

    /// Update every vehicle from the platform, returning which vehicles could be reached.
    fn refresh_telemetry(fleet: &mut Fleet, platform: &mut dyn Platform) -> Vec<bool> {
        let mut has_telem = vec![false; fleet.len()];

        for (i, ok) in has_telem.iter_mut().enumerate() {
            if let Some(v) = fleet.vehicle_mut(i) {
                let id = v.id.clone();
                match retry_once(&format!("Telemetry request for {}", id), || {
                    platform.get_telemetry(&id)
                }) {
                    Ok(t) => {
                        v.update_from_telemetry(&t);
                        *ok = true;
                    }
                    Err(e) => warn!("{} faulted, no telemetry: {}", id, e),
                }
            }
        }

        has_telem
    }

    /// Process one vehicle, returning its arrival status for the tick.
    ///
    /// The vehicle's telemetry must already have been refreshed this tick.
    fn proc_vehicle(
        &self,
        fleet: &mut Fleet,
        platform: &mut dyn Platform,
        index: usize,
        just_assigned: bool,
        is_first_tick: bool,
        num_commands: &mut usize,
    ) -> ArrivalStatus {
        let others = fleet.others_xy(index);
        let (vehicle, intent) = match fleet.split_mut(index) {
            Some(p) => p,
            None => return ArrivalStatus::Pending,
        };
        let id = vehicle.id.clone();

        // Arrival is judged on fresh telemetry, so a vehicle which drifted off its sub-target
        // stops counting as arrived
        let sub_target_m = match vehicle.sub_target_m {
            Some(t) => t,
            None => return ArrivalStatus::Pending,
        };

        let (dems, status) = if !just_assigned
            && is_arrived(
                &vehicle.position_xy(),
                &sub_target_m,
                self.params.close_enough_m,
            ) {
            (
                ActDems::hold(
                    &id,
                    self.params.altitude_m,
                    self.params.cmd_duration_s,
                    vehicle.heading_rad,
                ),
                ArrivalStatus::Arrived,
            )
        } else {
            let move_intent = intent.next_move(vehicle, &others);
            vehicle.metric = intent.metric();

            if let Err(e) = move_intent.validate(self.params.v_max_ms) {
                warn!("{} stalled: {}", id, e);
                return ArrivalStatus::Stalled;
            }

            let heading_rad = smooth_heading_damped(
                vehicle.heading_rad,
                move_intent.turn_rate_rads,
                is_first_tick,
                self.params.heading_damping,
            );
            let velocity_ms = velocity_vector(move_intent.speed_ms, heading_rad);

            trace!(
                "{} demands: v = ({}, {}) m/s, heading {:.4} rad",
                id,
                velocity_ms.x,
                velocity_ms.y,
                heading_rad
            );

            (
                ActDems {
                    vehicle_id: id.clone(),
                    velocity_ms: [velocity_ms.x, velocity_ms.y],
                    altitude_m: self.params.altitude_m,
                    duration_s: self.params.cmd_duration_s,
                    heading_rad,
                },
                match just_assigned {
                    true => ArrivalStatus::Assigned,
                    false => ArrivalStatus::EnRoute,
                },
            )
        };

        match retry_once(&format!("Actuation of {}", id), || platform.actuate(&dems)) {
            Ok(()) => {
                *num_commands += 1;
                status
            }
            Err(e) => {
                warn!("{} faulted, demands not actuated: {}", id, e);
                ArrivalStatus::Faulted
            }
        }
    }

    /// Move on to the next waypoint, or finish if there are none left.
    fn advance_waypoint(&mut self, fleet: &mut Fleet) {
        match self.waypoints.pop_front() {
            Some(next_m) => {
                info!(
                    "All {} vehicles reached waypoint {}, advancing to ({:.3}, {:.3})",
                    fleet.len(),
                    self.wp_index,
                    next_m.x,
                    next_m.y
                );

                self.current_wp_m = Some(next_m);
                self.wp_index += 1;
                fleet.clear_sub_targets();
                self.mode = FormCtrlMode::AssigningTargets;
            }
            None => {
                info!(
                    "All {} vehicles reached the final waypoint, formation complete after {} ticks",
                    fleet.len(),
                    self.num_ticks + 1
                );

                self.current_wp_m = None;
                self.mode = FormCtrlMode::Done;
            }
        }
    }
}

impl Archived for FormCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        if let Some(arch) = self.arch_report.as_mut() {
            arch.serialise(self.report)?;
        }

        Ok(())
    }
}

impl StatusReport {
    fn new(tick: u64, mode: FormCtrlMode, waypoint_index: usize) -> Self {
        Self {
            tick,
            mode,
            waypoint_index,
            num_assigned: 0,
            num_en_route: 0,
            num_arrived: 0,
            num_stalled: 0,
            num_faulted: 0,
            num_commands: 0,
            advanced: false,
        }
    }
}
