//! Main swarm executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Load parameters and build the fleet from its layout
//!     - Connect to the platform, either the networked platform server or an in-process
//!       kinematic simulation
//!     - Take off, holding every vehicle at the formation altitude
//!     - Run the selected controller:
//!         - formation: fly the waypoint queue until it is exhausted
//!         - orbit: circle the target until the duration elapses or the process is stopped

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};
use std::{thread, time::Duration};
use structopt::StructOpt;

// Internal
use comms_if::{eqpt::platform::ActDems, net::NetParams};
use swarm_lib::{
    fleet::Fleet,
    form_ctrl::{self, FormCtrl},
    intent::{SeekIntent, SeekParams},
    orbit_ctrl::{self, OrbitCtrl},
    params::SwarmExecParams,
    platform::{net::NetPlatform, retry_once, sim::KinematicSim, Platform},
    telem_log::TelemLog,
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Fleet formation and orbit control.
#[derive(Debug, StructOpt)]
#[structopt(name = "swarm_exec")]
struct Opts {
    /// Drive an in-process kinematic simulation instead of the networked platform.
    #[structopt(long)]
    sim: bool,

    #[structopt(subcommand)]
    mode: Mode,
}

#[derive(Debug, StructOpt)]
enum Mode {
    /// Fly the fleet through the waypoints in form_ctrl.toml.
    #[structopt(name = "formation")]
    Formation,

    /// Orbit the target in orbit_ctrl.toml.
    #[structopt(name = "orbit")]
    Orbit {
        /// Stop orbiting after this many seconds, otherwise orbit until the process is stopped.
        #[structopt(long, parse(try_from_str = parse_duration_s))]
        duration_s: Option<f64>,
    },
}

/// Controller parameters for the selected mode.
enum CtrlParams {
    Formation(form_ctrl::Params),
    Orbit {
        params: orbit_ctrl::Params,
        duration_s: Option<f64>,
    },
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    let session =
        Session::new("swarm_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Info, &session).wrap_err("Failed to initialise logging")?;

    info!("Swarm Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: SwarmExecParams =
        util::params::load("swarm_exec.toml").wrap_err("Could not load exec params")?;
    let seek_params: SeekParams =
        util::params::load("seek_intent.toml").wrap_err("Could not load seek intent params")?;

    let ctrl_params = match opts.mode {
        Mode::Formation => CtrlParams::Formation(
            util::params::load("form_ctrl.toml").wrap_err("Could not load FormCtrl params")?,
        ),
        Mode::Orbit { duration_s } => CtrlParams::Orbit {
            params: util::params::load("orbit_ctrl.toml")
                .wrap_err("Could not load OrbitCtrl params")?,
            duration_s,
        },
    };

    let cmd_duration_s = match &ctrl_params {
        CtrlParams::Formation(p) => p.cmd_duration_s,
        CtrlParams::Orbit { params, .. } => params.cmd_duration_s,
    };

    info!("Exec parameters loaded");

    // ---- INITIALISE FLEET ----

    let mut fleet = Fleet::from_layout(&exec_params.layout(), &SeekIntent::factory(seek_params));

    info!("Fleet of {} vehicles created", fleet.len());

    // ---- INITIALISE PLATFORM ----

    let zmq_ctx = comms_if::net::zmq::Context::new();

    let mut platform: Box<dyn Platform> = if opts.sim {
        let mut sim = KinematicSim::new(exec_params.sim_time_scale);
        for v in fleet.vehicles() {
            sim.add_vehicle(
                &v.id,
                [v.position_m.x, v.position_m.y, v.position_m.z],
                v.heading_rad,
            );
        }
        info!("Using the in-process kinematic simulation");
        Box::new(sim)
    } else {
        let net_params: NetParams =
            util::params::load("net.toml").wrap_err("Could not load net params")?;
        Box::new(
            NetPlatform::new(&zmq_ctx, &net_params, cmd_duration_s)
                .wrap_err("Failed to connect to the platform")?,
        )
    };

    // ---- TAKEOFF ----

    takeoff(&fleet, platform.as_mut(), &exec_params).wrap_err("Takeoff failed")?;

    // ---- RUN CONTROLLER ----

    match ctrl_params {
        CtrlParams::Formation(params) => {
            let telem_log = TelemLog::from_path(&session, "telemetry.csv", fleet.len())
                .wrap_err("Failed to create the telemetry log")?;
            let arch_report = Archiver::from_path(&session, "form_ctrl/status_report.csv", b',')
                .wrap_err("Failed to create the FormCtrl status archive")?;

            let mut form_ctrl = FormCtrl::new(params)
                .wrap_err("Failed to initialise FormCtrl")?
                .with_telem_log(telem_log)
                .with_report_archive(arch_report);

            info!("FormCtrl init complete, beginning formation flight\n");

            form_ctrl
                .run(&mut fleet, platform.as_mut())
                .wrap_err("Formation control failed")?;

            info!("Formation complete after {} ticks", form_ctrl.num_ticks());
        }
        CtrlParams::Orbit { params, duration_s } => {
            let mut orbit_ctrl = OrbitCtrl::new(params).wrap_err("Failed to initialise OrbitCtrl")?;

            match duration_s {
                Some(d) => {
                    let token = orbit_ctrl.cancel_token();
                    thread::spawn(move || {
                        thread::sleep(Duration::from_secs_f64(d));
                        token.cancel();
                    });
                    info!("Orbiting for {:.1} s", d);
                }
                None => info!("Orbiting until the process is stopped"),
            }

            let num_ticks = orbit_ctrl
                .run(&mut fleet, platform.as_mut())
                .wrap_err("Orbit control failed")?;

            info!("Orbit complete after {} ticks", num_ticks);
        }
    }

    info!("End of execution");

    Ok(())
}

/// Parse an orbit duration, which must be a finite, non-negative number of seconds.
fn parse_duration_s(src: &str) -> Result<f64, String> {
    let duration_s: f64 = src
        .parse()
        .map_err(|e| format!("invalid duration {:?}: {}", src, e))?;

    if !duration_s.is_finite() || duration_s < 0.0 {
        return Err(format!(
            "duration must be a finite number of seconds >= 0, got {}",
            src
        ));
    }

    Ok(duration_s)
}

/// Hold every vehicle at the formation altitude, keeping its current heading.
fn takeoff(
    fleet: &Fleet,
    platform: &mut dyn Platform,
    params: &SwarmExecParams,
) -> Result<(), Report> {
    info!("Taking off to {:.2} m", params.altitude_m);

    for v in fleet.vehicles() {
        let heading_rad = match retry_once(&format!("Telemetry request for {}", v.id), || {
            platform.get_telemetry(&v.id)
        }) {
            Ok(t) => t.heading_rad,
            Err(e) => {
                warn!("No telemetry from {} before takeoff, holding heading 0: {}", v.id, e);
                0.0
            }
        };

        let dems = ActDems::hold(
            &v.id,
            params.altitude_m,
            params.takeoff_duration_s,
            heading_rad,
        );

        retry_once(&format!("Takeoff of {}", v.id), || platform.actuate(&dems))
            .wrap_err_with(|| format!("{} did not take off", v.id))?;
    }

    info!("Takeoff complete\n");

    Ok(())
}
