//! # Simulation Executable
//!
//! This executable hosts a kinematic simulation of the fleet and serves it as a platform to the
//! swarm executable. The fleet is laid out from the same `swarm_exec.toml` the swarm executable
//! uses, so both agree on the vehicle ids.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Simulation server abstraction.
mod sim_server;

/// Parameters for the simulation executable.
mod params;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use comms_if::eqpt::platform::PlatformResponse;
use log::{debug, info, trace, warn};

// Internal
use params::SimExecParams;
use sim_server::{handle_request, Incoming, SimServer};
use swarm_lib::{fleet::layout_positions, params::SwarmExecParams, platform::sim::KinematicSim};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    let session = Session::new("sim_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Info, &session).wrap_err("Failed to initialise logging")?;

    info!("Simulation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let params: SimExecParams =
        util::params::load("sim_exec.toml").wrap_err("Could not load sim exec params")?;
    let swarm_params: SwarmExecParams =
        util::params::load("swarm_exec.toml").wrap_err("Could not load the fleet layout")?;

    info!("Parameters loaded");

    // ---- SIMULATION INITIALISATION ----

    let mut sim = KinematicSim::new(params.time_scale);
    for (id, position_m) in layout_positions(&swarm_params.layout()) {
        sim.add_vehicle(&id, [position_m.x, position_m.y, position_m.z], 0.0);
    }

    info!("Simulating {} vehicles", swarm_params.num_vehicles);

    // ---- SERVER INITIALISATION ----

    let zmq_ctx = comms_if::net::zmq::Context::new();
    let mut server = SimServer::new(&zmq_ctx, &params).wrap_err("Failed to initialise server")?;

    info!("Server listening on {}", params.platform_endpoint);

    // ---- MAIN LOOP ----

    loop {
        let response = match server.get_request().wrap_err("Server socket failed")? {
            Incoming::Request(req) => {
                trace!("Request: {:?}", req);
                handle_request(&mut sim, req)
            }
            Incoming::Malformed(e) => PlatformResponse::InvalidRequest(e),
            Incoming::Nothing => continue,
        };

        if let Err(e) = server.send_response(&response) {
            warn!("Couldn't send response to client: {}", e);
        }

        if let PlatformResponse::Released = response {
            debug!("{} demands actuated so far", sim.num_actuations());
        }
    }
}
