//! # Simulation Server Module
//!
//! This module abstracts over the networking side of the simulation executable. The server accepts
//! requests from the networked platform client in the swarm executable and answers them from the
//! kinematic simulation.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::platform::{PlatformRequest, PlatformResponse},
    net::{zmq, JsonMsgError, MonitoredSocket, MonitoredSocketError, SocketOptions},
};
use log::{info, warn};
use swarm_lib::platform::{sim::KinematicSim, Platform, PlatformError};

use crate::params::SimExecParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An abstraction over the networking part of the simulation executable.
pub struct SimServer {
    /// REP socket which accepts requests from the client
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur in the [`SimServer`]
#[derive(thiserror::Error, Debug)]
pub enum SimServerError {
    #[error("Socket error: {0}")]
    SocketError(#[from] MonitoredSocketError),

    #[error("Could not send the response to the client: {0}")]
    SendError(JsonMsgError),

    #[error("Could not receive from the client: {0}")]
    RecvError(JsonMsgError),
}

/// Outcome of waiting for a request.
#[derive(Debug, PartialEq)]
pub enum Incoming {
    /// No request arrived within the receive timeout.
    Nothing,

    Request(PlatformRequest),

    /// A message arrived but could not be understood, it must still be answered.
    Malformed(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimServer {
    /// Create a new instance of the simulation server.
    ///
    /// This function will not wait for a connection from the client before returning.
    pub fn new(ctx: &zmq::Context, params: &SimExecParams) -> Result<Self, SimServerError> {
        let socket_options = SocketOptions {
            bind: true,
            block_on_first_connect: false,
            recv_timeout: 200,
            send_timeout: 10,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(
            ctx,
            zmq::REP,
            socket_options,
            &params.platform_endpoint,
        )?;

        Ok(Self { socket })
    }

    /// Retrieve a request from the client.
    ///
    /// A [`Incoming::Malformed`] request MUST still be answered with
    /// [`SimServer::send_response`]. Socket failures other than a receive timeout are returned
    /// as errors.
    pub fn get_request(&mut self) -> Result<Incoming, SimServerError> {
        classify_recv(self.socket.recv_json())
    }

    /// Send a response to the client.
    pub fn send_response(&mut self, response: &PlatformResponse) -> Result<(), SimServerError> {
        self.socket
            .send_json(response)
            .map_err(SimServerError::SendError)
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Sort the result of a receive into a request, a timeout, or a fatal socket error.
pub fn classify_recv(
    result: Result<PlatformRequest, JsonMsgError>,
) -> Result<Incoming, SimServerError> {
    match result {
        Ok(r) => Ok(Incoming::Request(r)),
        Err(JsonMsgError::RecvError(zmq::Error::EAGAIN)) => Ok(Incoming::Nothing),
        Err(e @ JsonMsgError::RecvError(_)) => Err(SimServerError::RecvError(e)),
        Err(e) => {
            warn!("Could not read request: {}", e);
            Ok(Incoming::Malformed(e.to_string()))
        }
    }
}

/// Answer a request from the simulation.
pub fn handle_request(sim: &mut KinematicSim, request: PlatformRequest) -> PlatformResponse {
    match request {
        PlatformRequest::GetTelemetry { vehicle_id } => match sim.get_telemetry(&vehicle_id) {
            Ok(t) => PlatformResponse::Telemetry(t),
            Err(_) => PlatformResponse::UnknownVehicle(vehicle_id),
        },
        PlatformRequest::Actuate(dems) => match sim.actuate(&dems) {
            Ok(()) => PlatformResponse::DemsOk,
            Err(PlatformError::UnknownVehicle(id)) => PlatformResponse::UnknownVehicle(id),
            Err(_) => PlatformResponse::DemsInvalid,
        },
        PlatformRequest::Release => {
            info!("Client released the platform");
            sim.release();
            PlatformResponse::Released
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::platform::ActDems;

    #[test]
    fn test_handle_request() {
        let mut sim = KinematicSim::new(1.0);
        sim.add_vehicle("Drone1", [90.0, 25.0, 0.0], 0.0);

        let resp = handle_request(
            &mut sim,
            PlatformRequest::Actuate(ActDems {
                vehicle_id: "Drone1".into(),
                velocity_ms: [1.0, 0.0],
                altitude_m: -2.0,
                duration_s: 0.5,
                heading_rad: 0.0,
            }),
        );
        assert_eq!(resp, PlatformResponse::DemsOk);

        match handle_request(
            &mut sim,
            PlatformRequest::GetTelemetry {
                vehicle_id: "Drone1".into(),
            },
        ) {
            PlatformResponse::Telemetry(t) => assert_eq!(t.position_m, [90.5, 25.0, -2.0]),
            r => panic!("Unexpected response {:?}", r),
        }

        assert_eq!(
            handle_request(&mut sim, PlatformRequest::Actuate(ActDems::hold("Drone1", -2.0, 0.0, 0.0))),
            PlatformResponse::DemsInvalid
        );
        assert_eq!(
            handle_request(
                &mut sim,
                PlatformRequest::GetTelemetry {
                    vehicle_id: "Drone7".into()
                }
            ),
            PlatformResponse::UnknownVehicle("Drone7".into())
        );
        assert_eq!(
            handle_request(&mut sim, PlatformRequest::Release),
            PlatformResponse::Released
        );
        assert!(sim.is_released());
    }

    #[test]
    fn test_classify_recv() {
        let req = PlatformRequest::GetTelemetry {
            vehicle_id: "Drone1".into(),
        };
        assert_eq!(
            classify_recv(Ok(req.clone())).unwrap(),
            Incoming::Request(req)
        );

        assert_eq!(
            classify_recv(Err(JsonMsgError::RecvError(zmq::Error::EAGAIN))).unwrap(),
            Incoming::Nothing
        );

        assert!(matches!(
            classify_recv(Err(JsonMsgError::InvalidUtf8)),
            Ok(Incoming::Malformed(_))
        ));

        // A terminated context must stop the server rather than be polled forever
        assert!(matches!(
            classify_recv(Err(JsonMsgError::RecvError(zmq::Error::ETERM))),
            Err(SimServerError::RecvError(_))
        ));
    }
}
