//! # Networked platform
//!
//! Platform client which forwards telemetry requests and demands to a platform server over a zmq
//! REQ socket.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::platform::{ActDems, PlatformRequest, PlatformResponse, Telemetry},
    net::{zmq, MonitoredSocket, NetParams, SocketOptions},
};
use log::{info, warn};

use super::{Platform, PlatformError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of attempts made at each request, see [`super::retry_once`].
const ATTEMPTS_PER_REQUEST: f64 = 2.0;

/// Each attempt is a send followed by a receive, both of which may time out.
const TIMEOUTS_PER_ATTEMPT: f64 = 2.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct NetPlatform {
    socket: MonitoredSocket,

    released: bool,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Timeout for each socket send and receive, in milliseconds.
///
/// Never less than 1 ms, since zmq treats 0 as non-blocking.
pub fn request_timeout_ms(cmd_duration_s: f64) -> i32 {
    let timeout_ms =
        (cmd_duration_s * 1000.0 / (ATTEMPTS_PER_REQUEST * TIMEOUTS_PER_ATTEMPT)).floor();

    if timeout_ms.is_nan() || timeout_ms < 1.0 {
        1
    } else {
        timeout_ms.min(i32::MAX as f64) as i32
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NetPlatform {
    /// Connect to the platform server.
    ///
    /// Socket timeouts are set so that a request and its retry both complete, or fail, within
    /// `cmd_duration_s`.
    pub fn new(
        ctx: &zmq::Context,
        params: &NetParams,
        cmd_duration_s: f64,
    ) -> Result<Self, PlatformError> {
        let timeout_ms = request_timeout_ms(cmd_duration_s);

        let socket_options = SocketOptions {
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: timeout_ms,
            send_timeout: timeout_ms,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(
            ctx,
            zmq::REQ,
            socket_options,
            &params.platform_endpoint,
        )
        .map_err(PlatformError::Socket)?;

        info!(
            "Connected to platform at {} ({} ms request timeout)",
            params.platform_endpoint, timeout_ms
        );

        Ok(Self {
            socket,
            released: false,
        })
    }

    /// Send a request and wait for the response.
    fn request(&mut self, req: &PlatformRequest) -> Result<PlatformResponse, PlatformError> {
        if !self.socket.connected() {
            return Err(PlatformError::NotConnected);
        }

        self.socket.send_json(req).map_err(PlatformError::Json)?;
        self.socket.recv_json().map_err(PlatformError::Json)
    }
}

impl Platform for NetPlatform {
    fn get_telemetry(&mut self, vehicle_id: &str) -> Result<Telemetry, PlatformError> {
        let req = PlatformRequest::GetTelemetry {
            vehicle_id: vehicle_id.to_string(),
        };

        match self.request(&req)? {
            PlatformResponse::Telemetry(t) => Ok(t),
            PlatformResponse::UnknownVehicle(id) => Err(PlatformError::UnknownVehicle(id)),
            r => Err(PlatformError::UnexpectedResponse(format!("{:?}", r))),
        }
    }

    fn actuate(&mut self, dems: &ActDems) -> Result<(), PlatformError> {
        match self.request(&PlatformRequest::Actuate(dems.clone()))? {
            PlatformResponse::DemsOk => Ok(()),
            PlatformResponse::DemsInvalid => Err(PlatformError::DemsRejected(dems.vehicle_id.clone())),
            PlatformResponse::UnknownVehicle(id) => Err(PlatformError::UnknownVehicle(id)),
            r => Err(PlatformError::UnexpectedResponse(format!("{:?}", r))),
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match self.request(&PlatformRequest::Release) {
            Ok(PlatformResponse::Released) => info!("Platform released"),
            Ok(r) => warn!("Unexpected response to release: {:?}", r),
            Err(e) => warn!("Could not release the platform: {}", e),
        }
    }
}

impl Drop for NetPlatform {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_request_timeout_fits_cmd_duration() {
        assert_eq!(request_timeout_ms(0.1), 25);
        assert_eq!(request_timeout_ms(1.0), 250);

        // Send and receive of both attempts fit inside the command duration
        for cmd_duration_s in [0.01, 0.1, 0.25, 1.0, 2.0].iter() {
            let worst_case_ms = 4 * request_timeout_ms(*cmd_duration_s);
            assert!(worst_case_ms as f64 <= cmd_duration_s * 1000.0);
        }

        assert_eq!(request_timeout_ms(0.0001), 1);
        assert_eq!(request_timeout_ms(std::f64::NAN), 1);
        assert_eq!(request_timeout_ms(std::f64::INFINITY), i32::MAX);
    }
}
