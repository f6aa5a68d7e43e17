//! # Heading smoother
//!
//! Converts a strategy's raw turn rate into an absolute heading, low pass filtered so that the
//! vehicles do not snap between headings from one tick to the next, and converts a speed and
//! heading into the velocity vector sent to the platform.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector2;
use std::f64::consts::TAU;
use util::maths::{rem_euclid, round_dp};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Default fraction of the requested turn rate applied each tick.
pub const DEFAULT_HEADING_DAMPING: f64 = 0.5;

/// Number of decimal places velocity demands are rounded to, matching the platform command
/// precision.
pub const VELOCITY_DECIMAL_PLACES: i32 = 4;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Headings for a vehicle which may translate along one direction while facing another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitHeadings {
    /// Heading the velocity vector is built along.
    ///
    /// Units: radians, [0, 2pi)
    pub moving_rad: f64,

    /// Heading the vehicle is commanded to face.
    ///
    /// Units: radians, [0, 2pi)
    pub facing_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Smooth a heading using the default damping factor.
///
/// See [`smooth_heading_damped`].
pub fn smooth_heading(current_rad: f64, turn_rate_rads: f64, is_first_tick: bool) -> f64 {
    smooth_heading_damped(
        current_rad,
        turn_rate_rads,
        is_first_tick,
        DEFAULT_HEADING_DAMPING,
    )
}

/// Integrate `damping * turn_rate` onto the current heading and normalise into [0, 2pi).
///
/// On the first tick of a run the current heading is returned untouched, there being no previous
/// command to smooth against.
pub fn smooth_heading_damped(
    current_rad: f64,
    turn_rate_rads: f64,
    is_first_tick: bool,
    damping: f64,
) -> f64 {
    if is_first_tick {
        return normalise_heading(current_rad);
    }

    normalise_heading(current_rad + turn_rate_rads * damping)
}

/// Smooth the moving and facing headings of an orbiting vehicle independently.
///
/// Each heading is integrated from its own current value. If no facing rate is given the vehicle
/// is not orbiting and both headings collapse onto the smoothed moving heading.
pub fn smooth_orbit_headings(
    current: OrbitHeadings,
    turn_rate_rads: f64,
    facing_rate_rads: Option<f64>,
    is_first_tick: bool,
    damping: f64,
) -> OrbitHeadings {
    let moving_rad =
        smooth_heading_damped(current.moving_rad, turn_rate_rads, is_first_tick, damping);

    let facing_rad = match facing_rate_rads {
        Some(f) => smooth_heading_damped(current.facing_rad, f, is_first_tick, damping),
        None if is_first_tick => normalise_heading(current.facing_rad),
        None => moving_rad,
    };

    OrbitHeadings {
        moving_rad,
        facing_rad,
    }
}

/// Normalise a heading into [0, 2pi).
///
/// Negative headings from a single wrap are lifted by 2pi, anything still outside the range
/// (repeated wraps or accumulated spin) is reduced modulo 2pi.
pub fn normalise_heading(heading_rad: f64) -> f64 {
    let mut h = heading_rad;

    if h < 0.0 {
        h += TAU;
    }

    if h < 0.0 || h >= TAU {
        h = rem_euclid(h, TAU);

        // rem_euclid can round up onto 2pi for tiny negative inputs
        if h >= TAU {
            h = 0.0;
        }
    }

    h
}

/// Build the (x, y) velocity demand for a speed along a heading, each component rounded to the
/// platform command precision.
pub fn velocity_vector(speed_ms: f64, heading_rad: f64) -> Vector2<f64> {
    Vector2::new(
        round_dp(speed_ms * heading_rad.cos(), VELOCITY_DECIMAL_PLACES),
        round_dp(speed_ms * heading_rad.sin(), VELOCITY_DECIMAL_PLACES),
    )
}
