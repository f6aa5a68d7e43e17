//! # Motion intent module
//!
//! A motion intent strategy decides, for one vehicle, the speed and turn rate it wants to fly
//! given the positions of the rest of the fleet. Strategies are pluggable: the controllers only
//! see the [`MotionIntent`] trait, and one instance is built per vehicle by an
//! [`IntentFactory`] when the fleet is constructed.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod seek;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Point2;

use crate::fleet::Vehicle;
pub use seek::*;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Tolerance allowed on the maximum speed check, to absorb floating point error in strategies
/// that saturate at exactly the maximum speed.
const SPEED_LIMIT_TOLERANCE_MS: f64 = 1e-9;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Desired motion of a vehicle in formation mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveIntent {
    /// Desired speed.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Desired change of heading, before damping.
    ///
    /// Units: radians
    pub turn_rate_rads: f64,
}

/// Desired motion of a vehicle in orbit mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitIntent {
    /// Desired speed.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Desired change of the moving heading, before damping.
    ///
    /// Units: radians
    pub turn_rate_rads: f64,

    /// Desired change of the facing heading, or `None` if the vehicle is not orbiting and shall
    /// face the way it moves.
    ///
    /// Units: radians
    pub facing_rate_rads: Option<f64>,
}

/// A named object to orbit.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitTarget {
    pub name: String,

    /// Position of the object in the platform frame.
    ///
    /// Units: meters
    pub position_m: Point2<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Reasons a strategy's output is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntentError {
    #[error("Speed demand is not finite ({0})")]
    NonFiniteSpeed(f64),

    #[error("Speed demand is negative ({0} m/s)")]
    NegativeSpeed(f64),

    #[error("Speed demand of {speed_ms} m/s exceeds the maximum of {v_max_ms} m/s")]
    SpeedAboveMax { speed_ms: f64, v_max_ms: f64 },

    #[error("Turn rate demand is not finite ({0})")]
    NonFiniteTurn(f64),

    #[error("Facing rate demand is not finite ({0})")]
    NonFiniteFacing(f64),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A per-vehicle motion intent strategy.
///
/// An instance belongs to exactly one vehicle, identified by [`MotionIntent::vehicle_id`]. The
/// controllers call it at most once per vehicle per tick and pass the owning vehicle in by
/// reference, the strategy never holds on to vehicle state itself.
pub trait MotionIntent: Send {
    /// Id of the vehicle this strategy steers.
    fn vehicle_id(&self) -> &str;

    /// Desired motion in formation mode, given the horizontal positions of every other vehicle.
    fn next_move(&mut self, own: &Vehicle, others: &[Point2<f64>]) -> MoveIntent;

    /// Desired motion in orbit mode.
    ///
    /// `own.heading_rad` is the heading the vehicle faces and `moving_heading_rad` the heading it
    /// translates along. The turn rate is relative to the moving heading, the facing rate to the
    /// facing heading.
    fn orbit(
        &mut self,
        own: &Vehicle,
        moving_heading_rad: f64,
        target: &OrbitTarget,
    ) -> OrbitIntent;

    /// Scalar metric maintained by the strategy, logged alongside the vehicle's position.
    fn metric(&self) -> f64;
}

/// Builds one fresh strategy per vehicle.
pub trait IntentFactory {
    fn create(&self, vehicle_id: &str) -> Box<dyn MotionIntent>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<F> IntentFactory for F
where
    F: Fn(&str) -> Box<dyn MotionIntent>,
{
    fn create(&self, vehicle_id: &str) -> Box<dyn MotionIntent> {
        self(vehicle_id)
    }
}

impl MoveIntent {
    /// An intent which keeps the vehicle still and its heading unchanged.
    pub fn hold() -> Self {
        Self {
            speed_ms: 0.0,
            turn_rate_rads: 0.0,
        }
    }

    /// Check the intent can be turned into a command for a vehicle limited to `v_max_ms`.
    pub fn validate(&self, v_max_ms: f64) -> Result<(), IntentError> {
        validate_speed(self.speed_ms, v_max_ms)?;

        if !self.turn_rate_rads.is_finite() {
            return Err(IntentError::NonFiniteTurn(self.turn_rate_rads));
        }

        Ok(())
    }
}

impl OrbitIntent {
    /// Check the intent can be turned into a command for a vehicle limited to `v_max_ms`.
    pub fn validate(&self, v_max_ms: f64) -> Result<(), IntentError> {
        MoveIntent {
            speed_ms: self.speed_ms,
            turn_rate_rads: self.turn_rate_rads,
        }
        .validate(v_max_ms)?;

        match self.facing_rate_rads {
            Some(f) if !f.is_finite() => Err(IntentError::NonFiniteFacing(f)),
            _ => Ok(()),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn validate_speed(speed_ms: f64, v_max_ms: f64) -> Result<(), IntentError> {
    if !speed_ms.is_finite() {
        return Err(IntentError::NonFiniteSpeed(speed_ms));
    }
    if speed_ms < 0.0 {
        return Err(IntentError::NegativeSpeed(speed_ms));
    }
    if speed_ms > v_max_ms + SPEED_LIMIT_TOLERANCE_MS {
        return Err(IntentError::SpeedAboveMax { speed_ms, v_max_ms });
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_move_validation() {
        let ok = MoveIntent {
            speed_ms: 1.25,
            turn_rate_rads: -0.3,
        };
        assert_eq!(ok.validate(1.25), Ok(()));
        assert_eq!(MoveIntent::hold().validate(1.25), Ok(()));

        let nan = MoveIntent {
            speed_ms: std::f64::NAN,
            turn_rate_rads: 0.0,
        };
        assert!(matches!(nan.validate(1.25), Err(IntentError::NonFiniteSpeed(_))));

        let neg = MoveIntent {
            speed_ms: -0.1,
            turn_rate_rads: 0.0,
        };
        assert_eq!(neg.validate(1.25), Err(IntentError::NegativeSpeed(-0.1)));

        let fast = MoveIntent {
            speed_ms: 2.0,
            turn_rate_rads: 0.0,
        };
        assert!(matches!(fast.validate(1.25), Err(IntentError::SpeedAboveMax { .. })));

        let spin = MoveIntent {
            speed_ms: 1.0,
            turn_rate_rads: std::f64::INFINITY,
        };
        assert!(matches!(spin.validate(1.25), Err(IntentError::NonFiniteTurn(_))));
    }

    #[test]
    fn test_orbit_validation() {
        let ok = OrbitIntent {
            speed_ms: 1.0,
            turn_rate_rads: 0.1,
            facing_rate_rads: None,
        };
        assert_eq!(ok.validate(1.25), Ok(()));

        let bad_facing = OrbitIntent {
            facing_rate_rads: Some(std::f64::NAN),
            ..ok
        };
        assert!(matches!(
            bad_facing.validate(1.25),
            Err(IntentError::NonFiniteFacing(_))
        ));
    }
}
