//! Parameters structure for OrbitCtrl

use serde::Deserialize;

use super::OrbitCtrlError;
use crate::heading::DEFAULT_HEADING_DAMPING;

/// Parameters for orbit control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Name of the object to orbit
    pub target_name: String,

    /// Position of the object to orbit.
    ///
    /// Units: meters
    pub target_position_m: [f64; 2],

    /// Maximum speed a strategy may demand.
    ///
    /// Units: meters/second
    pub v_max_ms: f64,

    /// Duration of each actuation demand.
    ///
    /// Units: seconds
    pub cmd_duration_s: f64,

    /// Altitude held by every vehicle.
    ///
    /// Units: meters
    pub altitude_m: f64,

    #[serde(default = "default_heading_damping")]
    pub heading_damping: f64,

    /// Target period of one tick.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,
}

impl Params {
    pub fn validate(&self) -> Result<(), OrbitCtrlError> {
        if !self.v_max_ms.is_finite() || self.v_max_ms <= 0.0 {
            return Err(OrbitCtrlError::InvalidParams(format!(
                "v_max_ms must be positive, got {}",
                self.v_max_ms
            )));
        }

        if !self.cmd_duration_s.is_finite() || self.cmd_duration_s <= 0.0 {
            return Err(OrbitCtrlError::InvalidParams(format!(
                "cmd_duration_s must be positive, got {}",
                self.cmd_duration_s
            )));
        }

        if !self.heading_damping.is_finite() || self.heading_damping < 0.0 {
            return Err(OrbitCtrlError::InvalidParams(format!(
                "heading_damping must not be negative, got {}",
                self.heading_damping
            )));
        }

        if !self.target_position_m.iter().all(|p| p.is_finite()) {
            return Err(OrbitCtrlError::InvalidParams(
                "target_position_m must be finite".into(),
            ));
        }

        Ok(())
    }
}

fn default_heading_damping() -> f64 {
    DEFAULT_HEADING_DAMPING
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shipped_params_valid() {
        let p: Params =
            util::params::from_str(include_str!("../../../params/orbit_ctrl.toml")).unwrap();
        assert!(p.validate().is_ok());
        assert_eq!(p.target_name, "Cube");

        let mut bad = p;
        bad.v_max_ms = 0.0;
        assert!(matches!(bad.validate(), Err(OrbitCtrlError::InvalidParams(_))));
    }
}
