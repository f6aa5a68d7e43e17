//! Parameters structure for FormCtrl

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use super::FormCtrlError;
use crate::heading::DEFAULT_HEADING_DAMPING;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for formation control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Maximum speed a strategy may demand.
    ///
    /// Units: meters/second
    pub v_max_ms: f64,

    /// Minimum separation between vehicles. Sub-targets around a shared waypoint are spaced by
    /// twice this.
    ///
    /// Units: meters
    pub min_distance_m: f64,

    /// Survey distance used by the strategies, not by the controller itself.
    ///
    /// Units: meters
    pub max_distance_m: f64,

    /// A vehicle closer than this to its sub-target has arrived.
    ///
    /// Units: meters
    pub close_enough_m: f64,

    /// Duration of each actuation demand.
    ///
    /// Units: seconds
    pub cmd_duration_s: f64,

    /// Altitude held by every vehicle.
    ///
    /// Units: meters
    pub altitude_m: f64,

    /// Shared waypoints, flown in order.
    ///
    /// Units: meters
    pub waypoints_m: Vec<[f64; 2]>,

    /// Fraction of the requested turn rate applied each tick.
    #[serde(default = "default_heading_damping")]
    pub heading_damping: f64,

    /// Number of ticks between telemetry log records, 0 disables the log.
    pub telem_log_period_ticks: u64,

    /// Number of ticks between progress lines, 0 disables them.
    pub status_print_period_ticks: u64,

    /// Target period of one tick.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Give up if the queue has not been completed after this many ticks.
    #[serde(default)]
    pub max_ticks: Option<u64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Params {
    /// Check the parameters describe a run that can be flown.
    pub fn validate(&self) -> Result<(), FormCtrlError> {
        let positive = [
            ("v_max_ms", self.v_max_ms),
            ("close_enough_m", self.close_enough_m),
            ("cmd_duration_s", self.cmd_duration_s),
        ];
        for (name, value) in positive.iter() {
            if !value.is_finite() || *value <= 0.0 {
                return Err(FormCtrlError::InvalidParams(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if !self.min_distance_m.is_finite() || self.min_distance_m < 0.0 {
            return Err(FormCtrlError::InvalidParams(format!(
                "min_distance_m must not be negative, got {}",
                self.min_distance_m
            )));
        }

        if self.max_distance_m < self.min_distance_m {
            return Err(FormCtrlError::InvalidParams(format!(
                "max_distance_m ({}) is less than min_distance_m ({})",
                self.max_distance_m, self.min_distance_m
            )));
        }

        if !self.heading_damping.is_finite() || self.heading_damping < 0.0 {
            return Err(FormCtrlError::InvalidParams(format!(
                "heading_damping must not be negative, got {}",
                self.heading_damping
            )));
        }

        if !self.altitude_m.is_finite() || !self.cycle_period_s.is_finite() {
            return Err(FormCtrlError::InvalidParams(
                "altitude_m and cycle_period_s must be finite".into(),
            ));
        }

        if self
            .waypoints_m
            .iter()
            .any(|w| !w[0].is_finite() || !w[1].is_finite())
        {
            return Err(FormCtrlError::InvalidParams(
                "waypoints must be finite".into(),
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

    const PARAMS_TOML: &str = r#"
        v_max_ms = 1.25
        min_distance_m = 5.0
        max_distance_m = 100.0
        close_enough_m = 1.0
        cmd_duration_s = 0.1
        altitude_m = -2.0
        waypoints_m = [[25.0, 100.0], [100.0, 75.0]]
        telem_log_period_ticks = 10
        status_print_period_ticks = 50
        cycle_period_s = 0.1
    "#;

    #[test]
    fn test_params_defaults() {
        let p: Params = util::params::from_str(PARAMS_TOML).unwrap();

        assert_eq!(p.heading_damping, DEFAULT_HEADING_DAMPING);
        assert_eq!(p.max_ticks, None);
        assert_eq!(p.waypoints_m.len(), 2);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_shipped_params_valid() {
        let p: Params =
            util::params::from_str(include_str!("../../../params/form_ctrl.toml")).unwrap();
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_params_validation() {
        let p: Params = util::params::from_str(PARAMS_TOML).unwrap();

        let mut bad = p.clone();
        bad.close_enough_m = 0.0;
        assert!(matches!(bad.validate(), Err(FormCtrlError::InvalidParams(_))));

        let mut bad = p.clone();
        bad.cmd_duration_s = std::f64::NAN;
        assert!(matches!(bad.validate(), Err(FormCtrlError::InvalidParams(_))));

        let mut bad = p;
        bad.max_distance_m = 1.0;
        assert!(matches!(bad.validate(), Err(FormCtrlError::InvalidParams(_))));
    }
}
