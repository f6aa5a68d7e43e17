//! # Seek intent
//!
//! Reference motion intent strategy. In formation mode the vehicle steers straight for its own
//! sub-target, slowing as it closes in, while it is badly misaligned, and while a neighbour is
//! inside the minimum separation. In orbit mode it approaches the target object then circles it
//! while facing it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use nalgebra::{Point2, Vector2};
use serde::Deserialize;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, TAU};
use util::maths::{clamp, get_ang_dist_2pi, map_pi_to_2pi, rem_euclid};

use super::{MotionIntent, MoveIntent, OrbitIntent, OrbitTarget};
use crate::fleet::Vehicle;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Below this distance the target is considered reached and no heading can be computed.
const MIN_TARGET_DIST_M: f64 = 1e-6;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the seek strategy.
#[derive(Debug, Clone, Deserialize)]
pub struct SeekParams {
    /// Maximum speed demand.
    ///
    /// Units: meters/second
    pub v_max_ms: f64,

    /// Neighbours closer than this slow the vehicle down proportionally.
    ///
    /// Units: meters
    pub min_distance_m: f64,

    /// Neighbours further than this are ignored.
    ///
    /// Units: meters
    pub max_distance_m: f64,

    /// Speed demanded per meter of distance to the target, before saturation.
    ///
    /// Units: 1/seconds
    pub speed_gain: f64,

    /// Radius of the orbit around an orbit target.
    ///
    /// Units: meters
    pub orbit_radius_m: f64,

    /// Width of the band around the orbit radius in which the vehicle circles rather than
    /// approaches.
    ///
    /// Units: meters
    pub orbit_band_m: f64,
}

/// Seek strategy bound to a single vehicle.
pub struct SeekIntent {
    vehicle_id: String,

    params: SeekParams,

    /// Spacing entropy of the last neighbourhood seen.
    metric: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SeekIntent {
    pub fn new(vehicle_id: &str, params: SeekParams) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            params,
            metric: 0.0,
        }
    }

    /// A factory closure building one seek strategy per vehicle from shared parameters.
    pub fn factory(params: SeekParams) -> impl Fn(&str) -> Box<dyn MotionIntent> {
        move |vehicle_id: &str| {
            Box::new(SeekIntent::new(vehicle_id, params.clone())) as Box<dyn MotionIntent>
        }
    }

    /// Distances to all neighbours within the survey distance.
    fn neighbour_distances(&self, own_m: &Point2<f64>, others: &[Point2<f64>]) -> Vec<f64> {
        others
            .iter()
            .map(|o| nalgebra::distance(own_m, o))
            .filter(|d| *d <= self.params.max_distance_m)
            .collect()
    }
}

impl MotionIntent for SeekIntent {
    fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    fn next_move(&mut self, own: &Vehicle, others: &[Point2<f64>]) -> MoveIntent {
        let own_m = own.position_xy();
        let neighbours = self.neighbour_distances(&own_m, others);
        self.metric = spacing_entropy(&neighbours);

        let sub_target = match own.sub_target_m {
            Some(t) => t,
            None => return MoveIntent::hold(),
        };

        let to_target: Vector2<f64> = sub_target - own_m;
        let dist_m = to_target.norm();
        if dist_m < MIN_TARGET_DIST_M {
            return MoveIntent::hold();
        }

        let head_error_rad = get_ang_dist_2pi(own.heading_rad, bearing(&to_target));

        // Proportional approach, no forward motion while facing away from the target
        let mut speed_ms = clamp(&(dist_m * self.params.speed_gain), &0.0, &self.params.v_max_ms);
        speed_ms *= head_error_rad.cos().max(0.0);

        let nearest_m = neighbours.iter().cloned().fold(std::f64::INFINITY, f64::min);
        if nearest_m < self.params.min_distance_m {
            speed_ms *= nearest_m / self.params.min_distance_m;
        }

        trace!(
            "{} seek: dist {:.3} m, head error {:.3} rad, speed {:.3} m/s",
            self.vehicle_id,
            dist_m,
            head_error_rad,
            speed_ms
        );

        MoveIntent {
            speed_ms,
            turn_rate_rads: head_error_rad,
        }
    }

    fn orbit(
        &mut self,
        own: &Vehicle,
        moving_heading_rad: f64,
        target: &OrbitTarget,
    ) -> OrbitIntent {
        let to_target: Vector2<f64> = target.position_m - own.position_xy();
        let dist_m = to_target.norm();
        if dist_m < MIN_TARGET_DIST_M {
            return OrbitIntent {
                speed_ms: 0.0,
                turn_rate_rads: 0.0,
                facing_rate_rads: None,
            };
        }

        let bearing_rad = bearing(&to_target);
        let radial_error_m = dist_m - self.params.orbit_radius_m;

        // Outside the band fly straight at the target
        if radial_error_m > self.params.orbit_band_m {
            let head_error_rad = get_ang_dist_2pi(moving_heading_rad, bearing_rad);
            return OrbitIntent {
                speed_ms: self.params.v_max_ms * head_error_rad.cos().max(0.0),
                turn_rate_rads: head_error_rad,
                facing_rate_rads: None,
            };
        }

        // Inside the band move tangentially (anticlockwise), leaning in or out to hold the radius,
        // while facing the target
        let band_m = self.params.orbit_band_m.max(MIN_TARGET_DIST_M);
        let correction_rad = clamp(&(radial_error_m / band_m), &-1.0, &1.0) * FRAC_PI_4;
        let moving_rad = rem_euclid(bearing_rad + FRAC_PI_2 - correction_rad, TAU);

        OrbitIntent {
            speed_ms: self.params.v_max_ms,
            turn_rate_rads: get_ang_dist_2pi(moving_heading_rad, moving_rad),
            facing_rate_rads: Some(get_ang_dist_2pi(own.heading_rad, bearing_rad)),
        }
    }

    fn metric(&self) -> f64 {
        self.metric
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Bearing of a vector in [0, 2pi).
fn bearing(v: &Vector2<f64>) -> f64 {
    map_pi_to_2pi(v.y.atan2(v.x))
}

/// Shannon entropy of the neighbour distance distribution.
///
/// Zero for no or one neighbour, maximal (ln n) when all neighbours are equally spaced.
fn spacing_entropy(distances_m: &[f64]) -> f64 {
    let total: f64 = distances_m.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }

    -distances_m
        .iter()
        .map(|d| d / total)
        .filter(|p| *p > 0.0)
        .map(|p| p * p.ln())
        .sum::<f64>()
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Point3;
    use std::f64::consts::PI;

    fn params() -> SeekParams {
        SeekParams {
            v_max_ms: 1.25,
            min_distance_m: 5.0,
            max_distance_m: 100.0,
            speed_gain: 0.5,
            orbit_radius_m: 10.0,
            orbit_band_m: 2.0,
        }
    }

    fn vehicle_at(x: f64, y: f64, heading_rad: f64) -> Vehicle {
        let mut v = Vehicle::new("Drone1", Point3::new(x, y, -2.0));
        v.heading_rad = heading_rad;
        v
    }

    #[test]
    fn test_holds_without_sub_target() {
        let mut s = SeekIntent::new("Drone1", params());
        let v = vehicle_at(0.0, 0.0, 0.0);

        assert_eq!(s.next_move(&v, &[]), MoveIntent::hold());
    }

    #[test]
    fn test_seeks_aligned_target_at_max_speed() {
        let mut s = SeekIntent::new("Drone1", params());
        let mut v = vehicle_at(0.0, 0.0, 0.0);
        v.sub_target_m = Some(Point2::new(20.0, 0.0));

        let m = s.next_move(&v, &[]);
        assert_eq!(m.speed_ms, 1.25);
        assert_eq!(m.turn_rate_rads, 0.0);
    }

    #[test]
    fn test_turns_toward_target_behind() {
        let mut s = SeekIntent::new("Drone1", params());
        let mut v = vehicle_at(0.0, 0.0, 0.0);
        v.sub_target_m = Some(Point2::new(0.0, 20.0));

        let m = s.next_move(&v, &[]);
        assert!((m.turn_rate_rads - PI / 2.0).abs() < 1e-12);
        assert!(m.speed_ms.abs() < 1e-12);

        v.heading_rad = 1.5 * PI;
        let m = s.next_move(&v, &[]);
        assert!((m.turn_rate_rads.abs() - PI).abs() < 1e-12);
        assert_eq!(m.speed_ms, 0.0);
    }

    #[test]
    fn test_slows_near_neighbours() {
        let mut s = SeekIntent::new("Drone1", params());
        let mut v = vehicle_at(0.0, 0.0, 0.0);
        v.sub_target_m = Some(Point2::new(20.0, 0.0));

        let m = s.next_move(&v, &[Point2::new(0.0, 2.5)]);
        assert!((m.speed_ms - 0.625).abs() < 1e-12);
    }

    #[test]
    fn test_metric_is_spacing_entropy() {
        let mut s = SeekIntent::new("Drone1", params());
        let v = vehicle_at(0.0, 0.0, 0.0);

        s.next_move(&v, &[Point2::new(10.0, 0.0), Point2::new(0.0, 10.0)]);
        assert!((s.metric() - 2f64.ln()).abs() < 1e-12);

        // Neighbours beyond the survey distance are ignored
        s.next_move(&v, &[Point2::new(10.0, 0.0), Point2::new(500.0, 0.0)]);
        assert_eq!(s.metric(), 0.0);
    }

    #[test]
    fn test_orbit_approach_then_circle() {
        let mut s = SeekIntent::new("Drone1", params());
        let target = OrbitTarget {
            name: "Cube".into(),
            position_m: Point2::new(50.0, 0.0),
        };

        // Far away, fly straight at it
        let o = s.orbit(&vehicle_at(0.0, 0.0, 0.0), 0.0, &target);
        assert_eq!(o.facing_rate_rads, None);
        assert_eq!(o.speed_ms, 1.25);
        assert_eq!(o.turn_rate_rads, 0.0);

        // On the orbit radius, facing the target, move tangentially
        let o = s.orbit(&vehicle_at(40.0, 0.0, 0.0), 0.0, &target);
        assert_eq!(o.facing_rate_rads, Some(0.0));
        assert!((o.turn_rate_rads - FRAC_PI_2).abs() < 1e-12);

        // Already moving tangentially while facing away, only the facing needs to turn
        let o = s.orbit(&vehicle_at(40.0, 0.0, PI), FRAC_PI_2, &target);
        assert!(o.turn_rate_rads.abs() < 1e-12);
        assert!((o.facing_rate_rads.unwrap().abs() - PI).abs() < 1e-12);

        // Outside the radius but within the band, lean in towards the target
        let o = s.orbit(&vehicle_at(38.5, 0.0, 0.0), FRAC_PI_2, &target);
        assert!((o.turn_rate_rads + 0.75 * FRAC_PI_4).abs() < 1e-12);
    }
}
