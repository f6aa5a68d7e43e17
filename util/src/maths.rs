//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value between `min` and `max`.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Round a value to the given number of decimal places.
///
/// Halfway cases are rounded away from zero.
pub fn round_dp<T>(value: T, decimal_places: i32) -> T
where
    T: Float,
{
    let scale = T::from(10.0).unwrap().powi(decimal_places);
    (value * scale).round() / scale
}

/// Get the signed angular distance between two angles in the range of [0, 2pi].
///
/// This function will return the shortest signed distance from a to b accounting for wrapping
/// between 0 and 2pi.
pub fn get_ang_dist_2pi<T>(a: T, b: T) -> T
where
    T: Float,
{
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    let c = rem_euclid(a - b, tau_t);
    let d = rem_euclid(b - a, tau_t);

    if c < d {
        -c
    } else {
        d
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

/// Map a value in the range [-pi, pi] to [0, 2pi]
pub fn map_pi_to_2pi<T>(value: T) -> T
where
    T: Float,
{
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    if value < T::zero() {
        tau_t + value
    } else {
        value
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_ang_dist_2pi() {
        const TAU: f64 = std::f64::consts::TAU;

        assert_eq!(get_ang_dist_2pi(1f64, 2f64), 1f64);
        assert_eq!(get_ang_dist_2pi(2f64, 1f64), -1f64);
        assert_eq!(get_ang_dist_2pi(0f64, TAU), 0f64);
        assert_eq!(get_ang_dist_2pi(TAU, 0f64), 0f64);
        assert_eq!(get_ang_dist_2pi(1f64, TAU), -1f64);
        assert_eq!(get_ang_dist_2pi(0f64, TAU - 1f64), -1f64);
    }

    #[test]
    fn test_round_dp() {
        assert_eq!(round_dp(1.23456f64, 4), 1.2346);
        assert_eq!(round_dp(-0.00004f64, 4), 0.0);
        assert_eq!(round_dp(2.0f64, 4), 2.0);
    }

    #[test]
    fn test_map_pi_to_2pi() {
        const PI: f64 = std::f64::consts::PI;

        assert_eq!(map_pi_to_2pi(-PI / 2.0), 1.5 * PI);
        assert_eq!(map_pi_to_2pi(PI / 2.0), PI / 2.0);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&5.0f64, &0.0, &1.0), 1.0);
        assert_eq!(clamp(&-5.0f64, &0.0, &1.0), 0.0);
        assert_eq!(clamp(&0.5f64, &0.0, &1.0), 0.5);
    }
}
