//! General time utility functions

use chrono;
use std::{
    thread,
    time::{Duration, Instant},
};

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Sleep out the remainder of a cycle which started at `cycle_start`.
///
/// Returns the number of seconds the cycle overran by, or `None` if it completed within the
/// period.
pub fn sleep_remainder(cycle_start: Instant, period_s: f64) -> Option<f64> {
    let cycle_dur = Instant::now() - cycle_start;
    let period = Duration::from_secs_f64(period_s.max(0.0));

    match period.checked_sub(cycle_dur) {
        Some(d) => {
            thread::sleep(d);
            None
        }
        None => Some(cycle_dur.as_secs_f64() - period.as_secs_f64()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(
            duration_to_seconds(chrono::Duration::milliseconds(1500)), 
            Some(1.5)
        );
        assert_eq!(duration_to_seconds(chrono::Duration::max_value()), None);
    }

    #[test]
    fn test_sleep_remainder() {
        let start = Instant::now();
        assert_eq!(sleep_remainder(start, 0.01), None);
        assert!(start.elapsed() >= Duration::from_millis(10));

        let start = Instant::now() - Duration::from_millis(50);
        let overrun = sleep_remainder(start, 0.01).unwrap();
        assert!(overrun >= 0.04);
    }
}
