//! Rational timing types for exact musical timing
//!
//! Beat positions, pattern durations and TimeVar windows are all exact
//! rationals so that triplets and nested subdivisions never drift, no matter
//! how long a session runs.

use num_rational::Ratio;
use num_traits::Zero;

/// Exact time point or duration, measured in beats
/// Uses i64 for large numerator/denominator support
pub type Time = Ratio<i64>;

/// Helper to create Time from a ratio n/d
#[inline]
pub fn time(n: i64, d: i64) -> Time {
    Ratio::new(n, d)
}

/// Create Time from an integer (whole beats)
#[inline]
pub fn beats(n: i64) -> Time {
    Ratio::from_integer(n)
}

/// Convert rational to f64 for output and interpolation
#[inline]
pub fn to_f64(t: Time) -> f64 {
    *t.numer() as f64 / *t.denom() as f64
}

/// Convert f64 to approximate Time (for user-entered beat values)
/// Uses a fixed denominator for reasonable precision
pub fn from_f64(f: f64) -> Time {
    // 9600 is the LCM of common musical divisions: 24, 32, 48, etc.
    let denom = 9600i64;
    let numer = (f * denom as f64).round() as i64;
    Ratio::new(numer, denom)
}

/// Position of `t` on a grid of `steps` subdivisions per beat, rounded to the
/// nearest step (halves round away from zero).
pub fn to_steps(t: Time, steps: u32) -> i64 {
    (t * Ratio::from_integer(steps as i64)).round().to_integer()
}

/// The beat at which step `step` of a `steps`-per-beat grid falls.
pub fn from_steps(step: u64, steps: u32) -> Time {
    Ratio::new(step as i64, steps.max(1) as i64)
}

/// Remainder of `t` modulo a positive `period`, always in `[0, period)`.
pub fn wrap(t: Time, period: Time) -> Time {
    if period.is_zero() {
        return t;
    }
    let cycles = (t / period).floor();
    t - cycles * period
}

/// Lossy conversion used when a float is unavoidable (e.g. sleeping)
pub fn to_secs(beats: Time, bpm: f64) -> f64 {
    to_f64(beats) * 60.0 / bpm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_creation() {
        let t = time(1, 3);
        assert_eq!(*t.numer(), 1);
        assert_eq!(*t.denom(), 3);
    }

    #[test]
    fn test_time_arithmetic() {
        let a = time(1, 3);
        let b = time(1, 6);
        assert_eq!(a + b, time(1, 2)); // 1/3 + 1/6 = 1/2
    }

    #[test]
    fn test_conversion_roundtrip() {
        let f = to_f64(time(1, 3));
        assert!((f - 0.333333333).abs() < 0.0001);
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(to_f64(from_f64(0.5)), 0.5);
        assert_eq!(from_f64(0.25), time(1, 4));
    }

    #[test]
    fn test_steps_grid() {
        assert_eq!(to_steps(time(3, 2), 4), 6);
        // 1/3 beat on a 4-step grid lands on the nearest step
        assert_eq!(to_steps(time(1, 3), 4), 1);
        assert_eq!(to_steps(time(1, 2), 3), 2);
        assert_eq!(from_steps(6, 4), time(3, 2));
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap(beats(9), beats(8)), beats(1));
        assert_eq!(wrap(time(17, 2), beats(4)), time(1, 2));
        assert_eq!(wrap(beats(3), beats(8)), beats(3));
    }

    #[test]
    fn test_to_secs() {
        // 1 beat at 120 BPM = 0.5 seconds
        assert!((to_secs(beats(1), 120.0) - 0.5).abs() < 1e-9);
    }
}
