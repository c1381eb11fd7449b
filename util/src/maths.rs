//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

/// Bound `value` into `[min, max]`.
///
/// `min` must not be greater than `max`. A NaN `value` is bounded to `min`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    value.max(min).min(max)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(0.5, 0.2, 0.8), 0.5);
        assert_eq!(clamp(-3.0, 0.2, 0.8), 0.2);
        assert_eq!(clamp(3.0, 0.2, 0.8), 0.8);
        assert_eq!(clamp(1e300, 0.2, 0.8), 0.8);
        assert_eq!(clamp(-1e300, 0.2, 0.8), 0.2);
        assert_eq!(clamp(std::f64::INFINITY, 0.2, 0.8), 0.8);
        assert_eq!(clamp(std::f64::NAN, 0.2, 0.8), 0.2);
    }

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0f64, 1f64), (-1f64, 1f64), 0.5), 0.0);
        assert_eq!(lin_map((0f64, 1f64), (0f64, 4096f64), 0.25), 1024.0);
    }
}
