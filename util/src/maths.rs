//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value between min and max.
///
/// Unlike `f64::clamp` this does not panic if `min > max`, `max` takes priority.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    let mut ret = *value;

    if ret < *min {
        ret = *min
    }
    if ret > *max {
        ret = *max
    }

    ret
}

/// Sign of a value, with zero (and NaN) mapping to zero.
pub fn sign<T>(value: T) -> T
where
    T: Float,
{
    if value > T::zero() {
        T::one()
    } else if value < T::zero() {
        -T::one()
    } else {
        T::zero()
    }
}

/// Clamp the magnitude of a value into `[floor, ceiling]` while keeping its sign.
///
/// A zero value stays at zero, so a floor never creates motion where none was requested.
pub fn clamp_magnitude<T>(value: T, floor: T, ceiling: T) -> T
where
    T: Float,
{
    sign(value) * clamp(&value.abs(), &floor, &ceiling)
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
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

/// Wrap an angle into the range `[-pi, pi)`.
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float + num_traits::FloatConst,
{
    rem_euclid(angle + T::PI(), T::PI() + T::PI()) - T::PI()
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&5.0, &1.0, &3.0), 3.0);
        assert_eq!(clamp(&-5.0, &1.0, &3.0), 1.0);
        assert_eq!(clamp(&2.0, &1.0, &3.0), 2.0);
    }

    #[test]
    fn test_sign() {
        assert_eq!(sign(3.2), 1.0);
        assert_eq!(sign(-0.1), -1.0);
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(f64::NAN), 0.0);
    }

    #[test]
    fn test_clamp_magnitude() {
        // Below the floor
        assert_eq!(clamp_magnitude(0.01, 0.05, 1.0), 0.05);
        assert_eq!(clamp_magnitude(-0.01, 0.05, 1.0), -0.05);

        // Above the ceiling
        assert_eq!(clamp_magnitude(4.0, 0.05, 1.0), 1.0);
        assert_eq!(clamp_magnitude(-4.0, 0.05, 1.0), -1.0);

        // In range
        assert_eq!(clamp_magnitude(-0.5, 0.05, 1.0), -0.5);

        // Zero stays zero
        assert_eq!(clamp_magnitude(0.0, 0.05, 1.0), 0.0);
    }

    #[test]
    fn test_wrap_pi() {
        assert!(approx_eq(wrap_pi(0.0), 0.0));
        assert!(approx_eq(wrap_pi(1.5 * PI), -0.5 * PI));
        assert!(approx_eq(wrap_pi(-1.5 * PI), 0.5 * PI));
        assert!(approx_eq(wrap_pi(4.0 * PI + 0.25), 0.25));
    }
}
