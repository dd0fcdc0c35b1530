//! Tolerance-based comparison of tensor values.

/// Absolute and relative tolerance used by [`allclose`].
pub const DEFAULT_TOLERANCE: f64 = 1e-8;

/// `true` if both slices have the same length and every pair satisfies
/// `|a - b| <= atol + rtol * |b|`, with `expected` as the reference side.
///
/// NaNs never compare close. Equal infinities do.
pub fn allclose_with(actual: &[f64], expected: &[f64], atol: f64, rtol: f64) -> bool {
    actual.len() == expected.len()
        && actual.iter().zip(expected).all(|(&a, &b)| {
            if a == b {
                return true;
            }
            (a - b).abs() <= atol + rtol * b.abs()
        })
}

/// [`allclose_with`] using [`DEFAULT_TOLERANCE`] for both tolerances.
pub fn allclose(actual: &[f64], expected: &[f64]) -> bool {
    allclose_with(actual, expected, DEFAULT_TOLERANCE, DEFAULT_TOLERANCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_tolerance() {
        assert!(allclose(&[1.0 / 3.0], &[0.333_333_333_3]));
        assert!(allclose(&[1e9], &[1e9 + 5.0]));
        assert!(!allclose(&[1.0], &[1.0 + 1e-6]));
    }

    #[test]
    fn length_and_nan_mismatch() {
        assert!(!allclose(&[1.0, 2.0], &[1.0]));
        assert!(!allclose(&[f64::NAN], &[f64::NAN]));
        assert!(allclose(&[f64::INFINITY], &[f64::INFINITY]));
        assert!(allclose(&[], &[]));
    }
}
