//! Percentage change between consecutive readings.

/// Signed percentage change of `current` relative to `previous`.
///
/// Returns `0.0` when there is no previous value, when the previous value is
/// zero, or when the result would not be finite.
///
/// ```
/// use aquawatch::data::trend;
///
/// assert_eq!(trend(110.0, Some(100.0)), 10.0);
/// assert_eq!(trend(42.0, None), 0.0);
/// ```
pub fn trend(current: f64, previous: Option<f64>) -> f64 {
    let Some(previous) = previous else {
        return 0.0;
    };
    if previous == 0.0 {
        return 0.0;
    }

    let change = (current - previous) / previous * 100.0;
    if change.is_finite() {
        change
    } else {
        0.0
    }
}
