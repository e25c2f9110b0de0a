//! Rounding helpers for currency and percent values.

/// Round to 2 decimal places (currency amounts, revenue).
pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Round to 1 decimal place (percentages).
pub(crate) fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
