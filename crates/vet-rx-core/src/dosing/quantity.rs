//! Quantity and day-count arithmetic.

use super::frequency::Frequency;

/// Values within this many ULPs of a whole number are treated as that number,
/// so `0.1-0.1-0.1` for 10 days needs 3 units, not 4.
const WHOLE_NUMBER_ULPS: f64 = 4.0;

/// Total units needed to cover `days` at the given frequency.
///
/// Rounds up: a partial dose on the last day still consumes a full unit.
/// An empty spec or a missing/non-positive day count yields 0.
pub fn compute_required_quantity(spec: &str, days: Option<i64>) -> f64 {
    let Some(days) = treatment_days(days) else {
        return 0.0;
    };
    if spec.trim().is_empty() {
        return 0.0;
    }
    required_for(&Frequency::parse(spec), days)
}

/// Maximum whole days the available stock covers at the given frequency.
///
/// Rounds down. An empty spec, missing/non-positive stock or a zero-dose
/// schedule yields 0.
pub fn compute_max_days(spec: &str, available_quantity: Option<f64>) -> u64 {
    let Some(available) = stock_limit(available_quantity) else {
        return 0;
    };
    if spec.trim().is_empty() {
        return 0;
    }
    max_days_for(&Frequency::parse(spec), available)
}

pub(crate) fn required_for(frequency: &Frequency, days: i64) -> f64 {
    snap_to_whole(frequency.daily_doses() * days as f64).ceil()
}

pub(crate) fn max_days_for(frequency: &Frequency, available: f64) -> u64 {
    let daily = frequency.daily_doses();
    if daily <= 0.0 {
        return 0;
    }
    snap_to_whole(available / daily).floor() as u64
}

/// Positive day count, or None.
pub(crate) fn treatment_days(days: Option<i64>) -> Option<i64> {
    days.filter(|d| *d > 0)
}

/// Positive finite stock, or None when stock is unknown/unconstrained.
pub(crate) fn stock_limit(available_quantity: Option<f64>) -> Option<f64> {
    available_quantity.filter(|q| q.is_finite() && *q > 0.0)
}

fn snap_to_whole(value: f64) -> f64 {
    let rounded = value.round();
    let tolerance = WHOLE_NUMBER_ULPS * f64::EPSILON * rounded.abs().max(1.0);
    if (value - rounded).abs() <= tolerance {
        rounded
    } else {
        value
    }
}
