//! Stock reconciliation for a prescription line.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::frequency::Frequency;
use super::quantity::{max_days_for, required_for, stock_limit, treatment_days};

/// Unit label used when the caller has none.
pub const DEFAULT_UNIT_LABEL: &str = "units";

/// Raised when the required quantity exceeds the stock of the selected batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockWarning {
    /// Units the frequency and day count call for
    pub required: f64,
    /// Units in stock for the selected batch
    pub available: f64,
    /// Unit of measure label (e.g., "EA", "BOTTLE")
    pub unit: String,
    /// Most days the stock covers at this frequency
    pub max_days: u64,
}

impl fmt::Display for StockWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let day_word = if self.max_days == 1 { "day" } else { "days" };
        write!(
            f,
            "Insufficient stock: {} {unit} required but only {} {unit} available. \
             At this frequency the stock covers at most {} {}.",
            self.required,
            self.available,
            self.max_days,
            day_word,
            unit = self.unit,
        )
    }
}

/// Outcome of reconciling a line against stock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconciliationResult {
    /// Quantity to dispense (never above known stock)
    pub final_quantity: f64,
    /// Present only when the quantity was capped
    pub warning: Option<StockWarning>,
}

impl ReconciliationResult {
    /// Whether the quantity was capped to stock.
    pub fn is_capped(&self) -> bool {
        self.warning.is_some()
    }

    /// User-facing warning text, if any.
    pub fn warning_message(&self) -> Option<String> {
        self.warning.as_ref().map(ToString::to_string)
    }
}

/// Compute the quantity for a line and cap it to the available stock.
///
/// Zero or missing `available_quantity` means stock is unknown and nothing is
/// capped.
pub fn reconcile_against_stock(
    spec: &str,
    days: Option<i64>,
    available_quantity: Option<f64>,
    unit: &str,
) -> ReconciliationResult {
    let frequency = (!spec.trim().is_empty()).then(|| Frequency::parse(spec));
    let required = match (&frequency, treatment_days(days)) {
        (Some(frequency), Some(days)) => required_for(frequency, days),
        _ => 0.0,
    };

    let Some(available) = stock_limit(available_quantity) else {
        return ReconciliationResult {
            final_quantity: required,
            warning: None,
        };
    };

    if required <= available {
        return ReconciliationResult {
            final_quantity: required,
            warning: None,
        };
    }

    // required > 0 here, so the spec was non-empty
    let max_days = frequency
        .as_ref()
        .map(|f| max_days_for(f, available))
        .unwrap_or(0);
    let unit = if unit.trim().is_empty() {
        DEFAULT_UNIT_LABEL
    } else {
        unit
    };

    ReconciliationResult {
        final_quantity: available,
        warning: Some(StockWarning {
            required,
            available,
            unit: unit.to_string(),
            max_days,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dosing::compute_required_quantity;
    use proptest::prelude::*;

    #[test]
    fn test_caps_to_stock_with_warning() {
        let result = reconcile_against_stock("1-0-1", Some(10), Some(15.0), "EA");

        assert_eq!(result.final_quantity, 15.0);
        assert!(result.is_capped());

        let warning = result.warning.as_ref().unwrap();
        assert_eq!(warning.required, 20.0);
        assert_eq!(warning.available, 15.0);
        assert_eq!(warning.unit, "EA");
        assert_eq!(warning.max_days, 7);

        let message = result.warning_message().unwrap();
        assert!(message.contains("20 EA"));
        assert!(message.contains("15 EA"));
        assert!(message.contains("7 days"));
    }

    #[test]
    fn test_within_stock() {
        let result = reconcile_against_stock("1-0-1", Some(3), Some(15.0), "EA");
        assert_eq!(result.final_quantity, 6.0);
        assert!(result.warning.is_none());
    }

    #[test]
    fn test_exactly_at_stock() {
        let result = reconcile_against_stock("1-0-1", Some(5), Some(10.0), "EA");
        assert_eq!(result.final_quantity, 10.0);
        assert!(!result.is_capped());
    }

    #[test]
    fn test_unknown_stock_is_unconstrained() {
        let result = reconcile_against_stock("1-0-1", Some(10), Some(0.0), "EA");
        assert_eq!(result.final_quantity, 20.0);
        assert!(result.warning.is_none());

        let result = reconcile_against_stock("1-0-1", Some(10), None, "EA");
        assert_eq!(result.final_quantity, 20.0);
        assert!(result.warning.is_none());
    }

    #[test]
    fn test_fractional_stock() {
        let result = reconcile_against_stock("Twice daily", Some(5), Some(7.5), "BOTTLE");
        assert_eq!(result.final_quantity, 7.5);
        let message = result.warning_message().unwrap();
        assert!(message.contains("7.5 BOTTLE"));
        assert!(message.contains("3 days"));
    }

    #[test]
    fn test_singular_day_and_default_unit() {
        let result = reconcile_against_stock("1-0-1", Some(3), Some(3.0), "");
        let message = result.warning_message().unwrap();
        assert!(message.contains("6 units required"));
        assert!(message.contains("at most 1 day."));
    }

    #[test]
    fn test_empty_inputs_yield_zero() {
        let result = reconcile_against_stock("", Some(10), Some(15.0), "EA");
        assert_eq!(result.final_quantity, 0.0);
        assert!(result.warning.is_none());

        let result = reconcile_against_stock("1-0-1", None, Some(15.0), "EA");
        assert_eq!(result.final_quantity, 0.0);
        assert!(result.warning.is_none());
    }

    #[test]
    fn test_idempotent() {
        let first = reconcile_against_stock("1-0-1", Some(10), Some(15.0), "EA");
        let second = reconcile_against_stock("1-0-1", Some(10), Some(15.0), "EA");
        assert_eq!(first, second);
    }

    fn schedule() -> impl Strategy<Value = String> {
        prop_oneof![
            (0u32..5, 0u32..5, 0u32..5).prop_map(|(m, a, e)| format!("{}-{}-{}", m, a, e)),
            (0u32..8, 0u32..8, 0u32..8).prop_map(|(m, a, e)| {
                format!("{}-{}-{}", m as f64 / 4.0, a as f64 / 4.0, e as f64 / 4.0)
            }),
            prop::sample::select(vec![
                "once daily".to_string(),
                "Twice daily".to_string(),
                "three times a day".to_string(),
                "four times".to_string(),
                "as needed".to_string(),
            ]),
        ]
    }

    proptest! {
        #[test]
        fn final_quantity_never_exceeds_stock(
            spec in schedule(),
            days in -5i64..120,
            available in 0.0..500.0f64,
        ) {
            let result = reconcile_against_stock(&spec, Some(days), Some(available), "EA");
            prop_assert!(result.final_quantity >= 0.0);
            if available > 0.0 {
                prop_assert!(result.final_quantity <= available);
            }
        }

        #[test]
        fn warning_iff_required_exceeds_stock(
            spec in schedule(),
            days in 1i64..120,
            available in 1.0..500.0f64,
        ) {
            let required = compute_required_quantity(&spec, Some(days));
            let result = reconcile_against_stock(&spec, Some(days), Some(available), "EA");
            prop_assert_eq!(result.is_capped(), required > available);
            if let Some(warning) = result.warning {
                prop_assert_eq!(warning.required, required);
                prop_assert_eq!(warning.available, available);
            }
        }

        #[test]
        fn required_is_monotonic_in_days(spec in schedule(), days in 0i64..365) {
            let shorter = compute_required_quantity(&spec, Some(days));
            let longer = compute_required_quantity(&spec, Some(days + 1));
            prop_assert!(longer >= shorter);
        }

        #[test]
        fn structured_spec_sums_segments(m in 0u32..20, a in 0u32..20, e in 0u32..20) {
            let spec = format!("{}-{}-{}", m, a, e);
            prop_assert_eq!(
                crate::dosing::parse_frequency(&spec),
                f64::from(m + a + e)
            );
        }

        #[test]
        fn max_days_never_overstates_stock(
            spec in schedule(),
            available in 1.0..500.0f64,
        ) {
            let max_days = crate::dosing::compute_max_days(&spec, Some(available));
            if max_days > 0 {
                let needed = compute_required_quantity(&spec, Some(max_days as i64));
                prop_assert!(needed <= available.ceil());
            }
        }
    }
}
