//! Consumption forecast math
//!
//! Projects days-until-empty for a product from the grams consumed by
//! completed orders inside a trailing window. The projection is a pure
//! function of stored state: identical inputs always produce identical
//! output.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Day thresholds separating urgent / warning / ok products
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DepletionThresholds {
    pub urgent_days: i64,
    pub warning_days: i64,
}

impl Default for DepletionThresholds {
    fn default() -> Self {
        Self {
            urgent_days: 7,
            warning_days: 14,
        }
    }
}

/// Severity bucket for a projected depletion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DepletionSeverity {
    Urgent,
    Warning,
    Ok,
}

/// Average grams consumed per day over the window.
pub fn daily_rate(consumed_g: Decimal, window_days: u32) -> Decimal {
    if window_days == 0 {
        return Decimal::ZERO;
    }
    consumed_g / Decimal::from(window_days)
}

/// Whole days until the ledger reaches zero at the given daily rate.
///
/// Returns `None` when the rate is zero or negative: such products never
/// deplete at the observed pace and must be excluded from at-risk views
/// instead of being displayed as a number.
pub fn days_remaining(on_hand_g: Decimal, rate: Decimal) -> Option<i64> {
    if rate <= Decimal::ZERO {
        return None;
    }
    (on_hand_g / rate).floor().to_i64()
}

/// Classify a projection against the thresholds. Products without a
/// projection (zero consumption) are never at risk.
pub fn classify(days: Option<i64>, thresholds: &DepletionThresholds) -> DepletionSeverity {
    match days {
        Some(d) if d <= thresholds.urgent_days => DepletionSeverity::Urgent,
        Some(d) if d <= thresholds.warning_days => DepletionSeverity::Warning,
        _ => DepletionSeverity::Ok,
    }
}
