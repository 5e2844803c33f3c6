//! Consumption forecast tests
//!
//! Daily rate = grams consumed by completed orders in the window divided
//! by the window length; days remaining = floor(on-hand / rate), with no
//! projection at all when nothing was consumed.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::forecast::{
    classify, daily_rate, days_remaining, DepletionSeverity, DepletionThresholds,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_daily_rate() {
        // 300 g over 30 days -> 10 g/day
        assert_eq!(daily_rate(dec("300"), 30), dec("10"));
        // 53 g over 7 days
        assert_eq!(daily_rate(dec("53"), 7), dec("53") / dec("7"));
    }

    #[test]
    fn test_days_remaining_floors() {
        assert_eq!(days_remaining(dec("95"), dec("10")), Some(9));
        assert_eq!(days_remaining(dec("100"), dec("10")), Some(10));
        assert_eq!(days_remaining(dec("9.9"), dec("10")), Some(0));
    }

    /// Products without consumption have no projection and are excluded
    /// from at-risk classification
    #[test]
    fn test_zero_consumption_is_never_at_risk() {
        let rate = daily_rate(Decimal::ZERO, 30);
        let days = days_remaining(dec("1670"), rate);
        assert_eq!(days, None);
        assert_eq!(
            classify(days, &DepletionThresholds::default()),
            DepletionSeverity::Ok
        );
    }

    #[test]
    fn test_severity_thresholds() {
        let t = DepletionThresholds::default();
        assert_eq!(classify(Some(0), &t), DepletionSeverity::Urgent);
        assert_eq!(classify(Some(7), &t), DepletionSeverity::Urgent);
        assert_eq!(classify(Some(8), &t), DepletionSeverity::Warning);
        assert_eq!(classify(Some(14), &t), DepletionSeverity::Warning);
        assert_eq!(classify(Some(15), &t), DepletionSeverity::Ok);
    }

    #[test]
    fn test_custom_thresholds() {
        let t = DepletionThresholds {
            urgent_days: 3,
            warning_days: 10,
        };
        assert_eq!(classify(Some(3), &t), DepletionSeverity::Urgent);
        assert_eq!(classify(Some(4), &t), DepletionSeverity::Warning);
        assert_eq!(classify(Some(11), &t), DepletionSeverity::Ok);
    }

    /// At-risk ranking puts projected products first, ascending
    #[test]
    fn test_ranking_orders_projected_products_first() {
        let mut projections = vec![
            ("GG", days_remaining(dec("985"), daily_rate(dec("0"), 30))),
            ("MJ1", days_remaining(dec("40"), daily_rate(dec("300"), 30))),
            ("BK", days_remaining(dec("475"), daily_rate(dec("150"), 30))),
        ];
        projections.sort_by_key(|(_, days)| (days.is_none(), *days));

        let order: Vec<&str> = projections.iter().map(|(id, _)| *id).collect();
        // MJ1 runs out in 4 days, BK in 95, GG never
        assert_eq!(order, vec!["MJ1", "BK", "GG"]);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn grams_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=100000i64).prop_map(|n| Decimal::new(n, 1))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The projection is a pure function: identical inputs, identical
        /// output, every time.
        #[test]
        fn prop_forecast_is_idempotent(
            on_hand in grams_strategy(),
            consumed in grams_strategy(),
            window in 1u32..=365
        ) {
            let first = days_remaining(on_hand, daily_rate(consumed, window));
            let second = days_remaining(on_hand, daily_rate(consumed, window));
            prop_assert_eq!(first, second);
        }

        /// A projection exists exactly when something was consumed
        #[test]
        fn prop_projection_exists_iff_consumed(
            on_hand in grams_strategy(),
            consumed in grams_strategy(),
            window in 1u32..=365
        ) {
            let days = days_remaining(on_hand, daily_rate(consumed, window));
            prop_assert_eq!(days.is_some(), consumed > Decimal::ZERO);
        }

        /// More stock never shortens the projection
        #[test]
        fn prop_monotonic_in_stock(
            on_hand in grams_strategy(),
            extra in grams_strategy(),
            consumed in grams_strategy(),
            window in 1u32..=365
        ) {
            let rate = daily_rate(consumed, window);
            if let (Some(base), Some(more)) = (
                days_remaining(on_hand, rate),
                days_remaining(on_hand + extra, rate),
            ) {
                prop_assert!(more >= base);
            }
        }

        /// days_remaining is the floor of on_hand / rate
        #[test]
        fn prop_days_is_floor_of_quotient(
            on_hand in grams_strategy(),
            consumed in (1i64..=100000i64).prop_map(|n| Decimal::new(n, 1)),
            window in 1u32..=365
        ) {
            let rate = daily_rate(consumed, window);
            let days = days_remaining(on_hand, rate).unwrap();
            let exact = on_hand / rate;
            prop_assert!(Decimal::from(days) <= exact);
            prop_assert!(exact < Decimal::from(days + 1));
        }

        /// Severity is monotone: fewer days never lowers the severity
        #[test]
        fn prop_severity_monotone(days in 0i64..=1000) {
            let t = DepletionThresholds::default();
            let rank = |s: DepletionSeverity| match s {
                DepletionSeverity::Urgent => 0,
                DepletionSeverity::Warning => 1,
                DepletionSeverity::Ok => 2,
            };
            let today = rank(classify(Some(days), &t));
            let tomorrow = rank(classify(Some(days + 1), &t));
            prop_assert!(today <= tomorrow);
        }
    }
}
