//! Order status state machine tests
//!
//! open -> in_progress -> done, nothing else. Done is terminal.

use proptest::prelude::*;

use shared::models::OrderStatus;

const ALL_STATUSES: [OrderStatus; 3] = [
    OrderStatus::Open,
    OrderStatus::InProgress,
    OrderStatus::Done,
];

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_claim_is_the_only_edge_out_of_open() {
        assert!(OrderStatus::Open.can_transition_to(OrderStatus::InProgress));
        assert!(!OrderStatus::Open.can_transition_to(OrderStatus::Done));
        assert!(!OrderStatus::Open.can_transition_to(OrderStatus::Open));
    }

    #[test]
    fn test_completion_is_the_only_edge_out_of_in_progress() {
        assert!(OrderStatus::InProgress.can_transition_to(OrderStatus::Done));
        assert!(!OrderStatus::InProgress.can_transition_to(OrderStatus::Open));
        assert!(!OrderStatus::InProgress.can_transition_to(OrderStatus::InProgress));
    }

    #[test]
    fn test_done_is_terminal() {
        assert!(OrderStatus::Done.is_terminal());
        for next in ALL_STATUSES {
            assert!(!OrderStatus::Done.can_transition_to(next));
        }
    }

    #[test]
    fn test_transition_returns_typed_error() {
        let err = OrderStatus::Done
            .transition_to(OrderStatus::InProgress)
            .unwrap_err();
        assert_eq!(err.from, OrderStatus::Done);
        assert_eq!(err.to, OrderStatus::InProgress);
        assert!(err.to_string().contains("done"));
        assert!(err.to_string().contains("in_progress"));
    }

    #[test]
    fn test_successful_transition_returns_new_status() {
        let status = OrderStatus::Open
            .transition_to(OrderStatus::InProgress)
            .unwrap();
        assert_eq!(status, OrderStatus::InProgress);

        let status = status.transition_to(OrderStatus::Done).unwrap();
        assert_eq!(status, OrderStatus::Done);
    }

    #[test]
    fn test_wire_values_round_trip() {
        for status in ALL_STATUSES {
            assert_eq!(OrderStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::from_str("offen"), None);
        assert_eq!(OrderStatus::from_str(""), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn status_strategy() -> impl Strategy<Value = OrderStatus> {
        prop_oneof![
            Just(OrderStatus::Open),
            Just(OrderStatus::InProgress),
            Just(OrderStatus::Done),
        ]
    }

    proptest! {
        /// Exactly two edges exist in the whole machine
        #[test]
        fn prop_only_two_legal_edges(from in status_strategy(), to in status_strategy()) {
            let legal = matches!(
                (from, to),
                (OrderStatus::Open, OrderStatus::InProgress)
                    | (OrderStatus::InProgress, OrderStatus::Done)
            );
            prop_assert_eq!(from.can_transition_to(to), legal);
            prop_assert_eq!(from.transition_to(to).is_ok(), legal);
        }

        /// transition_to never mutates: it returns either `to` or an error
        /// naming both endpoints
        #[test]
        fn prop_transition_result_is_exact(from in status_strategy(), to in status_strategy()) {
            match from.transition_to(to) {
                Ok(next) => prop_assert_eq!(next, to),
                Err(err) => {
                    prop_assert_eq!(err.from, from);
                    prop_assert_eq!(err.to, to);
                }
            }
        }

        /// No sequence of legal transitions ever leaves Done
        #[test]
        fn prop_no_escape_from_done(targets in prop::collection::vec(status_strategy(), 1..10)) {
            let mut status = OrderStatus::Done;
            for target in targets {
                if let Ok(next) = status.transition_to(target) {
                    status = next;
                }
            }
            prop_assert_eq!(status, OrderStatus::Done);
        }
    }
}
