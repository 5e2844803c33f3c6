//! Reservation / reconciliation engine tests
//!
//! Simulates the engine's ledger semantics in memory against one product:
//! eager reservation at order creation, release on open-order deletion,
//! measured-remainder reconciliation at completion, warehouse receipts.
//! Checks the two core invariants: the ledger never goes negative as the
//! result of a reservation, and the audit trail forms an unbroken causal
//! chain.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::models::{
    verify_chain, OrderStatus, Package, StockAction, StockHistoryEntry,
};
use shared::packaging::order_needed_amount;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn bags(size: &str, quantity: u32) -> Vec<Package> {
    vec![Package {
        size_g: dec(size),
        quantity,
        is_custom: false,
        packaging_type: None,
    }]
}

/// In-memory rendition of one product's ledger plus its orders and audit
/// trail, mirroring the transactional engine's rules.
struct EngineSim {
    quantity_g: Decimal,
    orders: Vec<SimOrder>,
    history: Vec<StockHistoryEntry>,
    step: i64,
}

#[derive(Debug, Clone)]
struct SimOrder {
    id: i64,
    status: OrderStatus,
    needed_g: Decimal,
    remainder_g: Option<Decimal>,
}

#[derive(Debug, PartialEq)]
enum SimError {
    InsufficientStock,
    InvalidTransition,
    InvalidQuantity,
    NotFound,
}

impl EngineSim {
    fn new(initial_g: Decimal) -> Self {
        Self {
            quantity_g: initial_g,
            orders: Vec::new(),
            history: Vec::new(),
            step: 0,
        }
    }

    fn append_history(&mut self, action: StockAction, previous: Decimal, new: Decimal, order_id: Option<i64>) {
        self.step += 1;
        self.history.push(StockHistoryEntry {
            id: self.step,
            stock_id: "MJ1".to_string(),
            user_id: 1,
            action,
            previous_amount_g: previous,
            new_amount_g: new,
            change_amount_g: new - previous,
            reason: None,
            order_id,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
                + Duration::seconds(self.step),
        });
    }

    /// Create an order, eagerly reserving its needed amount.
    fn reserve(&mut self, packages: &[Package]) -> Result<i64, SimError> {
        let needed = order_needed_amount(packages);
        if needed > self.quantity_g {
            return Err(SimError::InsufficientStock);
        }
        let id = self.orders.len() as i64 + 1;
        let previous = self.quantity_g;
        self.quantity_g = previous - needed;
        self.orders.push(SimOrder {
            id,
            status: OrderStatus::Open,
            needed_g: needed,
            remainder_g: None,
        });
        self.append_history(StockAction::OrderCreated, previous, self.quantity_g, Some(id));
        Ok(id)
    }

    fn claim(&mut self, order_id: i64) -> Result<(), SimError> {
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(SimError::NotFound)?;
        order.status = order
            .status
            .transition_to(OrderStatus::InProgress)
            .map_err(|_| SimError::InvalidTransition)?;
        Ok(())
    }

    /// Complete with a measured absolute remainder; the recount wins.
    fn reconcile(&mut self, order_id: i64, measured_g: Decimal) -> Result<(), SimError> {
        if measured_g < Decimal::ZERO {
            return Err(SimError::InvalidQuantity);
        }
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(SimError::NotFound)?;
        order.status = order
            .status
            .transition_to(OrderStatus::Done)
            .map_err(|_| SimError::InvalidTransition)?;
        order.remainder_g = Some(measured_g);
        let previous = self.quantity_g;
        self.quantity_g = measured_g;
        self.append_history(StockAction::ManualAdjustment, previous, measured_g, Some(order_id));
        Ok(())
    }

    /// Delete an order; only an open one releases its reservation.
    fn delete(&mut self, order_id: i64) -> Result<(), SimError> {
        let idx = self
            .orders
            .iter()
            .position(|o| o.id == order_id)
            .ok_or(SimError::NotFound)?;
        if self.orders[idx].status == OrderStatus::Open {
            let previous = self.quantity_g;
            self.quantity_g = previous + self.orders[idx].needed_g;
            self.append_history(StockAction::OrderCancelled, previous, self.quantity_g, Some(order_id));
        }
        self.orders.remove(idx);
        Ok(())
    }

    fn receive(&mut self, quantity_g: Decimal) -> Result<(), SimError> {
        if quantity_g <= Decimal::ZERO {
            return Err(SimError::InvalidQuantity);
        }
        let previous = self.quantity_g;
        self.quantity_g = previous + quantity_g;
        self.append_history(StockAction::WarehouseEntry, previous, self.quantity_g, None);
        Ok(())
    }

    fn order(&self, order_id: i64) -> &SimOrder {
        self.orders.iter().find(|o| o.id == order_id).unwrap()
    }
}

// ============================================================================
// Scenario Tests
// ============================================================================

#[cfg(test)]
mod scenario_tests {
    use super::*;

    /// MJ1 at 1670 g; 2x5 g bags reserve 10.6 g
    #[test]
    fn test_reserve_deducts_needed_amount() {
        let mut engine = EngineSim::new(dec("1670"));
        let order_id = engine.reserve(&bags("5", 2)).unwrap();

        assert_eq!(engine.quantity_g, dec("1659.4"));
        assert_eq!(engine.order(order_id).status, OrderStatus::Open);
        assert_eq!(engine.order(order_id).needed_g, dec("10.6"));

        let row = engine.history.last().unwrap();
        assert_eq!(row.action, StockAction::OrderCreated);
        assert_eq!(row.previous_amount_g, dec("1670"));
        assert_eq!(row.new_amount_g, dec("1659.4"));
        assert_eq!(row.change_amount_g, dec("-10.6"));
    }

    /// The same order against 5 g of stock is rejected outright
    #[test]
    fn test_insufficient_stock_rejects_whole_reservation() {
        let mut engine = EngineSim::new(dec("5"));
        let result = engine.reserve(&bags("5", 2));

        assert_eq!(result.unwrap_err(), SimError::InsufficientStock);
        // No partial deduction, no order, no audit row
        assert_eq!(engine.quantity_g, dec("5"));
        assert!(engine.orders.is_empty());
        assert!(engine.history.is_empty());
    }

    /// open -> in_progress -> done with measured remainder 1600.0
    #[test]
    fn test_reconciliation_overrides_running_value() {
        let mut engine = EngineSim::new(dec("1670"));
        let order_id = engine.reserve(&bags("5", 2)).unwrap();
        engine.claim(order_id).unwrap();
        engine.reconcile(order_id, dec("1600.0")).unwrap();

        // The recount wins over the running 1659.4
        assert_eq!(engine.quantity_g, dec("1600.0"));
        assert_eq!(engine.order(order_id).status, OrderStatus::Done);
        assert_eq!(engine.order(order_id).remainder_g, Some(dec("1600.0")));

        let row = engine.history.last().unwrap();
        assert_eq!(row.action, StockAction::ManualAdjustment);
        assert_eq!(row.previous_amount_g, dec("1659.4"));
        assert_eq!(row.new_amount_g, dec("1600.0"));
    }

    /// Deleting an open 10.6 g order restores the ledger to 1670.0
    #[test]
    fn test_deleting_open_order_releases_reservation() {
        let mut engine = EngineSim::new(dec("1670"));
        let order_id = engine.reserve(&bags("5", 2)).unwrap();
        assert_eq!(engine.quantity_g, dec("1659.4"));

        engine.delete(order_id).unwrap();
        assert_eq!(engine.quantity_g, dec("1670.0"));

        let row = engine.history.last().unwrap();
        assert_eq!(row.action, StockAction::OrderCancelled);
        assert_eq!(row.change_amount_g, dec("10.6"));
    }

    /// Deleting a completed order must not touch the ledger again
    #[test]
    fn test_deleting_done_order_keeps_ledger() {
        let mut engine = EngineSim::new(dec("1670"));
        let order_id = engine.reserve(&bags("5", 2)).unwrap();
        engine.claim(order_id).unwrap();
        engine.reconcile(order_id, dec("1600.0")).unwrap();

        let rows_before = engine.history.len();
        engine.delete(order_id).unwrap();

        assert_eq!(engine.quantity_g, dec("1600.0"));
        assert_eq!(engine.history.len(), rows_before);
    }

    #[test]
    fn test_reconcile_requires_in_progress() {
        let mut engine = EngineSim::new(dec("100"));
        let order_id = engine.reserve(&bags("1", 1)).unwrap();

        // Still open: a worker must claim first
        assert_eq!(
            engine.reconcile(order_id, dec("90")).unwrap_err(),
            SimError::InvalidTransition
        );

        engine.claim(order_id).unwrap();
        engine.reconcile(order_id, dec("90")).unwrap();

        // Done is terminal
        assert_eq!(
            engine.reconcile(order_id, dec("80")).unwrap_err(),
            SimError::InvalidTransition
        );
    }

    #[test]
    fn test_negative_remainder_is_rejected() {
        let mut engine = EngineSim::new(dec("100"));
        let order_id = engine.reserve(&bags("1", 1)).unwrap();
        engine.claim(order_id).unwrap();

        assert_eq!(
            engine.reconcile(order_id, dec("-1")).unwrap_err(),
            SimError::InvalidQuantity
        );
        // Order and ledger untouched
        assert_eq!(engine.order(order_id).status, OrderStatus::InProgress);
        assert_eq!(engine.quantity_g, dec("98.7"));
    }

    /// Zero remainder is a legal recount (the product ran out)
    #[test]
    fn test_zero_remainder_is_legal() {
        let mut engine = EngineSim::new(dec("100"));
        let order_id = engine.reserve(&bags("1", 1)).unwrap();
        engine.claim(order_id).unwrap();
        engine.reconcile(order_id, Decimal::ZERO).unwrap();
        assert_eq!(engine.quantity_g, Decimal::ZERO);
    }

    /// Receipts always increase the ledger
    #[test]
    fn test_receiving_increases_ledger() {
        let mut engine = EngineSim::new(dec("7"));
        engine.receive(dec("100")).unwrap();
        assert_eq!(engine.quantity_g, dec("107"));

        let row = engine.history.last().unwrap();
        assert_eq!(row.action, StockAction::WarehouseEntry);
        assert_eq!(row.change_amount_g, dec("100"));
    }

    /// The full walk keeps the audit trail chained end to end
    #[test]
    fn test_audit_chain_over_full_lifecycle() {
        let mut engine = EngineSim::new(dec("1670"));

        let first = engine.reserve(&bags("5", 2)).unwrap();
        engine.claim(first).unwrap();
        engine.reconcile(first, dec("1600.0")).unwrap();
        engine.receive(dec("250")).unwrap();
        let second = engine.reserve(&bags("2.5", 4)).unwrap();
        engine.delete(second).unwrap();

        assert_eq!(engine.history.len(), 5);
        assert!(verify_chain(&engine.history).is_ok());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    #[derive(Debug, Clone)]
    enum Op {
        Reserve { size: Decimal, quantity: u32 },
        ClaimOldestOpen,
        ReconcileClaimed { measured: Decimal },
        DeleteNewest,
        Receive { quantity: Decimal },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            ((1i64..=200).prop_map(|n| Decimal::new(n, 1)), 1u32..=20)
                .prop_map(|(size, quantity)| Op::Reserve { size, quantity }),
            Just(Op::ClaimOldestOpen),
            (0i64..=20000).prop_map(|n| Op::ReconcileClaimed {
                measured: Decimal::new(n, 1)
            }),
            Just(Op::DeleteNewest),
            ((1i64..=5000).prop_map(|n| Decimal::new(n, 1)))
                .prop_map(|quantity| Op::Receive { quantity }),
        ]
    }

    fn apply(engine: &mut EngineSim, op: &Op) {
        match op {
            Op::Reserve { size, quantity } => {
                let packages = vec![Package {
                    size_g: *size,
                    quantity: *quantity,
                    is_custom: false,
                    packaging_type: None,
                }];
                let before = engine.quantity_g;
                if engine.reserve(&packages).is_err() {
                    // A rejected reservation must not move the ledger
                    assert_eq!(engine.quantity_g, before);
                }
            }
            Op::ClaimOldestOpen => {
                if let Some(id) = engine
                    .orders
                    .iter()
                    .find(|o| o.status == OrderStatus::Open)
                    .map(|o| o.id)
                {
                    engine.claim(id).unwrap();
                }
            }
            Op::ReconcileClaimed { measured } => {
                if let Some(id) = engine
                    .orders
                    .iter()
                    .find(|o| o.status == OrderStatus::InProgress)
                    .map(|o| o.id)
                {
                    engine.reconcile(id, *measured).unwrap();
                }
            }
            Op::DeleteNewest => {
                if let Some(id) = engine.orders.last().map(|o| o.id) {
                    engine.delete(id).unwrap();
                }
            }
            Op::Receive { quantity } => {
                engine.receive(*quantity).unwrap();
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// For any operation sequence the ledger never goes negative and
        /// the audit chain stays unbroken.
        #[test]
        fn prop_ledger_invariants_hold(
            initial in 0i64..=50000,
            ops in prop::collection::vec(op_strategy(), 1..40)
        ) {
            let mut engine = EngineSim::new(Decimal::new(initial, 1));
            for op in &ops {
                apply(&mut engine, op);
                prop_assert!(engine.quantity_g >= Decimal::ZERO);
            }
            prop_assert!(verify_chain(&engine.history).is_ok());
        }

        /// A reservation either deducts exactly its needed amount or
        /// changes nothing at all.
        #[test]
        fn prop_reservation_is_all_or_nothing(
            initial in 0i64..=10000,
            size in 1i64..=500,
            quantity in 1u32..=50
        ) {
            let mut engine = EngineSim::new(Decimal::new(initial, 1));
            let before = engine.quantity_g;
            let packages = vec![Package {
                size_g: Decimal::new(size, 1),
                quantity,
                is_custom: false,
                packaging_type: None,
            }];
            let needed = order_needed_amount(&packages);

            match engine.reserve(&packages) {
                Ok(_) => {
                    prop_assert_eq!(engine.quantity_g, before - needed);
                    prop_assert!(engine.quantity_g >= Decimal::ZERO);
                }
                Err(SimError::InsufficientStock) => {
                    prop_assert!(needed > before);
                    prop_assert_eq!(engine.quantity_g, before);
                    prop_assert!(engine.history.is_empty());
                }
                Err(other) => prop_assert!(false, "unexpected error: {:?}", other),
            }
        }

        /// The recount always wins: after reconciliation the ledger equals
        /// the measured value no matter what the running math said.
        #[test]
        fn prop_recount_wins(
            initial in 1000i64..=50000,
            size in 1i64..=100,
            quantity in 1u32..=10,
            measured in 0i64..=60000
        ) {
            let mut engine = EngineSim::new(Decimal::new(initial, 1));
            if let Ok(id) = engine.reserve(&[Package {
                size_g: Decimal::new(size, 1),
                quantity,
                is_custom: false,
                packaging_type: None,
            }]) {
                engine.claim(id).unwrap();
                let measured = Decimal::new(measured, 1);
                engine.reconcile(id, measured).unwrap();
                prop_assert_eq!(engine.quantity_g, measured);
                prop_assert_eq!(engine.order(id).remainder_g, Some(measured));
            }
        }
    }
}
