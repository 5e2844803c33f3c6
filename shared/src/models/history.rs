//! Stock history (audit trail) models
//!
//! Every ledger mutation appends exactly one row here. Rows are never
//! updated or deleted; together they form a causal chain per product:
//! the `new_amount_g` of one row equals the `previous_amount_g` of the
//! next.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The ledger mutation that produced a history row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockAction {
    OrderCreated,
    OrderCancelled,
    WarehouseEntry,
    ManualAdjustment,
}

impl StockAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockAction::OrderCreated => "order_created",
            StockAction::OrderCancelled => "order_cancelled",
            StockAction::WarehouseEntry => "warehouse_entry",
            StockAction::ManualAdjustment => "manual_adjustment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "order_created" => Some(StockAction::OrderCreated),
            "order_cancelled" => Some(StockAction::OrderCancelled),
            "warehouse_entry" => Some(StockAction::WarehouseEntry),
            "manual_adjustment" => Some(StockAction::ManualAdjustment),
            _ => None,
        }
    }
}

/// One audit trail row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockHistoryEntry {
    pub id: i64,
    pub stock_id: String,
    pub user_id: i64,
    pub action: StockAction,
    pub previous_amount_g: Decimal,
    pub new_amount_g: Decimal,
    pub change_amount_g: Decimal,
    pub reason: Option<String>,
    pub order_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl StockHistoryEntry {
    /// `new - previous == change` must hold for every row.
    pub fn is_balanced(&self) -> bool {
        self.new_amount_g - self.previous_amount_g == self.change_amount_g
    }
}

/// Check the causal chain of one product's history, ordered oldest first.
///
/// Verifies that every row balances and that each row's `new_amount_g`
/// carries over as the next row's `previous_amount_g`.
pub fn verify_chain(entries: &[StockHistoryEntry]) -> Result<(), &'static str> {
    for entry in entries {
        if !entry.is_balanced() {
            return Err("history row delta does not balance");
        }
    }
    for pair in entries.windows(2) {
        if pair[0].new_amount_g != pair[1].previous_amount_g {
            return Err("history chain broken: new amount does not carry over");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn entry(previous: &str, new: &str, change: &str) -> StockHistoryEntry {
        StockHistoryEntry {
            id: 0,
            stock_id: "MJ1".to_string(),
            user_id: 1,
            action: StockAction::OrderCreated,
            previous_amount_g: dec(previous),
            new_amount_g: dec(new),
            change_amount_g: dec(change),
            reason: None,
            order_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn balanced_row() {
        assert!(entry("100.0", "80.0", "-20.0").is_balanced());
        assert!(!entry("100.0", "80.0", "-10.0").is_balanced());
    }

    #[test]
    fn chain_carries_amounts_over() {
        let chain = vec![
            entry("1670.0", "1659.4", "-10.6"),
            entry("1659.4", "1600.0", "-59.4"),
            entry("1600.0", "1700.0", "100.0"),
        ];
        assert!(verify_chain(&chain).is_ok());
    }

    #[test]
    fn broken_chain_is_rejected() {
        let chain = vec![
            entry("1670.0", "1659.4", "-10.6"),
            entry("1670.0", "1600.0", "-70.0"),
        ];
        assert!(verify_chain(&chain).is_err());
    }
}
