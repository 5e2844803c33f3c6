//! Stock ledger models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product ("strain") in the stock ledger.
///
/// `quantity_g` is the authoritative quantity-on-hand. It is mutated only
/// by reservations, cancellations, receipts and measured-remainder
/// reconciliations, and is never allowed to go negative as the result of
/// an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItem {
    /// Stable short key, e.g. "MJ1" or "SB_POPCORN"
    pub id: String,
    pub category: ProductCategory,
    pub name: String,
    /// Free-text source/manufacturer label
    pub manufacturer: Option<String>,
    /// Quantity-on-hand in grams (unit count for piece goods)
    pub quantity_g: Decimal,
    /// Below this quantity the item is reported as running low
    pub low_stock_threshold_g: Decimal,
    /// Soft-disable flag; items referenced by orders are never deleted
    pub is_active: bool,
    pub updated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product categories carried on stock items and denormalized onto orders
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Flower,
    SmallBuds,
    Hash,
    Extracts,
    Moonrocks,
    Trim,
    Other,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Flower => "flower",
            ProductCategory::SmallBuds => "small_buds",
            ProductCategory::Hash => "hash",
            ProductCategory::Extracts => "extracts",
            ProductCategory::Moonrocks => "moonrocks",
            ProductCategory::Trim => "trim",
            ProductCategory::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "flower" => Some(ProductCategory::Flower),
            "small_buds" => Some(ProductCategory::SmallBuds),
            "hash" => Some(ProductCategory::Hash),
            "extracts" => Some(ProductCategory::Extracts),
            "moonrocks" => Some(ProductCategory::Moonrocks),
            "trim" => Some(ProductCategory::Trim),
            "other" => Some(ProductCategory::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stock level classification used by dashboards and low-stock views
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    Ok,
    Low,
    Empty,
}

impl StockItem {
    /// Classify the current quantity against the item's own threshold.
    pub fn level(&self) -> StockLevel {
        if self.quantity_g <= Decimal::ZERO {
            StockLevel::Empty
        } else if self.quantity_g < self.low_stock_threshold_g {
            StockLevel::Low
        } else {
            StockLevel::Ok
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: Decimal, threshold: Decimal) -> StockItem {
        StockItem {
            id: "MJ1".to_string(),
            category: ProductCategory::Flower,
            name: "Meer Jane 1".to_string(),
            manufacturer: None,
            quantity_g: quantity,
            low_stock_threshold_g: threshold,
            is_active: true,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn level_thresholds() {
        let threshold = Decimal::from(100);
        assert_eq!(item(Decimal::from(250), threshold).level(), StockLevel::Ok);
        assert_eq!(item(Decimal::from(99), threshold).level(), StockLevel::Low);
        assert_eq!(item(Decimal::ZERO, threshold).level(), StockLevel::Empty);
    }

    #[test]
    fn category_round_trip() {
        for c in [
            ProductCategory::Flower,
            ProductCategory::SmallBuds,
            ProductCategory::Hash,
            ProductCategory::Extracts,
            ProductCategory::Moonrocks,
            ProductCategory::Trim,
            ProductCategory::Other,
        ] {
            assert_eq!(ProductCategory::from_str(c.as_str()), Some(c));
        }
        assert_eq!(ProductCategory::from_str("bogus"), None);
    }
}
