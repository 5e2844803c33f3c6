//! Packaging order models and the order status state machine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Packaging container type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PackagingType {
    Bag,
    /// Accepts the legacy wire value "glas" as well
    #[serde(alias = "glas")]
    Jar,
}

impl PackagingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackagingType::Bag => "bag",
            PackagingType::Jar => "jar",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "bag" => Some(PackagingType::Bag),
            "jar" | "glas" => Some(PackagingType::Jar),
            _ => None,
        }
    }
}

/// One packaging line of an order: `quantity` units of `size_g` grams each.
///
/// Packages are value objects owned by exactly one order; they are never
/// persisted on their own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Package {
    pub size_g: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default)]
    pub packaging_type: Option<PackagingType>,
}

/// Order lifecycle: `Open` (initial) -> `InProgress` -> `Done` (terminal).
///
/// Transitions outside these two edges are rejected; nothing leaves `Done`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    InProgress,
    Done,
}

/// Rejected order status transition
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid order status transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Done => "done",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(OrderStatus::Open),
            "in_progress" => Some(OrderStatus::InProgress),
            "done" => Some(OrderStatus::Done),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Done)
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Open, OrderStatus::InProgress)
                | (OrderStatus::InProgress, OrderStatus::Done)
        )
    }

    /// Validate a transition, returning the new status or a typed error.
    pub fn transition_to(self, next: OrderStatus) -> Result<OrderStatus, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition { from: self, to: next })
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A packaging order against one stock item.
///
/// `strain_name` and `category_name` are captured at creation time so the
/// record stays readable if the product is later renamed. `needed_amount_g`
/// is computed once from the packages at creation and never drifts.
/// `remainder_g` is the measured absolute quantity reported at completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub created_by: i64,
    /// Worker who claimed the order; set on the open -> in_progress edge
    pub processed_by: Option<i64>,
    pub strain_id: String,
    pub strain_name: String,
    pub category_name: String,
    pub packaging_type: PackagingType,
    pub packages: Vec<Package>,
    pub needed_amount_g: Decimal,
    pub status: OrderStatus,
    pub remainder_g: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Decode a packages JSONB column value.
pub fn packages_from_json(value: &serde_json::Value) -> Result<Vec<Package>, serde_json::Error> {
    serde_json::from_value(value.clone())
}
