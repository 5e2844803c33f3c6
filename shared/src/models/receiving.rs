//! Receiving log models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An inbound stock delivery. Append-only; each entry increased the
/// ledger by `quantity_g` at insertion time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivingEntry {
    pub id: i64,
    pub user_id: i64,
    pub strain_id: String,
    /// Names captured at booking time, like on orders
    pub strain_name: String,
    pub category_name: String,
    pub quantity_g: Decimal,
    pub supplier: Option<String>,
    pub batch_number: Option<String>,
    pub created_at: DateTime<Utc>,
}
