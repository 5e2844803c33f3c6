//! Stock ledger service: item management, receiving, audit queries
//!
//! Items are soft-disabled rather than deleted because historical orders
//! and audit rows keep referencing them. Quantity corrections and
//! warehouse receipts follow the same transactional ledger-plus-audit
//! discipline as the order engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::debug;

use crate::error::{AppError, AppResult};
use shared::models::{
    ProductCategory, ReceivingEntry, StockAction, StockHistoryEntry, StockItem,
};
use shared::validation::{validate_positive_quantity, validate_strain_id};

/// Stock service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Input for creating a stock item
#[derive(Debug, Deserialize)]
pub struct CreateStockInput {
    pub id: String,
    pub category: ProductCategory,
    pub name: String,
    pub manufacturer: Option<String>,
    pub initial_quantity_g: Option<Decimal>,
    pub low_stock_threshold_g: Option<Decimal>,
}

/// Input for updating stock item metadata (never the quantity)
#[derive(Debug, Deserialize)]
pub struct UpdateStockInput {
    pub name: Option<String>,
    pub category: Option<ProductCategory>,
    pub manufacturer: Option<String>,
    pub low_stock_threshold_g: Option<Decimal>,
}

/// Input for booking a warehouse receipt
#[derive(Debug, Deserialize)]
pub struct ReceiveStockInput {
    pub strain_id: String,
    pub quantity_g: Decimal,
    pub supplier: Option<String>,
    pub batch_number: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct StockRow {
    id: String,
    category: String,
    name: String,
    manufacturer: Option<String>,
    quantity_g: Decimal,
    low_stock_threshold_g: Decimal,
    is_active: bool,
    updated_by: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    id: i64,
    stock_id: String,
    user_id: i64,
    action: String,
    previous_amount_g: Decimal,
    new_amount_g: Decimal,
    change_amount_g: Decimal,
    reason: Option<String>,
    order_id: Option<i64>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ReceivingRow {
    id: i64,
    user_id: i64,
    strain_id: String,
    strain_name: String,
    category_name: String,
    quantity_g: Decimal,
    supplier: Option<String>,
    batch_number: Option<String>,
    created_at: DateTime<Utc>,
}

const STOCK_COLUMNS: &str = "id, category, name, manufacturer, quantity_g, \
     low_stock_threshold_g, is_active, updated_by, created_at, updated_at";

const HISTORY_COLUMNS: &str = "id, stock_id, user_id, action, previous_amount_g, \
     new_amount_g, change_amount_g, reason, order_id, created_at";

fn stock_from_row(row: StockRow) -> AppResult<StockItem> {
    let category = ProductCategory::from_str(&row.category)
        .ok_or_else(|| AppError::Internal(format!("Unknown category '{}'", row.category)))?;
    Ok(StockItem {
        id: row.id,
        category,
        name: row.name,
        manufacturer: row.manufacturer,
        quantity_g: row.quantity_g,
        low_stock_threshold_g: row.low_stock_threshold_g,
        is_active: row.is_active,
        updated_by: row.updated_by,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn history_from_row(row: HistoryRow) -> AppResult<StockHistoryEntry> {
    let action = StockAction::from_str(&row.action)
        .ok_or_else(|| AppError::Internal(format!("Unknown history action '{}'", row.action)))?;
    Ok(StockHistoryEntry {
        id: row.id,
        stock_id: row.stock_id,
        user_id: row.user_id,
        action,
        previous_amount_g: row.previous_amount_g,
        new_amount_g: row.new_amount_g,
        change_amount_g: row.change_amount_g,
        reason: row.reason,
        order_id: row.order_id,
        created_at: row.created_at,
    })
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List stock items, active only by default
    pub async fn list_stock(&self, include_inactive: bool) -> AppResult<Vec<StockItem>> {
        let rows = sqlx::query_as::<_, StockRow>(&format!(
            r#"
            SELECT {STOCK_COLUMNS}
            FROM stock_items
            WHERE $1 OR is_active
            ORDER BY category, id
            "#,
        ))
        .bind(include_inactive)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(stock_from_row).collect()
    }

    /// Get a stock item by id
    pub async fn get_stock(&self, strain_id: &str) -> AppResult<StockItem> {
        let row = sqlx::query_as::<_, StockRow>(&format!(
            "SELECT {STOCK_COLUMNS} FROM stock_items WHERE id = $1",
        ))
        .bind(strain_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::ProductNotFound(strain_id.to_string()))?;

        stock_from_row(row)
    }

    /// Create a stock item.
    ///
    /// A non-zero initial quantity is booked through the audit trail like
    /// any other ledger change.
    pub async fn create_stock(&self, user_id: i64, input: CreateStockInput) -> AppResult<StockItem> {
        if let Err(msg) = validate_strain_id(&input.id) {
            return Err(AppError::Validation {
                field: "id".to_string(),
                message: msg.to_string(),
                message_de: "Ungültige Sorten-Kennung".to_string(),
            });
        }
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Name cannot be empty".to_string(),
                message_de: "Name darf nicht leer sein".to_string(),
            });
        }

        let initial = input.initial_quantity_g.unwrap_or(Decimal::ZERO);
        if initial < Decimal::ZERO {
            return Err(AppError::InvalidQuantity(
                "Initial quantity cannot be negative".to_string(),
            ));
        }
        let threshold = input.low_stock_threshold_g.unwrap_or(Decimal::from(100));

        let existing =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stock_items WHERE id = $1")
                .bind(&input.id)
                .fetch_one(&self.db)
                .await?;
        if existing > 0 {
            return Err(AppError::Conflict {
                resource: "stock_item".to_string(),
                message: format!("Stock item {} already exists", input.id),
                message_de: format!("Sorte {} existiert bereits", input.id),
            });
        }

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, StockRow>(&format!(
            r#"
            INSERT INTO stock_items (id, category, name, manufacturer, quantity_g,
                                     low_stock_threshold_g, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {STOCK_COLUMNS}
            "#,
        ))
        .bind(&input.id)
        .bind(input.category.as_str())
        .bind(input.name.trim())
        .bind(&input.manufacturer)
        .bind(initial)
        .bind(threshold)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        if initial > Decimal::ZERO {
            sqlx::query(
                r#"
                INSERT INTO stock_history (stock_id, user_id, action, previous_amount_g,
                                           new_amount_g, change_amount_g, reason)
                VALUES ($1, $2, 'manual_adjustment', 0, $3, $3, 'Initial stock')
                "#,
            )
            .bind(&input.id)
            .bind(user_id)
            .bind(initial)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(strain = %row.id, "Stock item created");
        stock_from_row(row)
    }

    /// Update stock item metadata
    pub async fn update_stock(
        &self,
        user_id: i64,
        strain_id: &str,
        input: UpdateStockInput,
    ) -> AppResult<StockItem> {
        let existing = self.get_stock(strain_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let category = input.category.unwrap_or(existing.category);
        let manufacturer = input.manufacturer.or(existing.manufacturer);
        let threshold = input
            .low_stock_threshold_g
            .unwrap_or(existing.low_stock_threshold_g);

        let row = sqlx::query_as::<_, StockRow>(&format!(
            r#"
            UPDATE stock_items
            SET name = $1, category = $2, manufacturer = $3, low_stock_threshold_g = $4,
                updated_by = $5, updated_at = NOW()
            WHERE id = $6
            RETURNING {STOCK_COLUMNS}
            "#,
        ))
        .bind(&name)
        .bind(category.as_str())
        .bind(&manufacturer)
        .bind(threshold)
        .bind(user_id)
        .bind(strain_id)
        .fetch_one(&self.db)
        .await?;

        stock_from_row(row)
    }

    /// Soft-disable a stock item. Orders and history keep referencing it.
    pub async fn disable_stock(&self, user_id: i64, strain_id: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE stock_items SET is_active = FALSE, updated_by = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(user_id)
        .bind(strain_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ProductNotFound(strain_id.to_string()));
        }

        debug!(strain = %strain_id, "Stock item disabled");
        Ok(())
    }

    /// Manually correct a product's quantity to an absolute value.
    pub async fn adjust_quantity(
        &self,
        user_id: i64,
        strain_id: &str,
        new_quantity_g: Decimal,
        reason: Option<String>,
    ) -> AppResult<StockItem> {
        if new_quantity_g < Decimal::ZERO {
            return Err(AppError::InvalidQuantity(
                "Quantity cannot be negative".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        let previous = sqlx::query_scalar::<_, Decimal>(
            "SELECT quantity_g FROM stock_items WHERE id = $1 FOR UPDATE",
        )
        .bind(strain_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::ProductNotFound(strain_id.to_string()))?;

        let row = sqlx::query_as::<_, StockRow>(&format!(
            r#"
            UPDATE stock_items
            SET quantity_g = $1, updated_by = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {STOCK_COLUMNS}
            "#,
        ))
        .bind(new_quantity_g)
        .bind(user_id)
        .bind(strain_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO stock_history (stock_id, user_id, action, previous_amount_g,
                                       new_amount_g, change_amount_g, reason)
            VALUES ($1, $2, 'manual_adjustment', $3, $4, $5, $6)
            "#,
        )
        .bind(strain_id)
        .bind(user_id)
        .bind(previous)
        .bind(new_quantity_g)
        .bind(new_quantity_g - previous)
        .bind(reason.as_deref().unwrap_or("Manual correction"))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(strain = %strain_id, previous = %previous, new = %new_quantity_g, "Quantity adjusted");
        stock_from_row(row)
    }

    /// Book a warehouse receipt: append a receiving entry and increase
    /// the ledger by the received amount.
    pub async fn receive(&self, user_id: i64, input: ReceiveStockInput) -> AppResult<ReceivingEntry> {
        if let Err(msg) = validate_positive_quantity(input.quantity_g) {
            return Err(AppError::InvalidQuantity(msg.to_string()));
        }

        let mut tx = self.db.begin().await?;

        let stock = sqlx::query_as::<_, (String, String, Decimal, bool)>(
            "SELECT name, category, quantity_g, is_active FROM stock_items WHERE id = $1 FOR UPDATE",
        )
        .bind(&input.strain_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::ProductNotFound(input.strain_id.clone()))?;
        let (strain_name, category_name, previous, is_active) = stock;
        if !is_active {
            return Err(AppError::ProductNotFound(input.strain_id.clone()));
        }

        let row = sqlx::query_as::<_, ReceivingRow>(
            r#"
            INSERT INTO receiving_entries (user_id, strain_id, strain_name, category_name,
                                           quantity_g, supplier, batch_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, strain_id, strain_name, category_name, quantity_g,
                      supplier, batch_number, created_at
            "#,
        )
        .bind(user_id)
        .bind(&input.strain_id)
        .bind(&strain_name)
        .bind(&category_name)
        .bind(input.quantity_g)
        .bind(&input.supplier)
        .bind(&input.batch_number)
        .fetch_one(&mut *tx)
        .await?;

        let new_quantity = previous + input.quantity_g;
        sqlx::query(
            "UPDATE stock_items SET quantity_g = $1, updated_by = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(new_quantity)
        .bind(user_id)
        .bind(&input.strain_id)
        .execute(&mut *tx)
        .await?;

        let reason = match (&input.supplier, &input.batch_number) {
            (Some(supplier), Some(batch)) => format!("Receipt from {} (batch {})", supplier, batch),
            (Some(supplier), None) => format!("Receipt from {}", supplier),
            _ => "Warehouse receipt".to_string(),
        };
        sqlx::query(
            r#"
            INSERT INTO stock_history (stock_id, user_id, action, previous_amount_g,
                                       new_amount_g, change_amount_g, reason)
            VALUES ($1, $2, 'warehouse_entry', $3, $4, $5, $6)
            "#,
        )
        .bind(&input.strain_id)
        .bind(user_id)
        .bind(previous)
        .bind(new_quantity)
        .bind(input.quantity_g)
        .bind(&reason)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(strain = %input.strain_id, received = %input.quantity_g, "Warehouse receipt booked");
        Ok(ReceivingEntry {
            id: row.id,
            user_id: row.user_id,
            strain_id: row.strain_id,
            strain_name: row.strain_name,
            category_name: row.category_name,
            quantity_g: row.quantity_g,
            supplier: row.supplier,
            batch_number: row.batch_number,
            created_at: row.created_at,
        })
    }

    /// List all warehouse receipts, newest first
    pub async fn list_receiving(&self) -> AppResult<Vec<ReceivingEntry>> {
        let rows = sqlx::query_as::<_, ReceivingRow>(
            r#"
            SELECT id, user_id, strain_id, strain_name, category_name, quantity_g,
                   supplier, batch_number, created_at
            FROM receiving_entries
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ReceivingEntry {
                id: row.id,
                user_id: row.user_id,
                strain_id: row.strain_id,
                strain_name: row.strain_name,
                category_name: row.category_name,
                quantity_g: row.quantity_g,
                supplier: row.supplier,
                batch_number: row.batch_number,
                created_at: row.created_at,
            })
            .collect())
    }

    /// Audit trail for one product, newest first
    pub async fn history(&self, strain_id: &str) -> AppResult<Vec<StockHistoryEntry>> {
        let rows = sqlx::query_as::<_, HistoryRow>(&format!(
            r#"
            SELECT {HISTORY_COLUMNS}
            FROM stock_history
            WHERE stock_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        ))
        .bind(strain_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(history_from_row).collect()
    }

    /// Audit trail rows attached to one order, newest first
    pub async fn history_for_order(&self, order_id: i64) -> AppResult<Vec<StockHistoryEntry>> {
        let rows = sqlx::query_as::<_, HistoryRow>(&format!(
            r#"
            SELECT {HISTORY_COLUMNS}
            FROM stock_history
            WHERE order_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        ))
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(history_from_row).collect()
    }
}
