//! Packaging order service: reservation, claim, reconciliation, release
//!
//! Stock is reserved eagerly: creating an order deducts its needed amount
//! from the ledger immediately, so two concurrent orders can never both
//! claim material that exists only once. Completion reports a physically
//! measured remainder that overwrites the running ledger value.
//!
//! Every ledger mutation and its audit row happen inside one database
//! transaction, with the product's ledger row locked `FOR UPDATE` so that
//! read-check-write sequences against the same product are serialized.
//! Operations on different products proceed in parallel.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::error::{AppError, AppResult};
use shared::models::{
    packages_from_json, Order, OrderStatus, Package, PackagingType, StockAction,
};
use shared::packaging::order_needed_amount;
use shared::validation::{validate_measured_remainder, validate_packages};

/// Order service owning the reservation/reconciliation engine
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

/// Input for creating an order
#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    pub strain_id: String,
    pub packaging_type: PackagingType,
    pub packages: Vec<Package>,
}

/// Filters for order listings
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub since: Option<DateTime<Utc>>,
}

/// An order enriched with creator and processor display names
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithNames {
    #[serde(flatten)]
    pub order: Order,
    pub created_by_name: Option<String>,
    pub processed_by_name: Option<String>,
}

/// Flat order row for CSV export
#[derive(Debug, Serialize)]
pub struct OrderCsvRow {
    pub id: i64,
    pub strain_id: String,
    pub strain_name: String,
    pub category: String,
    pub packaging_type: String,
    pub package_count: usize,
    pub needed_amount_g: Decimal,
    pub status: String,
    pub remainder_g: Option<Decimal>,
    pub created_by: String,
    pub processed_by: String,
    pub created_at: DateTime<Utc>,
}

/// Raw order row
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    created_by: i64,
    processed_by: Option<i64>,
    strain_id: String,
    strain_name: String,
    category_name: String,
    packaging_type: String,
    packages: serde_json::Value,
    needed_amount_g: Decimal,
    status: String,
    remainder_g: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Order row joined with user names
#[derive(Debug, sqlx::FromRow)]
struct OrderWithNamesRow {
    id: i64,
    created_by: i64,
    processed_by: Option<i64>,
    strain_id: String,
    strain_name: String,
    category_name: String,
    packaging_type: String,
    packages: serde_json::Value,
    needed_amount_g: Decimal,
    status: String,
    remainder_g: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    created_by_name: Option<String>,
    processed_by_name: Option<String>,
}

const ORDER_COLUMNS: &str = "id, created_by, processed_by, strain_id, strain_name, category_name, \
     packaging_type, packages, needed_amount_g, status, remainder_g, created_at, updated_at";

fn order_from_row(row: OrderRow) -> AppResult<Order> {
    let status = OrderStatus::from_str(&row.status)
        .ok_or_else(|| AppError::Internal(format!("Unknown order status '{}'", row.status)))?;
    let packaging_type = PackagingType::from_str(&row.packaging_type).ok_or_else(|| {
        AppError::Internal(format!("Unknown packaging type '{}'", row.packaging_type))
    })?;
    let packages = packages_from_json(&row.packages)
        .map_err(|e| AppError::Internal(format!("Corrupt packages column: {}", e)))?;

    Ok(Order {
        id: row.id,
        created_by: row.created_by,
        processed_by: row.processed_by,
        strain_id: row.strain_id,
        strain_name: row.strain_name,
        category_name: row.category_name,
        packaging_type,
        packages,
        needed_amount_g: row.needed_amount_g,
        status,
        remainder_g: row.remainder_g,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Lock a product's ledger row and return (name, category, quantity,
/// is_active).
///
/// The `FOR UPDATE` lock serializes every reserve/release/reconcile
/// against the same product for the lifetime of the transaction.
async fn lock_stock_row(
    tx: &mut Transaction<'_, Postgres>,
    strain_id: &str,
) -> AppResult<(String, String, Decimal, bool)> {
    sqlx::query_as::<_, (String, String, Decimal, bool)>(
        "SELECT name, category, quantity_g, is_active FROM stock_items WHERE id = $1 FOR UPDATE",
    )
    .bind(strain_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::ProductNotFound(strain_id.to_string()))
}

/// Append one audit trail row inside the caller's transaction.
///
/// The audit write shares the transaction with the ledger mutation it
/// records: if it fails, the whole operation rolls back.
async fn append_history(
    tx: &mut Transaction<'_, Postgres>,
    strain_id: &str,
    user_id: i64,
    action: StockAction,
    previous_g: Decimal,
    new_g: Decimal,
    reason: &str,
    order_id: Option<i64>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_history (stock_id, user_id, action, previous_amount_g, new_amount_g,
                                   change_amount_g, reason, order_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(strain_id)
    .bind(user_id)
    .bind(action.as_str())
    .bind(previous_g)
    .bind(new_g)
    .bind(new_g - previous_g)
    .bind(reason)
    .bind(order_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

impl OrderService {
    /// Create a new OrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an order and eagerly reserve its needed amount.
    ///
    /// Fails with `InsufficientStock` when the needed amount exceeds the
    /// current quantity-on-hand; nothing is written in that case.
    pub async fn create_order(&self, user_id: i64, input: CreateOrderInput) -> AppResult<Order> {
        if let Err(msg) = validate_packages(&input.packages) {
            return Err(AppError::Validation {
                field: "packages".to_string(),
                message: msg.to_string(),
                message_de: "Ungültige Verpackungsliste".to_string(),
            });
        }

        let needed = order_needed_amount(&input.packages);

        let mut tx = self.db.begin().await?;

        let (strain_name, category_name, available, is_active) =
            lock_stock_row(&mut tx, &input.strain_id).await?;

        // Disabled products take no new orders; existing orders against
        // them can still be completed or released.
        if !is_active {
            return Err(AppError::ProductNotFound(input.strain_id.clone()));
        }

        if needed > available {
            // Roll back the empty transaction; the ledger is untouched.
            return Err(AppError::InsufficientStock {
                available,
                requested: needed,
            });
        }

        let packages_json = serde_json::to_value(&input.packages)
            .map_err(|e| AppError::Internal(format!("Package serialization error: {}", e)))?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO orders (created_by, strain_id, strain_name, category_name,
                                packaging_type, packages, needed_amount_g, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'open')
            RETURNING {ORDER_COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(&input.strain_id)
        .bind(&strain_name)
        .bind(&category_name)
        .bind(input.packaging_type.as_str())
        .bind(&packages_json)
        .bind(needed)
        .fetch_one(&mut *tx)
        .await?;

        let new_quantity = available - needed;
        sqlx::query(
            "UPDATE stock_items SET quantity_g = $1, updated_by = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(new_quantity)
        .bind(user_id)
        .bind(&input.strain_id)
        .execute(&mut *tx)
        .await?;

        append_history(
            &mut tx,
            &input.strain_id,
            user_id,
            StockAction::OrderCreated,
            available,
            new_quantity,
            "Reserved for packaging order",
            Some(row.id),
        )
        .await?;

        tx.commit().await?;

        debug!(order_id = row.id, strain = %input.strain_id, needed = %needed, "Order created");
        order_from_row(row)
    }

    /// Claim an open order for processing (open -> in_progress).
    pub async fn claim_order(&self, user_id: i64, order_id: i64) -> AppResult<Order> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE orders
            SET status = 'in_progress', processed_by = $1, updated_at = NOW()
            WHERE id = $2 AND status = 'open'
            RETURNING {ORDER_COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => order_from_row(row),
            // Distinguish a missing order from an illegal transition.
            None => {
                let current = self.get_order(order_id).await?;
                match current.status.transition_to(OrderStatus::InProgress) {
                    Err(invalid) => Err(invalid.into()),
                    // The status flipped between the guarded update and
                    // this read: someone else claimed it first.
                    Ok(_) => Err(AppError::Conflict {
                        resource: "order".to_string(),
                        message: "Order was claimed by someone else".to_string(),
                        message_de: "Auftrag wurde bereits übernommen".to_string(),
                    }),
                }
            }
        }
    }

    /// Complete an order with a physically measured remainder
    /// (in_progress -> done).
    ///
    /// `measured_remainder_g` is the absolute new quantity-on-hand, not a
    /// delta. It overwrites the running ledger value: the recount always
    /// wins over the reserve-then-subtract bookkeeping, and the audit row
    /// keeps both values so any divergence stays reconstructible.
    pub async fn complete_order(
        &self,
        user_id: i64,
        order_id: i64,
        measured_remainder_g: Decimal,
    ) -> AppResult<Order> {
        if let Err(msg) = validate_measured_remainder(measured_remainder_g) {
            return Err(AppError::InvalidQuantity(msg.to_string()));
        }

        let mut tx = self.db.begin().await?;

        let order = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE",
        ))
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;
        let order = order_from_row(order)?;

        order.status.transition_to(OrderStatus::Done)?;

        let (_, _, previous, _) = lock_stock_row(&mut tx, &order.strain_id).await?;

        sqlx::query(
            "UPDATE stock_items SET quantity_g = $1, updated_by = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(measured_remainder_g)
        .bind(user_id)
        .bind(&order.strain_id)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE orders
            SET status = 'done', remainder_g = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {ORDER_COLUMNS}
            "#,
        ))
        .bind(measured_remainder_g)
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        append_history(
            &mut tx,
            &order.strain_id,
            user_id,
            StockAction::ManualAdjustment,
            previous,
            measured_remainder_g,
            "Measured remainder after packaging",
            Some(order_id),
        )
        .await?;

        tx.commit().await?;

        debug!(order_id, strain = %order.strain_id, previous = %previous,
               measured = %measured_remainder_g, "Order completed with measured remainder");
        order_from_row(row)
    }

    /// Delete an order.
    ///
    /// Only an `open` order still holds an un-consumed reservation, so
    /// only then is the ledger restored (with an `order_cancelled` audit
    /// row). Deleting an in-progress or done order removes the record
    /// without touching stock: its reservation was already superseded by
    /// the completion recount, or is intentionally kept for corrections.
    pub async fn delete_order(&self, user_id: i64, order_id: i64) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let order = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE",
        ))
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;
        let order = order_from_row(order)?;

        if order.status == OrderStatus::Open {
            let (_, _, previous, _) = lock_stock_row(&mut tx, &order.strain_id).await?;
            let restored = previous + order.needed_amount_g;

            sqlx::query(
                "UPDATE stock_items SET quantity_g = $1, updated_by = $2, updated_at = NOW() WHERE id = $3",
            )
            .bind(restored)
            .bind(user_id)
            .bind(&order.strain_id)
            .execute(&mut *tx)
            .await?;

            append_history(
                &mut tx,
                &order.strain_id,
                user_id,
                StockAction::OrderCancelled,
                previous,
                restored,
                "Open order cancelled, reservation released",
                Some(order_id),
            )
            .await?;
        }

        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(order_id, status = order.status.as_str(), "Order deleted");
        Ok(())
    }

    /// Get a single order by id
    pub async fn get_order(&self, order_id: i64) -> AppResult<Order> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1",
        ))
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        order_from_row(row)
    }

    /// List orders, newest first, with creator/processor names resolved
    pub async fn list_orders(&self, filter: &OrderFilter) -> AppResult<Vec<OrderWithNames>> {
        let rows = sqlx::query_as::<_, OrderWithNamesRow>(
            r#"
            SELECT o.id, o.created_by, o.processed_by, o.strain_id, o.strain_name,
                   o.category_name, o.packaging_type, o.packages, o.needed_amount_g,
                   o.status, o.remainder_g, o.created_at, o.updated_at,
                   cu.name AS created_by_name,
                   pu.name AS processed_by_name
            FROM orders o
            LEFT JOIN users cu ON cu.id = o.created_by
            LEFT JOIN users pu ON pu.id = o.processed_by
            WHERE ($1::text IS NULL OR o.status = $1)
              AND ($2::timestamptz IS NULL OR o.created_at >= $2)
            ORDER BY o.created_at DESC
            "#,
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.since)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                let created_by_name = row.created_by_name.clone();
                let processed_by_name = row.processed_by_name.clone();
                let order = order_from_row(OrderRow {
                    id: row.id,
                    created_by: row.created_by,
                    processed_by: row.processed_by,
                    strain_id: row.strain_id,
                    strain_name: row.strain_name,
                    category_name: row.category_name,
                    packaging_type: row.packaging_type,
                    packages: row.packages,
                    needed_amount_g: row.needed_amount_g,
                    status: row.status,
                    remainder_g: row.remainder_g,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                })?;
                Ok(OrderWithNames {
                    order,
                    created_by_name,
                    processed_by_name,
                })
            })
            .collect()
    }

    /// Export the filtered order list as CSV
    pub async fn export_orders_csv(&self, filter: &OrderFilter) -> AppResult<String> {
        let orders = self.list_orders(filter).await?;
        let rows: Vec<OrderCsvRow> = orders
            .into_iter()
            .map(|o| OrderCsvRow {
                id: o.order.id,
                strain_id: o.order.strain_id,
                strain_name: o.order.strain_name,
                category: o.order.category_name,
                packaging_type: o.order.packaging_type.as_str().to_string(),
                package_count: o.order.packages.len(),
                needed_amount_g: o.order.needed_amount_g,
                status: o.order.status.as_str().to_string(),
                remainder_g: o.order.remainder_g,
                created_by: o.created_by_name.unwrap_or_default(),
                processed_by: o.processed_by_name.unwrap_or_default(),
                created_at: o.order.created_at,
            })
            .collect();

        super::export_to_csv(&rows)
    }
}
