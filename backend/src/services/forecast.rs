//! Consumption forecast and reporting service
//!
//! Aggregates completed orders over a trailing window and projects
//! days-until-empty per product. Read-only: runs entirely outside the
//! reservation write path and may observe slightly stale data.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::config::ForecastConfig;
use crate::error::{AppError, AppResult};
use shared::forecast::{classify, daily_rate, days_remaining, DepletionSeverity};
use shared::models::ProductCategory;

/// Forecast service
#[derive(Clone)]
pub struct ForecastService {
    db: PgPool,
    config: ForecastConfig,
}

/// Query parameters for forecast endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ForecastParams {
    /// Trailing window in days; falls back to the configured default
    pub window_days: Option<u32>,
    pub category: Option<ProductCategory>,
    /// Count only orders processed by this user
    pub processed_by: Option<i64>,
}

/// Projected depletion for one product
#[derive(Debug, Serialize)]
pub struct DepletionForecast {
    pub strain_id: String,
    pub strain_name: String,
    pub category: String,
    pub quantity_g: Decimal,
    pub consumed_g: Decimal,
    pub daily_rate_g: Decimal,
    /// None when nothing was consumed in the window; such products are
    /// listed last and never flagged
    pub days_remaining: Option<i64>,
    pub severity: DepletionSeverity,
}

/// Grams consumed per strain over the window
#[derive(Debug, Serialize)]
pub struct StrainConsumption {
    pub strain_id: String,
    pub strain_name: String,
    pub category: String,
    pub order_count: i64,
    pub total_g: Decimal,
}

/// Completed orders per employee over the window
#[derive(Debug, Serialize)]
pub struct EmployeeProductivity {
    pub user_id: i64,
    pub name: String,
    pub order_count: i64,
    pub total_g: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct ConsumptionRow {
    strain_id: String,
    strain_name: String,
    category: String,
    quantity_g: Decimal,
    consumed_g: Decimal,
}

impl ForecastService {
    /// Create a new ForecastService instance
    pub fn new(db: PgPool, config: ForecastConfig) -> Self {
        Self { db, config }
    }

    fn window_days(&self, params: &ForecastParams) -> AppResult<u32> {
        let window = params.window_days.unwrap_or(self.config.window_days);
        if window == 0 {
            return Err(AppError::Validation {
                field: "window_days".to_string(),
                message: "Window must be at least one day".to_string(),
                message_de: "Zeitraum muss mindestens einen Tag umfassen".to_string(),
            });
        }
        Ok(window)
    }

    /// Project days-until-empty per product, most urgent first.
    pub async fn depletion(&self, params: &ForecastParams) -> AppResult<Vec<DepletionForecast>> {
        let window = self.window_days(params)?;
        let since = Utc::now() - Duration::days(window as i64);

        let rows = sqlx::query_as::<_, ConsumptionRow>(
            r#"
            SELECT s.id AS strain_id,
                   s.name AS strain_name,
                   s.category,
                   s.quantity_g,
                   COALESCE(SUM(o.needed_amount_g), 0) AS consumed_g
            FROM stock_items s
            LEFT JOIN orders o
                   ON o.strain_id = s.id
                  AND o.status = 'done'
                  AND o.created_at >= $1
                  AND ($3::bigint IS NULL OR o.processed_by = $3)
            WHERE s.is_active
              AND ($2::text IS NULL OR s.category = $2)
            GROUP BY s.id, s.name, s.category, s.quantity_g
            "#,
        )
        .bind(since)
        .bind(params.category.map(|c| c.as_str()))
        .bind(params.processed_by)
        .fetch_all(&self.db)
        .await?;

        let thresholds = self.config.thresholds();
        let mut forecasts: Vec<DepletionForecast> = rows
            .into_iter()
            .map(|row| {
                let rate = daily_rate(row.consumed_g, window);
                let days = days_remaining(row.quantity_g, rate);
                DepletionForecast {
                    strain_id: row.strain_id,
                    strain_name: row.strain_name,
                    category: row.category,
                    quantity_g: row.quantity_g,
                    consumed_g: row.consumed_g,
                    daily_rate_g: rate,
                    days_remaining: days,
                    severity: classify(days, &thresholds),
                }
            })
            .collect();

        // Ascending by projected days; products without consumption last.
        forecasts.sort_by_key(|f| (f.days_remaining.is_none(), f.days_remaining));
        Ok(forecasts)
    }

    /// Grams consumed per strain over the window, heaviest first.
    pub async fn consumption_by_strain(
        &self,
        params: &ForecastParams,
    ) -> AppResult<Vec<StrainConsumption>> {
        let window = self.window_days(params)?;
        let since = Utc::now() - Duration::days(window as i64);

        let rows = sqlx::query_as::<_, (String, String, String, i64, Decimal)>(
            r#"
            SELECT o.strain_id, o.strain_name, o.category_name,
                   COUNT(*) AS order_count,
                   COALESCE(SUM(o.needed_amount_g), 0) AS total_g
            FROM orders o
            WHERE o.status = 'done'
              AND o.created_at >= $1
              AND ($2::text IS NULL OR o.category_name = $2)
            GROUP BY o.strain_id, o.strain_name, o.category_name
            ORDER BY total_g DESC
            "#,
        )
        .bind(since)
        .bind(params.category.map(|c| c.as_str()))
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(strain_id, strain_name, category, order_count, total_g)| StrainConsumption {
                strain_id,
                strain_name,
                category,
                order_count,
                total_g,
            })
            .collect())
    }

    /// Completed orders per employee over the window, busiest first.
    pub async fn productivity_by_employee(
        &self,
        params: &ForecastParams,
    ) -> AppResult<Vec<EmployeeProductivity>> {
        let window = self.window_days(params)?;
        let since = Utc::now() - Duration::days(window as i64);

        let rows = sqlx::query_as::<_, (i64, String, i64, Decimal)>(
            r#"
            SELECT u.id, u.name,
                   COUNT(*) AS order_count,
                   COALESCE(SUM(o.needed_amount_g), 0) AS total_g
            FROM orders o
            JOIN users u ON u.id = o.processed_by
            WHERE o.status = 'done'
              AND o.created_at >= $1
            GROUP BY u.id, u.name
            ORDER BY order_count DESC, total_g DESC
            "#,
        )
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, name, order_count, total_g)| EmployeeProductivity {
                user_id,
                name,
                order_count,
                total_g,
            })
            .collect())
    }

    /// Depletion forecast as CSV
    pub async fn export_depletion_csv(&self, params: &ForecastParams) -> AppResult<String> {
        let forecasts = self.depletion(params).await?;
        super::export_to_csv(&forecasts)
    }

    /// Strain consumption report as CSV
    pub async fn export_consumption_csv(&self, params: &ForecastParams) -> AppResult<String> {
        let report = self.consumption_by_strain(params).await?;
        super::export_to_csv(&report)
    }
}
