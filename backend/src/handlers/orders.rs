//! HTTP handlers for packaging order endpoints

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::orders::{CreateOrderInput, OrderFilter, OrderService, OrderWithNames};
use crate::services::stock::StockService;
use crate::AppState;
use crate::models::{Order, StockHistoryEntry};

/// Input for completing an order with a measured remainder
#[derive(Debug, Deserialize)]
pub struct CompleteOrderInput {
    /// Absolute measured quantity-on-hand after packaging, not a delta
    pub remainder_g: Decimal,
}

/// Create an order; its needed amount is reserved immediately
pub async fn create_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<Json<Order>> {
    let service = OrderService::new(state.db);
    let order = service.create_order(current_user.0.user_id, input).await?;
    Ok(Json(order))
}

/// List orders with optional status/date filters
pub async fn list_orders(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<OrderFilter>,
) -> AppResult<Json<Vec<OrderWithNames>>> {
    let service = OrderService::new(state.db);
    let orders = service.list_orders(&filter).await?;
    Ok(Json(orders))
}

/// Get a single order
pub async fn get_order(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(order_id): Path<i64>,
) -> AppResult<Json<Order>> {
    let service = OrderService::new(state.db);
    let order = service.get_order(order_id).await?;
    Ok(Json(order))
}

/// Claim an open order for processing
pub async fn claim_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<i64>,
) -> AppResult<Json<Order>> {
    let service = OrderService::new(state.db);
    let order = service.claim_order(current_user.0.user_id, order_id).await?;
    Ok(Json(order))
}

/// Complete an order with the measured remainder
pub async fn complete_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<i64>,
    Json(input): Json<CompleteOrderInput>,
) -> AppResult<Json<Order>> {
    let service = OrderService::new(state.db);
    let order = service
        .complete_order(current_user.0.user_id, order_id, input.remainder_g)
        .await?;
    Ok(Json(order))
}

/// Delete an order, releasing its reservation if still open
pub async fn delete_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<i64>,
) -> AppResult<Json<()>> {
    let service = OrderService::new(state.db);
    service
        .delete_order(current_user.0.user_id, order_id)
        .await?;
    Ok(Json(()))
}

/// Audit trail rows attached to one order
pub async fn get_order_history(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(order_id): Path<i64>,
) -> AppResult<Json<Vec<StockHistoryEntry>>> {
    let service = StockService::new(state.db);
    let history = service.history_for_order(order_id).await?;
    Ok(Json(history))
}

/// Export the filtered order list as CSV
pub async fn export_orders(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<OrderFilter>,
) -> AppResult<impl IntoResponse> {
    let service = OrderService::new(state.db);
    let csv_data = service.export_orders_csv(&filter).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        csv_data,
    ))
}
