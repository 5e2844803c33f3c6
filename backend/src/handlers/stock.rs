//! HTTP handlers for stock ledger endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::stock::{CreateStockInput, StockService, UpdateStockInput};
use crate::AppState;
use crate::models::{StockHistoryEntry, StockItem};

/// Query parameters for the stock listing
#[derive(Debug, Default, Deserialize)]
pub struct ListStockParams {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Input for a manual quantity correction
#[derive(Debug, Deserialize)]
pub struct AdjustQuantityInput {
    pub new_quantity_g: Decimal,
    pub reason: Option<String>,
}

/// List stock items
pub async fn list_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(params): Query<ListStockParams>,
) -> AppResult<Json<Vec<StockItem>>> {
    let service = StockService::new(state.db);
    let items = service.list_stock(params.include_inactive).await?;
    Ok(Json(items))
}

/// Get a single stock item
pub async fn get_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(strain_id): Path<String>,
) -> AppResult<Json<StockItem>> {
    let service = StockService::new(state.db);
    let item = service.get_stock(&strain_id).await?;
    Ok(Json(item))
}

/// Create a stock item (admin only)
pub async fn create_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateStockInput>,
) -> AppResult<Json<StockItem>> {
    if !current_user.0.can_manage_stock() {
        return Err(AppError::InsufficientPermissions);
    }
    let service = StockService::new(state.db);
    let item = service.create_stock(current_user.0.user_id, input).await?;
    Ok(Json(item))
}

/// Update stock item metadata (admin only)
pub async fn update_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(strain_id): Path<String>,
    Json(input): Json<UpdateStockInput>,
) -> AppResult<Json<StockItem>> {
    if !current_user.0.can_manage_stock() {
        return Err(AppError::InsufficientPermissions);
    }
    let service = StockService::new(state.db);
    let item = service
        .update_stock(current_user.0.user_id, &strain_id, input)
        .await?;
    Ok(Json(item))
}

/// Soft-disable a stock item (admin only)
pub async fn disable_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(strain_id): Path<String>,
) -> AppResult<Json<()>> {
    if !current_user.0.can_manage_stock() {
        return Err(AppError::InsufficientPermissions);
    }
    let service = StockService::new(state.db);
    service
        .disable_stock(current_user.0.user_id, &strain_id)
        .await?;
    Ok(Json(()))
}

/// Manually correct a product's quantity (admin only)
pub async fn adjust_quantity(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(strain_id): Path<String>,
    Json(input): Json<AdjustQuantityInput>,
) -> AppResult<Json<StockItem>> {
    if !current_user.0.can_manage_stock() {
        return Err(AppError::InsufficientPermissions);
    }
    let service = StockService::new(state.db);
    let item = service
        .adjust_quantity(
            current_user.0.user_id,
            &strain_id,
            input.new_quantity_g,
            input.reason,
        )
        .await?;
    Ok(Json(item))
}

/// Audit trail for one product
pub async fn get_stock_history(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(strain_id): Path<String>,
) -> AppResult<Json<Vec<StockHistoryEntry>>> {
    let service = StockService::new(state.db);
    let history = service.history(&strain_id).await?;
    Ok(Json(history))
}
