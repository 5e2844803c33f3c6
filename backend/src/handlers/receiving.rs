//! HTTP handlers for warehouse receiving endpoints

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::stock::{ReceiveStockInput, StockService};
use crate::AppState;
use crate::models::ReceivingEntry;

/// Book a warehouse receipt
pub async fn record_receiving(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ReceiveStockInput>,
) -> AppResult<Json<ReceivingEntry>> {
    let service = StockService::new(state.db);
    let entry = service.receive(current_user.0.user_id, input).await?;
    Ok(Json(entry))
}

/// List warehouse receipts
pub async fn list_receiving(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<ReceivingEntry>>> {
    let service = StockService::new(state.db);
    let entries = service.list_receiving().await?;
    Ok(Json(entries))
}
