//! HTTP handlers for forecast and reporting endpoints

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::forecast::{
    DepletionForecast, EmployeeProductivity, ForecastParams, ForecastService, StrainConsumption,
};
use crate::AppState;

fn forecast_service(state: AppState) -> ForecastService {
    ForecastService::new(state.db, state.config.forecast.clone())
}

/// Projected days-until-empty per product, most urgent first
pub async fn get_depletion_forecast(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(params): Query<ForecastParams>,
) -> AppResult<Json<Vec<DepletionForecast>>> {
    let forecasts = forecast_service(state).depletion(&params).await?;
    Ok(Json(forecasts))
}

/// Consumption per strain over the window
pub async fn get_consumption_report(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(params): Query<ForecastParams>,
) -> AppResult<Json<Vec<StrainConsumption>>> {
    let report = forecast_service(state).consumption_by_strain(&params).await?;
    Ok(Json(report))
}

/// Completed orders per employee over the window
pub async fn get_productivity_report(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(params): Query<ForecastParams>,
) -> AppResult<Json<Vec<EmployeeProductivity>>> {
    let report = forecast_service(state)
        .productivity_by_employee(&params)
        .await?;
    Ok(Json(report))
}

/// Depletion forecast as CSV
pub async fn export_depletion_forecast(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(params): Query<ForecastParams>,
) -> AppResult<impl IntoResponse> {
    let csv_data = forecast_service(state).export_depletion_csv(&params).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        csv_data,
    ))
}

/// Consumption report as CSV
pub async fn export_consumption_report(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(params): Query<ForecastParams>,
) -> AppResult<impl IntoResponse> {
    let csv_data = forecast_service(state)
        .export_consumption_csv(&params)
        .await?;
    Ok((
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        csv_data,
    ))
}
