//! Route definitions for the Abpack platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes
        .nest("/auth", auth_routes())
        // Protected routes - stock ledger
        .nest("/stock", stock_routes())
        // Protected routes - packaging orders
        .nest("/orders", order_routes())
        // Protected routes - warehouse receiving
        .nest("/receiving", receiving_routes())
        // Protected routes - forecast and reports
        .nest("/forecast", forecast_routes())
}

/// Authentication routes
fn auth_routes() -> Router<AppState> {
    Router::new()
        // Public
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        // Protected
        .merge(protected_auth_routes())
}

/// Authenticated account routes
fn protected_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/me", get(handlers::me))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock ledger routes (protected)
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_stock).post(handlers::create_stock))
        .route(
            "/:strain_id",
            get(handlers::get_stock)
                .put(handlers::update_stock)
                .delete(handlers::disable_stock),
        )
        .route("/:strain_id/adjust", post(handlers::adjust_quantity))
        .route("/:strain_id/history", get(handlers::get_stock_history))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Packaging order routes (protected)
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route("/export", get(handlers::export_orders))
        .route(
            "/:order_id",
            get(handlers::get_order).delete(handlers::delete_order),
        )
        .route("/:order_id/claim", post(handlers::claim_order))
        .route("/:order_id/complete", post(handlers::complete_order))
        .route("/:order_id/history", get(handlers::get_order_history))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Warehouse receiving routes (protected)
fn receiving_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_receiving).post(handlers::record_receiving),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Forecast and report routes (protected)
fn forecast_routes() -> Router<AppState> {
    Router::new()
        .route("/depletion", get(handlers::get_depletion_forecast))
        .route("/depletion/export", get(handlers::export_depletion_forecast))
        .route("/consumption", get(handlers::get_consumption_report))
        .route(
            "/consumption/export",
            get(handlers::export_consumption_report),
        )
        .route("/productivity", get(handlers::get_productivity_report))
        .route_layer(middleware::from_fn(auth_middleware))
}
