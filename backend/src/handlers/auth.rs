//! HTTP handlers for authentication endpoints

use axum::{extract::State, Json};

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::auth::{
    AuthService, AuthTokens, LoginInput, LoginResponse, RefreshInput, RegisterInput,
};
use crate::AppState;
use crate::models::User;

/// Register a new user account (admin only)
pub async fn register(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RegisterInput>,
) -> AppResult<Json<User>> {
    if !current_user.0.can_manage_users() {
        return Err(AppError::InsufficientPermissions);
    }
    let service = AuthService::new(state.db, &state.config);
    let user = service.register(input).await?;
    Ok(Json(user))
}

/// Log in with username and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<LoginResponse>> {
    let service = AuthService::new(state.db, &state.config);
    let response = service.login(input).await?;
    Ok(Json(response))
}

/// Exchange a refresh token for a new token pair
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshInput>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db, &state.config);
    let tokens = service.refresh(input).await?;
    Ok(Json(tokens))
}

/// Get the authenticated user's account
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<User>> {
    let service = AuthService::new(state.db, &state.config);
    let user = service.get_user(current_user.0.user_id).await?;
    Ok(Json(user))
}
