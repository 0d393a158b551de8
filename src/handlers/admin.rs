// src/handlers/admin.rs
use axum::{extract::State, http::HeaderMap, Json};
use std::sync::Arc;

use crate::auth::gate::client_ip;
use crate::auth::jwt;
use crate::error::ApiError;
use crate::models::{LoginRequest, LoginResponse};
use crate::AppState;

/// Admin login: throttled by client IP before anything else, then an exact
/// comparison against the operator-supplied credentials. Missing server
/// configuration is a 500, a wrong credential a 401.
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let ip = client_ip(&headers);
    state.gate.check_login(&ip).await?;

    if body.username.is_empty() || body.password.is_empty() {
        return Err(ApiError::validation("username and password are required"));
    }

    let (expected_user, expected_pass) = state
        .config
        .admin_credentials()
        .ok_or_else(|| ApiError::Config("ADMIN_USERNAME / ADMIN_PASSWORD not set".into()))?;

    if body.username != expected_user || body.password != expected_pass {
        tracing::warn!("failed login attempt from {}", ip);
        return Err(ApiError::InvalidCredentials);
    }

    let token = jwt::issue(&state.config.jwt_secret, expected_user)?;
    tracing::info!("admin login from {}", ip);

    Ok(Json(LoginResponse {
        success: true,
        message: "login successful".to_string(),
        token,
    }))
}
