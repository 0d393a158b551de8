// src/auth/mod.rs
pub mod gate;
pub mod jwt;

use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

pub const TOKEN_COOKIE: &str = "admin_token";

/// There is a single administrative identity today; a named enum keeps
/// future roles a non-breaking extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

/// Extractor guarding every mutating handler. Token comes from the bearer
/// Authorization header first, the `admin_token` cookie as fallback; any
/// missing, malformed, tampered, or expired token is the same 401.
#[derive(Debug)]
pub struct AdminClaims(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AdminClaims
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let state = parts
            .extensions
            .get::<Arc<AppState>>()
            .cloned()
            .ok_or_else(|| ApiError::Config("application state missing from request".into()))?;

        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_owned);

        let token = bearer.or_else(|| {
            CookieJar::from_headers(&parts.headers)
                .get(TOKEN_COOKIE)
                .map(|cookie| cookie.value().to_string())
        });

        let token = token.ok_or(ApiError::Unauthorized)?;
        let claims =
            jwt::verify(&state.config.jwt_secret, &token).ok_or(ApiError::Unauthorized)?;

        Ok(AdminClaims(claims))
    }
}
