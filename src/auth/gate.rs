// src/auth/gate.rs
use axum::http::HeaderMap;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::Claims;
use crate::error::ApiError;
use crate::middleware::rate_limit::RateLimiter;

const OPERATION_MAX_REQUESTS: usize = 10;
const OPERATION_WINDOW: Duration = Duration::from_secs(60);

// Login attempts are throttled harder than operational endpoints
const LOGIN_MAX_ATTEMPTS: usize = 5;
const LOGIN_WINDOW: Duration = Duration::from_secs(60);

/// Throttling half of the request gate. Authentication happens first (the
/// `AdminClaims` extractor), so unauthenticated traffic never consumes a
/// budget tied to a real identity.
#[derive(Clone)]
pub struct RequestGate {
    limiter: Arc<RateLimiter>,
}

impl RequestGate {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }

    /// Per-admin-identity, per-operation-kind budget for mutating endpoints.
    pub async fn check_operation(&self, claims: &Claims, operation: &str) -> Result<(), ApiError> {
        let key = format!("{}:{}", operation, claims.sub);
        if self
            .limiter
            .allow(&key, OPERATION_MAX_REQUESTS, OPERATION_WINDOW)
            .await
        {
            Ok(())
        } else {
            tracing::warn!("operation {} throttled for {}", operation, claims.sub);
            Err(ApiError::RateLimited)
        }
    }

    /// Anonymous login attempts are throttled by client IP instead.
    pub async fn check_login(&self, client_ip: &str) -> Result<(), ApiError> {
        let key = format!("login:{}", client_ip);
        if self
            .limiter
            .allow(&key, LOGIN_MAX_ATTEMPTS, LOGIN_WINDOW)
            .await
        {
            Ok(())
        } else {
            tracing::warn!("login throttled for {}", client_ip);
            Err(ApiError::RateLimited)
        }
    }
}

/// Client address for login throttling, trusting reverse-proxy headers.
/// Unidentifiable clients all land in one shared "unknown" bucket.
pub fn client_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(ip) = forwarded_str.split(',').next() {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return ip.to_string();
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return ip_str.to_string();
        }
    }

    "unknown".to_string()
}
