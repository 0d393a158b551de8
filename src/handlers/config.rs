// src/handlers/config.rs
use axum::{extract::State, Json};
use std::sync::Arc;

use crate::auth::AdminClaims;
use crate::error::ApiError;
use crate::models::*;
use crate::utils::validation::{is_valid_qq_number, is_valid_url, sanitize};
use crate::AppState;

pub async fn get_group_config(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ConfigResponse<GroupConfig>>, ApiError> {
    let config = state
        .db
        .group_config()
        .await?
        .ok_or_else(|| ApiError::not_found("config not found"))?;

    Ok(Json(ConfigResponse {
        success: true,
        config,
    }))
}

pub async fn update_group_config(
    State(state): State<Arc<AppState>>,
    admin: AdminClaims,
    Json(body): Json<GroupConfigInput>,
) -> Result<Json<ConfigResponse<GroupConfig>>, ApiError> {
    state.gate.check_operation(&admin.0, "config").await?;

    let name = sanitize(body.qq_group_name.as_deref(), MAX_QQ_NAME_LEN);
    let number = sanitize(body.qq_group_number.as_deref(), MAX_QQ_NUMBER_LEN);
    let link = sanitize(body.qq_group_link.as_deref(), MAX_URL_LEN);

    if !number.is_empty() && !is_valid_qq_number(&number) {
        return Err(ApiError::validation("QQ group number must contain digits only"));
    }
    if !link.is_empty() && !is_valid_url(&link) {
        return Err(ApiError::validation("group link is not a valid URL"));
    }

    let config = state
        .db
        .update_group_config(&name, &number, &link)
        .await?
        .ok_or_else(|| ApiError::not_found("config not found"))?;

    Ok(Json(ConfigResponse {
        success: true,
        config,
    }))
}

pub async fn get_site_config(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ConfigResponse<SiteConfig>>, ApiError> {
    let config = state
        .db
        .site_config()
        .await?
        .ok_or_else(|| ApiError::not_found("config not found"))?;

    Ok(Json(ConfigResponse {
        success: true,
        config,
    }))
}

pub async fn update_site_config(
    State(state): State<Arc<AppState>>,
    admin: AdminClaims,
    Json(body): Json<SiteConfigInput>,
) -> Result<Json<ConfigResponse<SiteConfig>>, ApiError> {
    state.gate.check_operation(&admin.0, "site-config").await?;

    let name = sanitize(body.site_name.as_deref(), MAX_SITE_NAME_LEN);
    let description = sanitize(body.site_description.as_deref(), MAX_DESCRIPTION_LEN);

    if name.is_empty() {
        return Err(ApiError::validation("site name must not be empty"));
    }

    let config = state
        .db
        .update_site_config(&name, &description)
        .await?
        .ok_or_else(|| ApiError::not_found("config not found"))?;

    Ok(Json(ConfigResponse {
        success: true,
        config,
    }))
}

pub async fn get_ad_config(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ConfigResponse<Option<AdConfig>>>, ApiError> {
    let config = state.db.ad_config().await?;

    Ok(Json(ConfigResponse {
        success: true,
        config,
    }))
}

pub async fn save_ad_config(
    State(state): State<Arc<AppState>>,
    admin: AdminClaims,
    Json(body): Json<AdConfigInput>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.gate.check_operation(&admin.0, "ad-config").await?;

    let title = sanitize(body.title.as_deref(), MAX_AD_TITLE_LEN);
    let subtitle = sanitize(body.subtitle.as_deref(), MAX_AD_SUBTITLE_LEN);

    if title.is_empty() || subtitle.is_empty() {
        return Err(ApiError::validation("banner title and subtitle are required"));
    }

    state
        .db
        .save_ad_config(&AdFields {
            title,
            subtitle,
            enabled: body.enabled.unwrap_or(true),
        })
        .await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "config saved".to_string(),
    }))
}
