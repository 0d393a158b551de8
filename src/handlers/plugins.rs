// src/handlers/plugins.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::auth::AdminClaims;
use crate::error::ApiError;
use crate::models::*;
use crate::utils::validation::{is_valid_url, non_empty, sanitize};
use crate::AppState;

/// Clean and validate a catalog payload; name and download URL are the
/// required fields, the URL must be absolute.
fn clean_fields(input: &PluginInput) -> Result<PluginFields, ApiError> {
    let name = sanitize(input.name.as_deref(), MAX_NAME_LEN);
    let download_url = sanitize(input.download_url.as_deref(), MAX_URL_LEN);

    if name.is_empty() || download_url.is_empty() {
        return Err(ApiError::validation(
            "plugin name and download url are required",
        ));
    }
    if !is_valid_url(&download_url) {
        return Err(ApiError::validation("download url is not a valid URL"));
    }

    Ok(PluginFields {
        name,
        description: non_empty(sanitize(input.description.as_deref(), MAX_DESCRIPTION_LEN)),
        download_url,
        category: non_empty(sanitize(input.category.as_deref(), MAX_CATEGORY_LEN)),
        install_guide: non_empty(sanitize(input.install_guide.as_deref(), MAX_INSTALL_GUIDE_LEN)),
    })
}

pub async fn list_plugins(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> Result<Json<PluginListResponse>, ApiError> {
    let plugins = state
        .db
        .list_plugins(
            params.search.as_deref().unwrap_or(""),
            params.category.as_deref().unwrap_or(""),
            params.sort_by.as_deref().unwrap_or("created_at"),
            params.order.as_deref().unwrap_or("desc"),
        )
        .await?;
    let categories = state.db.distinct_categories().await?;

    Ok(Json(PluginListResponse {
        success: true,
        plugins,
        categories,
    }))
}

pub async fn create_plugin(
    State(state): State<Arc<AppState>>,
    admin: AdminClaims,
    Json(body): Json<PluginInput>,
) -> Result<(StatusCode, Json<PluginResponse>), ApiError> {
    state.gate.check_operation(&admin.0, "create").await?;

    let fields = clean_fields(&body)?;
    let plugin = state.db.create_plugin(&fields).await?;
    tracing::info!("plugin {} created by {}", plugin.id, admin.0.sub);

    Ok((
        StatusCode::CREATED,
        Json(PluginResponse {
            success: true,
            plugin,
        }),
    ))
}

pub async fn get_plugin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<PluginResponse>, ApiError> {
    let plugin = state
        .db
        .get_plugin(id)
        .await?
        .ok_or_else(|| ApiError::not_found("plugin not found"))?;

    Ok(Json(PluginResponse {
        success: true,
        plugin,
    }))
}

pub async fn update_plugin(
    State(state): State<Arc<AppState>>,
    admin: AdminClaims,
    Path(id): Path<i64>,
    Json(body): Json<PluginInput>,
) -> Result<Json<PluginResponse>, ApiError> {
    state.gate.check_operation(&admin.0, "update").await?;

    let fields = clean_fields(&body)?;
    let mut version_label = sanitize(body.version.as_deref(), MAX_VERSION_LEN);
    if version_label.is_empty() {
        version_label = DEFAULT_VERSION_LABEL.to_string();
    }

    let plugin = state
        .db
        .update_plugin(id, &fields, &version_label)
        .await?
        .ok_or_else(|| ApiError::not_found("plugin not found"))?;
    tracing::info!("plugin {} updated by {}", id, admin.0.sub);

    Ok(Json(PluginResponse {
        success: true,
        plugin,
    }))
}

pub async fn delete_plugin(
    State(state): State<Arc<AppState>>,
    admin: AdminClaims,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.gate.check_operation(&admin.0, "delete").await?;

    if !state.db.delete_plugin(id).await? {
        return Err(ApiError::not_found("plugin not found"));
    }
    tracing::info!("plugin {} deleted by {}", id, admin.0.sub);

    Ok(Json(MessageResponse {
        success: true,
        message: "plugin deleted".to_string(),
    }))
}

// Public: the download interceptor bumps the counter and hands back the
// real URL in one step.
pub async fn increment_download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let (download_url, download_count) = state
        .db
        .increment_download(id)
        .await?
        .ok_or_else(|| ApiError::not_found("plugin not found"))?;

    Ok(Json(DownloadResponse {
        success: true,
        download_url,
        download_count,
    }))
}

pub async fn list_versions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<VersionListResponse>, ApiError> {
    let versions = state.db.list_versions(id).await?;

    Ok(Json(VersionListResponse {
        success: true,
        versions,
    }))
}

pub async fn related_plugins(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<RelatedResponse>, ApiError> {
    let related = state
        .db
        .related_plugins(id)
        .await?
        .ok_or_else(|| ApiError::not_found("plugin not found"))?;

    Ok(Json(RelatedResponse {
        success: true,
        related,
    }))
}
