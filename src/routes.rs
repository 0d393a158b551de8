// src/routes.rs
use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};

use crate::handlers::{admin, config, plugins};
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Catalog
        .route(
            "/plugins",
            get(plugins::list_plugins).post(plugins::create_plugin),
        )
        .route(
            "/plugins/:id",
            get(plugins::get_plugin)
                .put(plugins::update_plugin)
                .delete(plugins::delete_plugin),
        )
        .route("/plugins/:id/download", post(plugins::increment_download))
        .route("/plugins/:id/versions", get(plugins::list_versions))
        .route("/plugins/:id/related", get(plugins::related_plugins))
        // Configuration singletons
        .route(
            "/config",
            get(config::get_group_config).put(config::update_group_config),
        )
        .route(
            "/site-config",
            get(config::get_site_config).put(config::update_site_config),
        )
        .route(
            "/ad-config",
            get(config::get_ad_config).post(config::save_ad_config),
        )
        // Auth
        .route("/admin/login", post(admin::login))
        .with_state(state.clone())
        // The auth extractor reads shared state from request extensions
        .layer(Extension(state))
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
