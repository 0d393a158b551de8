// src/models.rs
use serde::{Deserialize, Serialize};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_URL_LEN: usize = 500;
pub const MAX_CATEGORY_LEN: usize = 50;
pub const MAX_INSTALL_GUIDE_LEN: usize = 2000;
pub const MAX_VERSION_LEN: usize = 20;
pub const MAX_SITE_NAME_LEN: usize = 50;
pub const MAX_QQ_NAME_LEN: usize = 100;
pub const MAX_QQ_NUMBER_LEN: usize = 50;
pub const MAX_AD_TITLE_LEN: usize = 200;
pub const MAX_AD_SUBTITLE_LEN: usize = 500;

pub const DEFAULT_VERSION_LABEL: &str = "1.0.0";

// Database models
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Plugin {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub download_url: String,
    pub category: Option<String>,
    pub install_guide: Option<String>,
    pub download_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PluginVersion {
    pub id: i64,
    pub plugin_id: i64,
    pub version_number: String,
    pub name: String,
    pub description: Option<String>,
    pub download_url: String,
    pub category: Option<String>,
    pub install_guide: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RelatedPlugin {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub download_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GroupConfig {
    pub qq_group_name: String,
    pub qq_group_number: String,
    pub qq_group_link: String,
    pub site_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SiteConfig {
    pub site_name: String,
    pub site_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdConfig {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

// Cleaned field set accepted by the catalog store for create/update
#[derive(Debug, Clone)]
pub struct PluginFields {
    pub name: String,
    pub description: Option<String>,
    pub download_url: String,
    pub category: Option<String>,
    pub install_guide: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AdFields {
    pub title: String,
    pub subtitle: String,
    pub enabled: bool,
}

// Request types
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct PluginInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub download_url: Option<String>,
    pub category: Option<String>,
    pub install_guide: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct GroupConfigInput {
    pub qq_group_name: Option<String>,
    pub qq_group_number: Option<String>,
    pub qq_group_link: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SiteConfigInput {
    pub site_name: Option<String>,
    pub site_description: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AdConfigInput {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// Response types
#[derive(Debug, Serialize)]
pub struct PluginListResponse {
    pub success: bool,
    pub plugins: Vec<Plugin>,
    pub categories: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PluginResponse {
    pub success: bool,
    pub plugin: Plugin,
}

#[derive(Debug, Serialize)]
pub struct VersionListResponse {
    pub success: bool,
    pub versions: Vec<PluginVersion>,
}

#[derive(Debug, Serialize)]
pub struct RelatedResponse {
    pub success: bool,
    pub related: Vec<RelatedPlugin>,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub success: bool,
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
    #[serde(rename = "downloadCount")]
    pub download_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse<T> {
    pub success: bool,
    pub config: T,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
}
