// zmohub/src/main.rs
mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod routes;
mod utils;

use crate::auth::gate::RequestGate;
use crate::config::Config;
use crate::db::Database;
use crate::middleware::rate_limit::RateLimiter;
use crate::routes::create_router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub rate_limiter: Arc<RateLimiter>,
    pub gate: RequestGate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("zmohub=info,tower_http=info")),
        )
        .init();

    // Fails closed when JWT_SECRET is absent or too weak
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    tracing::info!("connecting to database: {}", config.database_url);
    let db = Database::new(&config.database_url).await?;

    tracing::info!("running database migrations...");
    db.migrate().await?;

    let rate_limiter = Arc::new(RateLimiter::new());
    let gate = RequestGate::new(rate_limiter.clone());

    // Periodic sweep keeps the rate-limit map bounded; admission decisions
    // never depend on it
    let sweeper = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(600));
        loop {
            interval.tick().await;
            sweeper.sweep().await;
            tracing::debug!("rate limiter sweep completed");
        }
    });

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        rate_limiter,
        gate,
    });

    let app = create_router(state).layer(TraceLayer::new_for_http());

    let addr = config.server_addr();
    tracing::info!("zmohub listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
