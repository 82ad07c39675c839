use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

mod app;
mod auth;
mod config;
mod metrics;
mod state;

use crate::{auth::repo::PgUserDirectory, config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "accounts=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = Arc::new(AppConfig::from_env()?);

    let db = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run migrations")?;

    let state = AppState::new(config, Arc::new(PgUserDirectory::new(db)))?;
    tracing::info!(
        ttl_minutes = state.config.jwt.ttl_minutes,
        hash = ?state.config.hash,
        "account service configured"
    );

    app::serve(app::build_app(state)).await
}
