//! HTTP server for text2sql (axum).
//!
//! Listens on `TEXT2SQL_ADDR` (default `127.0.0.1:3278`) and exposes the question
//! endpoints under `/teacher`, `/course` and `/structured`; see [`router`].
//!
//! **Public API**: [`run_serve`], [`run_serve_on_listener`], [`router`], [`AppState`].

mod app;
mod handlers;

use std::sync::Arc;

use text2sql::Settings;
use tokio::net::TcpListener;
use tracing::info;

pub use app::{router, AppState};

/// Serves `state` on an existing listener. Used by tests (bind to 127.0.0.1:0 then pass listener).
pub async fn run_serve_on_listener(
    listener: TcpListener,
    state: Arc<AppState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = listener.local_addr()?;
    info!("text2sql server listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Builds state from the environment and serves on `addr` (default: `TEXT2SQL_ADDR`).
pub async fn run_serve(addr: Option<&str>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    run_serve_with_settings(&Settings::from_env(), addr).await
}

/// Builds state from `settings` and serves on `addr` (default: `settings.addr`).
pub async fn run_serve_with_settings(
    settings: &Settings,
    addr: Option<&str>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = Arc::new(AppState::from_settings(settings)?);
    let addr = addr.unwrap_or(settings.addr.as_str());
    info!(
        database = %settings.database,
        model = %settings.openai_model,
        validate_sql = settings.validate_sql,
        "starting server"
    );
    let listener = TcpListener::bind(addr).await?;
    run_serve_on_listener(listener, state).await
}
