//! onboard-api: management surface for participant provisioning.
//!
//! Accepts participant manifests over HTTP and provisions them against
//! in-process backends.

use axum::{
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use clap::Parser;
use onboard_core::{logging, Config, LogFormat};
use onboard_provisioning::PARTICIPANTS_PATH;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tracing::info;

mod handlers;
mod state;

use state::AppState;

#[derive(Parser)]
#[command(name = "onboard-api")]
#[command(about = "Participant provisioning management API")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "ONBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON regardless of the configured format
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default_config(),
    };
    if cli.json_logs {
        config.logging.format = LogFormat::Json;
    }
    logging::init_from(&config.logging);

    let bind_addr = config.bind_address();
    let state = Arc::new(AppState::in_memory(config));
    let app = router(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    info!(%bind_addr, "onboard-api listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Routes, with the participants collection mounted under the API context path.
fn router(state: Arc<AppState>) -> Router {
    let participants = format!("{}{}", state.config.api.context_path(), PARTICIPANTS_PATH);

    Router::new()
        .route("/health", get(health_check))
        .route(&participants, post(handlers::create_participant))
        .with_state(state)
        .layer(ServiceBuilder::new().into_inner())
}

async fn health_check() -> Result<Json<Value>, StatusCode> {
    Ok(Json(json!({
        "status": "healthy",
        "service": "onboard-api",
        "timestamp": Utc::now().to_rfc3339()
    })))
}
