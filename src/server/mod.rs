//! HTTP shim over the pipeline.
//!
//! `POST /api/analyze` answers `202 Accepted` right away and runs the
//! pipeline on a detached task; progress is polled at `GET /api/runs/{id}`.

mod api;
mod runs;

pub use api::{api_router, AnalyzeRequest, ApiError, AppState, PipelineFactory, SharedState};
pub use runs::{RunRecord, RunRegistry, RunStatus};

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::core::Settings;
use crate::pipeline::Pipeline;

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_enabled: bool,
    pub output_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_enabled: false,
            output_dir: PathBuf::from("./output"),
        }
    }
}

impl ServerConfig {
    pub fn from_config(config: &crate::core::Config) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            cors_enabled: config.server.cors_enabled,
            output_dir: config.output.dir.clone(),
        }
    }
}

/// Build the application router.
pub fn build_router(state: SharedState, cors_enabled: bool) -> Router {
    let app = api_router().with_state(state);
    if cors_enabled {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Factory building HTTP-backed pipelines from validated settings.
///
/// A request without a project ID falls back to `PROJECT_ID`; a project is
/// created only when both are absent.
pub fn settings_factory(settings: Settings) -> PipelineFactory {
    let settings = Arc::new(settings);
    Arc::new(move |project_id: Option<u64>| -> anyhow::Result<Pipeline> {
        let project_id = project_id.or(settings.default_project_id);
        Ok(Pipeline::from_settings(&settings, project_id))
    })
}

/// Start the server and block until Ctrl+C.
pub async fn start_server(config: ServerConfig, factory: PipelineFactory) -> Result<()> {
    let state = Arc::new(AppState::new(factory, config.output_dir.clone()));
    let app = build_router(state, config.cors_enabled);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    info!(%local_addr, cors = config.cors_enabled, "Server listening");
    println!("boardflow API server running at http://{}", local_addr);
    println!("  Health check:  GET  http://{}/health", local_addr);
    println!("  Analyze:       POST http://{}/api/analyze", local_addr);
    println!("  Run status:    GET  http://{}/api/runs/{{id}}", local_addr);
    println!("  List boards:   GET  http://{}/api/boards", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
