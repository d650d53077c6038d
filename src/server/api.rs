use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use super::runs::RunRegistry;
use crate::core::parse_project_id;
use crate::pipeline::{Pipeline, RunOptions, LIST_LIMIT};

// ── Shared application state ──────────────────────────────────────────

/// Builds a fresh pipeline for one request, scoped to a project ID.
pub type PipelineFactory = Arc<dyn Fn(Option<u64>) -> anyhow::Result<Pipeline> + Send + Sync>;

pub struct AppState {
    pub factory: PipelineFactory,
    pub runs: RunRegistry,
    /// Used when a request names no output directory
    pub output_dir: PathBuf,
}

impl AppState {
    pub fn new(factory: PipelineFactory, output_dir: impl Into<PathBuf>) -> Self {
        Self { factory, runs: RunRegistry::new(), output_dir: output_dir.into() }
    }
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub board_id: Option<String>,
    /// Number or numeric string
    pub project_id: Option<Value>,
    pub output_dir: Option<PathBuf>,
    pub workflow_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardsQuery {
    pub project_id: Option<String>,
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error", "message": msg })),
            ),
        }
        .into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(format!("{:#}", e))
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/analyze", post(analyze))
        .route("/api/runs/{id}", get(get_run))
        .route("/api/boards", get(list_boards))
        .route("/health", get(health_check))
}

// ── Helpers ───────────────────────────────────────────────────────────

fn project_id_from_json(value: Option<&Value>) -> Result<Option<u64>, ApiError> {
    let invalid = |v: &Value| ApiError::BadRequest(format!("Invalid project ID: {}", v));
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v @ Value::Number(n)) => n.as_u64().map(Some).ok_or_else(|| invalid(v)),
        Some(Value::String(s)) => {
            parse_project_id(Some(s)).map_err(|e| ApiError::BadRequest(e.to_string()))
        }
        Some(other) => Err(invalid(other)),
    }
}

/// A body sent without a JSON content type reads as empty, so it fails on
/// the missing board ID like any other empty request.
fn analyze_request(
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<AnalyzeRequest, ApiError> {
    match payload {
        Ok(Json(req)) => Ok(req),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(AnalyzeRequest::default()),
        Err(rejection) => {
            Err(ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text())))
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy", "timestamp": Utc::now().to_rfc3339() }))
}

async fn analyze(
    State(state): State<SharedState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = analyze_request(payload)?;
    let board_id = req
        .board_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Board ID is required".into()))?;
    let project_id = project_id_from_json(req.project_id.as_ref())?;

    let pipeline = (state.factory)(project_id)?;

    let options = RunOptions {
        board_id: board_id.clone(),
        output_dir: req.output_dir.unwrap_or_else(|| state.output_dir.clone()),
        workflow_name: req.workflow_name,
    };

    let run_id = state.runs.start(&board_id, project_id);
    info!(%run_id, board_id = %board_id, ?project_id, "Starting workflow analysis");

    let task_state = Arc::clone(&state);
    tokio::spawn(async move {
        match pipeline.run(&options).await {
            Ok(outcome) => {
                info!(%run_id, board_id = %options.board_id, "Analysis completed");
                task_state.runs.complete(run_id, &outcome);
            }
            Err(e) => {
                error!(%run_id, board_id = %options.board_id, error = %format!("{:#}", e), "Background analysis failed");
                task_state.runs.fail(run_id, format!("{:#}", e));
            }
        }
    });

    let project = req.project_id.filter(|v| !v.is_null()).unwrap_or_else(|| json!("unknown"));
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "success": true,
            "message": "Workflow analysis started successfully",
            "projectId": project,
            "boardId": board_id,
            "status": "processing",
            "runId": run_id,
        })),
    ))
}

async fn get_run(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let not_found = || ApiError::NotFound(format!("Run {} not found", id));
    let run_id = Uuid::parse_str(&id).map_err(|_| not_found())?;
    let record = state.runs.get(run_id).ok_or_else(not_found)?;
    Ok(Json(record))
}

async fn list_boards(
    State(state): State<SharedState>,
    Query(query): Query<BoardsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let project_id = parse_project_id(query.project_id.as_deref())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let pipeline = (state.factory)(project_id)?;
    let boards = pipeline.list_boards(LIST_LIMIT).await?;
    Ok(Json(json!({ "success": true, "boards": boards })))
}
