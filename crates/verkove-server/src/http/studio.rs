use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::info;
use verkove_studio::{ChatRequest, GenerateRequest};

use crate::{ApiError, AppState};

pub(crate) async fn generate_design(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body?;
    let outcome = state.iterations.submit(request).await?;
    info!(
        iteration_id = %outcome.iteration.id,
        source = ?outcome.source,
        "design generated"
    );
    let message = outcome.message();
    Ok(Json(json!({
        "success": true,
        "iteration": outcome.iteration,
        "message": message,
    })))
}

pub(crate) async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body?;
    let response = state.chat.converse(request).await?;
    Ok(Json(json!({
        "success": true,
        "response": response,
    })))
}

pub(crate) async fn export_design(
    State(state): State<AppState>,
    project_id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(project_id) = project_id?;
    let result = state.export.export(project_id)?;
    Ok(Json(json!({
        "success": true,
        "order": result.order,
        "downloadLinks": result.download_links,
    })))
}
