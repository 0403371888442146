use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use verkove_core::{
    DesignProject, EntityKind, ManufacturingOrder, NewProject, OrderPatch, ProjectPatch,
    StoreError,
};

use crate::{ApiError, AppState};

fn not_found(kind: EntityKind, id: u64) -> ApiError {
    StoreError::NotFound { kind, id }.into()
}

pub(crate) async fn list_projects(State(state): State<AppState>) -> Json<Vec<DesignProject>> {
    Json(state.store.projects())
}

pub(crate) async fn create_project(
    State(state): State<AppState>,
    body: Result<Json<NewProject>, JsonRejection>,
) -> Result<(StatusCode, Json<DesignProject>), ApiError> {
    let Json(draft) = body?;
    let project = state.store.create_project(draft);
    info!(project_id = project.id, name = %project.name, "project created");
    Ok((StatusCode::CREATED, Json(project)))
}

pub(crate) async fn get_project(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<DesignProject>, ApiError> {
    let Path(id) = id?;
    state
        .store
        .project(id)
        .map(Json)
        .ok_or_else(|| not_found(EntityKind::Project, id))
}

/// Unknown ids answer 400, not 404.
pub(crate) async fn update_project(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    body: Result<Json<ProjectPatch>, JsonRejection>,
) -> Result<Json<DesignProject>, ApiError> {
    let Path(id) = id?;
    let Json(patch) = body?;
    match state.store.update_project(id, patch) {
        Ok(project) => Ok(Json(project)),
        Err(e) if e.is_not_found() => Err(ApiError::BadRequest(e.to_string())),
        Err(e) => Err(e.into()),
    }
}

pub(crate) async fn list_orders(State(state): State<AppState>) -> Json<Vec<ManufacturingOrder>> {
    Json(state.store.orders())
}

pub(crate) async fn get_order(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<ManufacturingOrder>, ApiError> {
    let Path(id) = id?;
    state
        .store
        .order(id)
        .map(Json)
        .ok_or_else(|| not_found(EntityKind::Order, id))
}

pub(crate) async fn update_order(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    body: Result<Json<OrderPatch>, JsonRejection>,
) -> Result<Json<ManufacturingOrder>, ApiError> {
    let Path(id) = id?;
    let Json(patch) = body?;
    let order = state.store.update_order(id, patch)?;
    info!(order_id = order.id, status = ?order.status, "order updated");
    Ok(Json(order))
}
