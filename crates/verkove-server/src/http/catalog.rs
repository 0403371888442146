use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use verkove_core::{BaseDesign, EntityKind, StoreError, SubDesign};

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryQuery {
    category: Option<String>,
}

pub(crate) async fn list_base_designs(
    State(state): State<AppState>,
    query: Result<Query<CategoryQuery>, QueryRejection>,
) -> Result<Json<Vec<BaseDesign>>, ApiError> {
    let Query(query) = query?;
    let designs = match query.category.as_deref().filter(|c| !c.is_empty()) {
        Some(category) => state.store.base_designs_by_category(category),
        None => state.store.base_designs(),
    };
    Ok(Json(designs))
}

pub(crate) async fn get_base_design(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<BaseDesign>, ApiError> {
    let Path(id) = id?;
    state
        .store
        .base_design(id)
        .map(Json)
        .ok_or_else(|| {
            StoreError::NotFound {
                kind: EntityKind::BaseDesign,
                id,
            }
            .into()
        })
}

pub(crate) async fn list_sub_designs(State(state): State<AppState>) -> Json<Vec<SubDesign>> {
    Json(state.store.sub_designs())
}
