//! History endpoints.
//!
//! - `GET /history`: every entry of the caller, newest first
//! - `GET /history/:id`: one entry of the caller

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::{Identity, SymptomEntry};

#[derive(Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<SymptomEntry>,
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let entries = ctx.core.history_for(&identity)?;
    Ok(Json(HistoryResponse { entries }))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(entry_id): Path<String>,
) -> Result<Json<SymptomEntry>, ApiError> {
    ctx.core
        .history
        .get(&identity.id, &entry_id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Entry not found".into()))
}
