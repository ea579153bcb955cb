//! `POST /analyze`: run the rule engine and record the result.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::Identity;
use crate::rules::ValidationError;

/// Both fields are optional at the wire level so that a missing field is
/// reported as a validation failure rather than a deserialization one.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub symptoms: Option<Vec<String>>,
    pub severity: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub suggestions: Vec<String>,
    pub entry_id: String,
}

pub async fn analyze(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = body?;

    let symptoms = request.symptoms.unwrap_or_default();
    let severity = request
        .severity
        .ok_or(ValidationError::MissingField("severity"))?;

    let entry = ctx.core.analyze(&identity, symptoms, &severity)?;

    Ok(Json(AnalyzeResponse {
        suggestions: entry.suggestions,
        entry_id: entry.id,
    }))
}
