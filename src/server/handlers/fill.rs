//! Fill-form schema for a multi-project selection.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::fill::{UnifiedField, unify_fields};
use crate::model::SavedSignature;

use super::super::state::AppState;
use super::{ApiError, api_error, load_snapshot};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldsRequest {
    pub project_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FieldsResponse {
    pub fields: Vec<UnifiedField>,
    /// Saved signatures, for populating signature pickers.
    pub signatures: Vec<SavedSignature>,
    /// Company names, for populating company pickers.
    pub companies: Vec<String>,
}

/// POST /api/fields - Merged fill form for the selected projects.
pub async fn fields(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FieldsRequest>,
) -> Result<Json<FieldsResponse>, ApiError> {
    let snapshot = load_snapshot(&state.store).await?;
    let selected = snapshot.select(&req.project_ids).map_err(api_error)?;
    let fields = unify_fields(selected.iter().copied());

    Ok(Json(FieldsResponse {
        fields,
        signatures: snapshot.signatures.clone(),
        companies: snapshot.companies.iter().map(|c| c.name.clone()).collect(),
    }))
}
