//! Backup download and restore.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;

use crate::store::{Backup, backup_filename, import_backup};

use super::super::state::AppState;
use super::{ApiError, api_error, attachment, load_snapshot, save_snapshot};

/// GET /api/backup - Download the whole store as a backup file.
pub async fn download(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let snapshot = load_snapshot(&state.store).await?;
    let body = serde_json::to_vec(&Backup::now(&snapshot))
        .map_err(|e| api_error(e.into()))?;
    let filename = backup_filename(chrono::Local::now().date_naive());

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, attachment(&filename)),
        ],
        body,
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreSummary {
    pub projects: usize,
    pub signatures: usize,
    pub companies: usize,
    pub active_project_id: Option<String>,
}

/// POST /api/backup - Replace the store with an uploaded backup.
///
/// The upload is validated completely before the store is written; a bad
/// file leaves the store untouched and answers 400.
pub async fn restore(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<(StatusCode, Json<RestoreSummary>), ApiError> {
    let current = load_snapshot(&state.store).await?;
    let restored = import_backup(&current, &body).map_err(api_error)?;

    let summary = RestoreSummary {
        projects: restored.projects.len(),
        signatures: restored.signatures.len(),
        companies: restored.companies.len(),
        active_project_id: restored.active_project_id.clone(),
    };
    save_snapshot(&state.store, restored).await?;

    Ok((StatusCode::OK, Json(summary)))
}
