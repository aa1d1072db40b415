//! Preview and export handlers.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::export::{ExportOptions, Exporter};
use crate::model::{FillValues, SideKind};
use crate::render::{RenderContext, preview_png};

use super::super::state::AppState;
use super::{ApiError, api_error, attachment, load_snapshot};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub project_id: String,
    #[serde(default = "front")]
    pub side: SideKind,
    #[serde(default)]
    pub values: FillValues,
}

fn front() -> SideKind {
    SideKind::Front
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub project_ids: Vec<String>,
    #[serde(default)]
    pub values: FillValues,
}

/// POST /api/preview - Render one side of one project as PNG.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PreviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = load_snapshot(&state.store).await?;
    let project = snapshot.project(&req.project_id).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("Unknown project '{}'", req.project_id),
        )
    })?;
    let ctx = RenderContext::new(snapshot.lookups(), &state.images);

    let png_bytes = preview_png(project, req.side, &req.values, &state.fonts, &ctx)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Preview render failed: {}", e),
            )
        })?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png_bytes))
}

/// POST /api/export - Render the selection into one PDF download.
///
/// An empty selection answers 204 with no body.
pub async fn export(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExportRequest>,
) -> Result<Response, ApiError> {
    let snapshot = load_snapshot(&state.store).await?;
    let selected = snapshot.select(&req.project_ids).map_err(api_error)?;
    let ctx = RenderContext::new(snapshot.lookups(), &state.images);

    let exported = Exporter::new(&state.fonts, ExportOptions::default())
        .export(&selected, &req.values, &ctx)
        .await
        .map_err(api_error)?;

    let Some(doc) = exported else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, attachment(&doc.filename)),
        ],
        doc.bytes,
    )
        .into_response())
}
