//! Project listing.

use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use crate::fill::project_labels;
use crate::model::{Orientation, Project, SideKind};

use super::super::state::AppState;
use super::{ApiError, load_snapshot};

/// Summary of one project for pickers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub orientation: Orientation,
    /// Sides that would be exported.
    pub sides: Vec<SideKind>,
    /// Labels usable in the filename pattern.
    pub labels: Vec<String>,
    pub filename_pattern: String,
    pub active: bool,
}

impl ProjectSummary {
    fn of(project: &Project, active: bool) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            width: project.width,
            height: project.height,
            orientation: project.orientation(),
            sides: project.printable_sides(),
            labels: project_labels(project),
            filename_pattern: project.filename_pattern.clone(),
            active,
        }
    }
}

/// GET /api/projects - List stored projects.
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ProjectSummary>>, ApiError> {
    let snapshot = load_snapshot(&state.store).await?;
    let active_id = snapshot.active_project().map(|p| p.id.clone());
    let summaries = snapshot
        .projects
        .iter()
        .map(|p| ProjectSummary::of(p, active_id.as_deref() == Some(p.id.as_str())))
        .collect();
    Ok(Json(summaries))
}
