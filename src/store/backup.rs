//! Backup files: the whole store as one downloadable JSON document.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Snapshot;
use crate::error::CertifyError;
use crate::model::{Company, Project, SavedSignature};

/// Format version written into new backups.
pub const BACKUP_VERSION: &str = "1.2.4";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub version: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub projects: Vec<Project>,
    pub signatures: Vec<SavedSignature>,
    pub companies: Vec<Company>,
    #[serde(default)]
    pub active_project_id: Option<String>,
}

impl Backup {
    pub fn from_snapshot(snapshot: &Snapshot, timestamp: i64) -> Self {
        Self {
            version: BACKUP_VERSION.to_string(),
            timestamp,
            projects: snapshot.projects.clone(),
            signatures: snapshot.signatures.clone(),
            companies: snapshot.companies.clone(),
            active_project_id: snapshot.active_project_id.clone(),
        }
    }

    /// Backup of `snapshot` stamped with the current time.
    pub fn now(snapshot: &Snapshot) -> Self {
        Self::from_snapshot(snapshot, chrono::Utc::now().timestamp_millis())
    }
}

/// Download name for a backup taken on `date`: `procertify_yedek_DD_MM_YYYY.json`.
pub fn backup_filename(date: NaiveDate) -> String {
    format!("procertify_yedek_{}.json", date.format("%d_%m_%Y"))
}

/// Build the snapshot that results from importing `json` over `current`.
///
/// `projects` must be present and an array, and every entry must parse,
/// before anything is returned; `current` is never touched. Projects are
/// always replaced. Signatures and companies are replaced when the backup
/// carries them and kept otherwise. The backup's active project is kept only
/// if it names one of the imported projects.
pub fn import_backup(current: &Snapshot, json: &str) -> Result<Snapshot, CertifyError> {
    let root: Value = serde_json::from_str(json)
        .map_err(|e| CertifyError::Format(format!("Backup is not valid JSON: {}", e)))?;

    let projects = match root.get("projects") {
        Some(value @ Value::Array(_)) => parse_field::<Vec<Project>>(value, "projects")?,
        Some(_) => return Err(CertifyError::Format("`projects` is not an array".into())),
        None => return Err(CertifyError::Format("backup has no `projects`".into())),
    };

    let signatures = match root.get("signatures") {
        Some(value) if !value.is_null() => parse_field(value, "signatures")?,
        _ => current.signatures.clone(),
    };
    let companies = match root.get("companies") {
        Some(value) if !value.is_null() => parse_field(value, "companies")?,
        _ => current.companies.clone(),
    };

    let active_project_id = root
        .get("activeProjectId")
        .and_then(Value::as_str)
        .filter(|id| projects.iter().any(|p: &Project| p.id == *id))
        .map(str::to_string)
        .or_else(|| projects.first().map(|p| p.id.clone()));

    log::info!(
        "Imported backup: {} projects, {} signatures, {} companies",
        projects.len(),
        signatures.len(),
        companies.len()
    );

    Ok(Snapshot {
        projects,
        signatures,
        companies,
        active_project_id,
    })
}

fn parse_field<T: serde::de::DeserializeOwned>(value: &Value, name: &str) -> Result<T, CertifyError> {
    T::deserialize(value)
        .map_err(|e| CertifyError::Format(format!("Invalid `{}` in backup: {}", name, e)))
}
