//! # Store
//!
//! Persistence for projects, saved signatures and companies. The engine
//! never reaches into a store itself: callers `load()` a [`Snapshot`], hand
//! borrowed pieces of it to the resolver, renderer and exporter, and
//! `save()` whole snapshots back.

pub mod backup;

pub use backup::{BACKUP_VERSION, Backup, backup_filename, import_backup};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::CertifyError;
use crate::model::{Company, Lookups, Project, SavedSignature};

/// Name of the project a fresh store starts with.
pub const STARTER_PROJECT_NAME: &str = "Yeni Sertifika Projesi";

/// Everything the application persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub projects: Vec<Project>,
    #[serde(default)]
    pub signatures: Vec<SavedSignature>,
    #[serde(default)]
    pub companies: Vec<Company>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_project_id: Option<String>,
}

impl Default for Snapshot {
    /// One starter project, no signatures or companies.
    fn default() -> Self {
        let project = Project::new(STARTER_PROJECT_NAME);
        Self {
            active_project_id: Some(project.id.clone()),
            projects: vec![project],
            signatures: Vec::new(),
            companies: Vec::new(),
        }
    }
}

impl Snapshot {
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// The active project, or the first one when the id is stale.
    pub fn active_project(&self) -> Option<&Project> {
        self.active_project_id
            .as_deref()
            .and_then(|id| self.project(id))
            .or_else(|| self.projects.first())
    }

    /// Projects for `ids`, in the order given.
    pub fn select(&self, ids: &[String]) -> Result<Vec<&Project>, CertifyError> {
        ids.iter()
            .map(|id| {
                self.project(id)
                    .ok_or_else(|| CertifyError::NotFound(format!("project '{}'", id)))
            })
            .collect()
    }

    pub fn lookups(&self) -> Lookups<'_> {
        Lookups::new(&self.signatures, &self.companies)
    }
}

/// Load/save of whole snapshots.
pub trait Store: Send + Sync {
    fn load(&self) -> Result<Snapshot, CertifyError>;
    fn save(&self, snapshot: &Snapshot) -> Result<(), CertifyError>;
}

/// A single JSON file on disk.
///
/// A missing file loads as [`Snapshot::default`]. Saves go through a
/// temporary file and a rename so a crash never leaves a half-written store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl Store for JsonFileStore {
    fn load(&self) -> Result<Snapshot, CertifyError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No store at {}, starting fresh", self.path.display());
                return Ok(Snapshot::default());
            }
            Err(e) => {
                return Err(CertifyError::Store(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };
        serde_json::from_str(&text).map_err(|e| {
            CertifyError::Format(format!("Invalid store file {}: {}", self.path.display(), e))
        })
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), CertifyError> {
        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.tmp_path();
        std::fs::write(&tmp, json)
            .and_then(|()| std::fs::rename(&tmp, &self.path))
            .map_err(|e| {
                CertifyError::Store(format!("Failed to write {}: {}", self.path.display(), e))
            })?;
        log::debug!(
            "Saved {} projects to {}",
            snapshot.projects.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// In-process store, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Snapshot>,
}

impl MemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }
}

impl Store for MemoryStore {
    fn load(&self) -> Result<Snapshot, CertifyError> {
        self.snapshot
            .lock()
            .map(|s| s.clone())
            .map_err(|_| CertifyError::Store("memory store lock poisoned".into()))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), CertifyError> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| CertifyError::Store("memory store lock poisoned".into()))?;
        *guard = snapshot.clone();
        Ok(())
    }
}
