//! HTTP handlers for the server.

pub mod backup;
pub mod fill;
pub mod projects;
pub mod render;

use axum::http::StatusCode;
use std::sync::Arc;

use crate::error::CertifyError;
use crate::store::{Snapshot, Store};

/// Error half of every handler's result.
pub type ApiError = (StatusCode, String);

/// Map a library error onto an HTTP status.
pub fn api_error(e: CertifyError) -> ApiError {
    let status = match e {
        CertifyError::NotFound(_) => StatusCode::NOT_FOUND,
        CertifyError::Format(_) | CertifyError::InvalidArgument(_) | CertifyError::Json(_) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

/// Load the store off the async runtime.
pub async fn load_snapshot(store: &Arc<dyn Store>) -> Result<Snapshot, ApiError> {
    let store = store.clone();
    tokio::task::spawn_blocking(move || store.load())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task error: {}", e)))?
        .map_err(api_error)
}

/// Save a snapshot off the async runtime.
pub async fn save_snapshot(store: &Arc<dyn Store>, snapshot: Snapshot) -> Result<(), ApiError> {
    let store = store.clone();
    tokio::task::spawn_blocking(move || store.save(&snapshot))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task error: {}", e)))?
        .map_err(api_error)
}

/// `Content-Disposition` value for a download, with an ASCII fallback name
/// and the exact UTF-8 name in `filename*`.
pub fn attachment(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| if c.is_ascii() && c != '"' && c != '\\' { c } else { '_' })
        .collect();
    let mut encoded = String::with_capacity(filename.len() * 3);
    for b in filename.bytes() {
        if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{:02X}", b));
        }
    }
    format!("attachment; filename=\"{}\"; filename*=UTF-8''{}", ascii, encoded)
}
