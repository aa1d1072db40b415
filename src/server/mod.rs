//! # HTTP Server
//!
//! JSON API over the store, the field unifier, the renderer and the
//! exporter.
//!
//! ## Usage
//!
//! ```bash
//! procertify --store procertify.json serve --listen 0.0.0.0:8080
//! ```
//!
//! | Route | |
//! |---|---|
//! | `GET /api/projects` | project summaries |
//! | `POST /api/fields` | merged fill form for `{projectIds}` |
//! | `POST /api/preview` | PNG of `{projectId, side, values}` |
//! | `POST /api/export` | PDF of `{projectIds, values}` |
//! | `GET /api/backup` | backup download |
//! | `POST /api/backup` | restore from a backup |

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;

use crate::error::CertifyError;

/// Uploads carry inline images; allow large bodies.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Build the router over `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/projects", get(handlers::projects::list))
        .route("/api/fields", post(handlers::fill::fields))
        .route("/api/preview", post(handlers::render::preview))
        .route("/api/export", post(handlers::render::export))
        .route(
            "/api/backup",
            get(handlers::backup::download).post(handlers::backup::restore),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use procertify::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), procertify::error::CertifyError> {
/// let config = ServerConfig {
///     listen_addr: "127.0.0.1:8080".to_string(),
///     store_path: "procertify.json".into(),
///     font_dirs: vec![],
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), CertifyError> {
    let app_state = Arc::new(AppState::new(config.clone())?);
    let app = router(app_state);

    log::info!("procertify HTTP server starting");
    log::info!("Listening on: {}", config.listen_addr);
    log::info!("Store: {}", config.store_path.display());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            CertifyError::InvalidArgument(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    axum::serve(listener, app).await?;

    Ok(())
}
