//! Server state and configuration.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::CertifyError;
use crate::render::{FontBook, ImageLoader};
use crate::store::{JsonFileStore, Store};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// JSON store file holding projects, signatures and companies
    pub store_path: PathBuf,
    /// Extra font directories, searched before the system ones
    pub font_dirs: Vec<PathBuf>,
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<dyn Store>,
    pub fonts: FontBook,
    /// Image loader with a cache shared across requests.
    pub images: ImageLoader,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self, CertifyError> {
        let store: Arc<dyn Store> = Arc::new(JsonFileStore::new(config.store_path.clone()));
        let fonts = FontBook::discover(&config.font_dirs);
        let images = ImageLoader::new()?;
        Ok(Self::with_parts(config, store, fonts, images))
    }

    pub fn with_parts(
        config: ServerConfig,
        store: Arc<dyn Store>,
        fonts: FontBook,
        images: ImageLoader,
    ) -> Self {
        Self {
            config,
            store,
            fonts,
            images,
        }
    }
}
