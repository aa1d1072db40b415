//! # procertify - Certificate Template Rendering and Export
//!
//! procertify fills reusable certificate templates and renders them into a
//! single PDF. It provides:
//!
//! - **Template model**: projects with a front and a back side, each a
//!   background plus positioned text, dropdown, company, signature, QR code
//!   and image elements
//! - **Placeholder resolution**: `{Label}` and `{Label_Kisa}` tokens
//! - **Field unification**: one fill form for several templates at once
//! - **Rendering**: word-wrapped text, QR codes and images on an RGBA raster
//! - **Export**: multi-page PDF assembly and filename derivation
//!
//! ## Quick Start
//!
//! ```no_run
//! use procertify::{
//!     export::export_document,
//!     model::FillValues,
//!     render::{FontBook, ImageLoader, RenderContext},
//!     store::{JsonFileStore, Store},
//! };
//!
//! # async fn example() -> Result<(), procertify::CertifyError> {
//! let snapshot = JsonFileStore::new("procertify.json").load()?;
//! let selected: Vec<_> = snapshot.projects.iter().collect();
//!
//! let mut values = FillValues::new();
//! values.insert("Ad Soyad", "Ali Veli");
//!
//! let fonts = FontBook::discover(&[]);
//! let images = ImageLoader::new()?;
//! let ctx = RenderContext::new(snapshot.lookups(), &images);
//!
//! if let Some(doc) = export_document(&selected, &values, &fonts, &ctx).await? {
//!     std::fs::write(&doc.filename, &doc.bytes)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`model`] | Projects, sides, elements, fill values |
//! | [`fill`] | Placeholder resolution and field unification |
//! | [`render`] | Side rasterisation and its collaborators |
//! | [`export`] | PDF export and filenames |
//! | [`store`] | Persistence and backups |
//! | [`server`] | HTTP API |
//! | [`error`] | Error types |

pub mod error;
pub mod export;
pub mod fill;
pub mod model;
pub mod render;
pub mod server;
pub mod store;

// Re-exports for convenience
pub use error::CertifyError;
pub use model::{FillValues, Project};
