//! # Error Types
//!
//! This module defines error types used throughout the procertify library.
//!
//! Only conditions that abort a whole operation become a [`CertifyError`].
//! Per-element failures while drawing a page (an image that will not decode,
//! a QR payload that will not encode) are logged and skipped by the renderer.

use thiserror::Error;

/// Main error type for procertify operations
#[derive(Debug, Error)]
pub enum CertifyError {
    /// Malformed backup or template JSON
    #[error("Format error: {0}")]
    Format(String),

    /// Image fetch or decode error
    #[error("Image error: {0}")]
    Image(String),

    /// QR code encoding error
    #[error("QR error: {0}")]
    Qr(String),

    /// The drawing surface for a page could not be acquired
    #[error("Surface error: {0}")]
    Surface(String),

    /// Output document assembly error
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Persistent store load/save error
    #[error("Store error: {0}")]
    Store(String),

    /// A referenced project does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid caller input (CLI flags, request bodies)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
