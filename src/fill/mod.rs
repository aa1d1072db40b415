//! # Fill Pass
//!
//! Everything between "the user typed some values" and "the renderer draws
//! strings": placeholder resolution and the merged form schema for a
//! multi-template fill.

pub mod resolve;
pub mod unify;

pub use resolve::resolve;
pub use unify::{FieldKind, UnifiedField, project_labels, unify_fields};
