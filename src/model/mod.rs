//! # Template Data Model
//!
//! Projects (certificate templates), their two sides, and the positioned
//! elements on each side, plus the per-session fill values and the
//! signature/company tables the resolver reads.
//!
//! ```
//! use procertify::model::{FillValues, Project};
//!
//! let project = Project::new("Kurs Sertifikası");
//! let mut values = FillValues::new();
//! values.insert("Ad Soyad", "Ali Veli");
//! assert_eq!(project.front.elements[0].join_key(), "Ad Soyad");
//! ```

pub mod types;
mod values;

pub use types::*;
pub use values::{FillValues, Lookups, is_data_reference};
