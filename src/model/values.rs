//! Fill values and the read-only lookup tables used while resolving them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::types::{Company, SavedSignature};

/// Prefix that marks a value as embedded image data rather than text.
const DATA_REFERENCE_PREFIX: &str = "data:";

/// True when `value` is an embedded image payload (a `data:` URL).
pub fn is_data_reference(value: &str) -> bool {
    value.starts_with(DATA_REFERENCE_PREFIX)
}

/// Label → value bindings for one fill session, shared by every selected
/// project. Empty strings count as "not filled".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FillValues(HashMap<String, String>);

impl FillValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.0.insert(label.into(), value.into());
    }

    /// The bound value, or `None` when unbound or bound to an empty string.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.0
            .get(label)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FillValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Signature and company tables consulted by the resolver.
#[derive(Debug, Clone, Copy)]
pub struct Lookups<'a> {
    pub signatures: &'a [SavedSignature],
    pub companies: &'a [Company],
}

impl<'a> Lookups<'a> {
    pub fn new(signatures: &'a [SavedSignature], companies: &'a [Company]) -> Self {
        Self {
            signatures,
            companies,
        }
    }

    pub fn empty() -> Lookups<'static> {
        Lookups {
            signatures: &[],
            companies: &[],
        }
    }

    /// The saved signature whose image data is exactly `data`.
    pub fn signature_by_data(&self, data: &str) -> Option<&'a SavedSignature> {
        self.signatures.iter().find(|s| s.url == data)
    }

    /// The company whose full name is exactly `name`.
    pub fn company_by_name(&self, name: &str) -> Option<&'a Company> {
        self.companies.iter().find(|c| c.name == name)
    }
}
