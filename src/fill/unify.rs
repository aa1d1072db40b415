//! Cross-template field unification.
//!
//! Several projects can be filled in one pass. Fillable elements that share a
//! label become one [`UnifiedField`] so the user enters each value once.

use serde::Serialize;
use std::collections::HashMap;

use crate::model::{ElementKind, Project, SavedSignature};

use super::resolve::SHORT_NAME_SUFFIX;

/// Kinds that produce an input in the fill form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldKind {
    Text,
    Dropdown,
    Company,
    Signature,
}

impl FieldKind {
    /// The fill-form kind for an element, or `None` for QR codes and images.
    pub fn of(kind: &ElementKind) -> Option<Self> {
        match kind {
            ElementKind::Text(_) => Some(FieldKind::Text),
            ElementKind::Dropdown(_) => Some(FieldKind::Dropdown),
            ElementKind::Company(_) => Some(FieldKind::Company),
            ElementKind::Signature(_) => Some(FieldKind::Signature),
            ElementKind::QrCode(_) | ElementKind::Image(_) => None,
        }
    }
}

/// One input of the merged fill form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedField {
    /// Join key: the shared label, or the element id for unlabelled elements.
    pub label: String,
    /// Kind of the first declaration seen.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Union of the signature allow-lists. Empty means unrestricted.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_signature_ids: Vec<String>,
    /// Union of the dropdown options, first-seen order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl UnifiedField {
    pub fn permits_signature(&self, signature_id: &str) -> bool {
        self.allowed_signature_ids.is_empty()
            || self.allowed_signature_ids.iter().any(|id| id == signature_id)
    }

    /// Saved signatures selectable for this field.
    pub fn allowed_signatures<'a>(&self, all: &'a [SavedSignature]) -> Vec<&'a SavedSignature> {
        all.iter().filter(|s| self.permits_signature(&s.id)).collect()
    }
}

/// Merge the fillable fields of `projects` (selection order, front before
/// back, paint order within a side).
///
/// A key seen again with the same kind widens the first field's allow-list
/// and option list. A key seen again with a different kind is ignored: the
/// first declaration wins.
pub fn unify_fields<'a>(projects: impl IntoIterator<Item = &'a Project>) -> Vec<UnifiedField> {
    let mut fields: Vec<UnifiedField> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let none: &[String] = &[];

    for project in projects {
        for element in project.elements() {
            let Some(kind) = FieldKind::of(&element.kind) else {
                continue;
            };
            let (signature_ids, options) = match &element.kind {
                ElementKind::Signature(s) => (s.allowed_signature_ids.as_slice(), none),
                ElementKind::Dropdown(d) => (none, d.options.as_slice()),
                _ => (none, none),
            };
            let key = element.join_key();

            match index.get(key).copied() {
                None => {
                    index.insert(key.to_string(), fields.len());
                    let mut field = UnifiedField {
                        label: key.to_string(),
                        kind,
                        allowed_signature_ids: Vec::new(),
                        options: Vec::new(),
                    };
                    extend_unique(&mut field.allowed_signature_ids, signature_ids);
                    extend_unique(&mut field.options, options);
                    fields.push(field);
                }
                Some(i) => {
                    let field = &mut fields[i];
                    if field.kind != kind {
                        continue;
                    }
                    extend_unique(&mut field.allowed_signature_ids, signature_ids);
                    extend_unique(&mut field.options, options);
                }
            }
        }
    }

    fields
}

fn extend_unique(target: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

/// Labels a filename pattern of `project` can reference: text, dropdown and
/// signature labels, plus `Label` and `Label_Kisa` for company fields.
pub fn project_labels(project: &Project) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    let mut push = |label: String| {
        if !labels.contains(&label) {
            labels.push(label);
        }
    };

    for element in project.elements() {
        let Some(label) = element.label() else {
            continue;
        };
        match element.kind {
            ElementKind::Text(_) | ElementKind::Dropdown(_) | ElementKind::Signature(_) => {
                push(label.to_string());
            }
            ElementKind::Company(_) => {
                push(label.to_string());
                push(format!("{}{}", label, SHORT_NAME_SUFFIX));
            }
            ElementKind::QrCode(_) | ElementKind::Image(_) => {}
        }
    }

    labels
}
