//! Render context: shared resources available while drawing a side.
//!
//! The renderer itself is pure with respect to the template. Everything it
//! needs from the outside world (saved signatures and companies for
//! placeholder lookups, a way to fetch images) travels in a `RenderContext`.

use super::images::ImageSource;
use super::qr::QrOptions;
use crate::model::Lookups;

pub struct RenderContext<'a> {
    pub lookups: Lookups<'a>,
    pub images: &'a dyn ImageSource,
    /// QR settings applied to every QR element; size comes from the element.
    pub qr: QrOptions,
}

impl<'a> RenderContext<'a> {
    pub fn new(lookups: Lookups<'a>, images: &'a dyn ImageSource) -> Self {
        Self {
            lookups,
            images,
            qr: QrOptions::default(),
        }
    }
}
