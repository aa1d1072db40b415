//! # Side Rendering
//!
//! Rasterises one side of a project: background first, then every element in
//! paint order.
//!
//! ## Modules
//!
//! - [`surface`]: the [`Surface`] drawing trait and the RGBA [`RasterSurface`]
//! - [`fonts`]: font discovery and selection
//! - [`images`]: image references (data URLs, remote URLs, files)
//! - [`qr`]: QR code bitmaps
//! - [`wrap`]: greedy word wrap
//! - [`color`]: CSS hex colours
//!
//! Failures of a single element (an image that will not decode, content too
//! long for a QR code) are logged and the element is skipped. Only failing to
//! acquire a surface aborts a render.

pub mod color;
pub mod context;
pub mod fonts;
pub mod images;
pub mod qr;
pub mod surface;
pub mod wrap;

pub use context::RenderContext;
pub use fonts::{FontBook, FontSpec};
pub use images::{ImageLoader, ImageSource};
pub use surface::{RasterSurface, Surface};

use image::RgbaImage;
use std::borrow::Cow;

use crate::error::CertifyError;
use crate::fill::resolve;
use crate::model::{
    Element, ElementKind, FillValues, Project, Rect, Side, SideKind, TextAlign, TextStyle,
};
use color::{WHITE, color_or_black};
use qr::{QrOptions, encode_qr};
use wrap::wrap_text;

/// Line advance as a multiple of the font size.
pub const LINE_HEIGHT: f32 = 1.2;

/// Paint `side` onto `surface`, which must already be sized to the project.
pub async fn render_side<S: Surface + Send>(
    surface: &mut S,
    side: &Side,
    values: &FillValues,
    ctx: &RenderContext<'_>,
) {
    let full = Rect::new(0.0, 0.0, surface.width() as f32, surface.height() as f32);
    match side.background() {
        Some(reference) => match ctx.images.load(reference).await {
            Ok(background) => surface.draw_image(&background.to_rgba8(), full),
            Err(e) => {
                log::debug!("Background unavailable, using white: {}", e);
                surface.fill_rect(full, WHITE);
            }
        },
        None => surface.fill_rect(full, WHITE),
    }

    for element in &side.elements {
        render_element(surface, element, values, ctx).await;
    }
}

/// Render `side` into a fresh `width` × `height` RGBA image.
pub async fn render_side_image(
    side: &Side,
    width: u32,
    height: u32,
    values: &FillValues,
    fonts: &FontBook,
    ctx: &RenderContext<'_>,
) -> Result<RgbaImage, CertifyError> {
    let mut surface = RasterSurface::new(width, height, fonts)?;
    render_side(&mut surface, side, values, ctx).await;
    Ok(surface.into_image())
}

/// Render one side of `project` and encode it as PNG.
pub async fn preview_png(
    project: &Project,
    side: SideKind,
    values: &FillValues,
    fonts: &FontBook,
    ctx: &RenderContext<'_>,
) -> Result<Vec<u8>, CertifyError> {
    let image = render_side_image(
        project.side(side),
        project.width,
        project.height,
        values,
        fonts,
        ctx,
    )
    .await?;
    surface::encode_png(&image)
}

/// What an element shows: QR patterns are resolved, everything else takes
/// the fill value bound to its key, falling back to the template default.
fn display_content<'a>(
    element: &'a Element,
    values: &'a FillValues,
    ctx: &RenderContext<'_>,
) -> Cow<'a, str> {
    match &element.kind {
        ElementKind::QrCode(field) => Cow::Owned(resolve(&field.content, values, &ctx.lookups)),
        kind => Cow::Borrowed(values.get(element.join_key()).unwrap_or(kind.content())),
    }
}

async fn render_element<S: Surface + Send>(
    surface: &mut S,
    element: &Element,
    values: &FillValues,
    ctx: &RenderContext<'_>,
) {
    let content = display_content(element, values, ctx);

    match &element.kind {
        ElementKind::QrCode(field) => draw_qr(surface, element, &field.style, &content, ctx),
        ElementKind::Signature(_) | ElementKind::Image(_) => {
            if content.is_empty() || !fits_on_raster(element, element.width, element.height) {
                return;
            }
            match ctx.images.load(&content).await {
                Ok(image) => surface.draw_image(&image.to_rgba8(), element.rect()),
                Err(e) => log::debug!(
                    "Skipping {} element {}: {}",
                    element.kind.type_name(),
                    element.id,
                    e
                ),
            }
        }
        kind => {
            if let Some(style) = kind.text_style() {
                draw_text(surface, element, style, &content);
            }
        }
    }
}

/// Elements drawn through an intermediate raster are skipped when that
/// raster would exceed [`MAX_PIXELS`](surface::MAX_PIXELS).
fn fits_on_raster(element: &Element, width: f32, height: f32) -> bool {
    if surface::raster_fits(width, height) {
        return true;
    }
    log::warn!(
        "Skipping {} element {}: {}x{} raster is too large",
        element.kind.type_name(),
        element.id,
        width,
        height
    );
    false
}

fn draw_text<S: Surface>(surface: &mut S, element: &Element, style: &TextStyle, content: &str) {
    surface.set_font(&FontSpec::from_style(style));
    let lines = wrap_text(content, element.width, |line| surface.measure_text(line));

    let anchor_x = match style.text_align {
        TextAlign::Left => element.x,
        TextAlign::Center => element.x + element.width / 2.0,
        TextAlign::Right => element.x + element.width,
    };
    let line_height = style.font_size * LINE_HEIGHT;
    let color = color_or_black(&style.color);

    for (i, line) in lines.iter().enumerate() {
        let y = element.y + i as f32 * line_height;
        surface.fill_text(line, anchor_x, y, style.text_align, color);
    }
}

fn draw_qr<S: Surface>(
    surface: &mut S,
    element: &Element,
    style: &TextStyle,
    content: &str,
    ctx: &RenderContext<'_>,
) {
    // The bitmap is square at the element's width, then scaled to its rect.
    let size = element.width.round().max(1.0);
    if !fits_on_raster(element, size, size) || !fits_on_raster(element, element.width, element.height) {
        return;
    }
    // The encoder rejects empty input; a lone space keeps the code scannable.
    let data = if content.is_empty() { " " } else { content };
    let options = QrOptions {
        size: size as u32,
        foreground: color_or_black(&style.color),
        ..ctx.qr
    };
    match encode_qr(data, &options) {
        Ok(bitmap) => surface.draw_image(&bitmap, element.rect()),
        Err(e) => log::warn!("Skipping {} element {}: {}", element.kind.type_name(), element.id, e),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Deterministic surface and image source for renderer tests.

    use super::*;
    use async_trait::async_trait;
    use image::{DynamicImage, Rgba};
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq)]
    pub enum DrawOp {
        Fill { rect: Rect, color: Rgba<u8> },
        Image { rect: Rect, size: (u32, u32) },
        Text { text: String, x: f32, y: f32, align: TextAlign, color: Rgba<u8> },
    }

    /// Records draw calls. Every character measures half the font size.
    pub struct RecordingSurface {
        pub width: u32,
        pub height: u32,
        pub ops: Vec<DrawOp>,
        pub fonts: Vec<FontSpec>,
        font_size: f32,
    }

    impl RecordingSurface {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                ops: Vec::new(),
                fonts: Vec::new(),
                font_size: 0.0,
            }
        }

        pub fn texts(&self) -> Vec<&str> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    DrawOp::Text { text, .. } => Some(text.as_str()),
                    _ => None,
                })
                .collect()
        }

        pub fn images(&self) -> Vec<Rect> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    DrawOp::Image { rect, .. } => Some(*rect),
                    _ => None,
                })
                .collect()
        }
    }

    impl Surface for RecordingSurface {
        fn width(&self) -> u32 {
            self.width
        }

        fn height(&self) -> u32 {
            self.height
        }

        fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
            self.ops.push(DrawOp::Fill { rect, color });
        }

        fn draw_image(&mut self, image: &RgbaImage, rect: Rect) {
            self.ops.push(DrawOp::Image {
                rect,
                size: image.dimensions(),
            });
        }

        fn set_font(&mut self, font: &FontSpec) {
            self.font_size = font.size;
            self.fonts.push(font.clone());
        }

        fn measure_text(&self, text: &str) -> f32 {
            text.chars().count() as f32 * self.font_size / 2.0
        }

        fn fill_text(&mut self, text: &str, x: f32, y: f32, align: TextAlign, color: Rgba<u8>) {
            self.ops.push(DrawOp::Text {
                text: text.to_string(),
                x,
                y,
                align,
                color,
            });
        }
    }

    /// Images keyed by reference; anything else fails to load.
    #[derive(Default)]
    pub struct MemoryImages {
        images: HashMap<String, RgbaImage>,
    }

    impl MemoryImages {
        pub fn with(mut self, reference: &str, width: u32, height: u32) -> Self {
            self.images.insert(
                reference.to_string(),
                RgbaImage::from_pixel(width, height, Rgba([0, 0, 255, 255])),
            );
            self
        }
    }

    #[async_trait]
    impl ImageSource for MemoryImages {
        async fn load(&self, reference: &str) -> Result<DynamicImage, CertifyError> {
            self.images
                .get(reference)
                .map(|image| DynamicImage::ImageRgba8(image.clone()))
                .ok_or_else(|| CertifyError::Image(format!("unknown image {}", reference)))
        }
    }
}
