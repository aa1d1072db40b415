//! Drawing surfaces.
//!
//! [`Surface`] is the small set of operations the side renderer needs. The
//! production implementation, [`RasterSurface`], paints into an RGBA buffer
//! and rasterises text with `ab_glyph`.

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont};
use image::imageops::{self, FilterType};
use image::{Pixel, Rgba, RgbaImage};
use std::borrow::Cow;

use super::color::WHITE;
use super::fonts::{FontBook, FontSpec};
use crate::error::CertifyError;
use crate::model::{Rect, TextAlign};

/// Largest surface accepted, in pixels. Also caps every intermediate raster
/// (a scaled image, a QR bitmap, a glyph) drawn onto a surface.
pub const MAX_PIXELS: u64 = 100_000_000;

/// Whether a raster of `width` × `height` pixels (rounded, at least 1) stays
/// within [`MAX_PIXELS`]. Non-finite sizes never fit.
pub fn raster_fits(width: f32, height: f32) -> bool {
    let w = f64::from(width.round().max(1.0));
    let h = f64::from(height.round().max(1.0));
    w * h <= MAX_PIXELS as f64
}

pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>);

    /// Draw `image` stretched to `rect`, alpha-blended over what is there.
    fn draw_image(&mut self, image: &RgbaImage, rect: Rect);

    /// Select the font used by [`measure_text`](Surface::measure_text) and
    /// [`fill_text`](Surface::fill_text).
    fn set_font(&mut self, font: &FontSpec);

    /// Advance width of `text` in the current font.
    fn measure_text(&self, text: &str) -> f32;

    /// Draw one line with its top edge at `y`. `x` is the left edge, centre or
    /// right edge of the line depending on `align`.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, align: TextAlign, color: Rgba<u8>);
}

/// RGBA raster surface backed by fonts from a [`FontBook`].
pub struct RasterSurface<'a> {
    image: RgbaImage,
    fonts: &'a FontBook,
    font: Option<FontArc>,
    font_size: f32,
}

impl<'a> RasterSurface<'a> {
    /// A fully transparent surface of `width` × `height` pixels.
    pub fn new(width: u32, height: u32, fonts: &'a FontBook) -> Result<Self, CertifyError> {
        if width == 0 || height == 0 {
            return Err(CertifyError::Surface(format!(
                "surface size {}x{} is empty",
                width, height
            )));
        }
        if u64::from(width) * u64::from(height) > MAX_PIXELS {
            return Err(CertifyError::Surface(format!(
                "surface size {}x{} is too large",
                width, height
            )));
        }
        Ok(Self {
            image: RgbaImage::new(width, height),
            fonts,
            font: None,
            font_size: 0.0,
        })
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Glyphs of `text` with their x offsets, and the total advance.
    fn layout(&self, text: &str) -> Option<(Vec<(GlyphId, f32)>, f32, PxScale)> {
        let font = self.font.as_ref()?;
        let scale = em_scale(font, self.font_size);
        let scaled = font.as_scaled(scale);

        let mut glyphs = Vec::with_capacity(text.len());
        let mut caret = 0.0f32;
        let mut previous: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            glyphs.push((id, caret));
            caret += scaled.h_advance(id);
            previous = Some(id);
        }
        Some((glyphs, caret, scale))
    }
}

/// Scale at which the font's em square is `size` pixels tall.
///
/// `ab_glyph` scales by ascent-to-descent height, CSS sizes by the em.
fn em_scale(font: &FontArc, size: f32) -> PxScale {
    let height = font.height_unscaled();
    match font.units_per_em() {
        Some(upem) if height > 0.0 => PxScale::from(size * height / upem),
        _ => PxScale::from(size),
    }
}

impl Surface for RasterSurface<'_> {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        let (w, h) = self.image.dimensions();
        let x0 = rect.x.round().clamp(0.0, w as f32) as u32;
        let y0 = rect.y.round().clamp(0.0, h as f32) as u32;
        let x1 = (rect.x + rect.width).round().clamp(0.0, w as f32) as u32;
        let y1 = (rect.y + rect.height).round().clamp(0.0, h as f32) as u32;

        for y in y0..y1 {
            for x in x0..x1 {
                if color[3] == 255 {
                    self.image.put_pixel(x, y, color);
                } else {
                    self.image.get_pixel_mut(x, y).blend(&color);
                }
            }
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, rect: Rect) {
        if !raster_fits(rect.width, rect.height) {
            log::warn!(
                "Not drawing {}x{} image: scaled raster would be too large",
                rect.width,
                rect.height
            );
            return;
        }
        let w = rect.width.round().max(1.0) as u32;
        let h = rect.height.round().max(1.0) as u32;
        let scaled: Cow<'_, RgbaImage> = if image.dimensions() == (w, h) {
            Cow::Borrowed(image)
        } else {
            Cow::Owned(imageops::resize(image, w, h, FilterType::Triangle))
        };
        imageops::overlay(
            &mut self.image,
            scaled.as_ref(),
            rect.x.round() as i64,
            rect.y.round() as i64,
        );
    }

    fn set_font(&mut self, font: &FontSpec) {
        self.font = self.fonts.select(font);
        self.font_size = font.size;
        if self.font.is_none() {
            log::debug!("No font available for '{}', text will not be drawn", font.family);
        }
    }

    fn measure_text(&self, text: &str) -> f32 {
        self.layout(text).map_or(0.0, |(_, width, _)| width)
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, align: TextAlign, color: Rgba<u8>) {
        let Some((glyphs, width, scale)) = self.layout(text) else {
            return;
        };
        let Some(font) = self.font.clone() else {
            return;
        };

        let start_x = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - width / 2.0,
            TextAlign::Right => x - width,
        };
        let baseline_y = y + font.as_scaled(scale).ascent();
        let (w, h) = self.image.dimensions();

        for (id, offset) in glyphs {
            let glyph = id.with_scale_and_position(scale, ab_glyph::point(start_x + offset, baseline_y));
            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            if !raster_fits(bounds.width(), bounds.height()) {
                log::warn!("Not drawing glyph at font size {}: too large", self.font_size);
                return;
            }
            outlined.draw(|px, py, coverage| {
                let gx = px as i32 + bounds.min.x as i32;
                let gy = py as i32 + bounds.min.y as i32;
                if gx < 0 || gy < 0 || gx >= w as i32 || gy >= h as i32 {
                    return;
                }
                let alpha = (f32::from(color[3]) * coverage.clamp(0.0, 1.0)).round() as u8;
                if alpha == 0 {
                    return;
                }
                let ink = Rgba([color[0], color[1], color[2], alpha]);
                self.image.get_pixel_mut(gx as u32, gy as u32).blend(&ink);
            });
        }
    }
}

/// Composite `image` over opaque white, dropping the alpha channel.
pub fn flatten_on_white(image: &RgbaImage) -> image::RgbImage {
    let mut flat = image::RgbImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let mut bg = WHITE;
        bg.blend(pixel);
        flat.put_pixel(x, y, bg.to_rgb());
    }
    flat
}

/// Encode a rendered side as PNG, keeping transparency.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CertifyError> {
    use image::ImageEncoder;

    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e: image::ImageError| CertifyError::Image(format!("PNG encoding failed: {}", e)))?;

    Ok(png_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::color::{BLACK, TRANSPARENT};

    #[test]
    fn test_png_round_trip_dimensions() {
        let png = encode_png(&RgbaImage::from_pixel(7, 3, BLACK)).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (7, 3));
    }

    #[test]
    fn test_rejects_empty_and_huge_sizes() {
        let fonts = FontBook::empty();
        assert!(RasterSurface::new(0, 10, &fonts).is_err());
        assert!(RasterSurface::new(10, 0, &fonts).is_err());
        assert!(RasterSurface::new(20_000, 20_000, &fonts).is_err());
        assert!(RasterSurface::new(2000, 1414, &fonts).is_ok());
    }

    #[test]
    fn test_raster_fits() {
        assert!(raster_fits(10_000.0, 10_000.0));
        assert!(!raster_fits(10_001.0, 10_000.0));
        assert!(!raster_fits(300_000.0, 300_000.0));
        assert!(!raster_fits(f32::INFINITY, 1.0));
        assert!(raster_fits(0.0, -5.0));
    }

    #[test]
    fn test_oversized_image_rect_is_not_drawn() {
        let fonts = FontBook::empty();
        let mut surface = RasterSurface::new(10, 10, &fonts).unwrap();
        let red = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 255]));
        surface.draw_image(&red, Rect::new(0.0, 0.0, 300_000.0, 300_000.0));
        assert!(surface.image().pixels().all(|p| *p == TRANSPARENT));

        surface.draw_image(&red, Rect::new(2.0, 2.0, 3.0, 3.0));
        assert_eq!(*surface.image().get_pixel(3, 3), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_new_surface_is_transparent() {
        let fonts = FontBook::empty();
        let surface = RasterSurface::new(4, 4, &fonts).unwrap();
        assert!(surface.image().pixels().all(|p| *p == TRANSPARENT));
    }

    #[test]
    fn test_fill_rect_is_clipped() {
        let fonts = FontBook::empty();
        let mut surface = RasterSurface::new(10, 10, &fonts).unwrap();
        surface.fill_rect(Rect::new(5.0, 5.0, 100.0, 100.0), BLACK);

        let image = surface.into_image();
        assert_eq!(*image.get_pixel(4, 4), TRANSPARENT);
        assert_eq!(*image.get_pixel(5, 5), BLACK);
        assert_eq!(*image.get_pixel(9, 9), BLACK);
    }

    #[test]
    fn test_draw_image_stretches_into_rect() {
        let fonts = FontBook::empty();
        let mut surface = RasterSurface::new(10, 10, &fonts).unwrap();
        surface.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), WHITE);

        let red = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 255]));
        surface.draw_image(&red, Rect::new(2.0, 2.0, 4.0, 3.0));

        let image = surface.into_image();
        assert_eq!(*image.get_pixel(2, 2), Rgba([255, 0, 0, 255]));
        assert_eq!(*image.get_pixel(5, 4), Rgba([255, 0, 0, 255]));
        assert_eq!(*image.get_pixel(6, 4), WHITE);
        assert_eq!(*image.get_pixel(2, 5), WHITE);
    }

    #[test]
    fn test_transparent_image_keeps_background() {
        let fonts = FontBook::empty();
        let mut surface = RasterSurface::new(4, 4, &fonts).unwrap();
        surface.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), WHITE);
        surface.draw_image(&RgbaImage::new(4, 4), Rect::new(0.0, 0.0, 4.0, 4.0));
        assert!(surface.image().pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn test_text_without_fonts_is_a_no_op() {
        let fonts = FontBook::empty();
        let mut surface = RasterSurface::new(50, 20, &fonts).unwrap();
        surface.set_font(&FontSpec {
            family: "serif".into(),
            size: 12.0,
            weight: 400,
            italic: false,
        });
        assert_eq!(surface.measure_text("Ali Veli"), 0.0);
        surface.fill_text("Ali Veli", 25.0, 0.0, TextAlign::Center, BLACK);
        assert!(surface.image().pixels().all(|p| *p == TRANSPARENT));
    }

    #[test]
    fn test_flatten_on_white() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(1, 0, BLACK);
        let flat = flatten_on_white(&image);
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(flat.get_pixel(1, 0).0, [0, 0, 0]);
    }
}
