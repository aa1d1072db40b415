//! PDF assembly: one full-bleed JPEG image per page.

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::RgbaImage;
use image::codecs::jpeg::JpegEncoder;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, TextStr};
use std::io::Write;

use crate::error::CertifyError;
use crate::render::surface::flatten_on_white;

/// PDF points per pixel (72 pt per inch at 96 px per inch).
pub const POINTS_PER_PIXEL: f32 = 0.75;

const IMAGE_NAME: &[u8] = b"Im1";

/// Accumulates rendered pages into a PDF document.
pub struct PdfAssembler {
    pdf: Pdf,
    next_id: i32,
    catalog_id: Ref,
    pages_id: Ref,
    page_ids: Vec<Ref>,
    jpeg_quality: u8,
}

impl PdfAssembler {
    pub fn new(jpeg_quality: u8) -> Self {
        let mut assembler = Self {
            pdf: Pdf::new(),
            next_id: 1,
            catalog_id: Ref::new(1),
            pages_id: Ref::new(1),
            page_ids: Vec::new(),
            jpeg_quality: jpeg_quality.clamp(1, 100),
        };
        assembler.catalog_id = assembler.alloc();
        assembler.pages_id = assembler.alloc();
        assembler
    }

    fn alloc(&mut self) -> Ref {
        let r = Ref::new(self.next_id);
        self.next_id += 1;
        r
    }

    /// Append a page the size of `image` (in points) showing `image` edge to edge.
    pub fn add_page(&mut self, image: &RgbaImage) -> Result<(), CertifyError> {
        let (px_w, px_h) = image.dimensions();
        let jpeg = encode_jpeg(image, self.jpeg_quality)?;

        let page_id = self.alloc();
        let content_id = self.alloc();
        let image_id = self.alloc();

        {
            let mut xobj = self.pdf.image_xobject(image_id, &jpeg);
            xobj.filter(Filter::DctDecode);
            xobj.width(px_w as i32);
            xobj.height(px_h as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
        }

        let w = px_w as f32 * POINTS_PER_PIXEL;
        let h = px_h as f32 * POINTS_PER_PIXEL;

        let mut content = Content::new();
        content.save_state();
        content.transform([w, 0.0, 0.0, h, 0.0, 0.0]);
        content.x_object(Name(IMAGE_NAME));
        content.restore_state();
        let compressed = compress(&content.finish())?;
        self.pdf
            .stream(content_id, &compressed)
            .filter(Filter::FlateDecode);

        let mut page = self.pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, w, h))
            .parent(self.pages_id)
            .contents(content_id);
        page.resources()
            .x_objects()
            .pair(Name(IMAGE_NAME), image_id);
        page.finish();

        self.page_ids.push(page_id);
        Ok(())
    }

    /// Write the page tree and catalog and return the file bytes.
    pub fn finish(mut self) -> Vec<u8> {
        let info_id = self.alloc();
        self.pdf
            .document_info(info_id)
            .producer(TextStr(concat!("procertify ", env!("CARGO_PKG_VERSION"))));
        self.pdf.catalog(self.catalog_id).pages(self.pages_id);
        self.pdf
            .pages(self.pages_id)
            .kids(self.page_ids.iter().copied())
            .count(self.page_ids.len() as i32);
        self.pdf.finish()
    }
}

fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, CertifyError> {
    let rgb = flatten_on_white(image);
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&rgb)
        .map_err(|e| CertifyError::Pdf(format!("JPEG encoding failed: {}", e)))?;
    Ok(out)
}

fn compress(data: &[u8]) -> Result<Vec<u8>, CertifyError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
