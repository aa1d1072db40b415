//! # Export
//!
//! Turns a selection of projects plus one set of fill values into a single
//! multi-page PDF. Pages are emitted in selection order; each project
//! contributes its front, then its back when the back has content. Every
//! page gets a fresh raster surface sized to its own project, so pages in
//! one document may differ in size and orientation.
//!
//! The output filename comes from the first selected project's pattern.

pub mod filename;
pub mod pdf;

pub use filename::{derive_filename, sanitize_filename};
pub use pdf::PdfAssembler;

use serde::Serialize;

use crate::error::CertifyError;
use crate::model::{FillValues, Orientation, Project, SideKind};
use crate::render::{FontBook, RenderContext, render_side_image};

/// Exporter settings.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Quality of the per-page JPEG, 1-100.
    pub jpeg_quality: u8,
    /// Used when the first project's filename pattern is empty.
    pub default_filename_pattern: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: 95,
            default_filename_pattern: filename::FALLBACK_PATTERN.to_string(),
        }
    }
}

/// One emitted page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub project_id: String,
    pub side: SideKind,
    pub width: u32,
    pub height: u32,
    pub orientation: Orientation,
}

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
    /// Pages in document order.
    pub pages: Vec<PageRecord>,
}

/// Pages `projects` produce, in document order.
pub fn page_plan<'a>(projects: &[&'a Project]) -> Vec<(&'a Project, SideKind)> {
    projects
        .iter()
        .flat_map(|project| {
            project
                .printable_sides()
                .into_iter()
                .map(move |side| (*project, side))
        })
        .collect()
}

pub struct Exporter<'a> {
    fonts: &'a FontBook,
    options: ExportOptions,
}

impl<'a> Exporter<'a> {
    pub fn new(fonts: &'a FontBook, options: ExportOptions) -> Self {
        Self { fonts, options }
    }

    /// Render and assemble every page. Returns `Ok(None)` for an empty
    /// selection.
    pub async fn export(
        &self,
        projects: &[&Project],
        values: &FillValues,
        ctx: &RenderContext<'_>,
    ) -> Result<Option<ExportedDocument>, CertifyError> {
        let Some(first) = projects.first() else {
            log::debug!("Export requested with no projects selected");
            return Ok(None);
        };

        let t0 = std::time::Instant::now();
        let filename = derive_filename(
            &first.filename_pattern,
            &self.options.default_filename_pattern,
            values,
            &ctx.lookups,
        );

        let plan = page_plan(projects);
        let mut assembler = PdfAssembler::new(self.options.jpeg_quality);
        let mut pages = Vec::with_capacity(plan.len());

        for (i, (project, side)) in plan.iter().enumerate() {
            let image = render_side_image(
                project.side(*side),
                project.width,
                project.height,
                values,
                self.fonts,
                ctx,
            )
            .await?;
            assembler.add_page(&image)?;
            log::info!(
                "Page {}/{}: {} ({}) {}x{}",
                i + 1,
                plan.len(),
                project.name,
                side,
                project.width,
                project.height
            );

            pages.push(PageRecord {
                project_id: project.id.clone(),
                side: *side,
                width: project.width,
                height: project.height,
                orientation: project.orientation(),
            });
        }

        let bytes = assembler.finish();
        log::info!(
            "Exported {} ({} pages, {} bytes) in {:.1}ms",
            filename,
            pages.len(),
            bytes.len(),
            t0.elapsed().as_secs_f64() * 1000.0
        );

        Ok(Some(ExportedDocument {
            bytes,
            filename,
            pages,
        }))
    }
}

/// Export with default options.
pub async fn export_document(
    projects: &[&Project],
    values: &FillValues,
    fonts: &FontBook,
    ctx: &RenderContext<'_>,
) -> Result<Option<ExportedDocument>, CertifyError> {
    Exporter::new(fonts, ExportOptions::default())
        .export(projects, values, ctx)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Element, ElementKind, ImageField, Lookups};
    use crate::render::testing::MemoryImages;
    use pretty_assertions::assert_eq;

    fn project(name: &str, width: u32, height: u32, back_bg: &str) -> Project {
        let mut p = Project::new(name);
        p.width = width;
        p.height = height;
        p.back.bg_url = back_bg.into();
        p
    }

    #[tokio::test]
    async fn test_empty_selection_produces_nothing() {
        let fonts = FontBook::empty();
        let images = MemoryImages::default();
        let ctx = RenderContext::new(Lookups::empty(), &images);
        let result = export_document(&[], &FillValues::new(), &fonts, &ctx).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_pages_follow_selection_then_front_back() {
        let fonts = FontBook::empty();
        let images = MemoryImages::default().with("back.png", 4, 4);
        let ctx = RenderContext::new(Lookups::empty(), &images);

        let with_back = project("Katılım", 200, 100, "back.png");
        let front_only = project("Başarı", 100, 150, "");

        let doc = export_document(&[&with_back, &front_only], &FillValues::new(), &fonts, &ctx)
            .await
            .unwrap()
            .unwrap();

        let order: Vec<_> = doc
            .pages
            .iter()
            .map(|p| (p.project_id.as_str(), p.side, p.orientation))
            .collect();
        assert_eq!(
            order,
            vec![
                (with_back.id.as_str(), SideKind::Front, Orientation::Landscape),
                (with_back.id.as_str(), SideKind::Back, Orientation::Landscape),
                (front_only.id.as_str(), SideKind::Front, Orientation::Portrait),
            ]
        );
        assert!(doc.bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_back_with_only_elements_is_printed() {
        let mut p = project("Arka", 50, 50, "");
        p.back.elements.push(Element {
            id: "logo".into(),
            label: None,
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            kind: ElementKind::Image(ImageField::default()),
        });
        assert_eq!(page_plan(&[&p]).len(), 2);
    }

    #[tokio::test]
    async fn test_filename_from_first_project_only() {
        let fonts = FontBook::empty();
        let images = MemoryImages::default();
        let ctx = RenderContext::new(Lookups::empty(), &images);

        let mut first = project("A", 20, 20, "");
        first.filename_pattern = "Sertifika-{Ad Soyad}".into();
        let mut second = project("B", 20, 20, "");
        second.filename_pattern = "Diger-{Ad Soyad}".into();

        let mut values = FillValues::new();
        values.insert("Ad Soyad", "Ali Veli");

        let doc = export_document(&[&first, &second], &values, &fonts, &ctx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.filename, "Sertifika-Ali Veli.pdf");
    }

    #[tokio::test]
    async fn test_empty_pattern_uses_configured_fallback() {
        let fonts = FontBook::empty();
        let images = MemoryImages::default();
        let ctx = RenderContext::new(Lookups::empty(), &images);
        let mut p = project("A", 20, 20, "");
        p.filename_pattern.clear();

        let options = ExportOptions {
            default_filename_pattern: "Belge".into(),
            ..Default::default()
        };
        let doc = Exporter::new(&fonts, options)
            .export(&[&p], &FillValues::new(), &ctx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.filename, "Belge.pdf");
    }

    #[tokio::test]
    async fn test_unacquirable_surface_aborts() {
        let fonts = FontBook::empty();
        let images = MemoryImages::default();
        let ctx = RenderContext::new(Lookups::empty(), &images);
        let p = project("Sıfır", 0, 100, "");

        let result = export_document(&[&p], &FillValues::new(), &fonts, &ctx).await;
        assert!(matches!(result, Err(CertifyError::Surface(_))));
    }
}
