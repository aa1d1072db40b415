//! Font discovery and selection.
//!
//! Faces are indexed by family name (name table ID 1), weight class and
//! italic flag, read with `ttf-parser`. Font bytes are loaded lazily on first
//! use and kept as `ab_glyph::FontArc` for measuring and rasterising.

use ab_glyph::{FontArc, FontVec};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use ttf_parser::Face;

use crate::error::CertifyError;

/// Real families tried, in order, for the CSS generic family names.
const GENERIC_FAMILIES: &[(&str, &[&str])] = &[
    (
        "serif",
        &["dejavu serif", "liberation serif", "noto serif", "times new roman", "georgia"],
    ),
    (
        "sans-serif",
        &["dejavu sans", "liberation sans", "noto sans", "arial", "helvetica"],
    ),
    (
        "monospace",
        &["dejavu sans mono", "liberation mono", "noto sans mono", "courier new"],
    ),
    ("cursive", &["comic sans ms", "z003", "urw chancery l"]),
];

/// Requested font: first CSS family, pixel size, weight, slant.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    pub weight: u16,
    pub italic: bool,
}

impl FontSpec {
    pub fn from_style(style: &crate::model::TextStyle) -> Self {
        Self {
            family: style.font_family.clone(),
            size: style.font_size,
            weight: style.font_weight,
            italic: style.is_italic(),
        }
    }
}

#[derive(Debug, Clone)]
struct FaceEntry {
    path: PathBuf,
    index: u32,
    weight: u16,
    italic: bool,
}

/// Index of available font faces.
#[derive(Default)]
pub struct FontBook {
    families: HashMap<String, Vec<FaceEntry>>,
    loaded: Mutex<HashMap<(PathBuf, u32), FontArc>>,
}

impl FontBook {
    /// A book with no faces. Text measures as zero width and draws nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Index `extra_dirs` followed by the platform font directories.
    pub fn discover(extra_dirs: &[PathBuf]) -> Self {
        let t0 = std::time::Instant::now();
        let mut book = Self::empty();
        let dirs = extra_dirs.iter().cloned().chain(system_font_dirs());
        for dir in dirs {
            book.add_dir(&dir);
        }
        log::info!(
            "Indexed {} font families in {:.1}ms",
            book.families.len(),
            t0.elapsed().as_secs_f64() * 1000.0
        );
        book
    }

    /// Recursively index every font file under `dir`. Unreadable files are skipped.
    pub fn add_dir(&mut self, dir: &Path) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                self.add_dir(&path);
            } else if is_font_file(&path)
                && let Err(e) = self.add_file(&path)
            {
                log::debug!("Skipping font {}: {}", path.display(), e);
            }
        }
    }

    /// Index every face in one font file; returns how many were added.
    pub fn add_file(&mut self, path: &Path) -> Result<usize, CertifyError> {
        let data = std::fs::read(path)?;
        let count = ttf_parser::fonts_in_collection(&data).unwrap_or(1);
        let mut added = 0;

        for index in 0..count {
            let Ok(face) = Face::parse(&data, index) else {
                continue;
            };
            let Some(family) = family_name(&face) else {
                continue;
            };
            self.families
                .entry(normalize_family(&family))
                .or_default()
                .push(FaceEntry {
                    path: path.to_path_buf(),
                    index,
                    weight: face.weight().to_number(),
                    italic: face.is_italic(),
                });
            added += 1;
        }

        if added == 0 {
            return Err(CertifyError::InvalidArgument(format!(
                "no usable faces in {}",
                path.display()
            )));
        }
        Ok(added)
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Indexed family names (normalized), sorted.
    pub fn families(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.families.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Best face for `spec`: the requested family (or its generic
    /// substitutes), then the generic sans-serif list, then any family.
    /// Within a family the slant must match if possible, then the closest
    /// weight wins.
    pub fn select(&self, spec: &FontSpec) -> Option<FontArc> {
        let family = normalize_family(first_family(&spec.family));
        let faces = self.family_faces(&family).or_else(|| {
            log::debug!("Font family '{}' not found, falling back", family);
            self.family_faces("sans-serif").or_else(|| {
                self.families()
                    .first()
                    .and_then(|name| self.families.get(*name))
            })
        })?;

        let entry = faces.iter().min_by_key(|f| {
            let slant_penalty = if f.italic == spec.italic { 0 } else { 1000 };
            slant_penalty + (i32::from(f.weight) - i32::from(spec.weight)).unsigned_abs()
        })?;
        self.load(entry)
    }

    fn family_faces(&self, family: &str) -> Option<&Vec<FaceEntry>> {
        if let Some(faces) = self.families.get(family) {
            return Some(faces);
        }
        GENERIC_FAMILIES
            .iter()
            .find(|(generic, _)| *generic == family)
            .and_then(|(_, candidates)| {
                candidates.iter().find_map(|name| self.families.get(*name))
            })
    }

    fn load(&self, entry: &FaceEntry) -> Option<FontArc> {
        let key = (entry.path.clone(), entry.index);
        let mut loaded = self.loaded.lock().ok()?;
        if let Some(font) = loaded.get(&key) {
            return Some(font.clone());
        }

        let data = match std::fs::read(&entry.path) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Failed to read font {}: {}", entry.path.display(), e);
                return None;
            }
        };
        match FontVec::try_from_vec_and_index(data, entry.index) {
            Ok(font) => {
                let font = FontArc::new(font);
                loaded.insert(key, font.clone());
                Some(font)
            }
            Err(e) => {
                log::warn!("Failed to load font {}: {}", entry.path.display(), e);
                None
            }
        }
    }
}

/// First entry of a CSS family list, without quotes.
fn first_family(css: &str) -> &str {
    css.split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .trim()
}

fn normalize_family(family: &str) -> String {
    family.trim().to_lowercase()
}

fn family_name(face: &Face) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|name| name.name_id == ttf_parser::name_id::FAMILY && name.is_unicode())
        .find_map(|name| name.to_string())
}

fn is_font_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("ttf" | "otf" | "ttc")
    )
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    #[cfg(target_os = "linux")]
    {
        dirs.extend(["/usr/share/fonts".into(), "/usr/local/share/fonts".into()]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/Library/Fonts".into(),
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        match std::env::var("WINDIR") {
            Ok(windir) => dirs.push(PathBuf::from(windir).join("Fonts")),
            Err(_) => dirs.push("C:\\Windows\\Fonts".into()),
        }
    }

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_family_strips_quotes_and_fallbacks() {
        assert_eq!(first_family("'Playfair Display', serif"), "Playfair Display");
        assert_eq!(first_family("\"Great Vibes\", cursive"), "Great Vibes");
        assert_eq!(first_family("serif"), "serif");
        assert_eq!(first_family(""), "");
    }

    #[test]
    fn test_empty_book_selects_nothing() {
        let book = FontBook::empty();
        assert!(book.is_empty());
        let spec = FontSpec {
            family: "serif".into(),
            size: 20.0,
            weight: 400,
            italic: false,
        };
        assert!(book.select(&spec).is_none());
    }

    #[test]
    fn test_non_font_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();

        let mut book = FontBook::empty();
        assert!(book.add_file(&path).is_err());
        book.add_dir(dir.path());
        assert!(book.is_empty());
    }

    #[test]
    fn test_font_files_by_extension() {
        assert!(is_font_file(Path::new("a/DejaVuSans.ttf")));
        assert!(is_font_file(Path::new("a/NotoSerif.OTF")));
        assert!(is_font_file(Path::new("a/collection.ttc")));
        assert!(!is_font_file(Path::new("a/readme.txt")));
    }
}
