//! Template struct types.
//!
//! All types derive `Serialize + Deserialize` and keep the JSON shape the
//! editor stores: camelCase keys, element kind under `"type"`
//! (`"TEXT"`, `"QRCODE"`, ...), and the background reference under `bgUrl`
//! where an empty string means "no background".

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default page width for new projects (A-series landscape at ~240 DPI).
pub const DEFAULT_WIDTH: u32 = 2000;
/// Default page height for new projects.
pub const DEFAULT_HEIGHT: u32 = 1414;
/// Filename pattern given to new projects.
pub const DEFAULT_FILENAME_PATTERN: &str = "Sertifika-{Ad Soyad}";

/// Treats an explicit JSON `null` the same as a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Font weight: accepts a CSS number (`700`), a numeric string (`"700"`),
/// or the keywords `"normal"` / `"bold"`.
fn deserialize_font_weight<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WeightValue {
        Number(u16),
        Text(String),
    }

    match Option::<WeightValue>::deserialize(deserializer)? {
        None => Ok(default_font_weight()),
        Some(WeightValue::Number(n)) => Ok(n),
        Some(WeightValue::Text(s)) => match s.trim() {
            "normal" | "" => Ok(400),
            "bold" => Ok(700),
            other => other
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("invalid font weight '{}'", other))),
        },
    }
}

fn default_font_family() -> String {
    "sans-serif".into()
}

fn default_font_size() -> f32 {
    60.0
}

fn default_font_weight() -> u16 {
    400
}

fn default_color() -> String {
    "#000000".into()
}

// ============================================================================
// GEOMETRY
// ============================================================================

/// Axis-aligned rectangle in page pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// Page orientation derived from a project's pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// `Landscape` when strictly wider than tall, otherwise `Portrait`.
    pub fn for_size(width: u32, height: u32) -> Self {
        if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

// ============================================================================
// PROJECT & SIDES
// ============================================================================

/// One of the two printable faces of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideKind {
    Front,
    Back,
}

impl SideKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SideKind::Front => "front",
            SideKind::Back => "back",
        }
    }
}

impl fmt::Display for SideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SideKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front" => Ok(SideKind::Front),
            "back" => Ok(SideKind::Back),
            other => Err(format!("unknown side '{}' (expected front or back)", other)),
        }
    }
}

/// A certificate template: page size, filename pattern, and two sides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Creation time in milliseconds since the Unix epoch.
    #[serde(default)]
    pub created_at: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filename_pattern: String,
    #[serde(default)]
    pub front: Side,
    #[serde(default)]
    pub back: Side,
}

impl Project {
    /// Create a project with the editor's starter layout: one bold, centred
    /// name field on the front and an empty back.
    pub fn new(name: impl Into<String>) -> Self {
        let name_field = Element {
            id: "1".into(),
            label: Some("Ad Soyad".into()),
            x: 800.0,
            y: 600.0,
            width: 400.0,
            height: 100.0,
            kind: ElementKind::Text(TextField {
                content: "{AD SOYAD}".into(),
                style: TextStyle {
                    font_family: "serif".into(),
                    font_size: 80.0,
                    font_weight: 700,
                    ..Default::default()
                },
            }),
        };

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            created_at: chrono::Utc::now().timestamp_millis(),
            filename_pattern: DEFAULT_FILENAME_PATTERN.into(),
            front: Side {
                bg_url: String::new(),
                elements: vec![name_field],
            },
            back: Side::default(),
        }
    }

    /// Deep copy under a fresh id, named `"<name> (Kopya)"`.
    pub fn duplicate(&self) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: format!("{} (Kopya)", self.name),
            created_at: chrono::Utc::now().timestamp_millis(),
            ..self.clone()
        }
    }

    pub fn side(&self, kind: SideKind) -> &Side {
        match kind {
            SideKind::Front => &self.front,
            SideKind::Back => &self.back,
        }
    }

    /// Sides that produce a page: the front always, the back only when it
    /// has a background or at least one element.
    pub fn printable_sides(&self) -> Vec<SideKind> {
        if self.back.has_content() {
            vec![SideKind::Front, SideKind::Back]
        } else {
            vec![SideKind::Front]
        }
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::for_size(self.width, self.height)
    }

    /// All elements, front side first, each side in paint order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.front.elements.iter().chain(self.back.elements.iter())
    }
}

/// One face of a project: optional background plus elements in paint order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Side {
    #[serde(default, deserialize_with = "null_as_default")]
    pub bg_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub elements: Vec<Element>,
}

impl Side {
    /// The background image reference, if one is set.
    pub fn background(&self) -> Option<&str> {
        Some(self.bg_url.as_str()).filter(|s| !s.is_empty())
    }

    pub fn has_content(&self) -> bool {
        self.background().is_some() || !self.elements.is_empty()
    }
}

// ============================================================================
// ELEMENTS
// ============================================================================

/// A positioned field on a side. Common geometry lives here; everything
/// kind-specific lives in [`ElementKind`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    /// Cross-template join key used when filling several projects at once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    /// The label, ignoring empty strings.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref().filter(|l| !l.is_empty())
    }

    /// Key used to bind fill values: the label, or the element id for
    /// unlabelled elements (which therefore never merge with anything).
    pub fn join_key(&self) -> &str {
        self.label().unwrap_or(&self.id)
    }

    /// The template default (or pattern, for QR codes).
    pub fn content(&self) -> &str {
        self.kind.content()
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Element kinds. Serialized with the kind tag in `"type"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementKind {
    Text(TextField),
    Dropdown(DropdownField),
    Company(TextField),
    Signature(SignatureField),
    /// Content is a placeholder pattern resolved at render time.
    #[serde(rename = "QRCODE")]
    QrCode(TextField),
    Image(ImageField),
}

impl ElementKind {
    pub fn content(&self) -> &str {
        match self {
            ElementKind::Text(f) | ElementKind::Company(f) | ElementKind::QrCode(f) => &f.content,
            ElementKind::Dropdown(f) => &f.content,
            ElementKind::Signature(f) => &f.content,
            ElementKind::Image(f) => &f.content,
        }
    }

    /// Typographic attributes, for the kinds that carry them.
    pub fn text_style(&self) -> Option<&TextStyle> {
        match self {
            ElementKind::Text(f) | ElementKind::Company(f) | ElementKind::QrCode(f) => {
                Some(&f.style)
            }
            ElementKind::Dropdown(f) => Some(&f.style),
            ElementKind::Signature(_) | ElementKind::Image(_) => None,
        }
    }

    /// The serde tag, e.g. `"QRCODE"`.
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementKind::Text(_) => "TEXT",
            ElementKind::Dropdown(_) => "DROPDOWN",
            ElementKind::Company(_) => "COMPANY",
            ElementKind::Signature(_) => "SIGNATURE",
            ElementKind::QrCode(_) => "QRCODE",
            ElementKind::Image(_) => "IMAGE",
        }
    }
}

/// Text, company, and QR code elements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextField {
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(flatten)]
    pub style: TextStyle,
}

/// Dropdown element: a text field with a list of selectable values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DropdownField {
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<String>,
    #[serde(flatten)]
    pub style: TextStyle,
}

/// Signature element. An empty allow-list permits every saved signature.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureField {
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub allowed_signature_ids: Vec<String>,
}

/// Image element; `content` is an image reference (data URL, http URL, path).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageField {
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
}

/// Horizontal text alignment. Defaults to `Center`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// `fontStyle` in the template JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSlant {
    #[default]
    Normal,
    #[serde(alias = "oblique")]
    Italic,
}

/// Typographic attributes shared by text-like and QR elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    /// CSS-style family list; only the first entry is used.
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_font_weight", deserialize_with = "deserialize_font_weight")]
    pub font_weight: u16,
    #[serde(default)]
    pub font_style: FontSlant,
    /// CSS hex colour (`#rgb`, `#rrggbb`, `#rrggbbaa`).
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub text_align: TextAlign,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            font_size: default_font_size(),
            font_weight: default_font_weight(),
            font_style: FontSlant::Normal,
            color: default_color(),
            text_align: TextAlign::Center,
        }
    }
}

impl TextStyle {
    pub fn is_italic(&self) -> bool {
        self.font_style == FontSlant::Italic
    }
}

// ============================================================================
// LOOKUP TABLES
// ============================================================================

/// A saved signature; `url` holds the image data reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSignature {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// A company with an abbreviation used by `{Label_Kisa}` tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "CompanyRecord")]
pub struct Company {
    pub id: String,
    pub name: String,
    pub short_name: String,
}

impl Company {
    /// Build a company; an empty short name falls back to the full name.
    pub fn new(name: impl Into<String>, short_name: impl Into<String>) -> Self {
        let name = name.into();
        let short_name = Some(short_name.into())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| name.clone());
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            short_name,
        }
    }
}

/// Stored company shapes: current records, or the older plain-name strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum CompanyRecord {
    Legacy(String),
    #[serde(rename_all = "camelCase")]
    Full {
        #[serde(default)]
        id: Option<String>,
        name: String,
        #[serde(default)]
        short_name: Option<String>,
    },
}

impl From<CompanyRecord> for Company {
    fn from(record: CompanyRecord) -> Self {
        match record {
            CompanyRecord::Legacy(name) => Company::new(name, ""),
            CompanyRecord::Full {
                id,
                name,
                short_name,
            } => {
                let mut company = Company::new(name, short_name.unwrap_or_default());
                if let Some(id) = id {
                    company.id = id;
                }
                company
            }
        }
    }
}
