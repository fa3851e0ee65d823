use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DOCUMENT_VERSION: u32 = 1;

/// A page overlay as produced by the authoring pipeline.
///
/// Every coordinate inside `elements` lives in the natural pixel space of
/// `image`, never in rendered pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOverlay {
    pub version: u32,
    pub image: OverlayImage,
    #[serde(default)]
    pub elements: Vec<OverlayElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayImage {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_src: Option<String>,
    pub natural_width: f32,
    pub natural_height: f32,
}

impl OverlayImage {
    /// The URL to load: a signed override when present, else the canonical source.
    pub fn effective_src(&self) -> &str {
        match self.signed_src.as_deref() {
            Some(signed) if !signed.trim().is_empty() => signed,
            _ => &self.src,
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.natural_width / self.natural_height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayElement {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    pub container: Container,
    pub text: OverlayText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction: Option<Interaction>,
}

impl OverlayElement {
    pub fn z_index(&self) -> i32 {
        self.z_index.unwrap_or(1)
    }

    pub fn hover(&self) -> Option<&HoverFx> {
        self.interaction
            .as_ref()
            .and_then(|interaction| interaction.hover.as_ref())
    }
}

/// Visual backing of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Container {
    None,
    Mask(MaskShape),
    Group { shapes: Vec<MaskShape> },
}

impl Container {
    pub fn shapes(&self) -> &[MaskShape] {
        match self {
            Container::None => &[],
            Container::Mask(shape) => std::slice::from_ref(shape),
            Container::Group { shapes } => shapes,
        }
    }

    /// Union of every shape bbox, `None` for a container without shapes.
    pub fn bounds(&self) -> Option<BBox> {
        self.shapes()
            .iter()
            .map(|shape| shape.bbox)
            .reduce(|acc, bbox| acc.union(&bbox))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskShape {
    pub bbox: BBox,
    pub mask_src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Stroke>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn union(&self, other: &BBox) -> BBox {
        let x1 = self.x.min(other.x);
        let y1 = self.y.min(other.y);
        let x2 = (self.x + self.w).max(other.x + other.w);
        let y2 = (self.y + self.h).max(other.y + other.h);
        BBox {
            x: x1,
            y: y1,
            w: x2 - x1,
            h: y2 - y1,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.w.is_finite() && self.h.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Fill {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: String,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayText {
    pub value: String,
    pub bbox: BBox,
    #[serde(default)]
    pub style: TextStyle,
    #[serde(default = "default_selectable")]
    pub selectable: bool,
}

fn default_selectable() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }
}

/// Authored text style. Every field is optional; see [`crate::style`] for
/// the resolved values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Stroke>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover: Option<HoverFx>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoverFx {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<Outline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover_fill: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub color: String,
    pub width: f32,
}

pub fn parse_document(input: &str) -> Result<PageOverlay> {
    serde_json::from_str(input).with_context(|| "failed to parse page overlay JSON")
}

pub fn load_document(path: &Path) -> Result<PageOverlay> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read overlay document: {}", path.display()))?;
    parse_document(&content).with_context(|| format!("invalid overlay document: {}", path.display()))
}
