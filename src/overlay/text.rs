use serde::Serialize;

use super::font::FontMetrics;
use super::wrap::{WrapMetrics, wrap_text};
use crate::document::{BBox, OverlayText};
use crate::style::{RenderMode, ResolvedTextStyle, resolve_text_style};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    pub bbox: BBox,
    pub value: String,
    pub style: ResolvedTextStyle,
    pub selectable: bool,
    /// Pre-broken lines for backends that do not wrap text themselves.
    pub lines: Vec<String>,
    /// Dashed authoring bounds, debug mode only.
    pub debug_outline: Option<BBox>,
}

impl TextNode {
    pub fn user_select(&self) -> &'static str {
        if self.selectable { "text" } else { "none" }
    }

    pub fn cursor(&self) -> &'static str {
        if self.selectable { "text" } else { "default" }
    }
}

pub fn compose_text(
    text: &OverlayText,
    container_bounds: Option<BBox>,
    mode: RenderMode,
    font: Option<&FontMetrics>,
) -> TextNode {
    let style = resolve_text_style(&text.style, mode);
    let metrics = WrapMetrics {
        font_size: style.font_size,
        letter_spacing: style.letter_spacing,
        font,
    };
    let lines = wrap_text(&text.value, text.bbox.w, &metrics);
    let debug_outline = mode
        .draws_debug_bounds()
        .then(|| container_bounds.unwrap_or(text.bbox));
    TextNode {
        bbox: text.bbox,
        value: text.value.clone(),
        style,
        selectable: text.selectable,
        lines,
        debug_outline,
    }
}
