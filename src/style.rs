//! Rendering modes and resolution of authored style values to the values
//! actually drawn.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::document::{Fill, HoverFx, Stroke, TextAlign, TextStyle};

pub const DEFAULT_FONT_FAMILY: &str =
    r#"system-ui, -apple-system, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif"#;
pub const DEFAULT_FONT_WEIGHT: u16 = 600;
pub const DEFAULT_FONT_SIZE: f32 = 16.0;
pub const DEFAULT_LINE_HEIGHT: f32 = 1.05;
pub const DEFAULT_TEXT_COLOR: &str = "#000000";
pub const DEFAULT_FILL_COLOR: &str = "#ffffff";
pub const DEFAULT_FILL_OPACITY: f32 = 1.0;
pub const DEFAULT_HOVER_SCALE: f32 = 1.04;
pub const HOVER_OUTLINE_OFFSET: f32 = 2.0;
pub const TRANSPARENT: &str = "transparent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum RenderMode {
    /// Visuals are baked into the base image; only selectable text is emitted.
    #[default]
    #[value(name = "copyOnly", alias = "copy-only")]
    CopyOnly,
    /// The overlay redraws bubble backgrounds and text over an erased image.
    #[value(name = "replace")]
    Replace,
    /// Like copyOnly for shapes, plus visible text and dashed authoring bounds.
    #[value(name = "debug")]
    Debug,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::CopyOnly => "copyOnly",
            RenderMode::Replace => "replace",
            RenderMode::Debug => "debug",
        }
    }

    /// Shapes paint with their authored opacity only when replacing the art.
    pub fn shapes_visible(&self) -> bool {
        matches!(self, RenderMode::Replace)
    }

    pub fn text_visible(&self) -> bool {
        !matches!(self, RenderMode::CopyOnly)
    }

    pub fn draws_debug_bounds(&self) -> bool {
        matches!(self, RenderMode::Debug)
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "copyonly" | "copy-only" | "copy_only" => Ok(RenderMode::CopyOnly),
            "replace" => Ok(RenderMode::Replace),
            "debug" => Ok(RenderMode::Debug),
            other => Err(anyhow!(
                "unknown render mode '{}' (expected copyOnly, replace or debug)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFill {
    pub color: String,
    pub opacity: f32,
}

pub fn resolve_fill_color(fill: Option<&Fill>) -> String {
    fill.and_then(|fill| fill.color.clone())
        .unwrap_or_else(|| DEFAULT_FILL_COLOR.to_string())
}

pub fn resolve_fill_opacity(fill: Option<&Fill>, mode: RenderMode) -> f32 {
    if !mode.shapes_visible() {
        return 0.0;
    }
    fill.and_then(|fill| fill.opacity)
        .unwrap_or(DEFAULT_FILL_OPACITY)
}

pub fn resolve_fill(fill: Option<&Fill>, mode: RenderMode) -> ResolvedFill {
    ResolvedFill {
        color: resolve_fill_color(fill),
        opacity: resolve_fill_opacity(fill, mode),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTextStyle {
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: u16,
    pub color: String,
    pub align: TextAlign,
    pub line_height: f32,
    pub letter_spacing: f32,
    pub stroke: Option<Stroke>,
}

impl ResolvedTextStyle {
    pub fn line_height_px(&self) -> f32 {
        self.font_size * self.line_height
    }
}

pub fn resolve_font_family(style: &TextStyle) -> String {
    style
        .font_family
        .as_deref()
        .filter(|family| !family.trim().is_empty())
        .unwrap_or(DEFAULT_FONT_FAMILY)
        .to_string()
}

pub fn resolve_font_size(style: &TextStyle) -> f32 {
    style.font_size.unwrap_or(DEFAULT_FONT_SIZE)
}

pub fn resolve_font_weight(style: &TextStyle) -> u16 {
    style.font_weight.unwrap_or(DEFAULT_FONT_WEIGHT)
}

pub fn resolve_line_height(style: &TextStyle) -> f32 {
    style.line_height.unwrap_or(DEFAULT_LINE_HEIGHT)
}

pub fn resolve_align(style: &TextStyle) -> TextAlign {
    style.align.unwrap_or(TextAlign::Left)
}

pub fn resolve_letter_spacing(style: &TextStyle) -> f32 {
    style.letter_spacing.unwrap_or(0.0)
}

/// Text is transparent in copyOnly so it stays selectable without drawing
/// over the baked glyphs.
pub fn resolve_text_color(style: &TextStyle, mode: RenderMode) -> String {
    if !mode.text_visible() {
        return TRANSPARENT.to_string();
    }
    style
        .color
        .clone()
        .unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_string())
}

pub fn resolve_text_stroke(style: &TextStyle, mode: RenderMode) -> Option<Stroke> {
    if !mode.text_visible() {
        return None;
    }
    style.stroke.clone()
}

pub fn resolve_text_style(style: &TextStyle, mode: RenderMode) -> ResolvedTextStyle {
    ResolvedTextStyle {
        font_family: resolve_font_family(style),
        font_size: resolve_font_size(style),
        font_weight: resolve_font_weight(style),
        color: resolve_text_color(style, mode),
        align: resolve_align(style),
        line_height: resolve_line_height(style),
        letter_spacing: resolve_letter_spacing(style),
        stroke: resolve_text_stroke(style, mode),
    }
}

pub fn resolve_hover_scale(fx: Option<&HoverFx>) -> f32 {
    fx.and_then(|fx| fx.scale).unwrap_or(DEFAULT_HOVER_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(color: Option<&str>, opacity: Option<f32>) -> Fill {
        Fill {
            color: color.map(str::to_string),
            opacity,
        }
    }

    #[test]
    fn copy_only_hides_shapes_and_text() {
        let authored = fill(Some("#ff0000"), Some(0.7));
        let resolved = resolve_fill(Some(&authored), RenderMode::CopyOnly);
        assert_eq!(resolved.opacity, 0.0);
        assert_eq!(resolved.color, "#ff0000");

        let style = TextStyle {
            color: Some("#123456".to_string()),
            ..TextStyle::default()
        };
        assert_eq!(resolve_text_color(&style, RenderMode::CopyOnly), TRANSPARENT);
    }

    #[test]
    fn replace_uses_authored_opacity() {
        let authored = fill(None, Some(0.7));
        let resolved = resolve_fill(Some(&authored), RenderMode::Replace);
        assert_eq!(resolved.opacity, 0.7);
        assert_eq!(resolved.color, DEFAULT_FILL_COLOR);
        assert_eq!(resolve_fill_opacity(None, RenderMode::Replace), 1.0);
    }

    #[test]
    fn debug_keeps_shapes_hidden_but_text_visible() {
        let authored = fill(None, Some(0.5));
        assert_eq!(resolve_fill_opacity(Some(&authored), RenderMode::Debug), 0.0);
        let style = TextStyle::default();
        assert_eq!(
            resolve_text_color(&style, RenderMode::Debug),
            DEFAULT_TEXT_COLOR
        );
    }

    #[test]
    fn text_defaults_apply_when_unset() {
        let resolved = resolve_text_style(&TextStyle::default(), RenderMode::Replace);
        assert_eq!(resolved.font_family, DEFAULT_FONT_FAMILY);
        assert_eq!(resolved.font_weight, 600);
        assert_eq!(resolved.line_height, 1.05);
        assert_eq!(resolved.align, TextAlign::Left);
        assert_eq!(resolved.stroke, None);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let style = TextStyle {
            font_family: Some("Anime Ace".to_string()),
            font_weight: Some(400),
            line_height: Some(1.3),
            align: Some(TextAlign::Center),
            ..TextStyle::default()
        };
        let resolved = resolve_text_style(&style, RenderMode::Replace);
        assert_eq!(resolved.font_family, "Anime Ace");
        assert_eq!(resolved.font_weight, 400);
        assert_eq!(resolved.line_height, 1.3);
        assert_eq!(resolved.align, TextAlign::Center);
    }

    #[test]
    fn stroke_requires_visible_mode() {
        let style = TextStyle {
            stroke: Some(Stroke {
                color: "#ffffff".to_string(),
                width: 3.0,
            }),
            ..TextStyle::default()
        };
        assert!(resolve_text_stroke(&style, RenderMode::CopyOnly).is_none());
        assert!(resolve_text_stroke(&style, RenderMode::Replace).is_some());
        assert!(resolve_text_stroke(&style, RenderMode::Debug).is_some());
    }

    #[test]
    fn parses_mode_names() {
        assert_eq!("copyOnly".parse::<RenderMode>().unwrap(), RenderMode::CopyOnly);
        assert_eq!("copy-only".parse::<RenderMode>().unwrap(), RenderMode::CopyOnly);
        assert_eq!("Replace".parse::<RenderMode>().unwrap(), RenderMode::Replace);
        assert!("paint".parse::<RenderMode>().is_err());
        assert_eq!(RenderMode::Debug.to_string(), "debug");
    }
}
