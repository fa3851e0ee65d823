pub mod html;
pub mod raster;
pub mod svg;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::overlay::OverlayTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Html,
    Svg,
    Png,
    Jpeg,
    Webp,
    /// JSON dump of the composed render tree
    Tree,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Webp => "webp",
            OutputFormat::Tree => "tree",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            OutputFormat::Html => "text/html",
            OutputFormat::Svg => "image/svg+xml",
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Webp => "image/webp",
            OutputFormat::Tree => "application/json",
        }
    }

    pub fn is_raster(&self) -> bool {
        matches!(
            self,
            OutputFormat::Png | OutputFormat::Jpeg | OutputFormat::Webp
        )
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(OutputFormat::Html),
            "svg" => Ok(OutputFormat::Svg),
            "png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "webp" => Ok(OutputFormat::Webp),
            "tree" | "json" => Ok(OutputFormat::Tree),
            other => Err(anyhow!(
                "unsupported output format '{}' (expected html, svg, png, jpeg, webp or tree)",
                other
            )),
        }
    }
}

#[derive(Default)]
pub struct RenderOptions<'a> {
    pub format: OutputFormat,
    /// Extra font made available to the rasterizer.
    pub font_data: Option<&'a [u8]>,
    /// Base directory for relative image and mask paths when rasterizing.
    pub resources_dir: Option<&'a Path>,
}

#[derive(Debug, Clone)]
pub struct Rendered {
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl Rendered {
    pub fn is_text(&self) -> bool {
        !self.mime.starts_with("image/") || self.mime == "image/svg+xml"
    }
}

pub fn render(tree: &OverlayTree, options: &RenderOptions<'_>) -> Result<Rendered> {
    info!(
        "render: format={} mode={} elements={}",
        options.format,
        tree.mode,
        tree.elements.len()
    );
    let bytes = match options.format {
        OutputFormat::Html => html::render_html(tree).into_bytes(),
        OutputFormat::Svg => svg::render_svg(tree).into_bytes(),
        OutputFormat::Tree => {
            serde_json::to_vec_pretty(tree).with_context(|| "failed to serialize render tree")?
        }
        format => {
            let svg = svg::render_svg(tree);
            raster::render_svg_bytes(&svg, format.mime(), options.font_data, options.resources_dir)?
        }
    };
    Ok(Rendered {
        mime: options.format.mime(),
        bytes,
    })
}

/// Shortest decimal form with at most four fraction digits.
pub(crate) fn fmt_num(value: f32) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = (f64::from(value) * 10_000.0).round() / 10_000.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let text = format!("{:.4}", rounded);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

pub(crate) fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
