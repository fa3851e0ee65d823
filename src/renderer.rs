use anyhow::Result;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

use crate::assets::embed_assets;
use crate::document::PageOverlay;
use crate::hover::{HoverEvent, HoverTracker};
use crate::overlay::font::{find_family_font, system_font_db};
use crate::overlay::{FontBook, FontMetrics, OverlayTree, build_overlay, resolve_font};
use crate::render::{self, OutputFormat, RenderOptions, Rendered};
use crate::scale::ScaleController;
use crate::settings::Settings;
use crate::style::RenderMode;

#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    pub mode: RenderMode,
    /// Container width in px; `None` renders at natural size.
    pub width: Option<f32>,
    pub format: OutputFormat,
    /// Elements to show in their hovered state.
    pub hover: Vec<String>,
    pub embed_assets: bool,
    /// Directory relative image and mask paths are resolved against.
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub mime: &'static str,
    pub bytes: Vec<u8>,
    pub scale: f32,
}

impl From<(Rendered, f32)> for RenderOutput {
    fn from((rendered, scale): (Rendered, f32)) -> Self {
        Self {
            mime: rendered.mime,
            bytes: rendered.bytes,
            scale,
        }
    }
}

#[derive(Clone)]
pub struct Renderer {
    settings: Settings,
    font: Option<FontMetrics>,
    /// Authored family list to its installed face, `None` when not installed.
    families: Arc<Mutex<HashMap<String, Option<FontMetrics>>>>,
}

impl Renderer {
    pub fn new(settings: Settings) -> Result<Self> {
        let font = match (&settings.font_path, &settings.font_family) {
            (Some(path), _) => Some(resolve_font(Some(Path::new(path)), None)?),
            (None, Some(family)) => match resolve_font(None, Some(family)) {
                Ok(font) => Some(font),
                Err(err) => {
                    warn!("font: '{}' unavailable, using estimated metrics ({})", family, err);
                    None
                }
            },
            (None, None) => None,
        };
        if let Some(font) = &font {
            info!("font: {}", font.family().unwrap_or("(unnamed)"));
        }
        Ok(Self {
            settings,
            font,
            families: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Faces for the authored font families of `document`. Each distinct
    /// family list hits the system font database once per renderer.
    pub fn fonts_for(&self, document: &PageOverlay) -> FontBook {
        let mut book = FontBook::new(self.font.clone());
        let mut cache = self.families.lock().unwrap_or_else(PoisonError::into_inner);
        let mut db = None;
        let authored = document
            .elements
            .iter()
            .filter_map(|element| element.text.style.font_family.as_deref())
            .map(str::trim)
            .filter(|families| !families.is_empty());
        for families in authored {
            if !cache.contains_key(families) {
                let db = db.get_or_insert_with(system_font_db);
                let found = find_family_font(db, families);
                if found.is_none() {
                    debug!("font: '{}' not installed, wrapping with fallback metrics", families);
                }
                cache.insert(families.to_string(), found);
            }
            if let Some(Some(font)) = cache.get(families) {
                book.insert(families, font.clone());
            }
        }
        book
    }

    /// Compose the render tree. The document is never modified.
    pub fn compose(&self, document: &PageOverlay, request: &RenderRequest) -> OverlayTree {
        let mut scale = ScaleController::new(document.image.natural_width);
        if let Some(width) = request.width {
            scale.observe(width);
        } else {
            scale.observe(document.image.natural_width);
        }
        if scale.clamp_to_safe_range() {
            warn!(
                "scale: out of range for natural width {}, clamped to {}",
                document.image.natural_width,
                scale.scale()
            );
        }

        let mut tracker = HoverTracker::new();
        for id in &request.hover {
            match document.elements.iter().find(|element| &element.id == id) {
                Some(element) => {
                    tracker.handle(id, HoverEvent::PointerEnter, element.hover());
                }
                None => warn!("hover: no element with id '{}'", id),
            }
        }

        let fonts = self.fonts_for(document);
        build_overlay(document, request.mode, &scale, &fonts).with_hover(&tracker)
    }

    pub async fn render(
        &self,
        document: &PageOverlay,
        request: &RenderRequest,
    ) -> Result<RenderOutput> {
        // Raster output cannot follow remote references and must see broken
        // masks as plain rectangles, so it always embeds.
        let document = if request.embed_assets || request.format.is_raster() {
            Cow::Owned(
                embed_assets(
                    document,
                    request.base_dir.as_deref(),
                    self.settings.asset_timeout,
                )
                .await?,
            )
        } else {
            Cow::Borrowed(document)
        };
        let tree = self.compose(&document, request);
        let options = RenderOptions {
            format: request.format,
            font_data: self.font.as_ref().map(FontMetrics::data),
            resources_dir: request.base_dir.as_deref(),
        };
        let rendered = render::render(&tree, &options)?;
        Ok(RenderOutput::from((rendered, tree.scale)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;
    use crate::hover::HoverState;

    fn document() -> PageOverlay {
        parse_document(
            r#"{
                "version": 1,
                "image": { "src": "page.png", "naturalWidth": 1000, "naturalHeight": 1500 },
                "elements": [
                    {
                        "id": "b1",
                        "type": "text",
                        "container": { "kind": "none" },
                        "text": { "value": "Hi", "bbox": { "x": 0, "y": 0, "w": 100, "h": 30 } },
                        "interaction": { "hover": { "scale": 1.2 } }
                    }
                ]
            }"#,
        )
        .expect("doc")
    }

    fn renderer() -> Renderer {
        Renderer::new(Settings::default()).expect("renderer")
    }

    #[test]
    fn defaults_to_natural_size() {
        let tree = renderer().compose(&document(), &RenderRequest::default());
        assert_eq!(tree.scale, 1.0);
    }

    #[test]
    fn width_sets_scale_and_hover_ids_apply() {
        let request = RenderRequest {
            width: Some(250.0),
            hover: vec!["b1".to_string(), "missing".to_string()],
            ..RenderRequest::default()
        };
        let tree = renderer().compose(&document(), &request);
        assert_eq!(tree.scale, 0.25);
        let element = tree.element("b1").expect("b1");
        assert_eq!(element.hover_state, HoverState::Hovered);
        assert_eq!(element.wrapper.transform.as_deref(), Some("scale(1.2)"));
    }

    #[test]
    fn degenerate_natural_width_is_clamped() {
        let mut doc = document();
        doc.image.natural_width = 0.0;
        let request = RenderRequest {
            width: Some(500.0),
            ..RenderRequest::default()
        };
        let tree = renderer().compose(&doc, &request);
        assert_eq!(tree.scale, 1.0);
    }

    #[test]
    fn authored_families_are_looked_up_once() {
        let mut doc = document();
        doc.elements[0].text.style.font_family = Some(" Definitely Not Installed 9f2c ".to_string());
        let renderer = renderer();

        let fonts = renderer.fonts_for(&doc);
        assert!(fonts.for_family(Some("Definitely Not Installed 9f2c")).is_none());
        let cache = renderer.families.lock().expect("cache");
        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key("Definitely Not Installed 9f2c"));
    }

    #[tokio::test]
    async fn renders_requested_format() {
        let request = RenderRequest {
            format: OutputFormat::Svg,
            width: Some(500.0),
            ..RenderRequest::default()
        };
        let output = renderer()
            .render(&document(), &request)
            .await
            .expect("render");
        assert_eq!(output.mime, "image/svg+xml");
        assert_eq!(output.scale, 0.5);
        let svg = String::from_utf8(output.bytes).expect("utf8");
        assert!(svg.contains(r#"width="500" height="750""#));
    }
}
