//! Composition of a [`PageOverlay`] into a render tree.
//!
//! The tree keeps authored natural coordinates everywhere; only the root
//! carries the scale factor, exactly like a single CSS `scale()` on the
//! overlay root.

pub mod font;
pub mod shapes;
pub mod text;
mod wrap;

use serde::Serialize;
use tracing::debug;

use crate::document::{BBox, HoverFx, PageOverlay};
use crate::hover::{HoverState, HoverTracker, WrapperStyle};
use crate::scale::ScaleController;
use crate::style::RenderMode;

pub use font::{FontBook, FontMetrics, resolve_font};
pub use shapes::{ShapeNode, compose_shapes};
pub use text::{TextNode, compose_text};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayTree {
    pub natural_width: f32,
    pub natural_height: f32,
    pub scale: f32,
    pub image_src: String,
    pub mode: RenderMode,
    pub elements: Vec<ElementNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub id: String,
    pub subtype: Option<String>,
    pub z_index: i32,
    /// Hit region of the wrapper: container and text boxes combined.
    pub bounds: BBox,
    pub shapes: Vec<ShapeNode>,
    pub text: TextNode,
    pub hover: Option<HoverFx>,
    pub hover_state: HoverState,
    pub wrapper: WrapperStyle,
}

impl OverlayTree {
    pub fn rendered_width(&self) -> f32 {
        self.natural_width * self.scale
    }

    pub fn rendered_height(&self) -> f32 {
        self.natural_height * self.scale
    }

    /// Elements with their document index in stacking order: ascending
    /// z-index, document order among equals.
    pub fn paint_order(&self) -> Vec<(usize, &ElementNode)> {
        let mut ordered = self.elements.iter().enumerate().collect::<Vec<_>>();
        ordered.sort_by_key(|(_, element)| element.z_index);
        ordered
    }

    pub fn element(&self, id: &str) -> Option<&ElementNode> {
        self.elements.iter().find(|element| element.id == id)
    }

    /// Copy hover state and wrapper cosmetics from a tracker.
    pub fn with_hover(mut self, tracker: &HoverTracker) -> Self {
        for element in &mut self.elements {
            element.hover_state = tracker.state(&element.id);
            if let Some(style) = tracker.style(&element.id) {
                element.wrapper = style.clone();
            }
        }
        self
    }
}

pub fn build_overlay(
    document: &PageOverlay,
    mode: RenderMode,
    scale: &ScaleController,
    fonts: &FontBook,
) -> OverlayTree {
    let elements = document
        .elements
        .iter()
        .map(|element| {
            let container_bounds = element.container.bounds();
            let shapes = compose_shapes(&element.container, mode);
            let font = fonts.for_family(element.text.style.font_family.as_deref());
            let text = compose_text(&element.text, container_bounds, mode, font);
            let bounds = container_bounds
                .map(|bounds| bounds.union(&element.text.bbox))
                .unwrap_or(element.text.bbox);
            ElementNode {
                id: element.id.clone(),
                subtype: element.subtype.clone(),
                z_index: element.z_index(),
                bounds,
                shapes,
                text,
                hover: element.hover().cloned(),
                hover_state: HoverState::Idle,
                wrapper: WrapperStyle::default(),
            }
        })
        .collect::<Vec<_>>();
    debug!(
        "overlay: {} elements, mode={}, scale={}",
        elements.len(),
        mode,
        scale.scale()
    );
    OverlayTree {
        natural_width: document.image.natural_width,
        natural_height: document.image.natural_height,
        scale: scale.scale(),
        image_src: document.image.effective_src().to_string(),
        mode,
        elements,
    }
}
