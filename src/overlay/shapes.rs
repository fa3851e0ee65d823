use serde::Serialize;

use crate::document::{BBox, Container, MaskShape, Stroke};
use crate::style::{RenderMode, ResolvedFill, resolve_fill};

/// One absolutely positioned, mask-clipped fill. Never receives pointer
/// events; hover belongs to the element wrapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeNode {
    pub bbox: BBox,
    /// Empty when the mask could not be resolved; the shape then paints as
    /// a plain rectangle.
    pub mask_src: String,
    pub fill: ResolvedFill,
    pub stroke: Option<Stroke>,
}

impl ShapeNode {
    pub fn has_mask(&self) -> bool {
        !self.mask_src.trim().is_empty()
    }
}

pub fn compose_shape(shape: &MaskShape, mode: RenderMode) -> ShapeNode {
    ShapeNode {
        bbox: shape.bbox,
        mask_src: shape.mask_src.clone(),
        fill: resolve_fill(shape.fill.as_ref(), mode),
        stroke: shape.stroke.clone().filter(|_| mode.shapes_visible()),
    }
}

/// Shapes of a container in paint order; later entries paint over earlier ones.
pub fn compose_shapes(container: &Container, mode: RenderMode) -> Vec<ShapeNode> {
    match container {
        Container::None => Vec::new(),
        Container::Mask(shape) => vec![compose_shape(shape, mode)],
        Container::Group { shapes } => shapes
            .iter()
            .map(|shape| compose_shape(shape, mode))
            .collect(),
    }
}
