//! Boundary checks for documents coming from the authoring pipeline.
//!
//! The renderer never calls this; entry points do, before handing a
//! document to [`crate::overlay::build_overlay`].

use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

use crate::document::{BBox, DOCUMENT_VERSION, MaskShape, PageOverlay};

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "issue", rename_all = "camelCase")]
pub enum ValidationIssue {
    #[error("unsupported document version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("image natural size must be positive and finite (got {width}x{height})")]
    InvalidNaturalSize { width: f32, height: f32 },

    #[error("image src is empty")]
    EmptyImageSource,

    #[error("element #{index} has an empty id")]
    EmptyElementId { index: usize },

    #[error("duplicate element id '{id}'")]
    DuplicateElementId { id: String },

    #[error("{path}: bbox must be finite with non-negative size")]
    InvalidBBox { path: String },

    #[error("{path}: fill opacity {opacity} is outside 0..=1")]
    FillOpacityOutOfRange { path: String, opacity: f32 },

    #[error("{path}: mask src is empty")]
    EmptyMaskSource { path: String },

    #[error("{path}: hover scale must be positive (got {scale})")]
    InvalidHoverScale { path: String, scale: f32 },

    #[error("{path}: font size must be positive (got {size})")]
    InvalidFontSize { path: String, size: f32 },
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid page overlay: {}", format_issues(.issues))]
pub struct ValidationErrors {
    pub issues: Vec<ValidationIssue>,
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn collect_issues(document: &PageOverlay) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if document.version != DOCUMENT_VERSION {
        issues.push(ValidationIssue::UnsupportedVersion {
            found: document.version,
            expected: DOCUMENT_VERSION,
        });
    }
    let image = &document.image;
    if !is_positive(image.natural_width) || !is_positive(image.natural_height) {
        issues.push(ValidationIssue::InvalidNaturalSize {
            width: image.natural_width,
            height: image.natural_height,
        });
    }
    if image.src.trim().is_empty() {
        issues.push(ValidationIssue::EmptyImageSource);
    }

    let mut seen = HashSet::new();
    for (index, element) in document.elements.iter().enumerate() {
        if element.id.trim().is_empty() {
            issues.push(ValidationIssue::EmptyElementId { index });
        } else if !seen.insert(element.id.as_str()) {
            issues.push(ValidationIssue::DuplicateElementId {
                id: element.id.clone(),
            });
        }
        let prefix = if element.id.is_empty() {
            format!("elements[{}]", index)
        } else {
            element.id.clone()
        };

        for (shape_index, shape) in element.container.shapes().iter().enumerate() {
            check_shape(
                shape,
                &format!("{}.container[{}]", prefix, shape_index),
                &mut issues,
            );
        }

        check_bbox(&element.text.bbox, &format!("{}.text", prefix), &mut issues);
        if let Some(size) = element.text.style.font_size {
            if !is_positive(size) {
                issues.push(ValidationIssue::InvalidFontSize {
                    path: format!("{}.text.style", prefix),
                    size,
                });
            }
        }
        if let Some(scale) = element.hover().and_then(|fx| fx.scale) {
            if !is_positive(scale) {
                issues.push(ValidationIssue::InvalidHoverScale {
                    path: format!("{}.interaction.hover", prefix),
                    scale,
                });
            }
        }
    }
    issues
}

pub fn validate(document: &PageOverlay) -> Result<(), ValidationErrors> {
    let issues = collect_issues(document);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { issues })
    }
}

fn check_shape(shape: &MaskShape, path: &str, issues: &mut Vec<ValidationIssue>) {
    check_bbox(&shape.bbox, path, issues);
    if shape.mask_src.trim().is_empty() {
        issues.push(ValidationIssue::EmptyMaskSource {
            path: path.to_string(),
        });
    }
    if let Some(opacity) = shape.fill.as_ref().and_then(|fill| fill.opacity) {
        if !(0.0..=1.0).contains(&opacity) {
            issues.push(ValidationIssue::FillOpacityOutOfRange {
                path: path.to_string(),
                opacity,
            });
        }
    }
}

fn check_bbox(bbox: &BBox, path: &str, issues: &mut Vec<ValidationIssue>) {
    if !bbox.is_finite() || bbox.w < 0.0 || bbox.h < 0.0 {
        issues.push(ValidationIssue::InvalidBBox {
            path: path.to_string(),
        });
    }
}

fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}
