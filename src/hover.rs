//! Per-element hover interaction as an explicit two-state machine.
//!
//! Transitions return a [`StylePatch`] touching only cosmetic wrapper
//! properties (transform, outline, filter) that nothing reads back.

use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::document::HoverFx;
use crate::style::{HOVER_OUTLINE_OFFSET, resolve_hover_scale};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HoverState {
    #[default]
    Idle,
    Hovered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverEvent {
    PointerEnter,
    PointerLeave,
}

/// Cosmetic properties of an element wrapper. `None` means "unset".
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapperStyle {
    pub transform: Option<String>,
    pub transform_origin: Option<String>,
    pub outline: Option<String>,
    pub outline_offset: Option<String>,
    pub filter: Option<String>,
}

/// A change to apply to a [`WrapperStyle`]. The outer `Option` says whether
/// a property is touched, the inner one whether it is set or cleared.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StylePatch {
    pub transform: Option<Option<String>>,
    pub transform_origin: Option<Option<String>>,
    pub outline: Option<Option<String>>,
    pub outline_offset: Option<Option<String>>,
    pub filter: Option<Option<String>>,
}

impl StylePatch {
    pub fn is_empty(&self) -> bool {
        *self == StylePatch::default()
    }
}

impl WrapperStyle {
    pub fn apply(&mut self, patch: &StylePatch) {
        if let Some(value) = &patch.transform {
            self.transform = value.clone();
        }
        if let Some(value) = &patch.transform_origin {
            self.transform_origin = value.clone();
        }
        if let Some(value) = &patch.outline {
            self.outline = value.clone();
        }
        if let Some(value) = &patch.outline_offset {
            self.outline_offset = value.clone();
        }
        if let Some(value) = &patch.filter {
            self.filter = value.clone();
        }
    }
}

pub fn hover_enter_patch(fx: Option<&HoverFx>) -> StylePatch {
    let scale = resolve_hover_scale(fx);
    let mut patch = StylePatch {
        transform: Some(Some(format!("scale({})", scale))),
        transform_origin: Some(Some("center center".to_string())),
        ..StylePatch::default()
    };
    if let Some(outline) = fx.and_then(|fx| fx.outline.as_ref()) {
        patch.outline = Some(Some(format!("{}px solid {}", outline.width, outline.color)));
        patch.outline_offset = Some(Some(format!("{}px", HOVER_OUTLINE_OFFSET)));
    }
    if let Some(color) = fx.and_then(|fx| fx.hover_fill.as_deref()) {
        // hoverFill only drives a glow; shapes keep their fill.
        debug!("hover: hoverFill {} rendered as drop-shadow glow", color);
        patch.filter = Some(Some(hover_glow_filter(color)));
    }
    patch
}

pub fn hover_leave_patch() -> StylePatch {
    StylePatch {
        transform: Some(Some("scale(1)".to_string())),
        transform_origin: None,
        outline: Some(None),
        outline_offset: Some(None),
        filter: Some(None),
    }
}

pub(crate) fn hover_glow_filter(color: &str) -> String {
    format!("drop-shadow(0 0 6px {})", color)
}

/// Event-driven transition. Events that do not change state yield an empty patch.
pub fn transition(
    state: HoverState,
    event: HoverEvent,
    fx: Option<&HoverFx>,
) -> (HoverState, StylePatch) {
    match (state, event) {
        (HoverState::Idle, HoverEvent::PointerEnter) => (HoverState::Hovered, hover_enter_patch(fx)),
        (HoverState::Hovered, HoverEvent::PointerLeave) => (HoverState::Idle, hover_leave_patch()),
        (state, _) => (state, StylePatch::default()),
    }
}

/// One element's wrapper: its hover state and the live cosmetic style.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementHover {
    state: HoverState,
    base: WrapperStyle,
    style: WrapperStyle,
}

impl ElementHover {
    pub fn new(base: WrapperStyle) -> Self {
        Self {
            state: HoverState::Idle,
            style: base.clone(),
            base,
        }
    }

    pub fn state(&self) -> HoverState {
        self.state
    }

    pub fn style(&self) -> &WrapperStyle {
        &self.style
    }

    pub fn handle(&mut self, event: HoverEvent, fx: Option<&HoverFx>) -> StylePatch {
        let (next, mut patch) = transition(self.state, event, fx);
        if next == HoverState::Idle && self.state == HoverState::Hovered {
            // Leaving restores exactly what the wrapper had before entering.
            patch = StylePatch {
                transform: Some(self.base.transform.clone()),
                transform_origin: Some(self.base.transform_origin.clone()),
                outline: Some(self.base.outline.clone()),
                outline_offset: Some(self.base.outline_offset.clone()),
                filter: Some(self.base.filter.clone()),
            };
        }
        self.state = next;
        self.style.apply(&patch);
        patch
    }
}

/// Hover state for every element of a page, keyed by element id.
#[derive(Debug, Clone, Default)]
pub struct HoverTracker {
    elements: HashMap<String, ElementHover>,
}

impl HoverTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, id: &str, event: HoverEvent, fx: Option<&HoverFx>) -> StylePatch {
        self.elements
            .entry(id.to_string())
            .or_default()
            .handle(event, fx)
    }

    pub fn state(&self, id: &str) -> HoverState {
        self.elements
            .get(id)
            .map(ElementHover::state)
            .unwrap_or_default()
    }

    pub fn style(&self, id: &str) -> Option<&WrapperStyle> {
        self.elements.get(id).map(ElementHover::style)
    }

    pub fn is_hovered(&self, id: &str) -> bool {
        self.state(id) == HoverState::Hovered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Outline;

    fn full_fx() -> HoverFx {
        HoverFx {
            scale: Some(1.2),
            outline: Some(Outline {
                color: "#ff00aa".to_string(),
                width: 3.0,
            }),
            hover_fill: Some("#ffee00".to_string()),
        }
    }

    #[test]
    fn enter_applies_default_scale() {
        let (state, patch) = transition(HoverState::Idle, HoverEvent::PointerEnter, None);
        assert_eq!(state, HoverState::Hovered);
        assert_eq!(patch.transform, Some(Some("scale(1.04)".to_string())));
        assert_eq!(patch.outline, None);
        assert_eq!(patch.filter, None);
    }

    #[test]
    fn enter_applies_outline_and_glow() {
        let fx = full_fx();
        let (_, patch) = transition(HoverState::Idle, HoverEvent::PointerEnter, Some(&fx));
        assert_eq!(patch.transform, Some(Some("scale(1.2)".to_string())));
        assert_eq!(patch.outline, Some(Some("3px solid #ff00aa".to_string())));
        assert_eq!(patch.outline_offset, Some(Some("2px".to_string())));
        assert_eq!(
            patch.filter,
            Some(Some("drop-shadow(0 0 6px #ffee00)".to_string()))
        );
    }

    #[test]
    fn repeated_events_are_noops() {
        let (state, patch) = transition(HoverState::Hovered, HoverEvent::PointerEnter, None);
        assert_eq!(state, HoverState::Hovered);
        assert!(patch.is_empty());
        let (state, patch) = transition(HoverState::Idle, HoverEvent::PointerLeave, None);
        assert_eq!(state, HoverState::Idle);
        assert!(patch.is_empty());
    }

    #[test]
    fn leave_resets_cosmetics() {
        let mut style = WrapperStyle::default();
        let fx = full_fx();
        let (_, enter) = transition(HoverState::Idle, HoverEvent::PointerEnter, Some(&fx));
        style.apply(&enter);
        let (_, leave) = transition(HoverState::Hovered, HoverEvent::PointerLeave, Some(&fx));
        style.apply(&leave);
        assert_eq!(style.transform.as_deref(), Some("scale(1)"));
        assert_eq!(style.outline, None);
        assert_eq!(style.filter, None);
    }

    #[test]
    fn round_trip_restores_pre_hover_style() {
        let base = WrapperStyle {
            transform: Some("rotate(2deg)".to_string()),
            outline: Some("1px dotted red".to_string()),
            ..WrapperStyle::default()
        };
        let mut element = ElementHover::new(base.clone());
        let fx = full_fx();
        element.handle(HoverEvent::PointerEnter, Some(&fx));
        assert_ne!(element.style(), &base);
        element.handle(HoverEvent::PointerLeave, Some(&fx));
        assert_eq!(element.style(), &base);
        assert_eq!(element.state(), HoverState::Idle);
    }

    #[test]
    fn tracker_keeps_elements_independent() {
        let mut tracker = HoverTracker::new();
        tracker.handle("a", HoverEvent::PointerEnter, None);
        assert!(tracker.is_hovered("a"));
        assert!(!tracker.is_hovered("b"));
        tracker.handle("b", HoverEvent::PointerEnter, None);
        tracker.handle("a", HoverEvent::PointerLeave, None);
        assert!(!tracker.is_hovered("a"));
        assert!(tracker.is_hovered("b"));
        assert_eq!(tracker.style("a"), Some(&WrapperStyle::default()));
    }
}
