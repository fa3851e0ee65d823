//! HTML/CSS rendering: the overlay as absolutely positioned elements.
//!
//! Everything below the overlay root is laid out in natural pixels and the
//! root applies the single `scale()` transform.

use super::{escape_xml, fmt_num};
use crate::document::BBox;
use crate::hover::HoverState;
use crate::overlay::{ElementNode, OverlayTree, ShapeNode, TextNode};
use crate::style::{TRANSPARENT, resolve_hover_scale};

const DEBUG_OUTLINE_COLOR: &str = "#ff00ff";

fn px(value: f32) -> String {
    format!("{}px", fmt_num(value))
}

fn position_css(bbox: &BBox) -> String {
    format!(
        "position:absolute;left:{};top:{};width:{};height:{}",
        px(bbox.x),
        px(bbox.y),
        px(bbox.w),
        px(bbox.h)
    )
}

fn tinted(color: &str, opacity: f32) -> String {
    if opacity >= 1.0 {
        return color.to_string();
    }
    if opacity <= 0.0 {
        return TRANSPARENT.to_string();
    }
    format!(
        "color-mix(in srgb, {} {}%, transparent)",
        color,
        fmt_num(opacity * 100.0)
    )
}

/// The container is pinned to the width the scale was computed for, so the
/// root's `scale()` always equals container width / natural width.
pub fn container_css(tree: &OverlayTree) -> String {
    format!(
        "position:relative;width:{};height:{};overflow:hidden",
        px(tree.rendered_width()),
        px(tree.rendered_height())
    )
}

pub fn root_css(tree: &OverlayTree) -> String {
    format!(
        "position:absolute;left:0;top:0;width:{};height:{};transform:scale({});transform-origin:0 0",
        px(tree.natural_width),
        px(tree.natural_height),
        fmt_num(tree.scale)
    )
}

pub fn wrapper_css(element: &ElementNode) -> String {
    let mut css = format!(
        "{};z-index:{};pointer-events:auto",
        position_css(&element.bounds),
        element.z_index
    );
    let wrapper = &element.wrapper;
    let declarations = [
        ("transform", &wrapper.transform),
        ("transform-origin", &wrapper.transform_origin),
        ("outline", &wrapper.outline),
        ("outline-offset", &wrapper.outline_offset),
        ("filter", &wrapper.filter),
    ];
    for (property, value) in declarations {
        if let Some(value) = value {
            css.push_str(&format!(";{}:{}", property, value));
        }
    }
    css
}

pub fn shape_css(shape: &ShapeNode) -> String {
    let mut css = format!(
        "{};pointer-events:none;background-color:{}",
        position_css(&shape.bbox),
        tinted(&shape.fill.color, shape.fill.opacity)
    );
    if shape.has_mask() {
        let url = format!("url(\"{}\")", shape.mask_src);
        css.push_str(&format!(
            ";-webkit-mask-image:{url};mask-image:{url};-webkit-mask-size:100% 100%;mask-size:100% 100%;-webkit-mask-repeat:no-repeat;mask-repeat:no-repeat"
        ));
    }
    if let Some(stroke) = &shape.stroke {
        css.push_str(&format!(
            ";box-shadow:inset 0 0 0 {} {}",
            px(stroke.width),
            stroke.color
        ));
    }
    css
}

pub fn text_css(text: &TextNode) -> String {
    let style = &text.style;
    let mut css = format!(
        "{};margin:0;font-family:{};font-size:{};font-weight:{};line-height:{};letter-spacing:{};text-align:{};color:{};white-space:pre-wrap;overflow-wrap:break-word;-webkit-user-select:{select};user-select:{select};cursor:{}",
        position_css(&text.bbox),
        style.font_family,
        px(style.font_size),
        style.font_weight,
        fmt_num(style.line_height),
        px(style.letter_spacing),
        style.align.as_str(),
        style.color,
        text.cursor(),
        select = text.user_select(),
    );
    if let Some(stroke) = &style.stroke {
        css.push_str(&format!(
            ";-webkit-text-stroke:{} {};paint-order:stroke fill",
            px(stroke.width),
            stroke.color
        ));
    }
    css
}

pub fn debug_outline_css(bbox: &BBox) -> String {
    format!(
        "{};border:1px dashed {};box-sizing:border-box;pointer-events:none",
        position_css(bbox),
        DEBUG_OUTLINE_COLOR
    )
}

pub fn render_html(tree: &OverlayTree) -> String {
    let mut html = String::new();
    html.push_str(&format!(
        r#"<div class="page-overlay" data-mode="{mode}" data-scale="{scale}" style="{style}">"#,
        mode = tree.mode,
        scale = fmt_num(tree.scale),
        style = escape_xml(&container_css(tree))
    ));
    html.push_str(&format!(
        r#"<img class="page-overlay__image" src="{}" alt="" draggable="false" style="position:absolute;left:0;top:0;width:100%;height:100%;user-select:none">"#,
        escape_xml(&tree.image_src)
    ));
    html.push_str(&format!(
        r#"<div class="page-overlay__root" style="{}">"#,
        escape_xml(&root_css(tree))
    ));
    for element in &tree.elements {
        render_element(&mut html, element);
    }
    html.push_str("</div></div>");
    html
}

fn render_element(html: &mut String, element: &ElementNode) {
    let state = match element.hover_state {
        HoverState::Idle => "idle",
        HoverState::Hovered => "hovered",
    };
    html.push_str(&format!(
        r#"<div class="page-overlay__element" data-id="{}""#,
        escape_xml(&element.id)
    ));
    if let Some(subtype) = &element.subtype {
        html.push_str(&format!(r#" data-subtype="{}""#, escape_xml(subtype)));
    }
    html.push_str(&format!(r#" data-hover="{}""#, state));
    if let Some(fx) = &element.hover {
        html.push_str(&format!(
            r#" data-hover-scale="{}""#,
            fmt_num(resolve_hover_scale(Some(fx)))
        ));
        if let Some(outline) = &fx.outline {
            html.push_str(&format!(
                r#" data-hover-outline="{} {}""#,
                px(outline.width),
                escape_xml(&outline.color)
            ));
        }
        if let Some(fill) = &fx.hover_fill {
            html.push_str(&format!(r#" data-hover-fill="{}""#, escape_xml(fill)));
        }
    }
    html.push_str(&format!(r#" style="{}">"#, escape_xml(&wrapper_css(element))));

    // Children keep authored coordinates: undo the wrapper's own offset.
    html.push_str(&format!(
        r#"<div class="page-overlay__natural" style="position:absolute;left:{};top:{};width:0;height:0">"#,
        px(-element.bounds.x),
        px(-element.bounds.y)
    ));
    for shape in &element.shapes {
        html.push_str(&format!(
            r#"<div class="page-overlay__shape" data-shape="" style="{}"></div>"#,
            escape_xml(&shape_css(shape))
        ));
    }
    if let Some(bbox) = &element.text.debug_outline {
        html.push_str(&format!(
            r#"<div class="page-overlay__debug" style="{}"></div>"#,
            escape_xml(&debug_outline_css(bbox))
        ));
    }
    html.push_str(&format!(
        r#"<p class="page-overlay__text" style="{}">{}</p>"#,
        escape_xml(&text_css(&element.text)),
        escape_xml(&element.text.value)
    ));
    html.push_str("</div></div>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;
    use crate::overlay::{FontBook, build_overlay};
    use crate::scale::ScaleController;
    use crate::style::RenderMode;

    const DOC: &str = r##"{
        "version": 1,
        "image": { "src": "page.png", "naturalWidth": 1000, "naturalHeight": 1500 },
        "elements": [
            {
                "id": "b1",
                "type": "text",
                "subtype": "speech",
                "container": {
                    "kind": "mask",
                    "bbox": { "x": 100, "y": 200, "w": 300, "h": 80 },
                    "maskSrc": "masks/b1.png",
                    "fill": { "color": "#ffffff", "opacity": 0.75 }
                },
                "text": {
                    "value": "Hey <you>",
                    "bbox": { "x": 110, "y": 210, "w": 280, "h": 60 },
                    "style": { "fontSize": 24, "color": "#111111" },
                    "selectable": false
                }
            }
        ]
    }"##;

    fn tree(mode: RenderMode) -> OverlayTree {
        let doc = parse_document(DOC).expect("doc");
        let scale = ScaleController::observed(1000.0, 500.0);
        build_overlay(&doc, mode, &scale, &FontBook::default())
    }

    #[test]
    fn shape_is_positioned_in_natural_pixels() {
        let tree = tree(RenderMode::Replace);
        let css = shape_css(&tree.elements[0].shapes[0]);
        assert!(css.starts_with("position:absolute;left:100px;top:200px;width:300px;height:80px;"));
        assert!(css.contains("pointer-events:none"));
        assert!(css.contains("background-color:color-mix(in srgb, #ffffff 75%, transparent)"));
        assert!(css.contains(r#"mask-image:url("masks/b1.png")"#));
        assert!(css.contains("mask-size:100% 100%"));
        assert!(css.contains("mask-repeat:no-repeat"));
        assert!(root_css(&tree).contains("transform:scale(0.5)"));
    }

    #[test]
    fn copy_only_shape_is_transparent() {
        let tree = tree(RenderMode::CopyOnly);
        let css = shape_css(&tree.elements[0].shapes[0]);
        assert!(css.contains("background-color:transparent"));
        let text = text_css(&tree.elements[0].text);
        assert!(text.contains("color:transparent"));
    }

    #[test]
    fn non_selectable_text_disables_selection() {
        let tree = tree(RenderMode::Replace);
        let css = text_css(&tree.elements[0].text);
        assert!(css.contains(";user-select:none;"));
        assert!(css.contains(";cursor:default"));
        assert!(css.contains("color:#111111"));
        assert!(css.contains("font-weight:600"));
        assert!(css.contains("line-height:1.05"));
    }

    #[test]
    fn markup_escapes_text_and_marks_debug_bounds() {
        let html = render_html(&tree(RenderMode::Debug));
        assert!(html.contains("Hey &lt;you&gt;"));
        assert!(html.contains(r#"data-subtype="speech""#));
        assert!(html.contains("border:1px dashed #ff00ff"));
        assert_eq!(html.matches("data-shape").count(), 1);
    }

    #[test]
    fn container_width_agrees_with_root_scale() {
        let doc = parse_document(DOC).expect("doc");
        for width in [500.0_f32, 375.0, 1000.0] {
            let scale = ScaleController::observed(1000.0, width);
            let tree = build_overlay(&doc, RenderMode::Replace, &scale, &FontBook::default());
            let container = container_css(&tree);
            assert_eq!(
                container,
                format!(
                    "position:relative;width:{}px;height:{}px;overflow:hidden",
                    fmt_num(width),
                    fmt_num(width * 1.5)
                )
            );
            let html = render_html(&tree);
            assert!(html.contains(&container));
            assert!(html.contains(&format!(r#"data-scale="{}""#, fmt_num(width / 1000.0))));
            assert!(html.contains(&format!("transform:scale({})", fmt_num(width / 1000.0))));
            assert!(!html.contains("aspect-ratio"));
        }
    }

    #[test]
    fn unresolved_mask_paints_plain_rectangle() {
        let doc = parse_document(&DOC.replace("masks/b1.png", "")).expect("doc");
        let scale = ScaleController::observed(1000.0, 500.0);
        let tree = build_overlay(&doc, RenderMode::Replace, &scale, &FontBook::default());
        let css = shape_css(&tree.elements[0].shapes[0]);
        assert!(css.contains("background-color:color-mix(in srgb, #ffffff 75%, transparent)"));
        assert!(!css.contains("mask-image"));
        assert!(!render_html(&tree).contains("mask-image"));
    }
}
