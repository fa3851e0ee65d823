use super::{escape_xml, fmt_num};
use crate::document::TextAlign;
use crate::hover::HoverState;
use crate::overlay::{ElementNode, OverlayTree, ShapeNode, TextNode};
use crate::style::{HOVER_OUTLINE_OFFSET, TRANSPARENT, resolve_hover_scale};

const DEBUG_OUTLINE_COLOR: &str = "#ff00ff";

pub fn render_svg(tree: &OverlayTree) -> String {
    let width = fmt_num(tree.rendered_width());
    let height = fmt_num(tree.rendered_height());

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}" data-mode="{mode}">"#,
        w = width,
        h = height,
        mode = tree.mode
    ));
    if !tree.image_src.trim().is_empty() {
        let href = escape_xml(&tree.image_src);
        svg.push_str(&format!(
            r#"<image href="{uri}" xlink:href="{uri}" x="0" y="0" width="{w}" height="{h}" preserveAspectRatio="none"/>"#,
            uri = href,
            w = width,
            h = height
        ));
    }
    svg.push_str(&format!(r#"<g transform="scale({})">"#, fmt_num(tree.scale)));
    for (index, element) in tree.paint_order() {
        render_element(&mut svg, index, element);
    }
    svg.push_str("</g></svg>");
    svg
}

fn render_element(svg: &mut String, index: usize, element: &ElementNode) {
    let hovered = element.hover_state == HoverState::Hovered;
    let fx = element.hover.as_ref();

    let mut defs = String::new();
    let mut attrs = format!(r#" data-id="{}""#, escape_xml(&element.id));
    if let Some(subtype) = &element.subtype {
        attrs.push_str(&format!(r#" data-subtype="{}""#, escape_xml(subtype)));
    }
    if hovered {
        let (cx, cy) = element.bounds.center();
        let scale = resolve_hover_scale(fx);
        attrs.push_str(&format!(
            r#" transform="translate({cx} {cy}) scale({s}) translate({ncx} {ncy})""#,
            cx = fmt_num(cx),
            cy = fmt_num(cy),
            s = fmt_num(scale),
            ncx = fmt_num(-cx),
            ncy = fmt_num(-cy)
        ));
        if let Some(color) = fx.and_then(|fx| fx.hover_fill.as_deref()) {
            let filter_id = format!("glow-{}", index);
            defs.push_str(&format!(
                r#"<filter id="{id}" x="-20%" y="-20%" width="140%" height="140%"><feDropShadow dx="0" dy="0" stdDeviation="3" flood-color="{color}"/></filter>"#,
                id = filter_id,
                color = escape_xml(color)
            ));
            attrs.push_str(&format!(r#" filter="url(#{})""#, filter_id));
        }
    }

    let mut body = String::new();
    for (shape_index, shape) in element.shapes.iter().enumerate() {
        render_shape(&mut body, &mut defs, index, shape_index, shape);
    }
    if let Some(bbox) = &element.text.debug_outline {
        body.push_str(&format!(
            r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="none" stroke="{color}" stroke-width="1" stroke-dasharray="4 3" pointer-events="none"/>"#,
            x = fmt_num(bbox.x),
            y = fmt_num(bbox.y),
            w = fmt_num(bbox.w),
            h = fmt_num(bbox.h),
            color = DEBUG_OUTLINE_COLOR
        ));
    }
    render_text(&mut body, &element.text);
    if hovered {
        if let Some(outline) = fx.and_then(|fx| fx.outline.as_ref()) {
            let inset = HOVER_OUTLINE_OFFSET + outline.width * 0.5;
            let bounds = element.bounds;
            body.push_str(&format!(
                r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="none" stroke="{color}" stroke-width="{sw}"/>"#,
                x = fmt_num(bounds.x - inset),
                y = fmt_num(bounds.y - inset),
                w = fmt_num(bounds.w + inset * 2.0),
                h = fmt_num(bounds.h + inset * 2.0),
                color = escape_xml(&outline.color),
                sw = fmt_num(outline.width)
            ));
        }
    }

    if !defs.is_empty() {
        svg.push_str(&format!("<defs>{}</defs>", defs));
    }
    svg.push_str(&format!("<g{}>{}</g>", attrs, body));
}

fn render_shape(
    body: &mut String,
    defs: &mut String,
    index: usize,
    shape_index: usize,
    shape: &ShapeNode,
) {
    let bbox = shape.bbox;
    let mut mask_attr = String::new();
    if shape.has_mask() {
        let mask_id = format!("mask-{}-{}", index, shape_index);
        let href = escape_xml(&shape.mask_src);
        defs.push_str(&format!(
            r#"<mask id="{id}" mask-type="alpha" maskUnits="userSpaceOnUse" x="{x}" y="{y}" width="{w}" height="{h}"><image href="{href}" xlink:href="{href}" x="{x}" y="{y}" width="{w}" height="{h}" preserveAspectRatio="none"/></mask>"#,
            id = mask_id,
            href = href,
            x = fmt_num(bbox.x),
            y = fmt_num(bbox.y),
            w = fmt_num(bbox.w),
            h = fmt_num(bbox.h)
        ));
        mask_attr = format!(r#" mask="url(#{})""#, mask_id);
    }
    let mut stroke_attr = String::new();
    if let Some(stroke) = &shape.stroke {
        stroke_attr = format!(
            r#" stroke="{}" stroke-width="{}""#,
            escape_xml(&stroke.color),
            fmt_num(stroke.width)
        );
    }
    body.push_str(&format!(
        r#"<rect data-shape="" x="{x}" y="{y}" width="{w}" height="{h}" fill="{fill}" fill-opacity="{opacity}"{stroke}{mask} pointer-events="none"/>"#,
        x = fmt_num(bbox.x),
        y = fmt_num(bbox.y),
        w = fmt_num(bbox.w),
        h = fmt_num(bbox.h),
        fill = escape_xml(&shape.fill.color),
        opacity = fmt_num(shape.fill.opacity),
        stroke = stroke_attr,
        mask = mask_attr
    ));
}

fn render_text(body: &mut String, text: &TextNode) {
    let style = &text.style;
    let bbox = text.bbox;
    let (x, anchor) = match style.align {
        TextAlign::Left | TextAlign::Justify => (bbox.x, "start"),
        TextAlign::Center => (bbox.x + bbox.w * 0.5, "middle"),
        TextAlign::Right => (bbox.x + bbox.w, "end"),
    };
    let line_height = style.line_height_px();
    // Baseline sits a little below the middle of the first line box.
    let first_baseline = bbox.y + line_height * 0.5 + style.font_size * 0.35;

    let (fill, fill_opacity) = if style.color == TRANSPARENT {
        ("#000000".to_string(), "0")
    } else {
        (escape_xml(&style.color), "1")
    };
    let mut attrs = format!(
        r#" x="{x}" y="{y}" font-family="{family}" font-size="{size}" font-weight="{weight}" letter-spacing="{spacing}" text-anchor="{anchor}" fill="{fill}" fill-opacity="{fill_opacity}""#,
        x = fmt_num(x),
        y = fmt_num(first_baseline),
        family = escape_xml(&style.font_family),
        size = fmt_num(style.font_size),
        weight = style.font_weight,
        spacing = fmt_num(style.letter_spacing),
        anchor = anchor,
        fill = fill,
        fill_opacity = fill_opacity
    );
    if let Some(stroke) = &style.stroke {
        attrs.push_str(&format!(
            r#" stroke="{}" stroke-width="{}" stroke-linejoin="round" paint-order="stroke""#,
            escape_xml(&stroke.color),
            fmt_num(stroke.width)
        ));
    }
    let select = text.user_select();
    attrs.push_str(&format!(r#" style="user-select:{select};cursor:{}""#, text.cursor()));

    body.push_str(&format!("<text{}>", attrs));
    for (idx, line) in text.lines.iter().enumerate() {
        let dy = if idx == 0 { 0.0 } else { line_height };
        body.push_str(&format!(
            r#"<tspan x="{x}" dy="{dy}">{text}</tspan>"#,
            x = fmt_num(x),
            dy = fmt_num(dy),
            text = escape_xml(line)
        ));
    }
    body.push_str("</text>");
}
