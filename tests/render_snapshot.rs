use page_overlay::overlay::FontBook;
use page_overlay::render::html::render_html;
use page_overlay::scale::ScaleController;
use page_overlay::{RenderMode, build_overlay, parse_document};

#[test]
fn html_snapshot() {
    let document = parse_document(
        r#"{
            "version": 1,
            "image": { "src": "p.png", "naturalWidth": 200, "naturalHeight": 100 },
            "elements": [
                {
                    "id": "a",
                    "type": "text",
                    "container": { "kind": "none" },
                    "text": { "value": "Hi", "bbox": { "x": 10, "y": 20, "w": 50, "h": 30 } }
                }
            ]
        }"#,
    )
    .unwrap();
    let scale = ScaleController::observed(200.0, 100.0);
    let html = render_html(&build_overlay(&document, RenderMode::Replace, &scale, &FontBook::default()));
    insta::assert_snapshot!(html, @r##"<div class="page-overlay" data-mode="replace" data-scale="0.5" style="position:relative;width:100px;height:50px;overflow:hidden"><img class="page-overlay__image" src="p.png" alt="" draggable="false" style="position:absolute;left:0;top:0;width:100%;height:100%;user-select:none"><div class="page-overlay__root" style="position:absolute;left:0;top:0;width:200px;height:100px;transform:scale(0.5);transform-origin:0 0"><div class="page-overlay__element" data-id="a" data-hover="idle" style="position:absolute;left:10px;top:20px;width:50px;height:30px;z-index:1;pointer-events:auto"><div class="page-overlay__natural" style="position:absolute;left:-10px;top:-20px;width:0;height:0"><p class="page-overlay__text" style="position:absolute;left:10px;top:20px;width:50px;height:30px;margin:0;font-family:system-ui, -apple-system, &quot;Segoe UI&quot;, Roboto, &quot;Helvetica Neue&quot;, Arial, sans-serif;font-size:16px;font-weight:600;line-height:1.05;letter-spacing:0px;text-align:left;color:#000000;white-space:pre-wrap;overflow-wrap:break-word;-webkit-user-select:text;user-select:text;cursor:text">Hi</p></div></div></div></div>"##);
}
