use axum::http::StatusCode;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::debug;

use crate::render::OutputFormat;
use crate::renderer::RenderRequest;
use crate::validate::{ValidationErrors, validate};

use super::models::{IssuePayload, RenderBody, RenderResponse};
use super::state::ServerState;

#[derive(Debug)]
pub(crate) struct ServerError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
    pub(crate) issues: Vec<IssuePayload>,
}

impl ServerError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            issues: Vec::new(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            issues: Vec::new(),
        }
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::internal(format!("{:#}", err))
    }
}

impl From<ValidationErrors> for ServerError {
    fn from(err: ValidationErrors) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "invalid page overlay".to_string(),
            issues: err.issues.into_iter().map(IssuePayload::from).collect(),
        }
    }
}

pub(crate) async fn render_request(
    state: &ServerState,
    body: RenderBody,
) -> Result<RenderResponse, ServerError> {
    let settings = state.renderer.settings();
    let format = match body.format.as_deref() {
        Some(value) => value
            .parse::<OutputFormat>()
            .map_err(|err| ServerError::bad_request(err.to_string()))?,
        None => settings.format,
    };
    if let Some(width) = body.width {
        if !width.is_finite() || width < 0.0 {
            return Err(ServerError::bad_request(format!(
                "width must be a non-negative number (got {})",
                width
            )));
        }
    }
    if body.validate.unwrap_or(settings.validate) {
        validate(&body.document)?;
    }

    let request = RenderRequest {
        mode: body.mode.unwrap_or(settings.mode),
        width: body.width.or(settings.width),
        format,
        hover: body.hover,
        embed_assets: body.embed_assets.unwrap_or(settings.embed_assets),
        base_dir: None,
    };
    debug!(
        "server: render mode={} format={} width={:?}",
        request.mode, request.format, request.width
    );
    let output = state.renderer.render(&body.document, &request).await?;

    let (content, base64) = if format.is_raster() {
        (BASE64.encode(&output.bytes), true)
    } else {
        let text = String::from_utf8(output.bytes)
            .map_err(|err| ServerError::internal(format!("render produced invalid UTF-8: {}", err)))?;
        (text, false)
    };
    Ok(RenderResponse {
        mime: output.mime.to_string(),
        format,
        scale: output.scale,
        content,
        base64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;
    use crate::renderer::Renderer;
    use crate::settings::Settings;

    fn state() -> ServerState {
        ServerState {
            renderer: Renderer::new(Settings::default()).expect("renderer"),
        }
    }

    fn body(document: &str, format: Option<&str>) -> RenderBody {
        RenderBody {
            document: parse_document(document).expect("doc"),
            mode: None,
            width: Some(500.0),
            format: format.map(str::to_string),
            hover: Vec::new(),
            validate: None,
            embed_assets: None,
        }
    }

    const DOC: &str = r#"{
        "version": 1,
        "image": { "src": "page.png", "naturalWidth": 1000, "naturalHeight": 1000 },
        "elements": [
            {
                "id": "b1",
                "type": "text",
                "container": {
                    "kind": "mask",
                    "bbox": { "x": 10, "y": 10, "w": 100, "h": 50 },
                    "maskSrc": "masks/b1.png"
                },
                "text": { "value": "Hello", "bbox": { "x": 10, "y": 10, "w": 100, "h": 50 } }
            }
        ]
    }"#;

    #[tokio::test]
    async fn renders_html_with_settings_defaults() {
        let response = render_request(&state(), body(DOC, None))
            .await
            .expect("render");
        assert_eq!(response.mime, "text/html");
        assert_eq!(response.scale, 0.5);
        assert!(!response.base64);
        assert!(response.content.contains("Hello"));
    }

    #[tokio::test]
    async fn unknown_format_is_a_bad_request() {
        let err = render_request(&state(), body(DOC, Some("gif")))
            .await
            .expect_err("bad format");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_document_lists_issues() {
        let doc = DOC.replace("\"version\": 1", "\"version\": 7");
        let err = render_request(&state(), body(&doc, None))
            .await
            .expect_err("invalid");
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.issues.len(), 1);
        assert!(err.issues[0].message.contains("unsupported document version 7"));
    }
}
