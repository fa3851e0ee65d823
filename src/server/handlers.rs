use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::info;

use crate::render::OutputFormat;
use crate::renderer::Renderer;
use crate::style::RenderMode;
use crate::validate::collect_issues;

use super::models::{ErrorResponse, RenderBody, RenderResponse, ValidateBody, ValidateResponse};
use super::render::render_request;
use super::state::ServerState;

pub fn router(renderer: Renderer) -> Router {
    let state = Arc::new(ServerState { renderer });
    Router::new()
        .route("/health", get(health))
        .route("/render", post(render))
        .route("/validate", post(validate))
        .route("/settings", get(settings_info))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware))
}

pub async fn run_server(renderer: Renderer, addr: String) -> Result<()> {
    let app = router(renderer);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind server address: {}", addr))?;
    info!("server: listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type"),
    );
}

async fn render(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<RenderBody>,
) -> Result<Json<RenderResponse>, (StatusCode, Json<ErrorResponse>)> {
    let state = state.clone();
    let handle = tokio::runtime::Handle::current();
    // Rasterizing is CPU bound; keep it off the async workers.
    let result = tokio::task::spawn_blocking(move || {
        handle.block_on(render_request(state.as_ref(), payload))
    })
    .await
    .map_err(|err| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("server task failed: {}", err),
                issues: Vec::new(),
            }),
        )
    })?;

    match result {
        Ok(response) => Ok(Json(response)),
        Err(err) => Err((
            err.status,
            Json(ErrorResponse {
                error: err.message,
                issues: err.issues,
            }),
        )),
    }
}

async fn validate(Json(payload): Json<ValidateBody>) -> Json<ValidateResponse> {
    let issues = collect_issues(&payload.document);
    Json(ValidateResponse {
        valid: issues.is_empty(),
        issues: issues.into_iter().map(Into::into).collect(),
    })
}

#[derive(serde::Serialize)]
struct SettingsInfo {
    mode: RenderMode,
    modes: Vec<RenderMode>,
    format: OutputFormat,
    formats: Vec<OutputFormat>,
    width: Option<f32>,
    validate: bool,
    embed_assets: bool,
    font_family: Option<String>,
}

async fn settings_info(State(state): State<Arc<ServerState>>) -> Json<SettingsInfo> {
    let settings = state.renderer.settings();
    Json(SettingsInfo {
        mode: settings.mode,
        modes: vec![RenderMode::CopyOnly, RenderMode::Replace, RenderMode::Debug],
        format: settings.format,
        formats: vec![
            OutputFormat::Html,
            OutputFormat::Svg,
            OutputFormat::Png,
            OutputFormat::Jpeg,
            OutputFormat::Webp,
            OutputFormat::Tree,
        ],
        width: settings.width,
        validate: settings.validate,
        embed_assets: settings.embed_assets,
        font_family: settings.font_family.clone(),
    })
}
