use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use tracing::info;

pub mod assets;
pub mod document;
pub mod hover;
pub mod logging;
pub mod overlay;
pub mod render;
mod renderer;
pub mod scale;
pub mod server;
pub mod settings;
pub mod style;
pub mod validate;

#[cfg(test)]
mod test_util;

pub use document::{PageOverlay, parse_document};
pub use overlay::{OverlayTree, build_overlay};
pub use render::OutputFormat;
pub use renderer::{RenderOutput, RenderRequest, Renderer};
pub use style::RenderMode;

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Document path; `None` or `-` reads the input argument instead.
    pub document: Option<String>,
    pub mode: Option<RenderMode>,
    pub width: Option<f32>,
    pub format: Option<OutputFormat>,
    pub hover: Vec<String>,
    pub embed_assets: bool,
    pub no_validate: bool,
    pub validate_only: bool,
    pub settings_path: Option<String>,
    pub font_path: Option<String>,
    pub server: Option<String>,
}

impl Config {
    fn document_path(&self) -> Option<&Path> {
        self.document
            .as_deref()
            .filter(|path| *path != "-")
            .map(Path::new)
    }
}

/// Output of one CLI run: rendered bytes, or a validation report.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

pub async fn run(config: Config, input: Option<String>) -> Result<RunOutput> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let mut settings = settings::load_settings(settings_path)?;
    if let Some(font_path) = &config.font_path {
        settings.font_path = Some(font_path.clone());
    }

    if let Some(addr) = &config.server {
        let addr = if addr.trim().is_empty() {
            settings.server_addr.clone()
        } else {
            addr.clone()
        };
        let renderer = Renderer::new(settings)?;
        server::run_server(renderer, addr).await?;
        return Ok(RunOutput {
            mime: "text/plain",
            bytes: Vec::new(),
        });
    }

    let (document, base_dir) = read_document(&config, input)?;

    if config.validate_only {
        return Ok(RunOutput {
            mime: "text/plain",
            bytes: format_validation_report(&document).into_bytes(),
        });
    }
    if settings.validate && !config.no_validate {
        validate::validate(&document)?;
    }

    let request = RenderRequest {
        mode: config.mode.unwrap_or(settings.mode),
        width: config.width.or(settings.width),
        format: config.format.unwrap_or(settings.format),
        hover: config.hover.clone(),
        embed_assets: config.embed_assets || settings.embed_assets,
        base_dir,
    };
    let renderer = Renderer::new(settings)?;
    let output = renderer.render(&document, &request).await?;
    info!(
        "rendered {} ({} bytes, scale {})",
        output.mime,
        output.bytes.len(),
        output.scale
    );
    Ok(RunOutput {
        mime: output.mime,
        bytes: output.bytes,
    })
}

fn read_document(config: &Config, input: Option<String>) -> Result<(PageOverlay, Option<PathBuf>)> {
    if let Some(path) = config.document_path() {
        let document = document::load_document(path)?;
        let base_dir = path.parent().map(|dir| {
            if dir.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                dir.to_path_buf()
            }
        });
        return Ok((document, base_dir));
    }
    let input = input.unwrap_or_default();
    if input.trim().is_empty() {
        return Err(anyhow!("stdin is empty"));
    }
    let document = parse_document(&input).with_context(|| "failed to read document from stdin")?;
    let base_dir = std::env::current_dir().ok();
    Ok((document, base_dir))
}

fn format_validation_report(document: &PageOverlay) -> String {
    let issues = validate::collect_issues(document);
    if issues.is_empty() {
        return "ok".to_string();
    }
    let mut lines = vec![format!("{} issue(s)", issues.len())];
    lines.extend(issues.iter().map(|issue| format!("- {}", issue)));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::with_temp_home;

    const DOC: &str = r#"{
        "version": 1,
        "image": { "src": "page.png", "naturalWidth": 800, "naturalHeight": 1200 },
        "elements": [
            {
                "id": "b1",
                "type": "text",
                "container": { "kind": "none" },
                "text": { "value": "Hey", "bbox": { "x": 0, "y": 0, "w": 80, "h": 20 } }
            }
        ]
    }"#;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime")
            .block_on(future)
    }

    #[test]
    fn renders_stdin_document() {
        with_temp_home(|_| {
            let config = Config {
                width: Some(400.0),
                ..Config::default()
            };
            let output = block_on(run(config, Some(DOC.to_string()))).expect("run");
            assert_eq!(output.mime, "text/html");
            let html = String::from_utf8(output.bytes).expect("utf8");
            assert!(html.contains("transform:scale(0.5)"));
        });
    }

    #[test]
    fn empty_stdin_is_an_error() {
        with_temp_home(|_| {
            let err = block_on(run(Config::default(), Some("  ".to_string()))).expect_err("empty");
            assert_eq!(err.to_string(), "stdin is empty");
        });
    }

    #[test]
    fn validate_only_reports_issues() {
        with_temp_home(|_| {
            let doc = DOC.replace("\"naturalWidth\": 800", "\"naturalWidth\": 0");
            let config = Config {
                validate_only: true,
                ..Config::default()
            };
            let output = block_on(run(config, Some(doc))).expect("run");
            let report = String::from_utf8(output.bytes).expect("utf8");
            assert!(report.starts_with("1 issue(s)"));
            assert!(report.contains("natural size"));
        });
    }

    #[test]
    fn invalid_document_is_rejected_unless_skipped() {
        with_temp_home(|_| {
            let doc = DOC.replace("\"version\": 1", "\"version\": 2");
            let err = block_on(run(Config::default(), Some(doc.clone()))).expect_err("invalid");
            assert!(err.to_string().contains("unsupported document version 2"));

            let config = Config {
                no_validate: true,
                ..Config::default()
            };
            assert!(block_on(run(config, Some(doc))).is_ok());
        });
    }

    #[test]
    fn reads_document_from_file() {
        with_temp_home(|home| {
            let path = home.join("page.json");
            std::fs::write(&path, DOC).expect("write");
            let config = Config {
                document: Some(path.to_string_lossy().to_string()),
                format: Some(OutputFormat::Svg),
                ..Config::default()
            };
            let output = block_on(run(config, None)).expect("run");
            assert_eq!(output.mime, "image/svg+xml");
        });
    }
}
