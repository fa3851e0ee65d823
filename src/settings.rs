use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::render::OutputFormat;
use crate::style::RenderMode;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub mode: RenderMode,
    /// Rendered container width; `None` renders at natural size.
    pub width: Option<f32>,
    pub format: OutputFormat,
    pub validate: bool,
    pub font_family: Option<String>,
    pub font_path: Option<String>,
    pub embed_assets: bool,
    pub asset_timeout: Duration,
    pub server_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: RenderMode::CopyOnly,
            width: None,
            format: OutputFormat::Html,
            validate: true,
            font_family: None,
            font_path: None,
            embed_assets: false,
            asset_timeout: Duration::from_secs(15),
            server_addr: "127.0.0.1:11400".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    render: Option<RenderSettings>,
    text: Option<TextSettings>,
    assets: Option<AssetSettings>,
    server: Option<ServerSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderSettings {
    mode: Option<String>,
    width: Option<f32>,
    format: Option<String>,
    validate: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct TextSettings {
    font_family: Option<String>,
    font_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AssetSettings {
    embed: Option<bool>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings
                .merge(parsed)
                .with_context(|| format!("invalid settings: {}", path.display()))?;
            debug!("settings: merged {}", path.display());
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) -> Result<()> {
        if let Some(render) = incoming.render {
            if let Some(mode) = render.mode {
                self.mode = mode.parse()?;
            }
            if let Some(width) = render.width {
                self.width = (width > 0.0).then_some(width);
            }
            if let Some(format) = render.format {
                self.format = format.parse()?;
            }
            if let Some(validate) = render.validate {
                self.validate = validate;
            }
        }
        if let Some(text) = incoming.text {
            if let Some(family) = text.font_family {
                if !family.trim().is_empty() {
                    self.font_family = Some(family);
                }
            }
            if let Some(path) = text.font_path {
                if !path.trim().is_empty() {
                    self.font_path = Some(path);
                }
            }
        }
        if let Some(assets) = incoming.assets {
            if let Some(embed) = assets.embed {
                self.embed_assets = embed;
            }
            if let Some(secs) = assets.timeout_secs {
                if secs > 0 {
                    self.asset_timeout = Duration::from_secs(secs);
                }
            }
        }
        if let Some(server) = incoming.server {
            if let Some(addr) = server.addr {
                if !addr.trim().is_empty() {
                    self.server_addr = addr;
                }
            }
        }
        Ok(())
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".page-overlay"))
        }
    })
}
