//! Inlining of the page image and mask images as `data:` URIs so a render
//! does not depend on anything outside the output file.

use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::document::{Container, PageOverlay};

const OCTET_STREAM_MIME: &str = "application/octet-stream";

pub struct AssetLoader {
    client: reqwest::Client,
    base_dir: Option<PathBuf>,
    cache: HashMap<String, String>,
}

impl AssetLoader {
    pub fn new(base_dir: Option<&Path>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .with_context(|| "failed to build HTTP client")?;
        Ok(Self {
            client,
            base_dir: base_dir.map(Path::to_path_buf),
            cache: HashMap::new(),
        })
    }

    /// `data:` URI for `source`, fetched over HTTP(S) or read from disk.
    pub async fn data_uri(&mut self, source: &str) -> Result<String> {
        let source = source.trim();
        if source.starts_with("data:") {
            return Ok(source.to_string());
        }
        if let Some(cached) = self.cache.get(source) {
            return Ok(cached.clone());
        }
        let (bytes, declared) = if is_remote(source) {
            self.fetch(source).await?
        } else {
            let path = self.resolve_path(source);
            let bytes = std::fs::read(&path)
                .with_context(|| format!("failed to read asset: {}", path.display()))?;
            (bytes, None)
        };
        let mime = sniff_mime(&bytes)
            .or(declared)
            .unwrap_or_else(|| OCTET_STREAM_MIME.to_string());
        let uri = format!("data:{};base64,{}", mime, BASE64.encode(&bytes));
        self.cache.insert(source.to_string(), uri.clone());
        Ok(uri)
    }

    async fn fetch(&self, url: &str) -> Result<(Vec<u8>, Option<String>)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to fetch asset: {}", url))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("asset request failed ({}): {}", status, url));
        }
        let declared = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .filter(|value| !value.is_empty());
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("failed to read asset body: {}", url))?;
        Ok((bytes.to_vec(), declared))
    }

    fn resolve_path(&self, source: &str) -> PathBuf {
        let source = source.strip_prefix("file://").unwrap_or(source);
        let path = Path::new(source);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Copy of `document` with every asset inlined.
///
/// A mask that cannot be loaded is dropped so its shape falls back to a
/// plain rectangle; a page image that cannot be loaded keeps its reference.
pub async fn embed_assets(
    document: &PageOverlay,
    base_dir: Option<&Path>,
    timeout: Duration,
) -> Result<PageOverlay> {
    let mut loader = AssetLoader::new(base_dir, timeout)?;
    let mut embedded = document.clone();

    let image_src = document.image.effective_src().to_string();
    match loader.data_uri(&image_src).await {
        Ok(uri) => {
            embedded.image.signed_src = None;
            embedded.image.src = uri;
        }
        Err(err) => warn!("assets: page image not embedded ({:#})", err),
    }

    let mut inlined = 0usize;
    for element in &mut embedded.elements {
        let shapes = match &mut element.container {
            Container::None => continue,
            Container::Mask(shape) => std::slice::from_mut(shape),
            Container::Group { shapes } => shapes.as_mut_slice(),
        };
        for shape in shapes {
            if shape.mask_src.trim().is_empty() {
                continue;
            }
            match loader.data_uri(&shape.mask_src).await {
                Ok(uri) => {
                    shape.mask_src = uri;
                    inlined += 1;
                }
                Err(err) => {
                    warn!(
                        "assets: mask for '{}' unavailable, drawing unclipped ({:#})",
                        element.id, err
                    );
                    shape.mask_src.clear();
                }
            }
        }
    }
    info!("assets: inlined {} mask(s)", inlined);
    Ok(embedded)
}

fn is_remote(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn sniff_mime(bytes: &[u8]) -> Option<String> {
    let kind = infer::get(bytes)?;
    let detected = kind.mime_type();
    detected
        .starts_with("image/")
        .then(|| detected.to_string())
}
