use serde::{Deserialize, Serialize};

use crate::document::PageOverlay;
use crate::render::OutputFormat;
use crate::style::RenderMode;
use crate::validate::ValidationIssue;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RenderBody {
    pub(crate) document: PageOverlay,
    #[serde(default)]
    pub(crate) mode: Option<RenderMode>,
    #[serde(default)]
    pub(crate) width: Option<f32>,
    #[serde(default)]
    pub(crate) format: Option<String>,
    #[serde(default)]
    pub(crate) hover: Vec<String>,
    #[serde(default)]
    pub(crate) validate: Option<bool>,
    #[serde(default)]
    pub(crate) embed_assets: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RenderResponse {
    pub(crate) mime: String,
    pub(crate) format: OutputFormat,
    pub(crate) scale: f32,
    /// Text formats verbatim, raster formats base64.
    pub(crate) content: String,
    pub(crate) base64: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidateBody {
    pub(crate) document: PageOverlay,
}

#[derive(Debug, Serialize)]
pub(crate) struct ValidateResponse {
    pub(crate) valid: bool,
    pub(crate) issues: Vec<IssuePayload>,
}

#[derive(Debug, Serialize)]
pub(crate) struct IssuePayload {
    #[serde(flatten)]
    pub(crate) issue: ValidationIssue,
    pub(crate) message: String,
}

impl From<ValidationIssue> for IssuePayload {
    fn from(issue: ValidationIssue) -> Self {
        let message = issue.to_string();
        Self { issue, message }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) issues: Vec<IssuePayload>,
}
