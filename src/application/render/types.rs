use std::{fmt, str::FromStr};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Serialisation target for rendered documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// CommonMark with embedded JSX, for MDX-based site generators.
    #[default]
    Mdx,
    /// Standalone HTML.
    Html,
}

impl OutputFormat {
    /// File extension used when writing documents in this format.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            OutputFormat::Mdx => None,
            OutputFormat::Html => Some("html"),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Mdx => f.write_str("mdx"),
            OutputFormat::Html => f.write_str("html"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("unknown output format `{0}`, expected `mdx` or `html`")]
pub struct ParseOutputFormatError(String);

impl FromStr for OutputFormat {
    type Err = ParseOutputFormatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mdx" => Ok(OutputFormat::Mdx),
            "html" => Ok(OutputFormat::Html),
            _ => Err(ParseOutputFormatError(value.to_string())),
        }
    }
}

/// Rendering request passed into the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Name of the document, used for log and span context.
    pub document: String,
    /// Markdown source of the document.
    pub markdown: String,
}

impl RenderRequest {
    pub fn new(document: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            markdown: markdown.into(),
        }
    }
}

/// Rendering result returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    /// The rewritten document in the configured output format.
    pub document: String,
    /// Number of example blocks encountered.
    pub examples: usize,
    /// Number of example blocks rendered as inline diagnostics.
    pub failed_examples: usize,
}

/// Document-level failures. Example failures never surface here; they are
/// rendered inline instead.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("document formatting failed: {message}")]
    Format { message: String },
}

/// Trait exposed by the rendering pipeline.
///
/// The future is not `Send`: the parsed document tree lives in a local arena
/// across the await points of example rendering.
#[async_trait(?Send)]
pub trait RenderService {
    async fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError>;
}
