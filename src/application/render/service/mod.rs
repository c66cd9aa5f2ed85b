mod ansi;
mod config;
mod escape;
mod example;
mod flex;
mod invoker;
mod markup;
mod rewrite;

use std::path::PathBuf;

use async_trait::async_trait;
use comrak::{Arena, format_commonmark, format_html, nodes::AstNode, parse_document};
use tracing::info;

use crate::application::render::types::{
    OutputFormat, RenderError, RenderOutput, RenderRequest, RenderService,
};
use crate::config::{DEFAULT_FOREGROUND, DEFAULT_KITSCH_CLI_PATH, DEFAULT_LANGUAGE};

use self::config::default_options;
use example::ExampleRenderer;
use invoker::PromptCli;
use markup::{MarkupDialect, MarkupWriter};
use rewrite::{RewriteOutcome, rewrite_ast};

/// Comrak-based pipeline that renders `kitsch` example blocks in place.
pub struct ComrakRenderService {
    options: comrak::Options<'static>,
    examples: ExampleRenderer,
    language: String,
    format: OutputFormat,
}

impl ComrakRenderService {
    pub fn new(config: RenderPipelineConfig) -> Self {
        let dialect = match config.format {
            OutputFormat::Mdx => MarkupDialect::Mdx,
            OutputFormat::Html => MarkupDialect::Html,
        };
        let examples = ExampleRenderer::new(
            PromptCli::new(config.kitsch_cli_path),
            config.docs_root,
            MarkupWriter::new(dialect, config.default_foreground),
        );

        Self {
            options: default_options(),
            examples,
            language: config.language,
            format: config.format,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

#[async_trait(?Send)]
impl RenderService for ComrakRenderService {
    async fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError> {
        let arena = Arena::new();
        let root = parse_document(&arena, &request.markdown, &self.options);

        let outcome = rewrite_stage(root, &self.examples, &self.language, &request.document).await;
        let document = format_stage(root, &self.options, self.format)?;

        info!(
            target = "application::render::service",
            document = %request.document,
            examples = outcome.examples,
            failed_examples = outcome.failed_examples,
            "Document rendered"
        );

        Ok(RenderOutput {
            document,
            examples: outcome.examples,
            failed_examples: outcome.failed_examples,
        })
    }
}

/// Explicit configuration for the render pipeline. Nothing in the pipeline
/// reads the process environment.
#[derive(Debug, Clone)]
pub struct RenderPipelineConfig {
    pub kitsch_cli_path: PathBuf,
    pub docs_root: PathBuf,
    pub language: String,
    pub format: OutputFormat,
    pub default_foreground: String,
}

impl Default for RenderPipelineConfig {
    fn default() -> Self {
        Self {
            kitsch_cli_path: PathBuf::from(DEFAULT_KITSCH_CLI_PATH),
            docs_root: PathBuf::from("."),
            language: DEFAULT_LANGUAGE.to_string(),
            format: OutputFormat::default(),
            default_foreground: DEFAULT_FOREGROUND.to_string(),
        }
    }
}

impl From<&crate::config::RenderSettings> for RenderPipelineConfig {
    fn from(settings: &crate::config::RenderSettings) -> Self {
        Self {
            kitsch_cli_path: settings.kitsch_cli_path.clone(),
            docs_root: settings.docs_root.clone(),
            language: settings.language.clone(),
            format: settings.format,
            default_foreground: settings.default_foreground.clone(),
        }
    }
}

async fn rewrite_stage<'a>(
    root: &'a AstNode<'a>,
    examples: &ExampleRenderer,
    language: &str,
    document: &str,
) -> RewriteOutcome {
    rewrite_ast(root, examples, language, document).await
}

fn format_stage<'a>(
    root: &'a AstNode<'a>,
    options: &comrak::Options<'static>,
    format: OutputFormat,
) -> Result<String, RenderError> {
    let mut output = String::new();
    let result = match format {
        OutputFormat::Mdx => format_commonmark(root, options, &mut output),
        OutputFormat::Html => format_html(root, options, &mut output),
    };
    result.map_err(|err| RenderError::Format {
        message: err.to_string(),
    })?;
    Ok(output)
}
