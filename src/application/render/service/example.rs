//! Rendering of a single `kitsch` example block into a prompt fragment.
//!
//! An example payload is YAML for the prompt renderer, optionally preceded by
//! a demo context and a `---` line:
//!
//! ```text
//! cwd: /users/jwalton/dev
//! ---
//! prompt: '${CWD}/sample.yaml'
//! ```
//!
//! Failures never escape [`ExampleRenderer::render`]; they come back as an
//! inline diagnostic fragment so one broken example cannot abort a build.

use std::{error::Error as StdError, path::PathBuf, time::Instant};

use metrics::{counter, histogram};
use tracing::{info, instrument, warn};
use tracing_error::{SpanTrace, SpanTraceStatus};

use super::{
    ansi::{AnsiConverter, strip_ansi},
    escape::escape_text,
    flex::{flexible_space_directive, render_line},
    invoker::{InvokeError, PromptCli, PromptInputs},
    markup::{LINE_BREAK, MarkupWriter},
};

const DELIMITER: &str = "---";
const CWD_PLACEHOLDER: &str = "${CWD}";
const ERROR_PREFIX: &str = "Error running example: ";

/// The two logical sections of an example payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExampleSections {
    pub(crate) demo: String,
    pub(crate) config: String,
}

/// Split a payload on its `---` line. Exactly one delimiter line separates demo
/// context from configuration; with none, or with several, the whole payload is
/// treated as configuration.
pub(crate) fn split_payload(payload: &str) -> ExampleSections {
    let lines: Vec<&str> = payload.split('\n').collect();
    let delimiters: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.trim() == DELIMITER)
        .map(|(index, _)| index)
        .collect();

    match delimiters.as_slice() {
        [index] => ExampleSections {
            demo: lines[..*index].join("\n"),
            config: lines[index + 1..].join("\n"),
        },
        _ => ExampleSections {
            demo: String::new(),
            config: payload.to_string(),
        },
    }
}

/// Build the renderer inputs: the demo gains the flexible-space directive and
/// `${CWD}` in the configuration resolves to `docs_root`.
pub(crate) fn prepare_inputs(payload: &str, docs_root: &str) -> PromptInputs {
    let ExampleSections { mut demo, config } = split_payload(payload);

    if !demo.is_empty() && !demo.ends_with('\n') {
        demo.push('\n');
    }
    demo.push_str(&flexible_space_directive());
    demo.push('\n');

    PromptInputs {
        demo,
        config: config.replace(CWD_PLACEHOLDER, docs_root),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RenderedExample {
    pub(crate) fragment: String,
    pub(crate) succeeded: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct ExampleRenderer {
    cli: PromptCli,
    docs_root: PathBuf,
    writer: MarkupWriter,
}

impl ExampleRenderer {
    pub(crate) fn new(cli: PromptCli, docs_root: PathBuf, writer: MarkupWriter) -> Self {
        Self {
            cli,
            docs_root,
            writer,
        }
    }

    #[instrument(
        name = "render_example",
        skip_all,
        fields(cli_path = %self.cli.cli_path().display(), payload_bytes = payload.len())
    )]
    pub(crate) async fn render(&self, payload: &str) -> RenderedExample {
        let started_at = Instant::now();
        let docs_root = self.docs_root.display().to_string();
        let inputs = prepare_inputs(payload, &docs_root);

        let rendered = match self.cli.run(&inputs).await {
            Ok(output) => {
                counter!("kitsch_docs_examples_rendered_total").increment(1);
                info!(
                    target = "application::render::example",
                    op = "example::render",
                    result = "ok",
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    "Example rendered"
                );
                RenderedExample {
                    fragment: self.writer.container(&self.render_output(&output)),
                    succeeded: true,
                }
            }
            Err(err) => {
                counter!("kitsch_docs_examples_failed_total").increment(1);
                warn!(
                    target = "application::render::example",
                    op = "example::render",
                    result = "error",
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    error = %err,
                    "Example failed; emitting inline diagnostic"
                );
                RenderedExample {
                    fragment: self.writer.container(&self.render_failure(&err)),
                    succeeded: false,
                }
            }
        };

        histogram!("kitsch_docs_example_render_ms")
            .record(started_at.elapsed().as_secs_f64() * 1000.0);
        rendered
    }

    /// Escape captured output and convert it line by line. ANSI state carries
    /// from one line to the next.
    fn render_output(&self, output: &str) -> String {
        let escaped = escape_text(output, self.writer.dialect());
        let mut converter = AnsiConverter::new();
        let lines: Vec<&str> = escaped.split('\n').collect();

        let mut body = String::with_capacity(escaped.len() * 2);
        for (index, line) in lines.iter().enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let rendered = render_line(line, &mut converter, &self.writer);
            body.push_str(&rendered.markup);
            if index + 1 < lines.len() && !rendered.is_flex_row {
                body.push_str(LINE_BREAK);
            }
        }
        body
    }

    fn render_failure(&self, error: &InvokeError) -> String {
        let mut detail = format!("{ERROR_PREFIX}{error}");
        let mut source = error.source();
        while let Some(inner) = source {
            detail.push_str(&format!("\ncaused by: {inner}"));
            source = inner.source();
        }

        let trace = SpanTrace::capture();
        if trace.status() == SpanTraceStatus::CAPTURED {
            detail.push_str(&format!("\n{trace}"));
        }

        // Captured output of a failed run still carries colour codes.
        escape_text(&strip_ansi(&detail), self.writer.dialect())
            .split('\n')
            .collect::<Vec<_>>()
            .join(LINE_BREAK)
    }
}
