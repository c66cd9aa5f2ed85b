use std::{
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
    process::Stdio,
    time::Instant,
};

use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Environment forcing truecolor output even though stdout is not a TTY.
const FORCE_COLOR_ENV: (&str, &str) = ("FORCE_COLOR", "3");

#[derive(Debug, Error)]
pub(crate) enum InvokeError {
    #[error("failed to write temporary file: {0}")]
    Io(io::Error),
    #[error("kitsch CLI unavailable at `{path}`")]
    NotFound { path: String, source: io::Error },
    #[error("failed to spawn kitsch CLI: {0}")]
    Spawn(io::Error),
    #[error("kitsch CLI invocation failed (exit {exit_code:?}): {output}")]
    Exit {
        exit_code: Option<i32>,
        output: String,
    },
    #[error("failed to read captured output: {0}")]
    Read(io::Error),
}

/// Inputs handed to `kitsch prompt`, already prepared by the example renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PromptInputs {
    pub(crate) demo: String,
    pub(crate) config: String,
}

/// Runs the external `kitsch prompt` command against temporary input files.
#[derive(Debug, Clone)]
pub(crate) struct PromptCli {
    cli_path: PathBuf,
}

impl PromptCli {
    pub(crate) fn new(cli_path: PathBuf) -> Self {
        Self { cli_path }
    }

    pub(crate) fn cli_path(&self) -> &Path {
        &self.cli_path
    }

    /// Invoke the CLI and return its stdout and stderr interleaved in emission
    /// order. All temporary files are removed when this call returns.
    pub(crate) async fn run(&self, inputs: &PromptInputs) -> Result<String, InvokeError> {
        let started_at = Instant::now();

        let demo_file = write_temp_yaml("kitsch-demo-", &inputs.demo)?;
        let config_file = if inputs.config.trim().is_empty() {
            None
        } else {
            Some(write_temp_yaml("kitsch-config-", &inputs.config)?)
        };

        // stdout and stderr share one open file description, so writes land in
        // the order the child made them.
        let output_file = tempfile::Builder::new()
            .prefix("kitsch-output-")
            .suffix(".stdout")
            .tempfile()
            .map_err(InvokeError::Io)?;
        let stdout = output_file.as_file().try_clone().map_err(InvokeError::Io)?;
        let stderr = output_file.as_file().try_clone().map_err(InvokeError::Io)?;

        let mut command = Command::new(&self.cli_path);
        command.arg("prompt");
        if let Some(config_file) = config_file.as_ref() {
            command.arg("--config").arg(config_file.path());
        }
        command
            .arg("--demo")
            .arg(demo_file.path())
            .env(FORCE_COLOR_ENV.0, FORCE_COLOR_ENV.1)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr));

        debug!(
            target = "application::render::invoker",
            op = "invoker::run",
            cli_path = %self.cli_path.display(),
            demo_path = %demo_file.path().display(),
            has_config = config_file.is_some(),
            "Running kitsch prompt"
        );

        let cli_started_at = Instant::now();
        let status = command.status().await.map_err(|err| {
            warn!(
                target = "application::render::invoker",
                op = "invoker::run",
                result = "error",
                elapsed_ms = elapsed_ms(started_at),
                error_code = "spawn_cli",
                error = %err,
                "Failed to spawn kitsch CLI"
            );
            if err.kind() == ErrorKind::NotFound {
                InvokeError::NotFound {
                    path: self.cli_path.display().to_string(),
                    source: err,
                }
            } else {
                InvokeError::Spawn(err)
            }
        })?;

        let bytes = tokio::fs::read(output_file.path()).await.map_err(|err| {
            warn!(
                target = "application::render::invoker",
                op = "invoker::run",
                result = "error",
                elapsed_ms = elapsed_ms(started_at),
                error_code = "read_output",
                error = %err,
                "Failed to read captured kitsch output"
            );
            InvokeError::Read(err)
        })?;
        let output = String::from_utf8_lossy(&bytes).into_owned();

        if !status.success() {
            let exit_code = status.code();
            warn!(
                target = "application::render::invoker",
                op = "invoker::run",
                result = "error",
                elapsed_ms = elapsed_ms(started_at),
                cli_elapsed_ms = elapsed_ms(cli_started_at),
                exit_code = exit_code.map(i64::from).unwrap_or(-1),
                error_code = "kitsch_cli",
                output = %output,
                "kitsch CLI invocation failed"
            );
            return Err(InvokeError::Exit { exit_code, output });
        }

        info!(
            target = "application::render::invoker",
            op = "invoker::run",
            result = "ok",
            elapsed_ms = elapsed_ms(started_at),
            cli_elapsed_ms = elapsed_ms(cli_started_at),
            output_bytes = bytes.len(),
            "kitsch prompt rendered"
        );

        Ok(output)
    }
}

fn write_temp_yaml(prefix: &str, contents: &str) -> Result<NamedTempFile, InvokeError> {
    let mut file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".yaml")
        .tempfile()
        .map_err(InvokeError::Io)?;
    file.write_all(contents.as_bytes())
        .map_err(InvokeError::Io)?;
    file.flush().map_err(InvokeError::Io)?;
    Ok(file)
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}
