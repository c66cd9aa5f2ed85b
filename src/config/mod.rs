//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::render::OutputFormat;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "kitsch-docs";
const ENV_PREFIX: &str = "KITSCH_DOCS";
pub(crate) const DEFAULT_KITSCH_CLI_PATH: &str = "kitsch";
pub(crate) const DEFAULT_LANGUAGE: &str = "kitsch";
pub(crate) const DEFAULT_FOREGROUND: &str = "#cccccc";

/// Command-line arguments for the kitsch-docs binary.
#[derive(Debug, Parser)]
#[command(
    name = "kitsch-docs",
    version,
    about = "Render kitsch prompt examples in documentation"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "KITSCH_DOCS_CONFIG_FILE",
        value_name = "PATH"
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render a single markdown document.
    Render(RenderArgs),
    /// Render every markdown document below a directory.
    Build(BuildArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub overrides: RenderOverrides,

    /// Markdown document to render.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Write the rendered document here instead of stdout.
    #[arg(long, short = 'o', value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub overrides: RenderOverrides,

    /// Directory holding the documentation sources.
    #[arg(value_name = "SOURCE_DIR", value_hint = ValueHint::DirPath)]
    pub source_dir: PathBuf,

    /// Directory receiving the rendered documentation.
    #[arg(value_name = "OUT_DIR", value_hint = ValueHint::DirPath)]
    pub out_dir: PathBuf,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RenderOverrides {
    /// Override the kitsch executable used to render prompt examples.
    #[arg(long = "kitsch-cli-path", env = "KITSCH", value_name = "PATH")]
    pub kitsch_cli_path: Option<PathBuf>,

    /// Override the directory substituted for `${CWD}` in example configs.
    #[arg(long = "docs-root", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub docs_root: Option<PathBuf>,

    /// Override the code block language that marks prompt examples.
    #[arg(long = "language", value_name = "NAME")]
    pub language: Option<String>,

    /// Override the output format (mdx|html).
    #[arg(long = "format", value_name = "FORMAT")]
    pub format: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub render: RenderSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub kitsch_cli_path: PathBuf,
    pub docs_root: PathBuf,
    pub language: String,
    pub format: OutputFormat,
    pub default_foreground: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match &cli.command {
        Command::Render(args) => raw.apply_render_overrides(&args.overrides),
        Command::Build(args) => raw.apply_render_overrides(&args.overrides),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    render: RawRenderSettings,
}

impl RawSettings {
    fn apply_render_overrides(&mut self, overrides: &RenderOverrides) {
        if let Some(path) = overrides.kitsch_cli_path.as_ref() {
            self.render.kitsch_cli_path = Some(path.clone());
        }
        if let Some(root) = overrides.docs_root.as_ref() {
            self.render.docs_root = Some(root.clone());
        }
        if let Some(language) = overrides.language.as_ref() {
            self.render.language = Some(language.clone());
        }
        if let Some(format) = overrides.format.as_ref() {
            self.render.format = Some(format.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings { logging, render } = raw;

        let logging = build_logging_settings(logging)?;
        let render = build_render_settings(render)?;

        Ok(Self { logging, render })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let kitsch_cli_path = render
        .kitsch_cli_path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_KITSCH_CLI_PATH));
    if kitsch_cli_path.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "render.kitsch_cli_path",
            "path must not be empty",
        ));
    }

    let docs_root = absolute_docs_root(render.docs_root)?;

    let language = render
        .language
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
    if language.is_empty() || language.chars().any(char::is_whitespace) {
        return Err(LoadError::invalid(
            "render.language",
            "must be a single non-empty word",
        ));
    }

    let format = match render.format {
        Some(value) => OutputFormat::from_str(&value)
            .map_err(|err| LoadError::invalid("render.format", err.to_string()))?,
        None => OutputFormat::default(),
    };

    let default_foreground = render
        .default_foreground
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_FOREGROUND.to_string());
    if !is_hex_color(&default_foreground) {
        return Err(LoadError::invalid(
            "render.default_foreground",
            "expected a `#rgb` or `#rrggbb` color",
        ));
    }

    Ok(RenderSettings {
        kitsch_cli_path,
        docs_root,
        language,
        format,
        default_foreground,
    })
}

fn absolute_docs_root(configured: Option<PathBuf>) -> Result<PathBuf, LoadError> {
    let root = configured.unwrap_or_else(|| PathBuf::from("."));
    if root.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "render.docs_root",
            "path must not be empty",
        ));
    }
    std::path::absolute(Path::new(&root)).map_err(|err| {
        LoadError::invalid("render.docs_root", format!("failed to resolve: {err}"))
    })
}

fn is_hex_color(value: &str) -> bool {
    value.strip_prefix('#').is_some_and(|digits| {
        matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    kitsch_cli_path: Option<PathBuf>,
    docs_root: Option<PathBuf>,
    language: Option<String>,
    format: Option<String>,
    default_foreground: Option<String>,
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
