use std::{
    io::{self, Write},
    path::Path,
    process,
};

use kitsch_docs::{
    application::{
        docs::build_docs,
        error::{AppError, ErrorReport},
        render::{ComrakRenderService, RenderPipelineConfig, RenderRequest, RenderService},
    },
    config::{self, BuildArgs, Command, RenderArgs},
    infra::telemetry,
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let report = ErrorReport::from_error("kitsch_docs::main", error);
    let log = || {
        error!(
            source = report.source,
            error = %error,
            causes = ?report.causes(),
            "application error"
        );
    };

    if dispatcher::has_been_set() {
        log();
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, log);
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;
    let service = ComrakRenderService::new(RenderPipelineConfig::from(&settings.render));

    info!(
        target = "kitsch_docs",
        kitsch_cli_path = %settings.render.kitsch_cli_path.display(),
        docs_root = %settings.render.docs_root.display(),
        format = %settings.render.format,
        "Configuration loaded"
    );

    match cli_args.command {
        Command::Render(args) => run_render(&service, args).await,
        Command::Build(args) => run_build(&service, args).await,
    }
}

async fn run_render(service: &ComrakRenderService, args: RenderArgs) -> Result<(), AppError> {
    let markdown = tokio::fs::read_to_string(&args.file)
        .await
        .map_err(|err| AppError::io(&args.file, err))?;

    let request = RenderRequest::new(document_name(&args.file), markdown);
    let output = service.render(&request).await?;

    if output.failed_examples > 0 {
        warn!(
            target = "kitsch_docs",
            document = %request.document,
            failed_examples = output.failed_examples,
            "Some examples were replaced by diagnostics"
        );
    }

    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|err| AppError::io(parent, err))?;
            }
            tokio::fs::write(&path, output.document)
                .await
                .map_err(|err| AppError::io(&path, err))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(output.document.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|err| AppError::io("<stdout>", err))?;
        }
    }

    Ok(())
}

async fn run_build(service: &ComrakRenderService, args: BuildArgs) -> Result<(), AppError> {
    if !args.source_dir.is_dir() {
        return Err(AppError::unexpected(format!(
            "source directory `{}` does not exist",
            args.source_dir.display()
        )));
    }

    let summary = build_docs(
        service,
        &args.source_dir,
        &args.out_dir,
        service.format().extension(),
    )
    .await?;

    if summary.failed_examples > 0 {
        warn!(
            target = "kitsch_docs",
            failed_examples = summary.failed_examples,
            "Some examples were replaced by diagnostics"
        );
    }

    Ok(())
}

fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
