//! Whole-directory documentation builds.

use std::{
    io,
    path::{Path, PathBuf},
    time::Instant,
};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::application::render::{RenderError, RenderRequest, RenderService};

const DOCUMENT_EXTENSIONS: [&str; 2] = ["md", "mdx"];

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to walk `{path}`: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("failed to read `{path}`: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write `{path}`: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to render `{path}`: {source}")]
    Render { path: PathBuf, source: RenderError },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub documents: usize,
    pub copied: usize,
    pub examples: usize,
    pub failed_examples: usize,
}

/// Render every markdown document under `source_dir` into `out_dir`, keeping
/// relative paths. Other files are copied unchanged. Documents are processed
/// one at a time.
pub async fn build_docs<S: RenderService + ?Sized>(
    service: &S,
    source_dir: &Path,
    out_dir: &Path,
    extension: Option<&str>,
) -> Result<BuildSummary, BuildError> {
    let started_at = Instant::now();
    let mut summary = BuildSummary::default();

    tokio::fs::create_dir_all(out_dir)
        .await
        .map_err(|source| BuildError::Write {
            path: out_dir.to_path_buf(),
            source,
        })?;
    // Both sides resolved so `docs` and `./docs/site` compare as nested.
    let source_dir = &resolve(source_dir).await?;
    let out_dir = &resolve(out_dir).await?;

    let entries = WalkDir::new(source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !entry.path().starts_with(out_dir));

    for entry in entries {
        let entry = entry.map_err(|source| BuildError::Walk {
            path: source_dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = path.strip_prefix(source_dir).unwrap_or(path);
        let mut destination = out_dir.join(relative);
        ensure_parent(&destination).await?;

        if !is_document(path) {
            tokio::fs::copy(path, &destination)
                .await
                .map_err(|source| BuildError::Write {
                    path: destination.clone(),
                    source,
                })?;
            summary.copied += 1;
            debug!(
                target = "application::docs",
                source = %path.display(),
                "Copied static file"
            );
            continue;
        }

        let markdown =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| BuildError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
        let request = RenderRequest::new(relative.display().to_string(), markdown);
        let output = service
            .render(&request)
            .await
            .map_err(|source| BuildError::Render {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(extension) = extension {
            destination.set_extension(extension);
        }
        tokio::fs::write(&destination, output.document)
            .await
            .map_err(|source| BuildError::Write {
                path: destination.clone(),
                source,
            })?;

        summary.documents += 1;
        summary.examples += output.examples;
        summary.failed_examples += output.failed_examples;
    }

    info!(
        target = "application::docs",
        op = "docs::build",
        documents = summary.documents,
        copied = summary.copied,
        examples = summary.examples,
        failed_examples = summary.failed_examples,
        elapsed_ms = started_at.elapsed().as_millis() as u64,
        "Documentation build finished"
    );

    Ok(summary)
}

async fn resolve(path: &Path) -> Result<PathBuf, BuildError> {
    tokio::fs::canonicalize(path)
        .await
        .map_err(|source| BuildError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            DOCUMENT_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
}

async fn ensure_parent(path: &Path) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| BuildError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::is_document;
    use std::path::Path;

    #[test]
    fn recognises_markdown_documents() {
        assert!(is_document(Path::new("docs/intro.md")));
        assert!(is_document(Path::new("docs/modules/git.MDX")));
        assert!(!is_document(Path::new("docs/img/logo.png")));
        assert!(!is_document(Path::new("docs/README")));
    }
}
