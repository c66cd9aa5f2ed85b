//! Rendering pipeline for documentation pages.
//!
//! A document is parsed with comrak, every `kitsch` example block is rendered
//! through the external prompt CLI and replaced by a markup fragment, and the
//! tree is serialised back out. Example failures are contained: they produce
//! an inline diagnostic and never fail the document.

mod service;
mod types;

pub use service::{ComrakRenderService, RenderPipelineConfig};
pub use types::{
    OutputFormat, ParseOutputFormatError, RenderError, RenderOutput, RenderRequest, RenderService,
};
