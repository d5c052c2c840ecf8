// PDF export: the preview is laid out on a drawing surface, split into A4
// pages by offset, and written with lopdf. The photo is resolved through the
// asset loader first and skipped if it cannot be loaded.

pub mod assets;
pub mod handlers;
pub mod pdf;
pub mod pipeline;
pub mod surface;

use thiserror::Error;

pub use assets::{AssetLoader, AssetSource, HttpFetcher, LoadOutcome, RemoteFetcher};
pub use pipeline::{export_filename, export_pdf, ExportArtifact};

/// User-facing message for every export failure.
pub const EXPORT_FAILED_MESSAGE: &str = "Failed to generate PDF. Please try again.";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("surface layout failed: {0}")]
    Surface(String),

    #[error("PDF writer error: {0}")]
    Writer(String),

    #[error("export task failed: {0}")]
    Task(String),
}
