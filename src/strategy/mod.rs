//! Render strategies
//!
//! One strategy per content family. A strategy either writes the thumbnail itself
//! (`Rendition::Written`), hands back a text preview for the placeholder renderer to
//! draw, or reports that it degraded on its own. Anything it cannot handle is returned
//! as a `StrategyError` for the dispatcher's recovery policy.

mod office;
mod pdf;
mod raster;
mod spreadsheet;
mod video;


pub use office::OfficeStrategy;
pub use pdf::{PdfEngine, PdfEngineError, PdfSecurity, PdfStrategy, PdfiumEngine};
pub use raster::ImageStrategy;
pub use spreadsheet::SpreadsheetStrategy;
pub use video::VideoStrategy;

use async_trait::async_trait;
use image::DynamicImage;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use crate::classify::SourceFile;
use crate::core::error::StrategyError;
use crate::core::types::ThumbnailSpec;
use crate::preview::{fit_to_spec, write_jpeg, Placeholder};

/// What a strategy produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendition {
    /// The thumbnail has been written to the output path
    Written,
    /// A text or tabular preview that still needs drawing; counts as a success
    Preview(Placeholder),
    /// The strategy fell back on its own; the placeholder still needs drawing
    Degraded {
        placeholder: Placeholder,
        /// Stage that failed, as in `StrategyError::stage`
        stage: &'static str,
        cause: String,
    },
}

/// One file to render
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub source: &'a SourceFile,
    pub output: &'a Path,
    pub cancel: &'a CancellationToken,
}

/// A rendering algorithm for one content family
#[async_trait]
pub trait RenderStrategy: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    async fn render(&self, request: &RenderRequest<'_>) -> Result<Rendition, StrategyError>;
}

/// Fit a decoded raster to the thumbnail box and write it
pub(crate) fn write_raster(
    img: &DynamicImage,
    spec: &ThumbnailSpec,
    output: &Path,
) -> Result<(), StrategyError> {
    let canvas = fit_to_spec(img, spec);
    write_jpeg(&canvas, spec.jpeg_quality, output).map_err(|e| StrategyError::Write {
        path: output.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Await a blocking task, turning a panic or cancellation of the task into an error
pub(crate) async fn join_blocking<T>(
    handle: tokio::task::JoinHandle<Result<T, StrategyError>>,
) -> Result<T, StrategyError> {
    handle.await.map_err(|e| StrategyError::Decode {
        reason: format!("Task join error: {}", e),
    })?
}
