//! Video strategy
//!
//! The frame extractor writes the thumbnail itself; no raster passes through this
//! process.

use async_trait::async_trait;
use std::path::PathBuf;

use super::{RenderRequest, RenderStrategy, Rendition};
use crate::core::error::StrategyError;
use crate::core::types::ThumbnailSpec;
use crate::process::{ExternalCommand, ProcessRunner};

pub struct VideoStrategy {
    spec: ThumbnailSpec,
    ffmpeg: PathBuf,
    seek: String,
    runner: ProcessRunner,
}

impl VideoStrategy {
    pub fn new(spec: ThumbnailSpec, ffmpeg: PathBuf, seek: String, runner: ProcessRunner) -> Self {
        Self {
            spec,
            ffmpeg,
            seek,
            runner,
        }
    }

    /// Extract one frame at the seek offset, scaled to the thumbnail box
    fn command(&self, request: &RenderRequest<'_>) -> ExternalCommand {
        ExternalCommand::new(&self.ffmpeg)
            .args(["-y", "-loglevel", "error", "-ss"])
            .arg(&self.seek)
            .arg("-i")
            .arg(request.source.path().as_os_str())
            .args(["-frames:v", "1", "-update", "1", "-vf"])
            .arg(format!("scale={}:{}", self.spec.width, self.spec.height))
            .arg(request.output.as_os_str())
    }
}

#[async_trait]
impl RenderStrategy for VideoStrategy {
    fn name(&self) -> &'static str {
        "video"
    }

    async fn render(&self, request: &RenderRequest<'_>) -> Result<Rendition, StrategyError> {
        // A thumbnail left by an earlier run must not pass the output check
        match tokio::fs::remove_file(request.output).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StrategyError::Io(e)),
        }

        self.runner
            .run_expecting(&self.command(request), request.output, request.cancel)
            .await?;

        Ok(Rendition::Written)
    }
}
