//! Raster image strategy

use async_trait::async_trait;
use image::io::Reader as ImageReader;
use image::DynamicImage;
use std::path::Path;

use super::{join_blocking, write_raster, RenderRequest, RenderStrategy, Rendition};
use crate::core::error::StrategyError;
use crate::core::types::ThumbnailSpec;

/// Decodes the source with the image codec and resizes it into the box
pub struct ImageStrategy {
    spec: ThumbnailSpec,
}

impl ImageStrategy {
    pub fn new(spec: ThumbnailSpec) -> Self {
        Self { spec }
    }

    /// Decode by content, not by file extension
    fn decode(path: &Path) -> Result<DynamicImage, StrategyError> {
        ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| StrategyError::Decode {
                reason: format!("Failed to decode image: {}", e),
            })
    }
}

#[async_trait]
impl RenderStrategy for ImageStrategy {
    fn name(&self) -> &'static str {
        "image"
    }

    async fn render(&self, request: &RenderRequest<'_>) -> Result<Rendition, StrategyError> {
        let path = request.source.path().to_path_buf();
        let output = request.output.to_path_buf();
        let spec = self.spec;

        join_blocking(tokio::task::spawn_blocking(move || {
            let img = Self::decode(&path)?;
            write_raster(&img, &spec, &output)
        }))
        .await?;

        Ok(Rendition::Written)
    }
}
