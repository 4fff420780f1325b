//! PDF strategy
//!
//! Per-document state machine:
//!
//! ```text
//! probe ──password required──────────────────────────▶ password placeholder
//!   │
//!   ├─ unprotected ──▶ rasterize page 0 ──▶ thumbnail      (errors go to recovery)
//!   │
//!   └─ encrypted ────▶ open with empty password + rasterize page 0 ──▶ thumbnail
//!                          │ fails
//!                          ▼
//!                      text excerpt placeholder
//! ```

use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use super::{join_blocking, write_raster, RenderRequest, RenderStrategy, Rendition};
use crate::core::error::StrategyError;
use crate::core::types::ThumbnailSpec;
use crate::core::utils::excerpt;
use crate::preview::Placeholder;

/// Points per inch in PDF user space
const POINTS_PER_INCH: f32 = 72.0;

/// Largest rendered edge, whatever the page size and DPI
const MAX_RENDER_EDGE: f32 = 4000.0;

/// Security state reported when a document is opened without a password
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfSecurity {
    Unprotected,
    /// Encrypted, but opens with the empty password
    Encrypted,
}

#[derive(Error, Debug)]
pub enum PdfEngineError {
    #[error("Document requires a password")]
    PasswordRequired,

    #[error("PDF library unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to load document: {0}")]
    Load(String),

    #[error("Failed to render page: {0}")]
    Render(String),

    #[error("Failed to extract text: {0}")]
    Text(String),
}

/// Page rasterization and text extraction capability
pub trait PdfEngine: Send + Sync {
    /// Open the document without a password and report its security state
    fn probe(&self, path: &Path) -> Result<PdfSecurity, PdfEngineError>;

    /// Rasterize the first page at `dpi`, opening with the empty password
    fn render_first_page(&self, path: &Path, dpi: f32) -> Result<DynamicImage, PdfEngineError>;

    /// Best-effort plain text of the document
    fn extract_text(&self, path: &Path) -> Result<String, PdfEngineError>;
}

/// `PdfEngine` backed by the pdfium library, with text from `pdf-extract`
pub struct PdfiumEngine {
    pdfium: Result<Pdfium, String>,
}

impl PdfiumEngine {
    /// Bind to pdfium in `library_dir` when given, otherwise to the system library.
    ///
    /// A failed binding is remembered; every later call reports the engine as
    /// unavailable so PDFs fall back to placeholders.
    pub fn new(library_dir: Option<&Path>) -> Self {
        let bindings = match library_dir {
            Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
                .or_else(|_| Pdfium::bind_to_system_library()),
            None => Pdfium::bind_to_system_library(),
        };

        let pdfium = bindings.map(Pdfium::new).map_err(|e| {
            tracing::warn!(error = %e, "PDF library not available, PDFs will get placeholders");
            e.to_string()
        });

        Self { pdfium }
    }

    pub fn is_available(&self) -> bool {
        self.pdfium.is_ok()
    }

    fn pdfium(&self) -> Result<&Pdfium, PdfEngineError> {
        self.pdfium
            .as_ref()
            .map_err(|e| PdfEngineError::Unavailable(e.clone()))
    }

    fn load<'a>(pdfium: &'a Pdfium, path: &Path) -> Result<PdfDocument<'a>, PdfEngineError> {
        pdfium.load_pdf_from_file(path, None).map_err(|e| match e {
            PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
                PdfEngineError::PasswordRequired
            }
            other => PdfEngineError::Load(other.to_string()),
        })
    }
}

impl PdfEngine for PdfiumEngine {
    fn probe(&self, path: &Path) -> Result<PdfSecurity, PdfEngineError> {
        let pdfium = self.pdfium()?;
        let document = Self::load(pdfium, path)?;

        let revision = document
            .permissions()
            .security_handler_revision()
            .map_err(|e| PdfEngineError::Load(e.to_string()))?;

        Ok(if revision == PdfSecurityHandlerRevision::Unprotected {
            PdfSecurity::Unprotected
        } else {
            PdfSecurity::Encrypted
        })
    }

    fn render_first_page(&self, path: &Path, dpi: f32) -> Result<DynamicImage, PdfEngineError> {
        let pdfium = self.pdfium()?;
        let document = Self::load(pdfium, path)?;

        let page = document
            .pages()
            .get(0)
            .map_err(|e| PdfEngineError::Render(e.to_string()))?;

        let scale = dpi / POINTS_PER_INCH;
        let width = (page.width().value * scale).clamp(1.0, MAX_RENDER_EDGE) as i32;
        let height = (page.height().value * scale).clamp(1.0, MAX_RENDER_EDGE) as i32;

        let bitmap = page
            .render_with_config(
                &PdfRenderConfig::new()
                    .set_target_width(width)
                    .set_target_height(height),
            )
            .map_err(|e| PdfEngineError::Render(e.to_string()))?;

        // Go through raw RGBA so pdfium-render's own image version never leaks in
        let (bitmap_width, bitmap_height) = (bitmap.width() as u32, bitmap.height() as u32);
        image::RgbaImage::from_raw(bitmap_width, bitmap_height, bitmap.as_rgba_bytes())
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(|| PdfEngineError::Render("bitmap size mismatch".to_string()))
    }

    fn extract_text(&self, path: &Path) -> Result<String, PdfEngineError> {
        let bytes = std::fs::read(path).map_err(|e| PdfEngineError::Text(e.to_string()))?;

        // pdf-extract panics on some malformed inputs
        std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes))
            .map_err(|_| PdfEngineError::Text("text extractor panicked".to_string()))?
            .map_err(|e| PdfEngineError::Text(e.to_string()))
    }
}

/// Renders PDFs, and converted office documents, through a `PdfEngine`
pub struct PdfStrategy {
    spec: ThumbnailSpec,
    engine: Arc<dyn PdfEngine>,
    dpi: f32,
    excerpt_chars: usize,
}

impl PdfStrategy {
    pub fn new(spec: ThumbnailSpec, engine: Arc<dyn PdfEngine>, dpi: f32, excerpt_chars: usize) -> Self {
        Self {
            spec,
            engine,
            dpi,
            excerpt_chars,
        }
    }

    /// Render the PDF at `pdf_path` into `output`, titling placeholders with `title`
    pub async fn render_document(
        &self,
        pdf_path: &Path,
        title: &str,
        output: &Path,
    ) -> Result<Rendition, StrategyError> {
        let job = PdfJob {
            engine: Arc::clone(&self.engine),
            spec: self.spec,
            dpi: self.dpi,
            excerpt_chars: self.excerpt_chars,
            pdf_path: pdf_path.to_path_buf(),
            title: title.to_string(),
            output: output.to_path_buf(),
        };

        join_blocking(tokio::task::spawn_blocking(move || job.run())).await
    }
}

#[async_trait]
impl RenderStrategy for PdfStrategy {
    fn name(&self) -> &'static str {
        "pdf"
    }

    async fn render(&self, request: &RenderRequest<'_>) -> Result<Rendition, StrategyError> {
        self.render_document(
            request.source.path(),
            &request.source.display_name(),
            request.output,
        )
        .await
    }
}

/// Owned inputs of one PDF render, moved onto the blocking pool
struct PdfJob {
    engine: Arc<dyn PdfEngine>,
    spec: ThumbnailSpec,
    dpi: f32,
    excerpt_chars: usize,
    pdf_path: PathBuf,
    title: String,
    output: PathBuf,
}

impl PdfJob {
    fn run(self) -> Result<Rendition, StrategyError> {
        let security = match self.engine.probe(&self.pdf_path) {
            Ok(security) => security,
            Err(PdfEngineError::PasswordRequired) => {
                let locked = StrategyError::Encryption {
                    reason: "document requires a password".to_string(),
                };
                return Ok(Rendition::Degraded {
                    placeholder: Placeholder::password_protected(&self.title),
                    stage: locked.stage(),
                    cause: locked.to_string(),
                });
            }
            Err(e) => {
                return Err(StrategyError::Decode {
                    reason: e.to_string(),
                })
            }
        };

        match security {
            PdfSecurity::Unprotected => {
                let page = self
                    .engine
                    .render_first_page(&self.pdf_path, self.dpi)
                    .map_err(|e| StrategyError::Decode {
                        reason: e.to_string(),
                    })?;
                write_raster(&page, &self.spec, &self.output)?;
                Ok(Rendition::Written)
            }
            PdfSecurity::Encrypted => self.render_encrypted(),
        }
    }

    /// Empty-password documents: try the page, then settle for a text excerpt
    fn render_encrypted(&self) -> Result<Rendition, StrategyError> {
        let unlocked = self
            .engine
            .render_first_page(&self.pdf_path, self.dpi)
            .map_err(|e| StrategyError::Encryption {
                reason: e.to_string(),
            })
            .and_then(|page| write_raster(&page, &self.spec, &self.output));

        let failure = match unlocked {
            Ok(()) => return Ok(Rendition::Written),
            Err(e) => e,
        };

        tracing::debug!(
            path = %self.pdf_path.display(),
            error = %failure,
            "Encrypted document did not render, extracting text"
        );

        let text = match self.engine.extract_text(&self.pdf_path) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(path = %self.pdf_path.display(), error = %e, "Text extraction failed");
                String::new()
            }
        };

        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let body = excerpt(&normalized, self.excerpt_chars);
        let placeholder = if body.is_empty() {
            Placeholder::no_preview(&self.title)
        } else {
            Placeholder::Text {
                title: self.title.clone(),
                body,
            }
        };

        Ok(Rendition::Degraded {
            placeholder,
            stage: failure.stage(),
            cause: failure.to_string(),
        })
    }
}
