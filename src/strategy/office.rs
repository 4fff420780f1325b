//! Office-document strategy
//!
//! Converts the document to PDF with the headless converter, then hands the PDF to
//! the PDF strategy. The conversion runs inside a hidden scratch directory next to
//! the source; the directory goes away when the scope ends, whatever the outcome.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use url::Url;

use super::{PdfStrategy, RenderRequest, RenderStrategy, Rendition};
use crate::core::error::StrategyError;
use crate::process::{ExternalCommand, ProcessRunner};

/// Prefix of the per-conversion scratch directory
const SCRATCH_PREFIX: &str = ".thumb-convert-";

pub struct OfficeStrategy {
    converter: PathBuf,
    runner: ProcessRunner,
    pdf: Arc<PdfStrategy>,
}

impl OfficeStrategy {
    pub fn new(converter: PathBuf, runner: ProcessRunner, pdf: Arc<PdfStrategy>) -> Self {
        Self {
            converter,
            runner,
            pdf,
        }
    }

    /// Name the converter gives its output: the source's base name with `.pdf`
    fn converted_name(source: &Path) -> OsString {
        let mut name = source
            .file_stem()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("document"));
        name.push(".pdf");
        name
    }

    /// Private converter profile under `scratch`, as a percent-encoded file URL.
    /// A private profile lets several conversions run side by side.
    fn profile_arg(scratch: &Path) -> Option<String> {
        let profile = scratch.join("profile");
        let absolute = if profile.is_absolute() {
            profile
        } else {
            std::env::current_dir().ok()?.join(profile)
        };
        let url = Url::from_file_path(&absolute).ok()?;
        Some(format!("-env:UserInstallation={}", url))
    }

    fn command(&self, source: &Path, scratch: &Path) -> ExternalCommand {
        let mut command = ExternalCommand::new(&self.converter).arg("--headless");
        match Self::profile_arg(scratch) {
            Some(profile) => command = command.arg(profile),
            None => tracing::debug!(
                scratch = %scratch.display(),
                "Scratch path has no file URL, using the shared converter profile"
            ),
        }

        command
            .args(["--convert-to", "pdf", "--outdir"])
            .arg(scratch.as_os_str())
            .arg(source.as_os_str())
    }

    async fn convert_and_render(
        &self,
        request: &RenderRequest<'_>,
        scratch: &Path,
    ) -> Result<Rendition, StrategyError> {
        let source = request.source.path();
        let converted = scratch.join(Self::converted_name(source));

        self.runner
            .run_expecting(&self.command(source, scratch), &converted, request.cancel)
            .await?;

        tracing::debug!(
            source = %source.display(),
            converted = %converted.display(),
            "Document converted"
        );

        self.pdf
            .render_document(&converted, &request.source.display_name(), request.output)
            .await
    }
}

#[async_trait]
impl RenderStrategy for OfficeStrategy {
    fn name(&self) -> &'static str {
        "office"
    }

    async fn render(&self, request: &RenderRequest<'_>) -> Result<Rendition, StrategyError> {
        let parent = match request.source.path().parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let scratch = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(SCRATCH_PREFIX)
                .tempdir_in(parent)
        })
        .await
        .map_err(|e| StrategyError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;

        let result = self.convert_and_render(request, scratch.path()).await;
        release_scratch(scratch).await;
        result
    }
}

/// Remove the scratch directory; failure is only worth a warning
async fn release_scratch(scratch: TempDir) {
    let path = scratch.path().to_path_buf();
    match tokio::task::spawn_blocking(move || scratch.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove conversion directory")
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Conversion cleanup task failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converted_name_replaces_extension() {
        assert_eq!(
            OfficeStrategy::converted_name(Path::new("/docs/report.final.docx")),
            OsString::from("report.final.pdf")
        );
        assert_eq!(
            OfficeStrategy::converted_name(Path::new("/docs/README")),
            OsString::from("README.pdf")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_profile_url_is_percent_encoded() {
        assert_eq!(
            OfficeStrategy::profile_arg(Path::new("/tmp/my docs/50%/.thumb-convert-x")).as_deref(),
            Some("-env:UserInstallation=file:///tmp/my%20docs/50%25/.thumb-convert-x/profile")
        );
    }

    #[test]
    fn test_relative_scratch_gets_absolute_profile_url() {
        let arg = OfficeStrategy::profile_arg(Path::new("scratch dir")).unwrap();
        assert!(arg.starts_with("-env:UserInstallation=file:///"));
        assert!(arg.ends_with("/scratch%20dir/profile"));
    }
}
