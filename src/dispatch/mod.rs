//! Dispatcher and recovery policy
//!
//! Classifies each file, runs exactly one strategy for its content type, and turns
//! every strategy failure into a placeholder. A call never fails: the result is
//! always a `RenderOutcome`, and only a placeholder that cannot be written ends up
//! as `Failed`.

mod metrics;
mod observer;


pub use metrics::{DispatchMetrics, MetricStats, MetricsSnapshot};
pub use observer::{DispatchObserver, DispatchRecord, ObserverSet, TracingObserver};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::classify::{ContentType, SourceFile, TypeClassifier};
use crate::core::config::AppConfig;
use crate::core::error::StrategyError;
use crate::core::runtime::RuntimeDependencies;
use crate::core::types::{OutcomeStatus, RenderOutcome, ThumbnailSpec};
use crate::preview::{Placeholder, PlaceholderRenderer, PreviewSanitizer};
use crate::process::ProcessRunner;
use crate::strategy::{
    ImageStrategy, OfficeStrategy, PdfEngine, PdfStrategy, RenderRequest, RenderStrategy,
    Rendition, SpreadsheetStrategy, VideoStrategy,
};

/// Cause recorded for content with no strategy
pub const UNSUPPORTED_CAUSE: &str = "no strategy for this content type";

/// One strategy per content family
#[derive(Clone)]
pub struct StrategyTable {
    pub image: Arc<dyn RenderStrategy>,
    pub video: Arc<dyn RenderStrategy>,
    pub pdf: Arc<dyn RenderStrategy>,
    pub office: Arc<dyn RenderStrategy>,
    pub spreadsheet: Arc<dyn RenderStrategy>,
}

impl StrategyTable {
    /// Build the production strategies; video and office share one process runner
    pub fn from_config(config: &AppConfig, engine: Arc<dyn PdfEngine>) -> Self {
        let spec = config.thumbnail.spec();
        let runner = ProcessRunner::new(
            config.limits.max_external_processes,
            config.limits.process_timeout(),
        );

        let pdf = Arc::new(PdfStrategy::new(
            spec,
            engine,
            config.thumbnail.pdf_dpi,
            config.thumbnail.text_excerpt_chars,
        ));
        let converter = RuntimeDependencies::resolve_converter(config.tools.converter.as_deref());

        Self {
            image: Arc::new(ImageStrategy::new(spec)),
            video: Arc::new(VideoStrategy::new(
                spec,
                config.tools.ffmpeg.clone(),
                config.thumbnail.video_seek.clone(),
                runner.clone(),
            )),
            office: Arc::new(OfficeStrategy::new(converter, runner, Arc::clone(&pdf))),
            pdf,
            spreadsheet: Arc::new(SpreadsheetStrategy::new(PreviewSanitizer::new(
                config.thumbnail.preview_line_chars,
            ))),
        }
    }

    /// The strategy for a content type; `None` means the default placeholder
    pub fn select(&self, content_type: ContentType) -> Option<&Arc<dyn RenderStrategy>> {
        match content_type {
            ContentType::Image => Some(&self.image),
            ContentType::Video => Some(&self.video),
            ContentType::Pdf => Some(&self.pdf),
            ContentType::Office(_) => Some(&self.office),
            ContentType::Spreadsheet(_) => Some(&self.spreadsheet),
            ContentType::Unknown => None,
        }
    }
}

/// Outcome of a strategy call plus what the record needs to know about it
struct Recovered {
    outcome: RenderOutcome,
    stage: Option<&'static str>,
}

/// Converts strategy results into outcomes, drawing placeholders where needed
#[derive(Debug, Clone)]
pub struct RecoveryPolicy {
    placeholders: PlaceholderRenderer,
}

impl RecoveryPolicy {
    pub fn new(spec: ThumbnailSpec) -> Self {
        Self {
            placeholders: PlaceholderRenderer::new(spec),
        }
    }

    /// Apply the policy to one strategy result
    pub fn resolve(
        &self,
        source: &SourceFile,
        output: &Path,
        result: Result<Rendition, StrategyError>,
    ) -> RenderOutcome {
        self.recover(source, output, result).outcome
    }

    fn recover(
        &self,
        source: &SourceFile,
        output: &Path,
        result: Result<Rendition, StrategyError>,
    ) -> Recovered {
        match result {
            Ok(Rendition::Written) => Recovered {
                outcome: RenderOutcome::success(output.to_path_buf()),
                stage: None,
            },
            Ok(Rendition::Preview(placeholder)) => {
                self.draw(output, &placeholder, None, RenderOutcome::success(output.to_path_buf()))
            }
            Ok(Rendition::Degraded {
                placeholder,
                stage,
                cause,
            }) => self.draw(
                output,
                &placeholder,
                Some(stage),
                RenderOutcome::fallback(output.to_path_buf(), cause),
            ),
            Err(e) => self.fallback(source, output, e.stage(), e.to_string()),
        }
    }

    /// Write the default placeholder for a failure at `stage`
    fn fallback(
        &self,
        source: &SourceFile,
        output: &Path,
        stage: &'static str,
        cause: String,
    ) -> Recovered {
        self.draw(
            output,
            &Placeholder::no_preview(source.display_name()),
            Some(stage),
            RenderOutcome::fallback(output.to_path_buf(), cause),
        )
    }

    /// Draw `placeholder`, reporting `outcome` if it was written
    fn draw(
        &self,
        output: &Path,
        placeholder: &Placeholder,
        stage: Option<&'static str>,
        outcome: RenderOutcome,
    ) -> Recovered {
        match self.placeholders.write(placeholder, output) {
            Ok(()) => Recovered { outcome, stage },
            Err(e) => {
                let cause = match outcome.cause {
                    Some(original) => format!("{}; {}", original, e),
                    None => e.to_string(),
                };
                Recovered {
                    outcome: RenderOutcome::failed(output.to_path_buf(), cause),
                    stage: Some("placeholder"),
                }
            }
        }
    }
}

/// Routes files to strategies under the recovery policy
#[derive(Clone)]
pub struct Dispatcher {
    classifier: TypeClassifier,
    strategies: StrategyTable,
    recovery: RecoveryPolicy,
    observer: Arc<dyn DispatchObserver>,
}

impl Dispatcher {
    pub fn new(
        spec: ThumbnailSpec,
        strategies: StrategyTable,
        observer: Arc<dyn DispatchObserver>,
    ) -> Self {
        Self {
            classifier: TypeClassifier::default(),
            strategies,
            recovery: RecoveryPolicy::new(spec),
            observer,
        }
    }

    /// Production dispatcher for `config`
    pub fn from_config(
        config: &AppConfig,
        engine: Arc<dyn PdfEngine>,
        observer: Arc<dyn DispatchObserver>,
    ) -> Self {
        Self::new(
            config.thumbnail.spec(),
            StrategyTable::from_config(config, engine),
            observer,
        )
    }

    pub fn with_classifier(mut self, classifier: TypeClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Render one file
    pub async fn render(&self, source: &SourceFile) -> RenderOutcome {
        self.render_with_cancel(source, &CancellationToken::new()).await
    }

    /// Render one file; cancellation kills any external process it is waiting on
    pub async fn render_with_cancel(
        &self,
        source: &SourceFile,
        cancel: &CancellationToken,
    ) -> RenderOutcome {
        let started = Instant::now();

        let Some(output) = source.output_path() else {
            let outcome = RenderOutcome::failed(
                source.path().to_path_buf(),
                "source path has no file name",
            );
            self.report(source, None, None, &outcome, Some("classify"), started);
            return outcome;
        };

        let content_type = match source.content_type(&self.classifier).await {
            Ok(content_type) => content_type,
            Err(e) => {
                let recovered = self.recovery.fallback(source, &output, "classify", e.to_string());
                self.report(source, None, None, &recovered.outcome, recovered.stage, started);
                return recovered.outcome;
            }
        };

        let (strategy_name, recovered) = match self.strategies.select(content_type) {
            Some(strategy) => {
                let request = RenderRequest {
                    source,
                    output: &output,
                    cancel,
                };
                let result = strategy.render(&request).await;
                (
                    Some(strategy.name()),
                    self.recovery.recover(source, &output, result),
                )
            }
            None => (
                None,
                self.recovery.fallback(
                    source,
                    &output,
                    "classify",
                    format!("{} ({})", UNSUPPORTED_CAUSE, content_type),
                ),
            ),
        };

        self.report(
            source,
            Some(content_type),
            strategy_name,
            &recovered.outcome,
            recovered.stage,
            started,
        );
        recovered.outcome
    }

    fn report(
        &self,
        source: &SourceFile,
        content_type: Option<ContentType>,
        strategy: Option<&'static str>,
        outcome: &RenderOutcome,
        stage: Option<&'static str>,
        started: Instant,
    ) {
        let stage = match outcome.status {
            OutcomeStatus::Success => None,
            _ => stage,
        };

        self.observer.on_dispatch(&DispatchRecord {
            path: PathBuf::from(source.path()),
            content_type,
            strategy,
            status: outcome.status,
            stage,
            cause: outcome.cause.clone(),
            elapsed: started.elapsed(),
        });
    }
}
