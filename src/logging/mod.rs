//! Logging System for Thumbsmith
//!
//! Structured `tracing` output to the console, a rolling file, or both, with
//! per-target verbosity. Per-file dispatch records are emitted by the dispatcher's
//! observers on top of this subscriber.

mod config;

#[cfg(test)]
mod tests;

pub use config::{LogFormat, LogLevel, LogOutput, LoggingConfig, RotationStrategy, DEFAULT_FILE_NAME};

use std::path::PathBuf;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter, Layer,
};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to initialize logging: {0}")]
    InitializationError(String),

    #[error("Failed to create log directory {path:?}: {source}")]
    DirectoryCreationError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type LoggingResult<T> = Result<T, LoggingError>;

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Installed logging subscriber; keep alive for the life of the process so
/// buffered file output gets flushed
pub struct LoggingSystem {
    config: LoggingConfig,
    _guard: Option<WorkerGuard>,
}

impl LoggingSystem {
    /// Install the global subscriber described by `config`
    pub fn init(config: LoggingConfig) -> LoggingResult<Self> {
        let console = config
            .output
            .writes_console()
            .then(|| Self::console_layer(&config));

        let (file, guard) = if config.output.writes_file() {
            let (layer, guard) = Self::file_layer(&config)?;
            (Some(layer), Some(guard))
        } else {
            (None, None)
        };

        tracing_subscriber::registry()
            .with(Self::build_env_filter(&config))
            .with(console)
            .with(file)
            .try_init()
            .map_err(|e| LoggingError::InitializationError(e.to_string()))?;

        Ok(Self {
            config,
            _guard: guard,
        })
    }

    /// `RUST_LOG` wins over the configuration when set
    fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
        match std::env::var(EnvFilter::DEFAULT_ENV) {
            Ok(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
            _ => Self::config_filter(config),
        }
    }

    /// Filter derived from the configured levels alone
    pub(crate) fn config_filter(config: &LoggingConfig) -> EnvFilter {
        EnvFilter::new(config.directives())
    }

    fn console_layer<S>(config: &LoggingConfig) -> BoxedLayer<S>
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        let layer = fmt::layer()
            .with_thread_ids(config.show_thread_ids)
            .with_file(config.show_source)
            .with_line_number(config.show_source);

        match config.format {
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Text => layer.boxed(),
        }
    }

    fn file_layer<S>(config: &LoggingConfig) -> LoggingResult<(BoxedLayer<S>, WorkerGuard)>
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        let dir = config.resolved_directory();
        std::fs::create_dir_all(&dir).map_err(|source| LoggingError::DirectoryCreationError {
            path: dir.clone(),
            source,
        })?;

        let rotation = match config.rotation {
            RotationStrategy::Daily => Rotation::DAILY,
            RotationStrategy::Hourly => Rotation::HOURLY,
            RotationStrategy::Never => Rotation::NEVER,
        };

        let appender = RollingFileAppender::builder()
            .rotation(rotation)
            .filename_prefix(config.file_name.as_str())
            .build(&dir)
            .map_err(|e| LoggingError::InitializationError(e.to_string()))?;
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_thread_ids(config.show_thread_ids)
            .with_file(config.show_source)
            .with_line_number(config.show_source);

        let layer = match config.format {
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Text => layer.boxed(),
        };
        Ok((layer, guard))
    }

    /// Directory of the rolling file, when one is written
    pub fn log_directory(&self) -> Option<PathBuf> {
        self.config
            .output
            .writes_file()
            .then(|| self.config.resolved_directory())
    }

    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }
}
