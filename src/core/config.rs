//! Configuration module for Thumbsmith
//!
//! Handles application configuration including:
//! - HTTP server binding
//! - Thumbnail output settings
//! - External tool locations
//! - Concurrency and timeout limits
//! - Directory walk behaviour
//!
//! Sources are layered: built-in defaults, then an optional TOML file, then
//! `THUMBSMITH__SECTION__KEY` environment variables.

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::error::ConfigError;
use super::types::{ResizeMode, ThumbnailSpec};
use crate::logging::LoggingConfig;

/// Environment variable naming an alternative configuration file
pub const CONFIG_PATH_ENV: &str = "THUMBSMITH_CONFIG";

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "thumbsmith.toml";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP entry point settings
    pub server: ServerConfig,

    /// Thumbnail output settings
    pub thumbnail: ThumbnailConfig,

    /// External tool locations
    pub tools: ToolsConfig,

    /// Concurrency and timeout limits
    pub limits: LimitsConfig,

    /// Directory walk behaviour
    pub walk: WalkConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Thumbnail rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    /// JPEG quality (1-100)
    pub jpeg_quality: u8,

    /// How raster sources are fitted into the box
    pub resize_mode: ResizeMode,

    /// Rasterization resolution for PDF pages
    pub pdf_dpi: f32,

    /// Maximum characters of extracted document text shown in a text placeholder
    pub text_excerpt_chars: usize,

    /// Maximum characters per sanitized preview line
    pub preview_line_chars: usize,

    /// Seek offset handed to the frame extractor
    pub video_seek: String,
}

/// External tool locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Frame extractor executable (name or path)
    pub ffmpeg: PathBuf,

    /// Document converter executable; searched for when unset
    pub converter: Option<PathBuf>,

    /// Directory holding the PDF rendering library; system library when unset
    pub pdfium_library_dir: Option<PathBuf>,
}

/// Concurrency and timeout limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum number of files dispatched concurrently
    pub workers: usize,

    /// Maximum number of external processes running at once
    pub max_external_processes: usize,

    /// Wall-clock limit for one external process
    pub process_timeout_secs: u64,
}

/// Directory walk configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Do not thumbnail `thumb_<name>.jpg` when `<name>` sits next to it
    pub skip_generated_thumbnails: bool,

    /// Descend into symlinked directories. Symlinks to files are always followed.
    pub follow_symlinks: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        let spec = ThumbnailSpec::default();
        Self {
            width: spec.width,
            height: spec.height,
            jpeg_quality: spec.jpeg_quality,
            resize_mode: spec.resize_mode,
            pdf_dpi: 150.0,
            text_excerpt_chars: 200,
            preview_line_chars: 50,
            video_seek: "00:00:01.000".to_string(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            converter: None,
            pdfium_library_dir: None,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            workers: parallelism.min(8),
            max_external_processes: 2,
            process_timeout_secs: 60,
        }
    }
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            skip_generated_thumbnails: true,
            follow_symlinks: false,
        }
    }
}

impl ThumbnailConfig {
    /// The output contract derived from this configuration
    pub fn spec(&self) -> ThumbnailSpec {
        ThumbnailSpec {
            width: self.width,
            height: self.height,
            jpeg_quality: self.jpeg_quality,
            resize_mode: self.resize_mode,
        }
    }
}

impl LimitsConfig {
    pub fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.process_timeout_secs)
    }
}

impl AppConfig {
    /// Load configuration from the default file location and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(Some(path))
    }

    /// Load configuration, layering an optional TOML file and the environment
    /// over the built-in defaults
    pub fn load_from(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let defaults = Config::try_from(&AppConfig::default())?;

        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("THUMBSMITH")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thumbnail;
        if t.width == 0 || t.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "thumbnail size must be non-zero, got {}x{}",
                t.width, t.height
            )));
        }
        if !(1..=100).contains(&t.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "jpeg_quality must be within 1..=100, got {}",
                t.jpeg_quality
            )));
        }
        if !(t.pdf_dpi.is_finite() && t.pdf_dpi > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "pdf_dpi must be positive, got {}",
                t.pdf_dpi
            )));
        }
        if t.preview_line_chars < 4 {
            return Err(ConfigError::Invalid(
                "preview_line_chars must leave room for an ellipsis".to_string(),
            ));
        }
        if self.limits.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".to_string()));
        }
        if self.limits.max_external_processes == 0 {
            return Err(ConfigError::Invalid(
                "max_external_processes must be at least 1".to_string(),
            ));
        }
        if self.limits.process_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "process_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_output_contract() {
        let config = AppConfig::default();
        assert_eq!(config.thumbnail.width, 200);
        assert_eq!(config.thumbnail.height, 200);
        assert_eq!(config.thumbnail.pdf_dpi, 150.0);
        assert_eq!(config.thumbnail.text_excerpt_chars, 200);
        assert_eq!(config.thumbnail.preview_line_chars, 50);
        assert_eq!(config.thumbnail.video_seek, "00:00:01.000");
        assert!(config.walk.skip_generated_thumbnails);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "[server]").unwrap();
        writeln!(file, "port = 9191").unwrap();
        writeln!(file, "[limits]").unwrap();
        writeln!(file, "workers = 3").unwrap();
        writeln!(file, "[thumbnail]").unwrap();
        writeln!(file, "resize_mode = \"letterbox\"").unwrap();

        let config = AppConfig::load_from(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.server.port, 9191);
        assert_eq!(config.limits.workers, 3);
        assert_eq!(config.thumbnail.resize_mode, ResizeMode::Letterbox);
        // untouched sections keep their defaults
        assert_eq!(config.thumbnail.width, 200);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config =
            AppConfig::load_from(Some(PathBuf::from("/nonexistent/thumbsmith.toml"))).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.thumbnail.jpeg_quality = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.limits.workers = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.thumbnail.pdf_dpi = 0.0;
        assert!(config.validate().is_err());
    }
}
