//! Runtime dependencies management
//!
//! Locates the external tools the strategies shell out to. Missing tools are not
//! fatal: the affected strategies fail at dispatch time and fall back to placeholders.

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::config::ToolsConfig;

/// Default executable name of the document converter
pub const CONVERTER_NAME: &str = "soffice";

/// Runtime dependencies checker
pub struct RuntimeDependencies;

/// Availability of one external executable
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    /// Program handed to the process launcher
    pub program: PathBuf,
    /// Absolute location, when it could be found
    pub resolved: Option<PathBuf>,
}

impl ToolStatus {
    pub fn available(&self) -> bool {
        self.resolved.is_some()
    }
}

/// Overall runtime status
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeStatus {
    pub frame_extractor: ToolStatus,
    pub converter: ToolStatus,
}

impl RuntimeStatus {
    /// Names of tools that could not be located
    pub fn missing(&self) -> Vec<String> {
        [&self.frame_extractor, &self.converter]
            .into_iter()
            .filter(|tool| !tool.available())
            .map(|tool| tool.program.display().to_string())
            .collect()
    }
}

impl RuntimeDependencies {
    /// Check all external tools named by the configuration
    pub fn check_all(tools: &ToolsConfig) -> RuntimeStatus {
        RuntimeStatus {
            frame_extractor: Self::check_tool(&tools.ffmpeg),
            converter: Self::check_tool(&Self::resolve_converter(tools.converter.as_deref())),
        }
    }

    /// Check whether a program can be located
    pub fn check_tool(program: &Path) -> ToolStatus {
        let resolved = if program.components().count() > 1 || program.is_absolute() {
            program.is_file().then(|| program.to_path_buf())
        } else {
            which::which(program).ok()
        };

        ToolStatus {
            program: program.to_path_buf(),
            resolved,
        }
    }

    /// Pick the document converter executable.
    ///
    /// An explicitly configured program always wins. Otherwise well-known install
    /// locations are probed, and finally the bare name is assumed to be on `PATH`.
    pub fn resolve_converter(configured: Option<&Path>) -> PathBuf {
        if let Some(program) = configured {
            return program.to_path_buf();
        }

        for candidate in Self::converter_install_paths() {
            if candidate.is_file() {
                return candidate;
            }
        }

        which::which(CONVERTER_NAME)
            .or_else(|_| which::which("libreoffice"))
            .unwrap_or_else(|_| PathBuf::from(CONVERTER_NAME))
    }

    /// Well-known converter install locations for this platform
    fn converter_install_paths() -> Vec<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            vec![
                PathBuf::from("C:\\Program Files\\LibreOffice\\program\\soffice.exe"),
                PathBuf::from("C:\\Program Files (x86)\\LibreOffice\\program\\soffice.exe"),
            ]
        }

        #[cfg(target_os = "macos")]
        {
            vec![PathBuf::from(
                "/Applications/LibreOffice.app/Contents/MacOS/soffice",
            )]
        }

        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_converter_wins() {
        let resolved = RuntimeDependencies::resolve_converter(Some(Path::new("/opt/lo/soffice")));
        assert_eq!(resolved, PathBuf::from("/opt/lo/soffice"));
    }

    #[test]
    fn test_missing_absolute_tool() {
        let status = RuntimeDependencies::check_tool(Path::new("/nonexistent/bin/ffmpeg"));
        assert!(!status.available());
    }

    #[cfg(unix)]
    #[test]
    fn test_tool_found_on_path() {
        let status = RuntimeDependencies::check_tool(Path::new("sh"));
        assert!(status.available());
    }

    #[test]
    fn test_runtime_status_missing() {
        let tools = ToolsConfig {
            ffmpeg: PathBuf::from("/nonexistent/ffmpeg"),
            converter: Some(PathBuf::from("/nonexistent/soffice")),
            pdfium_library_dir: None,
        };
        let status = RuntimeDependencies::check_all(&tools);
        assert_eq!(status.missing().len(), 2);
    }
}
