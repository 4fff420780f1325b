//! Thumbnail output contract
//!
//! For an input file `X` in directory `D` the thumbnail is always `D/thumb_X.jpg`,
//! a JPEG of exactly `width` x `height` pixels, whatever the source type.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// File name prefix of every generated thumbnail
pub const THUMBNAIL_PREFIX: &str = "thumb_";

/// Extension of every generated thumbnail
pub const THUMBNAIL_EXTENSION: &str = "jpg";

/// How a raster source is fitted into the thumbnail box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Scale both axes independently to fill the box exactly
    #[default]
    Stretch,
    /// Preserve aspect ratio and pad the remainder with the background colour
    Letterbox,
}

/// Fixed output contract for generated thumbnails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailSpec {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Raster fitting policy
    pub resize_mode: ResizeMode,
}

impl Default for ThumbnailSpec {
    fn default() -> Self {
        Self {
            width: 200,
            height: 200,
            jpeg_quality: 85,
            resize_mode: ResizeMode::Stretch,
        }
    }
}

impl ThumbnailSpec {
    /// Sibling output path `thumb_<name>.jpg` for a source file.
    ///
    /// Returns `None` when the path has no file name component (e.g. `/` or `..`).
    pub fn output_path(source: &Path) -> Option<PathBuf> {
        let file_name = source.file_name()?;

        let mut name = OsString::from(THUMBNAIL_PREFIX);
        name.push(file_name);
        name.push(".");
        name.push(THUMBNAIL_EXTENSION);

        Some(match source.parent() {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        })
    }

    /// Whether a file name looks like one of our own generated thumbnails
    pub fn is_thumbnail_name(name: &str) -> bool {
        Self::source_name(name).is_some()
    }

    /// For `thumb_<name>.jpg`, the `<name>` it would have been generated from
    pub fn source_name(name: &str) -> Option<&str> {
        let source = name
            .strip_prefix(THUMBNAIL_PREFIX)?
            .strip_suffix(THUMBNAIL_EXTENSION)?
            .strip_suffix('.')?;
        (!source.is_empty()).then_some(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_is_sibling() {
        let out = ThumbnailSpec::output_path(Path::new("/data/photos/cat.png")).unwrap();
        assert_eq!(out, PathBuf::from("/data/photos/thumb_cat.png.jpg"));
    }

    #[test]
    fn test_output_path_relative_and_extensionless() {
        let out = ThumbnailSpec::output_path(Path::new("README")).unwrap();
        assert_eq!(out, PathBuf::from("thumb_README.jpg"));
    }

    #[test]
    fn test_output_path_without_file_name() {
        assert!(ThumbnailSpec::output_path(Path::new("/")).is_none());
    }

    #[test]
    fn test_is_thumbnail_name() {
        assert!(ThumbnailSpec::is_thumbnail_name("thumb_cat.png.jpg"));
        assert!(!ThumbnailSpec::is_thumbnail_name("thumb_.jpg"));
        assert!(!ThumbnailSpec::is_thumbnail_name("cat.jpg"));
        assert!(!ThumbnailSpec::is_thumbnail_name("thumb_notes.txt"));
    }

    #[test]
    fn test_source_name() {
        assert_eq!(ThumbnailSpec::source_name("thumb_cat.png.jpg"), Some("cat.png"));
        assert_eq!(ThumbnailSpec::source_name("thumb_README.jpg"), Some("README"));
        assert_eq!(ThumbnailSpec::source_name("thumb_.jpg"), None);
        assert_eq!(ThumbnailSpec::source_name("cat.png.jpg"), None);
    }

    #[test]
    fn test_default_spec() {
        let spec = ThumbnailSpec::default();
        assert_eq!((spec.width, spec.height), (200, 200));
        assert_eq!(spec.resize_mode, ResizeMode::Stretch);
    }
}
