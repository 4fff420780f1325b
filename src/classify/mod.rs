//! Content type classification
//!
//! Decides which render strategy applies to a file by looking at its bytes, never at
//! its name. A file renamed to a misleading extension classifies the same as before.
//!
//! The classifier reads a bounded sample from the start of the file, and from the end
//! when the file is larger than that sample, so container central directories are seen
//! without reading the whole file.

mod magic;


use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::core::error::ClassificationError;
use crate::core::types::ThumbnailSpec;
use crate::core::utils::get_filename;

pub use magic::sniff;

/// Default number of bytes sampled from each end of a file
pub const DEFAULT_SAMPLE_LEN: usize = 64 * 1024;

/// Office document family, used to label logs and pick the conversion path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OfficeKind {
    Word,
    Excel,
    PowerPoint,
}

/// Tabular data formats read directly rather than converted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetKind {
    Xls,
    Xlsx,
    Csv,
}

/// Closed set of content categories a file can fall into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "kind", rename_all = "snake_case")]
pub enum ContentType {
    Image,
    Video,
    Pdf,
    Office(OfficeKind),
    Spreadsheet(SheetKind),
    Unknown,
}

impl ContentType {
    /// Stable label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            ContentType::Image => "image",
            ContentType::Video => "video",
            ContentType::Pdf => "pdf",
            ContentType::Office(OfficeKind::Word) => "office/word",
            ContentType::Office(OfficeKind::Excel) => "office/excel",
            ContentType::Office(OfficeKind::PowerPoint) => "office/powerpoint",
            ContentType::Spreadsheet(SheetKind::Xls) => "spreadsheet/xls",
            ContentType::Spreadsheet(SheetKind::Xlsx) => "spreadsheet/xlsx",
            ContentType::Spreadsheet(SheetKind::Csv) => "spreadsheet/csv",
            ContentType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reads file samples and classifies them
#[derive(Debug, Clone)]
pub struct TypeClassifier {
    sample_len: usize,
}

impl Default for TypeClassifier {
    fn default() -> Self {
        Self {
            sample_len: DEFAULT_SAMPLE_LEN,
        }
    }
}

impl TypeClassifier {
    pub fn new(sample_len: usize) -> Self {
        Self {
            sample_len: sample_len.max(PROBE_MIN_LEN),
        }
    }

    /// Classify a file by content.
    ///
    /// An empty file is `Unknown`. An unreadable file is an error, so callers can
    /// tell "could not look" apart from "looked and found nothing".
    pub fn classify(&self, path: &Path) -> Result<ContentType, ClassificationError> {
        let sample = self.read_sample(path).map_err(|source| ClassificationError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(sniff(&sample.head, &sample.tail, sample.truncated))
    }

    /// Classify without blocking the async runtime
    pub async fn classify_async(&self, path: &Path) -> Result<ContentType, ClassificationError> {
        let classifier = self.clone();
        let path_owned = path.to_path_buf();

        match tokio::task::spawn_blocking(move || classifier.classify(&path_owned)).await {
            Ok(result) => result,
            Err(e) => Err(ClassificationError {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
            }),
        }
    }

    fn read_sample(&self, path: &Path) -> std::io::Result<Sample> {
        let mut file = File::open(path)?;
        let len = file.metadata()?.len();

        let mut head = Vec::with_capacity(self.sample_len.min(len as usize));
        (&mut file)
            .take(self.sample_len as u64)
            .read_to_end(&mut head)?;

        let truncated = len > head.len() as u64;
        let mut tail = Vec::new();
        if truncated {
            let tail_len = (len - head.len() as u64).min(self.sample_len as u64);
            file.seek(SeekFrom::End(-(tail_len as i64)))?;
            file.take(tail_len).read_to_end(&mut tail)?;
        }

        Ok(Sample {
            head,
            tail,
            truncated,
        })
    }
}

/// Smallest sample that still covers every signature offset
const PROBE_MIN_LEN: usize = 1024;

struct Sample {
    head: Vec<u8>,
    tail: Vec<u8>,
    truncated: bool,
}

/// A file on disk plus its lazily computed content type.
///
/// Classification runs at most once per `SourceFile`; later calls return the cached
/// answer.
#[derive(Debug)]
pub struct SourceFile {
    path: PathBuf,
    content_type: OnceLock<ContentType>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content_type: OnceLock::new(),
        }
    }

    /// A source whose type is already known
    pub fn with_content_type(path: impl Into<PathBuf>, content_type: ContentType) -> Self {
        let lock = OnceLock::new();
        let _ = lock.set(content_type);
        Self {
            path: path.into(),
            content_type: lock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name shown on placeholders
    pub fn display_name(&self) -> String {
        get_filename(&self.path)
    }

    /// Where this file's thumbnail goes
    pub fn output_path(&self) -> Option<PathBuf> {
        ThumbnailSpec::output_path(&self.path)
    }

    /// The content type, if it has been computed
    pub fn cached_content_type(&self) -> Option<ContentType> {
        self.content_type.get().copied()
    }

    /// Classify on first use, then serve the cached value
    pub async fn content_type(
        &self,
        classifier: &TypeClassifier,
    ) -> Result<ContentType, ClassificationError> {
        if let Some(content_type) = self.content_type.get() {
            return Ok(*content_type);
        }

        let content_type = classifier.classify_async(&self.path).await?;
        // A concurrent caller may have won the race; both computed the same answer
        let _ = self.content_type.set(content_type);
        Ok(content_type)
    }
}
