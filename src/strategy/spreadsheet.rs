//! Spreadsheet and delimited-text strategy
//!
//! Produces a tabular preview instead of a raster. Extraction errors never leave
//! this strategy: they degrade to the default placeholder here.

use async_trait::async_trait;
use calamine::{open_workbook, Data, Range, Reader, Xls, Xlsx};
use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use super::{RenderRequest, RenderStrategy, Rendition};
use crate::classify::{ContentType, SheetKind};
use crate::core::error::StrategyError;
use crate::preview::{Placeholder, PreviewSanitizer};

/// Lines previewed from a delimited text file
pub const CSV_PREVIEW_LINES: usize = 3;

/// Data rows previewed under the header of a workbook's first sheet
pub const SHEET_PREVIEW_ROWS: u32 = 3;

/// Upper bound on bytes read while collecting delimited preview lines
const CSV_READ_LIMIT: u64 = 64 * 1024;

const CELL_SEPARATOR: &str = " | ";

pub struct SpreadsheetStrategy {
    sanitizer: PreviewSanitizer,
}

impl SpreadsheetStrategy {
    pub fn new(sanitizer: PreviewSanitizer) -> Self {
        Self { sanitizer }
    }

    /// Raw preview lines for `path`, before sanitizing
    pub fn extract_lines(path: &Path, kind: SheetKind) -> Result<Vec<String>, StrategyError> {
        match kind {
            SheetKind::Csv => read_delimited_lines(path, CSV_PREVIEW_LINES),
            SheetKind::Xlsx => {
                let mut workbook: Xlsx<_> = open_workbook(path).map_err(extraction)?;
                first_sheet_lines(&mut workbook)
            }
            SheetKind::Xls => {
                let mut workbook: Xls<_> = open_workbook(path).map_err(extraction)?;
                first_sheet_lines(&mut workbook)
            }
        }
    }
}

#[async_trait]
impl RenderStrategy for SpreadsheetStrategy {
    fn name(&self) -> &'static str {
        "spreadsheet"
    }

    async fn render(&self, request: &RenderRequest<'_>) -> Result<Rendition, StrategyError> {
        let title = request.source.display_name();
        let kind = match request.source.cached_content_type() {
            Some(ContentType::Spreadsheet(kind)) => kind,
            // Only reachable when called outside the dispatcher; trust the container
            _ => SheetKind::Xlsx,
        };

        let path: PathBuf = request.source.path().to_path_buf();
        let extracted = tokio::task::spawn_blocking(move || Self::extract_lines(&path, kind))
            .await
            .unwrap_or_else(|e| {
                Err(StrategyError::Extraction {
                    reason: format!("Task join error: {}", e),
                })
            });

        match extracted {
            Ok(raw) => Ok(Rendition::Preview(Placeholder::Tabular {
                title,
                lines: self.sanitizer.sanitize_lines(raw),
            })),
            Err(e) => {
                tracing::debug!(
                    path = %request.source.path().display(),
                    error = %e,
                    "Spreadsheet preview unavailable"
                );
                Ok(Rendition::Degraded {
                    placeholder: Placeholder::no_preview(title),
                    stage: e.stage(),
                    cause: e.to_string(),
                })
            }
        }
    }
}

fn extraction(e: impl Display) -> StrategyError {
    StrategyError::Extraction {
        reason: e.to_string(),
    }
}

/// First `limit` lines of a text file, decoded leniently
fn read_delimited_lines(path: &Path, limit: usize) -> Result<Vec<String>, StrategyError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file.take(CSV_READ_LIMIT));
    let mut lines = Vec::with_capacity(limit);
    let mut buf = Vec::new();

    while lines.len() < limit {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        lines.push(String::from_utf8_lossy(&buf).into_owned());
    }

    Ok(lines)
}

/// Header row plus the first data rows of the first worksheet
fn first_sheet_lines<R, RS>(workbook: &mut R) -> Result<Vec<String>, StrategyError>
where
    R: Reader<RS>,
    RS: Read + Seek,
    R::Error: Display,
{
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| StrategyError::Extraction {
            reason: "workbook has no worksheets".to_string(),
        })?
        .map_err(extraction)?;

    Ok(preview_rows(&range))
}

/// Sheet rows 0 (header) through `SHEET_PREVIEW_ROWS`, by absolute position.
///
/// A row with no non-empty cell is absent and yields no line.
fn preview_rows(range: &Range<Data>) -> Vec<String> {
    let (Some((_, first_col)), Some((_, last_col))) = (range.start(), range.end()) else {
        return Vec::new();
    };

    (0..=SHEET_PREVIEW_ROWS)
        .filter_map(|row| {
            let cells: Vec<String> = (first_col..=last_col)
                .map(|col| {
                    range
                        .get_value((row, col))
                        .map(|cell| cell.to_string())
                        .unwrap_or_default()
                })
                .collect();

            if cells.iter().all(|cell| cell.trim().is_empty()) {
                None
            } else {
                Some(cells.join(CELL_SEPARATOR))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_delimited_lines_stops_at_limit() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "a,b\n1,2\n3,4\n5,6\n").unwrap();

        let lines = read_delimited_lines(file.path(), 3).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].trim_end(), "a,b");
        assert_eq!(lines[2].trim_end(), "3,4");
    }

    #[test]
    fn test_read_delimited_lines_short_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "only,line").unwrap();

        let lines = read_delimited_lines(file.path(), 3).unwrap();
        assert_eq!(lines, vec!["only,line".to_string()]);
    }

    fn sheet(start: (u32, u32), end: (u32, u32), cells: &[((u32, u32), &str)]) -> Range<Data> {
        let mut range = Range::new(start, end);
        for (pos, value) in cells {
            range.set_value(*pos, Data::String(value.to_string()));
        }
        range
    }

    #[test]
    fn test_preview_rows_skip_blank_rows() {
        let range = sheet(
            (0, 0),
            (5, 1),
            &[
                ((0, 0), "name"),
                ((0, 1), "age"),
                ((2, 0), "bob"),
                ((2, 1), "3"),
                ((3, 0), "eve"),
                ((3, 1), "4"),
                ((4, 0), "zed"),
                ((4, 1), "5"),
            ],
        );

        assert_eq!(preview_rows(&range), vec!["name | age", "bob | 3", "eve | 4"]);
    }

    #[test]
    fn test_preview_rows_are_absolute_positions() {
        // nothing within the header and first three data rows
        let range = sheet((6, 0), (9, 0), &[((6, 0), "r6"), ((7, 0), "r7"), ((9, 0), "r9")]);
        assert!(preview_rows(&range).is_empty());
    }

    #[test]
    fn test_preview_rows_keep_partial_rows() {
        let range = sheet((1, 1), (2, 2), &[((1, 2), "only"), ((2, 1), "left")]);
        assert_eq!(preview_rows(&range), vec![" | only", "left | "]);
    }

    #[test]
    fn test_corrupt_workbook_is_extraction_error() {
        let mut file = NamedTempFile::with_suffix(".xlsx").unwrap();
        file.write_all(b"PK\x03\x04 definitely not a workbook").unwrap();

        let err = SpreadsheetStrategy::extract_lines(file.path(), SheetKind::Xlsx).unwrap_err();
        assert_eq!(err.stage(), "extract");
    }
}
