//! Utility functions for Thumbsmith
//!
//! Common helper functions used throughout the application.

use std::path::Path;

/// Marker appended to truncated text
pub const ELLIPSIS: &str = "...";

/// Extract filename from path, lossily converted for display
pub fn get_filename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Truncate to at most `max_chars` characters, ending with an ellipsis when cut.
///
/// The ellipsis counts towards the limit.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut out: String = s.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Keep the first `max_chars` characters and append an ellipsis when anything was cut.
///
/// Unlike [`truncate_with_ellipsis`] the marker is added on top of the limit.
pub fn excerpt(s: &str, max_chars: usize) -> String {
    let mut chars = s.chars();
    let mut out: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        out.push_str(ELLIPSIS);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_filename() {
        assert_eq!(get_filename(Path::new("/a/b/report.docx")), "report.docx");
        assert_eq!(get_filename(Path::new("/")), "");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("hello", 10), "hello");
        assert_eq!(truncate_with_ellipsis("hello world", 8), "hello...");
        assert_eq!(truncate_with_ellipsis("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("short", 200), "short");
        assert_eq!(excerpt("abcdef", 3), "abc...");
        assert_eq!(excerpt("abc", 3), "abc");
    }
}
