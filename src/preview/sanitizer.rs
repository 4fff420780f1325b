//! Preview text sanitization
//!
//! Turns raw cell values and text lines into short printable-ASCII strings that the
//! bitmap font can draw.

use crate::core::utils::ELLIPSIS;

/// Default maximum characters per preview line
pub const DEFAULT_MAX_LINE_CHARS: usize = 50;

/// An ordered set of sanitized lines extracted from a document or sheet
pub type PreviewSnippet = Vec<String>;

/// Normalizes extracted snippet lines
#[derive(Debug, Clone, Copy)]
pub struct PreviewSanitizer {
    max_chars: usize,
}

impl Default for PreviewSanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_CHARS)
    }
}

impl PreviewSanitizer {
    /// Create a sanitizer; the limit always leaves room for at least one character
    /// before the ellipsis
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(ELLIPSIS.len() + 1),
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Clean one line.
    ///
    /// Whitespace of any kind becomes a single space, other non-printable or
    /// non-ASCII characters are dropped, the ends are trimmed, and the result is cut
    /// to `max_chars` including the ellipsis. Truncation runs last, on the cleaned
    /// text, so the limit bounds what is displayed rather than the raw input.
    /// Applying it twice changes nothing.
    pub fn sanitize(&self, raw: &str) -> String {
        let mut collapsed = String::with_capacity(raw.len().min(self.max_chars * 4));
        let mut pending_space = false;

        for c in raw.chars() {
            if c.is_whitespace() {
                pending_space = true;
            } else if c.is_ascii_graphic() {
                if pending_space && !collapsed.is_empty() {
                    collapsed.push(' ');
                }
                pending_space = false;
                collapsed.push(c);
            }
        }

        if collapsed.len() <= self.max_chars {
            return collapsed;
        }

        // Only ASCII remains, so byte and char counts agree
        let keep = self.max_chars - ELLIPSIS.len();
        format!("{}{}", collapsed[..keep].trim_end(), ELLIPSIS)
    }

    /// Sanitize every line, dropping those that end up empty
    pub fn sanitize_lines<I, S>(&self, lines: I) -> PreviewSnippet
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .map(|line| self.sanitize(line.as_ref()))
            .filter(|line| !line.is_empty())
            .collect()
    }
}
