//! Preview drawing primitives
//!
//! Everything needed to put pixels into a thumbnail without an external tool:
//! - Text sanitization for extracted snippets
//! - A built-in bitmap font and word-wrap layout
//! - Placeholder rendering (default, text and tabular variants)
//! - Raster fitting, JPEG encoding and atomic output writes

pub mod font;
pub mod layout;
pub mod output;
mod placeholder;
mod sanitizer;


pub use output::{fit_to_spec, write_jpeg, OutputError};
pub use placeholder::{Placeholder, PlaceholderRenderer, NO_PREVIEW_CAPTION, PASSWORD_CAPTION};
pub use sanitizer::{PreviewSanitizer, PreviewSnippet, DEFAULT_MAX_LINE_CHARS};
