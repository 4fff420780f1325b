//! Core data types for Thumbsmith
//!
//! The output contract shared by every strategy and the per-file dispatch result.

pub mod outcome;
pub mod thumbnail;

pub use outcome::{OutcomeStatus, RenderOutcome};
pub use thumbnail::{ResizeMode, ThumbnailSpec, THUMBNAIL_EXTENSION, THUMBNAIL_PREFIX};
