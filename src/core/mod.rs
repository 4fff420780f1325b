//! Thumbsmith Core Module
//!
//! This module contains the core functionality for Thumbsmith including:
//! - Configuration management
//! - Error types and handling
//! - Output contract and outcome types
//! - Utility functions
//! - External tool discovery

pub mod config;
pub mod error;
pub mod runtime;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use error::{Result, ThumbnailError};
pub use runtime::{RuntimeDependencies, RuntimeStatus};
pub use types::{OutcomeStatus, RenderOutcome, ResizeMode, ThumbnailSpec};
