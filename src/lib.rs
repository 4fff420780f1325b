//! Thumbsmith - a thumbnail generator that always produces an artifact
//!
//! This crate provides:
//! - Content-based file classification
//! - Rendering strategies for images, videos, PDFs, office documents and spreadsheets
//! - A dispatcher that recovers every failure into a placeholder thumbnail
//! - A concurrent directory walker
//! - An HTTP entry point

pub mod classify;
pub mod core;
pub mod dispatch;
pub mod logging;
pub mod preview;
pub mod process;
pub mod server;
pub mod strategy;
pub mod walker;

// Re-export commonly used items
pub use core::config::AppConfig;
pub use core::error::{Result, ThumbnailError};
pub use dispatch::Dispatcher;
pub use server::ThumbnailServer;
pub use walker::{TreeWalker, WalkSummary};
