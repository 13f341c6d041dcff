// src/models/mod.rs

//! Domain models for the downloader.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod chapter;
mod config;
mod download;
mod novel;
mod selectors;

// Re-export all public types
pub use chapter::{CHAPTER_SEPARATOR, ChapterContent, ChapterFailure, ChapterOutcome};
pub use config::{CatalogConfig, Config, DownloadConfig};
pub use download::{DownloadOutcome, DownloadStatus, Segment, SegmentFailure, SegmentResult};
pub use novel::{DiscoveryFailure, DiscoveryResult, NovelMetadata, NovelRecord};
pub use selectors::{CatalogSelectors, ChapterSelectors};
