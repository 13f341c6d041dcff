//! Service layer for the downloader.
//!
//! This module contains the business logic for:
//! - Novel discovery (`Discoverer`)
//! - Info panel field parsing (`metadata`)
//! - Chapter fetching (`ChapterFetcher`)

mod chapters;
mod discovery;
pub mod metadata;

pub use chapters::{ChapterFetcher, normalize_content};
pub use discovery::Discoverer;
