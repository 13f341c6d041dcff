// src/models/novel.rs

//! Novel metadata produced by discovery.

use serde::Serialize;
use thiserror::Error;

use crate::error::DiscoveryError;

/// Metadata fields read from a novel's info panel.
///
/// Every labeled field is optional because the catalog omits some of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NovelMetadata {
    pub name: String,
    pub author: Option<String>,
    pub word_count: Option<String>,
    pub latest_chapter_title: Option<String>,
    pub latest_update_time: Option<String>,
}

/// A discovered novel and its ordered chapter list.
///
/// Immutable once built; `chapter_count` is always `chapter_links.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NovelRecord {
    name: String,
    source_link: String,
    author: Option<String>,
    word_count: Option<String>,
    latest_chapter_title: Option<String>,
    latest_update_time: Option<String>,
    chapter_links: Vec<String>,
    chapter_count: usize,
}

impl NovelRecord {
    /// Build a record from parsed metadata and the chapter links in site order.
    pub fn new(
        metadata: NovelMetadata,
        source_link: impl Into<String>,
        chapter_links: Vec<String>,
    ) -> Self {
        let chapter_count = chapter_links.len();
        Self {
            name: metadata.name,
            source_link: source_link.into(),
            author: metadata.author,
            word_count: metadata.word_count,
            latest_chapter_title: metadata.latest_chapter_title,
            latest_update_time: metadata.latest_update_time,
            chapter_links,
            chapter_count,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_link(&self) -> &str {
        &self.source_link
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// Free-text word count such as "123万".
    pub fn word_count(&self) -> Option<&str> {
        self.word_count.as_deref()
    }

    pub fn latest_chapter_title(&self) -> Option<&str> {
        self.latest_chapter_title.as_deref()
    }

    /// Last update as `YYYY-MM-DD HH:MM`.
    pub fn latest_update_time(&self) -> Option<&str> {
        self.latest_update_time.as_deref()
    }

    /// Absolute chapter URLs in reading order.
    pub fn chapter_links(&self) -> &[String] {
        &self.chapter_links
    }

    pub fn chapter_count(&self) -> usize {
        self.chapter_count
    }

    /// Output file name: `{name}_{author}.txt`.
    pub fn file_name(&self) -> String {
        let author = self.author.as_deref().unwrap_or("unknown");
        crate::utils::sanitize_file_name(&format!("{}_{}.txt", self.name, author))
    }
}

/// A classified discovery failure with a human-readable message.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{kind}: {message}")]
pub struct DiscoveryFailure {
    pub kind: DiscoveryError,
    pub message: String,
}

impl DiscoveryFailure {
    pub fn new(kind: DiscoveryError, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of a discovery call.
pub type DiscoveryResult = std::result::Result<NovelRecord, DiscoveryFailure>;
