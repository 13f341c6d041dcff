// src/models/chapter.rs

//! Chapter fetch results.

use serde::Serialize;

use crate::error::ChapterError;

/// A fetched chapter with normalized plain-text body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterContent {
    pub title: String,
    pub body: String,
}

/// Separator line written between chapters.
pub const CHAPTER_SEPARATOR: &str = "----------";

impl ChapterContent {
    /// Render the chapter as it appears in the output file.
    pub fn render(&self) -> String {
        format!("{}\n{}\n\n{}\n\n", self.title, self.body, CHAPTER_SEPARATOR)
    }
}

/// A chapter that could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterFailure {
    pub kind: ChapterError,
    pub link: String,
}

impl ChapterFailure {
    pub fn new(kind: ChapterError, link: impl Into<String>) -> Self {
        Self {
            kind,
            link: link.into(),
        }
    }
}

/// Outcome of one chapter fetch attempt.
pub type ChapterOutcome = std::result::Result<ChapterContent, ChapterFailure>;
