// src/models/download.rs

//! Segments, per-segment results and the final download outcome.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ChapterError;

/// A contiguous slice of the chapter list assigned to one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// 0-based position of the first link in the full chapter list
    pub start: usize,
    pub links: Vec<String>,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// The chapter that stopped a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentFailure {
    /// 0-based position in the full chapter list
    pub index: usize,
    pub kind: ChapterError,
    pub link: String,
}

/// What one worker produced for its segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentResult {
    pub start: usize,
    /// Chapters written to the part file, all before `failure` if any
    pub written: usize,
    pub failure: Option<SegmentFailure>,
}

impl SegmentResult {
    pub fn failed_immediately(&self) -> bool {
        self.failure.is_some() && self.written == 0
    }
}

/// Overall status of a download run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DownloadStatus {
    Success,
    PartialFailure,
    Failure,
}

impl DownloadStatus {
    /// Classify a run from its segment results.
    pub fn from_results(results: &[SegmentResult]) -> Self {
        if results.is_empty() || results.iter().all(SegmentResult::failed_immediately) {
            return Self::Failure;
        }
        if results.iter().any(|r| r.failure.is_some()) {
            Self::PartialFailure
        } else {
            Self::Success
        }
    }
}

/// The only artifact returned to the caller of a download.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadOutcome {
    pub status: DownloadStatus,
    pub output_path: PathBuf,
    pub chapters_written: usize,
    /// 1-based position of the earliest failed chapter
    pub first_failure_index: Option<usize>,
    pub first_failure_link: Option<String>,
    pub message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        self.status == DownloadStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(start: usize, written: usize) -> SegmentResult {
        SegmentResult {
            start,
            written,
            failure: None,
        }
    }

    fn failed(start: usize, written: usize) -> SegmentResult {
        SegmentResult {
            start,
            written,
            failure: Some(SegmentFailure {
                index: start + written,
                kind: ChapterError::ElementNotFound,
                link: format!("https://example.com/{}", start + written),
            }),
        }
    }

    #[test]
    fn status_success_when_no_failures() {
        assert_eq!(
            DownloadStatus::from_results(&[ok(0, 5), ok(5, 5)]),
            DownloadStatus::Success
        );
    }

    #[test]
    fn status_partial_when_some_failed() {
        assert_eq!(
            DownloadStatus::from_results(&[ok(0, 5), failed(5, 0)]),
            DownloadStatus::PartialFailure
        );
        assert_eq!(
            DownloadStatus::from_results(&[failed(0, 2), failed(5, 0)]),
            DownloadStatus::PartialFailure
        );
    }

    #[test]
    fn status_failure_when_all_failed_immediately() {
        assert_eq!(
            DownloadStatus::from_results(&[failed(0, 0), failed(5, 0)]),
            DownloadStatus::Failure
        );
    }

    #[test]
    fn status_failure_without_segments() {
        assert_eq!(DownloadStatus::from_results(&[]), DownloadStatus::Failure);
    }
}
