// src/services/chapters.rs

//! Chapter fetching and text normalization.

use std::time::Duration;

use crate::error::ChapterError;
use crate::models::{ChapterContent, ChapterFailure, ChapterOutcome, ChapterSelectors};
use crate::session::{Locator, Page};

/// Fetches single chapters for one novel.
pub struct ChapterFetcher {
    title: Locator,
    content: Locator,
    watermark: String,
}

impl ChapterFetcher {
    /// Create a fetcher whose watermark is interpolated with `novel_name`.
    pub fn new(selectors: &ChapterSelectors, novel_name: &str) -> Self {
        Self {
            title: Locator::css(&selectors.title),
            content: Locator::css(&selectors.content),
            watermark: selectors.watermark_for(novel_name),
        }
    }

    /// Fetch one chapter on `page`, bounding every wait by `timeout`.
    ///
    /// Exactly one attempt is made.
    pub async fn fetch(
        &self,
        page: &mut dyn Page,
        link: &str,
        timeout: Duration,
    ) -> ChapterOutcome {
        if let Err(e) = page.goto(link, timeout).await {
            let kind = if e.is_timeout() {
                ChapterError::NavigationTimeout
            } else {
                ChapterError::NavigationFailed
            };
            log::debug!("Chapter navigation failed for {}: {}", link, e);
            return Err(ChapterFailure::new(kind, link));
        }

        for locator in [&self.title, &self.content] {
            if let Err(e) = page.wait_visible(locator, timeout).await {
                log::debug!("Chapter element missing on {}: {}", link, e);
                return Err(ChapterFailure::new(ChapterError::ElementNotFound, link));
            }
        }

        let title = page
            .inner_text(&self.title)
            .ok()
            .flatten()
            .unwrap_or_default()
            .trim()
            .to_string();
        let raw_body = page.inner_text(&self.content).ok().flatten().unwrap_or_default();
        let body = normalize_content(&raw_body, &self.watermark);

        if title.is_empty() || body.is_empty() {
            return Err(ChapterFailure::new(ChapterError::EmptyContent, link));
        }
        Ok(ChapterContent { title, body })
    }
}

/// Normalize rendered chapter text.
///
/// Drops non-breaking spaces and the watermark, then collapses doubled
/// newlines until none remain.
pub fn normalize_content(text: &str, watermark: &str) -> String {
    let mut body = text.replace('\u{a0}', "");
    if !watermark.is_empty() {
        body = body.replace(watermark, "");
    }
    while body.contains("\n\n") {
        body = body.replace("\n\n", "\n");
    }
    body.trim().to_string()
}
