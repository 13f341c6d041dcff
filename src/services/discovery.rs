// src/services/discovery.rs

//! Novel discovery service.
//!
//! Turns a novel name or a catalog URL into a [`NovelRecord`], or a
//! classified [`DiscoveryFailure`].

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::error::DiscoveryError;
use crate::models::{CatalogSelectors, Config, DiscoveryFailure, DiscoveryResult, NovelRecord};
use crate::services::metadata::parse_metadata;
use crate::session::{Locator, Page, PageError, PageSession};
use crate::utils::resolve_url;

/// Service for locating a novel on the catalog site.
pub struct Discoverer {
    session: Arc<dyn PageSession>,
    base_url: String,
    selectors: CatalogSelectors,
    timeout: Duration,
}

impl Discoverer {
    pub fn new(session: Arc<dyn PageSession>, config: &Config) -> Self {
        Self {
            session,
            base_url: config.catalog.base_url.clone(),
            selectors: config.catalog.search.clone(),
            timeout: config.download.timeout(),
        }
    }

    /// Search the catalog by novel name.
    pub async fn search_by_name(&self, name: &str) -> DiscoveryResult {
        log::info!("Searching '{}' on {}", name, self.base_url);
        let mut page = self.open_page().await?;
        let result = self.search_on(page.as_mut(), name).await;
        page.close().await;
        log_result(&result);
        result
    }

    /// Read a novel directly from its catalog URL.
    pub async fn search_by_url(&self, url: &str) -> DiscoveryResult {
        log::info!("Reading novel page {}", url);
        let mut page = self.open_page().await?;
        let result = match page.goto(url, self.timeout).await {
            Ok(()) => self.read_novel(page.as_ref(), false).await,
            Err(e) => Err(navigation_failure(url, e)),
        };
        page.close().await;
        log_result(&result);
        result
    }

    async fn open_page(&self) -> Result<Box<dyn Page>, DiscoveryFailure> {
        self.session.new_page().await.map_err(|e| {
            DiscoveryFailure::new(
                DiscoveryError::NavigationFailed,
                format!("could not open a page: {e}"),
            )
        })
    }

    async fn search_on(&self, page: &mut dyn Page, name: &str) -> DiscoveryResult {
        page.goto(&self.base_url, self.timeout)
            .await
            .map_err(|e| navigation_failure(&self.base_url, e))?;

        let input = Locator::css(&self.selectors.search_input);
        let submit = Locator::css(&self.selectors.search_submit);
        for locator in [&input, &submit] {
            if page.wait_visible(locator, self.timeout).await.is_err() {
                return Err(form_not_found(locator));
            }
        }
        page.fill(&input, name)
            .await
            .map_err(|_| form_not_found(&input))?;

        let results = page
            .click_for_popup(&submit, self.timeout)
            .await
            .map_err(|e| match e {
                PageError::FormNotFound(_) => form_not_found(&submit),
                e => navigation_failure("search results", e),
            })?;
        let outcome = self.read_novel(results.as_ref(), true).await;
        results.close().await;

        outcome.map_err(|failure| match failure.kind {
            DiscoveryError::NotFound => {
                DiscoveryFailure::new(DiscoveryError::NotFound, format!("no novel named '{name}'"))
            }
            _ => failure,
        })
    }

    /// Classify a loaded page and extract the record from it.
    async fn read_novel(&self, page: &dyn Page, allow_ambiguous: bool) -> DiscoveryResult {
        let info = Locator::css(&self.selectors.info_panel);
        if page.wait_visible(&info, self.timeout).await.is_err() {
            let candidates = Locator::css(&self.selectors.candidate_list);
            if allow_ambiguous && page.wait_visible(&candidates, self.timeout).await.is_ok() {
                return Err(DiscoveryFailure::new(
                    DiscoveryError::AmbiguousResult,
                    "several novels match; search again with the novel's URL",
                ));
            }
            return Err(DiscoveryFailure::new(
                DiscoveryError::NotFound,
                format!("no novel information at {}", page.url()),
            ));
        }

        self.extract_record(page).map_err(|e| {
            DiscoveryFailure::new(
                DiscoveryError::NotFound,
                format!("could not read novel page {}: {e}", page.url()),
            )
        })
    }

    fn extract_record(&self, page: &dyn Page) -> Result<NovelRecord, PageError> {
        let name = page
            .inner_text(&Locator::css(&self.selectors.info_heading))?
            .unwrap_or_default();
        if name.trim().is_empty() {
            return Err(PageError::NotVisible(self.selectors.info_heading.clone()));
        }
        let fields = page.all_inner_texts(&Locator::css(&self.selectors.info_fields))?;
        let metadata = parse_metadata(&name, fields.iter().map(String::as_str));

        let source_link = page.url().to_string();
        let base =
            Url::parse(&source_link).map_err(|_| PageError::InvalidUrl(source_link.clone()))?;
        let chapter_links = page
            .all_attributes(&Locator::css(&self.selectors.chapter_links), "href")?
            .into_iter()
            .flatten()
            .map(|href| resolve_url(&base, href.trim()))
            .collect();

        Ok(NovelRecord::new(metadata, source_link, chapter_links))
    }
}

fn navigation_failure(target: &str, error: PageError) -> DiscoveryFailure {
    if error.is_timeout() {
        DiscoveryFailure::new(
            DiscoveryError::NavigationTimeout,
            format!("loading {target} {error}"),
        )
    } else {
        DiscoveryFailure::new(DiscoveryError::NavigationFailed, error.to_string())
    }
}

fn form_not_found(locator: &Locator) -> DiscoveryFailure {
    DiscoveryFailure::new(
        DiscoveryError::SearchFormNotFound,
        format!("search form element '{}' not found on the home page", locator.as_str()),
    )
}

fn log_result(result: &DiscoveryResult) {
    match result {
        Ok(record) => log::info!(
            "Found '{}' by {} with {} chapters",
            record.name(),
            record.author().unwrap_or("unknown author"),
            record.chapter_count()
        ),
        Err(failure) => log::warn!("Discovery failed: {}", failure),
    }
}
