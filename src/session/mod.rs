//! Browser-automation capability.
//!
//! The discovery and download pipeline only talks to a [`PageSession`] and
//! the [`Page`]s it issues. [`HttpSession`] is the shipped implementation.
//!
//! A session is shared by every worker; a page belongs to exactly one worker
//! for its whole life and must be closed by its owner.

mod http;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use http::{HttpPage, HttpSession};

/// Why a page operation failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("element '{0}' is not visible")]
    NotVisible(String),

    #[error("invalid selector '{0}'")]
    InvalidSelector(String),

    #[error("invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("no page has been loaded")]
    NoPageLoaded,

    #[error("no form contains '{0}'")]
    FormNotFound(String),
}

impl PageError {
    pub fn navigation(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Navigation {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// A structural query that identifies elements on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator(String);

impl Locator {
    /// Locate elements by CSS selector.
    pub fn css(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Issues independent pages that share one browser context.
#[async_trait]
pub trait PageSession: Send + Sync {
    async fn new_page(&self) -> Result<Box<dyn Page>, PageError>;
}

/// One navigable page, owned by a single task.
#[async_trait]
pub trait Page: Send + Sync {
    /// Navigate to `url`, giving up after `timeout`.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), PageError>;

    /// Current URL after any redirects; empty before the first navigation.
    fn url(&self) -> &str;

    /// Wait until the first element matching `locator` is visible.
    async fn wait_visible(&self, locator: &Locator, timeout: Duration) -> Result<(), PageError>;

    /// Rendered text of the first matching element.
    fn inner_text(&self, locator: &Locator) -> Result<Option<String>, PageError>;

    /// Rendered text of every matching element, in document order.
    fn all_inner_texts(&self, locator: &Locator) -> Result<Vec<String>, PageError>;

    /// Attribute `name` of every matching element, in document order.
    fn all_attributes(&self, locator: &Locator, name: &str)
    -> Result<Vec<Option<String>>, PageError>;

    /// Type `value` into the first matching input.
    async fn fill(&mut self, locator: &Locator, value: &str) -> Result<(), PageError>;

    /// Click the first matching control and return the page it opens.
    async fn click_for_popup(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Box<dyn Page>, PageError>;

    /// Release the page.
    async fn close(self: Box<Self>);
}
