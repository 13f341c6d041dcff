//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{CatalogSelectors, ChapterSelectors};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Catalog site location and markup
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Chapter download behavior
    #[serde(default)]
    pub download: DownloadConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.catalog.user_agent.trim().is_empty() {
            return Err(AppError::validation("catalog.user_agent is empty"));
        }
        let base_url = url::Url::parse(&self.catalog.base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(AppError::config("catalog.base_url must be an http(s) URL"));
        }
        if self.download.timeout_secs == 0 {
            return Err(AppError::validation("download.timeout_secs must be > 0"));
        }
        if self.download.concurrency == 0 {
            return Err(AppError::validation("download.concurrency must be > 0"));
        }
        if self.download.flush_every == 0 {
            return Err(AppError::validation("download.flush_every must be > 0"));
        }

        let chapter = &self.catalog.chapter;
        let selectors = self
            .catalog
            .search
            .all()
            .into_iter()
            .chain([chapter.title.as_str(), chapter.content.as_str()]);
        for selector in selectors {
            scraper::Selector::parse(selector)
                .map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        }
        Ok(())
    }
}

/// Catalog site settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Home page of the catalog site
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub search: CatalogSelectors,

    #[serde(default)]
    pub chapter: ChapterSelectors,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            search: CatalogSelectors::default(),
            chapter: ChapterSelectors::default(),
        }
    }
}

/// Chapter download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Bound on every page navigation and element wait, in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Number of concurrent segment workers
    #[serde(default = "defaults::concurrency")]
    pub concurrency: usize,

    /// Chapters buffered per part file between flushes
    #[serde(default = "defaults::flush_every")]
    pub flush_every: usize,

    /// Directory that receives the output file
    #[serde(default = "defaults::output_dir")]
    pub output_dir: PathBuf,
}

impl DownloadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::timeout(),
            concurrency: defaults::concurrency(),
            flush_every: defaults::flush_every(),
            output_dir: defaults::output_dir(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn base_url() -> String {
        "https://www.bbiquge.org/".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; novel-dl/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn concurrency() -> usize {
        4
    }
    pub fn flush_every() -> usize {
        10
    }
    pub fn output_dir() -> PathBuf {
        PathBuf::from("./novels")
    }
}
