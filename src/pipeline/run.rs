// src/pipeline/run.rs

//! Discovery followed by download.

use std::sync::Arc;

use crate::models::{Config, DiscoveryFailure, DiscoveryResult, DownloadOutcome};
use crate::pipeline::DownloadCoordinator;
use crate::services::Discoverer;
use crate::session::PageSession;
use crate::utils::is_http_url;

/// What the user asked for: a title to search, or a catalog page to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Name(String),
    Url(String),
}

impl Target {
    /// Anything that looks like an http(s) URL is treated as a catalog link.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if is_http_url(input) {
            Self::Url(input.to_string())
        } else {
            Self::Name(input.to_string())
        }
    }
}

pub async fn discover(discoverer: &Discoverer, target: &Target) -> DiscoveryResult {
    match target {
        Target::Name(name) => discoverer.search_by_name(name).await,
        Target::Url(url) => discoverer.search_by_url(url).await,
    }
}

/// Discover `target` and download it with `concurrency` workers.
///
/// A discovery failure is returned before any output file is created.
pub async fn run_download(
    session: Arc<dyn PageSession>,
    config: &Config,
    target: &Target,
    concurrency: usize,
) -> Result<DownloadOutcome, DiscoveryFailure> {
    let discoverer = Discoverer::new(Arc::clone(&session), config);
    let record = discover(&discoverer, target).await?;

    let coordinator = DownloadCoordinator::new(session, config);
    Ok(coordinator.download(&record, concurrency).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiscoveryError;
    use crate::session::HttpSession;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn parses_urls_and_names() {
        assert_eq!(
            Target::parse(" https://www.bbiquge.org/book/1/ "),
            Target::Url("https://www.bbiquge.org/book/1/".to_string())
        );
        assert_eq!(Target::parse("亏成首富"), Target::Name("亏成首富".to_string()));
        assert_eq!(
            Target::parse("www.bbiquge.org/book/1/"),
            Target::Name("www.bbiquge.org/book/1/".to_string())
        );
    }

    fn html(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .set_body_raw(body.as_bytes().to_vec(), "text/html; charset=utf-8")
    }

    /// Run a download that must fail in discovery and leave no output behind.
    async fn download_from(server: &MockServer, target: &str) -> DiscoveryFailure {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("novels");

        let mut config = Config::default();
        config.catalog.base_url = format!("{}/", server.uri());
        config.download.output_dir = output_dir.clone();
        config.download.timeout_secs = 5;
        let session = Arc::new(HttpSession::with_client(reqwest::Client::new()));

        let failure = run_download(session, &config, &Target::parse(target), 4)
            .await
            .unwrap_err();
        assert!(!output_dir.exists());
        failure
    }

    #[tokio::test]
    async fn missing_search_form_creates_no_output() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html("<html><body><p>维护中</p></body></html>"))
            .mount(&server)
            .await;

        let failure = download_from(&server, "亏成首富").await;
        assert_eq!(failure.kind, DiscoveryError::SearchFormNotFound);
    }

    #[tokio::test]
    async fn unknown_title_creates_no_output() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html(
                r#"<html><body><form action="/modules/article/search.php" method="get">
                     <input type="text" name="searchkey">
                     <button type="submit">搜索</button>
                   </form></body></html>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/modules/article/search.php"))
            .and(query_param("searchkey", "不存在的书"))
            .respond_with(html("<html><body><div id=\"main\"></div></body></html>"))
            .mount(&server)
            .await;

        let failure = download_from(&server, "不存在的书").await;
        assert_eq!(failure.kind, DiscoveryError::NotFound);
    }
}
