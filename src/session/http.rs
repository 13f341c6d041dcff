// src/session/http.rs

//! HTTP-backed page session.
//!
//! Pages are fetched with a shared `reqwest` client and queried with
//! `scraper`. Documents are parsed on demand inside synchronous helpers so
//! no parsed tree is ever held across an await point.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::CatalogConfig;
use crate::session::{Locator, Page, PageError, PageSession};
use crate::utils::html::inner_text;
use crate::utils::http::create_async_client;

/// Input types that never contribute a value to a submitted form.
const SKIPPED_INPUT_TYPES: &[&str] = &["submit", "button", "reset", "image", "file"];

/// Page session backed by a pooled HTTP client.
#[derive(Clone)]
pub struct HttpSession {
    client: Client,
}

impl HttpSession {
    /// Create a session with a client configured for the catalog.
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        Ok(Self::with_client(create_async_client(config)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSession for HttpSession {
    async fn new_page(&self) -> std::result::Result<Box<dyn Page>, PageError> {
        Ok(Box::new(HttpPage::new(self.client.clone())))
    }
}

/// A page holding the last document it navigated to.
pub struct HttpPage {
    client: Client,
    url: Option<Url>,
    html: String,
    filled: Vec<(String, String)>,
}

#[derive(Debug)]
enum FormMethod {
    Get,
    Post,
}

#[derive(Debug)]
struct FormSubmission {
    action: Url,
    method: FormMethod,
    fields: Vec<(String, String)>,
}

impl HttpPage {
    fn new(client: Client) -> Self {
        Self {
            client,
            url: None,
            html: String::new(),
            filled: Vec::new(),
        }
    }

    fn selector(locator: &Locator) -> std::result::Result<Selector, PageError> {
        Selector::parse(locator.as_str())
            .map_err(|_| PageError::InvalidSelector(locator.as_str().to_string()))
    }

    /// Parse the current body and run `f` on it.
    ///
    /// Every query parses again; `Html` is not `Send`, so it is never kept on
    /// a page that moves between tasks.
    fn with_document<T>(
        &self,
        f: impl FnOnce(&Html) -> T,
    ) -> std::result::Result<T, PageError> {
        if self.url.is_none() {
            return Err(PageError::NoPageLoaded);
        }
        let document = Html::parse_document(&self.html);
        Ok(f(&document))
    }

    async fn load(
        &mut self,
        request: RequestBuilder,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<(), PageError> {
        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                PageError::Timeout(timeout)
            } else {
                PageError::navigation(url, e)
            }
        };

        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?
            .error_for_status()
            .map_err(classify)?;
        let final_url = response.url().clone();
        let body = response.text().await.map_err(classify)?;

        log::debug!("Loaded {} ({} bytes)", final_url, body.len());
        self.url = Some(final_url);
        self.html = body;
        self.filled.clear();
        Ok(())
    }

    /// Input name targeted by a locator.
    fn input_name(&self, locator: &Locator) -> std::result::Result<String, PageError> {
        let selector = Self::selector(locator)?;
        self.with_document(|document| {
            document
                .select(&selector)
                .next()
                .and_then(|input| input.value().attr("name").map(str::to_string))
        })?
        .ok_or_else(|| PageError::NotVisible(locator.as_str().to_string()))
    }

    /// Work out what submitting the form around `locator` would send.
    fn form_submission(&self, locator: &Locator) -> std::result::Result<FormSubmission, PageError> {
        let selector = Self::selector(locator)?;
        let fields_selector = Selector::parse("input[name], textarea[name], select[name]")
            .map_err(|_| PageError::InvalidSelector("input[name]".to_string()))?;
        let base = self.url.clone().ok_or(PageError::NoPageLoaded)?;

        self.with_document(|document| {
            let control = document
                .select(&selector)
                .next()
                .ok_or_else(|| PageError::NotVisible(locator.as_str().to_string()))?;
            let form = control
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|e| e.value().name() == "form")
                .ok_or_else(|| PageError::FormNotFound(locator.as_str().to_string()))?;

            let action = match form.value().attr("action") {
                Some(action) if !action.trim().is_empty() => base
                    .join(action.trim())
                    .map_err(|_| PageError::InvalidUrl(action.to_string()))?,
                _ => base.clone(),
            };
            let method = match form.value().attr("method") {
                Some(m) if m.eq_ignore_ascii_case("post") => FormMethod::Post,
                _ => FormMethod::Get,
            };

            let mut fields = Vec::new();
            for field in form.select(&fields_selector) {
                let element = field.value();
                let input_type = element.attr("type").unwrap_or("text").to_ascii_lowercase();
                if SKIPPED_INPUT_TYPES.contains(&input_type.as_str()) {
                    continue;
                }
                let Some(name) = element.attr("name") else {
                    continue;
                };
                let value = self
                    .filled
                    .iter()
                    .rev()
                    .find(|(filled_name, _)| filled_name == name)
                    .map(|(_, value)| value.clone())
                    .or_else(|| element.attr("value").map(str::to_string))
                    .unwrap_or_default();
                fields.push((name.to_string(), value));
            }
            if let Some(name) = control.value().attr("name") {
                let value = control.value().attr("value").unwrap_or_default();
                fields.push((name.to_string(), value.to_string()));
            }

            Ok(FormSubmission {
                action,
                method,
                fields,
            })
        })?
    }

    #[cfg(test)]
    pub(crate) fn from_html(url: &str, html: &str) -> Self {
        Self {
            client: Client::new(),
            url: Url::parse(url).ok(),
            html: html.to_string(),
            filled: Vec::new(),
        }
    }
}

#[async_trait]
impl Page for HttpPage {
    async fn goto(&mut self, url: &str, timeout: Duration) -> std::result::Result<(), PageError> {
        let target = Url::parse(url).map_err(|_| PageError::InvalidUrl(url.to_string()))?;
        let request = self.client.get(target);
        self.load(request, url, timeout).await
    }

    fn url(&self) -> &str {
        self.url.as_ref().map(Url::as_str).unwrap_or_default()
    }

    /// A fetched document is static, so presence is checked once.
    async fn wait_visible(
        &self,
        locator: &Locator,
        _timeout: Duration,
    ) -> std::result::Result<(), PageError> {
        let selector = Self::selector(locator)?;
        let present = self.with_document(|document| document.select(&selector).next().is_some())?;
        if present {
            Ok(())
        } else {
            Err(PageError::NotVisible(locator.as_str().to_string()))
        }
    }

    fn inner_text(&self, locator: &Locator) -> std::result::Result<Option<String>, PageError> {
        let selector = Self::selector(locator)?;
        self.with_document(|document| document.select(&selector).next().map(inner_text))
    }

    fn all_inner_texts(&self, locator: &Locator) -> std::result::Result<Vec<String>, PageError> {
        let selector = Self::selector(locator)?;
        self.with_document(|document| document.select(&selector).map(inner_text).collect())
    }

    fn all_attributes(
        &self,
        locator: &Locator,
        name: &str,
    ) -> std::result::Result<Vec<Option<String>>, PageError> {
        let selector = Self::selector(locator)?;
        self.with_document(|document| {
            document
                .select(&selector)
                .map(|e| e.value().attr(name).map(str::to_string))
                .collect()
        })
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> std::result::Result<(), PageError> {
        let name = self.input_name(locator)?;
        self.filled.push((name, value.to_string()));
        Ok(())
    }

    async fn click_for_popup(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> std::result::Result<Box<dyn Page>, PageError> {
        let submission = self.form_submission(locator)?;
        log::debug!(
            "Submitting {:?} form to {} with {} field(s)",
            submission.method,
            submission.action,
            submission.fields.len()
        );

        let mut popup = HttpPage::new(self.client.clone());
        let target = submission.action.to_string();
        let request = match submission.method {
            FormMethod::Get => {
                let mut url = submission.action;
                url.query_pairs_mut()
                    .clear()
                    .extend_pairs(submission.fields.iter());
                self.client.get(url)
            }
            FormMethod::Post => self.client.post(submission.action).form(&submission.fields),
        };
        popup.load(request, &target, timeout).await?;
        Ok(Box::new(popup))
    }

    async fn close(self: Box<Self>) {
        log::trace!("Closing page {}", self.url());
    }
}
