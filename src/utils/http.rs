// src/utils/http.rs

//! HTTP client utilities.

use crate::error::Result;
use crate::models::CatalogConfig;

/// Create the shared asynchronous HTTP client.
///
/// No client-wide timeout is set; every navigation passes its own bound.
pub fn create_async_client(config: &CatalogConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .build()?;
    Ok(client)
}
