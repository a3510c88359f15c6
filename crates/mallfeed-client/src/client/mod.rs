//! HTTP client for the platform's `GET /api/v2/products` listing endpoint.

mod fetch_all;

use std::time::Duration;

use mallfeed_core::ProductRecord;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};

use crate::error::{body_excerpt, ClientError};
use crate::types::ProductsResponse;

pub use fetch_all::Catalog;

const PRODUCTS_PATH: &str = "/api/v2/products";

/// Builds the shared `reqwest::Client` with the configured timeout and `User-Agent`.
///
/// # Errors
///
/// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
/// cannot be constructed (e.g., invalid TLS config).
pub fn build_http_client(timeout_secs: u64, user_agent: &str) -> Result<Client, ClientError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?)
}

/// Joins `path` onto an API origin such as `https://mymall.cafe24api.com`.
///
/// # Errors
///
/// Returns [`ClientError::InvalidBaseUrl`] if the result is not a valid URL.
pub(crate) fn endpoint_url(api_base_url: &str, path: &str) -> Result<Url, ClientError> {
    let base = api_base_url.trim().trim_end_matches('/');
    Url::parse(&format!("{base}{path}")).map_err(|e| ClientError::InvalidBaseUrl {
        base_url: api_base_url.to_owned(),
        reason: e.to_string(),
    })
}

/// Paginated reader for the product listing endpoint.
///
/// Non-2xx responses become [`ClientError::UpstreamApi`]; nothing is retried.
pub struct CatalogClient {
    client: Client,
    products_url: Url,
    page_size: u32,
    max_pages: usize,
}

impl CatalogClient {
    /// Creates a catalog client.
    ///
    /// `page_size` is sent as `limit` on every request; a page shorter than it
    /// ends pagination. `max_pages` caps how many pages one fetch may read.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] if `api_base_url` is not a valid
    /// absolute URL.
    pub fn new(
        client: Client,
        api_base_url: &str,
        page_size: u32,
        max_pages: usize,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client,
            products_url: endpoint_url(api_base_url, PRODUCTS_PATH)?,
            page_size: page_size.max(1),
            max_pages: max_pages.max(1),
        })
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetches one page (1-based) of products.
    ///
    /// # Errors
    ///
    /// - [`ClientError::UpstreamApi`]: any non-2xx status.
    /// - [`ClientError::Http`]: network or TLS failure.
    /// - [`ClientError::Deserialize`]: response body is not a product listing.
    pub async fn fetch_products_page(
        &self,
        token: &SecretString,
        page: u32,
    ) -> Result<Vec<ProductRecord>, ClientError> {
        let url = self.products_url(page);

        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .bearer_auth(token.expose_secret())
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::UpstreamApi {
                status: status.as_u16(),
                url: url.to_string(),
                body: body_excerpt(&body),
            });
        }

        let body = response.text().await?;
        let parsed = serde_json::from_str::<ProductsResponse>(&body).map_err(|e| {
            ClientError::Deserialize {
                context: format!("products page {page}"),
                source: e,
            }
        })?;

        Ok(parsed.products)
    }

    /// Builds the listing URL for a 1-based page number.
    fn products_url(&self, page: u32) -> Url {
        let mut url = self.products_url.clone();
        url.query_pairs_mut()
            .append_pair("limit", &self.page_size.to_string())
            .append_pair("page", &page.to_string());
        url
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
