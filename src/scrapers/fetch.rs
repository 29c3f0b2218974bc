//! HTML fetching
//!
//! One attempt per call with a bounded timeout. Retries, if ever wanted,
//! belong to the scheduler cadence, not here.

use crate::config::{REQUEST_TIMEOUT_SECS, USER_AGENT};
use crate::error::Result;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;

/// Shared HTTP client for all scrapers.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .default_headers(headers)
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Fetch a page, treating non-2xx statuses as errors.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        tracing::debug!("Fetching HTML from {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// Fetch a page, degrading a transport failure to `None` with an error
    /// log. Scrapers turn `None` into an empty extraction.
    pub async fn try_fetch(&self, url: &str, context: &str) -> Option<String> {
        match self.fetch(url).await {
            Ok(html) => Some(html),
            Err(e) => {
                tracing::error!("Failed to fetch {}: {}", context, e);
                None
            }
        }
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/market-data"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new();
        let body = fetcher
            .fetch(&format!("{}/market-data", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_fetch_maps_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new();
        assert!(fetcher.fetch(&server.uri()).await.is_err());
    }
}
