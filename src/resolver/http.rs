//! HTTP transport for manifest candidates
//!
//! Candidates are resolved against an absolute base URL:
//! - Absolute `http(s)://` candidates are used as-is
//! - Other candidates are joined below the base URL's path, so a base of
//!   `https://example.com/keiba` and a candidate of `/data/races.json`
//!   fetch `https://example.com/keiba/data/races.json`
//!
//! Every request asks intermediaries not to serve a cached copy.

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL, PRAGMA, USER_AGENT},
    Client,
};
use std::time::Duration;
use url::Url;

use super::ManifestTransport;
use crate::utils::error::FetchError;

/// Fetches candidate documents over HTTP
pub struct HttpTransport {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Base URL, always ending in `/`
    base_url: Url,

    user_agent: String,
}

impl HttpTransport {
    /// Create a transport with default timeout and user agent
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidLocation` if `base_url` is not an absolute URL
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        Self::with_config(
            base_url,
            Duration::from_secs(10),
            &format!("racecard/{}", env!("CARGO_PKG_VERSION")),
        )
    }

    /// Create a transport with custom configuration
    ///
    /// # Arguments
    ///
    /// * `base_url` - Absolute URL candidates are resolved against
    /// * `timeout` - Request timeout duration
    /// * `user_agent` - User-Agent header value
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created and
    /// `FetchError::InvalidLocation` if the base URL is unusable
    pub fn with_config(
        base_url: &str,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).gzip(true).build()?;

        let mut base_url =
            Url::parse(base_url).map_err(|e| FetchError::InvalidLocation(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidLocation(base_url.to_string()));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            user_agent: user_agent.to_string(),
        })
    }

    /// Base URL candidates are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a candidate location to an absolute URL
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidLocation` if the location cannot be joined
    pub fn resolve_url(&self, location: &str) -> Result<Url, FetchError> {
        if let Ok(url) = Url::parse(location) {
            if matches!(url.scheme(), "http" | "https") {
                return Ok(url);
            }
        }

        self.base_url
            .join(location.trim_start_matches('/'))
            .map_err(|e| FetchError::InvalidLocation(format!("{location}: {e}")))
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(value) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, value);
        }
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        headers
    }
}

#[async_trait]
impl ManifestTransport for HttpTransport {
    async fn retrieve(&self, location: &str) -> Result<String, FetchError> {
        let url = self.resolve_url(location)?;
        tracing::debug!(url = %url, "Fetching manifest candidate");

        let response = self
            .client
            .get(url)
            .headers(self.build_headers())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}
