//! Client for the book content service
//!
//! One request per call: no retry, no streaming. Every request carries a
//! precomputed basic-auth header.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use tracing::{debug, warn};

use crate::contracts::WorkId;
use crate::error::FetchError;

/// Default base URL of the works resource.
pub const DEFAULT_BASE_URL: &str = "https://reststop.randomhouse.com/resources/works";

/// Basic-auth credentials, encoded once.
#[derive(Clone)]
pub struct BasicAuth {
    header: String,
}

impl BasicAuth {
    pub fn new(user: &str, password: &str) -> Self {
        Self {
            header: format!("Basic {}", STANDARD.encode(format!("{}:{}", user, password))),
        }
    }

    /// Value for the `Authorization` header.
    pub fn header_value(&self) -> &str {
        &self.header
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BasicAuth(<redacted>)")
    }
}

/// Content service connection settings
#[derive(Debug, Clone)]
pub struct ContentConfig {
    pub base_url: String,
    pub user: String,
    pub password: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user: "testuser".to_string(),
            password: "testpassword".to_string(),
        }
    }
}

/// Build the URL of a work: `{base_url}/{work_id}/`.
///
/// Trailing slashes on `base_url` are collapsed so the result never
/// contains `//` at the join.
pub fn work_url(base_url: &str, work_id: WorkId) -> String {
    format!("{}/{}/", base_url.trim_end_matches('/'), work_id)
}

/// HTTP fetcher for the content service
#[derive(Debug, Clone)]
pub struct ContentClient {
    base_url: String,
    auth: BasicAuth,
    client: reqwest::Client,
}

impl ContentClient {
    /// Create new client with default timeouts
    pub fn new(config: &ContentConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            auth: BasicAuth::new(&config.user, &config.password),
            client: reqwest::Client::new(),
        }
    }

    pub fn work_url(&self, work_id: WorkId) -> String {
        work_url(&self.base_url, work_id)
    }

    /// Send one request and read the whole body.
    ///
    /// The authorization header is always set, overriding any caller
    /// value. Non-success statuses are logged but the body is still
    /// returned.
    pub async fn fetch(
        &self,
        method: Method,
        url: &str,
        mut headers: HeaderMap,
    ) -> Result<String, FetchError> {
        let auth = HeaderValue::from_str(self.auth.header_value())
            .map_err(|e| FetchError::Request(format!("invalid authorization header: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);

        let request = self
            .client
            .request(method, url)
            .headers(headers)
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(FetchError::Send)?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "Content service returned non-success status");
        }

        let body = response.text().await.map_err(FetchError::Body)?;
        debug!(%url, bytes = body.len(), "Fetched document");
        Ok(body)
    }

    /// Fetch the document for one work.
    pub async fn fetch_work(&self, work_id: WorkId) -> Result<String, FetchError> {
        let url = self.work_url(work_id);
        self.fetch(Method::GET, &url, HeaderMap::new()).await
    }
}
