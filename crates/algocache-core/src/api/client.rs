//! HTTP client for the remote content API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{Endpoint, SourceError};
use crate::config::Config;
use crate::repository::SourceRepository;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// The reachability probe must answer quickly or the source counts as down.
const PROBE_TIMEOUT_MS: u64 = 3000;

/// Extra probe attempts before declaring the source unreachable.
const PROBE_RETRIES: u32 = 2;

const PROBE_BACKOFF_MS: u64 = 250;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Path of the health endpoint used by the reachability probe.
const HEALTH_PATH: &str = "health";

/// API client for the content service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<Arc<str>>,
    offline: bool,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let base_url = Url::parse(base_url).map_err(|e| SourceError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(SourceError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            token: None,
            offline: false,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let timeout = Duration::from_secs(
            config
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        );
        let mut client = Self::new(&config.api_base_url, timeout)?;
        if let Some(ref token) = config.api_token {
            client = client.with_token(token);
        }
        Ok(client.with_offline_mode(config.offline_mode))
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: &str) -> Self {
        Self {
            token: Some(Arc::from(token)),
            ..self.clone()
        }
    }

    /// In offline mode the source always reports itself unreachable and no
    /// request is ever sent.
    pub fn with_offline_mode(&self, offline: bool) -> Self {
        Self {
            offline,
            ..self.clone()
        }
    }

    pub fn is_offline_mode(&self) -> bool {
        self.offline
    }

    /// Base URL with `segments` appended, each percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base URL can always take path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, SourceError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| SourceError::Unauthorized)?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(None) for rate limiting so the caller can back off and retry.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>, SourceError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(SourceError::from_status(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url, query: Option<(&str, &str)>) -> Result<T, SourceError> {
        if self.offline {
            debug!(url = %url, "Offline mode - request not sent");
            return Err(SourceError::Unavailable);
        }

        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let mut request = self.client.get(url.clone()).headers(self.auth_headers()?);
            if let Some(pair) = query {
                request = request.query(&[pair]);
            }
            let response = request.send().await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let text = response.text().await?;
                    return serde_json::from_str(&text).map_err(|e| {
                        SourceError::InvalidResponse(format!("Failed to parse JSON from {}: {}", url, e))
                    });
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(SourceError::RateLimited);
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    /// Probe the health endpoint, retrying briefly before giving up.
    pub async fn probe(&self) -> bool {
        if self.offline {
            debug!("Offline mode - skipping reachability probe");
            return false;
        }

        let url = self.url(&[HEALTH_PATH]);
        let mut backoff_ms = PROBE_BACKOFF_MS;
        for attempt in 0..=PROBE_RETRIES {
            let result = self
                .client
                .get(url.clone())
                .timeout(Duration::from_millis(PROBE_TIMEOUT_MS))
                .send()
                .await;
            match result {
                Ok(response) if response.status().is_success() => return true,
                Ok(response) => {
                    debug!(status = %response.status(), attempt, "Health probe rejected");
                }
                Err(e) => {
                    debug!(error = %e, attempt, "Health probe failed");
                }
            }
            if attempt < PROBE_RETRIES {
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2;
            }
        }
        false
    }
}

#[async_trait]
impl<E: Endpoint> SourceRepository<E> for ApiClient {
    async fn is_available(&self) -> bool {
        self.probe().await
    }

    async fn get_all(&self) -> Result<Vec<E>, SourceError> {
        let items: Vec<E> = self.get(self.url(&[E::PATH]), None).await?;
        debug!(kind = %E::KIND, count = items.len(), "Fetched collection");
        Ok(items)
    }

    async fn get_by_id(&self, id: &E::Id) -> Result<E, SourceError> {
        let id = id.to_string();
        self.get(self.url(&[E::PATH, id.as_str()]), None).await
    }

    async fn get_by_filter(&self, filter: &E::Filter) -> Result<Vec<E>, SourceError> {
        let (param, value) = E::filter_query(filter);
        let items: Vec<E> = self
            .get(self.url(&[E::PATH]), Some((param, value.as_str())))
            .await?;
        debug!(kind = %E::KIND, filter = ?filter, count = items.len(), "Fetched filtered collection");
        Ok(items)
    }
}
