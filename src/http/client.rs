//! HTTP client with retry, token refresh and rate limiting
//!
//! Provides the transport every fetcher goes through:
//! - Bearer auth on every request, token acquired lazily
//! - One re-authentication and resend on 401
//! - Automatic retries with backoff for 429/5xx, timeouts and connect errors
//! - Non-200 answers reported to the caller as "no data"

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::auth::{Authenticator, Credentials};
use crate::config::TapConfig;
use crate::error::{is_retryable_status, Error, Result};
use crate::types::JsonValue;
use reqwest::{Client, Method, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of retries
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            rate_limit: None,
            user_agent: format!("tap-solarvista/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }

    /// Derive the transport settings from the run config
    pub fn from_tap_config(config: &TapConfig) -> Self {
        let mut builder = Self::builder()
            .timeout(config.request_timeout())
            .max_retries(config.max_retries);
        if let Some(rps) = config.max_requests_per_second {
            builder = builder.rate_limit(RateLimiterConfig::per_second(rps));
        }
        builder.build()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// HTTP client with retry, re-authentication and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Authenticator,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a client from the run config
    pub fn from_tap_config(config: &TapConfig) -> Result<Self> {
        Self::new(
            HttpClientConfig::from_tap_config(config),
            Credentials::from_config(config),
        )
    }

    /// Create a client with custom configuration
    pub fn new(config: HttpClientConfig, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(Error::Http)?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);
        let authenticator = Authenticator::with_client(credentials, client.clone());

        Ok(Self {
            client,
            config,
            authenticator,
            rate_limiter,
        })
    }

    /// Get the authenticator
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// GET a JSON document
    pub async fn get_json(&self, url: &str) -> Result<Option<JsonValue>> {
        self.fetch(Method::GET, url, None).await
    }

    /// POST a JSON body and read a JSON document
    pub async fn post_json(&self, url: &str, body: Option<&JsonValue>) -> Result<Option<JsonValue>> {
        self.fetch(Method::POST, url, body).await
    }

    /// Issue a request and parse the JSON answer.
    ///
    /// Returns `Ok(None)` for non-200 answers and empty or unparseable bodies.
    /// A 401 invalidates the cached token and resends once; a second 401 is an
    /// error.
    pub async fn fetch(
        &self,
        method: Method,
        url: &str,
        body: Option<&JsonValue>,
    ) -> Result<Option<JsonValue>> {
        let mut response = self.send(method.clone(), url, body).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            error!("[401] token expired {url}");
            self.authenticator.invalidate().await;
            response = self.send(method.clone(), url, body).await?;

            if response.status() == StatusCode::UNAUTHORIZED {
                let text = response.text().await.unwrap_or_default();
                return Err(Error::http_status(401, text));
            }
        }

        read_json(&method, url, response).await
    }

    /// Send a request, retrying throttled, failed and timed out attempts
    async fn send(&self, method: Method, url: &str, body: Option<&JsonValue>) -> Result<Response> {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let mut req = self
                .client
                .request(method.clone(), url)
                .header("Accept", "application/json")
                .header("Content-Type", "application/json")
                .timeout(self.config.timeout);

            if let Some(body) = body {
                req = req.json(body);
            }

            req = self.authenticator.apply(req).await?;

            debug!("{method} {url}");

            match req.send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!("[{}] {method} {url}", status.as_u16());

                    if !is_retryable_status(status.as_u16()) {
                        return Ok(response);
                    }

                    if attempt >= max_retries {
                        if status == StatusCode::TOO_MANY_REQUESTS {
                            return Err(Error::RateLimited);
                        }
                        let text = response.text().await.unwrap_or_default();
                        return Err(Error::http_status(status.as_u16(), text));
                    }

                    let delay = extract_retry_after(&response)
                        .unwrap_or_else(|| self.calculate_backoff(attempt));
                    warn!(
                        "Request failed with {}, attempt {}/{}, retrying in {:?}",
                        status.as_u16(),
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    let retryable = e.is_timeout() || e.is_connect();
                    if !retryable {
                        return Err(Error::Http(e));
                    }

                    if attempt >= max_retries {
                        if e.is_timeout() {
                            return Err(Error::Timeout {
                                timeout_ms: self.config.timeout.as_millis() as u64,
                            });
                        }
                        return Err(Error::Http(e));
                    }

                    let delay = self.calculate_backoff(attempt);
                    warn!(
                        "Request error ({e}), attempt {}/{}, retrying in {:?}",
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Exponential backoff delay for a given attempt, capped at `max_backoff`
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        std::cmp::min(
            self.config.initial_backoff.saturating_mul(factor),
            self.config.max_backoff,
        )
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("authenticator", &self.authenticator)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Turn a final response into a JSON document, or `None` for "no data"
async fn read_json(method: &Method, url: &str, response: Response) -> Result<Option<JsonValue>> {
    let status = response.status();
    if status != StatusCode::OK {
        warn!("[{}] {method} {url} returned no data", status.as_u16());
        return Ok(None);
    }

    let text = response.text().await.map_err(Error::Http)?;
    if text.trim().is_empty() {
        return Ok(None);
    }

    match serde_json::from_str::<JsonValue>(&text) {
        Ok(JsonValue::Null) => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!("{method} {url} returned a malformed body: {e}");
            Ok(None)
        }
    }
}

/// Extract retry-after header value
fn extract_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
}
