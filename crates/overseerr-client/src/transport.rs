//! Shared HTTP session for the Overseerr API.
//!
//! One [`HttpTransport`] is built at startup and handed to every client via
//! `Arc`. It owns the connection pool, the static credential header, the
//! request timeout and the retry policy for transient server errors.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Request, RequestBuilder, Response, StatusCode, Url};
use tracing::{debug, warn};

use crate::error::{OverseerrError, Result};

/// Default timeout applied to every request
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = concat!("overseerr-sync/", env!("CARGO_PKG_VERSION"));

/// Header carrying the static API key
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// When and how often a request is retried
///
/// Status-based retries only apply to idempotent methods; a connection that
/// could not be established is retried for any method, since nothing reached
/// the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of retries after the first attempt
    pub max_retries: u32,
    /// Retries allowed for connection failures (counted within `max_retries`)
    pub connect_retries: u32,
    /// Base delay, doubled on every retry
    pub backoff: Duration,
    /// Response statuses considered transient
    pub retry_statuses: Vec<StatusCode>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            connect_retries: 1,
            backoff: Duration::from_millis(500),
            retry_statuses: vec![
                StatusCode::INTERNAL_SERVER_ERROR,
                StatusCode::NOT_IMPLEMENTED,
                StatusCode::BAD_GATEWAY,
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::GATEWAY_TIMEOUT,
            ],
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            connect_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before the given retry (1-based)
    pub fn delay(&self, retry: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }

    fn retries_status(&self, method: &Method, status: StatusCode) -> bool {
        is_idempotent(method) && self.retry_statuses.contains(&status)
    }
}

fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS | Method::TRACE
    )
}

/// Builder for [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct TransportBuilder {
    base_url: String,
    api_key: String,
    timeout: Duration,
    user_agent: String,
    retry: RetryPolicy,
}

impl TransportBuilder {
    /// Per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Validate the settings and build the connection pool
    pub fn build(self) -> Result<HttpTransport> {
        let base_url = self.base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| OverseerrError::InvalidConfig(format!("base URL {:?}: {}", base_url, e)))?;

        let mut api_key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| OverseerrError::InvalidConfig("API key is not a valid header value".into()))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(self.user_agent)
            .timeout(self.timeout)
            .build()?;

        Ok(HttpTransport {
            client,
            base_url,
            retry: self.retry,
        })
    }
}

/// HTTP session shared by the search and request clients
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpTransport {
    /// Start configuring a transport for the service at `base_url`
    pub fn builder(base_url: impl Into<String>, api_key: impl Into<String>) -> TransportBuilder {
        TransportBuilder {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, retrying transient failures per the retry policy
    ///
    /// The final response is returned whatever its status; only network
    /// level failures become errors.
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let request = request.build()?;
        let mut retries = 0u32;
        let mut connect_retries = 0u32;

        loop {
            // Bodies that cannot be replayed get a single attempt
            let Some(attempt) = request.try_clone() else {
                return Ok(self.client.execute(request).await?);
            };

            match self.client.execute(attempt).await {
                Ok(response) => {
                    let status = response.status();
                    if retries < self.retry.max_retries
                        && self.retry.retries_status(request.method(), status)
                    {
                        retries += 1;
                        self.backoff(&request, retries, &status.to_string()).await;
                        continue;
                    }
                    return Ok(response);
                }
                Err(e)
                    if e.is_connect()
                        && retries < self.retry.max_retries
                        && connect_retries < self.retry.connect_retries =>
                {
                    retries += 1;
                    connect_retries += 1;
                    self.backoff(&request, retries, &e.to_string()).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn backoff(&self, request: &Request, retry: u32, reason: &str) {
        let delay = self.retry.delay(retry);
        warn!(
            "{} {} failed ({}), retry {}/{} in {:?}",
            request.method(),
            request.url().path(),
            reason,
            retry,
            self.retry.max_retries,
            delay
        );
        tokio::time::sleep(delay).await;
        debug!("Retrying {} {}", request.method(), request.url().path());
    }
}
