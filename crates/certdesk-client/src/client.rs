//! Main certdesk API client implementation.

use crate::api::{CertificatesApi, HistoryApi, UsersApi};
use crate::config::RetryConfig;
use certdesk_core::{CertdeskError, ErrorBody, Result, CALLER_HEADER};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as HttpClient, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default server address
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Main certdesk API client
#[derive(Clone)]
pub struct CertdeskClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: HttpClient,
    base_url: Url,
    timeout: Duration,
    retry_config: RetryConfig,
}

impl std::fmt::Debug for CertdeskClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertdeskClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl CertdeskClient {
    /// Create a client for the server at `base_url` with default settings
    ///
    /// # Errors
    ///
    /// Returns `CertdeskError::Config` if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        CertdeskClientBuilder::new().base_url(base_url).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder() -> CertdeskClientBuilder {
        CertdeskClientBuilder::new()
    }

    /// Server address
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Access certificate endpoints
    #[must_use]
    pub fn certificates(&self) -> CertificatesApi<'_> {
        CertificatesApi::new(self)
    }

    /// Access audit history endpoints
    #[must_use]
    pub fn history(&self) -> HistoryApi<'_> {
        HistoryApi::new(self)
    }

    /// Access account endpoints
    #[must_use]
    pub fn users(&self) -> UsersApi<'_> {
        UsersApi::new(self)
    }

    /// Perform a GET request, retrying transient failures
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let retry = &self.inner.retry_config;
        let mut attempt = 0;
        loop {
            match self.request::<T, ()>(Method::GET, path, None).await {
                Err(e) if e.is_retryable() && attempt < retry.max_retries => {
                    let backoff = retry.backoff_for(attempt);
                    warn!(path, attempt, error = %e, backoff = ?backoff, "retrying request");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Perform a POST request with JSON body
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Headers naming the calling user, empty if there is none
    pub(crate) fn caller_headers(caller: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = caller.and_then(|c| HeaderValue::from_str(c).ok()) {
            headers.insert(CALLER_HEADER, value);
        }
        headers
    }

    /// Perform a JSON request carrying extra headers
    pub(crate) async fn request_with_headers<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        headers: HeaderMap,
    ) -> Result<T> {
        let url = self.build_url(path)?;
        debug!(method = %method, url = %url, "request");
        let builder = self.inner.http.request(method, url).headers(headers).json(body);
        let response = self.send(builder).await?;
        self.handle_response(response).await
    }

    async fn request<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let url = self.build_url(path)?;
        debug!(method = %method, url = %url, "request");

        let mut builder = self.inner.http.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = self.send(builder).await?;
        self.handle_response(response).await
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response> {
        builder
            .send()
            .await
            .map_err(|e| map_transport_error(&e, self.inner.timeout))
    }

    fn build_url(&self, path: &str) -> Result<Url> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| CertdeskError::Config(format!("invalid request path {path}: {e}")))
    }

    /// Handle an API response that returns JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| map_transport_error(&e, self.inner.timeout))?;
            serde_json::from_str(&body).map_err(CertdeskError::Json)
        } else {
            self.handle_error(status.as_u16(), response).await
        }
    }

    /// Convert an error response to a `CertdeskError`
    async fn handle_error<T>(&self, status: u16, response: reqwest::Response) -> Result<T> {
        let body = response.text().await.unwrap_or_default();
        Err(error_from_response(status, &body))
    }
}

/// Map a non-2xx status and its body to the error taxonomy
pub(crate) fn error_from_response(status: u16, body: &str) -> CertdeskError {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();
    let message = parsed
        .as_ref()
        .map_or_else(|| body.to_string(), |b| b.error.clone());

    match status {
        400 => CertdeskError::Validation(message),
        401 => CertdeskError::InvalidCredentials,
        403 => CertdeskError::Forbidden(message),
        404 => CertdeskError::NotFound { resource: message },
        409 => CertdeskError::Conflict(message),
        500 => match parsed {
            Some(ErrorBody {
                action,
                status: exit,
                output: Some(output),
                ..
            }) => CertdeskError::ExternalAction {
                action: action.unwrap_or_else(|| "unknown".to_string()),
                status: exit,
                output,
            },
            _ => CertdeskError::Api {
                code: status,
                message,
            },
        },
        _ => {
            if (502..=504).contains(&status) {
                warn!(status, "server unavailable behind gateway");
            }
            CertdeskError::Api {
                code: status,
                message,
            }
        }
    }
}

fn map_transport_error(e: &reqwest::Error, timeout: Duration) -> CertdeskError {
    if e.is_timeout() {
        CertdeskError::Timeout(timeout.as_secs())
    } else if e.is_connect() {
        CertdeskError::Connection(e.to_string())
    } else {
        CertdeskError::Http(e.to_string())
    }
}

/// Builder for configuring a [`CertdeskClient`]
#[derive(Debug, Clone)]
pub struct CertdeskClientBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: String,
    retry_config: RetryConfig,
}

impl Default for CertdeskClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CertdeskClientBuilder {
    /// Create a new builder pointing at [`DEFAULT_BASE_URL`]
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("certdesk/{}", env!("CARGO_PKG_VERSION")),
            retry_config: RetryConfig::default(),
        }
    }

    /// Set the server address
    #[must_use]
    pub fn base_url(mut self, url: impl AsRef<str>) -> Self {
        self.base_url = url.as_ref().to_string();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Set retry configuration
    #[must_use]
    pub const fn retry(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns `CertdeskError::Config` if the base URL is invalid or the HTTP
    /// client cannot be constructed.
    pub fn build(self) -> Result<CertdeskClient> {
        let mut base = self.base_url;
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| CertdeskError::Config(format!("invalid server URL {base}: {e}")))?;

        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .gzip(true)
            .build()
            .map_err(|e| CertdeskError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(CertdeskClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                timeout: self.timeout,
                retry_config: self.retry_config,
            }),
        })
    }
}
