//! Rate-limited HTTP transport with status-driven retries.
//!
//! Every dispatch, retries included, passes through the shared [`RateGate`].
//! 429 responses wait for `Retry-After` and never consume the retry budget;
//! 5xx and network failures back off exponentially until the budget is
//! spent; other statuses fail immediately.

use std::time::Duration;

use anyhow::Context;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::gate::RateGate;
use super::retry::{classify_status, RetryPolicy, StatusClass};
use crate::config::HttpConfig;

/// Terminal transport failure.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// 5xx or network failure that survived every retry.
    #[error("{url}: gave up after {attempts} attempts: {message}")]
    Transient {
        url: String,
        status: Option<u16>,
        attempts: u32,
        message: String,
    },

    /// A status that is never retried.
    #[error("{url}: HTTP {status}")]
    Permanent { url: String, status: u16 },

    /// The body was not the expected JSON.
    #[error("{url}: invalid response body: {message}")]
    Decode { url: String, message: String },

    /// The request could not be built (bad URL, bad header).
    #[error("invalid request: {0}")]
    Build(String),
}

impl TransportError {
    /// The HTTP status that ended the request, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transient { status, .. } => *status,
            Self::Permanent { status, .. } => Some(*status),
            Self::Decode { .. } | Self::Build(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Permanent { status: 404 | 410, .. })
    }
}

/// A request description that can be dispatched repeatedly.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub json: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            json: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }
}

enum Fetched {
    Response(Response),
    Body(Vec<u8>),
}

/// Shared outbound client.
///
/// Build one per process and share it behind an `Arc`; the rate gate and the
/// connection pool are per instance.
pub struct Transport {
    client: Client,
    gate: RateGate,
    policy: RetryPolicy,
    name: String,
}

impl Transport {
    pub fn new(
        name: impl Into<String>,
        client: Client,
        policy: RetryPolicy,
        interval: Duration,
    ) -> Self {
        Self {
            client,
            gate: RateGate::new(interval),
            policy,
            name: name.into(),
        }
    }

    /// Build a transport with a fresh pooled client from `[http]` settings.
    pub fn from_config(name: impl Into<String>, config: &HttpConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::new(
            name,
            client,
            RetryPolicy::from_config(config),
            Duration::from_millis(config.rate_limit_interval_ms),
        ))
    }

    /// Issue `method url` with optional query parameters.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        params: Option<&[(&str, &str)]>,
    ) -> Result<Response, TransportError> {
        let mut request = HttpRequest::new(method, url);
        for (key, value) in params.unwrap_or_default() {
            request = request.query(*key, *value);
        }
        self.execute(&request).await
    }

    /// Dispatch `request`, applying the rate gate and retry policy.
    pub async fn execute(&self, request: &HttpRequest) -> Result<Response, TransportError> {
        match self.dispatch(request, false).await? {
            Fetched::Response(response) => Ok(response),
            Fetched::Body(_) => Err(TransportError::Build(
                "body read without being requested".into(),
            )),
        }
    }

    /// Dispatch `request` and decode the JSON body.
    ///
    /// The body is read inside the retry loop, so a connection dropped or
    /// timed out mid-body is retried like any other network failure.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        request: &HttpRequest,
    ) -> Result<T, TransportError> {
        let body = match self.dispatch(request, true).await? {
            Fetched::Body(body) => body,
            Fetched::Response(response) => response
                .bytes()
                .await
                .map_err(|e| TransportError::Decode {
                    url: request.url.clone(),
                    message: e.to_string(),
                })?
                .to_vec(),
        };
        serde_json::from_slice(&body).map_err(|e| TransportError::Decode {
            url: request.url.clone(),
            message: e.to_string(),
        })
    }

    async fn dispatch(
        &self,
        request: &HttpRequest,
        read_body: bool,
    ) -> Result<Fetched, TransportError> {
        let mut failures: u32 = 0;

        loop {
            self.gate.wait().await;
            debug!(
                client = %self.name,
                method = %request.method,
                url = %request.url,
                attempt = failures + 1,
                "Dispatching request"
            );

            let (status, message) = match self.build(request).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    match classify_status(status) {
                        StatusClass::Success if !read_body => {
                            return Ok(Fetched::Response(response))
                        }
                        StatusClass::Success => match response.bytes().await {
                            Ok(body) => return Ok(Fetched::Body(body.to_vec())),
                            Err(err) => (None, format!("reading body failed: {err}")),
                        },
                        StatusClass::RateLimited => {
                            let header = response
                                .headers()
                                .get(RETRY_AFTER)
                                .and_then(|v| v.to_str().ok());
                            let wait = self.policy.retry_after_delay(header);
                            warn!(
                                client = %self.name,
                                url = %request.url,
                                wait_ms = wait.as_millis() as u64,
                                "Rate limited, waiting before retry"
                            );
                            tokio::time::sleep(wait).await;
                            continue;
                        }
                        StatusClass::Permanent => {
                            debug!(client = %self.name, url = %request.url, status, "Permanent failure");
                            return Err(TransportError::Permanent {
                                url: request.url.clone(),
                                status,
                            });
                        }
                        StatusClass::Transient => (Some(status), format!("HTTP {status}")),
                    }
                }
                Err(err) if err.is_builder() => {
                    return Err(TransportError::Build(err.to_string()));
                }
                Err(err) => (None, err.to_string()),
            };

            failures += 1;
            if failures >= self.policy.max_retries {
                warn!(
                    client = %self.name,
                    url = %request.url,
                    attempts = failures,
                    error = %message,
                    "Retries exhausted"
                );
                return Err(TransportError::Transient {
                    url: request.url.clone(),
                    status,
                    attempts: failures,
                    message,
                });
            }

            let delay = self.policy.backoff_delay(failures - 1);
            warn!(
                client = %self.name,
                url = %request.url,
                attempt = failures,
                delay_ms = delay.as_millis() as u64,
                error = %message,
                "Transient failure, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn build(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .query(&request.query);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &request.json {
            builder = builder.json(body);
        }
        builder
    }
}
