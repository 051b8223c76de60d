//! Upstream HTTP access shared by every source adapter.
//!
//! All calls go through [`ApiClient`], which owns the rate-limit policy:
//! a 403/429 response triggers one fixed pause and one retry, never more.
//! The transport itself sits behind [`HttpFetch`] so adapters can be exercised
//! offline with canned responses.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

pub const GITHUB_API_BASE: &str = "https://api.github.com";
pub const GITHUB_WEB_BASE: &str = "https://github.com";
pub const HUGGINGFACE_API_BASE: &str = "https://huggingface.co/api";
pub const HUGGINGFACE_WEB_BASE: &str = "https://huggingface.co";

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("founder-scout/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum CallError {
    #[error("rate limited by {url}")]
    RateLimited { url: String },
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("unexpected response shape from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// Code-hosting bearer token.
    Github,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    GithubJson,
    Json,
    Html,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub auth: Auth,
    pub accept: Accept,
}

impl FetchRequest {
    pub fn github(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            auth: Auth::Github,
            accept: Accept::GithubJson,
        }
    }

    pub fn public_json(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            auth: Auth::None,
            accept: Accept::Json,
        }
    }

    pub fn html(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            auth: Auth::None,
            accept: Accept::Html,
        }
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// `url?k=v&...` in insertion order, unencoded. Used for logging and test lookups.
    pub fn describe(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.url, query)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 403 || self.status == 429
    }
}

#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, CallError>;
}

/// reqwest-backed transport.
pub struct ReqwestFetch {
    client: reqwest::Client,
    github_token: Option<String>,
}

impl ReqwestFetch {
    pub fn new(github_token: Option<String>, timeout: Option<Duration>) -> Result<Self, CallError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT).gzip(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|err| CallError::Transport {
            url: String::new(),
            message: err.to_string(),
        })?;

        Ok(Self {
            client,
            github_token,
        })
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, CallError> {
        let transport = |err: reqwest::Error| CallError::Transport {
            url: request.url.clone(),
            message: err.to_string(),
        };

        let mut builder = self.client.get(&request.url).query(&request.query);
        builder = match request.accept {
            Accept::GithubJson => builder.header(reqwest::header::ACCEPT, GITHUB_ACCEPT),
            Accept::Json => builder.header(reqwest::header::ACCEPT, "application/json"),
            // the trending page serves a reduced document to unknown agents
            Accept::Html => builder.header(reqwest::header::USER_AGENT, "Mozilla/5.0"),
        };
        if let (Auth::Github, Some(token)) = (request.auth, self.github_token.as_deref()) {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport)?;
        Ok(FetchResponse { status, body })
    }
}

/// Retry and pacing policy.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub rate_limit_pause: Duration,
    /// Multiplier for adapter politeness delays; zero disables pacing.
    pub pacing_scale: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rate_limit_pause: Duration::from_secs(60),
            pacing_scale: 1.0,
        }
    }
}

impl ClientConfig {
    /// No pauses at all; used by tests.
    pub fn immediate() -> Self {
        Self {
            rate_limit_pause: Duration::ZERO,
            pacing_scale: 0.0,
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    fetch: Arc<dyn HttpFetch>,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(fetch: Arc<dyn HttpFetch>, config: ClientConfig) -> Self {
        Self { fetch, config }
    }

    /// Sends the request; a rate-limited response gets exactly one delayed retry.
    pub async fn send(&self, request: &FetchRequest) -> Result<FetchResponse, CallError> {
        const MAX_ATTEMPTS: u32 = 2;

        let mut attempt = 1;
        loop {
            let response = self.fetch.fetch(request).await?;

            if response.is_success() {
                return Ok(response);
            }

            if !response.is_rate_limited() {
                return Err(CallError::Status {
                    url: request.url.clone(),
                    status: response.status,
                });
            }

            if attempt >= MAX_ATTEMPTS {
                return Err(CallError::RateLimited {
                    url: request.url.clone(),
                });
            }

            warn!(
                url = %request.describe(),
                pause_secs = self.config.rate_limit_pause.as_secs(),
                "rate limited; pausing before single retry"
            );
            sleep(self.config.rate_limit_pause).await;
            attempt += 1;
        }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        request: &FetchRequest,
    ) -> Result<T, CallError> {
        let response = self.send(request).await?;
        serde_json::from_str(&response.body).map_err(|source| CallError::Decode {
            url: request.url.clone(),
            source,
        })
    }

    pub async fn get_text(&self, request: &FetchRequest) -> Result<String, CallError> {
        Ok(self.send(request).await?.body)
    }

    /// Politeness delay between upstream calls.
    pub async fn pace(&self, seconds: f64) {
        let scaled = seconds * self.config.pacing_scale;
        if scaled > 0.0 {
            debug!(seconds = scaled, "pacing");
            sleep(Duration::from_secs_f64(scaled)).await;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::stub::{client, StubFetch};
    use super::*;
    use serde_json::json;

    const USER_URL: &str = "https://api.github.com/users/octo";

    #[test]
    fn describe_keeps_query_order() {
        let request = FetchRequest::github("https://api.github.com/search/users")
            .param("q", "location:india")
            .param("per_page", 15);
        assert_eq!(
            request.describe(),
            "https://api.github.com/search/users?q=location:india&per_page=15"
        );
        assert_eq!(request.auth, Auth::Github);
    }

    #[tokio::test]
    async fn rate_limit_is_retried_once() {
        let stub = StubFetch::new()
            .with(USER_URL, FetchResponse::status(403))
            .json(USER_URL, json!({"login": "octo"}));
        let (client, stub) = client(stub);

        let value: serde_json::Value = client
            .get_json(&FetchRequest::github(USER_URL))
            .await
            .unwrap();

        assert_eq!(value["login"], "octo");
        assert_eq!(stub.calls().len(), 2);
    }

    #[tokio::test]
    async fn second_rate_limit_gives_up() {
        let stub = StubFetch::new()
            .with(USER_URL, FetchResponse::status(429))
            .with(USER_URL, FetchResponse::status(403));
        let (client, stub) = client(stub);

        let err = client.send(&FetchRequest::github(USER_URL)).await.unwrap_err();

        assert!(matches!(err, CallError::RateLimited { .. }));
        assert_eq!(stub.calls().len(), 2);
    }

    #[tokio::test]
    async fn other_failures_are_not_retried() {
        let stub = StubFetch::new().with(USER_URL, FetchResponse::status(500));
        let (client, stub) = client(stub);

        let err = client.send(&FetchRequest::github(USER_URL)).await.unwrap_err();

        assert!(matches!(err, CallError::Status { status: 500, .. }));
        assert_eq!(stub.calls().len(), 1);
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let stub = StubFetch::new().with(USER_URL, FetchResponse::ok("<html>"));
        let (client, _) = client(stub);

        let err = client
            .get_json::<serde_json::Value>(&FetchRequest::github(USER_URL))
            .await
            .unwrap_err();

        assert!(matches!(err, CallError::Decode { .. }));
    }
}
