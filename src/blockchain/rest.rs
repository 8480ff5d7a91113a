//! JSON-over-HTTP client with endpoint failover and timeouts.
//!
//! Both chain clients sit on top of this. Every request walks the
//! configured endpoints in order (primary first, then failovers) and each
//! attempt is bounded by the configured RPC timeout.
//!
//! Status mapping:
//! - 2xx → decoded body
//! - 404 → [`ChainError::NotFound`] (no failover)
//! - other 4xx → [`ChainError::Rejected`] (no failover)
//! - 5xx, connect errors, timeouts → next endpoint, then [`ChainError::Transport`]
//!   or [`ChainError::Timeout`]

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{ChainError, ChainResult};

/// HTTP client bound to a list of base URLs.
#[derive(Clone)]
pub struct RestClient {
    /// Base URLs without trailing slash (primary + failovers).
    endpoints: Vec<String>,
    http: Client,
    timeout_secs: u64,
}

impl RestClient {
    /// Build a client for the given endpoints.
    ///
    /// Invalid failover URLs are skipped with a warning; an invalid primary
    /// URL is an error.
    pub fn new(primary: &str, failovers: &[String], timeout_secs: u64) -> ChainResult<Self> {
        let mut endpoints = Vec::with_capacity(1 + failovers.len());

        let primary_url: url::Url = primary.parse().map_err(|e| {
            ChainError::Transport(format!("Invalid RPC URL '{}': {}", primary, e))
        })?;
        endpoints.push(primary_url.as_str().trim_end_matches('/').to_string());

        for url_str in failovers {
            match url_str.parse::<url::Url>() {
                Ok(url) => endpoints.push(url.as_str().trim_end_matches('/').to_string()),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ChainError::Transport(format!("HTTP client construction failed: {}", e)))?;

        Ok(Self {
            endpoints,
            http,
            timeout_secs,
        })
    }

    /// The primary endpoint.
    pub fn primary_endpoint(&self) -> &str {
        &self.endpoints[0]
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// GET `{base}/{path}` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ChainResult<T> {
        self.execute(path, |url| self.http.get(url)).await
    }

    /// POST a JSON body to `{base}/{path}` and decode the JSON response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ChainResult<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(path, |url| self.http.post(url).json(body)).await
    }

    async fn execute<T, F>(&self, path: &str, build: F) -> ChainResult<T>
    where
        T: DeserializeOwned,
        F: Fn(String) -> RequestBuilder,
    {
        let path = path.trim_start_matches('/');
        let mut last_err = ChainError::Transport("no endpoints configured".to_string());

        for (i, base) in self.endpoints.iter().enumerate() {
            let url = format!("{}/{}", base, path);
            let attempt = async {
                let response = build(url).send().await?;
                let status = response.status();
                let body = response.text().await?;
                Ok::<_, reqwest::Error>((status, body))
            };

            match timeout(Duration::from_secs(self.timeout_secs), attempt).await {
                Ok(Ok((status, body))) if status.is_success() => {
                    return serde_json::from_str(&body).map_err(|e| {
                        ChainError::InvalidResponse(format!("{} (path: {})", e, path))
                    });
                }
                Ok(Ok((status, body))) if status == StatusCode::NOT_FOUND => {
                    return Err(ChainError::NotFound(error_message(&body, path)));
                }
                Ok(Ok((status, body))) if status.is_client_error() => {
                    return Err(ChainError::Rejected(error_message(&body, path)));
                }
                Ok(Ok((status, body))) => {
                    tracing::warn!(endpoint_idx = i, %status, "Server error, trying next endpoint");
                    last_err = ChainError::Transport(format!(
                        "HTTP {}: {}",
                        status,
                        error_message(&body, path)
                    ));
                }
                Ok(Err(e)) if e.is_timeout() => {
                    tracing::warn!(endpoint_idx = i, "RPC timeout, trying next endpoint");
                    last_err = ChainError::Timeout(self.timeout_secs);
                }
                Ok(Err(e)) => {
                    tracing::warn!(endpoint_idx = i, error = %e, "RPC error, trying next endpoint");
                    last_err = ChainError::Transport(e.to_string());
                }
                Err(_) => {
                    tracing::warn!(endpoint_idx = i, "RPC timeout, trying next endpoint");
                    last_err = ChainError::Timeout(self.timeout_secs);
                }
            }
        }

        Err(last_err)
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("endpoints", &self.endpoints)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Error payloads differ per chain; pick whichever field is present.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    detail: Option<String>,
    title: Option<String>,
    error_code: Option<String>,
}

fn error_message(body: &str, path: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => {
            let text = parsed
                .message
                .or(parsed.detail)
                .or(parsed.title)
                .unwrap_or_else(|| path.to_string());
            match parsed.error_code {
                Some(code) => format!("{} ({})", text, code),
                None => text,
            }
        }
        Err(_) if body.trim().is_empty() => path.to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

impl NumberOrString {
    fn into_u64<E: de::Error>(self) -> Result<u64, E> {
        match self {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::String(s) => s.trim().parse().map_err(E::custom),
        }
    }
}

/// Chain REST APIs encode 64-bit integers as strings; accept both.
pub fn u64_from_str_or_num<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    NumberOrString::deserialize(deserializer)?.into_u64()
}

/// Optional variant of [`u64_from_str_or_num`].
pub fn opt_u64_from_str_or_num<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u64>, D::Error> {
    Option::<NumberOrString>::deserialize(deserializer)?
        .map(NumberOrString::into_u64)
        .transpose()
}
