//! Resilient HTTP fetcher
//!
//! This module is the only place the crate talks to the network. It handles:
//! - Building the HTTP client with the configured user agent
//! - Resolving relative catalog links against the base origin
//! - Per-attempt timeouts on response arrival and on body progress
//! - Bounded retries of transient failures
//! - Suppressing exhausted failures into an absent outcome

use crate::config::FetcherConfig;
use crate::crawler::outcome::FetchOutcome;
use crate::url::resolve_url;
use crate::StashError;
use bytes::{Bytes, BytesMut};
use reqwest::{Client, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use url::Url;

/// Why a single attempt failed
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("HTTP status {0}")]
    Status(StatusCode),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl FetchError {
    /// Failures that another attempt cannot fix
    ///
    /// Client errors mean the resource is gone or never existed, except for
    /// 408 and 429 which are the server asking us to come back.
    pub fn is_permanent(&self) -> bool {
        match self {
            Self::InvalidUrl(_) => true,
            Self::Status(status) => {
                status.is_client_error()
                    && *status != StatusCode::REQUEST_TIMEOUT
                    && *status != StatusCode::TOO_MANY_REQUESTS
            }
            Self::Timeout(_) | Self::Transport(_) => false,
        }
    }
}

/// Timeout and retry ceiling applied to every URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// How long an attempt may wait for the response, and for each body chunk
    pub timeout: Duration,

    /// Total attempts per URL, including the first
    pub max_attempts: u32,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_attempts: 15,
        }
    }
}

impl From<&FetcherConfig> for FetchPolicy {
    fn from(config: &FetcherConfig) -> Self {
        Self {
            timeout: config.timeout(),
            max_attempts: config.max_attempts,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// No overall request timeout is set: downloads can be large, and stalls are
/// caught by the per-chunk timeout in [`ResilientFetcher`] instead.
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(config.timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher that retries transient failures and never propagates them
///
/// Cloning is cheap and clones share the request counter.
#[derive(Debug, Clone)]
pub struct ResilientFetcher {
    client: Client,
    base: Url,
    policy: FetchPolicy,
    requests: Arc<AtomicU64>,
}

impl ResilientFetcher {
    /// Creates a fetcher resolving relative links against `base`
    pub fn new(client: Client, base: Url, policy: FetchPolicy) -> Self {
        Self {
            client,
            base,
            policy: FetchPolicy {
                max_attempts: policy.max_attempts.max(1),
                ..policy
            },
            requests: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Creates a fetcher from the `[fetcher]` config section
    pub fn from_config(config: &FetcherConfig) -> Result<Self, StashError> {
        let client = build_http_client(config)?;
        let base = Url::parse(&config.base_url)?;
        Ok(Self::new(client, base, FetchPolicy::from(config)))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn policy(&self) -> FetchPolicy {
        self.policy
    }

    /// Number of HTTP requests issued so far, retries included
    pub fn requests_sent(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Resolves a possibly relative link against the base origin
    pub fn resolve(&self, href: &str) -> Result<Url, url::ParseError> {
        resolve_url(&self.base, href)
    }

    /// Fetches `href`, retrying transient failures
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Timeout, connection or body error | Retry up to `max_attempts` |
    /// | HTTP 5xx, 408, 429 | Retry up to `max_attempts` |
    /// | Other HTTP 4xx | Immediate → Absent |
    /// | Unparseable URL | Immediate → Absent |
    ///
    /// There is no backoff beyond the timeout itself. Every failure is
    /// logged with the URL and cause; once attempts are exhausted the error
    /// is swallowed and `Absent` is returned so the batch carries on.
    pub async fn fetch(&self, href: &str) -> FetchOutcome<Bytes> {
        let url = match self.resolve(href) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Failed to download {}: {}", href, e);
                return FetchOutcome::Absent;
            }
        };

        let max_attempts = self.policy.max_attempts;
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.attempt(&url).await {
                Ok(body) => {
                    if attempt > 1 {
                        tracing::debug!("Fetched {} after {} attempts", url, attempt);
                    }
                    return FetchOutcome::Found(body);
                }
                Err(e) if e.is_permanent() => {
                    tracing::error!("Failed to download {}: {}", url, e);
                    return FetchOutcome::Absent;
                }
                Err(e) => {
                    if attempt >= max_attempts {
                        tracing::error!(
                            "Failed to download {} after {} attempts: {}",
                            url,
                            attempt,
                            e
                        );
                        return FetchOutcome::Absent;
                    }
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        max_attempts,
                        url,
                        e
                    );
                }
            }
        }
    }

    /// One GET with the response and every body chunk bounded by the timeout
    async fn attempt(&self, url: &Url) -> Result<Bytes, FetchError> {
        let limit = self.policy.timeout;
        self.requests.fetch_add(1, Ordering::Relaxed);

        let mut response = timeout(limit, self.client.get(url.clone()).send())
            .await
            .map_err(|_| FetchError::Timeout(limit))??;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = timeout(limit, response.chunk())
            .await
            .map_err(|_| FetchError::Timeout(limit))??
        {
            body.extend_from_slice(&chunk);
        }

        Ok(body.freeze())
    }
}
