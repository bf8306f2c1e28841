//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with a browser-like user agent string
//! - GET requests with a fixed-delay retry loop
//! - Error classification for logging and reporting
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 200 | Success |
//! | Any other status | Retry after delay |
//! | Timeout | Retry after delay |
//! | Connection refused / DNS / TLS | Retry after delay |
//! | Attempts exhausted | `FetchResult::Exhausted` |
//!
//! Transient and permanent failures are treated alike: a 404 is retried
//! exactly like a timeout.

use crate::config::FetchConfig;
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Maximum redirect hops followed by the client
const MAX_REDIRECTS: usize = 10;

/// Upper bound for the TCP connect phase
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed-delay retry policy applied to every page and document request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Pause between two consecutive attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(config.max_attempts, config.retry_delay())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// Why a single attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Server answered with a status other than 200
    Status(u16),
    /// Request timed out
    Timeout,
    /// Connection could not be established (refused, DNS, TLS)
    Connect(String),
    /// Any other transport error
    Transport(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Timeout => write!(f, "request timeout"),
            Self::Connect(e) => write!(f, "connection failed: {}", e),
            Self::Transport(e) => write!(f, "{}", e),
        }
    }
}

/// Result of a fetch operation
///
/// `T` is what a successful attempt yields: the raw `Response` for streamed
/// downloads, or a fully read `FetchedPage` for pages.
#[derive(Debug)]
pub enum FetchResult<T = Response> {
    /// An attempt got a 200 response
    Success {
        content: T,
        /// Attempt number that succeeded (1-based)
        attempts: u32,
    },

    /// Every attempt failed
    Exhausted {
        attempts: u32,
        /// Failure of the final attempt
        last_failure: FetchFailure,
    },
}

/// A page whose body was read completely within one attempt
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects
    pub final_url: Url,
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use ton_harvest::config::FetchConfig;
/// use ton_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let timeout = config.timeout();

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(timeout.min(CONNECT_TIMEOUT))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL, retrying every failure until the policy runs out
///
/// Only the status line is read; the body is left to the caller.
pub async fn fetch_with_retry(client: &Client, url: &Url, policy: &RetryPolicy) -> FetchResult {
    retry(url, policy, || fetch_once(client, url)).await
}

/// Fetches a page and reads its body as text, retrying every failure
///
/// A body that breaks off or times out mid-transfer fails the attempt like a
/// bad status would.
pub async fn fetch_page_with_retry(
    client: &Client,
    url: &Url,
    policy: &RetryPolicy,
) -> FetchResult<FetchedPage> {
    retry(url, policy, move || async move {
        let response = fetch_once(client, url).await?;
        let final_url = response.url().clone();
        let body = response.text().await.map_err(classify_error)?;
        Ok(FetchedPage { final_url, body })
    })
    .await
}

/// Runs `attempt` until it succeeds or the policy runs out
///
/// Sleeps `policy.delay` between attempts, never after the last one.
async fn retry<T, F, Fut>(url: &Url, policy: &RetryPolicy, mut attempt_fn: F) -> FetchResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchFailure>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match attempt_fn().await {
            Ok(content) => {
                tracing::debug!("Fetched {} on attempt {}", url, attempt);
                return FetchResult::Success {
                    content,
                    attempts: attempt,
                };
            }
            Err(failure) => {
                tracing::warn!(
                    "Attempt {}/{} for {} failed: {}",
                    attempt,
                    max_attempts,
                    url,
                    failure
                );

                if attempt >= max_attempts {
                    return FetchResult::Exhausted {
                        attempts: attempt,
                        last_failure: failure,
                    };
                }
            }
        }

        if !policy.delay.is_zero() {
            tokio::time::sleep(policy.delay).await;
        }
        attempt += 1;
    }
}

/// Sends one GET request and maps anything but a 200 to a failure
async fn fetch_once(client: &Client, url: &Url) -> Result<Response, FetchFailure> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(classify_error)?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchFailure::Status(status.as_u16()));
    }

    Ok(response)
}

/// Classifies a transport error
fn classify_error(e: reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::Timeout
    } else if e.is_connect() {
        FetchFailure::Connect(e.to_string())
    } else {
        FetchFailure::Transport(e.to_string())
    }
}
