use anyhow::{Error, anyhow};
use reqwest::Response;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

pub const USER_AGENT: &str = "assetpulse/0.1";

/// How often a transport failure is retried before a feed gives up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub retries: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            delay: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            retries: 0,
            delay: Duration::ZERO,
        }
    }
}

/// Retries an async request while it fails at the transport level.
///
/// HTTP error statuses are not retried; they come back as a `Response` and are
/// the caller's to inspect.
pub async fn with_retry<F, Fut, T>(mut operation: F, policy: RetryPolicy) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, reqwest::Error>>,
{
    let mut attempt = 1;
    loop {
        match operation().await.map_err(anyhow::Error::from) {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > policy.retries {
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt,
                    policy.retries + 1,
                    err
                );
                attempt += 1;
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}

pub fn http_client() -> Result<reqwest::Client, Error> {
    Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
}

/// GETs `url` and returns the body of a successful response.
pub async fn get_text(url: &str, policy: RetryPolicy, what: &str) -> Result<String, Error> {
    let client = http_client()?;
    let response: Response = with_retry(|| async { client.get(url).send().await }, policy)
        .await
        .map_err(|e| anyhow!("Request error: {} for {} URL: {}", e, what, url))?;

    if !response.status().is_success() {
        return Err(anyhow!("HTTP error: {} for {}", response.status(), what));
    }
    Ok(response.text().await?)
}
