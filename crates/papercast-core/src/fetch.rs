//! Single-attempt document fetching under a hard deadline.
//!
//! The deadline covers the whole exchange (connect, headers and body) and is
//! enforced with `tokio::time::timeout`, so an expired fetch drops the
//! in-flight request instead of leaving it running. There is no retry here;
//! the orchestrator's fallback chain is the only recovery mechanism.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use crate::{Config, ExtractError};

/// Retrieves raw bytes from a URL.
pub trait Fetcher: Send + Sync {
    /// Fetch `url`, failing with [`ExtractError::Timeout`] if the full response
    /// has not arrived within `timeout`.
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, ExtractError>> + Send + 'a>>;
}

/// [`Fetcher`] backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client from the pipeline config (user agent, redirect limit).
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, ExtractError>> + Send + 'a>> {
        Box::pin(async move {
            check_scheme(url)?;

            let start = Instant::now();
            let exchange = async {
                let resp = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| ExtractError::Network(e.to_string()))?;

                check_status(&resp)?;

                let body = resp
                    .bytes()
                    .await
                    .map_err(|e| ExtractError::Network(e.to_string()))?;
                Ok::<_, ExtractError>(body.to_vec())
            };

            match tokio::time::timeout(timeout, exchange).await {
                Ok(Ok(bytes)) => {
                    tracing::debug!(
                        url,
                        bytes = bytes.len(),
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "fetch complete"
                    );
                    Ok(bytes)
                }
                Ok(Err(err)) => Err(err),
                Err(_) => Err(ExtractError::Timeout(timeout)),
            }
        })
    }
}

/// Only `http` and `https` URLs have a transport.
pub fn check_scheme(url: &str) -> Result<(), ExtractError> {
    let scheme = url
        .split_once("://")
        .map(|(s, _)| s.to_ascii_lowercase())
        .unwrap_or_default();
    match scheme.as_str() {
        "http" | "https" => Ok(()),
        "" => Err(ExtractError::Network(format!("not an absolute URL: {}", url))),
        other => Err(ExtractError::Network(format!(
            "unsupported URL scheme: {}",
            other
        ))),
    }
}

/// Non-2xx responses count as network failures.
pub fn check_status(resp: &reqwest::Response) -> Result<(), ExtractError> {
    if resp.status().is_success() {
        Ok(())
    } else {
        Err(ExtractError::Network(format!("HTTP {}", resp.status())))
    }
}
