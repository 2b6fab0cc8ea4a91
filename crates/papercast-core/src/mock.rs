//! Hand-rolled test doubles for [`Fetcher`] and [`PdfBackend`].
//!
//! Used by the pipeline's integration tests so that no test touches the
//! network or needs a real PDF.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::backend::{BackendError, PdfBackend};
use crate::fetch::Fetcher;
use crate::ExtractError;

/// A scripted response for [`MockFetcher`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Respond with these bytes.
    Body(Vec<u8>),
    /// Fail with this error.
    Fail(ExtractError),
    /// Never respond; the caller's timeout has to fire.
    Hang,
}

impl MockResponse {
    pub fn text(body: impl Into<String>) -> Self {
        MockResponse::Body(body.into().into_bytes())
    }
}

/// URL-keyed mock fetcher.
///
/// URLs without a scripted response fail with a network error. Every call is
/// recorded so tests can assert on the order of attempted URLs.
pub struct MockFetcher {
    responses: HashMap<String, MockResponse>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Script the response for `url`.
    pub fn respond(mut self, url: impl Into<String>, response: MockResponse) -> Self {
        self.responses.insert(url.into(), response);
        self
    }

    /// Set simulated network latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URLs requested so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Fetcher for MockFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, ExtractError>> + Send + 'a>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.to_string());
        }
        let response = self.responses.get(url).cloned();
        let delay = self.delay;

        Box::pin(async move {
            let exchange = async move {
                if let Some(d) = delay {
                    tokio::time::sleep(d).await;
                }
                match response {
                    Some(MockResponse::Body(bytes)) => Ok(bytes),
                    Some(MockResponse::Fail(err)) => Err(err),
                    Some(MockResponse::Hang) => std::future::pending().await,
                    None => Err(ExtractError::Network(format!("connection refused: {}", url))),
                }
            };
            match tokio::time::timeout(timeout, exchange).await {
                Ok(result) => result,
                Err(_) => Err(ExtractError::Timeout(timeout)),
            }
        })
    }
}

/// Behavior of [`MockPdfBackend`].
#[derive(Clone, Debug)]
pub enum MockPdf {
    /// Return this text.
    Text(String),
    /// Fail as a malformed document would.
    Malformed(String),
    /// Block the calling thread for this long, then return the text.
    Stall(Duration, String),
}

/// Mock PDF backend with a fixed behavior and a call counter.
pub struct MockPdfBackend {
    behavior: MockPdf,
    call_count: AtomicUsize,
}

impl MockPdfBackend {
    pub fn new(behavior: MockPdf) -> Self {
        Self {
            behavior,
            call_count: AtomicUsize::new(0),
        }
    }

    /// How many times `extract_text()` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl PdfBackend for MockPdfBackend {
    fn extract_text(&self, _bytes: &[u8]) -> Result<String, BackendError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            MockPdf::Text(text) => Ok(text.clone()),
            MockPdf::Malformed(msg) => Err(BackendError::OpenError(msg.clone())),
            MockPdf::Stall(d, text) => {
                std::thread::sleep(*d);
                Ok(text.clone())
            }
        }
    }
}
