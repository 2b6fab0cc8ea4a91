use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use papercast_core::{ExtractError, PdfBackend};

/// Default number of parses allowed on the blocking pool at once.
pub const DEFAULT_MAX_CONCURRENT_PARSES: usize = 4;

/// Runs a blocking [`PdfBackend`] under its own timeout.
///
/// The parse happens on tokio's blocking pool so the calling task suspends
/// instead of tying up a worker. The parse timeout is independent of the
/// fetch timeout. A parse that times out is abandoned, not interrupted: the
/// backend call runs to completion on its blocking thread and its result is
/// dropped.
///
/// Each backend call holds a permit until it returns, so at most
/// `max_concurrent` parses (abandoned ones included) occupy blocking threads.
/// Waiting for a permit counts against the parse timeout. Clones share the
/// same permits.
#[derive(Clone)]
pub struct PdfTextExtractor {
    backend: Arc<dyn PdfBackend>,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl PdfTextExtractor {
    pub fn new(backend: Arc<dyn PdfBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            permits: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT_PARSES)),
        }
    }

    /// Limit concurrent backend calls to `n` (at least one).
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(n.max(1)));
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Extract text, or `None` on timeout or parse failure.
    pub async fn extract(&self, bytes: Arc<[u8]>) -> Option<String> {
        match self.try_extract(bytes).await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(error = %e, "PDF text extraction failed");
                None
            }
        }
    }

    /// Like [`extract`](Self::extract) but keeps the reason for failure.
    pub async fn try_extract(&self, bytes: Arc<[u8]>) -> Result<String, ExtractError> {
        let backend = Arc::clone(&self.backend);
        let permits = Arc::clone(&self.permits);
        let parse = async move {
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|e| ExtractError::Parse(format!("PDF parser unavailable: {}", e)))?;
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                backend.extract_text(&bytes)
            })
            .await
            .map_err(|join_err| {
                ExtractError::Parse(format!("PDF parser task failed: {}", join_err))
            })?
            .map_err(ExtractError::from)
        };

        match tokio::time::timeout(self.timeout, parse).await {
            Ok(result) => result,
            Err(_) => Err(ExtractError::Timeout(self.timeout)),
        }
    }
}
