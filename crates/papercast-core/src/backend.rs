use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for PDF text extraction backends.
///
/// Implementors turn an in-memory PDF into linear text. Calls are blocking and
/// may be slow on malformed input; the async pipeline runs them on the blocking
/// pool under its own timeout (see `papercast_ingest::PdfTextExtractor`).
pub trait PdfBackend: Send + Sync {
    /// Extract the full text content of a PDF held in memory.
    fn extract_text(&self, bytes: &[u8]) -> Result<String, BackendError>;
}
