use thiserror::Error;

pub mod assembler;
pub mod orchestrator;
pub mod pdf;

pub use assembler::assemble_bundle;
pub use orchestrator::{
    Extraction, ExtractionOrchestrator, Stage, StageResult, StageStatus, html_url_for,
};
pub use pdf::{DEFAULT_MAX_CONCURRENT_PARSES, PdfTextExtractor};
// Re-export domain types for convenience
pub use papercast_core::{Config, ContentBundle, ExtractionRequest, Provenance, Section};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid segmentation config: {0}")]
    Parsing(#[from] papercast_parsing::ParsingError),
}

/// The PDF backend compiled into this build.
#[cfg(feature = "pdf")]
pub fn default_pdf_backend() -> std::sync::Arc<dyn papercast_core::PdfBackend> {
    std::sync::Arc::new(papercast_pdf_mupdf::MupdfBackend::default())
}

/// The PDF backend compiled into this build.
///
/// Without the `pdf` feature every parse fails, so PDF payloads go straight
/// to the raw-text fallback.
#[cfg(not(feature = "pdf"))]
pub fn default_pdf_backend() -> std::sync::Arc<dyn papercast_core::PdfBackend> {
    std::sync::Arc::new(NoPdfSupport)
}

#[cfg(not(feature = "pdf"))]
struct NoPdfSupport;

#[cfg(not(feature = "pdf"))]
impl papercast_core::PdfBackend for NoPdfSupport {
    fn extract_text(&self, _bytes: &[u8]) -> Result<String, papercast_core::BackendError> {
        Err(papercast_core::BackendError::OpenError(
            "PDF support not compiled in (enable the `pdf` feature of papercast-ingest)".into(),
        ))
    }
}
