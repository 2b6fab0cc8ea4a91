use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod backend;
pub mod config_file;
pub mod fetch;
pub mod mock;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend};
pub use fetch::{Fetcher, HttpFetcher};

/// Default redirect-stub marker phrases.
pub const DEFAULT_REDIRECT_MARKERS: &[&str] = &["Redirecting", "You should be redirected"];

/// Which representation produced a [`ContentBundle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Html,
    Pdf,
    Abstract,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Html => "html",
            Provenance::Pdf => "pdf",
            Provenance::Abstract => "abstract",
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bytes fetched from one of the remote representations.
///
/// The payload is shared so the PDF stage can hand it to a blocking parser
/// and still fall back to reading it as text.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub bytes: Arc<[u8]>,
}

impl RawDocument {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Whether the payload starts with the `%PDF-` magic.
    pub fn looks_like_pdf(&self) -> bool {
        self.bytes.starts_with(b"%PDF-")
    }
}

/// A titled, ordered span of document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub title: String,
    pub content: String,
    /// 1-based, contiguous, in marker order.
    pub ordinal: usize,
    pub word_count: usize,
}

impl Section {
    pub fn new(title: impl Into<String>, content: impl Into<String>, ordinal: usize) -> Self {
        let content = content.into();
        let word_count = word_count(&content);
        Self {
            title: title.into(),
            content,
            ordinal,
            word_count,
        }
    }
}

/// Final result of one extraction request.
///
/// `word_count` and `character_count` always describe `full_text`, never the
/// section contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBundle {
    pub full_text: String,
    pub sections: Vec<Section>,
    pub word_count: usize,
    pub character_count: usize,
    pub source: Provenance,
}

impl ContentBundle {
    /// True when nothing usable was extracted (the "no content available" case).
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Input handed over by the routing layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    /// URL of the PDF rendering.
    pub document_url: String,
    #[serde(default)]
    pub abstract_text: String,
}

impl ExtractionRequest {
    pub fn new(document_url: impl Into<String>, abstract_text: impl Into<String>) -> Self {
        Self {
            document_url: document_url.into(),
            abstract_text: abstract_text.into(),
        }
    }
}

/// Number of whitespace-delimited tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Length in Unicode scalar values.
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Why extracted text was not accepted as article content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QualityRejection {
    #[error("content too short ({chars} chars, need {min})")]
    TooShort { chars: usize, min: usize },
    #[error("redirect stub (contains \"{marker}\")")]
    RedirectStub { marker: String },
    #[error("no sections could be segmented")]
    NoSections,
}

/// Failure of a single pipeline stage. Never crosses the orchestrator boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("network error: {0}")]
    Network(String),
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("rejected: {0}")]
    Quality(QualityRejection),
    #[error("cancelled")]
    Cancelled,
}

impl From<QualityRejection> for ExtractError {
    fn from(r: QualityRejection) -> Self {
        ExtractError::Quality(r)
    }
}

impl From<BackendError> for ExtractError {
    fn from(e: BackendError) -> Self {
        ExtractError::Parse(e.to_string())
    }
}

/// Runtime configuration for the extraction pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Fetch budget for the hypertext rendering.
    pub html_timeout_ms: u64,
    /// Fetch budget for the PDF rendering.
    pub pdf_timeout_ms: u64,
    /// Parse budget for PDF text extraction, independent of the fetch.
    pub pdf_parse_timeout_ms: u64,
    /// PDF parses allowed on the blocking pool at once, abandoned ones included.
    pub max_concurrent_parses: usize,
    /// Sanitized text shorter than this is not real content.
    pub min_content_chars: usize,
    /// Literal phrases identifying a redirect placeholder page.
    pub redirect_markers: Vec<String>,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Config {
    pub fn html_timeout(&self) -> Duration {
        Duration::from_millis(self.html_timeout_ms)
    }

    pub fn pdf_timeout(&self) -> Duration {
        Duration::from_millis(self.pdf_timeout_ms)
    }

    pub fn pdf_parse_timeout(&self) -> Duration {
        Duration::from_millis(self.pdf_parse_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            html_timeout_ms: 5_000,
            pdf_timeout_ms: 10_000,
            pdf_parse_timeout_ms: 8_000,
            max_concurrent_parses: 4,
            min_content_chars: 500,
            redirect_markers: DEFAULT_REDIRECT_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            user_agent: concat!("papercast/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_serializes_with_camel_case_fields() {
        let bundle = ContentBundle {
            full_text: "one two".into(),
            sections: vec![Section::new("Full Content", "one two", 1)],
            word_count: 2,
            character_count: 7,
            source: Provenance::Abstract,
        };
        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["fullText"], "one two");
        assert_eq!(json["characterCount"], 7);
        assert_eq!(json["source"], "abstract");
        assert_eq!(json["sections"][0]["wordCount"], 2);
        assert_eq!(json["sections"][0]["ordinal"], 1);
    }

    #[test]
    fn request_accepts_missing_abstract() {
        let req: ExtractionRequest =
            serde_json::from_str(r#"{"documentUrl": "https://arxiv.org/pdf/1234.5678.pdf"}"#)
                .unwrap();
        assert_eq!(req.document_url, "https://arxiv.org/pdf/1234.5678.pdf");
        assert!(req.abstract_text.is_empty());
    }

    #[test]
    fn section_counts_words() {
        let s = Section::new("1. Introduction", "  alpha  beta\ngamma ", 1);
        assert_eq!(s.word_count, 3);
    }

    #[test]
    fn char_count_is_unicode_aware() {
        assert_eq!(char_count("naïve"), 5);
        assert_eq!("naïve".len(), 6);
    }

    #[test]
    fn raw_document_pdf_magic() {
        assert!(RawDocument::new(b"%PDF-1.7\n...".to_vec()).looks_like_pdf());
        assert!(!RawDocument::new(b"<html>".to_vec()).looks_like_pdf());
    }

    #[test]
    fn quality_rejection_is_an_error() {
        let err: Box<dyn std::error::Error + Send + Sync> =
            Box::new(QualityRejection::TooShort { chars: 10, min: 500 });
        assert_eq!(err.to_string(), "content too short (10 chars, need 500)");

        let stage: ExtractError = QualityRejection::RedirectStub {
            marker: "Redirecting".into(),
        }
        .into();
        assert_eq!(
            stage.to_string(),
            "rejected: redirect stub (contains \"Redirecting\")"
        );
    }

    #[test]
    fn default_timeouts() {
        let config = Config::default();
        assert_eq!(config.html_timeout(), Duration::from_secs(5));
        assert_eq!(config.pdf_timeout(), Duration::from_secs(10));
        assert_eq!(config.pdf_parse_timeout(), Duration::from_secs(8));
        assert_eq!(config.min_content_chars, 500);
    }
}
