use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use papercast_core::{
    Config, ContentBundle, ExtractError, ExtractionRequest, Fetcher, HttpFetcher,
    PdfBackend, Provenance, QualityRejection, RawDocument, Section,
};
use papercast_parsing::{
    ParsingConfig, check_quality, normalize_pdf_text_with_config, sanitize_html_bytes,
    segment_abstract_with_config, segment_pdf_text_with_config, segment_with_config,
};

use crate::IngestError;
use crate::assembler::assemble_bundle;
use crate::pdf::PdfTextExtractor;

/// One step of the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Hypertext rendering.
    Html,
    /// PDF rendering through the PDF parser.
    Pdf,
    /// PDF payload read as markup after the parser gave up.
    PdfAsText,
    /// Caller-supplied abstract.
    Abstract,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Html => "html",
            Stage::Pdf => "pdf",
            Stage::PdfAsText => "pdf-as-text",
            Stage::Abstract => "abstract",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Accepted,
    Failed,
    /// Not attempted (cancelled, or nothing to work with).
    Skipped,
}

/// What happened at one stage.
#[derive(Debug, Clone)]
pub struct StageResult {
    pub stage: Stage,
    pub status: StageStatus,
    pub elapsed: Duration,
    pub error: Option<String>,
}

impl StageResult {
    fn accepted(stage: Stage, start: Instant) -> Self {
        Self {
            stage,
            status: StageStatus::Accepted,
            elapsed: start.elapsed(),
            error: None,
        }
    }

    fn failed(stage: Stage, start: Instant, error: &ExtractError) -> Self {
        Self {
            stage,
            status: StageStatus::Failed,
            elapsed: start.elapsed(),
            error: Some(error.to_string()),
        }
    }

    fn skipped(stage: Stage) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped,
            elapsed: Duration::ZERO,
            error: None,
        }
    }
}

/// The bundle plus a record of every stage that was considered.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub bundle: ContentBundle,
    pub stages: Vec<StageResult>,
}

/// Text a stage produced and the sections cut from it.
struct Candidate {
    text: String,
    sections: Vec<Section>,
}

impl Candidate {
    fn new(text: String, sections: Vec<Section>) -> Result<Self, ExtractError> {
        if sections.is_empty() {
            return Err(QualityRejection::NoSections.into());
        }
        Ok(Self { text, sections })
    }
}

/// Derive the hypertext URL from the PDF URL: drop the first `.pdf`, then
/// turn the first `/pdf/` path segment into `/html/`.
pub fn html_url_for(pdf_url: &str) -> String {
    pdf_url.replacen(".pdf", "", 1).replacen("/pdf/", "/html/", 1)
}

/// Race `fut` against `cancel`.
async fn guarded<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, ExtractError>
where
    F: Future<Output = Result<T, ExtractError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ExtractError::Cancelled),
        result = fut => result,
    }
}

/// Sequences the hypertext, PDF and abstract fallbacks for one request.
///
/// Holds no per-request state, so one orchestrator can serve any number of
/// concurrent extractions.
pub struct ExtractionOrchestrator {
    fetcher: Arc<dyn Fetcher>,
    pdf: PdfTextExtractor,
    config: Config,
    parsing: ParsingConfig,
}

impl ExtractionOrchestrator {
    pub fn new(fetcher: Arc<dyn Fetcher>, backend: Arc<dyn PdfBackend>, config: Config) -> Self {
        let pdf = PdfTextExtractor::new(backend, config.pdf_parse_timeout())
            .with_max_concurrent(config.max_concurrent_parses);
        Self {
            fetcher,
            pdf,
            config,
            parsing: ParsingConfig::default(),
        }
    }

    /// Orchestrator over real HTTP and the PDF backend compiled into this build.
    pub fn from_config(config: Config) -> Result<Self, IngestError> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::new(
            Arc::new(fetcher),
            crate::default_pdf_backend(),
            config,
        ))
    }

    pub fn with_parsing_config(mut self, parsing: ParsingConfig) -> Self {
        self.parsing = parsing;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the fallback chain and return the bundle. Never fails.
    pub async fn extract(&self, request: &ExtractionRequest) -> ContentBundle {
        self.extract_with_report(request).await.bundle
    }

    /// Like [`extract`](Self::extract) but also reports every stage.
    pub async fn extract_with_report(&self, request: &ExtractionRequest) -> Extraction {
        self.extract_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Run the fallback chain until a stage is accepted or `cancel` fires.
    ///
    /// Cancellation abandons the in-flight fetch or parse and goes straight to
    /// the abstract, so a bundle is still returned.
    pub async fn extract_with_cancel(
        &self,
        request: &ExtractionRequest,
        cancel: &CancellationToken,
    ) -> Extraction {
        let mut stages = Vec::new();

        // Hypertext rendering
        let html_url = html_url_for(&request.document_url);
        let start = Instant::now();
        let html = guarded(cancel, self.html_stage(&html_url)).await;
        if let Some(bundle) = self.settle(Stage::Html, start, html, Provenance::Html, &mut stages) {
            return Extraction { bundle, stages };
        }

        // PDF rendering, then the same payload read as text
        if cancel.is_cancelled() {
            stages.push(StageResult::skipped(Stage::Pdf));
            stages.push(StageResult::skipped(Stage::PdfAsText));
        } else if let Some(bundle) = self.pdf_stages(&request.document_url, cancel, &mut stages).await
        {
            return Extraction { bundle, stages };
        }

        // Abstract
        let start = Instant::now();
        let bundle = self.abstract_bundle(&request.abstract_text);
        tracing::info!(
            stage = Stage::Abstract.name(),
            sections = bundle.sections.len(),
            "falling back to abstract"
        );
        stages.push(StageResult::accepted(Stage::Abstract, start));
        Extraction { bundle, stages }
    }

    async fn pdf_stages(
        &self,
        pdf_url: &str,
        cancel: &CancellationToken,
        stages: &mut Vec<StageResult>,
    ) -> Option<ContentBundle> {
        let start = Instant::now();
        let fetched = guarded(cancel, self.fetcher.fetch(pdf_url, self.config.pdf_timeout())).await;
        let doc = match fetched {
            Ok(bytes) => RawDocument::new(bytes),
            Err(e) => {
                tracing::warn!(stage = Stage::Pdf.name(), url = pdf_url, error = %e, "PDF fetch failed");
                stages.push(StageResult::failed(Stage::Pdf, start, &e));
                stages.push(StageResult::skipped(Stage::PdfAsText));
                return None;
            }
        };

        let parsed = guarded(cancel, self.parse_pdf(&doc)).await;
        if let Some(bundle) = self.settle(Stage::Pdf, start, parsed, Provenance::Pdf, stages) {
            return Some(bundle);
        }

        if cancel.is_cancelled() {
            stages.push(StageResult::skipped(Stage::PdfAsText));
            return None;
        }
        let start = Instant::now();
        let raw = self.accept_markup(&doc.bytes);
        self.settle(Stage::PdfAsText, start, raw, Provenance::Html, stages)
    }

    async fn html_stage(&self, url: &str) -> Result<Candidate, ExtractError> {
        let bytes = self.fetcher.fetch(url, self.config.html_timeout()).await?;
        self.accept_markup(&bytes)
    }

    /// Sanitize, gate and segment a markup payload.
    fn accept_markup(&self, bytes: &[u8]) -> Result<Candidate, ExtractError> {
        let text = sanitize_html_bytes(bytes);
        check_quality(
            &text,
            self.config.min_content_chars,
            &self.config.redirect_markers,
        )?;
        let sections = segment_with_config(&text, &self.parsing);
        Candidate::new(text, sections)
    }

    async fn parse_pdf(&self, doc: &RawDocument) -> Result<Candidate, ExtractError> {
        if !doc.looks_like_pdf() {
            return Err(ExtractError::Parse("payload is not a PDF".into()));
        }
        let raw = self.pdf.try_extract(Arc::clone(&doc.bytes)).await?;
        let text = normalize_pdf_text_with_config(&raw, &self.parsing);
        let sections = segment_pdf_text_with_config(&text, &self.parsing);
        Candidate::new(text, sections)
    }

    fn abstract_bundle(&self, abstract_text: &str) -> ContentBundle {
        let sections = segment_abstract_with_config(abstract_text, &self.parsing);
        assemble_bundle(abstract_text.to_string(), sections, Provenance::Abstract)
    }

    /// Record the stage outcome; on success build the bundle.
    fn settle(
        &self,
        stage: Stage,
        start: Instant,
        outcome: Result<Candidate, ExtractError>,
        source: Provenance,
        stages: &mut Vec<StageResult>,
    ) -> Option<ContentBundle> {
        match outcome {
            Ok(candidate) => {
                tracing::info!(
                    stage = stage.name(),
                    sections = candidate.sections.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "stage accepted"
                );
                stages.push(StageResult::accepted(stage, start));
                Some(assemble_bundle(candidate.text, candidate.sections, source))
            }
            Err(e) => {
                tracing::warn!(stage = stage.name(), error = %e, "stage failed, falling back");
                stages.push(StageResult::failed(stage, start, &e));
                None
            }
        }
    }
}
