use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use papercast_core::mock::{MockFetcher, MockPdf, MockPdfBackend, MockResponse};
use papercast_core::{Config, ExtractError, ExtractionRequest, Provenance};
use papercast_ingest::{ExtractionOrchestrator, Stage, StageStatus};

const PDF_URL: &str = "https://arxiv.org/pdf/2401.00001.pdf";
const HTML_URL: &str = "https://arxiv.org/html/2401.00001";
const ABSTRACT: &str = "We study section detection.\n\nIt mostly works.";

fn paragraph(topic: &str) -> String {
    format!(
        "<p>This part covers {topic} at length, with enough prose that a reader \
         gets the full picture of what was done and why it matters.</p>"
    )
}

fn article_html() -> String {
    format!(
        "<html><body><h1>Detecting Sections</h1>\
         <h2>1. Introduction</h2>{}{}\
         <h2>2. Method</h2>{}{}\
         <h2>3. Evaluation</h2>{}{}\
         </body></html>",
        paragraph("motivation"),
        paragraph("scope"),
        paragraph("the pipeline"),
        paragraph("the heuristics"),
        paragraph("datasets"),
        paragraph("numbers"),
    )
}

fn pdf_text() -> String {
    let body = "the quick brown fox jumps over the lazy dog again and again";
    format!(
        "1. Introduction\n{body}\n2. Method\n{body}\n3. Results\n{body}\n"
    )
}

fn pdf_payload(rest: &str) -> MockResponse {
    MockResponse::text(format!("%PDF-1.7\n{rest}"))
}

fn request() -> ExtractionRequest {
    ExtractionRequest::new(PDF_URL, ABSTRACT)
}

fn orchestrator(
    fetcher: MockFetcher,
    pdf: MockPdf,
    config: Config,
) -> (ExtractionOrchestrator, Arc<MockFetcher>, Arc<MockPdfBackend>) {
    let fetcher = Arc::new(fetcher);
    let backend = Arc::new(MockPdfBackend::new(pdf));
    let orch = ExtractionOrchestrator::new(fetcher.clone(), backend.clone(), config);
    (orch, fetcher, backend)
}

fn statuses(stages: &[papercast_ingest::StageResult]) -> Vec<(Stage, StageStatus)> {
    stages.iter().map(|s| (s.stage, s.status)).collect()
}

#[tokio::test]
async fn html_rendering_accepted_first() {
    let (orch, fetcher, backend) = orchestrator(
        MockFetcher::new().respond(HTML_URL, MockResponse::text(article_html())),
        MockPdf::Text(pdf_text()),
        Config::default(),
    );

    let report = orch.extract_with_report(&request()).await;
    let bundle = &report.bundle;
    assert_eq!(bundle.source, Provenance::Html);
    let titles: Vec<_> = bundle.sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["1. Introduction", "2. Method", "3. Evaluation"]);
    assert_eq!(bundle.character_count, bundle.full_text.chars().count());
    assert_eq!(
        bundle.word_count,
        bundle.full_text.split_whitespace().count()
    );
    assert!(bundle.full_text.starts_with("Detecting Sections"));

    assert_eq!(statuses(&report.stages), vec![(Stage::Html, StageStatus::Accepted)]);
    assert_eq!(fetcher.calls(), vec![HTML_URL.to_string()]);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn redirect_stub_falls_through_to_pdf() {
    let stub = format!(
        "<html><body><p>Redirecting to the article page.</p>{}</body></html>",
        "<p>Please wait while the page loads.</p>".repeat(20)
    );
    let (orch, fetcher, backend) = orchestrator(
        MockFetcher::new()
            .respond(HTML_URL, MockResponse::text(stub))
            .respond(PDF_URL, pdf_payload("binary")),
        MockPdf::Text(pdf_text()),
        Config::default(),
    );

    let report = orch.extract_with_report(&request()).await;
    assert_eq!(report.bundle.source, Provenance::Pdf);
    assert_eq!(report.bundle.sections.len(), 3);
    assert_eq!(report.bundle.sections[2].title, "3. Results");
    assert_eq!(
        statuses(&report.stages),
        vec![
            (Stage::Html, StageStatus::Failed),
            (Stage::Pdf, StageStatus::Accepted)
        ]
    );
    let html_error = report.stages[0].error.as_deref().unwrap_or_default();
    assert!(html_error.contains("redirect stub"), "{html_error}");
    assert_eq!(fetcher.calls(), vec![HTML_URL.to_string(), PDF_URL.to_string()]);
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn short_html_is_rejected() {
    let (orch, _, _) = orchestrator(
        MockFetcher::new()
            .respond(HTML_URL, MockResponse::text("<p>Loading…</p>"))
            .respond(PDF_URL, pdf_payload("")),
        MockPdf::Text(pdf_text()),
        Config::default(),
    );
    let report = orch.extract_with_report(&request()).await;
    assert_eq!(report.bundle.source, Provenance::Pdf);
    let html_error = report.stages[0].error.as_deref().unwrap_or_default();
    assert!(html_error.contains("too short"), "{html_error}");
}

#[tokio::test]
async fn pdf_parse_failure_reads_payload_as_text() {
    let (orch, _, backend) = orchestrator(
        MockFetcher::new()
            .respond(HTML_URL, MockResponse::Fail(ExtractError::Network("HTTP 404".into())))
            .respond(PDF_URL, pdf_payload(&article_html())),
        MockPdf::Malformed("broken xref table".into()),
        Config::default(),
    );

    let report = orch.extract_with_report(&request()).await;
    assert_eq!(report.bundle.source, Provenance::Html);
    assert_eq!(report.bundle.sections.len(), 3);
    assert_eq!(
        statuses(&report.stages),
        vec![
            (Stage::Html, StageStatus::Failed),
            (Stage::Pdf, StageStatus::Failed),
            (Stage::PdfAsText, StageStatus::Accepted)
        ]
    );
    let pdf_error = report.stages[1].error.as_deref().unwrap_or_default();
    assert!(pdf_error.contains("broken xref table"), "{pdf_error}");
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn non_pdf_payload_skips_the_parser() {
    let (orch, _, backend) = orchestrator(
        MockFetcher::new().respond(PDF_URL, MockResponse::text(article_html())),
        MockPdf::Text(pdf_text()),
        Config::default(),
    );

    let report = orch.extract_with_report(&request()).await;
    assert_eq!(report.bundle.source, Provenance::Html);
    assert_eq!(backend.call_count(), 0);
    assert_eq!(report.stages[2].stage, Stage::PdfAsText);
    assert_eq!(report.stages[2].status, StageStatus::Accepted);
}

#[tokio::test]
async fn both_renderings_fail_uses_abstract() {
    let (orch, fetcher, _) = orchestrator(
        MockFetcher::new(),
        MockPdf::Text(pdf_text()),
        Config::default(),
    );

    let report = orch.extract_with_report(&request()).await;
    let bundle = &report.bundle;
    assert_eq!(bundle.source, Provenance::Abstract);
    assert_eq!(bundle.full_text, ABSTRACT);
    assert_eq!(bundle.sections.len(), 1);
    assert_eq!(bundle.sections[0].title, "Full Content");
    assert_eq!(bundle.sections[0].ordinal, 1);
    assert_eq!(bundle.word_count, 7);
    assert_eq!(
        statuses(&report.stages),
        vec![
            (Stage::Html, StageStatus::Failed),
            (Stage::Pdf, StageStatus::Failed),
            (Stage::PdfAsText, StageStatus::Skipped),
            (Stage::Abstract, StageStatus::Accepted)
        ]
    );
    assert_eq!(fetcher.calls().len(), 2);
}

#[tokio::test]
async fn empty_abstract_yields_no_sections() {
    let (orch, _, _) = orchestrator(
        MockFetcher::new(),
        MockPdf::Text(pdf_text()),
        Config::default(),
    );

    let bundle = orch.extract(&ExtractionRequest::new(PDF_URL, "")).await;
    assert_eq!(bundle.source, Provenance::Abstract);
    assert!(bundle.sections.is_empty());
    assert!(bundle.is_empty());
    assert_eq!(bundle.word_count, 0);
    assert_eq!(bundle.character_count, 0);
}

#[tokio::test]
async fn html_without_sections_advances() {
    // Long enough to pass the gate, but no paragraph reaches 100 characters.
    let html = "<p>A short line of text here.</p>".repeat(40);
    let (orch, _, _) = orchestrator(
        MockFetcher::new()
            .respond(HTML_URL, MockResponse::text(html))
            .respond(PDF_URL, pdf_payload("")),
        MockPdf::Text(pdf_text()),
        Config::default(),
    );

    let report = orch.extract_with_report(&request()).await;
    assert_eq!(report.bundle.source, Provenance::Pdf);
    let html_error = report.stages[0].error.as_deref().unwrap_or_default();
    assert!(html_error.contains("no sections"), "{html_error}");
}

#[tokio::test(start_paused = true)]
async fn hanging_hosts_time_out_within_budget() {
    let (orch, _, _) = orchestrator(
        MockFetcher::new()
            .respond(HTML_URL, MockResponse::Hang)
            .respond(PDF_URL, MockResponse::Hang),
        MockPdf::Text(pdf_text()),
        Config::default(),
    );

    let start = tokio::time::Instant::now();
    let report = orch.extract_with_report(&request()).await;
    let elapsed = start.elapsed();

    assert_eq!(report.bundle.source, Provenance::Abstract);
    assert!(elapsed >= Duration::from_secs(15), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(16), "{elapsed:?}");
    assert_eq!(report.stages[0].error.as_deref(), Some("timed out after 5000ms"));
    assert_eq!(report.stages[1].error.as_deref(), Some("timed out after 10000ms"));
}

#[tokio::test]
async fn stalled_pdf_parser_times_out_then_reads_text() {
    let config = Config {
        pdf_parse_timeout_ms: 100,
        ..Config::default()
    };
    let (orch, _, backend) = orchestrator(
        MockFetcher::new().respond(PDF_URL, pdf_payload(&article_html())),
        MockPdf::Stall(Duration::from_millis(1500), pdf_text()),
        config,
    );

    let start = std::time::Instant::now();
    let report = orch.extract_with_report(&request()).await;
    assert!(start.elapsed() < Duration::from_millis(1000));

    assert_eq!(report.bundle.source, Provenance::Html);
    assert_eq!(
        report.stages[1].error.as_deref(),
        Some("timed out after 100ms")
    );
    assert_eq!(report.stages[2].status, StageStatus::Accepted);
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_jumps_to_abstract() {
    let (orch, fetcher, _) = orchestrator(
        MockFetcher::new()
            .respond(HTML_URL, MockResponse::Hang)
            .respond(PDF_URL, pdf_payload("")),
        MockPdf::Text(pdf_text()),
        Config::default(),
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let start = tokio::time::Instant::now();
    let report = orch.extract_with_cancel(&request(), &cancel).await;
    assert!(start.elapsed() < Duration::from_secs(1));

    assert_eq!(report.bundle.source, Provenance::Abstract);
    assert_eq!(report.bundle.sections.len(), 1);
    assert_eq!(
        statuses(&report.stages),
        vec![
            (Stage::Html, StageStatus::Failed),
            (Stage::Pdf, StageStatus::Skipped),
            (Stage::PdfAsText, StageStatus::Skipped),
            (Stage::Abstract, StageStatus::Accepted)
        ]
    );
    assert_eq!(report.stages[0].error.as_deref(), Some("cancelled"));
    assert_eq!(fetcher.calls(), vec![HTML_URL.to_string()]);
}

#[tokio::test]
async fn precancelled_token_never_fetches() {
    let (orch, fetcher, _) = orchestrator(
        MockFetcher::new().respond(HTML_URL, MockResponse::text(article_html())),
        MockPdf::Text(pdf_text()),
        Config::default(),
    );
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = orch.extract_with_cancel(&request(), &cancel).await;
    assert_eq!(report.bundle.source, Provenance::Abstract);
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn concurrent_extractions_share_one_orchestrator() {
    let (orch, _, _) = orchestrator(
        MockFetcher::new()
            .respond(HTML_URL, MockResponse::text(article_html()))
            .with_delay(Duration::from_millis(20)),
        MockPdf::Text(pdf_text()),
        Config::default(),
    );
    let orch = Arc::new(orch);

    let mut set = tokio::task::JoinSet::new();
    for _ in 0..16 {
        let orch = Arc::clone(&orch);
        set.spawn(async move { orch.extract(&request()).await });
    }

    let mut bundles = Vec::new();
    while let Some(joined) = set.join_next().await {
        bundles.push(joined.unwrap());
    }
    assert_eq!(bundles.len(), 16);
    assert!(bundles.iter().all(|b| b == &bundles[0]));
    assert_eq!(bundles[0].source, Provenance::Html);
}
