use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use papercast_core::config_file;
use papercast_core::{Config, ContentBundle, ExtractionRequest};
use papercast_ingest::ExtractionOrchestrator;
use papercast_parsing::ParsingConfig;

mod logging;
mod output;

use output::ColorMode;

/// Papercast - Extract and segment scholarly documents into titled sections
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract one document, falling back from HTML to PDF to the abstract
    Extract {
        /// URL of the PDF rendering
        pdf_url: String,

        /// Abstract used when neither rendering yields content
        #[arg(long = "abstract", conflicts_with = "abstract_file")]
        abstract_text: Option<String>,

        /// Read the abstract from a file
        #[arg(long)]
        abstract_file: Option<PathBuf>,

        /// Print the content bundle as JSON
        #[arg(long)]
        json: bool,

        /// Write output to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        #[command(flatten)]
        overrides: ConfigArgs,
    },

    /// Extract every request of a JSON Lines file, one bundle per output line
    Batch {
        /// File with one `{"documentUrl": ..., "abstractText": ...}` per line
        input: PathBuf,

        /// Maximum number of extractions in flight
        #[arg(short, long, default_value_t = 4)]
        concurrency: usize,

        /// Write output to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        overrides: ConfigArgs,
    },

    /// Segment a local plain-text file into sections
    Segment {
        /// Path to the text file
        file: PathBuf,

        /// Use the PDF segmenter (numbered headings only, lower threshold)
        #[arg(long)]
        pdf: bool,

        /// Print sections as JSON
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Sanitize a local HTML file and report the quality-gate verdict
    Sanitize {
        /// Path to the HTML file
        file: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

/// Per-run overrides of the file and environment configuration.
#[derive(Args, Debug, Clone, Default)]
struct ConfigArgs {
    /// Fetch timeout for the HTML rendering, in milliseconds
    #[arg(long)]
    html_timeout_ms: Option<u64>,

    /// Fetch timeout for the PDF rendering, in milliseconds
    #[arg(long)]
    pdf_timeout_ms: Option<u64>,

    /// Parse timeout for PDF text extraction, in milliseconds
    #[arg(long)]
    pdf_parse_timeout_ms: Option<u64>,

    /// Minimum sanitized length accepted as real content
    #[arg(long)]
    min_content_chars: Option<usize>,
}

impl ConfigArgs {
    fn apply_to(&self, config: &mut Config) {
        if let Some(v) = self.html_timeout_ms {
            config.html_timeout_ms = v;
        }
        if let Some(v) = self.pdf_timeout_ms {
            config.pdf_timeout_ms = v;
        }
        if let Some(v) = self.pdf_parse_timeout_ms {
            config.pdf_parse_timeout_ms = v;
        }
        if let Some(v) = self.min_content_chars {
            config.min_content_chars = v;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = logging::init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Command::Extract {
            pdf_url,
            abstract_text,
            abstract_file,
            json,
            output,
            no_color,
            overrides,
        } => {
            let abstract_text = match (abstract_text, abstract_file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read abstract: {}", path.display()))?,
                (None, None) => String::new(),
            };
            extract(pdf_url, abstract_text, json, output, no_color, &overrides).await
        }
        Command::Batch {
            input,
            concurrency,
            output,
            overrides,
        } => batch(&input, concurrency, output, &overrides).await,
        Command::Segment {
            file,
            pdf,
            json,
            no_color,
        } => segment(&file, pdf, json, no_color),
        Command::Sanitize { file, no_color } => sanitize(&file, no_color),
    }
}

/// Resolve configuration: CLI flags > env vars > config file > defaults.
fn resolve_config(overrides: &ConfigArgs) -> anyhow::Result<(Config, ParsingConfig)> {
    let file = config_file::load_config();
    let mut config = Config::default();
    file.apply_to(&mut config);
    apply_env(&mut config);
    overrides.apply_to(&mut config);

    let parsing = papercast_parsing::parsing_config_from_file(file.segmentation.as_ref())?;
    Ok((config, parsing))
}

fn apply_env(config: &mut Config) {
    let env_ms = |name: &str| std::env::var(name).ok().and_then(|v| v.trim().parse().ok());
    if let Some(v) = env_ms("PAPERCAST_HTML_TIMEOUT_MS") {
        config.html_timeout_ms = v;
    }
    if let Some(v) = env_ms("PAPERCAST_PDF_TIMEOUT_MS") {
        config.pdf_timeout_ms = v;
    }
    if let Some(v) = env_ms("PAPERCAST_PDF_PARSE_TIMEOUT_MS") {
        config.pdf_parse_timeout_ms = v;
    }
}

fn build_orchestrator(overrides: &ConfigArgs) -> anyhow::Result<ExtractionOrchestrator> {
    let (config, parsing) = resolve_config(overrides)?;
    tracing::debug!(?config, "resolved configuration");
    Ok(ExtractionOrchestrator::from_config(config)?.with_parsing_config(parsing))
}

/// Token cancelled on Ctrl+C.
fn ctrl_c_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_clone.cancel();
        }
    });
    cancel
}

fn open_writer(output: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    })
}

async fn extract(
    pdf_url: String,
    abstract_text: String,
    json: bool,
    output: Option<PathBuf>,
    no_color: bool,
    overrides: &ConfigArgs,
) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(overrides)?;
    let request = ExtractionRequest::new(pdf_url, abstract_text);
    let cancel = ctrl_c_token();

    let spinner = if json {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
        pb.set_message(format!("Extracting {}", request.document_url));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    };

    let extraction = orchestrator.extract_with_cancel(&request, &cancel).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let color = ColorMode(!no_color && output.is_none());
    let mut writer = open_writer(output.as_deref())?;

    if json {
        serde_json::to_writer_pretty(&mut writer, &extraction.bundle)?;
        writeln!(writer)?;
    } else {
        output::print_extraction(&mut writer, &request.document_url, &extraction, color)?;
    }
    Ok(())
}

fn read_requests(input: &Path) -> anyhow::Result<Vec<ExtractionRequest>> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid request", input.display(), i + 1))
        })
        .collect()
}

async fn batch(
    input: &Path,
    concurrency: usize,
    output: Option<PathBuf>,
    overrides: &ConfigArgs,
) -> anyhow::Result<()> {
    let requests = read_requests(input)?;
    let orchestrator = build_orchestrator(overrides)?;
    let cancel = ctrl_c_token();

    let bar = ProgressBar::new(requests.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{bar:40.green/dim}] {pos}/{len} {msg}",
    )?);

    let mut bundles: Vec<Option<ContentBundle>> = vec![None; requests.len()];
    {
        let orchestrator = &orchestrator;
        let cancel = &cancel;
        let mut in_flight = futures_util::stream::iter(requests.iter().enumerate())
            .map(|(i, request)| async move {
                let extraction = orchestrator.extract_with_cancel(request, cancel).await;
                (i, extraction.bundle)
            })
            .buffer_unordered(concurrency.max(1));

        while let Some((i, bundle)) = in_flight.next().await {
            bar.set_message(format!("{} ({})", requests[i].document_url, bundle.source));
            bar.inc(1);
            bundles[i] = Some(bundle);
        }
    }
    bar.finish_and_clear();

    let mut writer = open_writer(output.as_deref())?;
    for bundle in bundles.iter().flatten() {
        serde_json::to_writer(&mut writer, bundle)?;
        writeln!(writer)?;
    }
    Ok(())
}

fn segment(file: &Path, pdf: bool, json: bool, no_color: bool) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let (_, parsing) = resolve_config(&ConfigArgs::default())?;

    let sections = if pdf {
        let text = papercast_parsing::normalize_pdf_text_with_config(&raw, &parsing);
        papercast_parsing::segment_pdf_text_with_config(&text, &parsing)
    } else {
        let text = raw.replace("\r\n", "\n");
        papercast_parsing::segment_with_config(&text, &parsing)
    };

    let mut writer = std::io::stdout();
    if json {
        serde_json::to_writer_pretty(&mut writer, &sections)?;
        writeln!(writer)?;
    } else if sections.is_empty() {
        writeln!(writer, "No sections found.")?;
    } else {
        output::print_sections(&mut writer, &sections, ColorMode(!no_color))?;
    }
    Ok(())
}

fn sanitize(file: &Path, no_color: bool) -> anyhow::Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let (config, _) = resolve_config(&ConfigArgs::default())?;

    let text = papercast_parsing::sanitize_html_bytes(&bytes);
    let verdict =
        papercast_parsing::check_quality(&text, config.min_content_chars, &config.redirect_markers);

    let mut writer = std::io::stdout();
    writeln!(writer, "{}", text)?;
    writeln!(writer)?;
    output::print_quality_verdict(&mut writer, &verdict, ColorMode(!no_color))?;
    Ok(())
}
