use std::io::Write;

use owo_colors::OwoColorize;
use papercast_core::{ContentBundle, QualityRejection, Section};
use papercast_ingest::{Extraction, StageResult, StageStatus};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the per-stage report and the resulting bundle.
pub fn print_extraction(
    w: &mut dyn Write,
    url: &str,
    extraction: &Extraction,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", "Extracting".bold(), url)?;
    } else {
        writeln!(w, "Extracting {}", url)?;
    }
    writeln!(w)?;
    print_stages(w, &extraction.stages, color)?;
    writeln!(w)?;
    print_bundle_summary(w, &extraction.bundle, color)?;

    if extraction.bundle.is_empty() {
        writeln!(w)?;
        if color.enabled() {
            writeln!(w, "{}", "No content available.".red())?;
        } else {
            writeln!(w, "No content available.")?;
        }
        return Ok(());
    }

    writeln!(w)?;
    print_sections(w, &extraction.bundle.sections, color)
}

/// One line per attempted stage.
pub fn print_stages(
    w: &mut dyn Write,
    stages: &[StageResult],
    color: ColorMode,
) -> std::io::Result<()> {
    for stage in stages {
        let name = format!("{:<12}", stage.stage.name());
        let ms = stage.elapsed.as_millis();
        match stage.status {
            StageStatus::Accepted => {
                if color.enabled() {
                    writeln!(w, "  {} {} ({}ms)", name, "ACCEPTED".green(), ms)?;
                } else {
                    writeln!(w, "  {} ACCEPTED ({}ms)", name, ms)?;
                }
            }
            StageStatus::Failed => {
                let reason = stage.error.as_deref().unwrap_or("unknown error");
                if color.enabled() {
                    writeln!(
                        w,
                        "  {} {} ({}ms) {}",
                        name,
                        "FAILED".red(),
                        ms,
                        reason.dimmed()
                    )?;
                } else {
                    writeln!(w, "  {} FAILED ({}ms) {}", name, ms, reason)?;
                }
            }
            StageStatus::Skipped => {
                if color.enabled() {
                    writeln!(w, "  {} {}", name, "SKIPPED".dimmed())?;
                } else {
                    writeln!(w, "  {} SKIPPED", name)?;
                }
            }
        }
    }
    Ok(())
}

pub fn print_bundle_summary(
    w: &mut dyn Write,
    bundle: &ContentBundle,
    color: ColorMode,
) -> std::io::Result<()> {
    let line = format!(
        "Source: {} | {} words, {} characters | {} sections",
        bundle.source,
        bundle.word_count,
        bundle.character_count,
        bundle.sections.len()
    );
    if color.enabled() {
        writeln!(w, "{}", line.bold())
    } else {
        writeln!(w, "{}", line)
    }
}

/// Section headings with a one-line preview of each body.
pub fn print_sections(
    w: &mut dyn Write,
    sections: &[Section],
    color: ColorMode,
) -> std::io::Result<()> {
    for section in sections {
        let heading = format!("[{}] {}", section.ordinal, section.title);
        if color.enabled() {
            writeln!(
                w,
                "{} {}",
                heading.bold().yellow(),
                format!("({} words)", section.word_count).dimmed()
            )?;
            writeln!(w, "    {}", truncate(&section.content, 100).dimmed())?;
        } else {
            writeln!(w, "{} ({} words)", heading, section.word_count)?;
            writeln!(w, "    {}", truncate(&section.content, 100))?;
        }
    }
    Ok(())
}

/// Verdict of the quality gate on sanitized text.
pub fn print_quality_verdict(
    w: &mut dyn Write,
    verdict: &Result<(), QualityRejection>,
    color: ColorMode,
) -> std::io::Result<()> {
    match verdict {
        Ok(()) => {
            if color.enabled() {
                writeln!(w, "{} {}", "Quality:".bold(), "accepted".green())
            } else {
                writeln!(w, "Quality: accepted")
            }
        }
        Err(reason) => {
            if color.enabled() {
                writeln!(w, "{} {} ({})", "Quality:".bold(), "rejected".red(), reason)
            } else {
                writeln!(w, "Quality: rejected ({})", reason)
            }
        }
    }
}

/// Flatten whitespace and cut to `max` characters.
fn truncate(s: &str, max: usize) -> String {
    let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > max {
        format!("{}...", flat.chars().take(max).collect::<String>())
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use papercast_core::Provenance;
    use papercast_ingest::{Stage, assemble_bundle};
    use std::time::Duration;

    fn render(f: impl FnOnce(&mut dyn Write) -> std::io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("héllo\n  wörld", 100), "héllo wörld");
        assert_eq!(truncate("ééééé", 3), "ééé...");
    }

    #[test]
    fn stages_without_color() {
        let stages = vec![
            StageResult {
                stage: Stage::Html,
                status: StageStatus::Failed,
                elapsed: Duration::from_millis(12),
                error: Some("network error: HTTP 404".into()),
            },
            StageResult {
                stage: Stage::PdfAsText,
                status: StageStatus::Skipped,
                elapsed: Duration::ZERO,
                error: None,
            },
        ];
        let out = render(|w| print_stages(w, &stages, ColorMode(false)));
        assert!(out.contains("html"));
        assert!(out.contains("FAILED (12ms) network error: HTTP 404"));
        assert!(out.contains("pdf-as-text"));
        assert!(out.contains("SKIPPED"));
    }

    #[test]
    fn empty_bundle_reports_no_content() {
        let extraction = Extraction {
            bundle: assemble_bundle(String::new(), vec![], Provenance::Abstract),
            stages: vec![],
        };
        let out = render(|w| print_extraction(w, "https://x/pdf/1", &extraction, ColorMode(false)));
        assert!(out.contains("Source: abstract | 0 words, 0 characters | 0 sections"));
        assert!(out.contains("No content available."));
    }

    #[test]
    fn sections_listed_in_order() {
        let sections = vec![
            Section::new("1. Introduction", "First body.", 1),
            Section::new("3. Conclusion", "Last body here.", 2),
        ];
        let out = render(|w| print_sections(w, &sections, ColorMode(false)));
        let intro = out.find("[1] 1. Introduction (2 words)").unwrap();
        let concl = out.find("[2] 3. Conclusion (3 words)").unwrap();
        assert!(intro < concl);
    }

    #[test]
    fn quality_verdicts() {
        let ok = render(|w| print_quality_verdict(w, &Ok(()), ColorMode(false)));
        assert_eq!(ok, "Quality: accepted\n");
        let rejected = render(|w| {
            print_quality_verdict(
                w,
                &Err(QualityRejection::TooShort { chars: 10, min: 500 }),
                ColorMode(false),
            )
        });
        assert_eq!(
            rejected,
            "Quality: rejected (content too short (10 chars, need 500))\n"
        );
    }
}
