use once_cell::sync::Lazy;
use regex::Regex;

use papercast_core::{Section, char_count};

use crate::config::ParsingConfig;

/// Title given to the single section produced by the paragraph-merge fallback.
pub const FULL_CONTENT_TITLE: &str = "Full Content";

// Numbered and roman headings occupy a whole line of at most 80 title
// characters. A trailing period is matched but left out of the title.

static NUMBERED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(\d+\.[ \t]*[A-Z][^\n]{0,80}?)\.?[ \t]*$").unwrap()
});

static ROMAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*([IVX]+\.[ \t]*[A-Z][^\n]{0,80}?)\.?[ \t]*$").unwrap()
});

static KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?mi)^[ \t]*(Abstract|Introduction|Related[ \t]+Work|Methods?|Methodology|Experimental[ \t]+Setup|Experiments?|Results?|Discussion|Conclusions?|References|Bibliography|Appendix|Acknowledge?ments?)[ \t]*:?[ \t]*$",
    )
    .unwrap()
});

static ALL_CAPS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*([A-Z][A-Z \t]{3,})[ \t]*$").unwrap());

static PARAGRAPH_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Heuristic used to find section markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionStrategy {
    /// `"3. Experimental Results"`
    Numbered,
    /// `"IV. Evaluation"`
    Roman,
    /// A line holding only a canonical header word such as `Introduction`.
    Keyword,
    /// A line of four or more uppercase letters, e.g. `RELATED WORK`.
    AllCaps,
}

impl SectionStrategy {
    /// Strategies tried by [`segment`], in priority order.
    pub const DEFAULT_CHAIN: [SectionStrategy; 3] = [Self::Numbered, Self::Roman, Self::Keyword];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Numbered => "numbered",
            Self::Roman => "roman",
            Self::Keyword => "keyword",
            Self::AllCaps => "all_caps",
        }
    }

    /// Parse a strategy name as written in config files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "numbered" => Some(Self::Numbered),
            "roman" => Some(Self::Roman),
            "keyword" | "keywords" => Some(Self::Keyword),
            "all_caps" | "allcaps" => Some(Self::AllCaps),
            _ => None,
        }
    }

    /// Marker regex for this strategy. Capture group 1, when present, is the title.
    pub fn marker_regex<'c>(&self, config: &'c ParsingConfig) -> &'c Regex {
        match self {
            Self::Numbered => config.numbered_marker_re.as_ref().unwrap_or(&NUMBERED_RE),
            Self::Roman => config.roman_marker_re.as_ref().unwrap_or(&ROMAN_RE),
            Self::Keyword => config.keyword_marker_re.as_ref().unwrap_or(&KEYWORD_RE),
            Self::AllCaps => config.all_caps_marker_re.as_ref().unwrap_or(&ALL_CAPS_RE),
        }
    }
}

impl std::fmt::Display for SectionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The sections one strategy would produce if chosen.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePartition {
    pub strategy: SectionStrategy,
    pub sections: Vec<Section>,
}

/// A marker kept after the spacing filter.
struct Marker<'t> {
    title: &'t str,
    start: usize,
    end: usize,
}

/// Markers of `re` in document order, skipping any that start fewer than
/// `min_gap` characters after the end of the previously kept marker.
fn find_markers<'t>(re: &Regex, text: &'t str, min_gap: usize) -> Vec<Marker<'t>> {
    let mut markers: Vec<Marker<'t>> = Vec::new();
    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.as_str().trim().is_empty() {
            continue;
        }
        if let Some(prev) = markers.last() {
            if char_count(&text[prev.end..whole.start()]) < min_gap {
                continue;
            }
        }
        let title = caps.get(1).unwrap_or(whole).as_str().trim();
        markers.push(Marker {
            title,
            start: whole.start(),
            end: whole.end(),
        });
    }
    markers
}

/// Build the candidate partition for one strategy.
///
/// Each body runs from the end of its marker to the start of the next kept
/// marker (or the end of text). Bodies shorter than `min_body_chars` are
/// dropped and the survivors renumbered from 1. Returns `None` unless at least
/// two sections survive.
pub fn candidate_partition(
    strategy: SectionStrategy,
    text: &str,
    min_body_chars: usize,
    config: &ParsingConfig,
) -> Option<CandidatePartition> {
    let markers = find_markers(strategy.marker_regex(config), text, config.min_marker_gap);
    if markers.len() < 2 {
        return None;
    }

    let mut sections = Vec::new();
    for (i, marker) in markers.iter().enumerate() {
        let body_end = markers.get(i + 1).map_or(text.len(), |next| next.start);
        let body = text[marker.end..body_end].trim();
        if char_count(body) < min_body_chars {
            tracing::trace!(
                strategy = strategy.name(),
                title = marker.title,
                chars = char_count(body),
                "dropping short section"
            );
            continue;
        }
        sections.push(Section::new(marker.title, body, sections.len() + 1));
    }

    if sections.len() < 2 {
        return None;
    }
    Some(CandidatePartition { strategy, sections })
}

/// Pick the candidate with the most sections. A later candidate must have
/// strictly more sections to replace an earlier one.
pub fn select_partition<I>(candidates: I) -> Option<CandidatePartition>
where
    I: IntoIterator<Item = CandidatePartition>,
{
    let mut best: Option<CandidatePartition> = None;
    for candidate in candidates {
        let better = best
            .as_ref()
            .is_none_or(|b| candidate.sections.len() > b.sections.len());
        if better {
            best = Some(candidate);
        }
    }
    best
}

/// Partition normalized text into titled sections.
///
/// Tries each strategy of the chain in priority order and keeps the partition
/// with the most qualifying sections. Falls back to [`merge_paragraphs`] when
/// no strategy yields at least two sections.
pub fn segment(text: &str) -> Vec<Section> {
    segment_with_config(text, &ParsingConfig::default())
}

/// Config-aware version of [`segment`].
pub fn segment_with_config(text: &str, config: &ParsingConfig) -> Vec<Section> {
    let min = config.min_body_chars;
    let candidates = config
        .strategies()
        .into_iter()
        .filter_map(|strategy| {
            let candidate = candidate_partition(strategy, text, min, config);
            tracing::debug!(
                strategy = strategy.name(),
                sections = candidate.as_ref().map_or(0, |c| c.sections.len()),
                "candidate partition"
            );
            candidate
        })
        .collect::<Vec<_>>();

    match select_partition(candidates) {
        Some(best) => {
            tracing::debug!(strategy = best.strategy.name(), "selected partition");
            best.sections
        }
        None => merge_paragraphs(text, min, config),
    }
}

/// Segment text extracted from a PDF: numbered markers only, with the lower
/// PDF body threshold and the same paragraph-merge fallback.
pub fn segment_pdf_text(text: &str) -> Vec<Section> {
    segment_pdf_text_with_config(text, &ParsingConfig::default())
}

/// Config-aware version of [`segment_pdf_text`].
pub fn segment_pdf_text_with_config(text: &str, config: &ParsingConfig) -> Vec<Section> {
    let min = config.pdf_min_body_chars;
    match candidate_partition(SectionStrategy::Numbered, text, min, config) {
        Some(partition) => partition.sections,
        None => merge_paragraphs(text, min, config),
    }
}

/// Segment a caller-supplied abstract into a single "Full Content" section.
pub fn segment_abstract(text: &str) -> Vec<Section> {
    segment_abstract_with_config(text, &ParsingConfig::default())
}

/// Config-aware version of [`segment_abstract`].
pub fn segment_abstract_with_config(text: &str, config: &ParsingConfig) -> Vec<Section> {
    merge_paragraphs(text, config.abstract_min_paragraph_chars, config)
}

/// Paragraph-merge fallback.
///
/// Splits on blank lines, keeps paragraphs of at least `min_chars` characters
/// and joins them into one section titled [`FULL_CONTENT_TITLE`]. Returns an
/// empty list when no paragraph qualifies.
pub fn merge_paragraphs(text: &str, min_chars: usize, config: &ParsingConfig) -> Vec<Section> {
    let split_re = config
        .paragraph_split_re
        .as_ref()
        .unwrap_or(&PARAGRAPH_SPLIT_RE);

    let kept: Vec<&str> = split_re
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty() && char_count(p) >= min_chars)
        .collect();

    if kept.is_empty() {
        return Vec::new();
    }
    vec![Section::new(FULL_CONTENT_TITLE, kept.join("\n\n"), 1)]
}
