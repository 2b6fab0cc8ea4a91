use regex::Regex;

use crate::section::SectionStrategy;

/// Controls how a list of patterns/values is overridden from its defaults.
#[derive(Debug, Clone)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T> Default for ListOverride<T> {
    fn default() -> Self {
        ListOverride::Default
    }
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }
}

/// Configuration for sanitizing and segmenting document text.
///
/// All regex fields are `Option<Regex>`; `None` means "use the built-in default".
/// Use [`ParsingConfigBuilder`] to construct with string patterns.
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    // ── section.rs: marker patterns (capture group 1 is the title) ──
    pub(crate) numbered_marker_re: Option<Regex>,
    pub(crate) roman_marker_re: Option<Regex>,
    pub(crate) keyword_marker_re: Option<Regex>,
    pub(crate) all_caps_marker_re: Option<Regex>,
    /// Regex separating paragraphs for the merge fallback.
    pub(crate) paragraph_split_re: Option<Regex>,

    // ── section.rs: thresholds ──
    /// Minimum distance between the end of one kept marker and the start of the next.
    pub(crate) min_marker_gap: usize,
    /// Minimum body length for the general-purpose path.
    pub(crate) min_body_chars: usize,
    /// Minimum body length for the PDF-only path.
    pub(crate) pdf_min_body_chars: usize,
    /// Minimum paragraph length when segmenting a caller-supplied abstract.
    pub(crate) abstract_min_paragraph_chars: usize,
    /// Heuristics tried by the general-purpose path, in priority order.
    pub(crate) strategies: ListOverride<SectionStrategy>,

    // ── text_processing.rs ──
    /// Compound-word suffixes that should preserve the hyphen.
    pub(crate) compound_suffixes: ListOverride<String>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            numbered_marker_re: None,
            roman_marker_re: None,
            keyword_marker_re: None,
            all_caps_marker_re: None,
            paragraph_split_re: None,
            min_marker_gap: 20,
            min_body_chars: 100,
            pdf_min_body_chars: 50,
            abstract_min_paragraph_chars: 1,
            strategies: ListOverride::Default,
            compound_suffixes: ListOverride::Default,
        }
    }
}

impl ParsingConfig {
    pub fn min_marker_gap(&self) -> usize {
        self.min_marker_gap
    }

    pub fn min_body_chars(&self) -> usize {
        self.min_body_chars
    }

    pub fn pdf_min_body_chars(&self) -> usize {
        self.pdf_min_body_chars
    }

    pub fn abstract_min_paragraph_chars(&self) -> usize {
        self.abstract_min_paragraph_chars
    }

    /// The general-purpose strategy chain, in priority order.
    pub fn strategies(&self) -> Vec<SectionStrategy> {
        self.strategies.resolve(&SectionStrategy::DEFAULT_CHAIN)
    }
}

/// Builder for [`ParsingConfig`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build).
/// Fails fast with `regex::Error` if any pattern is invalid.
#[derive(Debug, Clone, Default)]
pub struct ParsingConfigBuilder {
    numbered_marker_re: Option<String>,
    roman_marker_re: Option<String>,
    keyword_marker_re: Option<String>,
    all_caps_marker_re: Option<String>,
    paragraph_split_re: Option<String>,
    min_marker_gap: Option<usize>,
    min_body_chars: Option<usize>,
    pdf_min_body_chars: Option<usize>,
    abstract_min_paragraph_chars: Option<usize>,
    strategies: ListOverride<SectionStrategy>,
    compound_suffixes: ListOverride<String>,
}

impl ParsingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Marker patterns ──

    pub fn numbered_marker_regex(mut self, pattern: &str) -> Self {
        self.numbered_marker_re = Some(pattern.to_string());
        self
    }

    pub fn roman_marker_regex(mut self, pattern: &str) -> Self {
        self.roman_marker_re = Some(pattern.to_string());
        self
    }

    pub fn keyword_marker_regex(mut self, pattern: &str) -> Self {
        self.keyword_marker_re = Some(pattern.to_string());
        self
    }

    pub fn all_caps_marker_regex(mut self, pattern: &str) -> Self {
        self.all_caps_marker_re = Some(pattern.to_string());
        self
    }

    pub fn paragraph_split_regex(mut self, pattern: &str) -> Self {
        self.paragraph_split_re = Some(pattern.to_string());
        self
    }

    // ── Thresholds ──

    pub fn min_marker_gap(mut self, n: usize) -> Self {
        self.min_marker_gap = Some(n);
        self
    }

    pub fn min_body_chars(mut self, n: usize) -> Self {
        self.min_body_chars = Some(n);
        self
    }

    pub fn pdf_min_body_chars(mut self, n: usize) -> Self {
        self.pdf_min_body_chars = Some(n);
        self
    }

    pub fn abstract_min_paragraph_chars(mut self, n: usize) -> Self {
        self.abstract_min_paragraph_chars = Some(n);
        self
    }

    // ── Strategy chain ──

    pub fn set_strategies(mut self, strategies: Vec<SectionStrategy>) -> Self {
        self.strategies = ListOverride::Replace(strategies);
        self
    }

    pub fn add_strategy(mut self, strategy: SectionStrategy) -> Self {
        match &mut self.strategies {
            ListOverride::Extend(v) => v.push(strategy),
            _ => self.strategies = ListOverride::Extend(vec![strategy]),
        }
        self
    }

    // ── Compound suffixes ──

    pub fn set_compound_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.compound_suffixes = ListOverride::Replace(suffixes);
        self
    }

    pub fn add_compound_suffix(mut self, suffix: String) -> Self {
        match &mut self.compound_suffixes {
            ListOverride::Extend(v) => v.push(suffix),
            _ => self.compound_suffixes = ListOverride::Extend(vec![suffix]),
        }
        self
    }

    /// Compile all string patterns into regexes and produce a [`ParsingConfig`].
    pub fn build(self) -> Result<ParsingConfig, regex::Error> {
        let compile = |opt: Option<String>| -> Result<Option<Regex>, regex::Error> {
            opt.map(|p| Regex::new(&p)).transpose()
        };
        let defaults = ParsingConfig::default();

        Ok(ParsingConfig {
            numbered_marker_re: compile(self.numbered_marker_re)?,
            roman_marker_re: compile(self.roman_marker_re)?,
            keyword_marker_re: compile(self.keyword_marker_re)?,
            all_caps_marker_re: compile(self.all_caps_marker_re)?,
            paragraph_split_re: compile(self.paragraph_split_re)?,
            min_marker_gap: self.min_marker_gap.unwrap_or(defaults.min_marker_gap),
            min_body_chars: self.min_body_chars.unwrap_or(defaults.min_body_chars),
            pdf_min_body_chars: self
                .pdf_min_body_chars
                .unwrap_or(defaults.pdf_min_body_chars),
            abstract_min_paragraph_chars: self
                .abstract_min_paragraph_chars
                .unwrap_or(defaults.abstract_min_paragraph_chars),
            strategies: self.strategies,
            compound_suffixes: self.compound_suffixes,
        })
    }
}
