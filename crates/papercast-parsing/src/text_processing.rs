use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::config::ParsingConfig;
use crate::html::collapse_whitespace;

/// Common compound-word suffixes that should keep the hyphen.
pub(crate) static COMPOUND_SUFFIXES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "based",
        "driven",
        "aware",
        "oriented",
        "specific",
        "related",
        "dependent",
        "independent",
        "like",
        "free",
        "scale",
        "level",
        "order",
        "wise",
        "shot",
        "step",
        "time",
        "domain",
        "task",
        "modal",
        "efficient",
        "agnostic",
        "invariant",
        "sensitive",
        "grained",
        "trained",
        "supervised",
    ]
});

/// Expand common typographic ligatures found in PDFs.
pub fn expand_ligatures(text: &str) -> String {
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace(['\u{FB05}', '\u{FB06}'], "st")
}

/// Remove C0/C1 control characters, keeping newlines and tabs.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| c == '\n' || c == '\t' || !c.is_control())
        .collect()
}

/// Repair words split across a line break by a hyphen.
///
/// - `"detec-\ntion"` → `"detection"` (syllable break)
/// - `"data-\ndriven"` → `"data-driven"` (compound word)
/// - `"GPT-\n2. Method"` is left as is (the next line starts with a digit)
///
/// Hyphens followed by a space on the same line ("first- and second-order")
/// are left alone.
pub fn fix_hyphenation(text: &str) -> String {
    fix_hyphenation_with_config(text, &ParsingConfig::default())
}

/// Config-aware version of [`fix_hyphenation`].
pub(crate) fn fix_hyphenation_with_config(text: &str, config: &ParsingConfig) -> String {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w)-[ \t]*\n[ \t]*(\w+)").unwrap());

    let defaults: Vec<String> = COMPOUND_SUFFIXES.iter().map(|s| s.to_string()).collect();
    let suffixes: HashSet<String> = config.compound_suffixes.resolve(&defaults).into_iter().collect();

    RE.replace_all(text, |caps: &regex::Captures| {
        let before = &caps[1];
        let after = &caps[2];

        // A line starting with a digit may be a numbered heading, so the
        // break stays.
        if after.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return format!("{}-\n{}", before, after);
        }
        if before.chars().all(|c| c.is_ascii_digit()) {
            return format!("{}-{}", before, after);
        }
        if suffixes.contains(&after.to_lowercase()) {
            return format!("{}-{}", before, after);
        }
        format!("{}{}", before, after)
    })
    .into_owned()
}

/// Normalize raw PDF text before segmentation.
///
/// Expands ligatures, removes control characters, repairs line-break
/// hyphenation and collapses whitespace the same way sanitized markup is.
pub fn normalize_pdf_text(text: &str) -> String {
    normalize_pdf_text_with_config(text, &ParsingConfig::default())
}

/// Config-aware version of [`normalize_pdf_text`].
pub fn normalize_pdf_text_with_config(text: &str, config: &ParsingConfig) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = expand_ligatures(&text);
    let text = strip_control_chars(&text);
    let text = fix_hyphenation_with_config(&text, config);
    collapse_whitespace(&text)
}
