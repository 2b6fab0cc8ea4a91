//! Hypertext to plain text.
//!
//! Input may be truncated or malformed markup. Output keeps paragraph
//! boundaries only.

use once_cell::sync::Lazy;
use regex::Regex;

/// Convert hypertext markup to normalized plain text.
///
/// Steps, in order:
/// 1. Drop `<script>`/`<style>` blocks and comments wholesale
/// 2. Turn block-closing tags (`</p>`, `</div>`, `</h1>`…`</h6>`, `<br>`) into newlines
/// 3. Strip every remaining tag
/// 4. Decode `&nbsp;`, `&lt;`, `&gt;`, `&quot;`, `&#39;` and `&amp;`
/// 5. Collapse horizontal whitespace and runs of blank lines to one blank line
/// 6. Trim
pub fn sanitize_html(markup: &str) -> String {
    static SCRIPT_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());
    static STYLE_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());
    static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
    static BR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
    static P_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</p\s*>").unwrap());
    static DIV_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</div\s*>").unwrap());
    static HEADING_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</h[1-6]\s*>").unwrap());
    static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

    let text = markup.replace("\r\n", "\n").replace('\r', "\n");

    // 1. Non-content blocks
    let text = SCRIPT_RE.replace_all(&text, "");
    let text = STYLE_RE.replace_all(&text, "");
    let text = COMMENT_RE.replace_all(&text, "");

    // 2. Paragraph boundaries, before tags disappear
    let text = BR_RE.replace_all(&text, "\n");
    let text = P_END_RE.replace_all(&text, "\n\n");
    let text = DIV_END_RE.replace_all(&text, "\n");
    let text = HEADING_END_RE.replace_all(&text, "\n");

    // 3. Remaining tags
    let text = TAG_RE.replace_all(&text, "");

    // 4. Entities
    let text = decode_entities(&text);

    // 5 + 6.
    collapse_whitespace(&text)
}

/// Sanitize a fetched payload, decoding it as lossy UTF-8.
pub fn sanitize_html_bytes(bytes: &[u8]) -> String {
    sanitize_html(&String::from_utf8_lossy(bytes))
}

/// Decode the fixed entity whitelist. `&amp;` goes last so `&amp;lt;`
/// decodes to the literal `&lt;` rather than `<`.
pub fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Collapse spaces/tabs within lines, trim line ends, squeeze blank-line runs
/// to a single blank line and trim the result.
pub fn collapse_whitespace(text: &str) -> String {
    static HSPACE_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[ \t\u{00A0}\u{000B}\u{000C}]+").unwrap());
    static LINE_EDGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" ?\n ?").unwrap());
    static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

    let text = HSPACE_RE.replace_all(text, " ");
    let text = LINE_EDGE_RE.replace_all(&text, "\n");
    let text = BLANK_RUN_RE.replace_all(&text, "\n\n");
    text.trim().to_string()
}
