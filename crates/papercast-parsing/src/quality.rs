use papercast_core::{QualityRejection, char_count};

/// Accept `text` as genuine article content, or say why not.
///
/// Text is rejected when shorter than `min_chars`, or when it contains any of
/// the literal `redirect_markers` (a placeholder page fetched instead of the
/// article). Marker matching is literal and case-sensitive.
pub fn check_quality(
    text: &str,
    min_chars: usize,
    redirect_markers: &[String],
) -> Result<(), QualityRejection> {
    let chars = char_count(text);
    if chars < min_chars {
        return Err(QualityRejection::TooShort {
            chars,
            min: min_chars,
        });
    }
    if let Some(marker) = find_redirect_marker(text, redirect_markers) {
        return Err(QualityRejection::RedirectStub {
            marker: marker.to_string(),
        });
    }
    Ok(())
}

/// First redirect marker phrase contained in `text`, if any.
pub fn find_redirect_marker<'m>(text: &str, redirect_markers: &'m [String]) -> Option<&'m str> {
    redirect_markers
        .iter()
        .find(|m| !m.is_empty() && text.contains(m.as_str()))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use papercast_core::DEFAULT_REDIRECT_MARKERS;

    fn markers() -> Vec<String> {
        DEFAULT_REDIRECT_MARKERS.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn test_accepts_long_clean_text() {
        let text = "word ".repeat(200);
        assert!(check_quality(&text, 500, &markers()).is_ok());
    }

    #[test]
    fn test_rejects_short_text() {
        let err = check_quality("tiny", 500, &markers()).unwrap_err();
        assert_eq!(err, QualityRejection::TooShort { chars: 4, min: 500 });
    }

    #[test]
    fn test_rejects_short_redirect_stub() {
        let stub = "Redirecting to https://arxiv.org/abs/2401.00001 ... \
                    You should be redirected automatically to the target URL.";
        assert!(check_quality(stub, 500, &markers()).is_err());
    }

    #[test]
    fn test_rejects_long_page_with_marker() {
        let text = format!("{} You should be redirected shortly.", "filler ".repeat(100));
        let err = check_quality(&text, 500, &markers()).unwrap_err();
        assert_eq!(
            err,
            QualityRejection::RedirectStub {
                marker: "You should be redirected".into()
            }
        );
    }

    #[test]
    fn test_marker_is_case_sensitive() {
        let text = format!("{} redirecting is discussed here.", "filler ".repeat(100));
        assert!(check_quality(&text, 500, &markers()).is_ok());
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        let text = "é".repeat(300);
        assert!(matches!(
            check_quality(&text, 500, &markers()),
            Err(QualityRejection::TooShort { chars: 300, .. })
        ));
    }
}
