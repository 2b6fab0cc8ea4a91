use thiserror::Error;

pub mod config;
pub mod html;
pub mod quality;
pub mod section;
pub mod text_processing;

pub use config::{ListOverride, ParsingConfig, ParsingConfigBuilder};
pub use html::{sanitize_html, sanitize_html_bytes};
pub use quality::{check_quality, find_redirect_marker};
pub use section::{
    CandidatePartition, FULL_CONTENT_TITLE, SectionStrategy, candidate_partition,
    merge_paragraphs, segment, segment_abstract, segment_abstract_with_config, segment_pdf_text,
    segment_pdf_text_with_config, segment_with_config, select_partition,
};
pub use text_processing::{normalize_pdf_text, normalize_pdf_text_with_config};
// Re-export domain types from core (canonical definitions live there)
pub use papercast_core::{QualityRejection, Section};

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("unknown segmentation strategy: {0}")]
    UnknownStrategy(String),
    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// Build a [`ParsingConfig`] from the `[segmentation]` table of a config file.
///
/// Unset fields keep their defaults; `extra_strategies` are appended after
/// the default chain in the order given.
pub fn parsing_config_from_file(
    file: Option<&papercast_core::config_file::SegmentationFileConfig>,
) -> Result<ParsingConfig, ParsingError> {
    let mut builder = ParsingConfigBuilder::new();
    if let Some(seg) = file {
        if let Some(n) = seg.min_marker_gap {
            builder = builder.min_marker_gap(n);
        }
        if let Some(n) = seg.min_body_chars {
            builder = builder.min_body_chars(n);
        }
        if let Some(n) = seg.pdf_min_body_chars {
            builder = builder.pdf_min_body_chars(n);
        }
        for name in seg.extra_strategies.iter().flatten() {
            let strategy = SectionStrategy::from_name(name)
                .ok_or_else(|| ParsingError::UnknownStrategy(name.clone()))?;
            builder = builder.add_strategy(strategy);
        }
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use papercast_core::config_file::SegmentationFileConfig;

    #[test]
    fn test_config_from_file_defaults() {
        let config = parsing_config_from_file(None).unwrap();
        assert_eq!(config.min_body_chars(), 100);
        assert_eq!(config.strategies().len(), 3);
    }

    #[test]
    fn test_config_from_file_overrides() {
        let seg = SegmentationFileConfig {
            min_marker_gap: Some(5),
            min_body_chars: Some(60),
            pdf_min_body_chars: None,
            extra_strategies: Some(vec!["all_caps".to_string()]),
        };
        let config = parsing_config_from_file(Some(&seg)).unwrap();
        assert_eq!(config.min_marker_gap(), 5);
        assert_eq!(config.min_body_chars(), 60);
        assert_eq!(config.pdf_min_body_chars(), 50);
        assert_eq!(config.strategies().last(), Some(&SectionStrategy::AllCaps));
    }

    #[test]
    fn test_config_from_file_unknown_strategy() {
        let seg = SegmentationFileConfig {
            extra_strategies: Some(vec!["semantic".to_string()]),
            ..Default::default()
        };
        assert!(matches!(
            parsing_config_from_file(Some(&seg)),
            Err(ParsingError::UnknownStrategy(name)) if name == "semantic"
        ));
    }
}
