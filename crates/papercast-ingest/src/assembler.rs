use papercast_core::{ContentBundle, Provenance, Section, char_count, word_count};

/// Compose the final bundle.
///
/// `full_text` is the text the sections were cut from. Word and character
/// counts are taken from it, never from the sections, so material between
/// sections still counts.
pub fn assemble_bundle(full_text: String, sections: Vec<Section>, source: Provenance) -> ContentBundle {
    ContentBundle {
        word_count: word_count(&full_text),
        character_count: char_count(&full_text),
        full_text,
        sections,
        source,
    }
}
