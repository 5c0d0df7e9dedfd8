//! Suggestion identity: stable, content-derived keys.
//!
//! The key is a pure function of `(note_id, section_id, type,
//! normalize(title))`, so cosmetically different but semantically identical
//! titles collide on purpose — that is what lets accept/dismiss decisions
//! persist across regenerations.

use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

use crate::types::SuggestionType;

/// Maximum normalized-title length contributing to the key.
const NORMALIZED_TITLE_MAX: usize = 120;

/// Normalize a title: NFKC fold, lowercase, strip punctuation, collapse
/// whitespace, truncate to 120 characters.
pub fn normalize_title(title: &str) -> String {
    let folded: String = title.nfkc().collect();
    let cleaned: String = folded
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(NORMALIZED_TITLE_MAX).collect()
}

/// Compute the stable key for a suggestion.
pub fn compute_suggestion_key(
    note_id: &str,
    section_id: &str,
    kind: SuggestionType,
    title: &str,
) -> String {
    let mut hasher = Sha256::new();
    for part in [note_id, section_id, kind.label(), &normalize_title(title)] {
        hasher.update(part.as_bytes());
        hasher.update(b"|");
    }
    hex::encode(hasher.finalize())
}
