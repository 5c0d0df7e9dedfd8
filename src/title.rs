//! Title quality contract: deterministic title normalization.
//!
//! Strips hedge/filler prefixes, dedupes leading verbs, upgrades weak verbs
//! before concrete objects, drops trailing deadline phrases, and infers a
//! strong leading verb from noun-phrase shape. A separate contract check
//! rejects titles made of nothing but pronouns and generic words,
//! substituting a fallback built from the first concrete token in evidence —
//! never invented content.

use crate::patterns::{
    first_word, re_trailing_deadline, ACTION_VERBS, FILLER_PREFIXES, GENERIC_TITLE_WORDS,
    TITLE_STOPWORDS, WEAK_VERB_MAP,
};
use crate::types::EvidenceSpan;

/// Maximum title length; truncation happens at a word boundary.
pub const MAX_TITLE_LEN: usize = 80;

/// Uppercase the first character.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Strip an ASCII prefix case-insensitively, comparing against the original
/// string. Byte arithmetic on a lowercased copy is not safe here: lowercasing
/// can change byte length (U+0130 grows from 2 to 3 bytes), so slice offsets
/// taken from the copy can land mid-char or past the end of the original.
fn strip_prefix_ignore_ascii_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() < prefix.len() || !s.is_char_boundary(prefix.len()) {
        return None;
    }
    if s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

/// Truncate to `max` characters at a word boundary, no ellipsis.
pub fn truncate_words(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    for word in text.split_whitespace() {
        if out.is_empty() {
            if word.len() >= max {
                return word.chars().take(max).collect();
            }
            out.push_str(word);
        } else {
            if out.len() + 1 + word.len() > max {
                break;
            }
            out.push(' ');
            out.push_str(word);
        }
    }
    out
}

/// Deterministic title polish. Idempotent: polishing a polished title is a
/// no-op.
pub fn polish(raw: &str) -> String {
    let mut title = raw.trim().trim_end_matches(['.', ',', ';', ':']).to_string();

    // 1. Strip filler prefixes, repeatedly — "Suggestion: maybe we could add"
    // sheds two layers.
    loop {
        let mut stripped = false;
        for prefix in FILLER_PREFIXES {
            if let Some(rest) = strip_prefix_ignore_ascii_case(&title, prefix) {
                title = rest.trim_start().to_string();
                stripped = true;
                break;
            }
        }
        if !stripped {
            break;
        }
    }

    // 2. Dedupe a doubled leading verb produced by filler stripping.
    let words: Vec<&str> = title.split_whitespace().collect();
    if words.len() >= 2 && words[0].to_lowercase() == words[1].to_lowercase() {
        title = words[1..].join(" ");
    }

    // 3. Weak verb upgrade, only before a concrete object.
    for (weak, strong) in WEAK_VERB_MAP {
        let prefix = format!("{} ", weak);
        if let Some(rest) = strip_prefix_ignore_ascii_case(&title, &prefix) {
            let rest = rest.trim_start();
            let next = first_word(rest);
            if !matches!(next.as_str(), "whether" | "if" | "how") {
                title = format!("{} {}", strong, rest);
            }
            break;
        }
    }

    // 4. Trailing deadline phrases carry no roadmap content.
    title = re_trailing_deadline().replace(&title, "").to_string();

    // 5. No leading verb: infer one from noun-phrase shape.
    if !ACTION_VERBS.contains(&first_word(&title).as_str()) {
        title = verb_from_noun_phrase(&title);
    }

    truncate_words(&capitalize(title.trim()), MAX_TITLE_LEN)
}

/// Turn a verbless noun phrase into a verb-led title.
fn verb_from_noun_phrase(title: &str) -> String {
    for (suffix, verb) in [
        (" improvements", "Improve"),
        (" improvement", "Improve"),
        (" automation", "Automate"),
        (" redesign", "Redesign"),
        (" cleanup", "Clean up"),
        (" consolidation", "Consolidate"),
    ] {
        let Some(cut) = title.len().checked_sub(suffix.len()) else {
            continue;
        };
        if cut > 0
            && title.is_char_boundary(cut)
            && title[cut..].eq_ignore_ascii_case(suffix)
        {
            return format!("{} {}", verb, &title[..cut]);
        }
    }
    title.to_string()
}

/// Contract check: a title whose content is dominated by pronouns and
/// generic words is replaced with a deterministic fallback from evidence.
pub fn enforce_contract(title: &str, evidence: &[EvidenceSpan]) -> String {
    let mut content = title.trim().to_string();
    for prefix in ["update:", "idea:", "project update:", "risk:", "bug:"] {
        if let Some(rest) = strip_prefix_ignore_ascii_case(&content, prefix) {
            content = rest.trim_start().to_string();
        }
    }

    let meaningful = content
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .skip_while(|w| TITLE_STOPWORDS.contains(&w.as_str()))
        .filter(|w| !w.is_empty())
        .any(|w| !GENERIC_TITLE_WORDS.contains(&w.as_str()));

    if meaningful {
        return title.to_string();
    }

    // Fallback from the first concrete evidence token, never invented text.
    let token = evidence
        .iter()
        .flat_map(|span| span.text.split_whitespace())
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .find(|w| w.len() >= 4 && !GENERIC_TITLE_WORDS.contains(&w.to_lowercase().as_str()));

    match token {
        Some(t) => capitalize(&format!("Follow up on {}", t.to_lowercase())),
        None => "Follow up on note".to_string(),
    }
}
