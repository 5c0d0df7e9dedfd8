//! Sentence-level "b-signal" extractors.
//!
//! A b-signal is a lightweight, independent signal evaluated on a single
//! sentence. The same extractor family serves two callers: the actionability
//! gate's rescue check (a below-threshold section with one firing b-signal is
//! still actionable) and the dense-paragraph fallback, which re-runs the
//! extractors per sentence so multiple distinct signals in one flat paragraph
//! do not collapse into a single suggestion.
//!
//! Grounding invariant: each signal's sentence is carved out of the source
//! text by byte range, so its evidence text is always a verbatim substring of
//! the section's raw text.

use crate::patterns::{
    self, contains_any, re_change_pattern, re_hedge_directive, re_implicit_need, re_implicit_pain,
    re_pm_request, starts_with_action_verb, strip_list_marker, CHANGE_OPERATORS, COMPLETION_WORDS,
    DECISION_MARKERS, NEGATION_PHRASES, SPEC_FRAMEWORK_HEADING_WORDS, STRATEGY_HEADING_WORDS,
    TIMELINE_HEADING_WORDS,
};
use crate::types::{Section, SuggestionType};

/// One firing b-signal: a sentence plus the rule that matched it.
#[derive(Debug, Clone)]
pub struct SentenceSignal {
    pub rule: &'static str,
    pub confidence: f64,
    pub sentence_index: usize,
    pub sentence: String,
    pub proposed_type: SuggestionType,
    /// Evaluated on the sentence alone, never inherited from siblings.
    pub has_concrete_delta: bool,
}

/// Ordered extractor table. First match wins for a sentence.
struct Extractor {
    name: &'static str,
    confidence: f64,
    proposed_type: SuggestionType,
    matches: fn(&str) -> bool,
}

const EXTRACTORS: &[Extractor] = &[
    Extractor {
        name: "schedule_shift",
        confidence: 0.8,
        proposed_type: SuggestionType::ProjectUpdate,
        matches: |s| re_change_pattern().is_match(s),
    },
    Extractor {
        name: "decision",
        confidence: 0.7,
        proposed_type: SuggestionType::ProjectUpdate,
        matches: |s| contains_any(s, DECISION_MARKERS),
    },
    Extractor {
        name: "hedge_directive",
        confidence: 0.9,
        proposed_type: SuggestionType::Idea,
        matches: |s| re_hedge_directive().is_match(s),
    },
    Extractor {
        name: "pm_request",
        confidence: 0.76,
        proposed_type: SuggestionType::Idea,
        matches: |s| re_pm_request().is_match(s),
    },
    Extractor {
        name: "implicit_pain",
        confidence: 0.76,
        proposed_type: SuggestionType::Idea,
        matches: |s| re_implicit_pain().is_match(s),
    },
    Extractor {
        name: "imperative",
        confidence: 0.72,
        proposed_type: SuggestionType::Idea,
        matches: starts_with_action_verb,
    },
    Extractor {
        name: "implicit_need",
        confidence: 0.61,
        proposed_type: SuggestionType::Idea,
        matches: |s| re_implicit_need().is_match(s) && !contains_any(s, COMPLETION_WORDS),
    },
];

/// Run the extractor table over one sentence. Negated sentences never fire.
pub fn scan_sentence(sentence: &str) -> Option<(&'static str, f64, SuggestionType)> {
    let stripped = strip_list_marker(sentence).trim();
    if stripped.is_empty() || contains_any(stripped, NEGATION_PHRASES) {
        return None;
    }
    for ex in EXTRACTORS {
        if (ex.matches)(stripped) {
            // A change-operator imperative is a mutation, not an idea.
            if ex.name == "imperative"
                && CHANGE_OPERATORS.contains(&patterns::first_word(stripped).as_str())
            {
                return Some((ex.name, 0.8, SuggestionType::ProjectUpdate));
            }
            return Some((ex.name, ex.confidence, ex.proposed_type));
        }
    }
    None
}

/// Split text into sentences on terminal punctuation. A fragment beginning
/// with a lowercase letter is merged back into the previous sentence, which
/// keeps abbreviations and quoted tails intact. Returned sentences are
/// verbatim (trimmed) slices of the input.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c == '.' || c == '?' || c == '!' || c == '\n' {
            let end = i + 1;
            if text[start..end].trim().len() > 0 {
                ranges.push((start, end));
            }
            start = end;
        }
        i += 1;
    }
    if start < text.len() && !text[start..].trim().is_empty() {
        ranges.push((start, text.len()));
    }

    // Merge fragments that begin with a lowercase letter into the previous range.
    let mut merged: Vec<(usize, usize)> = Vec::new();
    for (s, e) in ranges {
        let first_alpha = text[s..e].trim_start().chars().next();
        let lowercase_start = first_alpha.map(|c| c.is_lowercase()).unwrap_or(false);
        match merged.last_mut() {
            // Never merge across a line break.
            Some(prev) if lowercase_start && !text[prev.0..prev.1].ends_with('\n') => {
                prev.1 = e;
            }
            _ => merged.push((s, e)),
        }
    }

    merged
        .into_iter()
        .map(|(s, e)| text[s..e].trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Scan a section's body lines for the strongest b-signal. Used by the
/// actionability gate's rescue check.
pub fn best_line_signal(section: &Section) -> Option<SentenceSignal> {
    let mut best: Option<SentenceSignal> = None;
    for (idx, line) in section.body_lines.iter().enumerate() {
        for sentence in split_sentences(line) {
            if let Some((rule, confidence, proposed_type)) = scan_sentence(&sentence) {
                let better = best
                    .as_ref()
                    .map(|b| confidence > b.confidence)
                    .unwrap_or(true);
                if better {
                    best = Some(SentenceSignal {
                        rule,
                        confidence,
                        sentence_index: idx,
                        has_concrete_delta: patterns::has_concrete_delta(&sentence),
                        sentence,
                        proposed_type,
                    });
                }
            }
        }
    }
    best
}

/// Whether the dense-paragraph fallback applies to this section: no list
/// structure, either a single line or a long run of text, and no recognized
/// topic-anchor phrases (spec/strategy/timeline vocabulary).
pub fn dense_trigger(section: &Section, min_chars: usize) -> bool {
    if section.features.num_list_items > 0 {
        return false;
    }
    let single_line = section.features.num_lines == 1;
    let long = section.raw_text.len() >= min_chars;
    if !single_line && !long {
        return false;
    }
    let anchored = contains_any(&section.heading_text, TIMELINE_HEADING_WORDS)
        || contains_any(&section.heading_text, STRATEGY_HEADING_WORDS)
        || contains_any(&section.heading_text, SPEC_FRAMEWORK_HEADING_WORDS);
    !anchored
}

/// Dense extraction: one candidate signal per firing sentence, deduplicated
/// by `(sentence index, proposed type)` keeping the highest confidence.
pub fn extract_dense(section: &Section) -> Vec<SentenceSignal> {
    let mut signals: Vec<SentenceSignal> = Vec::new();
    for (idx, sentence) in split_sentences(&section.raw_text).iter().enumerate() {
        // Never extract from the heading line itself.
        if sentence.starts_with('#') {
            continue;
        }
        if let Some((rule, confidence, proposed_type)) = scan_sentence(sentence) {
            let dup = signals
                .iter_mut()
                .find(|s| s.sentence_index == idx && s.proposed_type == proposed_type);
            match dup {
                Some(existing) if existing.confidence >= confidence => {}
                Some(existing) => {
                    existing.rule = rule;
                    existing.confidence = confidence;
                    existing.sentence = sentence.clone();
                }
                None => signals.push(SentenceSignal {
                    rule,
                    confidence,
                    sentence_index: idx,
                    sentence: sentence.clone(),
                    proposed_type,
                    has_concrete_delta: patterns::has_concrete_delta(sentence),
                }),
            }
        }
    }
    signals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::segment_note;

    fn section(md: &str) -> Section {
        segment_note("n1", md).remove(0)
    }

    #[test]
    fn splits_on_terminal_punctuation() {
        let s = split_sentences("First point. Second point? Third point!");
        assert_eq!(s.len(), 3);
        assert_eq!(s[0], "First point.");
    }

    #[test]
    fn lowercase_fragment_merges_into_previous() {
        let s = split_sentences("We shipped v2. e.g. the exporter works now.");
        // "g. the exporter..." fragments fold back into their predecessors.
        assert!(s.iter().all(|x| !x.starts_with("g.")));
    }

    #[test]
    fn sentences_are_verbatim_substrings() {
        let text = "Users need better error visibility. Ping me about the offsite.";
        for s in split_sentences(text) {
            assert!(text.contains(&s), "'{}' not a substring", s);
        }
    }

    #[test]
    fn pm_request_fires_at_point_seven_six() {
        let got = scan_sentence("Users need better error visibility when background jobs fail silently.");
        let (rule, conf, ty) = got.expect("signal fires");
        assert_eq!(rule, "pm_request");
        assert!((conf - 0.76).abs() < f64::EPSILON);
        assert_eq!(ty, SuggestionType::Idea);
    }

    #[test]
    fn complaint_and_direct_request_phrasings_fire_pm_request() {
        let got = scan_sentence("Users keep reporting that the export flow loses formatting.");
        let (rule, _, ty) = got.expect("signal fires");
        assert_eq!(rule, "pm_request");
        assert_eq!(ty, SuggestionType::Idea);

        let got = scan_sentence("Can you put together a rollout checklist for the fix?");
        let (rule, _, _) = got.expect("signal fires");
        assert_eq!(rule, "pm_request");
    }

    #[test]
    fn negation_zeroes_the_sentence() {
        assert!(scan_sentence("We are not going to build the exporter.").is_none());
        assert!(scan_sentence("Don't move the launch date.").is_none());
    }

    #[test]
    fn schedule_shift_proposes_update() {
        let (rule, _, ty) =
            scan_sentence("Move the launch from the 12th to the 19th.").expect("fires");
        assert_eq!(rule, "schedule_shift");
        assert_eq!(ty, SuggestionType::ProjectUpdate);
    }

    #[test]
    fn dense_trigger_needs_no_lists_and_no_anchor() {
        let dense = section("# Notes\nOne long paragraph without structure that keeps going and going, covering several independent points about the product in a single unbroken block of prose, which is exactly the shape the dense fallback exists for because section-level synthesis would flatten it all into one suggestion.\n");
        assert!(dense_trigger(&dense, 250));

        let listed = section("# Notes\n- bullet one\n- bullet two\n");
        assert!(!dense_trigger(&listed, 250));

        let anchored = section("# Timeline\nSingle line of schedule prose.\n");
        assert!(!dense_trigger(&anchored, 250));
    }

    #[test]
    fn dense_extraction_keeps_distinct_signals_apart() {
        let s = section(
            "# Notes\nUsers need better error visibility when background jobs fail silently. We should automate the weekly report. Move the beta from the 3rd to the 10th.\n",
        );
        let signals = extract_dense(&s);
        assert!(signals.len() >= 3, "got {:?}", signals);
        // Per-sentence delta eligibility is independent.
        let shift = signals.iter().find(|x| x.rule == "schedule_shift").unwrap();
        assert!(shift.has_concrete_delta);
        let req = signals.iter().find(|x| x.rule == "pm_request").unwrap();
        assert!(!req.has_concrete_delta);
    }

    #[test]
    fn dense_evidence_is_verbatim_in_raw_text() {
        let s = section(
            "# Notes\nCustomers need a way to export audit logs for compliance reviews. We should streamline the signup flow by removing two steps.\n",
        );
        for sig in extract_dense(&s) {
            assert!(
                s.raw_text.to_lowercase().contains(&sig.sentence.to_lowercase()),
                "'{}' not grounded",
                sig.sentence
            );
        }
    }
}
