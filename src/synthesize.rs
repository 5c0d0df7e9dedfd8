//! Synthesizer: turns a classified section (or a single b-signal sentence)
//! into a candidate suggestion with a title, a standalone body, a payload,
//! and grounded evidence spans.
//!
//! Title and body follow the same priority chain: proposal line first for
//! ideas, then friction/solution shaping, then heading- or key-noun-based
//! fallbacks. Evidence spans merge contiguous lines (index gap of at most 2)
//! into one span.

use crate::bsignal::{split_sentences, SentenceSignal};
use crate::idgen::IdAllocator;
use crate::identity::compute_suggestion_key;
use crate::patterns::{
    contains_any, first_match, has_concrete_delta, re_by_gerund, re_change_pattern,
    re_list_marker, re_pm_request, starts_with_action_verb, strip_list_marker, FRICTION_WORDS,
    PRODUCT_NOUNS,
};
use crate::title::{capitalize, truncate_words, MAX_TITLE_LEN};
use crate::types::{
    Candidate, CandidateSource, ClassifiedSection, EvidenceSpan, Section, Suggestion,
    SuggestionContext, SuggestionPayload, SuggestionRouting, SuggestionScores, SuggestionType,
};

/// Maximum body length; longer bodies end with an ellipsis.
pub const MAX_BODY_LEN: usize = 300;

/// Fixed synthesis confidence for rule-based generation.
const SYNTHESIS_CONFIDENCE: f64 = 0.7;

/// Synthesize one candidate from a whole classified section.
///
/// Callers guarantee the section is actionable with a resolved type label.
pub fn synthesize_section(cs: &ClassifiedSection, alloc: &mut IdAllocator) -> Candidate {
    let section = &cs.section;
    let kind = cs
        .type_decision
        .type_label
        .unwrap_or(SuggestionType::Idea);

    let title = match kind {
        SuggestionType::Idea => idea_title(section),
        _ => update_title(section),
    };
    let body = match kind {
        SuggestionType::Idea => idea_body(section),
        _ => update_body(section),
    };
    let evidence = extract_evidence(section, kind);
    let payload = build_payload(kind, &title, &body, section);

    let scores = SuggestionScores {
        section_actionability: cs.intent.actionable_signal(),
        type_choice_confidence: cs.type_decision.type_confidence,
        synthesis_confidence: SYNTHESIS_CONFIDENCE,
        overall: 0.0,
    };

    let suggestion = build_suggestion(section, kind, title, body, evidence, payload, scores, alloc);
    Candidate {
        has_concrete_delta: has_concrete_delta(&section.raw_text),
        section_actionable: cs.actionability.actionable,
        intent_label: cs.intent.label(),
        source: CandidateSource::SectionSynthesis,
        suggestion,
    }
}

/// Synthesize one candidate from a single firing b-signal sentence.
///
/// The evidence span is exactly the sentence, verbatim — the grounding
/// invariant for sentence-sourced suggestions.
pub fn synthesize_from_signal(
    cs: &ClassifiedSection,
    signal: &SentenceSignal,
    alloc: &mut IdAllocator,
) -> Candidate {
    let section = &cs.section;
    let kind = signal.proposed_type;

    let title = trim_title(&signal.sentence);
    let body = cap_body(signal.sentence.trim());
    let evidence = vec![sentence_span(section, &signal.sentence)];
    let payload = build_payload(kind, &title, &body, section);

    let scores = SuggestionScores {
        section_actionability: cs.intent.actionable_signal().max(signal.confidence),
        type_choice_confidence: signal.confidence,
        synthesis_confidence: SYNTHESIS_CONFIDENCE,
        overall: 0.0,
    };

    let suggestion = build_suggestion(section, kind, title, body, evidence, payload, scores, alloc);
    Candidate {
        has_concrete_delta: signal.has_concrete_delta,
        section_actionable: cs.actionability.actionable,
        intent_label: cs.intent.label(),
        source: CandidateSource::BSignal {
            sentence_index: signal.sentence_index,
        },
        suggestion,
    }
}

/// Shared suggestion assembly.
#[allow(clippy::too_many_arguments)]
pub fn build_suggestion(
    section: &Section,
    kind: SuggestionType,
    title: String,
    body: String,
    evidence: Vec<EvidenceSpan>,
    payload: SuggestionPayload,
    scores: SuggestionScores,
    alloc: &mut IdAllocator,
) -> Suggestion {
    let suggestion_key =
        compute_suggestion_key(&section.note_id, &section.section_id, kind, &title);
    let evidence_preview = evidence
        .first()
        .map(|s| truncate_words(&s.text, 160));
    Suggestion {
        suggestion_id: alloc.next_suggestion_id(),
        note_id: section.note_id.clone(),
        section_id: section.section_id.clone(),
        kind,
        context: SuggestionContext {
            title: title.clone(),
            body: body.clone(),
            evidence_preview,
            source_section_id: section.section_id.clone(),
            source_heading: section.heading_text.clone(),
        },
        title,
        payload,
        evidence_spans: evidence,
        scores,
        routing: SuggestionRouting {
            create_new: kind == SuggestionType::Idea,
        },
        suggestion_key,
        is_high_confidence: true,
        needs_clarification: None,
    }
}

// ---------------------------------------------------------------------------
// Titles
// ---------------------------------------------------------------------------

/// First proposal line of a section: a sentence that opens with a
/// solution-oriented verb or carries a `by <gerund>` construction.
pub fn proposal_line(section: &Section) -> Option<String> {
    for line in &section.body_lines {
        for sentence in split_sentences(strip_list_marker(line)) {
            if starts_with_action_verb(&sentence) || re_by_gerund().is_match(&sentence) {
                return Some(sentence);
            }
        }
    }
    None
}

fn idea_title(section: &Section) -> String {
    if let Some(proposal) = proposal_line(section) {
        return trim_title(&proposal);
    }
    // Friction/complaint with a recognizable target: synthesize a
    // solution-shaped title.
    if contains_any(&section.raw_text, FRICTION_WORDS) {
        if let Some(noun) = first_match(&section.raw_text, PRODUCT_NOUNS) {
            return capitalize(&format!("Reduce steps to complete {}", noun));
        }
    }
    if !section.heading_text.is_empty() {
        return trim_title(&section.heading_text);
    }
    key_noun_title(section, "Improve")
}

fn update_title(section: &Section) -> String {
    if !section.heading_text.is_empty() {
        return truncate_words(&format!("Update {}", section.heading_text), MAX_TITLE_LEN);
    }
    if let Some(m) = re_change_pattern().find(&section.raw_text) {
        return trim_title(m.as_str());
    }
    key_noun_title(section, "Update")
}

fn key_noun_title(section: &Section, verb: &str) -> String {
    match first_match(&section.raw_text, PRODUCT_NOUNS) {
        Some(noun) => capitalize(&format!("{} {}", verb, noun)),
        None => capitalize(&format!("{} this workstream", verb)),
    }
}

fn trim_title(text: &str) -> String {
    let clean = text.trim().trim_end_matches(['.', '!', '?', ',', ';']);
    truncate_words(&capitalize(clean), MAX_TITLE_LEN)
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

fn idea_body(section: &Section) -> String {
    if let Some(proposal) = proposal_line(section) {
        return cap_body(&proposal);
    }
    if contains_any(&section.raw_text, FRICTION_WORDS) {
        if let Some(pain) = sentence_where(section, |s| contains_any(s, FRICTION_WORDS)) {
            return cap_body(&pain);
        }
    }
    // Problem/solution/purpose extraction, then imperative-prioritized
    // sentence fallback.
    let problem = sentence_where(section, |s| re_pm_request().is_match(s));
    let solution = sentence_where(section, |s| starts_with_action_verb(s));
    match (problem, solution) {
        (Some(p), Some(s)) => cap_body(&format!("{} {}", p, s)),
        (Some(p), None) => cap_body(&p),
        (None, Some(s)) => cap_body(&s),
        (None, None) => first_sentence_body(section),
    }
}

fn update_body(section: &Section) -> String {
    // Prefer the sentences that carry the change itself.
    let mut parts: Vec<String> = Vec::new();
    for line in &section.body_lines {
        for sentence in split_sentences(strip_list_marker(line)) {
            if re_change_pattern().is_match(&sentence) || has_concrete_delta(&sentence) {
                parts.push(sentence);
            }
        }
        if parts.len() >= 3 {
            break;
        }
    }
    if parts.is_empty() {
        return first_sentence_body(section);
    }
    cap_body(&parts.join(" "))
}

fn sentence_where(section: &Section, pred: impl Fn(&str) -> bool) -> Option<String> {
    for line in &section.body_lines {
        for sentence in split_sentences(strip_list_marker(line)) {
            if pred(&sentence) {
                return Some(sentence);
            }
        }
    }
    None
}

fn first_sentence_body(section: &Section) -> String {
    // Imperative sentences outrank narration.
    if let Some(imp) = sentence_where(section, |s| starts_with_action_verb(s)) {
        return cap_body(&imp);
    }
    match section
        .body_lines
        .first()
        .and_then(|l| split_sentences(strip_list_marker(l)).into_iter().next())
    {
        Some(s) => cap_body(&s),
        None => cap_body(&section.heading_text),
    }
}

/// Cap a body at `MAX_BODY_LEN` characters with an ellipsis.
pub fn cap_body(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.len() <= MAX_BODY_LEN {
        return trimmed.to_string();
    }
    let mut cut = truncate_words(trimmed, MAX_BODY_LEN - 1);
    cut.push('…');
    cut
}

// ---------------------------------------------------------------------------
// Evidence
// ---------------------------------------------------------------------------

/// Extract evidence spans for a section-level candidate. Preference order:
/// proposal lines (ideas), then list items, then paragraph lines. Lines with
/// an index gap of at most 2 merge into one span.
pub fn extract_evidence(section: &Section, kind: SuggestionType) -> Vec<EvidenceSpan> {
    let numbered = numbered_body_lines(section);
    if numbered.is_empty() {
        return Vec::new();
    }

    let mut selected: Vec<(usize, String)> = Vec::new();
    if kind == SuggestionType::Idea {
        for (no, line) in &numbered {
            if starts_with_action_verb(strip_list_marker(line)) || re_by_gerund().is_match(line) {
                selected.push((*no, line.clone()));
            }
        }
    }
    if selected.is_empty() {
        for (no, line) in &numbered {
            if re_list_marker().is_match(line) {
                selected.push((*no, line.clone()));
            }
        }
    }
    if selected.is_empty() {
        selected = numbered;
    }

    merge_contiguous(selected)
}

/// Map body lines to absolute note line numbers by walking the raw text.
fn numbered_body_lines(section: &Section) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut body_iter = section.body_lines.iter().peekable();
    for (offset, raw_line) in section.raw_text.lines().enumerate() {
        if let Some(next) = body_iter.peek() {
            if raw_line == next.as_str() {
                out.push((section.start_line + offset, raw_line.to_string()));
                body_iter.next();
            }
        }
    }
    out
}

/// Merge selected lines whose line numbers are within 2 of each other.
fn merge_contiguous(selected: Vec<(usize, String)>) -> Vec<EvidenceSpan> {
    let mut spans: Vec<EvidenceSpan> = Vec::new();
    for (no, text) in selected {
        match spans.last_mut() {
            Some(span) if no <= span.end_line + 2 => {
                span.end_line = no;
                span.text.push('\n');
                span.text.push_str(&text);
            }
            _ => spans.push(EvidenceSpan {
                start_line: no,
                end_line: no,
                text,
            }),
        }
    }
    spans
}

/// Single-sentence evidence span for a b-signal candidate. The text is the
/// verbatim sentence; line numbers come from its position in the raw text.
pub fn sentence_span(section: &Section, sentence: &str) -> EvidenceSpan {
    let offset = section
        .raw_text
        .find(sentence.trim())
        .map(|byte| section.raw_text[..byte].matches('\n').count())
        .unwrap_or(0);
    let line = section.start_line + offset;
    EvidenceSpan {
        start_line: line,
        end_line: line,
        text: sentence.trim().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Build the type-specific payload from objective/scope fragments with a
/// sentence fallback.
pub fn build_payload(
    kind: SuggestionType,
    title: &str,
    body: &str,
    section: &Section,
) -> SuggestionPayload {
    match kind {
        SuggestionType::ProjectUpdate => SuggestionPayload::AfterDescription {
            after_description: if body.is_empty() {
                cap_body(&section.raw_text)
            } else {
                body.to_string()
            },
        },
        _ => SuggestionPayload::DraftInitiative {
            title: title.to_string(),
            description: body.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::intent::score_intent;
    use crate::segmenter::segment_note;

    fn classify(md: &str) -> ClassifiedSection {
        let section = segment_note("n1", md).remove(0);
        let intent = score_intent(&section);
        let actionability = crate::gate::evaluate(&section, &intent, &PipelineConfig::default());
        let type_decision = crate::arbiter::arbitrate(&section, &intent, &actionability);
        ClassifiedSection {
            section,
            intent,
            actionability,
            type_decision,
        }
    }

    #[test]
    fn proposal_line_drives_idea_title() {
        let cs = classify("# Ideas\nAutomate the weekly usage report for accounts.\n");
        let mut alloc = IdAllocator::new();
        let c = synthesize_section(&cs, &mut alloc);
        assert_eq!(c.suggestion.title, "Automate the weekly usage report for accounts");
    }

    #[test]
    fn friction_without_proposal_gets_solution_shape() {
        let cs = classify(
            "# Feedback\nToo many clicks in the export dialog, very tedious for admins.\nUsers keep complaining about it.\n",
        );
        let mut alloc = IdAllocator::new();
        let c = synthesize_section(&cs, &mut alloc);
        assert!(c.suggestion.title.starts_with("Reduce steps"), "{}", c.suggestion.title);
    }

    #[test]
    fn update_title_prefers_heading() {
        let cs = classify("# Q3 Launch Timeline\nMove the launch from the 12th to the 19th.\n");
        let mut alloc = IdAllocator::new();
        let c = synthesize_section(&cs, &mut alloc);
        assert_eq!(c.suggestion.kind, SuggestionType::ProjectUpdate);
        assert_eq!(c.suggestion.title, "Update Q3 Launch Timeline");
    }

    #[test]
    fn titles_are_capped_at_eighty() {
        let long = format!("# Ideas\nAutomate {} for the team.\n", "the recurring report ".repeat(8));
        let cs = classify(&long);
        let mut alloc = IdAllocator::new();
        let c = synthesize_section(&cs, &mut alloc);
        assert!(c.suggestion.title.len() <= MAX_TITLE_LEN);
    }

    #[test]
    fn body_is_capped_with_ellipsis() {
        let text = "word ".repeat(100);
        let capped = cap_body(&text);
        assert!(capped.len() <= MAX_BODY_LEN + '…'.len_utf8());
        assert!(capped.ends_with('…'));
    }

    #[test]
    fn list_items_become_merged_evidence() {
        let cs = classify("# Next\n- Improve the export flow\n- Add retry logic to sync\n");
        let mut alloc = IdAllocator::new();
        let c = synthesize_section(&cs, &mut alloc);
        assert_eq!(c.suggestion.evidence_spans.len(), 1);
        let span = &c.suggestion.evidence_spans[0];
        assert!(span.text.contains("Improve the export flow"));
        assert!(span.text.contains("Add retry logic"));
    }

    #[test]
    fn update_payload_is_after_description() {
        let cs = classify("# Timeline\nMove the launch from the 12th to the 19th.\n");
        let mut alloc = IdAllocator::new();
        let c = synthesize_section(&cs, &mut alloc);
        match &c.suggestion.payload {
            SuggestionPayload::AfterDescription { after_description } => {
                assert!(after_description.contains("12th"));
            }
            other => panic!("expected AfterDescription, got {:?}", other),
        }
    }

    #[test]
    fn idea_payload_is_draft_initiative() {
        let cs = classify("# Ideas\nBuild a self-serve billing portal for SMB accounts.\n");
        let mut alloc = IdAllocator::new();
        let c = synthesize_section(&cs, &mut alloc);
        match &c.suggestion.payload {
            SuggestionPayload::DraftInitiative { title, .. } => {
                assert!(!title.is_empty());
            }
            other => panic!("expected DraftInitiative, got {:?}", other),
        }
    }

    #[test]
    fn bsignal_candidate_grounds_evidence_verbatim() {
        let cs = classify(
            "# Notes\nUsers need better error visibility when background jobs fail silently.\n",
        );
        let signal = crate::bsignal::best_line_signal(&cs.section).expect("signal");
        let mut alloc = IdAllocator::new();
        let c = synthesize_from_signal(&cs, &signal, &mut alloc);
        let span = &c.suggestion.evidence_spans[0];
        assert!(cs
            .section
            .raw_text
            .to_lowercase()
            .contains(&span.text.to_lowercase()));
        assert!(matches!(c.source, CandidateSource::BSignal { .. }));
    }

    #[test]
    fn suggestion_ids_come_from_the_allocator() {
        let cs = classify("# Ideas\nBuild a billing portal.\n");
        let mut alloc = IdAllocator::new();
        let a = synthesize_section(&cs, &mut alloc);
        let b = synthesize_section(&cs, &mut alloc);
        assert_eq!(a.suggestion.suggestion_id, "sug-1");
        assert_eq!(b.suggestion.suggestion_id, "sug-2");
    }
}
