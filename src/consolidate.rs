//! Section consolidator: merges fragmented idea candidates from one
//! structured section back into a single suggestion.
//!
//! A bullet-list section can fan out into several thin candidates; when the
//! section is clearly one coherent proposal (headed, list-heavy, no timeline
//! language) those fragments read better as one card. Groups that fail any
//! condition pass through untouched.

use std::collections::HashMap;

use crate::idgen::IdAllocator;
use crate::identity::compute_suggestion_key;
use crate::patterns::{
    contains_any, count_distinct, has_concrete_delta, strip_list_marker, GAMIFICATION_TOKENS,
    TIMELINE_HEADING_WORDS,
};
use crate::synthesize::cap_body;
use crate::title::{capitalize, truncate_words, MAX_TITLE_LEN};
use crate::types::{Candidate, EvidenceSpan, Section, SuggestionPayload, SuggestionType};

/// Maximum evidence spans kept on a consolidated suggestion.
const MAX_MERGED_SPANS: usize = 5;

/// Consolidate per-section idea fragments. Order of unaffected candidates is
/// preserved; a merged group occupies its first candidate's position.
pub fn consolidate(
    candidates: Vec<Candidate>,
    sections: &HashMap<String, Section>,
    alloc: &mut IdAllocator,
) -> Vec<Candidate> {
    // Group facts first: count and type purity per section. A single
    // non-idea candidate disqualifies the whole group.
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut all_idea: HashMap<String, bool> = HashMap::new();
    for c in &candidates {
        let sid = &c.suggestion.section_id;
        *counts.entry(sid.clone()).or_insert(0) += 1;
        let idea = c.suggestion.kind == SuggestionType::Idea;
        all_idea
            .entry(sid.clone())
            .and_modify(|v| *v = *v && idea)
            .or_insert(idea);
    }

    let mut out: Vec<Candidate> = Vec::new();
    // (section_id, anchor position) in first-seen order, for deterministic ids.
    let mut anchors: Vec<(String, usize)> = Vec::new();

    for candidate in candidates {
        let sid = candidate.suggestion.section_id.clone();
        let mergeable = sections
            .get(&sid)
            .map(|s| {
                eligible(s, counts[&sid]) && all_idea.get(&sid).copied().unwrap_or(false)
            })
            .unwrap_or(false);
        if !mergeable {
            out.push(candidate);
            continue;
        }
        match anchors.iter().find(|(s, _)| s == &sid) {
            Some(&(_, pos)) => absorb(&mut out[pos], candidate),
            None => {
                anchors.push((sid, out.len()));
                out.push(candidate);
            }
        }
    }

    // Rebuild each anchor from its merged evidence.
    for (sid, pos) in &anchors {
        if let Some(section) = sections.get(sid) {
            rebuild_anchor(&mut out[*pos], section, alloc);
        }
    }

    out
}

/// All structural conditions for consolidating a section's candidates.
fn eligible(section: &Section, group_size: usize) -> bool {
    section.heading_level <= 3
        && section.features.num_list_items >= 3
        && group_size > 1
        && !has_concrete_delta(&section.raw_text)
        && !contains_any(&section.heading_text, TIMELINE_HEADING_WORDS)
}

/// Fold a sibling candidate's evidence into the group anchor, deduplicating
/// by trimmed span text.
fn absorb(anchor: &mut Candidate, sibling: Candidate) {
    for span in sibling.suggestion.evidence_spans {
        let dup = anchor
            .suggestion
            .evidence_spans
            .iter()
            .any(|s| s.text.trim() == span.text.trim());
        if !dup && anchor.suggestion.evidence_spans.len() < MAX_MERGED_SPANS {
            anchor.suggestion.evidence_spans.push(span);
        }
    }
}

/// Rebuild the anchor's title/body from the merged spans so body and
/// evidence stay consistent, then regenerate the key from the new title.
fn rebuild_anchor(anchor: &mut Candidate, section: &Section, alloc: &mut IdAllocator) {
    let spans = &anchor.suggestion.evidence_spans;
    if spans.is_empty() {
        return;
    }

    let title = gamification_title(section)
        .unwrap_or_else(|| title_from_spans(spans, &section.heading_text));
    let body = body_from_spans(spans);

    let s = &mut anchor.suggestion;
    s.suggestion_id = alloc.next_consolidation_id();
    s.title = title.clone();
    s.context.title = title.clone();
    s.context.body = body.clone();
    if let SuggestionPayload::DraftInitiative { title: t, description } = &mut s.payload {
        *t = title.clone();
        *description = body.clone();
    }
    s.suggestion_key =
        compute_suggestion_key(&s.note_id, &s.section_id, s.kind, &title);
    log::debug!(
        "Consolidated {} span(s) in {} into '{}'",
        s.evidence_spans.len(),
        s.section_id,
        s.title
    );
}

/// Gamification cluster override: a dense cluster of gamification vocabulary
/// across four or more bullets is one initiative, titled as such.
pub fn gamification_title(section: &Section) -> Option<String> {
    if section.features.num_list_items >= 4
        && count_distinct(&section.raw_text, GAMIFICATION_TOKENS) >= 2
    {
        let subject = if section.heading_text.is_empty() {
            "the product".to_string()
        } else {
            section.heading_text.clone()
        };
        Some(truncate_words(
            &format!("Introduce gamification mechanics for {}", subject),
            MAX_TITLE_LEN,
        ))
    } else {
        None
    }
}

fn title_from_spans(spans: &[EvidenceSpan], heading: &str) -> String {
    let first_line = spans[0].text.lines().next().unwrap_or("");
    let cleaned = strip_list_marker(first_line).trim();
    let base = if cleaned.is_empty() { heading } else { cleaned };
    truncate_words(
        &capitalize(base.trim_end_matches(['.', '!', '?', ',', ';'])),
        MAX_TITLE_LEN,
    )
}

fn body_from_spans(spans: &[EvidenceSpan]) -> String {
    let parts: Vec<String> = spans
        .iter()
        .flat_map(|s| s.text.lines())
        .map(|l| strip_list_marker(l).trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    cap_body(&parts.join("; "))
}
