//! Scoring, validation, threshold filtering, and output ordering.
//!
//! The last gate before emission. Every candidate gets an overall score;
//! weak unprotected candidates drop, protected candidates are demoted to
//! low-confidence instead. Updates always outrank ideas in the final order,
//! and only ideas are ever subject to the display cap.

use crate::config::PipelineConfig;
use crate::types::{Candidate, DropStage, LedgerEntry, Suggestion, SuggestionType};

/// Score, validate, filter, cap, and order the final candidate list.
pub fn rank(
    candidates: Vec<Candidate>,
    config: &PipelineConfig,
    ledger: &mut Vec<LedgerEntry>,
) -> Vec<Suggestion> {
    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());

    for mut candidate in candidates {
        score(&mut candidate.suggestion, config);
        validate(&mut candidate.suggestion);

        let below = candidate.suggestion.scores.overall < config.min_overall;
        if below {
            // Candidates from actionable sections are demoted, never dropped:
            // the gate already vouched for the section.
            if candidate.section_actionable {
                candidate.suggestion.is_high_confidence = false;
            } else {
                ledger.push(LedgerEntry {
                    section_id: candidate.suggestion.section_id.clone(),
                    candidate_title: Some(candidate.suggestion.title.clone()),
                    drop_stage: DropStage::Threshold,
                    drop_reason: format!(
                        "overall {:.2} below {:.2}",
                        candidate.suggestion.scores.overall, config.min_overall
                    ),
                });
                continue;
            }
        }
        kept.push(candidate);
    }

    order(&mut kept);
    apply_idea_cap(kept, config, ledger)
}

/// Combine the three component scores into the weighted overall.
fn score(suggestion: &mut Suggestion, config: &PipelineConfig) {
    let w = &config.weights;
    let s = &mut suggestion.scores;
    s.overall = w.actionability * s.section_actionability
        + w.type_choice * s.type_choice_confidence
        + w.synthesis * s.synthesis_confidence;
    suggestion.is_high_confidence = s.overall >= config.min_overall;
}

/// Structural validation. Failures flag the suggestion for clarification
/// rather than dropping it.
fn validate(suggestion: &mut Suggestion) {
    let body = suggestion.context.body.trim();
    if body.is_empty() || body.lines().all(|l| l.trim_start().starts_with('#')) {
        suggestion.needs_clarification = Some("body is empty or heading-only".to_string());
        suggestion.is_high_confidence = false;
    } else if suggestion.evidence_spans.is_empty() {
        suggestion.needs_clarification = Some("no grounding evidence".to_string());
        suggestion.is_high_confidence = false;
    }
}

/// Updates first by descending overall, then ideas by descending overall.
/// Sort is stable so equal scores keep pipeline order.
fn order(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        let rank_a = type_rank(a.suggestion.kind);
        let rank_b = type_rank(b.suggestion.kind);
        rank_a.cmp(&rank_b).then(
            b.suggestion
                .scores
                .overall
                .partial_cmp(&a.suggestion.scores.overall)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });
}

fn type_rank(kind: SuggestionType) -> u8 {
    match kind {
        SuggestionType::ProjectUpdate => 0,
        _ => 1,
    }
}

/// Display cap: applies to ideas only. Updates pass through regardless of
/// how many there are.
fn apply_idea_cap(
    candidates: Vec<Candidate>,
    config: &PipelineConfig,
    ledger: &mut Vec<LedgerEntry>,
) -> Vec<Suggestion> {
    let Some(cap) = config.max_idea_suggestions else {
        return candidates.into_iter().map(|c| c.suggestion).collect();
    };

    let mut ideas_seen = 0usize;
    let mut out = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if candidate.suggestion.kind == SuggestionType::ProjectUpdate {
            out.push(candidate.suggestion);
            continue;
        }
        if ideas_seen < cap {
            ideas_seen += 1;
            out.push(candidate.suggestion);
        } else {
            ledger.push(LedgerEntry {
                section_id: candidate.suggestion.section_id.clone(),
                candidate_title: Some(candidate.suggestion.title.clone()),
                drop_stage: DropStage::Threshold,
                drop_reason: format!("idea display cap {} reached", cap),
            });
        }
    }
    out
}
