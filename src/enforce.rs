//! Final emission enforcer: defense in depth for cross-stage invariants.
//!
//! One corrective pass over the full candidate list after consolidation.
//! Earlier stages already try to honor these rules; this pass makes them
//! hold no matter what path a candidate took:
//!
//! 1. Specification/framework sections shed `project_update` candidates
//!    when an idea from the same section exists.
//! 2. The gamification-cluster title/body override is re-applied.
//! 3. Idea bodies under automation- and spec/framework-style headings are
//!    enriched into multi-bullet form.
//! 4. Timeline-headed sections collapse to exactly one `project_update`,
//!    synthesized from scratch when none survived.
//! 5. A plan-change section with a concrete delta must own at least one
//!    emitted update — the floor invariant.

use crate::arbiter::{is_spec_framework_section, is_timeline_section};
use crate::consolidate::gamification_title;
use crate::idgen::IdAllocator;
use crate::identity::compute_suggestion_key;
use crate::patterns::{contains_any, has_concrete_delta, strip_list_marker};
use crate::synthesize::{build_payload, cap_body, extract_evidence};
use crate::title::truncate_words;
use crate::types::{
    Candidate, CandidateSource, ClassifiedSection, DropStage, IntentLabel, LedgerEntry,
    SuggestionPayload, SuggestionScores, SuggestionType,
};

/// Headings whose ideas read better as structured multi-bullet bodies.
const AUTOMATION_HEADING_WORDS: &[&str] = &["automation", "automations", "tooling"];

/// Run the enforcement pass.
pub fn enforce(
    mut candidates: Vec<Candidate>,
    classified: &[ClassifiedSection],
    alloc: &mut IdAllocator,
    ledger: &mut Vec<LedgerEntry>,
) -> Vec<Candidate> {
    candidates = suppress_spec_section_updates(candidates, classified, ledger);
    reapply_gamification(&mut candidates, classified);
    enrich_structured_bodies(&mut candidates, classified);
    candidates = collapse_timeline_sections(candidates, classified, alloc, ledger);
    ensure_plan_change_floor(&mut candidates, classified, alloc);
    candidates
}

/// Duty 1: a spec/framework section describes an artifact, not a mutation.
/// Its updates are suppressed unless they are all the section produced.
fn suppress_spec_section_updates(
    candidates: Vec<Candidate>,
    classified: &[ClassifiedSection],
    ledger: &mut Vec<LedgerEntry>,
) -> Vec<Candidate> {
    let spec_sections: Vec<&str> = classified
        .iter()
        .filter(|cs| is_spec_framework_section(&cs.section))
        .map(|cs| cs.section.section_id.as_str())
        .collect();
    if spec_sections.is_empty() {
        return candidates;
    }

    let mut out = Vec::with_capacity(candidates.len());
    for candidate in candidates.iter() {
        let sid = candidate.suggestion.section_id.as_str();
        let is_spec_update = spec_sections.contains(&sid)
            && candidate.suggestion.kind == SuggestionType::ProjectUpdate;
        if is_spec_update {
            let has_idea_sibling = candidates.iter().any(|c| {
                c.suggestion.section_id == sid && c.suggestion.kind == SuggestionType::Idea
            });
            if has_idea_sibling {
                ledger.push(LedgerEntry {
                    section_id: sid.to_string(),
                    candidate_title: Some(candidate.suggestion.title.clone()),
                    drop_stage: DropStage::Validation,
                    drop_reason: "spec_section_update_suppressed".to_string(),
                });
                continue;
            }
        }
        out.push(candidate.clone());
    }
    out
}

/// Duty 2: gamification clusters keep their canonical title and body even if
/// consolidation was bypassed.
fn reapply_gamification(candidates: &mut [Candidate], classified: &[ClassifiedSection]) {
    for cs in classified {
        let Some(title) = gamification_title(&cs.section) else {
            continue;
        };
        for candidate in candidates.iter_mut() {
            if candidate.suggestion.section_id == cs.section.section_id
                && candidate.suggestion.kind == SuggestionType::Idea
            {
                let s = &mut candidate.suggestion;
                s.title = title.clone();
                s.context.title = title.clone();
                s.suggestion_key =
                    compute_suggestion_key(&s.note_id, &s.section_id, s.kind, &title);
                if let SuggestionPayload::DraftInitiative { title: t, .. } = &mut s.payload {
                    *t = title.clone();
                }
            }
        }
    }
}

/// Duty 3: multi-bullet bodies for automation- and spec-style headings.
fn enrich_structured_bodies(candidates: &mut [Candidate], classified: &[ClassifiedSection]) {
    for cs in classified {
        let heading = &cs.section.heading_text;
        let structured = contains_any(heading, AUTOMATION_HEADING_WORDS)
            || is_spec_framework_section(&cs.section);
        if !structured {
            continue;
        }
        for candidate in candidates.iter_mut() {
            if candidate.suggestion.section_id != cs.section.section_id
                || candidate.suggestion.kind != SuggestionType::Idea
            {
                continue;
            }
            let bullets: Vec<String> = candidate
                .suggestion
                .evidence_spans
                .iter()
                .flat_map(|s| s.text.lines())
                .map(|l| strip_list_marker(l).trim().to_string())
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .take(6)
                .collect();
            if bullets.len() < 2 {
                continue;
            }
            let body = cap_body(
                &bullets
                    .iter()
                    .map(|b| format!("- {}", b))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
            let s = &mut candidate.suggestion;
            s.context.body = body.clone();
            if let SuggestionPayload::DraftInitiative { description, .. } = &mut s.payload {
                *description = body;
            }
        }
    }
}

/// Duty 4: a timeline section surfaces exactly one update.
fn collapse_timeline_sections(
    candidates: Vec<Candidate>,
    classified: &[ClassifiedSection],
    alloc: &mut IdAllocator,
    ledger: &mut Vec<LedgerEntry>,
) -> Vec<Candidate> {
    let mut out = candidates;
    for cs in classified {
        if !is_timeline_section(&cs.section) {
            continue;
        }
        let sid = cs.section.section_id.as_str();
        let mine: Vec<usize> = out
            .iter()
            .enumerate()
            .filter(|(_, c)| c.suggestion.section_id == sid)
            .map(|(i, _)| i)
            .collect();

        if mine.is_empty() {
            // Synthesize from scratch for sections that earned it.
            if cs.actionability.actionable || has_concrete_delta(&cs.section.raw_text) {
                out.push(timeline_update(cs, alloc));
            }
            continue;
        }

        // Keep the first update (or promote the first candidate), absorb the
        // rest of the section's evidence, drop the survivors' siblings.
        let keep = mine
            .iter()
            .copied()
            .find(|&i| out[i].suggestion.kind == SuggestionType::ProjectUpdate)
            .unwrap_or(mine[0]);

        let mut merged_spans = out[keep].suggestion.evidence_spans.clone();
        for &i in &mine {
            if i == keep {
                continue;
            }
            for span in &out[i].suggestion.evidence_spans {
                let dup = merged_spans.iter().any(|s| s.text.trim() == span.text.trim());
                if !dup && merged_spans.len() < 5 {
                    merged_spans.push(span.clone());
                }
            }
            ledger.push(LedgerEntry {
                section_id: sid.to_string(),
                candidate_title: Some(out[i].suggestion.title.clone()),
                drop_stage: DropStage::Validation,
                drop_reason: "timeline_section_collapsed".to_string(),
            });
        }

        let survivor = &mut out[keep];
        survivor.suggestion.evidence_spans = merged_spans;
        if survivor.suggestion.kind != SuggestionType::ProjectUpdate {
            let s = &mut survivor.suggestion;
            s.kind = SuggestionType::ProjectUpdate;
            s.routing.create_new = false;
            s.payload = SuggestionPayload::AfterDescription {
                after_description: s.context.body.clone(),
            };
            s.suggestion_key = compute_suggestion_key(&s.note_id, &s.section_id, s.kind, &s.title);
        }
        survivor.has_concrete_delta =
            survivor.has_concrete_delta || has_concrete_delta(&cs.section.raw_text);

        // Remove the absorbed siblings, highest index first.
        let mut to_remove: Vec<usize> = mine.into_iter().filter(|&i| i != keep).collect();
        to_remove.sort_unstable_by(|a, b| b.cmp(a));
        for i in to_remove {
            out.remove(i);
        }
    }
    out
}

/// Duty 5: the floor invariant. A plan-change section with a concrete delta
/// or schedule-event language never ends a run with zero updates.
fn ensure_plan_change_floor(
    candidates: &mut Vec<Candidate>,
    classified: &[ClassifiedSection],
    alloc: &mut IdAllocator,
) {
    for cs in classified {
        let qualifies = cs.intent.label() == IntentLabel::PlanChange
            && (has_concrete_delta(&cs.section.raw_text)
                || crate::patterns::has_schedule_event(&cs.section.raw_text));
        if !qualifies {
            continue;
        }
        let has_update = candidates.iter().any(|c| {
            c.suggestion.section_id == cs.section.section_id
                && c.suggestion.kind == SuggestionType::ProjectUpdate
        });
        if !has_update {
            log::warn!(
                "Floor invariant: synthesizing missing update for {}",
                cs.section.section_id
            );
            candidates.push(timeline_update(cs, alloc));
        }
    }
}

/// Build a from-scratch update candidate for a section.
fn timeline_update(cs: &ClassifiedSection, alloc: &mut IdAllocator) -> Candidate {
    let section = &cs.section;
    let heading = if section.heading_text.is_empty() {
        "timeline".to_string()
    } else {
        section.heading_text.clone()
    };
    let title = truncate_words(&format!("Update {}", heading), crate::title::MAX_TITLE_LEN);
    let body = cap_body(
        &section
            .body_lines
            .iter()
            .map(|l| strip_list_marker(l).trim())
            .collect::<Vec<_>>()
            .join(" "),
    );
    let evidence = extract_evidence(section, SuggestionType::ProjectUpdate);
    let payload = build_payload(SuggestionType::ProjectUpdate, &title, &body, section);
    let scores = SuggestionScores {
        section_actionability: cs.intent.actionable_signal().max(0.7),
        type_choice_confidence: 0.7,
        synthesis_confidence: 0.7,
        overall: 0.0,
    };
    let suggestion = crate::synthesize::build_suggestion(
        section,
        SuggestionType::ProjectUpdate,
        title,
        body,
        evidence,
        payload,
        scores,
        alloc,
    );
    Candidate {
        suggestion,
        source: CandidateSource::Enforcer,
        section_actionable: cs.actionability.actionable,
        has_concrete_delta: has_concrete_delta(&section.raw_text),
        intent_label: cs.intent.label(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::intent::score_intent;
    use crate::synthesize::synthesize_section;

    fn classify_all(md: &str) -> Vec<ClassifiedSection> {
        crate::segmenter::segment_note("n1", md)
            .into_iter()
            .map(|section| {
                let intent = score_intent(&section);
                let actionability =
                    crate::gate::evaluate(&section, &intent, &PipelineConfig::default());
                let type_decision = crate::arbiter::arbitrate(&section, &intent, &actionability);
                ClassifiedSection {
                    section,
                    intent,
                    actionability,
                    type_decision,
                }
            })
            .collect()
    }

    #[test]
    fn timeline_section_collapses_to_one_update() {
        let classified = classify_all(
            "# Launch Timeline\nMove the beta from the 3rd to the 10th.\nPush GA by 2 weeks.\n",
        );
        let mut alloc = IdAllocator::new();
        let mut candidates: Vec<Candidate> = classified
            .iter()
            .filter(|cs| cs.actionability.actionable)
            .map(|cs| synthesize_section(cs, &mut alloc))
            .collect();
        // Simulate fragmentation: duplicate the candidate.
        let dup = candidates[0].clone();
        candidates.push(dup);

        let mut ledger = Vec::new();
        let out = enforce(candidates, &classified, &mut alloc, &mut ledger);
        let updates: Vec<_> = out
            .iter()
            .filter(|c| {
                c.suggestion.section_id == "s1"
                    && c.suggestion.kind == SuggestionType::ProjectUpdate
            })
            .collect();
        assert_eq!(updates.len(), 1);
        assert!(ledger
            .iter()
            .any(|e| e.drop_reason == "timeline_section_collapsed"));
    }

    #[test]
    fn timeline_section_with_no_candidates_gets_one() {
        let classified =
            classify_all("# Timeline\nMove the launch from the 12th to the 19th.\n");
        let mut alloc = IdAllocator::new();
        let mut ledger = Vec::new();
        let out = enforce(Vec::new(), &classified, &mut alloc, &mut ledger);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].suggestion.kind, SuggestionType::ProjectUpdate);
        assert!(matches!(out[0].source, CandidateSource::Enforcer));
    }

    #[test]
    fn spec_section_update_suppressed_when_idea_exists() {
        let classified = classify_all(
            "# Scoring Rubric\n- Build a reach scoring model\n- Add confidence weighting\n- Define effort bands\n",
        );
        let mut alloc = IdAllocator::new();
        let mut idea = synthesize_section(&classified[0], &mut alloc);
        idea.suggestion.kind = SuggestionType::Idea;
        let mut update = synthesize_section(&classified[0], &mut alloc);
        update.suggestion.kind = SuggestionType::ProjectUpdate;

        let mut ledger = Vec::new();
        let out = enforce(vec![idea, update], &classified, &mut alloc, &mut ledger);
        assert!(out
            .iter()
            .all(|c| c.suggestion.kind != SuggestionType::ProjectUpdate));
        assert!(ledger
            .iter()
            .any(|e| e.drop_reason == "spec_section_update_suppressed"));
    }

    #[test]
    fn plan_change_floor_synthesizes_missing_update() {
        let classified = classify_all("# Schedule\nPush the release date out by 2 weeks.\n");
        assert_eq!(classified[0].intent.label(), IntentLabel::PlanChange);
        let mut alloc = IdAllocator::new();
        let mut ledger = Vec::new();
        // No candidates arrived at the enforcer at all.
        let out = enforce(Vec::new(), &classified, &mut alloc, &mut ledger);
        assert!(out
            .iter()
            .any(|c| c.suggestion.kind == SuggestionType::ProjectUpdate));
    }

    #[test]
    fn spec_idea_bodies_become_bulleted() {
        let classified = classify_all(
            "# Review Criteria\n- Score on clarity\n- Add calibration rounds\n- Build a scoring dashboard\n",
        );
        let mut alloc = IdAllocator::new();
        let mut idea = synthesize_section(&classified[0], &mut alloc);
        idea.suggestion.kind = SuggestionType::Idea;

        let mut ledger = Vec::new();
        let out = enforce(vec![idea], &classified, &mut alloc, &mut ledger);
        assert!(out[0].suggestion.context.body.contains("- "));
    }
}
