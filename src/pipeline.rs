//! Pipeline orchestration: note in, ordered suggestions out.
//!
//! Stage order is fixed: segment, score intent, gate, arbitrate type,
//! synthesize (dense extraction or whole-section), consolidate, enforce,
//! finish titles, dedup by key, rank. Every drop along the way lands in the
//! instrumentation ledger, surfaced by the debug entry points.
//!
//! Determinism contract: the same note text, config, and allocator state
//! always produce byte-identical output. Nothing in here consults a clock,
//! a random source, or iteration order of an unordered map.

use std::collections::{HashMap, HashSet};

use crate::arbiter::arbitrate;
use crate::bsignal::{best_line_signal, dense_trigger, extract_dense};
use crate::config::PipelineConfig;
use crate::consolidate::consolidate;
use crate::enforce::enforce;
use crate::error::PipelineError;
use crate::gate::evaluate;
use crate::idgen::IdAllocator;
use crate::identity::compute_suggestion_key;
use crate::intent::score_intent;
use crate::llm::{refine, IntentProvider};
use crate::rank::rank;
use crate::segmenter::segment_note;
use crate::synthesize::{synthesize_from_signal, synthesize_section};
use crate::title;
use crate::types::{
    Candidate, ClassifiedSection, DebugRunResult, DropStage, LedgerEntry, RunResult, Section,
    SuggestionPayload, SuggestionType,
};

/// Run the full pipeline on one note with rule-based intent scoring.
pub fn run_note(
    note_id: &str,
    raw_markdown: &str,
    config: &PipelineConfig,
    alloc: &mut IdAllocator,
) -> Result<RunResult, PipelineError> {
    run_note_debug(note_id, raw_markdown, config, alloc)
        .map(|debug| RunResult {
            suggestions: debug.suggestions,
        })
}

/// Same as [`run_note`] but keeps the drop ledger.
pub fn run_note_debug(
    note_id: &str,
    raw_markdown: &str,
    config: &PipelineConfig,
    alloc: &mut IdAllocator,
) -> Result<DebugRunResult, PipelineError> {
    let sections = validate_and_segment(note_id, raw_markdown)?;
    let classified: Vec<ClassifiedSection> = sections
        .into_iter()
        .map(|section| {
            let intent = score_intent(&section);
            classify_one(section, intent, config)
        })
        .collect();
    Ok(finish(note_id, &classified, config, alloc))
}

/// Run the pipeline with a model-based intent provider refining the rule
/// scores. Provider failures degrade to the rule-only path per section.
pub async fn run_note_with_provider(
    note_id: &str,
    raw_markdown: &str,
    config: &PipelineConfig,
    alloc: &mut IdAllocator,
    provider: &dyn IntentProvider,
) -> Result<RunResult, PipelineError> {
    let sections = validate_and_segment(note_id, raw_markdown)?;
    let mut classified = Vec::with_capacity(sections.len());
    for section in sections {
        let intent = refine(score_intent(&section), &section, provider).await;
        classified.push(classify_one(section, intent, config));
    }
    let debug = finish(note_id, &classified, config, alloc);
    Ok(RunResult {
        suggestions: debug.suggestions,
    })
}

fn validate_and_segment(
    note_id: &str,
    raw_markdown: &str,
) -> Result<Vec<Section>, PipelineError> {
    if note_id.trim().is_empty() {
        return Err(PipelineError::EmptyNoteId);
    }
    if raw_markdown.trim().is_empty() {
        return Err(PipelineError::EmptyNote);
    }
    Ok(segment_note(note_id, raw_markdown))
}

fn classify_one(
    section: Section,
    intent: crate::types::IntentClassification,
    config: &PipelineConfig,
) -> ClassifiedSection {
    let actionability = evaluate(&section, &intent, config);
    let type_decision = arbitrate(&section, &intent, &actionability);
    ClassifiedSection {
        section,
        intent,
        actionability,
        type_decision,
    }
}

/// Everything after classification: synthesis through ranking.
fn finish(
    note_id: &str,
    classified: &[ClassifiedSection],
    config: &PipelineConfig,
    alloc: &mut IdAllocator,
) -> DebugRunResult {
    let mut ledger: Vec<LedgerEntry> = Vec::new();
    let mut candidates: Vec<Candidate> = Vec::new();

    for cs in classified {
        if !cs.actionability.actionable {
            ledger.push(LedgerEntry {
                section_id: cs.section.section_id.clone(),
                candidate_title: None,
                drop_stage: DropStage::Actionability,
                drop_reason: cs.actionability.reason.to_string(),
            });
            continue;
        }
        if cs.type_decision.type_label.is_none() {
            ledger.push(LedgerEntry {
                section_id: cs.section.section_id.clone(),
                candidate_title: None,
                drop_stage: DropStage::Type,
                drop_reason: cs.type_decision.decided_by.to_string(),
            });
            continue;
        }

        // Dense paragraphs fan out into per-sentence candidates.
        if dense_trigger(&cs.section, config.dense_min_chars) {
            let signals = extract_dense(&cs.section);
            if !signals.is_empty() {
                if signals.len() > 1 {
                    ledger.push(LedgerEntry {
                        section_id: cs.section.section_id.clone(),
                        candidate_title: None,
                        drop_stage: DropStage::SplitIntoSubsections,
                        drop_reason: format!("dense paragraph split into {}", signals.len()),
                    });
                }
                for signal in &signals {
                    candidates.push(synthesize_from_signal(cs, signal, alloc));
                }
                continue;
            }
        }

        // Rescued sections ground on the rescuing sentence when one exists.
        if cs.actionability.rescued_by_bsignal {
            if let Some(signal) = best_line_signal(&cs.section) {
                candidates.push(synthesize_from_signal(cs, &signal, alloc));
                continue;
            }
        }

        candidates.push(synthesize_section(cs, alloc));
    }

    let sections_by_id: HashMap<String, Section> = classified
        .iter()
        .map(|cs| (cs.section.section_id.clone(), cs.section.clone()))
        .collect();

    let candidates = consolidate(candidates, &sections_by_id, alloc);
    let mut candidates = enforce(candidates, classified, alloc, &mut ledger);
    finish_titles(&mut candidates);
    let candidates = dedup_by_key(candidates, &mut ledger);
    let suggestions = rank(candidates, config, &mut ledger);

    let updates = suggestions
        .iter()
        .filter(|s| s.kind == SuggestionType::ProjectUpdate)
        .count();
    log::info!(
        "Note {}: {} sections, {} suggestions ({} updates, {} ideas), {} drops",
        note_id,
        classified.len(),
        suggestions.len(),
        updates,
        suggestions.len() - updates,
        ledger.len()
    );

    DebugRunResult {
        suggestions,
        ledger,
    }
}

/// Apply the title polish and contract to every candidate, keeping the
/// display context, payload, and identity key in sync.
fn finish_titles(candidates: &mut [Candidate]) {
    for candidate in candidates {
        let s = &mut candidate.suggestion;
        let polished = title::polish(&s.title);
        let final_title = title::enforce_contract(&polished, &s.evidence_spans);
        if final_title == s.title {
            continue;
        }
        s.title = final_title.clone();
        s.context.title = final_title.clone();
        if let SuggestionPayload::DraftInitiative { title: t, .. } = &mut s.payload {
            *t = final_title.clone();
        }
        s.suggestion_key =
            compute_suggestion_key(&s.note_id, &s.section_id, s.kind, &final_title);
    }
}

/// Drop candidates that normalize to a key already seen. First wins, so
/// the earlier pipeline position survives.
fn dedup_by_key(candidates: Vec<Candidate>, ledger: &mut Vec<LedgerEntry>) -> Vec<Candidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if seen.insert(candidate.suggestion.suggestion_key.clone()) {
            out.push(candidate);
        } else {
            ledger.push(LedgerEntry {
                section_id: candidate.suggestion.section_id.clone(),
                candidate_title: Some(candidate.suggestion.title.clone()),
                drop_stage: DropStage::Validation,
                drop_reason: "duplicate_suggestion_key".to_string(),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(md: &str) -> RunResult {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut alloc = IdAllocator::new();
        run_note("n1", md, &PipelineConfig::default(), &mut alloc).unwrap()
    }

    fn run_debug(md: &str) -> DebugRunResult {
        let mut alloc = IdAllocator::new();
        run_note_debug("n1", md, &PipelineConfig::default(), &mut alloc).unwrap()
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let mut alloc = IdAllocator::new();
        assert!(matches!(
            run_note("", "text", &PipelineConfig::default(), &mut alloc),
            Err(PipelineError::EmptyNoteId)
        ));
        assert!(matches!(
            run_note("n1", "  \n", &PipelineConfig::default(), &mut alloc),
            Err(PipelineError::EmptyNote)
        ));
    }

    #[test]
    fn schedule_shift_emits_a_project_update() {
        let result = run("Move the launch from the 12th to the 19th.\n");
        assert_eq!(result.suggestions.len(), 1);
        let s = &result.suggestions[0];
        assert_eq!(s.kind, SuggestionType::ProjectUpdate);
        assert!(matches!(
            s.payload,
            SuggestionPayload::AfterDescription { .. }
        ));
        assert!(!s.evidence_spans.is_empty());
    }

    #[test]
    fn dense_paragraph_fans_out_into_grounded_ideas() {
        let note = "Users keep reporting that the export flow loses formatting. \
We should add a retry queue for failed exports. \
Can you put together a rollout checklist for the fix?\n";
        let result = run(note);
        let ideas: Vec<_> = result
            .suggestions
            .iter()
            .filter(|s| s.kind == SuggestionType::Idea)
            .collect();
        assert!(ideas.len() >= 2, "expected multiple ideas, got {:?}", result);
        // Grounding contract: every evidence span is a verbatim substring.
        for s in &result.suggestions {
            for span in &s.evidence_spans {
                assert!(
                    note.contains(&span.text),
                    "span {:?} not verbatim in note",
                    span.text
                );
            }
        }
    }

    #[test]
    fn strategy_only_plan_change_is_excluded_at_the_type_stage() {
        let debug = run_debug("We should shift from enterprise to SMB customers.\n");
        assert!(debug.suggestions.is_empty());
        assert!(debug
            .ledger
            .iter()
            .any(|e| e.drop_stage == DropStage::Type));
    }

    #[test]
    fn calendar_chatter_produces_nothing() {
        let debug = run_debug(
            "# Logistics\nSync with marketing about the offsite on Tuesday.\nBook the conference room for Thursday.\n",
        );
        assert!(debug.suggestions.is_empty());
        assert!(debug
            .ledger
            .iter()
            .any(|e| e.drop_stage == DropStage::Actionability));
    }

    #[test]
    fn structured_idea_section_emits_one_consolidated_idea() {
        let note = "# Black Box Prioritization System\n\
- Build a weighted scoring model for incoming requests\n\
- Add a confidence input for each estimate\n\
- Create a review board to calibrate scores\n\
- Publish the ranked list to stakeholders\n";
        let result = run(note);
        let ideas: Vec<_> = result
            .suggestions
            .iter()
            .filter(|s| s.kind == SuggestionType::Idea)
            .collect();
        assert_eq!(ideas.len(), 1);
        assert!(matches!(
            ideas[0].payload,
            SuggestionPayload::DraftInitiative { .. }
        ));
    }

    #[test]
    fn updates_precede_ideas_in_output_order() {
        let note = "# Timeline\nPush the beta launch out by 2 weeks.\n\n\
# Feedback\nWe should build an in-app changelog so users see what shipped.\n";
        let result = run(note);
        assert!(result.suggestions.len() >= 2);
        let first_idea = result
            .suggestions
            .iter()
            .position(|s| s.kind == SuggestionType::Idea);
        let last_update = result
            .suggestions
            .iter()
            .rposition(|s| s.kind == SuggestionType::ProjectUpdate);
        if let (Some(i), Some(u)) = (first_idea, last_update) {
            assert!(u < i);
        }
    }

    #[test]
    fn reruns_are_byte_identical() {
        let note = "# Timeline\nMove the GA date from the 1st to the 15th.\n\n\
Users keep asking for export to CSV. We should build an export pipeline.\n";
        let a = serde_json::to_string(&run(note).suggestions).unwrap();
        let b = serde_json::to_string(&run(note).suggestions).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn suggestion_ids_are_sequential_per_allocator() {
        let result = run(
            "# Timeline\nMove the GA date from the 1st to the 15th.\n\n\
# Feedback\nWe should add an export pipeline for reports.\n",
        );
        assert!(result
            .suggestions
            .iter()
            .all(|s| s.suggestion_id.starts_with("sug-")));
    }

    #[test]
    fn plan_change_with_delta_always_yields_an_update() {
        // Even phrased softly, a dated plan shift must surface as an update.
        let result = run("# Roadmap\nWe might push the milestone from the 3rd to the 24th.\n");
        assert!(result
            .suggestions
            .iter()
            .any(|s| s.kind == SuggestionType::ProjectUpdate));
    }

    #[test]
    fn multibyte_heading_title_runs_clean() {
        // A heading that reads like a typed prefix, with chars whose
        // lowercase form is longer in bytes. The fallback idea title is the
        // heading itself, so the title contract must handle it.
        let result = run(
            "# Update: İİİİİİİİ\nWe should improve the error emails here.\nUsers keep asking about delivery status.\n",
        );
        assert!(!result.suggestions.is_empty());
        for s in &result.suggestions {
            assert!(!s.title.is_empty());
        }
    }

    #[tokio::test]
    async fn provider_path_matches_rule_path_with_neutral_provider() {
        let note = "# Timeline\nMove the GA date from the 1st to the 15th.\n";
        let config = PipelineConfig::default();
        let mut alloc = IdAllocator::new();
        let rules = run_note("n1", note, &config, &mut alloc).unwrap();
        let mut alloc = IdAllocator::new();
        let provided = run_note_with_provider(
            "n1",
            note,
            &config,
            &mut alloc,
            &crate::llm::NeutralProvider,
        )
        .await
        .unwrap();
        assert_eq!(
            serde_json::to_string(&rules.suggestions).unwrap(),
            serde_json::to_string(&provided.suggestions).unwrap()
        );
    }
}
