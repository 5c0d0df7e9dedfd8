//! Actionability gate: does a section yield any suggestion at all?
//!
//! The decision order is fixed and protective overrides come first:
//!
//! 1. plan-change label with a concrete delta or schedule-event language is
//!    actionable outright, bypassing the signal threshold.
//! 2. Dominant calendar/communication noise vetoes the section.
//! 3. Any sentence that opens with an action verb floors the gate open.
//! 4. Threshold check with short-section penalty; failures get one rescue
//!    attempt via the sentence-level b-signal extractors.
//! 5. Borderline-short sections (barely over threshold, almost no body) are
//!    rejected unless rescued.

use crate::bsignal;
use crate::config::PipelineConfig;
use crate::patterns::{has_concrete_delta, has_schedule_event, starts_with_action_verb, strip_list_marker};
use crate::types::{ActionabilityDecision, IntentClassification, IntentLabel, Section};

/// Evaluate the gate for one section.
pub fn evaluate(
    section: &Section,
    intent: &IntentClassification,
    config: &PipelineConfig,
) -> ActionabilityDecision {
    let actionable_signal = intent.actionable_signal();
    let out_of_scope_signal = intent.out_of_scope_signal();

    let decide = |actionable: bool, reason: &'static str, signal: f64, rescued: bool| {
        log::debug!(
            "Gate {}: {} ({}) signal={:.2}",
            section.section_id,
            if actionable { "actionable" } else { "not actionable" },
            reason,
            signal
        );
        ActionabilityDecision {
            actionable,
            reason,
            actionable_signal: signal,
            out_of_scope_signal,
            rescued_by_bsignal: rescued,
        }
    };

    // 1. Protective override: a labeled plan change with a measurable delta
    // or schedule-event language must never be dropped here.
    if intent.label() == IntentLabel::PlanChange
        && (has_concrete_delta(&section.raw_text) || has_schedule_event(&section.raw_text))
    {
        return decide(true, "plan_change_delta_override", actionable_signal.max(0.7), false);
    }

    // 2. Out-of-scope dominance: loud noise with a clear lead over the best
    // in-scope signal.
    let noise = intent.calendar.max(intent.communication);
    if noise >= config.out_of_scope_threshold
        && noise - actionable_signal >= config.out_of_scope_margin
    {
        return decide(false, "out_of_scope_dominant", actionable_signal, false);
    }

    // 3. Imperative floor.
    let imperative = section
        .body_lines
        .iter()
        .any(|l| starts_with_action_verb(strip_list_marker(l)));
    if imperative {
        return decide(true, "imperative_floor", actionable_signal.max(config.action_threshold), false);
    }

    // 4. Threshold with short-section penalty, then the b-signal rescue.
    let penalty = if section.features.num_lines <= config.short_section_lines {
        config.short_section_penalty
    } else {
        0.0
    };
    let effective_threshold = config.action_threshold + penalty;

    if actionable_signal >= effective_threshold {
        // 5. Borderline-short: a near-threshold pass on a tiny section is
        // rejected unless a b-signal independently vouches for it.
        let margin = actionable_signal - effective_threshold;
        if section.features.num_lines <= config.borderline_lines
            && margin < config.borderline_margin
        {
            if let Some(sig) = rescue(section, config) {
                return decide(
                    true,
                    "bsignal_rescue",
                    actionable_signal.max(config.bsignal_rescue_floor).max(sig.confidence),
                    true,
                );
            }
            return decide(false, "borderline_short", actionable_signal, false);
        }
        return decide(true, "above_threshold", actionable_signal, false);
    }

    // Below threshold: one rescue attempt.
    if let Some(sig) = rescue(section, config) {
        return decide(
            true,
            "bsignal_rescue",
            actionable_signal.max(config.bsignal_rescue_floor).max(sig.confidence),
            true,
        );
    }

    decide(false, "below_threshold", actionable_signal, false)
}

/// Rescue check: the strongest sentence-level b-signal, if it clears the
/// rescue confidence bar.
fn rescue(section: &Section, config: &PipelineConfig) -> Option<bsignal::SentenceSignal> {
    bsignal::best_line_signal(section).filter(|s| s.confidence >= config.bsignal_rescue_min)
}
