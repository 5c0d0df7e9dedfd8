//! Type arbiter: update vs idea, decided once.
//!
//! A base classifier scores mutation-likelihood against artifact-likelihood;
//! an ordered override table then gets the final say. The table is a literal
//! array so its priority order is a reviewable artifact. The arbiter is
//! idempotent and is the single source of truth for the emitted type — any
//! disagreement between the base suggestion and the final label resolves in
//! favor of the label.
//!
//! Override order note: `bsignal_rescue` sits ahead of the strategy-only
//! quality gate. A section that was rescued at the actionability stage is
//! typed `idea` before the quality gate can exclude it (rescue-then-
//! arbitration).

use crate::patterns::{
    contains_any, has_concrete_delta, has_schedule_event, re_change_pattern, re_pm_request,
    re_role_assignment, CHANGE_OPERATORS, DECISION_MARKERS, MECHANISM_VERBS,
    SPEC_FRAMEWORK_HEADING_WORDS, STRATEGY_HEADING_WORDS, SYSTEM_NOUNS, TIMELINE_HEADING_WORDS,
};
use crate::types::{
    ActionabilityDecision, IntentClassification, IntentLabel, Section, SuggestedType,
    SuggestionType, TypeDecision,
};

/// Everything an override predicate may look at.
pub struct OverrideCtx<'a> {
    pub section: &'a Section,
    pub intent: &'a IntentClassification,
    pub actionability: &'a ActionabilityDecision,
    /// plan-change label with no concrete delta and no schedule-event words.
    pub strategy_only: bool,
    pub base_type: SuggestedType,
    pub base_confidence: f64,
}

/// A named override: returns a full decision when it applies.
pub struct TypeOverride {
    pub name: &'static str,
    pub apply: fn(&OverrideCtx) -> Option<TypeDecision>,
}

/// The override table, in priority order. First applicable entry wins.
pub const TYPE_OVERRIDES: &[TypeOverride] = &[
    TypeOverride {
        name: "decision_or_role",
        apply: |ctx| {
            if ctx.intent.force_decision_marker || ctx.intent.force_role_assignment {
                Some(update(ctx.base_confidence.max(0.85), "decision_or_role"))
            } else {
                None
            }
        },
    },
    TypeOverride {
        name: "plan_change_concrete",
        apply: |ctx| {
            if ctx.intent.label() == IntentLabel::PlanChange && !ctx.strategy_only {
                Some(update(ctx.base_confidence.max(0.75), "plan_change_concrete"))
            } else {
                None
            }
        },
    },
    TypeOverride {
        name: "bsignal_rescue",
        apply: |ctx| {
            if ctx.actionability.rescued_by_bsignal {
                Some(idea(0.6, "bsignal_rescue"))
            } else {
                None
            }
        },
    },
    TypeOverride {
        name: "strategy_only_gate",
        apply: |ctx| {
            if ctx.intent.label() != IntentLabel::PlanChange || !ctx.strategy_only {
                return None;
            }
            if initiative_quality(ctx.section) {
                Some(idea(0.5, "strategy_only_gate"))
            } else {
                // Generic strategic chatter: excluded rather than force-emitted.
                Some(TypeDecision {
                    suggested_type: SuggestedType::NonActionable,
                    type_confidence: 0.0,
                    type_label: None,
                    decided_by: "strategy_only_gate",
                })
            }
        },
    },
    TypeOverride {
        name: "spec_framework_heading",
        apply: |ctx| {
            if is_spec_framework_section(ctx.section) {
                Some(idea(ctx.base_confidence.max(0.6), "spec_framework_heading"))
            } else {
                None
            }
        },
    },
    TypeOverride {
        name: "strategy_heading_bullets",
        apply: |ctx| {
            let strategy_heading = contains_any(&ctx.section.heading_text, STRATEGY_HEADING_WORDS);
            if strategy_heading
                && ctx.section.features.num_list_items >= 3
                && !has_concrete_delta(&ctx.section.raw_text)
            {
                Some(idea(ctx.base_confidence.max(0.6), "strategy_heading_bullets"))
            } else {
                None
            }
        },
    },
    TypeOverride {
        name: "new_workstream_rescue",
        apply: |ctx| {
            if ctx.base_type == SuggestedType::NonActionable && ctx.intent.new_workstream >= 0.5 {
                Some(idea(ctx.intent.new_workstream, "new_workstream_rescue"))
            } else {
                None
            }
        },
    },
];

fn update(confidence: f64, decided_by: &'static str) -> TypeDecision {
    TypeDecision {
        suggested_type: SuggestedType::ProjectUpdate,
        type_confidence: confidence.min(1.0),
        type_label: Some(SuggestionType::ProjectUpdate),
        decided_by,
    }
}

fn idea(confidence: f64, decided_by: &'static str) -> TypeDecision {
    TypeDecision {
        suggested_type: SuggestedType::Idea,
        type_confidence: confidence.min(1.0),
        type_label: Some(SuggestionType::Idea),
        decided_by,
    }
}

/// Structured "initiative quality": a mechanism verb, a system/feature noun,
/// or a concrete numeric example somewhere in the section.
fn initiative_quality(section: &Section) -> bool {
    contains_any(&section.raw_text, MECHANISM_VERBS)
        || contains_any(&section.raw_text, SYSTEM_NOUNS)
        || section.raw_text.chars().any(|c| c.is_ascii_digit())
}

/// Specification/framework section: matching heading vocabulary with no
/// timeline or delta language in the body.
pub fn is_spec_framework_section(section: &Section) -> bool {
    contains_any(&section.heading_text, SPEC_FRAMEWORK_HEADING_WORDS)
        && !contains_any(&section.heading_text, TIMELINE_HEADING_WORDS)
        && !has_concrete_delta(&section.raw_text)
}

/// Timeline section: heading matches the timeline vocabulary.
pub fn is_timeline_section(section: &Section) -> bool {
    contains_any(&section.heading_text, TIMELINE_HEADING_WORDS)
}

/// Decide the type for an actionable section.
pub fn arbitrate(
    section: &Section,
    intent: &IntentClassification,
    actionability: &ActionabilityDecision,
) -> TypeDecision {
    let (base_type, base_confidence) = base_classify(section, intent);
    let strategy_only = intent.label() == IntentLabel::PlanChange
        && !has_concrete_delta(&section.raw_text)
        && !has_schedule_event(&section.raw_text);

    let ctx = OverrideCtx {
        section,
        intent,
        actionability,
        strategy_only,
        base_type,
        base_confidence,
    };

    for ov in TYPE_OVERRIDES {
        if let Some(decision) = (ov.apply)(&ctx) {
            log::debug!(
                "Type for {}: {:?} via override '{}'",
                section.section_id,
                decision.type_label,
                ov.name
            );
            return decision;
        }
    }

    let decision = match base_type {
        SuggestedType::ProjectUpdate => update(base_confidence, "base"),
        SuggestedType::Idea => idea(base_confidence, "base"),
        _ => TypeDecision {
            suggested_type: SuggestedType::NonActionable,
            type_confidence: base_confidence,
            type_label: None,
            decided_by: "base",
        },
    };
    log::debug!(
        "Type for {}: {:?} via base classifier",
        section.section_id,
        decision.type_label
    );
    decision
}

/// Base classifier: mutation-likelihood vs artifact-likelihood from pattern
/// density, each with a 0.3-weighted contribution from the intent vector.
/// Both below 0.2 means non-actionable (subject to the rescue override).
fn base_classify(section: &Section, intent: &IntentClassification) -> (SuggestedType, f64) {
    let text = &section.raw_text;

    let mut mutation: f64 = 0.3 * intent.plan_change;
    if contains_any(text, CHANGE_OPERATORS) {
        mutation += 0.2;
    }
    if re_change_pattern().is_match(text) {
        mutation += 0.2;
    }
    if contains_any(text, DECISION_MARKERS) || re_role_assignment().is_match(text) {
        mutation += 0.2;
    }
    if has_concrete_delta(text) {
        mutation += 0.2;
    }

    let mut artifact: f64 = 0.3 * intent.new_workstream;
    if re_pm_request().is_match(text) {
        artifact += 0.2;
    }
    if contains_any(text, MECHANISM_VERBS) {
        artifact += 0.2;
    }
    if contains_any(text, &["new ", "build ", "introduce ", "propose "]) {
        artifact += 0.2;
    }
    // Bullet-heavy sections default toward updates.
    if section.features.num_list_items >= 3 {
        mutation += 0.1;
    }

    if mutation < 0.2 && artifact < 0.2 {
        return (SuggestedType::NonActionable, mutation.max(artifact));
    }
    if mutation >= artifact {
        (SuggestedType::ProjectUpdate, mutation.min(1.0))
    } else {
        (SuggestedType::Idea, artifact.min(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::intent::score_intent;
    use crate::segmenter::segment_note;

    fn decide(md: &str) -> TypeDecision {
        let section = segment_note("n1", md).remove(0);
        let intent = score_intent(&section);
        let act = crate::gate::evaluate(&section, &intent, &PipelineConfig::default());
        arbitrate(&section, &intent, &act)
    }

    #[test]
    fn override_order_is_stable() {
        let names: Vec<&str> = TYPE_OVERRIDES.iter().map(|o| o.name).collect();
        assert_eq!(
            names,
            vec![
                "decision_or_role",
                "plan_change_concrete",
                "bsignal_rescue",
                "strategy_only_gate",
                "spec_framework_heading",
                "strategy_heading_bullets",
                "new_workstream_rescue",
            ]
        );
    }

    #[test]
    fn concrete_shift_is_an_update() {
        let d = decide("# Timeline\nMove the launch from the 12th to the 19th.\n");
        assert_eq!(d.type_label, Some(SuggestionType::ProjectUpdate));
    }

    #[test]
    fn decision_marker_forces_update() {
        let d = decide("# Decisions\nDecided to go with the phased rollout for the beta.\n");
        assert_eq!(d.type_label, Some(SuggestionType::ProjectUpdate));
        assert_eq!(d.decided_by, "decision_or_role");
    }

    #[test]
    fn strategy_only_without_quality_is_excluded() {
        let d = decide("# Direction\nWe should shift from enterprise to SMB customers.\n");
        assert_eq!(d.type_label, None);
        assert_eq!(d.decided_by, "strategy_only_gate");
    }

    #[test]
    fn strategy_only_with_mechanism_becomes_idea() {
        let d = decide(
            "# Direction\nWe should shift focus and automate the SMB onboarding workflow.\n",
        );
        assert_eq!(d.type_label, Some(SuggestionType::Idea));
        assert!((d.type_confidence - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn spec_heading_is_always_idea() {
        let d = decide(
            "# Prioritization Rubric\n- Reach times impact\n- Confidence weighting\n- Effort scoring bands\n- Tie-break criteria\n",
        );
        assert_eq!(d.type_label, Some(SuggestionType::Idea));
    }

    #[test]
    fn strategy_heading_with_bullets_is_idea() {
        let d = decide(
            "# Growth Strategy\n- Improve activation emails\n- Add referral hooks\n- Build partner playbook pages\n",
        );
        assert_eq!(d.type_label, Some(SuggestionType::Idea));
    }

    #[test]
    fn idempotent() {
        let section = segment_note("n1", "# Timeline\nPush the beta by 2 weeks.\n").remove(0);
        let intent = score_intent(&section);
        let act = crate::gate::evaluate(&section, &intent, &PipelineConfig::default());
        let a = arbitrate(&section, &intent, &act);
        let b = arbitrate(&section, &intent, &act);
        assert_eq!(a.type_label, b.type_label);
        assert_eq!(a.decided_by, b.decided_by);
    }
}
