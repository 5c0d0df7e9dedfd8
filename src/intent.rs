//! Intent scorer: per-section multi-category intent vector.
//!
//! Every body line is stripped of list markers, split into sentences, and run
//! through an ordered table of independent positive-signal rules. Each rule
//! contributes a fixed score; the sentence takes the max of its matching
//! rules, and negation zeroes the sentence outright. The section signal is
//! the max sentence score plus two bounded boosts. Out-of-scope noise
//! (calendar/communication/micro-admin) is scored per line and clamped when
//! real plan-change signal is present, so an incidental date or "send the
//! recap" mention cannot suppress a genuine roadmap change.

use crate::bsignal::split_sentences;
use crate::patterns::{
    contains_any, count_distinct, re_directive_verb, re_hedge_directive, re_implicit_need,
    re_implicit_pain, re_pm_request, re_role_assignment, re_structured_task,
    starts_with_action_verb, strip_list_marker, ACTION_VERBS, CALENDAR_MARKERS, CHANGE_OPERATORS,
    COMMUNICATION_MARKERS, COMPLETION_WORDS, DECISION_MARKERS, MICRO_ADMIN_MARKERS,
    NEGATION_PHRASES, PRODUCT_NOUNS,
};
use crate::types::{IntentClassification, Section};

/// Status-report language; routes to `status_informational`, not actionability.
const STATUS_MARKERS: &[&str] = &[
    "at risk", "blocked on", "completed", "done", "in progress", "on track", "shipped",
    "status:",
];

/// Research language; routes a small score to the `research` category.
const RESEARCH_MARKERS: &[&str] = &["explore", "investigate", "research", "spike on"];

/// Verbs accepted on the right side of a role assignment (`PM to draft ...`).
const ASSIGNMENT_VERBS: &[&str] = &[
    "confirm", "draft", "follow", "own", "present", "prototype", "review", "send", "validate",
];

/// One positive-signal rule. Rules are independent: a sentence takes the max
/// score across all rules that match, not a sum.
pub struct IntentRule {
    pub name: &'static str,
    pub score: f64,
    pub matches: fn(&str) -> bool,
}

/// The ordered rule table — a first-class artifact so ordering and scoring
/// regressions show up in diffs, not in behavior archaeology.
pub const INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        name: "directive_plus_verb",
        score: 1.0,
        matches: |s| {
            re_directive_verb()
                .captures(s)
                .map(|c| ACTION_VERBS.contains(&c[2].to_lowercase().as_str()))
                .unwrap_or(false)
        },
    },
    IntentRule {
        name: "verb_at_start",
        score: 0.9,
        matches: starts_with_action_verb,
    },
    IntentRule {
        name: "hedge_directive",
        score: 0.9,
        matches: |s| re_hedge_directive().is_match(s),
    },
    IntentRule {
        name: "role_assignment",
        score: 0.85,
        matches: |s| {
            re_role_assignment()
                .captures(s)
                .map(|c| {
                    let verb = c[2].to_lowercase();
                    ACTION_VERBS.contains(&verb.as_str()) || ASSIGNMENT_VERBS.contains(&verb.as_str())
                })
                .unwrap_or(false)
        },
    },
    IntentRule {
        name: "change_operator",
        score: 0.8,
        matches: |s| contains_any(s, CHANGE_OPERATORS),
    },
    IntentRule {
        name: "structured_task",
        score: 0.8,
        matches: |s| re_structured_task().is_match(s),
    },
    IntentRule {
        name: "implicit_pain_context",
        score: 0.76,
        matches: |s| re_implicit_pain().is_match(s),
    },
    IntentRule {
        name: "pm_request",
        score: 0.76,
        matches: |s| re_pm_request().is_match(s),
    },
    IntentRule {
        name: "decision_language",
        score: 0.7,
        matches: |s| contains_any(s, DECISION_MARKERS),
    },
    IntentRule {
        name: "implicit_need",
        score: 0.61,
        matches: |s| re_implicit_need().is_match(s) && !contains_any(s, COMPLETION_WORDS),
    },
];

/// Noise score for one line: `base` when any marker matches, plus 0.1 per
/// additional distinct marker, capped at 0.9.
fn marker_score(line: &str, markers: &[&str], base: f64) -> f64 {
    let hits = count_distinct(line, markers);
    if hits == 0 {
        0.0
    } else {
        (base + 0.1 * (hits as f64 - 1.0)).min(0.9)
    }
}

/// Score one section into the seven-category intent vector.
pub fn score_intent(section: &Section) -> IntentClassification {
    let mut best_signal: f64 = 0.0;
    let mut plan_dominant = false;
    let mut force_role_assignment = false;
    let mut force_decision_marker = false;
    let mut status_seen = false;
    let mut research_seen = false;

    let mut calendar: f64 = 0.0;
    let mut communication: f64 = 0.0;
    let mut micro_tasks: f64 = 0.0;

    let mut action_bullet_verbs: Vec<String> = Vec::new();

    for line in &section.body_lines {
        // Structured-task syntax includes the checkbox marker, so it is
        // checked on the raw line before marker stripping.
        let structured = re_structured_task().is_match(line);
        if structured {
            best_signal = best_signal.max(0.8);
            plan_dominant = true;
        }

        let stripped = strip_list_marker(line);
        if starts_with_action_verb(stripped) {
            let verb = crate::patterns::first_word(stripped);
            if !action_bullet_verbs.contains(&verb) {
                action_bullet_verbs.push(verb);
            }
        }

        for sentence in split_sentences(stripped) {
            if contains_any(&sentence, NEGATION_PHRASES) {
                continue;
            }
            let mut sentence_score: f64 = 0.0;
            for rule in INTENT_RULES {
                if (rule.matches)(&sentence) {
                    sentence_score = sentence_score.max(rule.score);
                    match rule.name {
                        "change_operator" | "structured_task" => plan_dominant = true,
                        "decision_language" => {
                            plan_dominant = true;
                            force_decision_marker = true;
                        }
                        "role_assignment" => {
                            plan_dominant = true;
                            force_role_assignment = true;
                        }
                        _ => {}
                    }
                }
            }
            best_signal = best_signal.max(sentence_score);

            if contains_any(&sentence, STATUS_MARKERS) {
                status_seen = true;
            }
            if contains_any(&sentence, RESEARCH_MARKERS) {
                research_seen = true;
            }
        }

        // Out-of-scope noise is scored per line and maxed across lines. The
        // base score rises 0.1 per additional distinct marker, so a line that
        // is wall-to-wall scheduling chatter can dominate the gate.
        calendar = calendar.max(marker_score(line, CALENDAR_MARKERS, 0.6));
        communication = communication.max(marker_score(line, COMMUNICATION_MARKERS, 0.6));
        micro_tasks = micro_tasks.max(marker_score(line, MICRO_ADMIN_MARKERS, 0.4));
    }

    let multi_verb = action_bullet_verbs.len() >= 2;
    let out_raw = calendar.max(communication).max(micro_tasks);

    // Target-object bonus: a recognized product noun sharpens an already
    // credible signal.
    if best_signal >= 0.6 && contains_any(&section.raw_text, PRODUCT_NOUNS) {
        best_signal = (best_signal + 0.2).min(1.0);
    }

    // Multi-action-verb boost: two or more distinct action-prefixed bullets
    // with low noise reads as a worked plan even without strong phrasing.
    if multi_verb && out_raw < 0.4 {
        best_signal = best_signal.max(0.8);
    }

    // Strong change signal clamps noise: incidental dates and "send the
    // recap" mentions must not suppress a real plan change.
    let strong_change = contains_any(&section.raw_text, CHANGE_OPERATORS) && best_signal >= 0.8;
    if strong_change || (multi_verb && best_signal >= 0.8) {
        calendar = calendar.min(0.3);
        communication = communication.min(0.3);
        micro_tasks = micro_tasks.min(0.3);
    }

    let (plan_change, new_workstream) = if plan_dominant {
        (best_signal, best_signal * 0.4)
    } else {
        (best_signal * 0.4, best_signal)
    };

    let intent = IntentClassification {
        plan_change,
        new_workstream,
        status_informational: if status_seen { 0.7 } else { 0.0 },
        communication,
        research: if research_seen { 0.4 } else { 0.0 },
        calendar,
        micro_tasks,
        force_role_assignment,
        force_decision_marker,
    };

    log::debug!(
        "Intent for {}: signal={:.2} dominant={} out={:.2}",
        section.section_id,
        best_signal,
        if plan_dominant { "plan_change" } else { "new_workstream" },
        intent.out_of_scope_signal()
    );
    intent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::segment_note;
    use crate::types::IntentLabel;

    fn section(md: &str) -> Section {
        segment_note("n1", md).remove(0)
    }

    #[test]
    fn directive_plus_verb_scores_full() {
        let s = section("# Plan\nWe will migrate the billing pipeline next sprint.\n");
        let intent = score_intent(&s);
        assert!(intent.actionable_signal() >= 1.0 - f64::EPSILON);
    }

    #[test]
    fn pm_request_meets_point_seven_six() {
        let s = section(
            "# Feedback\nUsers need better error visibility when background jobs fail silently.\n",
        );
        let intent = score_intent(&s);
        assert!(intent.actionable_signal() >= 0.76);
    }

    #[test]
    fn negation_zeroes_the_sentence() {
        let s = section("# Plan\nWe are not going to migrate the billing pipeline.\n");
        let intent = score_intent(&s);
        assert!(intent.actionable_signal() < 0.5);
    }

    #[test]
    fn change_operator_routes_to_plan_change() {
        let s = section("# Timeline\nPush the launch back by 2 weeks.\n");
        let intent = score_intent(&s);
        assert_eq!(intent.label(), IntentLabel::PlanChange);
        assert!(intent.plan_change > intent.new_workstream);
    }

    #[test]
    fn proposal_routes_to_new_workstream() {
        let s = section("# Feedback\nCustomers need a way to export audit logs for reviews.\n");
        let intent = score_intent(&s);
        assert_eq!(intent.label(), IntentLabel::NewWorkstream);
    }

    #[test]
    fn role_assignment_raises_flag() {
        let s = section("# Actions\nPM to draft the rollout one-pager.\n");
        let intent = score_intent(&s);
        assert!(intent.force_role_assignment);
        assert!(intent.actionable_signal() >= 0.85);
    }

    #[test]
    fn decision_language_raises_flag() {
        let s = section("# Decisions\nDecided to go with the phased rollout.\n");
        let intent = score_intent(&s);
        assert!(intent.force_decision_marker);
    }

    #[test]
    fn calendar_noise_scores_out_of_scope() {
        let s = section("# Admin\nSchedule the weekly sync and send the invite.\n");
        let intent = score_intent(&s);
        assert!(intent.calendar >= 0.6 || intent.communication >= 0.6);
    }

    #[test]
    fn strong_change_clamps_noise() {
        let s = section(
            "# Timeline\nPush the launch from the 12th to the 19th and send the invite after.\n",
        );
        let intent = score_intent(&s);
        assert!(intent.out_of_scope_signal() <= 0.3);
        assert!(intent.plan_change >= 0.8);
    }

    #[test]
    fn multi_action_bullets_boost_signal() {
        let s = section("# Next\n- Improve the export flow\n- Add retry logic to sync\n");
        let intent = score_intent(&s);
        assert!(intent.actionable_signal() >= 0.8);
    }

    #[test]
    fn structured_task_syntax_scores() {
        let s = section("# Tasks\n- [ ] Wire the audit log exporter\n");
        let intent = score_intent(&s);
        assert!(intent.actionable_signal() >= 0.8);
        assert_eq!(intent.label(), IntentLabel::PlanChange);
    }
}
