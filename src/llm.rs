//! Optional model-based intent provider and the confidence-weighted blend.
//!
//! The rule-based scorer always runs; a provider only refines its vector.
//! Blending is proportional to the provider's self-reported confidence,
//! zeroed below a floor and capped so the rules always keep a voice. Any
//! provider failure falls back to the rule vector silently.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{IntentClassification, Section};

/// Provider confidence below this contributes nothing to the blend.
const BLEND_CONFIDENCE_FLOOR: f64 = 0.3;
/// Maximum share of the blend a provider can claim.
const BLEND_WEIGHT_CAP: f64 = 0.8;

/// A model-scored intent vector with the model's own confidence in it.
#[derive(Debug, Clone)]
pub struct ProviderScores {
    pub scores: IntentClassification,
    pub confidence: f64,
}

/// Pluggable model-based intent scorer.
///
/// Implementations wrap whatever inference backend is available. The
/// pipeline treats this as advisory: errors and low confidence both
/// degrade to the rule-based vector.
#[async_trait]
pub trait IntentProvider: Send + Sync {
    async fn classify(&self, section: &Section) -> Result<ProviderScores, ProviderError>;
}

/// Blend the provider vector into the rule vector.
///
/// Weight is zero below the confidence floor, otherwise proportional to
/// confidence and capped. Override flags always come from the rules; a
/// model cannot raise or clear them.
pub fn blend(rules: &IntentClassification, provider: &ProviderScores) -> IntentClassification {
    let weight = if provider.confidence < BLEND_CONFIDENCE_FLOOR {
        0.0
    } else {
        provider.confidence.min(BLEND_WEIGHT_CAP)
    };
    let mix = |r: f64, p: f64| (1.0 - weight) * r + weight * p;
    let p = &provider.scores;
    IntentClassification {
        plan_change: mix(rules.plan_change, p.plan_change),
        new_workstream: mix(rules.new_workstream, p.new_workstream),
        status_informational: mix(rules.status_informational, p.status_informational),
        communication: mix(rules.communication, p.communication),
        research: mix(rules.research, p.research),
        calendar: mix(rules.calendar, p.calendar),
        micro_tasks: mix(rules.micro_tasks, p.micro_tasks),
        force_role_assignment: rules.force_role_assignment,
        force_decision_marker: rules.force_decision_marker,
    }
}

/// Run the provider for one section and fold the result into the rule
/// vector. Provider errors are logged and swallowed.
pub async fn refine(
    rules: IntentClassification,
    section: &Section,
    provider: &dyn IntentProvider,
) -> IntentClassification {
    match provider.classify(section).await {
        Ok(scores) => blend(&rules, &scores),
        Err(e) => {
            log::warn!(
                "Intent provider failed for {}, using rule scores: {}",
                section.section_id,
                e
            );
            rules
        }
    }
}

/// A provider that reports no opinion. Useful as a wiring default and in
/// tests that exercise the async path without a backend.
pub struct NeutralProvider;

#[async_trait]
impl IntentProvider for NeutralProvider {
    async fn classify(&self, _section: &Section) -> Result<ProviderScores, ProviderError> {
        Ok(ProviderScores {
            scores: IntentClassification::default(),
            confidence: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider(ProviderScores);

    #[async_trait]
    impl IntentProvider for FixedProvider {
        async fn classify(&self, _section: &Section) -> Result<ProviderScores, ProviderError> {
            Ok(self.0.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl IntentProvider for FailingProvider {
        async fn classify(&self, _section: &Section) -> Result<ProviderScores, ProviderError> {
            Err(ProviderError::Unavailable)
        }
    }

    fn rule_vector() -> IntentClassification {
        IntentClassification {
            plan_change: 0.8,
            new_workstream: 0.2,
            ..IntentClassification::default()
        }
    }

    fn section() -> Section {
        crate::segmenter::segment_note("n1", "Move the launch to next week.\n")
            .into_iter()
            .next()
            .unwrap()
    }

    #[test]
    fn low_confidence_contributes_nothing() {
        let provider = ProviderScores {
            scores: IntentClassification {
                communication: 1.0,
                ..IntentClassification::default()
            },
            confidence: 0.2,
        };
        let blended = blend(&rule_vector(), &provider);
        assert_eq!(blended.plan_change, 0.8);
        assert_eq!(blended.communication, 0.0);
    }

    #[test]
    fn high_confidence_is_capped() {
        let provider = ProviderScores {
            scores: IntentClassification {
                plan_change: 0.0,
                new_workstream: 1.0,
                ..IntentClassification::default()
            },
            confidence: 1.0,
        };
        let blended = blend(&rule_vector(), &provider);
        // Rules keep a 0.2 share even against a fully confident model.
        assert!((blended.plan_change - 0.2 * 0.8).abs() < 1e-9);
        assert!((blended.new_workstream - (0.2 * 0.2 + 0.8)).abs() < 1e-9);
    }

    #[test]
    fn override_flags_survive_blending() {
        let rules = IntentClassification {
            force_decision_marker: true,
            ..rule_vector()
        };
        let provider = ProviderScores {
            scores: IntentClassification::default(),
            confidence: 0.9,
        };
        assert!(blend(&rules, &provider).force_decision_marker);
    }

    #[tokio::test]
    async fn provider_errors_fall_back_to_rules() {
        let refined = refine(rule_vector(), &section(), &FailingProvider).await;
        assert_eq!(refined.plan_change, 0.8);
    }

    #[tokio::test]
    async fn provider_scores_shift_the_vector() {
        let provider = FixedProvider(ProviderScores {
            scores: IntentClassification {
                new_workstream: 1.0,
                ..IntentClassification::default()
            },
            confidence: 0.5,
        });
        let refined = refine(rule_vector(), &section(), &provider).await;
        assert!(refined.new_workstream > 0.5);
        assert!(refined.plan_change < 0.8);
    }

    #[tokio::test]
    async fn neutral_provider_is_an_identity() {
        let refined = refine(rule_vector(), &section(), &NeutralProvider).await;
        assert_eq!(refined.plan_change, 0.8);
        assert_eq!(refined.new_workstream, 0.2);
    }
}
