//! Threshold configuration for the pipeline.
//!
//! All knobs live here so test fixtures can tighten or loosen gates without
//! touching stage code. Defaults mirror the tuned production values.

use serde::{Deserialize, Serialize};

/// Weights for the overall score combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreWeights {
    pub actionability: f64,
    pub type_choice: f64,
    pub synthesis: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            actionability: 0.4,
            type_choice: 0.3,
            synthesis: 0.3,
        }
    }
}

/// Pipeline thresholds and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Minimum actionable signal for the threshold check.
    pub action_threshold: f64,
    /// Out-of-scope signal level that can veto a section.
    pub out_of_scope_threshold: f64,
    /// Margin by which out-of-scope must exceed in-scope to veto.
    pub out_of_scope_margin: f64,
    /// Added to the threshold for sections with at most `short_section_lines` lines.
    pub short_section_penalty: f64,
    pub short_section_lines: usize,
    /// Borderline-short rejection: sections with at most this many lines and a
    /// margin below this value are rejected unless rescued.
    pub borderline_lines: usize,
    pub borderline_margin: f64,
    /// Minimum b-signal confidence that rescues a below-threshold section.
    pub bsignal_rescue_min: f64,
    /// Signal floor applied to rescued sections.
    pub bsignal_rescue_floor: f64,
    /// Minimum characters for the dense-paragraph trigger on multi-sentence text.
    pub dense_min_chars: usize,
    /// Display cap for `idea` suggestions. `None` means uncapped. Updates are
    /// never capped regardless of this value.
    pub max_idea_suggestions: Option<usize>,
    /// Overall score below which an unprotected candidate is dropped.
    pub min_overall: f64,
    pub weights: ScoreWeights,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            action_threshold: 0.6,
            out_of_scope_threshold: 0.75,
            out_of_scope_margin: 0.2,
            short_section_penalty: 0.1,
            short_section_lines: 2,
            borderline_lines: 3,
            borderline_margin: 0.1,
            bsignal_rescue_min: 0.65,
            bsignal_rescue_floor: 0.7,
            dense_min_chars: 250,
            max_idea_suggestions: None,
            min_overall: 0.45,
            weights: ScoreWeights::default(),
        }
    }
}
