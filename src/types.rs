//! Core data model for the note-to-suggestion pipeline.
//!
//! `Section` is read-only input from the segmenter. Everything downstream
//! (`ClassifiedSection`, `Candidate`, `Suggestion`) is created fresh on every
//! run — stages never mutate prior-run objects. Outward-facing types serialize
//! camelCase for the UI layer; tag enums serialize snake_case.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Structural features computed by the segmenter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralFeatures {
    /// Non-empty body lines.
    pub num_lines: usize,
    /// Lines that are list items (`-`, `*`, `+`, `1.`).
    pub num_list_items: usize,
    /// Whether any explicit date appears in the body.
    pub has_dates: bool,
}

/// A headed slice of a note. Immutable input to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub note_id: String,
    pub section_id: String,
    pub heading_text: String,
    /// ATX heading level; 0 for a preamble section with no heading.
    pub heading_level: u8,
    pub body_lines: Vec<String>,
    pub features: StructuralFeatures,
    /// Original text of the section (heading line plus body), verbatim.
    pub raw_text: String,
    /// 1-based line numbers in the source note.
    pub start_line: usize,
    pub end_line: usize,
}

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// The seven intent categories, in fixed argmax tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentLabel {
    PlanChange,
    NewWorkstream,
    StatusInformational,
    Communication,
    Research,
    Calendar,
    MicroTasks,
}

/// Multi-category intent score vector for one section, plus the cross-stage
/// override flags the scorer raises.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentClassification {
    pub plan_change: f64,
    pub new_workstream: f64,
    pub status_informational: f64,
    pub communication: f64,
    pub research: f64,
    pub calendar: f64,
    pub micro_tasks: f64,
    #[serde(default)]
    pub force_role_assignment: bool,
    #[serde(default)]
    pub force_decision_marker: bool,
}

impl IntentClassification {
    /// Scores in fixed category order, for argmax and blending.
    pub fn scores(&self) -> [f64; 7] {
        [
            self.plan_change,
            self.new_workstream,
            self.status_informational,
            self.communication,
            self.research,
            self.calendar,
            self.micro_tasks,
        ]
    }

    /// Argmax category; ties resolve in fixed field order. An all-zero
    /// vector reads as status-informational, not as a plan change.
    pub fn label(&self) -> IntentLabel {
        if self.scores().iter().all(|s| *s == 0.0) {
            return IntentLabel::StatusInformational;
        }
        const LABELS: [IntentLabel; 7] = [
            IntentLabel::PlanChange,
            IntentLabel::NewWorkstream,
            IntentLabel::StatusInformational,
            IntentLabel::Communication,
            IntentLabel::Research,
            IntentLabel::Calendar,
            IntentLabel::MicroTasks,
        ];
        let scores = self.scores();
        let mut best = 0;
        for (i, s) in scores.iter().enumerate().skip(1) {
            if *s > scores[best] {
                best = i;
            }
        }
        LABELS[best]
    }

    /// Strongest in-scope (actionable) signal.
    pub fn actionable_signal(&self) -> f64 {
        self.plan_change.max(self.new_workstream)
    }

    /// Strongest out-of-scope (noise) signal.
    pub fn out_of_scope_signal(&self) -> f64 {
        self.calendar.max(self.communication).max(self.micro_tasks)
    }
}

// ---------------------------------------------------------------------------
// Per-section decisions
// ---------------------------------------------------------------------------

/// Outcome of the actionability gate for one section.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionabilityDecision {
    pub actionable: bool,
    pub reason: &'static str,
    pub actionable_signal: f64,
    pub out_of_scope_signal: f64,
    /// Raised when a below-threshold section was rescued by a sentence-level
    /// signal; forces `idea` at the type stage.
    pub rescued_by_bsignal: bool,
}

/// Suggested type as seen by the arbiter before label resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedType {
    Idea,
    ProjectUpdate,
    NonActionable,
    Undefined,
}

/// Final suggestion type. Risk/bug arrive from collaborator flows and are
/// carried through ranking and identity like ideas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    Idea,
    ProjectUpdate,
    Risk,
    Bug,
}

impl SuggestionType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idea => "idea",
            Self::ProjectUpdate => "project_update",
            Self::Risk => "risk",
            Self::Bug => "bug",
        }
    }
}

/// Outcome of the type arbiter for one section.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDecision {
    pub suggested_type: SuggestedType,
    pub type_confidence: f64,
    /// Single source of truth for the emitted type. `None` when the section
    /// is excluded. Disagreement with `suggested_type` resolves in favor of
    /// this field.
    pub type_label: Option<SuggestionType>,
    /// Name of the override that decided the type, or `"base"`.
    pub decided_by: &'static str,
}

/// Section plus every per-section decision.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedSection {
    pub section: Section,
    pub intent: IntentClassification,
    pub actionability: ActionabilityDecision,
    pub type_decision: TypeDecision,
}

// ---------------------------------------------------------------------------
// Suggestions
// ---------------------------------------------------------------------------

/// A grounded slice of source text backing a suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceSpan {
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
}

/// Type-specific payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionPayload {
    /// Proposed replacement description for an existing initiative.
    AfterDescription { after_description: String },
    /// Draft for a new initiative.
    DraftInitiative { title: String, description: String },
}

/// Score breakdown for one suggestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionScores {
    pub section_actionability: f64,
    pub type_choice_confidence: f64,
    pub synthesis_confidence: f64,
    pub overall: f64,
}

/// Routing hints for the accept flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRouting {
    /// Whether accepting creates a new initiative (true for ideas).
    pub create_new: bool,
}

/// Display context for the accept/dismiss card.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionContext {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_preview: Option<String>,
    pub source_section_id: String,
    pub source_heading: String,
}

/// The unit of output: one proposed roadmap update or initiative idea.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub suggestion_id: String,
    pub note_id: String,
    pub section_id: String,
    #[serde(rename = "type")]
    pub kind: SuggestionType,
    pub title: String,
    pub payload: SuggestionPayload,
    pub evidence_spans: Vec<EvidenceSpan>,
    pub scores: SuggestionScores,
    pub routing: SuggestionRouting,
    /// Stable content-derived key for dedup and decision persistence.
    pub suggestion_key: String,
    pub is_high_confidence: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_clarification: Option<String>,
    pub context: SuggestionContext,
}

// ---------------------------------------------------------------------------
// Candidate provenance (internal, threaded between stages)
// ---------------------------------------------------------------------------

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    /// Synthesized from the whole section.
    SectionSynthesis,
    /// Extracted from one sentence by a b-signal (index within the section).
    BSignal { sentence_index: usize },
    /// Manufactured by the final emission enforcer.
    Enforcer,
}

/// A suggestion in flight, with the provenance record later stages key off.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub suggestion: Suggestion,
    pub source: CandidateSource,
    /// Section-level actionability carried forward for threshold exemptions.
    pub section_actionable: bool,
    /// Per-candidate delta eligibility: for b-signal candidates this is
    /// evaluated on the sentence alone, never inherited from siblings.
    pub has_concrete_delta: bool,
    /// Intent argmax of the parent section.
    pub intent_label: IntentLabel,
}

// ---------------------------------------------------------------------------
// Run output & instrumentation
// ---------------------------------------------------------------------------

/// Stage at which a section or candidate was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DropStage {
    Actionability,
    Type,
    Validation,
    Threshold,
    SplitIntoSubsections,
    InternalError,
}

/// One drop record in the debug ledger.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub section_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_title: Option<String>,
    pub drop_stage: DropStage,
    pub drop_reason: String,
}

/// Result of a pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub suggestions: Vec<Suggestion>,
}

/// Result of a debug run: same suggestions plus the instrumentation ledger.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugRunResult {
    pub suggestions: Vec<Suggestion>,
    pub ledger: Vec<LedgerEntry>,
}
