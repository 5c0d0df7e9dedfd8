//! notesift: deterministic extraction of roadmap suggestions from meeting notes.
//!
//! A note goes in as markdown; what comes out is a ranked list of
//! [`types::Suggestion`] values, each one either a `project_update` (a
//! concrete change to an existing plan) or an `idea` (a draft for a new
//! initiative), grounded in verbatim evidence spans from the note.
//!
//! The whole classification path is rule-based and deterministic. An
//! optional model-backed [`llm::IntentProvider`] can refine the intent
//! vector, but it only ever blends into the rule scores and every failure
//! degrades to the rule-only path.
//!
//! Entry points live in [`pipeline`]: `run_note` for plain runs,
//! `run_note_debug` for runs that keep the per-stage drop ledger, and
//! `run_note_with_provider` for the async refined path.

pub mod arbiter;
pub mod bsignal;
pub mod config;
pub mod consolidate;
pub mod enforce;
pub mod error;
pub mod gate;
pub mod identity;
pub mod idgen;
pub mod intent;
pub mod llm;
pub mod patterns;
pub mod pipeline;
pub mod rank;
pub mod segmenter;
pub mod store;
pub mod synthesize;
pub mod title;
pub mod types;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use idgen::IdAllocator;
pub use pipeline::{run_note, run_note_debug, run_note_with_provider};
pub use types::{DebugRunResult, RunResult, Suggestion, SuggestionType};
