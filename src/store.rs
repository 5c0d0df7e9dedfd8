//! Suggestion persistence boundary.
//!
//! The pipeline itself is pure; callers that track accept/dismiss decisions
//! persist through this trait. Upserts key on `(note_id, suggestion_key)`,
//! so regenerating a note refreshes suggestion content while every decision
//! already taken stays attached to its suggestion.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::types::Suggestion;

/// Reviewer decision on a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Pending,
    Accepted,
    Dismissed,
}

/// A persisted suggestion with its decision state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSuggestion {
    pub suggestion: Suggestion,
    pub decision: Decision,
    /// When the decision left `Pending`. Refreshing content keeps this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
}

/// Storage boundary for suggestions and decisions.
pub trait SuggestionStore: Send + Sync {
    /// Insert or refresh a suggestion. Content is replaced; an existing
    /// decision under the same `(note_id, suggestion_key)` is kept.
    fn upsert(&self, suggestion: &Suggestion) -> Result<(), PipelineError>;

    /// Record a decision for a stored suggestion.
    fn set_decision(
        &self,
        note_id: &str,
        suggestion_key: &str,
        decision: Decision,
    ) -> Result<(), PipelineError>;

    /// All stored suggestions for a note, in insertion order.
    fn for_note(&self, note_id: &str) -> Result<Vec<StoredSuggestion>, PipelineError>;
}

/// In-memory store. Backs tests and single-process embedding.
#[derive(Default)]
pub struct MemoryStore {
    // (note_id, suggestion_key) -> stored row; insertion order kept separately.
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    rows: HashMap<(String, String), StoredSuggestion>,
    order: Vec<(String, String)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SuggestionStore for MemoryStore {
    fn upsert(&self, suggestion: &Suggestion) -> Result<(), PipelineError> {
        let key = (
            suggestion.note_id.clone(),
            suggestion.suggestion_key.clone(),
        );
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| PipelineError::Provider(format!("store lock poisoned: {}", e)))?;
        match inner.rows.get_mut(&key) {
            Some(row) => {
                row.suggestion = suggestion.clone();
            }
            None => {
                inner.order.push(key.clone());
                inner.rows.insert(
                    key,
                    StoredSuggestion {
                        suggestion: suggestion.clone(),
                        decision: Decision::Pending,
                        decided_at: None,
                    },
                );
            }
        }
        Ok(())
    }

    fn set_decision(
        &self,
        note_id: &str,
        suggestion_key: &str,
        decision: Decision,
    ) -> Result<(), PipelineError> {
        let key = (note_id.to_string(), suggestion_key.to_string());
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| PipelineError::Provider(format!("store lock poisoned: {}", e)))?;
        match inner.rows.get_mut(&key) {
            Some(row) => {
                row.decision = decision;
                row.decided_at = if decision == Decision::Pending {
                    None
                } else {
                    Some(Utc::now())
                };
                Ok(())
            }
            None => Err(PipelineError::Provider(format!(
                "no suggestion {} for note {}",
                suggestion_key, note_id
            ))),
        }
    }

    fn for_note(&self, note_id: &str) -> Result<Vec<StoredSuggestion>, PipelineError> {
        let inner = self
            .inner
            .lock()
            .map_err(|e| PipelineError::Provider(format!("store lock poisoned: {}", e)))?;
        Ok(inner
            .order
            .iter()
            .filter(|(n, _)| n == note_id)
            .filter_map(|k| inner.rows.get(k).cloned())
            .collect())
    }
}
