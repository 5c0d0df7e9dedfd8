//! Error types for the pipeline boundary.
//!
//! The rule-based path never fails for well-formed input; errors exist only
//! at the crate boundary (malformed input) and the optional provider path
//! (transport failures, which callers treat as non-fatal).

use thiserror::Error;

/// Errors surfaced at the pipeline boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Note id is empty")]
    EmptyNoteId,

    #[error("Note has no content")]
    EmptyNote,

    #[error("Provider error: {0}")]
    Provider(String),
}

/// Errors from the optional model-based intent provider.
///
/// Every variant is non-fatal to the pipeline: on any provider error the
/// caller silently substitutes the rule-based vector. No retries, no backoff.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider transport error: {0}")]
    Transport(String),

    #[error("Provider returned a malformed response: {0}")]
    MalformedResponse(String),

    #[error("Provider unavailable")]
    Unavailable,
}
