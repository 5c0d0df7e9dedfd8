//! Injectable identifier allocator.
//!
//! Suggestion and consolidation ids are monotonically increasing counters
//! scoped to one run. The allocator is passed into the pipeline explicitly —
//! never a process-wide singleton — so concurrent runs for different notes
//! cannot interleave identifiers, and tests can reset freely.

/// Sequence generator for suggestion and consolidation ids.
#[derive(Debug, Default)]
pub struct IdAllocator {
    suggestion_seq: u64,
    consolidation_seq: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next suggestion id, e.g. `sug-1`, `sug-2`, ...
    pub fn next_suggestion_id(&mut self) -> String {
        self.suggestion_seq += 1;
        format!("sug-{}", self.suggestion_seq)
    }

    /// Next consolidation id, e.g. `con-1`, `con-2`, ...
    pub fn next_consolidation_id(&mut self) -> String {
        self.consolidation_seq += 1;
        format!("con-{}", self.consolidation_seq)
    }

    /// Reset both sequences. Test-only in spirit, but harmless anywhere.
    pub fn reset(&mut self) {
        self.suggestion_seq = 0;
        self.consolidation_seq = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut alloc = IdAllocator::new();
        let a = alloc.next_suggestion_id();
        let b = alloc.next_suggestion_id();
        assert_eq!(a, "sug-1");
        assert_eq!(b, "sug-2");
        assert_ne!(a, b);
    }

    #[test]
    fn sequences_are_independent() {
        let mut alloc = IdAllocator::new();
        alloc.next_suggestion_id();
        assert_eq!(alloc.next_consolidation_id(), "con-1");
    }

    #[test]
    fn reset_restarts_sequences() {
        let mut alloc = IdAllocator::new();
        alloc.next_suggestion_id();
        alloc.reset();
        assert_eq!(alloc.next_suggestion_id(), "sug-1");
    }
}
