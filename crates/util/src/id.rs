//! Identifier generation for process chains and output paths.
//!
//! Process chain ids are required to be opaque, non-empty and "preferably
//! time-sortable" within one compiler instance. UUIDv7 embeds a millisecond
//! timestamp in its high bits, so lexicographic order on the canonical
//! hyphenated form tracks creation order closely enough for this purpose
//! without a bespoke counter format.

use uuid::Uuid;

/// Source of fresh ids for process chains and output paths.
///
/// A trait (rather than a bare function) so tests can supply a deterministic
/// sequence instead of real UUIDs.
pub trait IdGenerator: Send {
    fn next_id(&mut self) -> String;
}

/// Default generator: time-sortable UUIDv7.
#[derive(Debug, Default)]
pub struct TimeSortableIdGenerator;

impl IdGenerator for TimeSortableIdGenerator {
    fn next_id(&mut self) -> String {
        Uuid::now_v7().to_string()
    }
}

/// Deterministic generator for tests: `prefix-0`, `prefix-1`, ...
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: u64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), next: 0 }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}
