//! UI-local id generation.
//!
//! Ids are a supplied capability: every function that mints ids takes an
//! `&mut dyn IdGenerator`, so transforms stay pure and tests can use
//! [`SequentialIds`].

use uuid::Uuid;

use super::UiId;

/// Source of fresh UI-local ids.
pub trait IdGenerator {
    /// Returns an id not returned before by this generator.
    fn next_id(&mut self) -> UiId;
}

/// Random UUID v4 ids, as minted by the browser client.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&mut self) -> UiId {
        UiId::new(Uuid::new_v4().to_string())
    }
}

/// Deterministic ids `<prefix>-1`, `<prefix>-2`, ...
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    /// Creates a generator with the given prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> UiId {
        let id = UiId::new(format!("{}-{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}
