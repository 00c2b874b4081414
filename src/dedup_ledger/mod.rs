//! DedupLedger - Seen alarm ids for one session generation
//!
//! ## Responsibilities
//!
//! - Remember every alarm emitted during the current generation
//! - Refuse duplicates and inserts beyond the batch threshold
//!
//! The ledger is never trimmed. Reaching the threshold ends the generation
//! and the SessionController replaces the whole ledger on restart.

use crate::models::AlarmEvent;
use std::collections::HashMap;

/// Per-generation alarm ledger
#[derive(Debug)]
pub struct DedupLedger {
    seen: HashMap<String, AlarmEvent>,
    capacity: usize,
}

impl DedupLedger {
    /// Create an empty ledger bounded by `capacity`
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.seen.contains_key(event_id)
    }

    /// Record an event
    ///
    /// Returns `false` (ledger unchanged) when the id is already known or
    /// the ledger is full.
    pub fn insert(&mut self, event: AlarmEvent) -> bool {
        if self.is_full() || self.contains(&event.event_id) {
            return false;
        }
        self.seen.insert(event.event_id.clone(), event);
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Batch threshold reached
    pub fn is_full(&self) -> bool {
        self.seen.len() >= self.capacity
    }

}

impl Default for DedupLedger {
    fn default() -> Self {
        Self::new(crate::state::defaults::BATCH_THRESHOLD)
    }
}
