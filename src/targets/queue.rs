use std::collections::HashMap;

use crate::dsl::PatchOperation;

/// Pending edit operations keyed by definition id.
///
/// The apply pass enqueues; whoever materializes the record drains. Enqueue
/// appends in arrival order so per-id ordering is preserved, and [`take`]
/// removes the entry, so an id drains at most once. The queue is owned by a
/// single adapter; it has no locking of its own.
///
/// [`take`]: EditQueue::take
#[derive(Debug, Default)]
pub struct EditQueue {
    by_id: HashMap<String, Vec<PatchOperation>>,
}

impl EditQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, id: &str, operations: &[PatchOperation]) {
        if id.trim().is_empty() || operations.is_empty() {
            return;
        }
        self.by_id
            .entry(fold(id))
            .or_default()
            .extend(operations.iter().cloned());
    }

    /// Remove and return everything queued for `id`.
    pub fn take(&mut self, id: &str) -> Option<Vec<PatchOperation>> {
        self.by_id.remove(&fold(id))
    }

    /// Drop everything queued for `id`. Returns whether anything was queued.
    pub fn discard(&mut self, id: &str) -> bool {
        self.by_id.remove(&fold(id)).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(&fold(id))
    }

    /// Number of ids with pending operations.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

fn fold(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}
