//! FIFO waiting lists, one per intent category
//!
//! The registry is the leaf of the system: no I/O, no clock, no
//! transport knowledge. Callers are expected to serialize access (the
//! coordinator holds a single lock over registry and room membership),
//! which is what makes `enqueue_or_match` atomic: two concurrent joins
//! for the same intent can never both see an empty queue, and a waiting
//! id is handed out as a partner exactly once.

use crate::types::{ConnectionId, Intent};
use std::collections::{HashMap, VecDeque};

/// Mapping from intent to its ordered waiting list
///
/// Invariant: a `ConnectionId` appears in at most one queue at any
/// instant, and at most once within that queue.
#[derive(Debug, Default)]
pub struct IntentQueueRegistry {
    queues: HashMap<Intent, VecDeque<ConnectionId>>,
}

impl IntentQueueRegistry {
    /// Create an empty registry covering every known intent
    pub fn new() -> Self {
        Self::default()
    }

    /// Match `id` against the head of the intent's queue, or enqueue it
    ///
    /// Returns the partner if one was waiting (removed from the queue,
    /// `id` left unenqueued), or `None` after appending `id` to the
    /// tail. Any stale queue entry for `id` is dropped first, so an id
    /// can neither wait twice nor be matched with itself.
    pub fn enqueue_or_match(&mut self, intent: Intent, id: ConnectionId) -> Option<ConnectionId> {
        self.remove(id);

        let queue = self.queues.entry(intent).or_default();
        match queue.pop_front() {
            Some(partner) => Some(partner),
            None => {
                queue.push_back(id);
                None
            }
        }
    }

    /// Remove `id` from every queue it may be waiting in
    ///
    /// Idempotent: removing an absent id is a no-op. Returns whether an
    /// entry was actually dropped.
    pub fn remove(&mut self, id: ConnectionId) -> bool {
        let mut removed = false;
        for queue in self.queues.values_mut() {
            let before = queue.len();
            queue.retain(|waiting| *waiting != id);
            removed |= queue.len() != before;
        }
        removed
    }

    /// Whether `id` is currently waiting in any queue
    pub fn is_waiting(&self, id: ConnectionId) -> bool {
        self.queues
            .values()
            .any(|queue| queue.iter().any(|waiting| *waiting == id))
    }

    /// Number of connections waiting under a specific intent
    pub fn waiting_for(&self, intent: Intent) -> usize {
        self.queues.get(&intent).map_or(0, VecDeque::len)
    }

    /// Total number of waiting connections across all intents
    pub fn waiting_count(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }
}
