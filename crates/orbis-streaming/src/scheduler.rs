//! Overflow queue for tile creations deferred by the per-tick budget.

use std::collections::VecDeque;

use orbis_cubesphere::TileKey;
use rustc_hash::FxHashSet;

/// Deduplicating FIFO of tile keys awaiting creation.
#[derive(Debug, Default)]
pub struct UpdateScheduler {
    queue: VecDeque<TileKey>,
    /// Keys currently in `queue` (dedup guard).
    pending: FxHashSet<TileKey>,
}

impl UpdateScheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key` unless it is already queued.
    ///
    /// Returns `false` if the key was already present.
    pub fn enqueue_if_absent(&mut self, key: TileKey) -> bool {
        if !self.pending.insert(key) {
            return false;
        }
        self.queue.push_back(key);
        true
    }

    /// Pop keys in FIFO order and hand each to `create` until `budget`
    /// creations succeed or the queue is empty.
    ///
    /// A key leaves the membership set before `create` runs. Keys whose
    /// creation fails are dropped, not re-queued, and do not count against
    /// the budget. Returns the number of successful creations.
    pub fn drain(&mut self, budget: usize, mut create: impl FnMut(TileKey) -> bool) -> usize {
        let mut created = 0;
        while created < budget {
            let Some(key) = self.queue.pop_front() else {
                break;
            };
            self.pending.remove(&key);
            if create(key) {
                created += 1;
            }
        }
        created
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.pending.contains(key)
    }

    /// Number of queued keys.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queued keys in FIFO order.
    pub fn iter(&self) -> impl Iterator<Item = &TileKey> {
        self.queue.iter()
    }

    /// Empty the queue and the membership set.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.pending.clear();
    }
}
