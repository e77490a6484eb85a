#![forbid(unsafe_code)]

//! Command stack shared by the undo and redo commands.
//!
//! # Invariants
//!
//! 1. `len() <= max_depth` after every push (when `max_depth > 0`).
//! 2. `is_enabled()` reflects emptiness as of the last
//!    [`refresh_availability`](CommandStack::refresh_availability).
//! 3. The synthesized set only shrinks through
//!    [`prune_synthesized`](CommandStack::prune_synthesized) and
//!    [`forget_synthesized`](CommandStack::forget_synthesized).

use std::collections::{HashMap, VecDeque};
use std::fmt;

use rewind_core::{Batch, BatchId, Operation, Selection};

/// A batch waiting to be reverted, with the selection to restore afterwards.
#[derive(Debug, Clone)]
pub struct StackItem<O> {
    pub batch: Batch<O>,
    /// Selection captured before `batch` was applied.
    pub selection: Selection,
}

/// LIFO stack of batches plus bookkeeping of the batches this command
/// produced itself.
pub struct CommandStack<O> {
    items: VecDeque<StackItem<O>>,
    /// created -> reverted
    synthesized: HashMap<BatchId, BatchId>,
    /// reverted -> created
    reverted: HashMap<BatchId, BatchId>,
    enabled: bool,
    max_depth: usize,
}

impl<O: Operation> CommandStack<O> {
    /// Create an empty stack. `max_depth == 0` means unlimited.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            items: VecDeque::new(),
            synthesized: HashMap::new(),
            reverted: HashMap::new(),
            enabled: false,
            max_depth,
        }
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Push a batch with the selection to restore when it is reverted.
    ///
    /// Evicts the oldest entries beyond `max_depth`.
    pub fn push(&mut self, batch: Batch<O>, selection: Selection) {
        self.items.push_back(StackItem { batch, selection });
        if self.max_depth > 0 {
            while self.items.len() > self.max_depth {
                if let Some(evicted) = self.items.pop_front() {
                    tracing::debug!(batch = %evicted.batch.id(), "evicted oldest stack entry");
                }
            }
        }
    }

    /// Remove and return the most recent entry.
    pub fn pop(&mut self) -> Option<StackItem<O>> {
        self.items.pop_back()
    }

    /// The most recent entry.
    #[must_use]
    pub fn peek(&self) -> Option<&StackItem<O>> {
        self.items.back()
    }

    /// Remove the entry for `id`, wherever it sits.
    pub fn remove(&mut self, id: BatchId) -> Option<StackItem<O>> {
        let idx = self.items.iter().rposition(|item| item.batch.id() == id)?;
        self.items.remove(idx)
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &StackItem<O>> {
        self.items.iter()
    }

    /// Drop every entry. The synthesized set is kept.
    pub fn clear_stack(&mut self) {
        if !self.items.is_empty() {
            tracing::info!(entries = self.items.len(), "command stack cleared");
        }
        self.items.clear();
    }

    /// Record that this command produced `created` by reverting `reverted`.
    pub fn track_synthesized(&mut self, created: BatchId, reverted: BatchId) {
        self.synthesized.insert(created, reverted);
        self.reverted.insert(reverted, created);
    }

    /// Whether this command produced `id`.
    #[must_use]
    pub fn is_synthesized(&self, id: BatchId) -> bool {
        self.synthesized.contains_key(&id)
    }

    /// The batch that `created` reverted, if this command produced it.
    #[must_use]
    pub fn reverted_by(&self, created: BatchId) -> Option<BatchId> {
        self.synthesized.get(&created).copied()
    }

    /// Whether `id` is one half of a created/reverted pair of this command.
    #[must_use]
    pub fn excludes(&self, id: BatchId) -> bool {
        self.synthesized.contains_key(&id) || self.reverted.contains_key(&id)
    }

    /// The other half of the created/reverted pair `id` belongs to.
    ///
    /// Both halves cancel out, so history walks may step over them together.
    #[must_use]
    pub fn partner(&self, id: BatchId) -> Option<BatchId> {
        self.synthesized
            .get(&id)
            .or_else(|| self.reverted.get(&id))
            .copied()
    }

    /// Number of tracked created/reverted pairs.
    #[must_use]
    pub fn synthesized_len(&self) -> usize {
        self.synthesized.len()
    }

    /// Oldest batch still waiting on this stack.
    #[must_use]
    pub fn oldest_batch(&self) -> Option<BatchId> {
        self.items.iter().map(|item| item.batch.id()).min()
    }

    /// Forget pairs created before `floor`, or every pair when there is no
    /// floor. Returns how many were dropped.
    ///
    /// A revert only walks history recorded after its own batch, so `floor`
    /// must not be newer than the oldest entry any command may still revert.
    pub fn prune_synthesized(&mut self, floor: Option<BatchId>) -> usize {
        let before = self.synthesized.len();
        match floor {
            Some(floor) => self.synthesized.retain(|created, _| *created >= floor),
            None => self.synthesized.clear(),
        }
        self.reverted = self
            .synthesized
            .iter()
            .map(|(&created, &reverted)| (reverted, created))
            .collect();
        before - self.synthesized.len()
    }

    /// Forget every synthesized batch. Only valid once the history holding
    /// them is gone.
    pub fn forget_synthesized(&mut self) {
        self.synthesized.clear();
        self.reverted.clear();
    }

    /// Recompute `is_enabled`; returns whether it changed.
    pub fn refresh_availability(&mut self) -> bool {
        let enabled = !self.items.is_empty();
        let changed = enabled != self.enabled;
        self.enabled = enabled;
        changed
    }
}

impl<O> fmt::Debug for CommandStack<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandStack")
            .field("depth", &self.items.len())
            .field("synthesized", &self.synthesized.len())
            .field("enabled", &self.enabled)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
