//! The command bus: one global queue plus one queue per entity.
//!
//! Queues are registered alongside entities and drained in a fixed order
//! (global first, then entities in registration order), which keeps the
//! message phase deterministic. During a step-processor pass every queue
//! defers inserts bus-wide, so a command draining on entity A that
//! enqueues onto entity B cannot leak work into the current step.

use crate::command::{ClearPolicy, CommandQueue};
use crate::handle::AnyHandle;
use std::collections::HashMap;
use std::mem;

// ---------------------------------------------------------------------------
// QueueId
// ---------------------------------------------------------------------------

/// Addresses one queue on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueId {
    /// The world-level queue.
    Global,
    /// The queue attached to one entity.
    Entity(AnyHandle),
}

// ---------------------------------------------------------------------------
// CommandBus
// ---------------------------------------------------------------------------

/// Owns every command queue of one world.
pub struct CommandBus<W: 'static> {
    global: CommandQueue<W>,
    entity_queues: HashMap<AnyHandle, CommandQueue<W>>,
    /// Drain order for entity queues: registration order.
    entity_order: Vec<AnyHandle>,
    /// Initial pool capacity handed to new queues.
    pool_capacity: usize,
    /// Set for the duration of a step-processor pass.
    stepping: bool,
}

impl<W: 'static> CommandBus<W> {
    pub fn new() -> Self {
        Self::with_pool_capacity(crate::command::DEFAULT_POOL_CAPACITY)
    }

    pub fn with_pool_capacity(pool_capacity: usize) -> Self {
        Self {
            global: CommandQueue::with_pool_capacity(pool_capacity),
            entity_queues: HashMap::new(),
            entity_order: Vec::new(),
            pool_capacity,
            stepping: false,
        }
    }

    // -----------------------------------------------------------------------
    // Queue management
    // -----------------------------------------------------------------------

    pub fn global(&self) -> &CommandQueue<W> {
        &self.global
    }

    pub fn global_mut(&mut self) -> &mut CommandQueue<W> {
        &mut self.global
    }

    /// Attach a queue to `handle`. No-op if one already exists.
    pub fn add_entity_queue(&mut self, handle: AnyHandle) {
        if self.entity_queues.contains_key(&handle) {
            return;
        }
        let mut queue = CommandQueue::with_pool_capacity(self.pool_capacity);
        queue.defer_inserts = self.stepping;
        self.entity_queues.insert(handle, queue);
        self.entity_order.push(handle);
    }

    /// Detach and drop `handle`'s queue, discarding any queued commands.
    pub fn remove_entity_queue(&mut self, handle: AnyHandle) -> bool {
        if self.entity_queues.remove(&handle).is_none() {
            return false;
        }
        self.entity_order.retain(|h| *h != handle);
        true
    }

    pub fn entity_queue(&self, handle: AnyHandle) -> Option<&CommandQueue<W>> {
        self.entity_queues.get(&handle)
    }

    pub fn entity_queue_mut(&mut self, handle: AnyHandle) -> Option<&mut CommandQueue<W>> {
        self.entity_queues.get_mut(&handle)
    }

    pub fn queue(&self, id: QueueId) -> Option<&CommandQueue<W>> {
        match id {
            QueueId::Global => Some(&self.global),
            QueueId::Entity(h) => self.entity_queues.get(&h),
        }
    }

    pub fn queue_mut(&mut self, id: QueueId) -> Option<&mut CommandQueue<W>> {
        match id {
            QueueId::Global => Some(&mut self.global),
            QueueId::Entity(h) => self.entity_queues.get_mut(&h),
        }
    }

    /// Every queue id in drain order: global first, then entities in
    /// registration order.
    pub fn queue_ids(&self) -> Vec<QueueId> {
        let mut ids = Vec::with_capacity(1 + self.entity_order.len());
        ids.push(QueueId::Global);
        ids.extend(self.entity_order.iter().map(|h| QueueId::Entity(*h)));
        ids
    }

    /// Enqueue onto a specific queue. Returns `false` when the queue does
    /// not exist or a signal duplicate was rejected.
    pub fn enqueue<C, F>(&mut self, id: QueueId, init: F) -> bool
    where
        C: crate::command::Command<W> + Default,
        F: FnOnce(&mut C),
    {
        match self.queue_mut(id) {
            Some(queue) => queue.enqueue::<C, F>(init),
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Draining
    // -----------------------------------------------------------------------

    /// Drain one queue's pending list: stable sort by priority descending,
    /// run each command, then apply `policy`. Enqueues made by the running
    /// commands land in next-step lists. Returns the number executed.
    pub fn execute(&mut self, id: QueueId, world: &mut W, policy: ClearPolicy) -> usize {
        let Some(queue) = self.queue_mut(id) else {
            return 0;
        };
        queue.sort_pending();
        let mut pending = mem::take(&mut queue.pending);
        let was_deferring = queue.defer_inserts;
        queue.defer_inserts = true;

        for entry in &mut pending {
            entry.cmd.run(id, self, world);
        }
        let executed = pending.len();

        // A command may have removed its own queue mid-drain; the detached
        // list is simply dropped in that case.
        let Some(queue) = self.queue_mut(id) else {
            return executed;
        };
        queue.defer_inserts = was_deferring;
        match policy {
            ClearPolicy::Clear => {
                for entry in pending {
                    queue.release_entry(entry);
                }
            }
            ClearPolicy::Keep => {
                let mut tail = mem::take(&mut queue.pending);
                queue.pending = pending;
                queue.pending.append(&mut tail);
            }
        }
        executed
    }

    // -----------------------------------------------------------------------
    // Step-processor hooks
    // -----------------------------------------------------------------------

    /// Promote every queue's next-step list to pending.
    pub(crate) fn promote_all(&mut self) {
        self.global.promote_next_step();
        for queue in self.entity_queues.values_mut() {
            queue.promote_next_step();
        }
    }

    /// Whether every pending list is empty.
    pub(crate) fn all_pending_empty(&self) -> bool {
        self.global.pending_len() == 0
            && self.entity_queues.values().all(|q| q.pending_len() == 0)
    }

    /// Defer all inserts bus-wide for the duration of one step.
    pub(crate) fn begin_step(&mut self) {
        self.stepping = true;
        self.global.defer_inserts = true;
        for queue in self.entity_queues.values_mut() {
            queue.defer_inserts = true;
        }
    }

    /// End the bus-wide insert deferral.
    pub(crate) fn end_step(&mut self) {
        self.stepping = false;
        self.global.defer_inserts = false;
        for queue in self.entity_queues.values_mut() {
            queue.defer_inserts = false;
        }
    }

    // -----------------------------------------------------------------------
    // Residuals
    // -----------------------------------------------------------------------

    /// Whether any queue carries commands deferred past a depth-capped
    /// step pass.
    pub fn has_residuals(&self) -> bool {
        self.global.next_step_len() > 0
            || self.entity_queues.values().any(|q| q.next_step_len() > 0)
    }

    /// Drop every residual next-step command. Residuals are carried across
    /// the tick boundary by default; this is the opt-in clear policy.
    pub fn clear_residuals(&mut self) {
        self.global.clear_residuals();
        for queue in self.entity_queues.values_mut() {
            queue.clear_residuals();
        }
    }

    /// Total commands pending across all queues.
    pub fn total_pending(&self) -> usize {
        self.global.pending_len()
            + self
                .entity_queues
                .values()
                .map(|q| q.pending_len())
                .sum::<usize>()
    }
}

impl<W: 'static> Default for CommandBus<W> {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
