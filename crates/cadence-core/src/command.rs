//! Deferred, priority-ordered commands with pooling and signal dedup.
//!
//! Commands are the only sanctioned mutation path for logical entity
//! state: collision results, status changes, and knockback all become
//! commands drained during the message phase. Each queue keeps a pending
//! list for the current step and a next-step list for enqueues made while
//! draining, so a drain never observes its own inserts.
//!
//! Command objects are pooled per (queue, command type). Release clears
//! only the queue-side signal marker; fields are left untouched for the
//! next enqueue's init closure to overwrite.

use crate::bus::{CommandBus, QueueId};
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};

/// Pooled objects pre-allocated per command type.
pub const DEFAULT_POOL_CAPACITY: usize = 8;

// ---------------------------------------------------------------------------
// Command trait
// ---------------------------------------------------------------------------

/// A deferred mutation request executed during a queue drain.
///
/// `W` is the state a drain mutates (the game [`World`](crate::world::World)
/// in the orchestrator). Commands carry their own target handle as a field
/// populated by the enqueue init closure. `run` receives the bus so a
/// command may enqueue follow-ups; those land in next-step lists and
/// execute no earlier than the following step.
///
/// `run` must not panic; a command that wishes to signal failure does so
/// through the payload contract (world state), never by unwinding.
pub trait Command<W>: Any {
    /// Drain order: larger priorities run earlier. Ties break by enqueue
    /// order.
    fn priority(&self) -> i32 {
        0
    }

    /// Signal commands are deduplicated: at most one instance per type is
    /// present in a queue at any instant.
    fn is_signal(&self) -> bool {
        false
    }

    /// Execute against the world. `queue` is the id of the queue being
    /// drained, for commands that re-target themselves.
    fn run(&mut self, queue: QueueId, bus: &mut CommandBus<W>, world: &mut W);

    /// Downcast hook used by the pool to hand typed access to the init
    /// closure.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// What `execute` does with the pending list once drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClearPolicy {
    /// Return command objects to the pool and clear their signal markers.
    #[default]
    Clear,
    /// Preserve the drained list (and signal markers) for replay.
    Keep,
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

pub(crate) struct CommandPool<W: 'static> {
    free: HashMap<TypeId, Vec<Box<dyn Command<W>>>>,
    initial_capacity: usize,
}

impl<W: 'static> CommandPool<W> {
    fn new(initial_capacity: usize) -> Self {
        Self {
            free: HashMap::new(),
            initial_capacity,
        }
    }

    fn acquire<C: Command<W> + Default>(&mut self) -> Box<dyn Command<W>> {
        if let Some(list) = self.free.get_mut(&TypeId::of::<C>())
            && let Some(cmd) = list.pop()
        {
            return cmd;
        }
        Box::new(C::default())
    }

    fn release(&mut self, type_id: TypeId, cmd: Box<dyn Command<W>>) {
        self.free
            .entry(type_id)
            .or_insert_with(|| Vec::with_capacity(self.initial_capacity))
            .push(cmd);
    }

    fn pooled_count(&self, type_id: TypeId) -> usize {
        self.free.get(&type_id).map(Vec::len).unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

pub(crate) struct QueueEntry<W: 'static> {
    pub(crate) priority: i32,
    pub(crate) seq: u64,
    pub(crate) type_id: TypeId,
    pub(crate) signal: bool,
    pub(crate) cmd: Box<dyn Command<W>>,
}

/// A command queue: pending list, next-step list, signal markers, pool.
///
/// Drains are driven through the owning [`CommandBus`]; the queue itself
/// only accepts enqueues and bookkeeping queries.
pub struct CommandQueue<W: 'static> {
    pub(crate) pending: Vec<QueueEntry<W>>,
    pub(crate) next_step: Vec<QueueEntry<W>>,
    pub(crate) signals: HashSet<TypeId>,
    pub(crate) pool: CommandPool<W>,
    /// While set, enqueues land in the next-step list. Raised for the
    /// queue's own drain and for the whole of a step-processor pass.
    pub(crate) defer_inserts: bool,
    next_seq: u64,
}

impl<W: 'static> CommandQueue<W> {
    pub fn new() -> Self {
        Self::with_pool_capacity(DEFAULT_POOL_CAPACITY)
    }

    pub fn with_pool_capacity(initial_capacity: usize) -> Self {
        Self {
            pending: Vec::new(),
            next_step: Vec::new(),
            signals: HashSet::new(),
            pool: CommandPool::new(initial_capacity),
            defer_inserts: false,
            next_seq: 0,
        }
    }

    /// Acquire a pooled `C`, populate it with `init`, and queue it.
    ///
    /// Returns `false` without queuing when `C` is a signal command whose
    /// marker is already set; the pooled object goes straight back.
    pub fn enqueue<C, F>(&mut self, init: F) -> bool
    where
        C: Command<W> + Default,
        F: FnOnce(&mut C),
    {
        let type_id = TypeId::of::<C>();
        let mut cmd = self.pool.acquire::<C>();
        if let Some(typed) = cmd.as_any_mut().downcast_mut::<C>() {
            init(typed);
        }

        let signal = cmd.is_signal();
        if signal {
            if self.signals.contains(&type_id) {
                self.pool.release(type_id, cmd);
                return false;
            }
            self.signals.insert(type_id);
        }

        let entry = QueueEntry {
            priority: cmd.priority(),
            seq: self.next_seq,
            type_id,
            signal,
            cmd,
        };
        self.next_seq += 1;
        if self.defer_inserts {
            self.next_step.push(entry);
        } else {
            self.pending.push(entry);
        }
        true
    }

    /// Commands awaiting the current step.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Commands deferred to the next step.
    pub fn next_step_len(&self) -> usize {
        self.next_step.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.next_step.is_empty()
    }

    /// Whether the signal marker for `C` is set.
    pub fn has_signal<C: Command<W>>(&self) -> bool {
        self.signals.contains(&TypeId::of::<C>())
    }

    /// Objects of `C` currently resting in the pool.
    pub fn pooled_count<C: Command<W>>(&self) -> usize {
        self.pool.pooled_count(TypeId::of::<C>())
    }

    /// Move the next-step list onto the pending list, preserving order.
    pub(crate) fn promote_next_step(&mut self) {
        self.pending.append(&mut self.next_step);
    }

    /// Sort pending by priority descending, enqueue order on ties.
    pub(crate) fn sort_pending(&mut self) {
        self.pending
            .sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));
    }

    /// Return a drained entry to the pool, clearing its signal marker.
    pub(crate) fn release_entry(&mut self, entry: QueueEntry<W>) {
        if entry.signal {
            self.signals.remove(&entry.type_id);
        }
        self.pool.release(entry.type_id, entry.cmd);
    }

    /// Drop residual next-step commands (opt-in clear-on-exceed policy).
    pub fn clear_residuals(&mut self) {
        let residuals: Vec<_> = self.next_step.drain(..).collect();
        for entry in residuals {
            self.release_entry(entry);
        }
    }
}

impl<W: 'static> Default for CommandQueue<W> {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
