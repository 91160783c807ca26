//! Pipeline stages: serial, parallel, and queue-draining systems.
//!
//! A system group is an ordered list of stages executed in definition
//! order. Serial stages get the whole filtered entity list and mutable
//! world access; parallel stages are invoked per entity against a shared
//! read view and must write surviving results to an out-of-stage sink;
//! queue-drain stages run the step processor over the command bus.

use crate::bus::CommandBus;
use crate::handle::AnyHandle;
use crate::hooks::Ruleset;
use crate::registry::EntityContext;
use crate::step::StepProcessor;
use crate::tick::{TickDuration, Ticks};
use crate::world::World;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

// ---------------------------------------------------------------------------
// SystemContext
// ---------------------------------------------------------------------------

/// Per-dispatch context handed to every stage.
///
/// The cancel signal is set by the host to request early termination;
/// parallel workers observe it at entity boundaries and in-flight entity
/// invocations complete. The fatal flag stops the pipeline after the
/// current stage.
pub struct SystemContext {
    pub delta_ticks: TickDuration,
    pub current_tick: Ticks,
    pub frame_count: u64,
    cancel: Arc<AtomicBool>,
    fatal: AtomicBool,
}

impl SystemContext {
    pub(crate) fn new(
        delta_ticks: TickDuration,
        current_tick: Ticks,
        frame_count: u64,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            delta_ticks,
            current_tick,
            frame_count,
            cancel,
            fatal: AtomicBool::new(false),
        }
    }

    /// Whether the host has requested early termination.
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Stop the pipeline after the current stage completes.
    pub fn raise_fatal(&self) {
        self.fatal.store(true, Ordering::Relaxed);
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Stage traits
// ---------------------------------------------------------------------------

/// A stage given the full filtered entity list, in registry insertion
/// order. Must be deterministic given its inputs.
pub trait SerialSystem<R: Ruleset> {
    fn name(&self) -> &str;

    fn run(
        &mut self,
        world: &mut World<R>,
        bus: &mut CommandBus<World<R>>,
        entities: &[AnyHandle],
        ctx: &SystemContext,
    );
}

/// A stage invoked independently per entity with no cross-entity state.
///
/// Invocations share a read view of the world; results that must survive
/// the stage go to a thread-safe sink such as a
/// [`DecisionBuffer`](crate::judgment::DecisionBuffer), whose
/// handle-ordered drain makes downstream consumption deterministic.
pub trait ParallelSystem<R: Ruleset>: Send + Sync {
    fn name(&self) -> &str;

    fn run_entity(&self, world: &World<R>, handle: AnyHandle, ctx: &SystemContext);
}

/// The three stage variants.
pub enum SystemKind<R: Ruleset> {
    Serial(Box<dyn SerialSystem<R>>),
    Parallel(Box<dyn ParallelSystem<R>>),
    /// Runs the step processor over the command bus.
    QueueDrain(StepProcessor),
}

// ---------------------------------------------------------------------------
// Query filter
// ---------------------------------------------------------------------------

/// Which entities a stage receives. `All` is the `None`-query of the
/// dispatch contract: every registered entity.
pub enum Query<R: Ruleset> {
    All,
    /// Entities with `is_active` set. Entities marked for deletion remain
    /// included until the cleanup phase removes them.
    ActiveOnly,
    /// Host predicate over the entity context.
    Predicate(fn(&EntityContext<R>) -> bool),
}

impl<R: Ruleset> Query<R> {
    pub(crate) fn evaluate(&self, world: &World<R>) -> Vec<AnyHandle> {
        match self {
            Query::All => world.registry.all_entities().to_vec(),
            Query::ActiveOnly => world.registry.active_entities(),
            Query::Predicate(pred) => world
                .registry
                .all_entities()
                .iter()
                .copied()
                .filter(|h| world.registry.get_context(*h).is_some_and(pred))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// SystemEntry / SystemGroup
// ---------------------------------------------------------------------------

/// One stage plus its dispatch settings.
pub struct SystemEntry<R: Ruleset> {
    pub(crate) label: String,
    pub(crate) kind: SystemKind<R>,
    pub enabled: bool,
    pub filter: Query<R>,
}

static NEXT_GROUP_ID: AtomicU64 = AtomicU64::new(1);

/// An ordered list of stages. Execution order is definition order.
///
/// Each group carries a process-unique id; the pipeline keys its
/// per-frame query cache on (group id, stage index), so stage labels are
/// for display and [`SystemGroup::set_enabled`] lookup only.
pub struct SystemGroup<R: Ruleset> {
    id: u64,
    systems: Vec<SystemEntry<R>>,
}

impl<R: Ruleset> SystemGroup<R> {
    pub fn new() -> Self {
        Self {
            id: NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed),
            systems: Vec::new(),
        }
    }

    fn push_entry(&mut self, label: String, kind: SystemKind<R>, filter: Query<R>) {
        assert!(
            !self.systems.iter().any(|s| s.label == label),
            "duplicate stage label '{label}' in system group"
        );
        self.systems.push(SystemEntry {
            label,
            kind,
            enabled: true,
            filter,
        });
    }

    /// Append a serial stage. Returns `self` for chaining.
    ///
    /// # Panics
    ///
    /// Panics if a stage with the same label is already in the group.
    pub fn with_serial(mut self, system: Box<dyn SerialSystem<R>>, filter: Query<R>) -> Self {
        let label = system.name().to_string();
        self.push_entry(label, SystemKind::Serial(system), filter);
        self
    }

    /// Append a parallel stage.
    ///
    /// # Panics
    ///
    /// Panics if a stage with the same label is already in the group.
    pub fn with_parallel(mut self, system: Box<dyn ParallelSystem<R>>, filter: Query<R>) -> Self {
        let label = system.name().to_string();
        self.push_entry(label, SystemKind::Parallel(system), filter);
        self
    }

    /// Append a queue-drain stage.
    ///
    /// # Panics
    ///
    /// Panics if a stage with the same label is already in the group.
    pub fn with_queue_drain(mut self, label: &str, processor: StepProcessor) -> Self {
        self.push_entry(label.to_string(), SystemKind::QueueDrain(processor), Query::All);
        self
    }

    /// This group's process-unique identity.
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Toggle a stage by label. Returns `false` if no stage matches.
    pub fn set_enabled(&mut self, label: &str, enabled: bool) -> bool {
        match self.systems.iter_mut().find(|s| s.label == label) {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn labels(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    pub(crate) fn systems_mut(&mut self) -> &mut [SystemEntry<R>] {
        &mut self.systems
    }
}

impl<R: Ruleset> Default for SystemGroup<R> {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
