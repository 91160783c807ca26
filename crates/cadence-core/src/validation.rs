//! Validation tools: world coherence checks, state diffing, and
//! determinism verification.
//!
//! The coherence check walks the cross-references the runtime maintains
//! (registry handle -> arena slot, entity queue -> registry context) and
//! reports anything dangling. The diff and determinism helpers compare
//! two worlds slot by slot to pinpoint where parallel runs diverged.

use crate::bus::CommandBus;
use crate::handle::AnyHandle;
use crate::hooks::Ruleset;
use crate::orchestrator::Orchestrator;
use crate::tick::TickDuration;
use crate::world::World;
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// Coherence
// ---------------------------------------------------------------------------

/// A broken cross-reference inside one world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoherenceIssue {
    /// A registered handle no longer resolves to a live arena slot.
    StaleRegistryHandle(AnyHandle),
    /// A live arena slot has no registry context.
    UnregisteredSlot(AnyHandle),
    /// A command queue is attached to a handle with no context.
    OrphanQueue(AnyHandle),
    /// A registered entity has no command queue.
    MissingQueue(AnyHandle),
    /// The registry's live list repeats a handle.
    DuplicateLiveEntry(AnyHandle),
}

/// Check registry/arena/bus cross-references. Empty result = coherent.
///
/// Steady-state worlds driven through the orchestrator stay coherent by
/// construction; this exists for host-driven surgery (manual unregister,
/// snapshot restore) and for test assertions.
pub fn validate_world<R: Ruleset>(
    world: &World<R>,
    bus: &CommandBus<World<R>>,
) -> Vec<CoherenceIssue> {
    let mut issues = Vec::new();

    let mut seen: HashSet<AnyHandle> = HashSet::new();
    for &handle in world.registry.all_entities() {
        if !seen.insert(handle) {
            issues.push(CoherenceIssue::DuplicateLiveEntry(handle));
        }
        if !world.arena.contains_any(handle) {
            issues.push(CoherenceIssue::StaleRegistryHandle(handle));
        }
        if bus.entity_queue(handle).is_none() {
            issues.push(CoherenceIssue::MissingQueue(handle));
        }
    }

    for (handle, _) in world.arena.iter() {
        let handle = handle.erase();
        if !world.registry.exists(handle) {
            issues.push(CoherenceIssue::UnregisteredSlot(handle));
        }
    }

    for id in bus.queue_ids() {
        if let crate::bus::QueueId::Entity(handle) = id
            && !world.registry.exists(handle)
        {
            issues.push(CoherenceIssue::OrphanQueue(handle));
        }
    }

    issues
}

// ---------------------------------------------------------------------------
// State diff
// ---------------------------------------------------------------------------

/// Difference between two worlds at the entity level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityDiff {
    /// Slot live only in world A.
    OnlyInA(AnyHandle),
    /// Slot live only in world B.
    OnlyInB(AnyHandle),
    /// Slot live in both with unequal payloads.
    PayloadMismatch(AnyHandle),
    /// Slot live in both under different generations.
    GenerationMismatch { index: i32, a: u32, b: u32 },
}

/// Full diff between two worlds.
#[derive(Debug, Clone)]
pub struct WorldDiff {
    pub is_identical: bool,
    pub entity_diffs: Vec<EntityDiff>,
    pub live_count_a: usize,
    pub live_count_b: usize,
}

/// Quick hash-level comparison. Structural only; feed payload bytes
/// through [`World::state_hash_with`] for content sensitivity.
pub fn quick_compare<R: Ruleset>(a: &World<R>, b: &World<R>) -> bool {
    a.state_hash() == b.state_hash()
}

/// Compute a detailed entity-level diff between two worlds.
pub fn diff_worlds<R: Ruleset>(a: &World<R>, b: &World<R>) -> WorldDiff
where
    R::Payload: PartialEq,
{
    let mut entity_diffs = Vec::new();

    let b_by_index: std::collections::HashMap<i32, (AnyHandle, &R::Payload)> = b
        .arena
        .iter()
        .map(|(h, p)| (h.index(), (h.erase(), p)))
        .collect();

    let mut matched: HashSet<i32> = HashSet::new();
    for (handle_a, payload_a) in a.arena.iter() {
        match b_by_index.get(&handle_a.index()) {
            None => entity_diffs.push(EntityDiff::OnlyInA(handle_a.erase())),
            Some((handle_b, payload_b)) => {
                matched.insert(handle_a.index());
                if handle_a.generation() != handle_b.generation() {
                    entity_diffs.push(EntityDiff::GenerationMismatch {
                        index: handle_a.index(),
                        a: handle_a.generation(),
                        b: handle_b.generation(),
                    });
                } else if payload_a != *payload_b {
                    entity_diffs.push(EntityDiff::PayloadMismatch(handle_a.erase()));
                }
            }
        }
    }
    for (handle_b, _) in b.arena.iter() {
        if !matched.contains(&handle_b.index()) {
            entity_diffs.push(EntityDiff::OnlyInB(handle_b.erase()));
        }
    }

    WorldDiff {
        is_identical: entity_diffs.is_empty() && a.registry.len() == b.registry.len(),
        entity_diffs,
        live_count_a: a.arena.len(),
        live_count_b: b.arena.len(),
    }
}

// ---------------------------------------------------------------------------
// Determinism
// ---------------------------------------------------------------------------

/// Result of a two-run determinism check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    pub deterministic: bool,
    /// First frame (1-based) at which the structural hashes diverged.
    pub first_divergence_frame: Option<u64>,
}

/// Build two identical runs and advance them in lockstep for `frames`,
/// comparing structural hashes after every frame.
///
/// `build` must produce a fully-wired orchestrator with identical
/// initial state each call; any divergence means something in the run
/// is order- or time-dependent.
pub fn validate_determinism<R, F>(build: F, frames: u64, dt: TickDuration) -> DeterminismResult
where
    R: Ruleset,
    F: Fn() -> Orchestrator<R>,
{
    let mut a = build();
    let mut b = build();

    for frame in 1..=frames {
        a.advance(dt);
        b.advance(dt);
        if a.world().state_hash() != b.world().state_hash() {
            return DeterminismResult {
                deterministic: false,
                first_divergence_frame: Some(frame),
            };
        }
    }
    DeterminismResult {
        deterministic: true,
        first_divergence_frame: None,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
