//! Generation-checked slot arena.
//!
//! Slots live in a single contiguous growable array so the index-to-slot
//! lookup stays branchless; slots are never moved. A freed slot's index
//! goes onto a free list and its generation tag is bumped, so every handle
//! issued before the despawn is permanently invalidated. Generation
//! overflow wraps; with 32-bit counters and realistic reuse rates a
//! collision is treated as impossible, and systems needing longer lifetimes
//! must layer external identifiers on top.
//!
//! The arena is single-writer. Concurrent read-only access over a stable
//! arena view (the parallel decision phase) is permitted.

use crate::handle::{AnyHandle, ArenaId, Handle};
use serde::{Deserialize, Serialize};

/// Slots allocated on first growth.
const MIN_CAPACITY: usize = 8;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by arena operations.
///
/// Stale-handle access is not an error: it surfaces as `false` / `None`
/// at the call site and produces no state change.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// The slot array could not grow. Fatal; bubbles to the host.
    #[error("arena capacity exceeded: slot storage could not grow")]
    CapacityExceeded,
}

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Slot<T> {
    /// Bumped on every despawn; a slot reused after a free hands out a
    /// strictly newer generation than any previously-issued handle to it.
    generation: u32,
    /// `Some` while the slot is occupied.
    payload: Option<T>,
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

/// A growable pool of generation-tagged slots holding `T` payloads.
#[derive(Debug)]
pub struct Arena<T> {
    id: ArenaId,
    slots: Vec<Slot<T>>,
    /// Vacated indices awaiting reuse, most recently freed last.
    free: Vec<u32>,
    /// Live slot count.
    len: usize,
}

impl<T> Arena<T> {
    /// Create an empty arena with a fresh identity.
    pub fn new() -> Self {
        Self {
            id: ArenaId::allocate(),
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// This arena's identity, carried by every handle it issues.
    pub fn id(&self) -> ArenaId {
        self.id
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total slots allocated (live + vacated).
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    // -----------------------------------------------------------------------
    // Spawn / despawn
    // -----------------------------------------------------------------------

    /// Allocate a slot for `payload` and return a fresh handle.
    ///
    /// Reuses a freed slot when one is available, otherwise grows the slot
    /// array by doubling. Growth failure is the only error path.
    pub fn spawn(&mut self, payload: T) -> Result<Handle<T>, ArenaError> {
        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.payload = Some(payload);
                index
            }
            None => {
                if self.slots.len() >= i32::MAX as usize {
                    return Err(ArenaError::CapacityExceeded);
                }
                if self.slots.len() == self.slots.capacity() {
                    let grow = self.slots.capacity().max(MIN_CAPACITY);
                    self.slots
                        .try_reserve(grow)
                        .map_err(|_| ArenaError::CapacityExceeded)?;
                }
                self.slots.push(Slot {
                    generation: 0,
                    payload: Some(payload),
                });
                (self.slots.len() - 1) as u32
            }
        };
        self.len += 1;
        let generation = self.slots[index as usize].generation;
        Ok(Handle::new(self.id, index as i32, generation))
    }

    /// Release the slot behind `handle`.
    ///
    /// Returns `true` only if the handle was valid. On success the payload
    /// is dropped, the generation is bumped, and the index joins the free
    /// list. A stale or foreign handle is a no-op returning `false`.
    pub fn despawn(&mut self, handle: Handle<T>) -> bool {
        self.despawn_any(handle.erase())
    }

    /// Type-erased [`Arena::despawn`].
    pub fn despawn_any(&mut self, handle: AnyHandle) -> bool {
        if !self.contains_any(handle) {
            return false;
        }
        let slot = &mut self.slots[handle.index() as usize];
        slot.payload = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index() as u32);
        self.len -= 1;
        true
    }

    // -----------------------------------------------------------------------
    // Validity and access
    // -----------------------------------------------------------------------

    /// Constant-time generation check on a raw (index, generation) pair.
    pub fn is_valid(&self, index: i32, generation: u32) -> bool {
        if index < 0 {
            return false;
        }
        match self.slots.get(index as usize) {
            Some(slot) => slot.generation == generation && slot.payload.is_some(),
            None => false,
        }
    }

    /// Whether `handle` currently resolves to a live slot of this arena.
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.contains_any(handle.erase())
    }

    /// Type-erased [`Arena::contains`].
    pub fn contains_any(&self, handle: AnyHandle) -> bool {
        handle.arena() == self.id && self.is_valid(handle.index(), handle.generation())
    }

    /// Read access. `None` when the handle has expired.
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.get_any(handle.erase())
    }

    /// Write access. `None` when the handle has expired.
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.get_any_mut(handle.erase())
    }

    /// Type-erased read access.
    pub fn get_any(&self, handle: AnyHandle) -> Option<&T> {
        if !self.contains_any(handle) {
            return None;
        }
        self.slots[handle.index() as usize].payload.as_ref()
    }

    /// Type-erased write access.
    pub fn get_any_mut(&mut self, handle: AnyHandle) -> Option<&mut T> {
        if !self.contains_any(handle) {
            return None;
        }
        self.slots[handle.index() as usize].payload.as_mut()
    }

    /// Iterate live slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.payload
                .as_ref()
                .map(|p| (Handle::new(self.id, i as i32, slot.generation), p))
        })
    }

    // -----------------------------------------------------------------------
    // Snapshot
    // -----------------------------------------------------------------------

    /// Capture slot occupancy, generations, payloads, and the free list.
    pub fn capture_snapshot(&self) -> ArenaSnapshot<T>
    where
        T: Clone,
    {
        ArenaSnapshot {
            generations: self.slots.iter().map(|s| s.generation).collect(),
            payloads: self.slots.iter().map(|s| s.payload.clone()).collect(),
            free: self.free.clone(),
        }
    }

    /// Replace this arena's state with `snapshot`. The arena identity is
    /// unchanged; handles issued before the matching capture resolve again.
    pub fn restore_snapshot(&mut self, snapshot: &ArenaSnapshot<T>)
    where
        T: Clone,
    {
        self.slots = snapshot
            .generations
            .iter()
            .zip(snapshot.payloads.iter())
            .map(|(&generation, payload)| Slot {
                generation,
                payload: payload.clone(),
            })
            .collect();
        self.free = snapshot.free.clone();
        self.len = self.slots.iter().filter(|s| s.payload.is_some()).count();
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// ArenaSnapshot
// ---------------------------------------------------------------------------

/// A value capture of an arena's state.
///
/// The encoding of a persisted snapshot is owned by the serialization
/// layer; this type only requires `serde` bounds on the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaSnapshot<T> {
    generations: Vec<u32>,
    payloads: Vec<Option<T>>,
    free: Vec<u32>,
}

impl<T> ArenaSnapshot<T> {
    /// Number of live payloads in the capture.
    pub fn live_count(&self) -> usize {
        self.payloads.iter().filter(|p| p.is_some()).count()
    }

    /// Slot generations in index order.
    pub fn generations(&self) -> &[u32] {
        &self.generations
    }

    /// Captured payloads in index order, `None` for vacant slots.
    pub fn payloads(&self) -> &[Option<T>] {
        &self.payloads
    }
}

// ===========================================================================
// Tests
// ===========================================================================
