//! The game world: entity arena plus registry, with state hashing.
//!
//! A `World` is instantiated per game world; there is no module-level
//! state. The orchestrator owns one and threads it through every phase.

use crate::arena::{Arena, ArenaError, ArenaSnapshot};
use crate::handle::AnyHandle;
use crate::hooks::Ruleset;
use crate::registry::{EntityContext, EntityRegistry};

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Entity storage and per-entity context for one simulation instance.
pub struct World<R: Ruleset> {
    /// Payload storage. Single-writer; parallel stages take read views.
    pub arena: Arena<R::Payload>,
    /// Per-entity simulation context.
    pub registry: EntityRegistry<R>,
}

impl<R: Ruleset> World<R> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            registry: EntityRegistry::new(),
        }
    }

    /// Spawn a payload and register its context in one step.
    pub fn spawn_entity(&mut self, payload: R::Payload) -> Result<AnyHandle, ArenaError> {
        let handle = self.arena.spawn(payload)?.erase();
        self.registry.register(handle);
        Ok(handle)
    }

    /// Whether `handle` resolves to a live arena slot.
    pub fn is_valid(&self, handle: AnyHandle) -> bool {
        self.arena.contains_any(handle)
    }

    /// The registry context for `handle`, if registered.
    pub fn context(&self, handle: AnyHandle) -> Option<&EntityContext<R>> {
        self.registry.get_context(handle)
    }

    /// Mutable registry context for `handle`, if registered.
    pub fn context_mut(&mut self, handle: AnyHandle) -> Option<&mut EntityContext<R>> {
        self.registry.get_context_mut(handle)
    }

    /// Capture the arena's state. Registry context (running actions,
    /// judgments) holds host trait objects and is reconstructed by the
    /// host after a restore.
    pub fn capture_snapshot(&self) -> ArenaSnapshot<R::Payload>
    where
        R::Payload: Clone,
    {
        self.arena.capture_snapshot()
    }

    /// Restore the arena's state from a capture.
    pub fn restore_snapshot(&mut self, snapshot: &ArenaSnapshot<R::Payload>)
    where
        R::Payload: Clone,
    {
        self.arena.restore_snapshot(snapshot);
    }

    /// Structural state hash: slot generations, occupancy, and live-list
    /// order. Payload bytes are the host's to contribute via
    /// [`World::state_hash_with`].
    pub fn state_hash(&self) -> u64 {
        self.state_hash_with(|_, _| {})
    }

    /// Structural state hash extended with host-supplied payload bytes.
    pub fn state_hash_with(&self, mut write_payload: impl FnMut(&mut StateHash, &R::Payload)) -> u64 {
        let mut hash = StateHash::new();
        for (handle, payload) in self.arena.iter() {
            hash.write_u32(handle.index() as u32);
            hash.write_u32(handle.generation());
            write_payload(&mut hash, payload);
        }
        for handle in self.registry.all_entities() {
            hash.write_u32(handle.index() as u32);
        }
        hash.finish()
    }
}

impl<R: Ruleset> Default for World<R> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A simple deterministic hash of simulation state for desync detection.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    /// Start a new hash.
    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    /// Feed bytes into the hash.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    /// Feed a u32 into the hash.
    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    /// Feed a u64 into the hash.
    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    /// Feed an i32 into the hash.
    pub fn write_i32(&mut self, v: i32) {
        self.write(&v.to_le_bytes());
    }

    /// Finalize and return the hash value.
    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
