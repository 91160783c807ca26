//! Generation-checked entity handles.
//!
//! A handle is `(arena identity, slot index, generation)`. The typed form
//! [`Handle<T>`] additionally tags the arena's payload type; the type-erased
//! form [`AnyHandle`] is what the registry, queues, and collaborator
//! interfaces traffic in. Handles are trivially copyable; staleness is
//! detected at the arena, never at the handle itself.
//!
//! Two handles to the same slot from different arena generations never
//! compare equal: hashing and equality combine the slot index with the
//! generation tag.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};

// ---------------------------------------------------------------------------
// Arena identity
// ---------------------------------------------------------------------------

/// Identifies one arena instance. `ArenaId::NONE` marks the invalid handle.
///
/// Identities are allocated in creation order from a process-wide counter;
/// they carry no logical state and never appear in snapshots.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ArenaId(u32);

static NEXT_ARENA_ID: AtomicU32 = AtomicU32::new(1);

impl ArenaId {
    /// The absent arena identity carried by invalid handles.
    pub const NONE: Self = Self(0);

    /// Allocate a fresh, process-unique identity.
    pub(crate) fn allocate() -> Self {
        Self(NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Whether this is the absent identity.
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

// ---------------------------------------------------------------------------
// AnyHandle
// ---------------------------------------------------------------------------

/// A type-erased handle: arena identity, slot index, generation.
///
/// The registry and command queues key on this form. Convert back to a
/// typed [`Handle`] with [`AnyHandle::typed`]; the cast is unchecked and
/// validity is still decided by the owning arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnyHandle {
    arena: ArenaId,
    index: i32,
    generation: u32,
}

impl AnyHandle {
    /// The invalid handle: no arena, index -1, generation 0.
    pub const INVALID: Self = Self {
        arena: ArenaId::NONE,
        index: -1,
        generation: 0,
    };

    pub(crate) fn new(arena: ArenaId, index: i32, generation: u32) -> Self {
        Self {
            arena,
            index,
            generation,
        }
    }

    pub fn arena(self) -> ArenaId {
        self.arena
    }

    pub fn index(self) -> i32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }

    /// Re-tag with a payload type. Unchecked; the arena still decides
    /// validity on every access.
    pub fn typed<T>(self) -> Handle<T> {
        Handle {
            arena: self.arena,
            index: self.index,
            generation: self.generation,
            _marker: PhantomData,
        }
    }
}

impl Default for AnyHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl Hash for AnyHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl fmt::Debug for AnyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "AnyHandle(invalid)")
        } else {
            write!(f, "AnyHandle({}v{})", self.index, self.generation)
        }
    }
}

// ---------------------------------------------------------------------------
// Handle<T>
// ---------------------------------------------------------------------------

/// A typed handle into an [`Arena<T>`](crate::arena::Arena).
///
/// Trivially copyable regardless of `T`. Equality, ordering, and hashing
/// ignore the payload type tag and combine index with generation.
pub struct Handle<T> {
    arena: ArenaId,
    index: i32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// The invalid handle: no arena, index -1, generation 0.
    pub const INVALID: Self = Self {
        arena: ArenaId::NONE,
        index: -1,
        generation: 0,
        _marker: PhantomData,
    };

    pub(crate) fn new(arena: ArenaId, index: i32, generation: u32) -> Self {
        Self {
            arena,
            index,
            generation,
            _marker: PhantomData,
        }
    }

    pub fn arena(self) -> ArenaId {
        self.arena
    }

    pub fn index(self) -> i32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }

    /// Drop the payload type tag.
    pub fn erase(self) -> AnyHandle {
        AnyHandle {
            arena: self.arena,
            index: self.index,
            generation: self.generation,
        }
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.arena == other.arena
            && self.index == other.index
            && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.arena, self.index, self.generation).cmp(&(
            other.arena,
            other.index,
            other.generation,
        ))
    }
}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::INVALID
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.erase() == AnyHandle::INVALID {
            write!(f, "Handle(invalid)")
        } else {
            write!(f, "Handle({}v{})", self.index, self.generation)
        }
    }
}

impl<T> From<Handle<T>> for AnyHandle {
    fn from(h: Handle<T>) -> Self {
        h.erase()
    }
}

impl<T> Serialize for Handle<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.erase().serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Handle<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(AnyHandle::deserialize(deserializer)?.typed())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
