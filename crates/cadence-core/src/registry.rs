//! Entity registry: per-entity simulation context keyed by handle.
//!
//! The registry maps type-erased handles to [`EntityContext`] values and
//! keeps an insertion-ordered live list so serial stages iterate in a
//! stable order. Deletion is two-step: [`EntityRegistry::mark_for_deletion`]
//! can be called at any time, but the context survives until the cleanup
//! phase calls [`EntityRegistry::process_deletions`], preserving mid-frame
//! reference integrity.

use crate::action::ActionStateMachine;
use crate::handle::AnyHandle;
use crate::hooks::Ruleset;
use crate::judgment::Judgment;
use std::collections::HashMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// EntityContext
// ---------------------------------------------------------------------------

/// Everything the core tracks for one live entity.
///
/// Owned exclusively by the registry; anything else addresses the entity
/// by handle and re-resolves through the registry each time.
pub struct EntityContext<R: Ruleset> {
    /// The handle this context was registered under.
    pub handle: AnyHandle,
    /// One running-action slot per category.
    pub actions: ActionStateMachine<R>,
    /// Judgments the decision phase evaluates for this entity.
    pub judgments: Vec<Arc<dyn Judgment<R>>>,
    /// Optional handle of the LOD controller staging this entity.
    pub lod_controller: Option<AnyHandle>,
    /// Optional handle of the spawn controller that created this entity.
    pub spawn_controller: Option<AnyHandle>,
    /// Inactive entities are skipped by active-only stage filters.
    pub is_active: bool,
    marked_for_deletion: bool,
}

impl<R: Ruleset> EntityContext<R> {
    fn new(handle: AnyHandle) -> Self {
        Self {
            handle,
            actions: ActionStateMachine::new(),
            judgments: Vec::new(),
            lod_controller: None,
            spawn_controller: None,
            is_active: true,
            marked_for_deletion: false,
        }
    }

    /// Whether this entity is awaiting the cleanup phase.
    pub fn is_marked_for_deletion(&self) -> bool {
        self.marked_for_deletion
    }
}

// ---------------------------------------------------------------------------
// EntityRegistry
// ---------------------------------------------------------------------------

/// Handle-to-context map with a stable, insertion-ordered live list.
pub struct EntityRegistry<R: Ruleset> {
    contexts: HashMap<AnyHandle, EntityContext<R>>,
    live: Vec<AnyHandle>,
}

impl<R: Ruleset> EntityRegistry<R> {
    pub fn new() -> Self {
        Self {
            contexts: HashMap::new(),
            live: Vec::new(),
        }
    }

    /// Create a fresh context for `handle`.
    ///
    /// Registering a handle that is already present resets its context in
    /// place (same live-list position). Re-registering a reused slot index
    /// under an advanced generation is a distinct handle and appends a new
    /// live entry.
    pub fn register(&mut self, handle: AnyHandle) -> &mut EntityContext<R> {
        if !self.contexts.contains_key(&handle) {
            self.live.push(handle);
        }
        let ctx = self
            .contexts
            .entry(handle)
            .or_insert_with(|| EntityContext::new(handle));
        *ctx = EntityContext::new(handle);
        ctx
    }

    /// Remove `handle` immediately. Returns `true` if it was registered.
    ///
    /// Normal deletion goes through `mark_for_deletion` +
    /// `process_deletions`; direct unregistration exists for world
    /// teardown and host-driven rollback.
    pub fn unregister(&mut self, handle: AnyHandle) -> bool {
        if self.contexts.remove(&handle).is_none() {
            return false;
        }
        self.live.retain(|h| *h != handle);
        true
    }

    /// Whether `handle` has a context.
    pub fn exists(&self, handle: AnyHandle) -> bool {
        self.contexts.contains_key(&handle)
    }

    pub fn get_context(&self, handle: AnyHandle) -> Option<&EntityContext<R>> {
        self.contexts.get(&handle)
    }

    pub fn get_context_mut(&mut self, handle: AnyHandle) -> Option<&mut EntityContext<R>> {
        self.contexts.get_mut(&handle)
    }

    /// Flag `handle` for removal in the next cleanup phase. Returns `false`
    /// for unregistered handles. The context stays fully observable until
    /// `process_deletions` runs.
    pub fn mark_for_deletion(&mut self, handle: AnyHandle) -> bool {
        match self.contexts.get_mut(&handle) {
            Some(ctx) => {
                ctx.marked_for_deletion = true;
                true
            }
            None => false,
        }
    }

    /// Handles currently flagged for deletion, in live-list order.
    pub fn marked_for_deletion(&self) -> Vec<AnyHandle> {
        self.live
            .iter()
            .copied()
            .filter(|h| {
                self.contexts
                    .get(h)
                    .is_some_and(|ctx| ctx.marked_for_deletion)
            })
            .collect()
    }

    /// Remove every flagged context. Returns the removed handles in
    /// live-list order.
    ///
    /// This drops registry state only; arena slots and command queues are
    /// untouched. The cleanup phase runs the external despawner over the
    /// marked set first, calls this, then detaches the removed entities'
    /// command queues. A host driving removal by hand must do the same or
    /// the world fails the coherence checks in
    /// [`validation`](crate::validation).
    pub fn process_deletions(&mut self) -> Vec<AnyHandle> {
        let removed = self.marked_for_deletion();
        for handle in &removed {
            self.contexts.remove(handle);
        }
        self.live.retain(|h| !removed.contains(h));
        removed
    }

    /// All registered handles in insertion order.
    pub fn all_entities(&self) -> &[AnyHandle] {
        &self.live
    }

    /// Registered handles with `is_active` set, in insertion order.
    /// Entities marked for deletion remain included until cleanup runs.
    pub fn active_entities(&self) -> Vec<AnyHandle> {
        self.live
            .iter()
            .copied()
            .filter(|h| self.contexts.get(h).is_some_and(|ctx| ctx.is_active))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

impl<R: Ruleset> Default for EntityRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
