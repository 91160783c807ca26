//! Host-provided collaborator hooks.
//!
//! The core owns sequencing and storage; the host owns game meaning. A
//! [`Ruleset`] bundles the host's three type choices (entity payload,
//! action category set, input state), and the traits here are the seams the
//! orchestrator calls through each tick. None of them are implemented
//! inside the core outside of test stubs.

use crate::action::{ActionId, ExecutableAction};
use crate::handle::AnyHandle;
use crate::world::World;

// ---------------------------------------------------------------------------
// Ruleset
// ---------------------------------------------------------------------------

/// Type-level configuration of a game world.
///
/// Implemented once per game on a zero-sized marker type:
///
/// ```rust,ignore
/// struct MyGame;
/// impl Ruleset for MyGame {
///     type Payload = Fighter;
///     type Category = Limb;
///     type Input = PadState;
/// }
/// ```
pub trait Ruleset: Sized + 'static {
    /// Per-entity simulation state stored in the arena.
    type Payload: Send + Sync + 'static;

    /// The finite action category set.
    type Category: crate::action::ActionCategory;

    /// Per-entity input state sampled by the decision phase. Opaque to the
    /// core; judgments interpret it.
    type Input: Send + Sync + 'static;
}

// ---------------------------------------------------------------------------
// Collaborator hooks
// ---------------------------------------------------------------------------

/// Samples input for an entity at decision time.
///
/// Called from the parallel decision phase, so implementations must be
/// thread-safe and must not mutate observable state.
pub trait InputProvider<R: Ruleset>: Send + Sync {
    fn input_state(&self, handle: AnyHandle) -> R::Input;
}

/// Instantiates executable actions from the ids proposed by judgments.
///
/// Returning `None` for an unknown id makes the execution phase skip that
/// selection; the running action (if any) is left in place.
pub trait ActionFactory<R: Ruleset> {
    fn create(
        &mut self,
        action: ActionId,
        category: R::Category,
    ) -> Option<Box<dyn ExecutableAction<R>>>;
}

/// Releases an entity's resources during the cleanup phase.
///
/// Invoked once per entity marked for deletion, before the registry entry
/// and command queue are removed. The canonical implementation despawns
/// the arena slot; hosts may also return payloads to object pools, notify
/// spawn controllers, and so on.
pub trait EntityDespawner<R: Ruleset> {
    fn despawn(&mut self, world: &mut World<R>, handle: AnyHandle);
}
