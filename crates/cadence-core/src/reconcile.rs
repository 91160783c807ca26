//! Reconciliation-phase collaborator interfaces and the
//! dependency-sorted serial stage.
//!
//! Position reconciliation must visit entities in dependency order (a
//! rider after its mount, a held item after its holder). The order comes
//! from an external [`DependencyResolver`]; the core only guarantees that
//! the permutation it returns is honored and that a reported cycle
//! degrades to a stable fallback order instead of aborting the phase.

use crate::handle::AnyHandle;
use crate::hooks::Ruleset;
use crate::world::World;

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Result of a dependency resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// `sorted` is a topological order of the input.
    Resolved,
    /// The dependency graph contains at least one cycle. `sorted` may
    /// still hold a stable fallback permutation; reconciliation proceeds.
    CycleDetected,
}

/// Produces a dependency-ordered permutation of the active entity list.
///
/// Cycle detection is the resolver's responsibility. Whether cycle
/// members are skipped or emitted in an arbitrary stable order is the
/// resolver's choice; the core runs whatever permutation comes back.
pub trait DependencyResolver {
    fn resolve(&mut self, entities: &[AnyHandle], sorted: &mut Vec<AnyHandle>) -> ResolveOutcome;
}

/// Applies position reconciliation to one entity.
pub trait PositionReconciler<R: Ruleset> {
    fn reconcile(&mut self, world: &mut World<R>, handle: AnyHandle);
}

// ---------------------------------------------------------------------------
// Dependency-sorted dispatch
// ---------------------------------------------------------------------------

/// Run `resolver` over `entities` and invoke `reconciler` per handle in
/// the resulting order.
///
/// When the resolver returns a permutation that does not cover the input
/// (some resolvers stop on cycles), the untouched input order is used as
/// the stable fallback. Returns the resolver's outcome.
pub fn reconcile_in_dependency_order<R: Ruleset>(
    resolver: &mut dyn DependencyResolver,
    reconciler: &mut dyn PositionReconciler<R>,
    world: &mut World<R>,
    entities: &[AnyHandle],
) -> ResolveOutcome {
    let mut sorted = Vec::with_capacity(entities.len());
    let outcome = resolver.resolve(entities, &mut sorted);

    let order: &[AnyHandle] = if sorted.len() == entities.len() {
        &sorted
    } else {
        entities
    };
    for &handle in order {
        reconciler.reconcile(world, handle);
    }
    outcome
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{RecordingReconciler, TestPayload, TestRules};

    struct ReverseResolver;

    impl DependencyResolver for ReverseResolver {
        fn resolve(
            &mut self,
            entities: &[AnyHandle],
            sorted: &mut Vec<AnyHandle>,
        ) -> ResolveOutcome {
            sorted.extend(entities.iter().rev());
            ResolveOutcome::Resolved
        }
    }

    struct GiveUpResolver;

    impl DependencyResolver for GiveUpResolver {
        fn resolve(
            &mut self,
            _entities: &[AnyHandle],
            _sorted: &mut Vec<AnyHandle>,
        ) -> ResolveOutcome {
            ResolveOutcome::CycleDetected
        }
    }

    fn world_with(n: usize) -> (World<TestRules>, Vec<AnyHandle>) {
        let mut world = World::new();
        let handles = (0..n)
            .map(|_| world.spawn_entity(TestPayload::default()).unwrap())
            .collect();
        (world, handles)
    }

    #[test]
    fn resolver_permutation_is_honored() {
        let (mut world, handles) = world_with(3);
        let mut reconciler = RecordingReconciler::new();
        let visited = reconciler.visited();

        let outcome = reconcile_in_dependency_order(
            &mut ReverseResolver,
            &mut reconciler,
            &mut world,
            &handles,
        );

        assert_eq!(outcome, ResolveOutcome::Resolved);
        let seen = visited.lock().unwrap();
        assert_eq!(*seen, vec![handles[2], handles[1], handles[0]]);
    }

    #[test]
    fn cycle_fallback_uses_input_order() {
        let (mut world, handles) = world_with(3);
        let mut reconciler = RecordingReconciler::new();
        let visited = reconciler.visited();

        let outcome = reconcile_in_dependency_order(
            &mut GiveUpResolver,
            &mut reconciler,
            &mut world,
            &handles,
        );

        assert_eq!(outcome, ResolveOutcome::CycleDetected);
        let seen = visited.lock().unwrap();
        assert_eq!(*seen, handles);
    }
}
