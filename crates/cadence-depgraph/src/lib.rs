//! Dependency graph resolver for the Cadence reconciliation phase.
//!
//! Tracks handle-to-handle dependency edges (a rider depends on its
//! mount, a held item on its holder) and produces the ordering the
//! reconciliation phase walks. Two orderings are offered:
//!
//! - [`DependencyGraph::strict_order`] errors on cycles.
//! - [`DependencyGraph::feedback_order`] tolerates cycles by appending
//!   cycle members after the acyclic prefix in sorted handle order, so
//!   the result is stable across runs.
//!
//! The graph implements [`DependencyResolver`], which the orchestrator's
//! reconciliation phase consumes. Edges are plain handle pairs; nothing
//! here owns an entity, and stale handles simply stop matching the
//! active list.

use cadence_core::handle::AnyHandle;
use cadence_core::reconcile::{DependencyResolver, ResolveOutcome};
use std::collections::{HashMap, HashSet, VecDeque};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by strict ordering.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The induced subgraph contains at least one cycle.
    #[error("dependency cycle among {0} entities")]
    CycleDetected(usize),
}

// ---------------------------------------------------------------------------
// DependencyGraph
// ---------------------------------------------------------------------------

/// Handle-to-handle dependency edges with topological ordering.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// dependent -> the handles it depends on (which must come first).
    deps: HashMap<AnyHandle, Vec<AnyHandle>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent` must be processed after `dependency`.
    /// Duplicate edges and self-edges are ignored.
    pub fn add_dependency(&mut self, dependent: AnyHandle, dependency: AnyHandle) {
        if dependent == dependency {
            return;
        }
        let list = self.deps.entry(dependent).or_default();
        if !list.contains(&dependency) {
            list.push(dependency);
        }
    }

    /// Remove one edge. Returns `true` if it existed.
    pub fn remove_dependency(&mut self, dependent: AnyHandle, dependency: AnyHandle) -> bool {
        match self.deps.get_mut(&dependent) {
            Some(list) => {
                let before = list.len();
                list.retain(|h| *h != dependency);
                before != list.len()
            }
            None => false,
        }
    }

    /// Drop every edge involving `handle`. Call when an entity despawns.
    pub fn clear_entity(&mut self, handle: AnyHandle) {
        self.deps.remove(&handle);
        for list in self.deps.values_mut() {
            list.retain(|h| *h != handle);
        }
    }

    /// Drop all edges.
    pub fn clear(&mut self) {
        self.deps.clear();
    }

    /// The handles `dependent` depends on.
    pub fn dependencies_of(&self, dependent: AnyHandle) -> &[AnyHandle] {
        self.deps.get(&dependent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total edges currently recorded.
    pub fn edge_count(&self) -> usize {
        self.deps.values().map(Vec::len).sum()
    }

    // -----------------------------------------------------------------------
    // Ordering
    // -----------------------------------------------------------------------

    /// Kahn's algorithm over the subgraph induced by `entities`.
    ///
    /// Zero-in-degree nodes are seeded in input order and successors are
    /// visited in edge-insertion order, so the result is deterministic.
    /// Returns the order plus the nodes left over by cycles (empty when
    /// acyclic), the latter in input order.
    fn kahn(&self, entities: &[AnyHandle]) -> (Vec<AnyHandle>, Vec<AnyHandle>) {
        let members: HashSet<AnyHandle> = entities.iter().copied().collect();

        let mut in_degree: HashMap<AnyHandle, usize> =
            entities.iter().map(|&h| (h, 0)).collect();
        let mut successors: HashMap<AnyHandle, Vec<AnyHandle>> = HashMap::new();

        // Walk dependents in input order so successor lists, and with
        // them the queue order, never depend on hash iteration.
        for &dependent in entities {
            let Some(dependencies) = self.deps.get(&dependent) else {
                continue;
            };
            for &dependency in dependencies {
                if !members.contains(&dependency) {
                    continue;
                }
                *in_degree.entry(dependent).or_insert(0) += 1;
                successors.entry(dependency).or_default().push(dependent);
            }
        }

        let mut queue: VecDeque<AnyHandle> = entities
            .iter()
            .copied()
            .filter(|h| in_degree.get(h).copied().unwrap_or(0) == 0)
            .collect();

        let mut order = Vec::with_capacity(entities.len());
        while let Some(handle) = queue.pop_front() {
            order.push(handle);
            if let Some(nexts) = successors.get(&handle) {
                for &next in nexts {
                    if let Some(degree) = in_degree.get_mut(&next) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push_back(next);
                        }
                    }
                }
            }
        }

        let placed: HashSet<AnyHandle> = order.iter().copied().collect();
        let leftover: Vec<AnyHandle> = entities
            .iter()
            .copied()
            .filter(|h| !placed.contains(h))
            .collect();
        (order, leftover)
    }

    /// Topological order of `entities`; errors when a cycle blocks it.
    pub fn strict_order(&self, entities: &[AnyHandle]) -> Result<Vec<AnyHandle>, GraphError> {
        let (order, leftover) = self.kahn(entities);
        if leftover.is_empty() {
            Ok(order)
        } else {
            Err(GraphError::CycleDetected(leftover.len()))
        }
    }

    /// Topological order that tolerates cycles: cycle members follow the
    /// acyclic prefix in sorted handle order. Returns the order and
    /// whether a cycle was present.
    pub fn feedback_order(&self, entities: &[AnyHandle]) -> (Vec<AnyHandle>, bool) {
        let (mut order, mut leftover) = self.kahn(entities);
        let had_cycle = !leftover.is_empty();
        leftover.sort();
        order.extend(leftover);
        (order, had_cycle)
    }
}

impl DependencyResolver for DependencyGraph {
    fn resolve(&mut self, entities: &[AnyHandle], sorted: &mut Vec<AnyHandle>) -> ResolveOutcome {
        let (order, had_cycle) = self.feedback_order(entities);
        sorted.extend(order);
        if had_cycle {
            ResolveOutcome::CycleDetected
        } else {
            ResolveOutcome::Resolved
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::arena::Arena;

    fn spawn_handles(n: usize) -> Vec<AnyHandle> {
        let mut arena: Arena<u32> = Arena::new();
        (0..n)
            .map(|i| arena.spawn(i as u32).unwrap().erase())
            .collect()
    }

    #[test]
    fn empty_graph_preserves_input_order() {
        let graph = DependencyGraph::new();
        let handles = spawn_handles(3);
        let order = graph.strict_order(&handles).unwrap();
        assert_eq!(order, handles);
    }

    #[test]
    fn dependency_comes_before_dependent() {
        let mut graph = DependencyGraph::new();
        let handles = spawn_handles(3);
        // handles[0] rides handles[2]: the mount reconciles first.
        graph.add_dependency(handles[0], handles[2]);

        let order = graph.strict_order(&handles).unwrap();
        let pos = |h| order.iter().position(|&x| x == h).unwrap();
        assert!(pos(handles[2]) < pos(handles[0]));
        assert_eq!(order.len(), 3);
    }

    #[test]
    fn chain_resolves_in_depth_order() {
        let mut graph = DependencyGraph::new();
        let handles = spawn_handles(4);
        // 3 depends on 2 depends on 1 depends on 0.
        graph.add_dependency(handles[3], handles[2]);
        graph.add_dependency(handles[2], handles[1]);
        graph.add_dependency(handles[1], handles[0]);

        let order = graph.strict_order(&handles).unwrap();
        assert_eq!(order, handles);

        // Same chain presented in reverse input order still sorts.
        let reversed: Vec<AnyHandle> = handles.iter().rev().copied().collect();
        let order = graph.strict_order(&reversed).unwrap();
        assert_eq!(order, handles);
    }

    #[test]
    fn cycle_errors_in_strict_mode() {
        let mut graph = DependencyGraph::new();
        let handles = spawn_handles(2);
        graph.add_dependency(handles[0], handles[1]);
        graph.add_dependency(handles[1], handles[0]);

        let result = graph.strict_order(&handles);
        assert!(matches!(result, Err(GraphError::CycleDetected(2))));
    }

    #[test]
    fn feedback_order_appends_cycle_members_sorted() {
        let mut graph = DependencyGraph::new();
        let handles = spawn_handles(4);
        // 1 and 2 form a cycle; 0 and 3 are free.
        graph.add_dependency(handles[1], handles[2]);
        graph.add_dependency(handles[2], handles[1]);

        let (order, had_cycle) = graph.feedback_order(&handles);
        assert!(had_cycle);
        assert_eq!(order.len(), 4);
        assert_eq!(&order[..2], &[handles[0], handles[3]]);
        // Cycle members in sorted handle order.
        assert_eq!(&order[2..], &[handles[1], handles[2]]);
    }

    #[test]
    fn resolver_outcome_reflects_cycles() {
        let mut graph = DependencyGraph::new();
        let handles = spawn_handles(2);
        let mut sorted = Vec::new();
        assert_eq!(
            graph.resolve(&handles, &mut sorted),
            ResolveOutcome::Resolved
        );
        assert_eq!(sorted, handles);

        graph.add_dependency(handles[0], handles[1]);
        graph.add_dependency(handles[1], handles[0]);
        let mut sorted = Vec::new();
        assert_eq!(
            graph.resolve(&handles, &mut sorted),
            ResolveOutcome::CycleDetected
        );
        assert_eq!(sorted.len(), 2);
    }

    #[test]
    fn edges_to_outsiders_are_ignored() {
        let mut graph = DependencyGraph::new();
        let handles = spawn_handles(3);
        let outsider = spawn_handles(1)[0];
        graph.add_dependency(handles[0], outsider);

        let order = graph.strict_order(&handles).unwrap();
        assert_eq!(order, handles);
    }

    #[test]
    fn self_and_duplicate_edges_are_ignored() {
        let mut graph = DependencyGraph::new();
        let handles = spawn_handles(2);
        graph.add_dependency(handles[0], handles[0]);
        graph.add_dependency(handles[1], handles[0]);
        graph.add_dependency(handles[1], handles[0]);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn clear_entity_drops_both_directions() {
        let mut graph = DependencyGraph::new();
        let handles = spawn_handles(3);
        graph.add_dependency(handles[0], handles[1]);
        graph.add_dependency(handles[1], handles[2]);
        assert_eq!(graph.edge_count(), 2);

        graph.clear_entity(handles[1]);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn remove_dependency_unblocks_order() {
        let mut graph = DependencyGraph::new();
        let handles = spawn_handles(2);
        graph.add_dependency(handles[0], handles[1]);
        graph.add_dependency(handles[1], handles[0]);
        assert!(graph.strict_order(&handles).is_err());

        assert!(graph.remove_dependency(handles[1], handles[0]));
        assert!(!graph.remove_dependency(handles[1], handles[0]));
        let order = graph.strict_order(&handles).unwrap();
        assert_eq!(order, vec![handles[1], handles[0]]);
    }

    #[test]
    fn cycle_error_display() {
        let msg = format!("{}", GraphError::CycleDetected(3));
        assert!(msg.contains("cycle"), "got: {msg}");
        assert!(msg.contains('3'), "got: {msg}");
    }
}
