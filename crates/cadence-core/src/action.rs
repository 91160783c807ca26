//! Per-entity action state machines.
//!
//! An entity runs at most one action per *category* (e.g. upper-body vs.
//! lower-body). The category set is a host-supplied finite enumeration
//! iterated at compile time through [`ActionCategory::ALL`]; the machine
//! keeps one optional running slot per category and advances all of them
//! with a single [`ActionStateMachine::tick`]. Completed actions are
//! cleared at the end of the tick, never mid-advance.

use crate::hooks::Ruleset;
use crate::judgment::Judgment;
use crate::tick::{TickDuration, Ticks};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// A host-supplied finite label set partitioning an entity's concurrent
/// actions.
///
/// `ALL` enumerates every variant; `index` must be its position in `ALL`.
/// The default implementation derives the index by search, which is fine
/// for the handful of categories real games use.
pub trait ActionCategory: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Every category, in a fixed order.
    const ALL: &'static [Self];

    /// Position of this category within [`ActionCategory::ALL`].
    fn index(self) -> usize {
        Self::ALL.iter().position(|c| *c == self).unwrap_or(0)
    }
}

/// Identifies an action template known to the host's action factory.
/// Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionId(pub u32);

// ---------------------------------------------------------------------------
// ExecutableAction
// ---------------------------------------------------------------------------

/// A tickable in-progress action for one entity and one category.
///
/// Instantiated by the host's action factory during the execution phase
/// and advanced by the owning [`ActionStateMachine`] until complete.
pub trait ExecutableAction<R: Ruleset>: Send + Sync {
    /// The category slot this action occupies.
    fn category(&self) -> R::Category;

    /// Called once when the action is installed into its slot.
    fn on_enter(&mut self) {}

    /// Advance by `dt`.
    fn tick(&mut self, dt: TickDuration);

    /// Ticks elapsed since `on_enter`.
    fn elapsed_ticks(&self) -> Ticks;

    /// Whether the action has finished. Complete actions are removed at
    /// the end of the machine's tick.
    fn is_complete(&self) -> bool;

    /// Whether the decision phase may preempt this action.
    fn can_cancel(&self) -> bool {
        true
    }

    /// Judgments allowed to transition out of this action while it runs.
    /// Empty means the action cannot be preempted by any judgment.
    fn transitionable_judgments(&self) -> Vec<Arc<dyn Judgment<R>>> {
        Vec::new()
    }
}

// ---------------------------------------------------------------------------
// ActionStateMachine
// ---------------------------------------------------------------------------

/// One optional running action per category.
pub struct ActionStateMachine<R: Ruleset> {
    slots: Vec<Option<Box<dyn ExecutableAction<R>>>>,
}

impl<R: Ruleset> ActionStateMachine<R> {
    /// Create a machine with every category slot empty.
    pub fn new() -> Self {
        Self {
            slots: (0..R::Category::ALL.len()).map(|_| None).collect(),
        }
    }

    /// Install `action` into its category slot, replacing any current
    /// action, and invoke its `on_enter`.
    pub fn start_action(&mut self, category: R::Category, mut action: Box<dyn ExecutableAction<R>>) {
        action.on_enter();
        self.slots[category.index()] = Some(action);
    }

    /// Advance every running action by `dt`, then clear the slots whose
    /// actions report complete.
    pub fn tick(&mut self, dt: TickDuration) {
        for slot in &mut self.slots {
            if let Some(action) = slot {
                action.tick(dt);
            }
        }
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(|a| a.is_complete()) {
                *slot = None;
            }
        }
    }

    /// The running action for `category`, if any.
    pub fn current_action(&self, category: R::Category) -> Option<&dyn ExecutableAction<R>> {
        self.slots[category.index()].as_deref()
    }

    /// Drop the running action for `category` without completing it.
    pub fn clear(&mut self, category: R::Category) {
        self.slots[category.index()] = None;
    }

    /// Whether no category has a running action.
    pub fn is_idle(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Number of categories with a running action.
    pub fn running_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

impl<R: Ruleset> Default for ActionStateMachine<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Ruleset> fmt::Debug for ActionStateMachine<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_map();
        for (i, category) in R::Category::ALL.iter().enumerate() {
            list.entry(category, &self.slots[i].is_some());
        }
        list.finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{CountdownAction, TestCategory, TestRules};

    fn countdown(category: TestCategory, duration: i32) -> Box<dyn ExecutableAction<TestRules>> {
        Box::new(CountdownAction::new(category, TickDuration::from_ticks(duration)))
    }

    #[test]
    fn new_machine_is_idle() {
        let machine: ActionStateMachine<TestRules> = ActionStateMachine::new();
        assert!(machine.is_idle());
        assert_eq!(machine.running_count(), 0);
        assert!(machine.current_action(TestCategory::Movement).is_none());
    }

    #[test]
    fn start_action_invokes_on_enter_and_occupies_slot() {
        let mut machine: ActionStateMachine<TestRules> = ActionStateMachine::new();
        machine.start_action(TestCategory::Combat, countdown(TestCategory::Combat, 3));

        let running = machine.current_action(TestCategory::Combat).unwrap();
        assert_eq!(running.elapsed_ticks(), 0);
        assert!(!running.is_complete());
        assert!(machine.current_action(TestCategory::Movement).is_none());
        assert_eq!(machine.running_count(), 1);
    }

    #[test]
    fn tick_advances_all_categories() {
        let mut machine: ActionStateMachine<TestRules> = ActionStateMachine::new();
        machine.start_action(TestCategory::Movement, countdown(TestCategory::Movement, 10));
        machine.start_action(TestCategory::Combat, countdown(TestCategory::Combat, 10));

        machine.tick(TickDuration::from_ticks(4));

        assert_eq!(
            machine
                .current_action(TestCategory::Movement)
                .unwrap()
                .elapsed_ticks(),
            4
        );
        assert_eq!(
            machine
                .current_action(TestCategory::Combat)
                .unwrap()
                .elapsed_ticks(),
            4
        );
    }

    #[test]
    fn completed_actions_cleared_at_end_of_tick() {
        let mut machine: ActionStateMachine<TestRules> = ActionStateMachine::new();
        machine.start_action(TestCategory::Combat, countdown(TestCategory::Combat, 3));

        machine.tick(TickDuration::from_ticks(2));
        assert!(machine.current_action(TestCategory::Combat).is_some());

        machine.tick(TickDuration::from_ticks(1));
        assert!(machine.current_action(TestCategory::Combat).is_none());
        assert!(machine.is_idle());
    }

    #[test]
    fn start_replaces_running_action() {
        let mut machine: ActionStateMachine<TestRules> = ActionStateMachine::new();
        machine.start_action(TestCategory::Combat, countdown(TestCategory::Combat, 100));
        machine.tick(TickDuration::from_ticks(50));

        machine.start_action(TestCategory::Combat, countdown(TestCategory::Combat, 100));
        assert_eq!(
            machine
                .current_action(TestCategory::Combat)
                .unwrap()
                .elapsed_ticks(),
            0
        );
    }

    #[test]
    fn infinite_action_never_completes() {
        let mut machine: ActionStateMachine<TestRules> = ActionStateMachine::new();
        machine.start_action(
            TestCategory::Movement,
            Box::new(CountdownAction::new(
                TestCategory::Movement,
                TickDuration::INFINITE,
            )),
        );
        machine.tick(TickDuration::from_ticks(i32::MAX / 2));
        machine.tick(TickDuration::from_ticks(i32::MAX / 2));
        assert!(machine.current_action(TestCategory::Movement).is_some());
    }

    #[test]
    fn clear_drops_action_without_completion() {
        let mut machine: ActionStateMachine<TestRules> = ActionStateMachine::new();
        machine.start_action(TestCategory::Combat, countdown(TestCategory::Combat, 100));
        machine.clear(TestCategory::Combat);
        assert!(machine.is_idle());
    }

    #[test]
    fn category_index_matches_all_order() {
        assert_eq!(TestCategory::Movement.index(), 0);
        assert_eq!(TestCategory::Combat.index(), 1);
        assert_eq!(TestCategory::ALL.len(), 2);
    }
}
