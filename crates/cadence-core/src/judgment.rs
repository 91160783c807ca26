//! Action judgments and the decision result buffer.
//!
//! A judgment is a condition-plus-priority record that, when satisfied,
//! proposes an action for one category. The decision phase evaluates each
//! entity's judgments against a read-only [`FrameState`] and writes the
//! winning proposals into a [`DecisionBuffer`]; the serial execution phase
//! drains the buffer in handle order, which keeps the tick deterministic
//! regardless of how the parallel workers interleaved.

use crate::action::{ActionId, ActionStateMachine};
use crate::handle::AnyHandle;
use crate::hooks::Ruleset;
use crate::tick::{TickDuration, Ticks};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// FrameState
// ---------------------------------------------------------------------------

/// The read-only view a judgment evaluates against.
pub struct FrameState<'a, R: Ruleset> {
    /// The entity being decided for.
    pub handle: AnyHandle,
    /// Host input state sampled this tick.
    pub input: &'a R::Input,
    /// The entity's arena payload, when the handle still resolves.
    pub payload: Option<&'a R::Payload>,
    /// Current simulation tick.
    pub current_tick: Ticks,
    /// Delta for this tick.
    pub delta_ticks: TickDuration,
    /// The entity's running actions.
    pub actions: &'a ActionStateMachine<R>,
}

// ---------------------------------------------------------------------------
// Judgment
// ---------------------------------------------------------------------------

/// A condition that proposes an action for a category.
///
/// Evaluated from the parallel decision phase; implementations must be
/// thread-safe and side-effect free.
pub trait Judgment<R: Ruleset>: Send + Sync {
    /// Human-readable name for debugging.
    fn label(&self) -> &str;

    /// The category this judgment proposes for.
    fn category(&self) -> R::Category;

    /// The action instantiated by the factory when this judgment wins.
    fn action(&self) -> ActionId;

    /// Selection priority; larger wins. May depend on the frame state.
    fn priority(&self, state: &FrameState<'_, R>) -> i32;

    /// Whether the condition is satisfied this frame.
    fn evaluate(&self, state: &FrameState<'_, R>) -> bool;

    /// Judgments this one allows transitions into once its action runs.
    fn transitionable_judgments(&self) -> Vec<Arc<dyn Judgment<R>>> {
        Vec::new()
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// A winning proposal: start `action` in `category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision<C> {
    pub category: C,
    pub action: ActionId,
}

/// Evaluate one entity's judgments and return at most one decision per
/// category.
///
/// For a category with a running action: a non-cancelable action blocks
/// all proposals, and a cancelable one restricts candidates to its
/// transitionable judgments. For an empty slot the full judgment vector
/// competes. Ties on priority resolve to the earliest candidate, so
/// selection is stable across runs.
pub fn select_decisions<R: Ruleset>(
    state: &FrameState<'_, R>,
    judgments: &[Arc<dyn Judgment<R>>],
) -> Vec<Decision<R::Category>> {
    use crate::action::ActionCategory;

    let mut decisions = Vec::new();
    for &category in R::Category::ALL {
        let overrides = match state.actions.current_action(category) {
            Some(action) if !action.can_cancel() => continue,
            Some(action) => Some(action.transitionable_judgments()),
            None => None,
        };
        let candidates: &[Arc<dyn Judgment<R>>] = match &overrides {
            Some(list) => list,
            None => judgments,
        };

        let mut best: Option<(i32, &Arc<dyn Judgment<R>>)> = None;
        for judgment in candidates {
            if judgment.category() != category || !judgment.evaluate(state) {
                continue;
            }
            let priority = judgment.priority(state);
            if best.is_none_or(|(p, _)| priority > p) {
                best = Some((priority, judgment));
            }
        }
        if let Some((_, judgment)) = best {
            decisions.push(Decision {
                category,
                action: judgment.action(),
            });
        }
    }
    decisions
}

// ---------------------------------------------------------------------------
// DecisionBuffer
// ---------------------------------------------------------------------------

/// Thread-safe sink for decision-phase results.
///
/// Each parallel worker writes one entry per entity (last writer wins per
/// handle, though workers never contend on the same handle). The serial
/// consumer drains entries in handle order, which makes the observable
/// result independent of worker count and scheduling.
pub struct DecisionBuffer<C> {
    inner: Mutex<HashMap<AnyHandle, Vec<Decision<C>>>>,
}

impl<C: Copy> DecisionBuffer<C> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Record the decisions for one entity, replacing any previous entry.
    pub fn insert(&self, handle: AnyHandle, decisions: Vec<Decision<C>>) {
        if let Ok(mut map) = self.inner.lock() {
            map.insert(handle, decisions);
        }
    }

    /// Number of entities with an entry.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return all entries, sorted by handle.
    pub fn drain_handle_order(&self) -> Vec<(AnyHandle, Vec<Decision<C>>)> {
        let mut entries: Vec<_> = match self.inner.lock() {
            Ok(mut map) => map.drain().collect(),
            Err(_) => Vec::new(),
        };
        entries.sort_by_key(|(handle, _)| *handle);
        entries
    }

    /// Drop all entries.
    pub fn clear(&self) {
        if let Ok(mut map) = self.inner.lock() {
            map.clear();
        }
    }
}

impl<C: Copy> Default for DecisionBuffer<C> {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        CountdownAction, TestCategory, TestInput, TestRules, ThresholdJudgment,
    };
    use crate::world::World;

    fn frame_state<'a>(
        input: &'a TestInput,
        actions: &'a ActionStateMachine<TestRules>,
    ) -> FrameState<'a, TestRules> {
        FrameState {
            handle: AnyHandle::INVALID,
            input,
            payload: None,
            current_tick: 0,
            delta_ticks: TickDuration::from_ticks(1),
            actions,
        }
    }

    fn judgment(
        label: &str,
        category: TestCategory,
        action: u32,
        priority: i32,
    ) -> Arc<dyn Judgment<TestRules>> {
        Arc::new(ThresholdJudgment::always(label, category, ActionId(action), priority))
    }

    #[test]
    fn highest_priority_judgment_wins() {
        let input = TestInput::default();
        let actions = ActionStateMachine::new();
        let state = frame_state(&input, &actions);

        let judgments = vec![
            judgment("walk", TestCategory::Movement, 1, 0),
            judgment("dash", TestCategory::Movement, 2, 10),
            judgment("slash", TestCategory::Combat, 3, 5),
        ];
        let decisions = select_decisions(&state, &judgments);

        assert_eq!(decisions.len(), 2);
        assert_eq!(decisions[0].category, TestCategory::Movement);
        assert_eq!(decisions[0].action, ActionId(2));
        assert_eq!(decisions[1].category, TestCategory::Combat);
        assert_eq!(decisions[1].action, ActionId(3));
    }

    #[test]
    fn priority_ties_resolve_to_earliest() {
        let input = TestInput::default();
        let actions = ActionStateMachine::new();
        let state = frame_state(&input, &actions);

        let judgments = vec![
            judgment("first", TestCategory::Movement, 1, 5),
            judgment("second", TestCategory::Movement, 2, 5),
        ];
        let decisions = select_decisions(&state, &judgments);
        assert_eq!(decisions[0].action, ActionId(1));
    }

    #[test]
    fn unsatisfied_judgments_are_skipped() {
        let input = TestInput::default();
        let actions = ActionStateMachine::new();
        let state = frame_state(&input, &actions);

        let judgments = vec![Arc::new(ThresholdJudgment::never(
            "blocked",
            TestCategory::Combat,
            ActionId(1),
            100,
        )) as Arc<dyn Judgment<TestRules>>];
        assert!(select_decisions(&state, &judgments).is_empty());
    }

    #[test]
    fn non_cancelable_action_blocks_category() {
        let input = TestInput::default();
        let mut actions: ActionStateMachine<TestRules> = ActionStateMachine::new();
        actions.start_action(
            TestCategory::Combat,
            Box::new(
                CountdownAction::new(TestCategory::Combat, TickDuration::from_ticks(10))
                    .uncancelable(),
            ),
        );
        let state = frame_state(&input, &actions);

        let judgments = vec![judgment("slash", TestCategory::Combat, 1, 100)];
        assert!(select_decisions(&state, &judgments).is_empty());
    }

    #[test]
    fn cancelable_action_restricts_to_transition_overrides() {
        let input = TestInput::default();
        let mut actions: ActionStateMachine<TestRules> = ActionStateMachine::new();

        let follow_up = judgment("follow_up", TestCategory::Combat, 7, 1);
        let running = CountdownAction::new(TestCategory::Combat, TickDuration::from_ticks(10))
            .with_transitions(vec![Arc::clone(&follow_up)]);
        actions.start_action(TestCategory::Combat, Box::new(running));
        let state = frame_state(&input, &actions);

        // The vector judgment has a far higher priority, but only the
        // running action's override set competes for the slot.
        let judgments = vec![judgment("slash", TestCategory::Combat, 1, 100)];
        let decisions = select_decisions(&state, &judgments);

        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].action, ActionId(7));
    }

    #[test]
    fn buffer_drains_in_handle_order() {
        let mut world: World<TestRules> = World::new();
        let h1 = world.spawn_entity(Default::default()).unwrap();
        let h2 = world.spawn_entity(Default::default()).unwrap();
        let h3 = world.spawn_entity(Default::default()).unwrap();

        let buffer: DecisionBuffer<TestCategory> = DecisionBuffer::new();
        buffer.insert(h3, vec![]);
        buffer.insert(h1, vec![]);
        buffer.insert(h2, vec![]);

        let drained = buffer.drain_handle_order();
        let handles: Vec<_> = drained.iter().map(|(h, _)| *h).collect();
        assert_eq!(handles, vec![h1, h2, h3]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn buffer_last_writer_wins_per_handle() {
        let buffer: DecisionBuffer<TestCategory> = DecisionBuffer::new();
        let h = AnyHandle::INVALID;
        buffer.insert(
            h,
            vec![Decision {
                category: TestCategory::Movement,
                action: ActionId(1),
            }],
        );
        buffer.insert(
            h,
            vec![Decision {
                category: TestCategory::Movement,
                action: ActionId(2),
            }],
        );
        assert_eq!(buffer.len(), 1);
        let drained = buffer.drain_handle_order();
        assert_eq!(drained[0].1[0].action, ActionId(2));
    }
}
