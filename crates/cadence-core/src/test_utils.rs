//! Shared test helpers for unit, integration, and benchmark code.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these
//! helpers are available to unit tests, `tests/` suites, benchmarks, and
//! downstream crates via the `test-utils` feature. Everything here is a
//! deliberately small stand-in for the host collaborators: a scripted
//! collision source, a damage router, countdown actions, and recording
//! reconcilers/despawners.

use crate::action::{ActionCategory, ActionId, ExecutableAction};
use crate::bus::{CommandBus, QueueId};
use crate::collision::{CollisionPair, CollisionRouter, CollisionSource};
use crate::command::Command;
use crate::fixed::Vec3;
use crate::handle::AnyHandle;
use crate::hooks::{ActionFactory, EntityDespawner, InputProvider, Ruleset};
use crate::judgment::{FrameState, Judgment};
use crate::orchestrator::Collaborators;
use crate::reconcile::{DependencyResolver, PositionReconciler, ResolveOutcome};
use crate::tick::{TickDuration, Ticks};
use crate::world::World;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// ===========================================================================
// Ruleset
// ===========================================================================

/// Two-slot category set: locomotion vs. attacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestCategory {
    Movement,
    Combat,
}

impl ActionCategory for TestCategory {
    const ALL: &'static [Self] = &[Self::Movement, Self::Combat];
}

/// A fighter-like payload with enough state to observe every phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPayload {
    pub position: Vec3,
    pub health: i32,
    pub hits_taken: u32,
    pub staggered: bool,
    pub reconciled_count: u32,
}

impl Default for TestPayload {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            health: 100,
            hits_taken: 0,
            staggered: false,
            reconciled_count: 0,
        }
    }
}

/// Input sampled by judgments.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestInput {
    pub move_pressed: bool,
    pub attack_pressed: bool,
}

/// The test game's type bundle.
pub struct TestRules;

impl Ruleset for TestRules {
    type Payload = TestPayload;
    type Category = TestCategory;
    type Input = TestInput;
}

/// The world type every test command drains against.
pub type TestWorld = World<TestRules>;

// ===========================================================================
// Commands
// ===========================================================================

/// Subtracts health; marks the target for deletion at zero.
#[derive(Default)]
pub struct DamageCommand {
    pub target: AnyHandle,
    pub amount: i32,
    pub priority: i32,
}

impl Command<TestWorld> for DamageCommand {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn run(&mut self, _queue: QueueId, _bus: &mut CommandBus<TestWorld>, world: &mut TestWorld) {
        if let Some(payload) = world.arena.get_any_mut(self.target) {
            payload.health -= self.amount;
            payload.hits_taken += 1;
            if payload.health <= 0 {
                world.registry.mark_for_deletion(self.target);
            }
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Displaces the target, then requests a stagger via a signal command.
#[derive(Default)]
pub struct KnockbackCommand {
    pub target: AnyHandle,
    pub impulse: Vec3,
    pub priority: i32,
}

impl Command<TestWorld> for KnockbackCommand {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn run(&mut self, queue: QueueId, bus: &mut CommandBus<TestWorld>, world: &mut TestWorld) {
        if let Some(payload) = world.arena.get_any_mut(self.target) {
            payload.position = payload.position + self.impulse;
            let target = self.target;
            bus.enqueue::<StaggerSignal, _>(queue, |c| c.target = target);
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Signal command: at most one queued per queue regardless of how many
/// knockbacks land in a step.
#[derive(Default)]
pub struct StaggerSignal {
    pub target: AnyHandle,
}

impl Command<TestWorld> for StaggerSignal {
    fn is_signal(&self) -> bool {
        true
    }

    fn run(&mut self, _queue: QueueId, _bus: &mut CommandBus<TestWorld>, world: &mut TestWorld) {
        if let Some(payload) = world.arena.get_any_mut(self.target) {
            payload.staggered = true;
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ===========================================================================
// Actions and judgments
// ===========================================================================

/// Runs for a fixed duration, then completes. `INFINITE` never completes.
pub struct CountdownAction {
    category: TestCategory,
    duration: TickDuration,
    elapsed: Ticks,
    entered: bool,
    cancelable: bool,
    transitions: Vec<Arc<dyn Judgment<TestRules>>>,
}

impl CountdownAction {
    pub fn new(category: TestCategory, duration: TickDuration) -> Self {
        Self {
            category,
            duration,
            elapsed: 0,
            entered: false,
            cancelable: true,
            transitions: Vec::new(),
        }
    }

    pub fn uncancelable(mut self) -> Self {
        self.cancelable = false;
        self
    }

    pub fn with_transitions(mut self, transitions: Vec<Arc<dyn Judgment<TestRules>>>) -> Self {
        self.transitions = transitions;
        self
    }

    pub fn was_entered(&self) -> bool {
        self.entered
    }
}

impl ExecutableAction<TestRules> for CountdownAction {
    fn category(&self) -> TestCategory {
        self.category
    }

    fn on_enter(&mut self) {
        self.entered = true;
    }

    fn tick(&mut self, dt: TickDuration) {
        self.elapsed = self.elapsed.saturating_add(dt.ticks());
    }

    fn elapsed_ticks(&self) -> Ticks {
        self.elapsed
    }

    fn is_complete(&self) -> bool {
        !self.duration.is_infinite() && self.elapsed >= self.duration.ticks()
    }

    fn can_cancel(&self) -> bool {
        self.cancelable
    }

    fn transitionable_judgments(&self) -> Vec<Arc<dyn Judgment<TestRules>>> {
        self.transitions.clone()
    }
}

enum JudgeMode {
    Always,
    Never,
    WhenAttackPressed,
    WhenHealthBelow(i32),
}

/// A judgment with a fixed priority and one of a few canned conditions.
pub struct ThresholdJudgment {
    label: String,
    category: TestCategory,
    action: ActionId,
    priority: i32,
    mode: JudgeMode,
}

impl ThresholdJudgment {
    fn with_mode(
        label: &str,
        category: TestCategory,
        action: ActionId,
        priority: i32,
        mode: JudgeMode,
    ) -> Self {
        Self {
            label: label.to_string(),
            category,
            action,
            priority,
            mode,
        }
    }

    pub fn always(label: &str, category: TestCategory, action: ActionId, priority: i32) -> Self {
        Self::with_mode(label, category, action, priority, JudgeMode::Always)
    }

    pub fn never(label: &str, category: TestCategory, action: ActionId, priority: i32) -> Self {
        Self::with_mode(label, category, action, priority, JudgeMode::Never)
    }

    pub fn when_attack_pressed(
        label: &str,
        category: TestCategory,
        action: ActionId,
        priority: i32,
    ) -> Self {
        Self::with_mode(label, category, action, priority, JudgeMode::WhenAttackPressed)
    }

    pub fn when_health_below(
        label: &str,
        category: TestCategory,
        action: ActionId,
        priority: i32,
        threshold: i32,
    ) -> Self {
        Self::with_mode(
            label,
            category,
            action,
            priority,
            JudgeMode::WhenHealthBelow(threshold),
        )
    }
}

impl Judgment<TestRules> for ThresholdJudgment {
    fn label(&self) -> &str {
        &self.label
    }

    fn category(&self) -> TestCategory {
        self.category
    }

    fn action(&self) -> ActionId {
        self.action
    }

    fn priority(&self, _state: &FrameState<'_, TestRules>) -> i32 {
        self.priority
    }

    fn evaluate(&self, state: &FrameState<'_, TestRules>) -> bool {
        match self.mode {
            JudgeMode::Always => true,
            JudgeMode::Never => false,
            JudgeMode::WhenAttackPressed => state.input.attack_pressed,
            JudgeMode::WhenHealthBelow(threshold) => {
                state.payload.is_some_and(|p| p.health < threshold)
            }
        }
    }
}

// ===========================================================================
// Collaborator stubs
// ===========================================================================

/// Plays back a pre-scripted list of collision frames; `clear` advances
/// to the next frame.
pub struct ScriptedCollisionSource {
    frames: VecDeque<Vec<CollisionPair>>,
    current: Vec<CollisionPair>,
}

impl ScriptedCollisionSource {
    pub fn new(frames: Vec<Vec<CollisionPair>>) -> Self {
        let mut frames: VecDeque<_> = frames.into_iter().collect();
        let current = frames.pop_front().unwrap_or_default();
        Self { frames, current }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl CollisionSource for ScriptedCollisionSource {
    fn collisions(&self) -> Vec<CollisionPair> {
        self.current.clone()
    }

    fn clear(&mut self) {
        self.current = self.frames.pop_front().unwrap_or_default();
    }
}

/// A collision source tests can push into after the orchestrator owns it.
///
/// Clones share the same pair list, so keep one clone outside the
/// collaborator wiring to feed contacts frame by frame.
#[derive(Clone, Default)]
pub struct SharedCollisionFeed {
    pairs: Arc<Mutex<Vec<CollisionPair>>>,
}

impl SharedCollisionFeed {
    pub fn push(&self, pair: CollisionPair) {
        if let Ok(mut pairs) = self.pairs.lock() {
            pairs.push(pair);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.lock().map(|p| p.is_empty()).unwrap_or(true)
    }
}

impl CollisionSource for SharedCollisionFeed {
    fn collisions(&self) -> Vec<CollisionPair> {
        self.pairs.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn clear(&mut self) {
        if let Ok(mut pairs) = self.pairs.lock() {
            pairs.clear();
        }
    }
}

/// Zero-geometry contact between two entities.
pub fn contact(first: AnyHandle, second: AnyHandle) -> CollisionPair {
    CollisionPair {
        first,
        second,
        contact_point: Vec3::ZERO,
        contact_normal: Vec3::from_f64(0.0, 1.0, 0.0),
    }
}

/// Routes every pair into a `DamageCommand` on both entities' queues.
pub struct DamageRouter {
    pub amount: i32,
}

impl CollisionRouter<TestWorld> for DamageRouter {
    fn route(&mut self, pairs: &[CollisionPair], bus: &mut CommandBus<TestWorld>) {
        for pair in pairs {
            let amount = self.amount;
            for target in [pair.first, pair.second] {
                bus.enqueue::<DamageCommand, _>(QueueId::Entity(target), move |c| {
                    c.target = target;
                    c.amount = amount;
                    c.priority = 0;
                });
            }
        }
    }
}

/// Returns the same input state for every entity.
#[derive(Default)]
pub struct FixedInputProvider {
    pub input: TestInput,
}

impl FixedInputProvider {
    pub fn attack_held() -> Self {
        Self {
            input: TestInput {
                move_pressed: false,
                attack_pressed: true,
            },
        }
    }
}

impl InputProvider<TestRules> for FixedInputProvider {
    fn input_state(&self, _handle: AnyHandle) -> TestInput {
        self.input
    }
}

/// Builds countdown actions whose duration is the action id in ticks;
/// id 0 is open-ended.
pub struct CountdownFactory;

impl ActionFactory<TestRules> for CountdownFactory {
    fn create(
        &mut self,
        action: ActionId,
        category: TestCategory,
    ) -> Option<Box<dyn ExecutableAction<TestRules>>> {
        let duration = if action.0 == 0 {
            TickDuration::INFINITE
        } else {
            TickDuration::from_ticks(action.0 as i32)
        };
        Some(Box::new(CountdownAction::new(category, duration)))
    }
}

/// Keeps the input order; always resolves.
pub struct IdentityResolver;

impl DependencyResolver for IdentityResolver {
    fn resolve(&mut self, entities: &[AnyHandle], sorted: &mut Vec<AnyHandle>) -> ResolveOutcome {
        sorted.extend_from_slice(entities);
        ResolveOutcome::Resolved
    }
}

/// Records visited handles and bumps the payload's reconcile counter.
pub struct RecordingReconciler {
    visited: Arc<Mutex<Vec<AnyHandle>>>,
}

impl RecordingReconciler {
    pub fn new() -> Self {
        Self {
            visited: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared view of the visit log, in visit order.
    pub fn visited(&self) -> Arc<Mutex<Vec<AnyHandle>>> {
        Arc::clone(&self.visited)
    }
}

impl Default for RecordingReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionReconciler<TestRules> for RecordingReconciler {
    fn reconcile(&mut self, world: &mut TestWorld, handle: AnyHandle) {
        if let Ok(mut log) = self.visited.lock() {
            log.push(handle);
        }
        if let Some(payload) = world.arena.get_any_mut(handle) {
            payload.reconciled_count += 1;
        }
    }
}

/// Releases the arena slot. The canonical despawner.
pub struct ArenaDespawner;

impl EntityDespawner<TestRules> for ArenaDespawner {
    fn despawn(&mut self, world: &mut TestWorld, handle: AnyHandle) {
        world.arena.despawn_any(handle);
    }
}

// ===========================================================================
// Wiring helpers
// ===========================================================================

/// Collaborators with a given collision script and contact damage of 10.
pub fn collaborators_with_collisions(
    frames: Vec<Vec<CollisionPair>>,
) -> Collaborators<TestRules> {
    Collaborators {
        collision_source: Box::new(ScriptedCollisionSource::new(frames)),
        collision_router: Box::new(DamageRouter { amount: 10 }),
        input: Arc::new(FixedInputProvider::default()),
        action_factory: Box::new(CountdownFactory),
        resolver: Box::new(IdentityResolver),
        reconciler: Box::new(RecordingReconciler::new()),
        despawner: Box::new(ArenaDespawner),
    }
}

/// Collaborators with no collisions scripted.
pub fn quiet_collaborators() -> Collaborators<TestRules> {
    collaborators_with_collisions(Vec::new())
}
