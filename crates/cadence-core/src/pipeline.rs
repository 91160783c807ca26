//! Stage dispatch: drives a [`SystemGroup`] over the world.
//!
//! The pipeline owns the frame counter and total-tick clock and evaluates
//! each stage's query filter (cached per stage per frame). Stage failures
//! never unwind across the dispatch loop; a stage reports through its own
//! contract and the pipeline continues unless the fatal flag is raised on
//! the context.

use crate::bus::CommandBus;
use crate::handle::AnyHandle;
use crate::hooks::Ruleset;
use crate::step::StepOutcome;
use crate::system::{ParallelSystem, Query, SystemContext, SystemGroup, SystemKind};
use crate::tick::{TickDuration, Ticks};
use crate::world::World;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// ---------------------------------------------------------------------------
// PipelineReport
// ---------------------------------------------------------------------------

/// What one group dispatch did.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub stages_run: usize,
    pub stages_skipped: usize,
    /// Step outcomes of queue-drain stages, in dispatch order.
    pub step_outcomes: Vec<(String, StepOutcome)>,
    /// Parallel stages that observed the cancel signal.
    pub canceled_stages: Vec<String>,
    /// Whether a stage raised the fatal flag and stopped the group.
    pub fatal: bool,
    /// Wall time per stage, in dispatch order.
    #[cfg(feature = "profiling")]
    pub timings: Vec<(String, std::time::Duration)>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

struct CachedQuery {
    frame: u64,
    entities: Vec<AnyHandle>,
}

/// Cache key: (group id, stage index). Independent of stage labels, so
/// same-named stages in different groups never share a cache entry.
type StageKey = (u64, usize);

/// Executes system groups and tracks simulation time.
pub struct Pipeline {
    frame_count: u64,
    total_ticks: Ticks,
    cancel: Arc<AtomicBool>,
    query_cache: HashMap<StageKey, CachedQuery>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            frame_count: 0,
            total_ticks: 0,
            cancel: Arc::new(AtomicBool::new(false)),
            query_cache: HashMap::new(),
        }
    }

    /// Frames executed since construction or the last reset.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Ticks accumulated across executed frames.
    pub fn total_ticks(&self) -> Ticks {
        self.total_ticks
    }

    /// The cancel signal shared into every stage context. Store `true` to
    /// request early termination at the next entity boundary.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Lower the cancel signal.
    pub fn clear_cancel(&self) {
        self.cancel.store(false, Ordering::Relaxed);
    }

    /// Zero the frame counter and tick clock. The registry and queues are
    /// untouched.
    pub fn reset(&mut self) {
        self.frame_count = 0;
        self.total_ticks = 0;
        self.query_cache.clear();
    }

    /// Advance the clock by one frame of `dt`, then dispatch `group`.
    pub fn execute<R: Ruleset>(
        &mut self,
        group: &mut SystemGroup<R>,
        dt: TickDuration,
        world: &mut World<R>,
        bus: &mut CommandBus<World<R>>,
    ) -> PipelineReport {
        self.frame_count += 1;
        self.total_ticks = self.total_ticks.saturating_add(dt.ticks());
        self.run_group(group, dt, world, bus)
    }

    /// Dispatch `group` without advancing the clock. Used for late groups
    /// so a game tick advances time exactly once.
    pub fn run_group<R: Ruleset>(
        &mut self,
        group: &mut SystemGroup<R>,
        dt: TickDuration,
        world: &mut World<R>,
        bus: &mut CommandBus<World<R>>,
    ) -> PipelineReport {
        let ctx = SystemContext::new(
            dt,
            self.total_ticks,
            self.frame_count,
            Arc::clone(&self.cancel),
        );
        let mut report = PipelineReport::default();

        let group_id = group.id();
        for (index, entry) in group.systems_mut().iter_mut().enumerate() {
            if !entry.enabled {
                report.stages_skipped += 1;
                continue;
            }
            let entities = self.filtered_entities((group_id, index), &entry.filter, world);

            #[cfg(feature = "profiling")]
            let stage_start = std::time::Instant::now();

            match &mut entry.kind {
                SystemKind::Serial(system) => {
                    system.run(world, bus, &entities, &ctx);
                }
                SystemKind::Parallel(system) => {
                    let view: &World<R> = world;
                    let stage: &dyn ParallelSystem<R> = system.as_ref();
                    entities.par_iter().for_each(|&handle| {
                        if ctx.is_cancel_requested() {
                            return;
                        }
                        stage.run_entity(view, handle, &ctx);
                    });
                    if ctx.is_cancel_requested() {
                        report.canceled_stages.push(entry.label.clone());
                    }
                }
                SystemKind::QueueDrain(processor) => {
                    let outcome = processor.process_all_steps(bus, world);
                    report.step_outcomes.push((entry.label.clone(), outcome));
                }
            }

            #[cfg(feature = "profiling")]
            report
                .timings
                .push((entry.label.clone(), stage_start.elapsed()));

            report.stages_run += 1;
            if ctx.is_fatal() {
                report.fatal = true;
                break;
            }
        }
        report
    }

    /// Evaluate a stage's filter, reusing this frame's cached result when
    /// the stage already ran.
    fn filtered_entities<R: Ruleset>(
        &mut self,
        key: StageKey,
        filter: &Query<R>,
        world: &World<R>,
    ) -> Vec<AnyHandle> {
        if let Some(cached) = self.query_cache.get(&key)
            && cached.frame == self.frame_count
        {
            return cached.entities.clone();
        }
        let entities = filter.evaluate(world);
        self.query_cache.insert(
            key,
            CachedQuery {
                frame: self.frame_count,
                entities: entities.clone(),
            },
        );
        entities
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
