//! Cadence Core -- a deterministic fixed-step runtime for 3D action games.
//!
//! This crate provides the entity arena and generation-checked handles,
//! per-entity command queues with fixed-point step convergence, the
//! serial/parallel/queue-drain system pipeline, and the six-phase tick
//! orchestrator that every Cadence game builds on. Given identical inputs
//! and delta-tick sequences, two runs produce identical state.
//!
//! # Six-Phase Tick
//!
//! Each call to [`orchestrator::Orchestrator::advance`] moves the world
//! through:
//!
//! 1. **Collision** -- external contact pairs become per-entity commands.
//! 2. **Message** -- command queues drain to a fixed point; the only
//!    phase that mutates logical entity state.
//! 3. **Decision** -- judgments evaluate in parallel against read-only
//!    state and propose actions into a handle-ordered buffer.
//! 4. **Execution** -- proposed actions are instantiated and every
//!    running action advances.
//! 5. **Reconciliation** -- positions reconcile in dependency order.
//! 6. **Cleanup** -- entities marked for deletion are despawned.
//!
//! # Key Types
//!
//! - [`arena::Arena`] -- generation-tagged slot pool with snapshot and
//!   restore.
//! - [`handle::Handle`] / [`handle::AnyHandle`] -- typed and type-erased
//!   entity references that tolerate deletion-after-reference.
//! - [`bus::CommandBus`] -- one global plus per-entity command queues
//!   with priority ordering, pooling, and signal dedup.
//! - [`step::StepProcessor`] -- bounded-depth fixed-point queue drains.
//! - [`pipeline::Pipeline`] -- ordered dispatch of serial, parallel, and
//!   queue-drain stages.
//! - [`orchestrator::Orchestrator`] -- the six phases wired over
//!   host-provided collaborators.
//! - [`serialize`] -- versioned snapshot encoding via bitcode.

pub mod action;
pub mod arena;
pub mod bus;
pub mod collision;
pub mod command;
pub mod fixed;
pub mod handle;
pub mod hooks;
pub mod judgment;
pub mod orchestrator;
pub mod pipeline;
pub mod profiling;
pub mod reconcile;
pub mod registry;
pub mod serialize;
pub mod step;
pub mod system;
pub mod tick;
pub mod validation;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
