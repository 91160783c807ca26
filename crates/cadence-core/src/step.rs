//! Fixed-point convergence over command queues.
//!
//! The step processor repeatedly promotes and drains every queue on the
//! bus until no new work appears, or until the depth budget runs out.
//! Step 0 sees only commands enqueued before the pass began; Step N sees
//! exactly the commands enqueued during Step N-1's drains. A depth-capped
//! pass leaves residual commands in next-step lists so the next tick can
//! continue where it left off.

use crate::bus::CommandBus;
use crate::command::ClearPolicy;

/// Default step budget.
pub const DEFAULT_MAX_DEPTH: u32 = 100;

// ---------------------------------------------------------------------------
// StepOutcome
// ---------------------------------------------------------------------------

/// Result of a step-processor pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Every queue drained to empty after `depth` steps.
    Converged { depth: u32 },
    /// The depth budget ran out with work still queued. Not fatal:
    /// residuals stay in next-step lists for the next pass.
    DepthExceeded { depth: u32 },
}

impl StepOutcome {
    pub fn depth(self) -> u32 {
        match self {
            Self::Converged { depth } | Self::DepthExceeded { depth } => depth,
        }
    }

    pub fn converged(self) -> bool {
        matches!(self, Self::Converged { .. })
    }
}

// ---------------------------------------------------------------------------
// StepProcessor
// ---------------------------------------------------------------------------

/// Drives a bus of queues to a fixed point. Strictly single-threaded.
#[derive(Debug, Clone, Copy)]
pub struct StepProcessor {
    max_depth: u32,
}

impl StepProcessor {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(max_depth: u32) -> Self {
        Self {
            max_depth: max_depth.max(1),
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Promote and drain every queue until convergence or the depth cap.
    ///
    /// Each step drains queues in bus order (global first, then entities
    /// in registration order) with insert deferral raised bus-wide, so no
    /// drain observes work enqueued within the same step.
    pub fn process_all_steps<W: 'static>(
        &self,
        bus: &mut CommandBus<W>,
        world: &mut W,
    ) -> StepOutcome {
        let mut depth = 0;
        loop {
            bus.promote_all();
            if bus.all_pending_empty() {
                return StepOutcome::Converged { depth };
            }

            bus.begin_step();
            for id in bus.queue_ids() {
                bus.execute(id, world, ClearPolicy::Clear);
            }
            bus.end_step();

            depth += 1;
            if depth >= self.max_depth {
                return StepOutcome::DepthExceeded { depth };
            }
        }
    }
}

impl Default for StepProcessor {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
