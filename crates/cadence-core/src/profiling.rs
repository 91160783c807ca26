//! Profiling instrumentation for the tick orchestrator.
//!
//! [`TickProfile`] captures per-phase wall time from the most recent tick.
//! Only available when the `profiling` feature is enabled; without it the
//! pipeline records nothing and this module compiles to just the type
//! definitions used in documentation.

use std::time::Duration;

/// Per-phase timing from the most recent tick.
#[derive(Debug, Clone, Default)]
pub struct TickProfile {
    pub collision: Duration,
    pub message: Duration,
    pub decision: Duration,
    pub execution: Duration,
    pub reconciliation: Duration,
    pub cleanup: Duration,
    pub frame: u64,
}

impl TickProfile {
    /// File a stage timing under its phase label. Unknown labels (host
    /// stages added to the groups) are ignored.
    pub fn record(&mut self, label: &str, duration: Duration) {
        match label {
            "collision" => self.collision = duration,
            "message" => self.message = duration,
            "decision" => self.decision = duration,
            "execution" => self.execution = duration,
            "reconciliation" => self.reconciliation = duration,
            "cleanup" => self.cleanup = duration,
            _ => {}
        }
    }

    /// Total time across the six phases.
    pub fn total(&self) -> Duration {
        self.collision
            + self.message
            + self.decision
            + self.execution
            + self.reconciliation
            + self.cleanup
    }

    /// Returns the name and duration of the slowest phase.
    pub fn bottleneck_phase(&self) -> (&'static str, Duration) {
        let phases = [
            ("collision", self.collision),
            ("message", self.message),
            ("decision", self.decision),
            ("execution", self.execution),
            ("reconciliation", self.reconciliation),
            ("cleanup", self.cleanup),
        ];
        let mut best = phases[0];
        for candidate in phases {
            if candidate.1 > best.1 {
                best = candidate;
            }
        }
        best
    }
}

// ===========================================================================
// Tests
// ===========================================================================
