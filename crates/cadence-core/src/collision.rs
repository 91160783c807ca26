//! Collision-phase collaborator interfaces.
//!
//! The core never intersects shapes. An external detector publishes the
//! frame's [`CollisionPair`] list through a [`CollisionSource`]; the
//! orchestrator hands the list to a [`CollisionRouter`], which translates
//! pairs into commands on the involved entities' queues; then the source
//! is cleared for the next frame.

use crate::bus::CommandBus;
use crate::fixed::Vec3;
use crate::handle::AnyHandle;

// ---------------------------------------------------------------------------
// CollisionPair
// ---------------------------------------------------------------------------

/// One contact reported by the external detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub first: AnyHandle,
    pub second: AnyHandle,
    /// World-space contact point.
    pub contact_point: Vec3,
    /// Contact normal, pointing from `first` toward `second`.
    pub contact_normal: Vec3,
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Publishes the frame's collision results.
pub trait CollisionSource {
    /// The pairs detected since the last `clear`.
    fn collisions(&self) -> Vec<CollisionPair>;

    /// Discard the published pairs. Called by the orchestrator after
    /// routing, once per tick.
    fn clear(&mut self);
}

/// Translates collision pairs into per-entity commands.
///
/// Typically enqueues game-defined damage or knockback commands onto the
/// queues of both entities in each pair. Runs before the message phase,
/// so everything routed here drains in the same tick.
pub trait CollisionRouter<W: 'static> {
    fn route(&mut self, pairs: &[CollisionPair], bus: &mut CommandBus<W>);
}
