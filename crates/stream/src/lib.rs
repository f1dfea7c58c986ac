//! Streaming: bounded entity populations recycled around a moving player.
//!
//! # Invariants
//! - Each manager is the only writer to its population.
//! - Populations never exceed their caps after `advance` returns.
//! - Membership changes are reported as `StreamEvent`s; render handles never
//!   enter this crate.
//! - A despawn cancels a pending spawn of the same id, so an undrained event
//!   log never outgrows the population it describes.
//! - Spawned entities are named by a per-manager `IdAllocator`.
//!
//! Three managers share the same shape: asteroids are culled behind the player
//! and refilled ahead every frame, rescue targets trickle in on a cooldown and
//! a dice roll, and storms appear on a fixed interval and expire by age.

mod asteroids;
mod events;
mod rescue;
mod storms;
mod variant;

pub use asteroids::{Asteroid, AsteroidField, AsteroidFieldConfig, SpinRecovery};
pub use events::{DespawnReason, EventLog, StreamEvent};
pub use rescue::{RescueConfig, RescueField, RescueState, RescueTarget};
pub use storms::{Storm, StormConfig, StormField};
pub use variant::{AsteroidVariant, default_variants, pick_weighted};

pub fn crate_info() -> &'static str {
    "driftfield-stream v0.1.0"
}
