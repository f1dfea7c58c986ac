//! Collision: pure distance-threshold queries, O(n) per call.
//!
//! # Invariants
//! - Queries never mutate their inputs; callers decide what a hit means.
//! - A candidate without a position never collides.
//!
//! Pickup and impact use different radii: rescue contact is generous, asteroid
//! contact is strict.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use driftfield_stream::{Asteroid, RescueTarget, Storm};

/// Anything with an optional world position.
pub trait Positioned {
    /// `None` while the entity is being torn down.
    fn position(&self) -> Option<Vec3>;
}

impl Positioned for Vec3 {
    fn position(&self) -> Option<Vec3> {
        Some(*self)
    }
}

impl Positioned for Option<Vec3> {
    fn position(&self) -> Option<Vec3> {
        *self
    }
}

impl Positioned for Asteroid {
    fn position(&self) -> Option<Vec3> {
        Some(self.position)
    }
}

impl Positioned for RescueTarget {
    fn position(&self) -> Option<Vec3> {
        self.is_active().then_some(self.position)
    }
}

impl Positioned for Storm {
    fn position(&self) -> Option<Vec3> {
        Some(self.center)
    }
}

/// Contact radii per population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionRadii {
    pub rescue: f32,
    pub asteroid: f32,
}

impl Default for CollisionRadii {
    fn default() -> Self {
        Self {
            rescue: 20.0,
            asteroid: 12.0,
        }
    }
}

/// Euclidean distance, or infinity when the candidate has no position.
pub fn distance_to<T: Positioned + ?Sized>(player: Vec3, candidate: &T) -> f32 {
    candidate
        .position()
        .map_or(f32::INFINITY, |p| p.distance(player))
}

/// Every candidate strictly closer than `radius` to `player`, in input order.
pub fn find_collisions<'a, T, I>(player: Vec3, candidates: I, radius: f32) -> Vec<&'a T>
where
    T: Positioned + 'a,
    I: IntoIterator<Item = &'a T>,
{
    candidates
        .into_iter()
        .filter(|c| distance_to(player, *c) < radius)
        .collect()
}

pub fn crate_info() -> &'static str {
    "driftfield-collision v0.1.0"
}
