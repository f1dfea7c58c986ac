//! Abilities: the boost energy machine and the shockwave.
//!
//! # Invariants
//! - Boost state changes only through `Boost::tick`, one held/not-held input per frame.
//! - `0 <= time_used <= duration` after every mutation.
//! - A shockwave pushes each asteroid at most once.

mod boost;
mod shockwave;

pub use boost::{Boost, BoostConfig, BoostPhase};
pub use shockwave::{Shockwave, ShockwaveConfig, ShockwaveCooldown, ShockwaveSystem};

pub fn crate_info() -> &'static str {
    "driftfield-abilities v0.1.0"
}
