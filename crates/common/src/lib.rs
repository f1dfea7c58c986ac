//! Shared types: entity identifiers, transforms and the random source seam.
//!
//! # Invariants
//! - Logic entities never hold render handles; presentation keys off `EntityId`.
//! - Every random draw in the simulation flows through `RandomSource`.
//! - Spawned entities take ids from an `IdAllocator`; only hand-placed ones
//!   use random ids.

pub mod random;
pub mod types;

pub use random::{RandomSource, SeededRandom, SequenceRandom};
pub use types::{EntityId, EntityKind, IdAllocator, Transform};

pub fn crate_info() -> &'static str {
    "driftfield-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
