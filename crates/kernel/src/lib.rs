//! Session kernel: the authoritative game state, stepped one tick at a time.
//!
//! # Invariants
//! - Every timer advances only through the `dt` passed to a tick.
//! - A tick never fails; out-of-range inputs are clamped.
//! - Given the same config, seed and inputs, a session replays identically.

pub mod clock;
pub mod config;
pub mod session;
pub mod ship;

pub use clock::GameClock;
pub use config::{ConfigError, GameConfig};
pub use session::{Session, SessionConfig, SessionEvent, SessionPhase};
pub use ship::{Ship, ShipConfig};

pub fn crate_info() -> &'static str {
    "driftfield-kernel v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("kernel"));
    }
}
