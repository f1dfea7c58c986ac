//! Developer tooling: read-only session inspection and tick timing.
//!
//! # Invariants
//! - Tools never mutate the session they inspect.

mod inspector;
mod timer;

pub use inspector::{EntityInfo, SessionInspector, SessionSummary};
pub use timer::{FrameTimer, TimingSummary};

pub fn crate_info() -> &'static str {
    "driftfield-tools v0.1.0"
}
