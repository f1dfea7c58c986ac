//! Persistence: what survives between runs.
//!
//! # Invariants
//! - The restart flag is read at most once; reading clears it.
//! - The best score never decreases.
//! - Files carry a schema version and are rejected on mismatch.

mod store;

pub use store::{RunRecord, SessionStore, StoreError};

pub fn crate_info() -> &'static str {
    "driftfield-persist v0.1.0"
}
