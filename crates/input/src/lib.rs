//! Input: raw key names mapped to actions, folded into per-frame controls.
//!
//! # Invariants
//! - The simulation consumes `ControlState`, never raw key events.
//! - Key names are matched lowercase, as the browser reports them.

pub mod action;
pub mod bindings;

pub use action::{Action, ActionParseError};
pub use bindings::{ControlState, KeyBindings};

pub fn crate_info() -> &'static str {
    "driftfield-input v0.1.0"
}
