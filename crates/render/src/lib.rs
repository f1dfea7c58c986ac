//! Rendering adapter: mirrors streamed entities into a presentation scene.
//!
//! # Invariants
//! - The scene never mutates simulation state; it only follows events.
//! - Every live entity has exactly one handle; despawn releases it.
//!
//! `DebugTextScene` is a text-only scene used headless and in tests. A real
//! scene graph implements `SceneSync` without changing consumers.

mod debug;
mod scene;

pub use debug::DebugTextScene;
pub use scene::{HandleTable, SceneSync};

pub fn crate_info() -> &'static str {
    "driftfield-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
