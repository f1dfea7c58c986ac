use std::collections::BTreeMap;
use std::fmt::Write;

use driftfield_common::{EntityKind, Transform};

use crate::scene::SceneSync;

/// Text-only scene. Handles are sequential integers.
#[derive(Debug, Default)]
pub struct DebugTextScene {
    nodes: BTreeMap<u64, (EntityKind, Transform)>,
    next: u64,
    added: u64,
    removed: u64,
}

impl DebugTextScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn transform(&self, handle: u64) -> Option<&Transform> {
        self.nodes.get(&handle).map(|(_, t)| t)
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.nodes.values().filter(|(k, _)| *k == kind).count()
    }

    /// One summary line, then up to `limit` nodes.
    pub fn render(&self, limit: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Scene ({} nodes: {} asteroids, {} rescue targets, {} storms; +{} -{}) ===",
            self.len(),
            self.count(EntityKind::Asteroid),
            self.count(EntityKind::RescueTarget),
            self.count(EntityKind::Storm),
            self.added,
            self.removed,
        );
        for (handle, (kind, t)) in self.nodes.iter().take(limit) {
            let p = t.position;
            let _ = writeln!(
                out,
                "  #{handle:<6} {kind:<14} pos=({:.1}, {:.1}, {:.1}) scale={:.2}",
                p.x, p.y, p.z, t.scale
            );
        }
        out
    }
}

impl SceneSync for DebugTextScene {
    type Handle = u64;

    fn add(&mut self, kind: EntityKind, transform: &Transform) -> u64 {
        let handle = self.next;
        self.next += 1;
        self.added += 1;
        self.nodes.insert(handle, (kind, *transform));
        handle
    }

    fn remove(&mut self, handle: u64) {
        if self.nodes.remove(&handle).is_some() {
            self.removed += 1;
        }
    }

    fn place(&mut self, handle: &u64, transform: &Transform) {
        if let Some((_, t)) = self.nodes.get_mut(handle) {
            *t = *transform;
        }
    }
}
