use std::collections::HashMap;

use driftfield_common::{EntityId, EntityKind, Transform};
use driftfield_stream::StreamEvent;

/// A presentation scene that can hold one visual per entity.
///
/// Handles are whatever the scene uses to find its nodes again.
pub trait SceneSync {
    type Handle: Clone;

    fn add(&mut self, kind: EntityKind, transform: &Transform) -> Self::Handle;
    fn remove(&mut self, handle: Self::Handle);
    fn place(&mut self, handle: &Self::Handle, transform: &Transform);
}

/// Maps entity ids to scene handles and applies stream events to a scene.
#[derive(Debug, Clone)]
pub struct HandleTable<H> {
    handles: HashMap<EntityId, H>,
}

impl<H: Clone> HandleTable<H> {
    pub fn new() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }

    pub fn handle(&self, id: EntityId) -> Option<&H> {
        self.handles.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.handles.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Add and remove visuals as the events say.
    ///
    /// A despawn for an id without a handle is ignored, as is a second spawn
    /// for an id that already has one.
    pub fn apply<S>(&mut self, scene: &mut S, events: &[StreamEvent])
    where
        S: SceneSync<Handle = H>,
    {
        for event in events {
            match event {
                StreamEvent::Spawned {
                    id,
                    kind,
                    transform,
                } => {
                    if self.handles.contains_key(id) {
                        tracing::warn!(%id, "duplicate spawn ignored");
                        continue;
                    }
                    let handle = scene.add(*kind, transform);
                    self.handles.insert(*id, handle);
                }
                StreamEvent::Despawned { id, .. } => match self.handles.remove(id) {
                    Some(handle) => scene.remove(handle),
                    None => tracing::trace!(%id, "despawn without handle"),
                },
            }
        }
    }

    /// Move every tracked visual to its entity's current transform.
    /// Returns how many were placed.
    pub fn place_all<S, I>(&self, scene: &mut S, transforms: I) -> usize
    where
        S: SceneSync<Handle = H>,
        I: IntoIterator<Item = (EntityId, Transform)>,
    {
        let mut placed = 0;
        for (id, transform) in transforms {
            if let Some(handle) = self.handles.get(&id) {
                scene.place(handle, &transform);
                placed += 1;
            }
        }
        placed
    }

    /// Remove every visual, e.g. on reset.
    pub fn clear<S>(&mut self, scene: &mut S)
    where
        S: SceneSync<Handle = H>,
    {
        for (_, handle) in self.handles.drain() {
            scene.remove(handle);
        }
    }
}

impl<H: Clone> Default for HandleTable<H> {
    fn default() -> Self {
        Self::new()
    }
}
