use driftfield_common::{EntityId, EntityKind, Transform};
use serde::{Deserialize, Serialize};

/// Why an entity left its population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DespawnReason {
    /// Fell behind the player past the rear threshold.
    Behind,
    /// Drifted beyond the far radius in any direction.
    TooFar,
    /// Hit the player.
    Collided,
    /// Collect animation finished.
    Collected,
    /// Outlived its lifetime.
    Expired,
}

/// Membership changes produced by the streaming managers.
///
/// Presentation drains these to add and remove visuals; per-frame positions
/// are read directly from the managers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StreamEvent {
    Spawned {
        id: EntityId,
        kind: EntityKind,
        transform: Transform,
    },
    Despawned {
        id: EntityId,
        kind: EntityKind,
        reason: DespawnReason,
    },
}

impl StreamEvent {
    pub fn id(&self) -> EntityId {
        match self {
            Self::Spawned { id, .. } | Self::Despawned { id, .. } => *id,
        }
    }
}

/// Membership changes waiting for the next drain.
///
/// A despawn cancels a still-pending spawn of the same id, so an entity that
/// comes and goes between drains leaves no trace. Undrained, the log holds at
/// most one spawn per live entity plus one despawn per entity that was live
/// at the last drain.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<StreamEvent>,
}

impl EventLog {
    pub fn push(&mut self, event: StreamEvent) {
        if let StreamEvent::Despawned { id, .. } = &event {
            let pending = self
                .events
                .iter()
                .position(|e| matches!(e, StreamEvent::Spawned { id: spawned, .. } if spawned == id));
            if let Some(index) = pending {
                self.events.remove(index);
                return;
            }
        }
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<StreamEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn as_slice(&self) -> &[StreamEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
