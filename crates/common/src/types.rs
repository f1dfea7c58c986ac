use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a streamed entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Random id for entities placed by hand, outside any spawner.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic id: the `serial`-th entity of `kind`.
    ///
    /// Never equal to a [`EntityId::new`] id, whose version bits are set.
    pub fn sequential(kind: EntityKind, serial: u64) -> Self {
        Self(Uuid::from_u128((u128::from(serial) << 8) | u128::from(kind.tag())))
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0.simple().to_string();
        f.write_str(&s[s.len() - 8..])
    }
}

/// Which population an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Asteroid,
    RescueTarget,
    Storm,
}

impl EntityKind {
    fn tag(self) -> u8 {
        match self {
            Self::Asteroid => 1,
            Self::RescueTarget => 2,
            Self::Storm => 3,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Asteroid => "asteroid",
            Self::RescueTarget => "rescue_target",
            Self::Storm => "storm",
        };
        f.pad(name)
    }
}

/// Hands out sequential ids for one population.
///
/// Spawners own one each, so a seeded run names its entities the same way
/// every time.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    kind: EntityKind,
    next: u64,
}

impl IdAllocator {
    pub fn new(kind: EntityKind) -> Self {
        Self { kind, next: 1 }
    }

    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId::sequential(self.kind, self.next);
        self.next += 1;
        id
    }

    /// Ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next - 1
    }
}

/// Spatial transform handed to presentation: position, Euler rotation, uniform scale.
///
/// Rotation is stored as per-axis radians (XYZ order) because entities spin by
/// adding a per-axis speed every frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
        }
    }
}
