use glam::Vec3;
use serde::{Deserialize, Serialize};

use driftfield_common::{EntityId, EntityKind, IdAllocator, RandomSource, Transform};

use crate::events::{DespawnReason, EventLog, StreamEvent};

/// Tuning for solar storms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StormConfig {
    pub max_storms: usize,
    /// Seconds between spawns.
    pub spawn_interval: f64,
    /// Seconds a storm lives.
    pub lifetime: f64,
    /// Full width of the horizontal (X/Z) spawn box around the player.
    pub horizontal_range: f32,
    /// Full height of the spawn box.
    pub vertical_range: f32,
    pub min_radius: f32,
    pub radius_spread: f32,
    pub min_density: u32,
    pub density_spread: u32,
    /// Player speed factor while inside any storm.
    pub speed_multiplier: f32,
    /// Decorative spin, radians per second.
    pub spin_rate: f32,
}

impl Default for StormConfig {
    fn default() -> Self {
        Self {
            max_storms: 30,
            spawn_interval: 8.0,
            lifetime: 60.0,
            horizontal_range: 1000.0,
            vertical_range: 200.0,
            min_radius: 80.0,
            radius_spread: 100.0,
            min_density: 100,
            density_spread: 100,
            speed_multiplier: 0.85,
            spin_rate: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storm {
    pub id: EntityId,
    pub center: Vec3,
    pub radius: f32,
    /// Decorative particle count for presentation.
    pub density: u32,
    pub spawned_at: f64,
    /// Decorative yaw of the cloud.
    pub spin: f32,
}

impl Storm {
    pub fn new(center: Vec3, radius: f32, spawned_at: f64) -> Self {
        Self {
            id: EntityId::new(),
            center,
            radius,
            density: 0,
            spawned_at,
            spin: 0.0,
        }
    }

    pub fn contains(&self, position: Vec3) -> bool {
        position.distance(self.center) <= self.radius
    }

    pub fn age(&self, elapsed: f64) -> f64 {
        elapsed - self.spawned_at
    }

    pub fn transform(&self) -> Transform {
        Transform {
            position: self.center,
            rotation: Vec3::new(0.0, self.spin, 0.0),
            scale: self.radius,
        }
    }
}

/// Spawns storms near the player on a fixed interval and expires old ones.
#[derive(Debug, Clone)]
pub struct StormField {
    config: StormConfig,
    storms: Vec<Storm>,
    last_spawn: f64,
    ids: IdAllocator,
    events: EventLog,
}

impl StormField {
    pub fn new(config: StormConfig) -> Self {
        Self {
            config,
            storms: Vec::new(),
            last_spawn: 0.0,
            ids: IdAllocator::new(EntityKind::Storm),
            events: EventLog::default(),
        }
    }

    pub fn config(&self) -> &StormConfig {
        &self.config
    }

    pub fn storms(&self) -> &[Storm] {
        &self.storms
    }

    pub fn len(&self) -> usize {
        self.storms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storms.is_empty()
    }

    pub fn drain_events(&mut self) -> Vec<StreamEvent> {
        self.events.drain()
    }

    pub fn events(&self) -> &[StreamEvent] {
        self.events.as_slice()
    }

    /// Drop every storm and pending event and restart the spawn schedule.
    pub fn clear(&mut self) {
        self.storms.clear();
        self.last_spawn = 0.0;
        self.events.clear();
    }

    pub fn insert(&mut self, storm: Storm) {
        self.events.push(StreamEvent::Spawned {
            id: storm.id,
            kind: EntityKind::Storm,
            transform: storm.transform(),
        });
        self.storms.push(storm);
    }

    /// Spawn on schedule, spin, and expire. `elapsed` is seconds since the
    /// session started.
    pub fn advance(
        &mut self,
        player_position: Vec3,
        dt: f32,
        elapsed: f64,
        rng: &mut impl RandomSource,
    ) {
        if elapsed - self.last_spawn >= self.config.spawn_interval
            && self.storms.len() < self.config.max_storms
        {
            let storm = self.spawn_near(player_position, elapsed, rng);
            tracing::debug!(
                id = %storm.id,
                center = ?storm.center,
                radius = storm.radius,
                "storm spawned"
            );
            self.insert(storm);
            self.last_spawn = elapsed;
        }

        let lifetime = self.config.lifetime;
        let spin = self.config.spin_rate * dt;
        let events = &mut self.events;
        self.storms.retain_mut(|storm| {
            storm.spin += spin;
            if storm.age(elapsed) > lifetime {
                tracing::debug!(id = %storm.id, "storm expired");
                events.push(StreamEvent::Despawned {
                    id: storm.id,
                    kind: EntityKind::Storm,
                    reason: DespawnReason::Expired,
                });
                false
            } else {
                true
            }
        });
    }

    pub fn is_player_inside(&self, position: Vec3) -> bool {
        self.storms.iter().any(|s| s.contains(position))
    }

    /// Factor to apply to player speed at `position`.
    pub fn speed_multiplier_at(&self, position: Vec3) -> f32 {
        if self.is_player_inside(position) {
            self.config.speed_multiplier
        } else {
            1.0
        }
    }

    fn spawn_near(&mut self, center: Vec3, elapsed: f64, rng: &mut impl RandomSource) -> Storm {
        let offset = Vec3::new(
            rng.centered(self.config.horizontal_range),
            rng.centered(self.config.vertical_range),
            rng.centered(self.config.horizontal_range),
        );
        let radius = self.config.min_radius + rng.next_f32() * self.config.radius_spread;
        let density = self.config.min_density
            + (rng.next_f32() * self.config.density_spread as f32).floor() as u32;

        Storm {
            id: self.ids.next_id(),
            center: center + offset,
            radius,
            density,
            spawned_at: elapsed,
            spin: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftfield_common::{SeededRandom, SequenceRandom};

    #[test]
    fn first_storm_waits_for_interval() {
        let mut field = StormField::new(StormConfig::default());
        let mut rng = SeededRandom::with_seed(1);
        field.advance(Vec3::ZERO, 0.1, 7.9, &mut rng);
        assert!(field.is_empty());
        field.advance(Vec3::ZERO, 0.1, 8.0, &mut rng);
        assert_eq!(field.len(), 1);
    }

    #[test]
    fn spawns_at_most_once_per_interval() {
        let mut field = StormField::new(StormConfig::default());
        let mut rng = SeededRandom::with_seed(1);
        let mut t = 0.0;
        while t < 40.0 {
            field.advance(Vec3::ZERO, 0.5, t, &mut rng);
            t += 0.5;
        }
        // spawns at 8, 16, 24, 32
        assert_eq!(field.len(), 4);
    }

    #[test]
    fn spawn_placement_and_ranges() {
        let mut field = StormField::new(StormConfig::default());
        // x, y, z, radius, density
        let mut rng = SequenceRandom::new(vec![1.0, 0.0, 0.5, 0.5, 0.999]);
        field.advance(Vec3::new(100.0, 0.0, 0.0), 0.0, 8.0, &mut rng);

        let storm = &field.storms()[0];
        assert_eq!(storm.center, Vec3::new(600.0, -100.0, 0.0));
        assert_eq!(storm.radius, 130.0);
        assert_eq!(storm.density, 199);
        assert_eq!(storm.spawned_at, 8.0);
    }

    #[test]
    fn respects_cap() {
        let mut field = StormField::new(StormConfig {
            max_storms: 2,
            spawn_interval: 1.0,
            ..StormConfig::default()
        });
        let mut rng = SeededRandom::with_seed(4);
        for t in 0..20 {
            field.advance(Vec3::ZERO, 1.0, t as f64, &mut rng);
            assert!(field.len() <= 2);
        }
        assert_eq!(field.len(), 2);
    }

    #[test]
    fn storms_expire_after_lifetime() {
        let mut field = StormField::new(StormConfig {
            max_storms: 0,
            ..StormConfig::default()
        });
        field.insert(Storm::new(Vec3::ZERO, 100.0, 0.0));
        field.drain_events();

        let mut rng = SeededRandom::with_seed(1);
        field.advance(Vec3::ZERO, 1.0, 60.0, &mut rng);
        assert_eq!(field.len(), 1, "age equal to lifetime survives");
        field.advance(Vec3::ZERO, 1.0, 60.5, &mut rng);
        assert!(field.is_empty());
        assert!(matches!(
            field.events()[0],
            StreamEvent::Despawned {
                reason: DespawnReason::Expired,
                ..
            }
        ));
    }

    #[test]
    fn player_inside_checks_every_storm() {
        let mut field = StormField::new(StormConfig::default());
        field.insert(Storm::new(Vec3::new(1000.0, 0.0, 0.0), 100.0, 0.0));
        field.insert(Storm::new(Vec3::new(0.0, 0.0, 500.0), 100.0, 0.0));

        assert!(field.is_player_inside(Vec3::new(0.0, 0.0, 450.0)));
        assert!(field.is_player_inside(Vec3::new(0.0, 0.0, 400.0)), "boundary counts");
        assert!(!field.is_player_inside(Vec3::ZERO));
        assert_eq!(field.speed_multiplier_at(Vec3::new(1000.0, 50.0, 0.0)), 0.85);
        assert_eq!(field.speed_multiplier_at(Vec3::ZERO), 1.0);
    }

    #[test]
    fn storms_spin_with_time() {
        let mut field = StormField::new(StormConfig {
            max_storms: 0,
            ..StormConfig::default()
        });
        field.insert(Storm::new(Vec3::ZERO, 100.0, 0.0));
        let mut rng = SeededRandom::with_seed(1);
        field.advance(Vec3::ZERO, 2.0, 1.0, &mut rng);
        assert!((field.storms()[0].spin - 0.1).abs() < 1e-6);
    }
}
