use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use driftfield_common::{EntityId, EntityKind, IdAllocator, RandomSource, Transform};

use crate::events::{DespawnReason, EventLog, StreamEvent};
use crate::variant::{AsteroidVariant, default_variants, pick_weighted};

/// Tuning for the asteroid field.
///
/// Distances are fractions of `spawn_radius` unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsteroidFieldConfig {
    /// Horizon distance in world units. Everything else scales from it.
    pub spawn_radius: f32,
    /// Population cap. Zero makes the field cull-only.
    pub max_asteroids: usize,
    /// Cull when this far behind the player along the facing direction.
    pub rear_cull_factor: f32,
    /// Cull beyond this distance in any direction.
    pub far_cull_factor: f32,
    pub min_spawn_distance: f32,
    pub max_spawn_distance: f32,
    /// Full width of the per-axis placement jitter.
    pub lateral_jitter: f32,
    /// Full width of the per-axis spin draw, radians per frame.
    pub max_rotation_speed: f32,
    /// Impulse multiplier applied each frame.
    pub impulse_decay: f32,
    pub impulse_epsilon: f32,
    /// Per-frame lerp factor pulling a boosted spin back to its original.
    pub spin_recovery_rate: f32,
    pub spin_epsilon: f32,
    pub variants: Vec<AsteroidVariant>,
}

impl Default for AsteroidFieldConfig {
    fn default() -> Self {
        Self {
            spawn_radius: 3000.0,
            max_asteroids: 600,
            rear_cull_factor: 0.2,
            far_cull_factor: 1.1,
            min_spawn_distance: 0.2,
            max_spawn_distance: 0.6,
            lateral_jitter: 0.5,
            max_rotation_speed: 0.02,
            impulse_decay: 0.99,
            impulse_epsilon: 0.01,
            spin_recovery_rate: 0.05,
            spin_epsilon: 0.001,
            variants: default_variants(),
        }
    }
}

/// Saved spin while a shockwave-boosted rotation winds down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpinRecovery {
    pub original: Vec3,
    /// Seconds before the spin starts easing back.
    pub timer: f32,
}

/// A single streamed asteroid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asteroid {
    pub id: EntityId,
    pub variant: usize,
    pub position: Vec3,
    pub rotation: Vec3,
    /// Radians added to `rotation` every frame.
    pub rotation_speed: Vec3,
    pub scale: f32,
    /// Present only while drifting from a shockwave push.
    pub impulse: Option<Vec3>,
    pub spin_recovery: Option<SpinRecovery>,
}

impl Asteroid {
    pub fn transform(&self) -> Transform {
        Transform {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    /// Add to the drift velocity, creating it if absent.
    pub fn apply_impulse(&mut self, velocity: Vec3) {
        self.impulse = Some(self.impulse.unwrap_or(Vec3::ZERO) + velocity);
    }

    /// Spin faster for a while. The first boost in a window remembers the
    /// original speed; later boosts only reset the timer.
    pub fn boost_spin(&mut self, multiplier: f32, jitter: Vec3, recovery_time: f32) {
        let original = self
            .spin_recovery
            .map_or(self.rotation_speed, |r| r.original);
        self.rotation_speed = self.rotation_speed * multiplier + jitter;
        self.spin_recovery = Some(SpinRecovery {
            original,
            timer: recovery_time,
        });
    }

    fn integrate(&mut self, dt: f32, config: &AsteroidFieldConfig) {
        self.rotation += self.rotation_speed;

        if let Some(impulse) = self.impulse {
            self.position += impulse * dt;
            let decayed = impulse * config.impulse_decay;
            self.impulse = (decayed.length() >= config.impulse_epsilon).then_some(decayed);
        }

        if let Some(mut recovery) = self.spin_recovery {
            recovery.timer = (recovery.timer - dt).max(0.0);
            if recovery.timer > 0.0 {
                self.spin_recovery = Some(recovery);
                return;
            }
            self.rotation_speed = self
                .rotation_speed
                .lerp(recovery.original, config.spin_recovery_rate);
            if self.rotation_speed.distance(recovery.original) < config.spin_epsilon {
                self.rotation_speed = recovery.original;
                self.spin_recovery = None;
            } else {
                self.spin_recovery = Some(recovery);
            }
        }
    }
}

/// Bounded asteroid population recycled around the player.
///
/// Asteroids behind or far from the player are culled and fresh ones are
/// placed ahead, so a fixed-size set reads as an endless field.
#[derive(Debug, Clone)]
pub struct AsteroidField {
    config: AsteroidFieldConfig,
    weights: Vec<f32>,
    asteroids: Vec<Asteroid>,
    ids: IdAllocator,
    events: EventLog,
}

impl AsteroidField {
    pub fn new(config: AsteroidFieldConfig) -> Self {
        let weights = config.variants.iter().map(|v| v.weight).collect();
        Self {
            config,
            weights,
            asteroids: Vec::new(),
            ids: IdAllocator::new(EntityKind::Asteroid),
            events: EventLog::default(),
        }
    }

    pub fn config(&self) -> &AsteroidFieldConfig {
        &self.config
    }

    pub fn asteroids(&self) -> &[Asteroid] {
        &self.asteroids
    }

    pub fn asteroids_mut(&mut self) -> &mut [Asteroid] {
        &mut self.asteroids
    }

    pub fn len(&self) -> usize {
        self.asteroids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asteroids.is_empty()
    }

    pub fn get(&self, id: EntityId) -> Option<&Asteroid> {
        self.asteroids.iter().find(|a| a.id == id)
    }

    /// Drain and return pending membership events.
    pub fn drain_events(&mut self) -> Vec<StreamEvent> {
        self.events.drain()
    }

    pub fn events(&self) -> &[StreamEvent] {
        self.events.as_slice()
    }

    /// Drop every asteroid and pending event. Ids keep counting, so nothing
    /// spawned afterwards reuses a name a scene may still hold.
    pub fn clear(&mut self) {
        self.asteroids.clear();
        self.events.clear();
    }

    /// Insert an asteroid directly, bypassing placement. Used for scripted
    /// setups and tests.
    pub fn insert(&mut self, asteroid: Asteroid) {
        self.events.push(StreamEvent::Spawned {
            id: asteroid.id,
            kind: EntityKind::Asteroid,
            transform: asteroid.transform(),
        });
        self.asteroids.push(asteroid);
    }

    /// Remove an asteroid that hit the player.
    pub fn remove(&mut self, id: EntityId) -> Option<Asteroid> {
        let index = self.asteroids.iter().position(|a| a.id == id)?;
        let asteroid = self.asteroids.swap_remove(index);
        self.events.push(StreamEvent::Despawned {
            id,
            kind: EntityKind::Asteroid,
            reason: DespawnReason::Collided,
        });
        Some(asteroid)
    }

    /// Cull, refill and integrate. Call once per frame.
    ///
    /// `player_direction` must already be normalized.
    pub fn advance(
        &mut self,
        player_position: Vec3,
        player_direction: Vec3,
        dt: f32,
        rng: &mut impl RandomSource,
    ) {
        let _span = tracing::trace_span!("asteroid_field_advance").entered();

        let culled = self.cull(player_position, player_direction);

        let mut spawned = 0usize;
        while self.asteroids.len() < self.config.max_asteroids {
            let asteroid = self.spawn_in_front(player_position, player_direction, rng);
            self.insert(asteroid);
            spawned += 1;
        }

        for asteroid in &mut self.asteroids {
            asteroid.integrate(dt, &self.config);
        }

        tracing::trace!(
            culled,
            spawned,
            total = self.asteroids.len(),
            "asteroid field advanced"
        );
    }

    fn cull(&mut self, player_position: Vec3, player_direction: Vec3) -> usize {
        let rear_limit = -self.config.spawn_radius * self.config.rear_cull_factor;
        let far_limit = self.config.spawn_radius * self.config.far_cull_factor;
        let before = self.asteroids.len();
        let events = &mut self.events;

        self.asteroids.retain(|asteroid| {
            let relative = asteroid.position - player_position;
            let reason = if relative.dot(player_direction) < rear_limit {
                Some(DespawnReason::Behind)
            } else if relative.length() > far_limit {
                Some(DespawnReason::TooFar)
            } else {
                None
            };
            match reason {
                Some(reason) => {
                    events.push(StreamEvent::Despawned {
                        id: asteroid.id,
                        kind: EntityKind::Asteroid,
                        reason,
                    });
                    false
                }
                None => true,
            }
        });

        before - self.asteroids.len()
    }

    fn spawn_in_front(
        &mut self,
        center: Vec3,
        direction: Vec3,
        rng: &mut impl RandomSource,
    ) -> Asteroid {
        let radius = self.config.spawn_radius;
        let variant = pick_weighted(&self.weights, rng.next_f32());

        let distance = radius
            * rng.range(
                self.config.min_spawn_distance,
                self.config.max_spawn_distance,
            );
        let jitter_span = radius * self.config.lateral_jitter;
        let jitter = Vec3::new(
            rng.centered(jitter_span),
            rng.centered(jitter_span),
            rng.centered(jitter_span),
        );
        let position = center + direction * distance + jitter;

        let scale = self
            .config
            .variants
            .get(variant)
            .map_or(1.0, |v| rng.range(v.min_scale, v.max_scale));

        let rotation = Vec3::new(rng.range(0.0, PI), rng.range(0.0, PI), rng.range(0.0, PI));
        let spin = self.config.max_rotation_speed;
        let rotation_speed = Vec3::new(rng.centered(spin), rng.centered(spin), rng.centered(spin));

        Asteroid {
            id: self.ids.next_id(),
            variant,
            position,
            rotation,
            rotation_speed,
            scale,
            impulse: None,
            spin_recovery: None,
        }
    }
}
