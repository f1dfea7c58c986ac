use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

use driftfield_assets::ModelTemplate;
use driftfield_common::{EntityId, EntityKind, IdAllocator, RandomSource, Transform};

use crate::events::{DespawnReason, EventLog, StreamEvent};

/// Tuning for rescue target ("astronaut") streaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RescueConfig {
    pub max_targets: usize,
    /// Seconds between successful spawns.
    pub spawn_cooldown: f64,
    /// Per-frame probability that a spawn is attempted once the cooldown has passed.
    pub spawn_chance: f32,
    /// Targets farther than this from the player are dropped.
    pub despawn_distance: f32,
    pub min_spawn_distance: f32,
    pub max_spawn_distance: f32,
    /// Full width of the yaw offset applied to the forward vector, radians.
    pub yaw_cone: f32,
    /// Full width of the vertical offset.
    pub vertical_jitter: f32,
    /// New targets closer than this to an existing one are rejected.
    pub min_separation: f32,
    pub scale: f32,
    /// Seconds a collected target takes to shrink away.
    pub collect_duration: f32,
}

impl Default for RescueConfig {
    fn default() -> Self {
        Self {
            max_targets: 40,
            spawn_cooldown: 0.5,
            spawn_chance: 0.05,
            despawn_distance: 600.0,
            min_spawn_distance: 150.0,
            max_spawn_distance: 300.0,
            yaw_cone: PI * 0.8,
            vertical_jitter: 50.0,
            min_separation: 230.0,
            scale: 0.05,
            collect_duration: 0.15,
        }
    }
}

/// Lifecycle of a rescue target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RescueState {
    Active,
    /// Shrinking towards the contact point after the player touched it.
    Collecting {
        elapsed: f32,
        origin: Vec3,
        destination: Vec3,
        start_scale: f32,
    },
    Removed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescueTarget {
    pub id: EntityId,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
    /// Seconds into the template's animation clip.
    pub animation_phase: f32,
    pub spawned_at: f64,
    /// False for targets placed by hand rather than by the spawner.
    pub procedural: bool,
    pub state: RescueState,
}

impl RescueTarget {
    /// A hand-placed, already active target.
    pub fn placed(position: Vec3, now: f64) -> Self {
        Self {
            id: EntityId::new(),
            position,
            rotation: Vec3::ZERO,
            scale: RescueConfig::default().scale,
            animation_phase: 0.0,
            spawned_at: now,
            procedural: false,
            state: RescueState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, RescueState::Active)
    }

    pub fn transform(&self) -> Transform {
        Transform {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    /// Advance the collect animation. Returns true once it has finished.
    fn advance_collect(&mut self, dt: f32, duration: f32) -> bool {
        let RescueState::Collecting {
            elapsed,
            origin,
            destination,
            start_scale,
        } = self.state
        else {
            return false;
        };

        let elapsed = elapsed + dt;
        let progress = if duration > 0.0 {
            (elapsed / duration).min(1.0)
        } else {
            1.0
        };
        self.scale = start_scale * (1.0 - progress);
        self.position = origin.lerp(destination, progress);

        if progress >= 1.0 {
            self.state = RescueState::Removed;
            true
        } else {
            self.state = RescueState::Collecting {
                elapsed,
                origin,
                destination,
                start_scale,
            };
            false
        }
    }
}

/// Streams rescue targets in a cone ahead of the player.
///
/// Nothing spawns until a model template is installed; until then `advance`
/// returns without touching state.
#[derive(Debug, Clone)]
pub struct RescueField {
    config: RescueConfig,
    template: Option<ModelTemplate>,
    targets: Vec<RescueTarget>,
    last_spawn: Option<f64>,
    ids: IdAllocator,
    events: EventLog,
}

impl RescueField {
    pub fn new(config: RescueConfig) -> Self {
        Self {
            config,
            template: None,
            targets: Vec::new(),
            last_spawn: None,
            ids: IdAllocator::new(EntityKind::RescueTarget),
            events: EventLog::default(),
        }
    }

    pub fn config(&self) -> &RescueConfig {
        &self.config
    }

    pub fn set_template(&mut self, template: ModelTemplate) {
        tracing::debug!(name = %template.name, "rescue template installed");
        self.template = Some(template);
    }

    pub fn template(&self) -> Option<&ModelTemplate> {
        self.template.as_ref()
    }

    pub fn has_template(&self) -> bool {
        self.template.is_some()
    }

    /// Every target currently tracked, including ones mid-collection.
    pub fn targets(&self) -> &[RescueTarget] {
        &self.targets
    }

    /// Targets the player can still touch.
    pub fn active(&self) -> impl Iterator<Item = &RescueTarget> {
        self.targets.iter().filter(|t| t.is_active())
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn get(&self, id: EntityId) -> Option<&RescueTarget> {
        self.targets.iter().find(|t| t.id == id)
    }

    pub fn drain_events(&mut self) -> Vec<StreamEvent> {
        self.events.drain()
    }

    pub fn events(&self) -> &[StreamEvent] {
        self.events.as_slice()
    }

    /// Drop every target and pending event and rearm the spawn cooldown.
    /// The template and the id sequence survive.
    pub fn clear(&mut self) {
        self.targets.clear();
        self.last_spawn = None;
        self.events.clear();
    }

    /// Track a target created outside the spawner.
    pub fn insert(&mut self, target: RescueTarget) {
        self.events.push(StreamEvent::Spawned {
            id: target.id,
            kind: EntityKind::RescueTarget,
            transform: target.transform(),
        });
        self.targets.push(target);
    }

    /// Start the collect animation towards the midpoint between the target
    /// and the player. Returns false if the target is unknown or not active.
    pub fn begin_collect(&mut self, id: EntityId, player_position: Vec3) -> bool {
        let Some(target) = self.targets.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        if !target.is_active() {
            return false;
        }
        target.state = RescueState::Collecting {
            elapsed: 0.0,
            origin: target.position,
            destination: (target.position + player_position) * 0.5,
            start_scale: target.scale,
        };
        true
    }

    /// Animate collections, despawn distant targets and maybe spawn one.
    pub fn advance(
        &mut self,
        player_position: Vec3,
        player_direction: Vec3,
        dt: f32,
        now: f64,
        rng: &mut impl RandomSource,
    ) {
        if self.template.is_none() {
            tracing::trace!("rescue template not loaded, skipping");
            return;
        }
        let _span = tracing::trace_span!("rescue_field_advance").entered();

        self.finish_collections(dt);
        self.despawn_distant(player_position);

        if self.should_spawn(now, rng) {
            if let Some(target) = self.spawn_in_front(player_position, player_direction, now, rng)
            {
                tracing::debug!(id = %target.id, position = ?target.position, "rescue target spawned");
                self.insert(target);
                self.last_spawn = Some(now);
            }
        }
    }

    fn finish_collections(&mut self, dt: f32) {
        let duration = self.config.collect_duration;
        let events = &mut self.events;
        self.targets.retain_mut(|target| {
            if target.advance_collect(dt, duration) {
                events.push(StreamEvent::Despawned {
                    id: target.id,
                    kind: EntityKind::RescueTarget,
                    reason: DespawnReason::Collected,
                });
                false
            } else {
                true
            }
        });
    }

    fn despawn_distant(&mut self, player_position: Vec3) {
        let limit = self.config.despawn_distance;
        let events = &mut self.events;
        self.targets.retain(|target| {
            if target.is_active() && target.position.distance(player_position) > limit {
                events.push(StreamEvent::Despawned {
                    id: target.id,
                    kind: EntityKind::RescueTarget,
                    reason: DespawnReason::TooFar,
                });
                false
            } else {
                true
            }
        });
    }

    fn should_spawn(&self, now: f64, rng: &mut impl RandomSource) -> bool {
        let cooldown_passed = self
            .last_spawn
            .is_none_or(|last| now - last > self.config.spawn_cooldown);
        if !cooldown_passed {
            return false;
        }
        // The chance is rolled every frame past the cooldown, capped or not.
        let lucky = rng.next_f32() < self.config.spawn_chance;
        lucky && self.targets.len() < self.config.max_targets
    }

    fn spawn_in_front(
        &mut self,
        center: Vec3,
        direction: Vec3,
        now: f64,
        rng: &mut impl RandomSource,
    ) -> Option<RescueTarget> {
        let distance = rng.range(self.config.min_spawn_distance, self.config.max_spawn_distance);
        let angle = rng.centered(self.config.yaw_cone);
        let height = rng.centered(self.config.vertical_jitter);

        let (sin, cos) = angle.sin_cos();
        let rotated = Vec3::new(
            direction.x * cos - direction.z * sin,
            direction.y,
            direction.x * sin + direction.z * cos,
        )
        .normalize_or_zero();

        let position = center + rotated * distance + Vec3::Y * height;

        let too_close = self
            .targets
            .iter()
            .any(|t| t.position.distance(position) < self.config.min_separation);
        if too_close {
            tracing::trace!(?position, "rescue spawn rejected, too close to another target");
            return None;
        }

        let clip = self
            .template
            .as_ref()
            .and_then(|t| t.clip_duration)
            .unwrap_or(0.0);

        Some(RescueTarget {
            id: self.ids.next_id(),
            position,
            rotation: Vec3::new(rng.range(0.0, TAU), rng.range(0.0, TAU), rng.range(0.0, TAU)),
            scale: self.config.scale,
            animation_phase: rng.next_f32() * clip,
            spawned_at: now,
            procedural: true,
            state: RescueState::Active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftfield_common::{SeededRandom, SequenceRandom};

    fn loaded_field(config: RescueConfig) -> RescueField {
        let mut field = RescueField::new(config);
        field.set_template(ModelTemplate::placeholder("astronaut", Some(2.0)));
        field
    }

    fn eager_config() -> RescueConfig {
        RescueConfig {
            spawn_chance: 1.0,
            spawn_cooldown: 0.0,
            ..RescueConfig::default()
        }
    }

    #[test]
    fn no_template_is_a_noop() {
        let mut field = RescueField::new(eager_config());
        let mut rng = SequenceRandom::constant(0.0);
        field.advance(Vec3::ZERO, Vec3::Z, 0.016, 1.0, &mut rng);
        assert!(field.is_empty());
        assert!(field.events().is_empty());
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn spawns_ahead_within_distance_band() {
        let mut field = loaded_field(eager_config());
        let mut rng = SeededRandom::with_seed(5);
        field.advance(Vec3::ZERO, Vec3::Z, 0.016, 0.0, &mut rng);

        assert_eq!(field.len(), 1);
        let target = &field.targets()[0];
        let horizontal = Vec3::new(target.position.x, 0.0, target.position.z);
        assert!(horizontal.length() >= 150.0 - 1e-3);
        assert!(horizontal.length() <= 300.0 + 1e-3);
        assert!(target.position.z > 0.0, "±72° cone stays in front");
        assert!(target.position.y.abs() <= 25.0);
        assert!(target.procedural);
        assert!(target.animation_phase < 2.0);
    }

    #[test]
    fn straight_ahead_placement() {
        let mut field = loaded_field(eager_config());
        // chance, distance, angle, height, rotation xyz, phase
        let mut rng = SequenceRandom::new(vec![0.0, 0.5, 0.5, 0.5, 0.0, 0.0, 0.0, 0.25]);
        field.advance(Vec3::new(10.0, 0.0, 0.0), Vec3::Z, 0.016, 3.0, &mut rng);

        let target = &field.targets()[0];
        assert!((target.position - Vec3::new(10.0, 0.0, 225.0)).length() < 1e-3);
        assert_eq!(target.spawned_at, 3.0);
        assert!((target.animation_phase - 0.5).abs() < 1e-6);
    }

    #[test]
    fn respects_cooldown_between_spawns() {
        let mut field = loaded_field(RescueConfig {
            spawn_chance: 1.0,
            min_separation: 0.0,
            ..RescueConfig::default()
        });
        let mut rng = SeededRandom::with_seed(2);
        field.advance(Vec3::ZERO, Vec3::Z, 0.1, 0.0, &mut rng);
        field.advance(Vec3::ZERO, Vec3::Z, 0.1, 0.1, &mut rng);
        field.advance(Vec3::ZERO, Vec3::Z, 0.1, 0.4, &mut rng);
        assert_eq!(field.len(), 1);

        field.advance(Vec3::ZERO, Vec3::Z, 0.1, 0.6, &mut rng);
        assert_eq!(field.len(), 2);
    }

    #[test]
    fn failed_chance_skips_spawn() {
        let mut field = loaded_field(RescueConfig {
            spawn_chance: 0.5,
            ..eager_config()
        });
        let mut rng = SequenceRandom::constant(0.9);
        for i in 0..20 {
            field.advance(Vec3::ZERO, Vec3::Z, 0.016, i as f64, &mut rng);
        }
        assert!(field.is_empty());
    }

    #[test]
    fn rejects_spawns_too_close_to_existing_target() {
        let mut field = loaded_field(eager_config());
        // Same draw every time: every candidate lands on the same spot.
        let mut rng = SequenceRandom::constant(0.0);
        field.advance(Vec3::ZERO, Vec3::Z, 0.016, 0.0, &mut rng);
        assert_eq!(field.len(), 1);

        for i in 1..10 {
            field.advance(Vec3::ZERO, Vec3::Z, 0.016, i as f64, &mut rng);
        }
        assert_eq!(field.len(), 1);
    }

    #[test]
    fn population_cap_holds() {
        let mut field = loaded_field(RescueConfig {
            max_targets: 3,
            min_separation: 0.0,
            ..eager_config()
        });
        let mut rng = SeededRandom::with_seed(11);
        for i in 0..100 {
            field.advance(Vec3::ZERO, Vec3::Z, 0.016, i as f64, &mut rng);
            assert!(field.len() <= 3);
        }
        assert_eq!(field.len(), 3);
    }

    #[test]
    fn despawns_beyond_max_distance() {
        let mut field = loaded_field(RescueConfig {
            spawn_chance: 0.0,
            ..RescueConfig::default()
        });
        let near = RescueTarget::placed(Vec3::new(0.0, 0.0, 500.0), 0.0);
        let far = RescueTarget::placed(Vec3::new(0.0, 0.0, 700.0), 0.0);
        let (near_id, far_id) = (near.id, far.id);
        field.insert(near);
        field.insert(far);

        let mut rng = SeededRandom::with_seed(1);
        field.advance(Vec3::ZERO, Vec3::Z, 0.016, 1.0, &mut rng);
        assert!(field.get(near_id).is_some());
        assert!(field.get(far_id).is_none());
    }

    #[test]
    fn collect_animation_shrinks_then_removes() {
        let mut field = loaded_field(RescueConfig {
            spawn_chance: 0.0,
            ..RescueConfig::default()
        });
        let target = RescueTarget::placed(Vec3::new(0.0, 0.0, 10.0), 0.0);
        let id = target.id;
        field.insert(target);
        field.drain_events();

        assert!(field.begin_collect(id, Vec3::ZERO));
        assert!(!field.begin_collect(id, Vec3::ZERO), "already collecting");
        assert_eq!(field.active().count(), 0);

        let mut rng = SeededRandom::with_seed(1);
        field.advance(Vec3::ZERO, Vec3::Z, 0.075, 1.0, &mut rng);
        let halfway = field.get(id).unwrap();
        assert!((halfway.scale - 0.025).abs() < 1e-6);
        assert!((halfway.position.z - 7.5).abs() < 1e-4);

        field.advance(Vec3::ZERO, Vec3::Z, 0.1, 1.1, &mut rng);
        assert!(field.get(id).is_none());
        assert_eq!(
            field.drain_events(),
            vec![StreamEvent::Despawned {
                id,
                kind: EntityKind::RescueTarget,
                reason: DespawnReason::Collected,
            }]
        );
    }

    #[test]
    fn collected_target_is_not_reintroduced() {
        let mut field = loaded_field(RescueConfig {
            spawn_chance: 0.0,
            ..RescueConfig::default()
        });
        let target = RescueTarget::placed(Vec3::ZERO, 0.0);
        let id = target.id;
        field.insert(target);
        field.begin_collect(id, Vec3::ZERO);

        let mut rng = SeededRandom::with_seed(1);
        for i in 0..60 {
            field.advance(Vec3::ZERO, Vec3::Z, 1.0 / 60.0, i as f64 / 60.0, &mut rng);
        }
        assert!(field.get(id).is_none());
        assert!(field.is_empty());
    }

    #[test]
    fn begin_collect_unknown_id() {
        let mut field = RescueField::new(RescueConfig::default());
        assert!(!field.begin_collect(EntityId::new(), Vec3::ZERO));
    }
}
