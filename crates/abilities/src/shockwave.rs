use std::collections::HashSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use driftfield_common::{EntityId, RandomSource};
use driftfield_stream::AsteroidField;

/// Gate that lets a discrete ability fire at most once per `cooldown` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShockwaveCooldown {
    cooldown: f64,
    last_used: Option<f64>,
}

impl ShockwaveCooldown {
    pub fn new(cooldown: f64) -> Self {
        Self {
            cooldown: cooldown.max(0.0),
            last_used: None,
        }
    }

    pub fn cooldown(&self) -> f64 {
        self.cooldown
    }

    pub fn last_used(&self) -> Option<f64> {
        self.last_used
    }

    pub fn is_ready(&self, now: f64) -> bool {
        self.last_used
            .is_none_or(|last| now - last >= self.cooldown)
    }

    /// Fire if the cooldown has elapsed. A refused trigger changes nothing.
    pub fn try_trigger(&mut self, now: f64) -> bool {
        if !self.is_ready(now) {
            return false;
        }
        self.last_used = Some(now);
        true
    }

    /// Seconds until the next trigger is allowed, never negative.
    pub fn remaining(&self, now: f64) -> f64 {
        self.last_used
            .map_or(0.0, |last| (self.cooldown - (now - last)).max(0.0))
    }
}

/// Shockwave tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShockwaveConfig {
    /// Seconds between triggers.
    pub cooldown: f64,
    pub max_radius: f32,
    /// Seconds for the wave to reach `max_radius`.
    pub duration: f32,
    pub force: f32,
    /// Floor on the falloff, as a fraction of `force`.
    pub min_force_fraction: f32,
    /// Inside this fraction of `max_radius` the push is boosted.
    pub close_range_fraction: f32,
    pub close_range_boost: f32,
    /// Vertical kick span relative to the push intensity.
    pub vertical_kick: f32,
    pub spin_multiplier: f32,
    pub spin_jitter: f32,
    /// Seconds before a boosted spin starts easing back.
    pub spin_recovery_time: f32,
}

impl Default for ShockwaveConfig {
    fn default() -> Self {
        Self {
            cooldown: 3.0,
            max_radius: 50.0,
            duration: 2.0,
            force: 15.0,
            min_force_fraction: 0.3,
            close_range_fraction: 0.3,
            close_range_boost: 1.2,
            vertical_kick: 0.3,
            spin_multiplier: 2.0,
            spin_jitter: 0.1,
            spin_recovery_time: 3.0,
        }
    }
}

/// One expanding wave. Each asteroid is pushed at most once per wave.
#[derive(Debug, Clone)]
pub struct Shockwave {
    pub origin: Vec3,
    pub elapsed: f32,
    pub max_radius: f32,
    pub duration: f32,
    pub force: f32,
    affected: HashSet<EntityId>,
}

impl Shockwave {
    pub fn new(origin: Vec3, config: &ShockwaveConfig) -> Self {
        Self {
            origin,
            elapsed: 0.0,
            max_radius: config.max_radius,
            duration: config.duration,
            force: config.force,
            affected: HashSet::new(),
        }
    }

    /// Expansion progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).min(1.0)
    }

    pub fn current_radius(&self) -> f32 {
        self.progress() * self.max_radius
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    pub fn has_affected(&self, id: EntityId) -> bool {
        self.affected.contains(&id)
    }

    pub fn affected_count(&self) -> usize {
        self.affected.len()
    }

    /// Push, within the current radius, every asteroid this wave has not
    /// touched yet. Returns how many were pushed.
    fn sweep(
        &mut self,
        field: &mut AsteroidField,
        config: &ShockwaveConfig,
        rng: &mut impl RandomSource,
    ) -> usize {
        let radius = self.current_radius();
        let mut pushed = 0;

        for asteroid in field.asteroids_mut() {
            if self.affected.contains(&asteroid.id) {
                continue;
            }
            let offset = asteroid.position - self.origin;
            let distance = offset.length();
            if distance > radius || distance > self.max_radius {
                continue;
            }

            let falloff = (1.0 - distance / self.max_radius).max(config.min_force_fraction);
            let mut intensity = self.force * falloff;
            if distance < self.max_radius * config.close_range_fraction {
                intensity *= config.close_range_boost;
            }

            let mut push = offset.normalize_or_zero() * intensity;
            push.y += rng.centered(intensity * config.vertical_kick);
            asteroid.apply_impulse(push);

            let jitter = Vec3::new(
                rng.centered(config.spin_jitter),
                rng.centered(config.spin_jitter),
                rng.centered(config.spin_jitter),
            );
            asteroid.boost_spin(config.spin_multiplier, jitter, config.spin_recovery_time);

            self.affected.insert(asteroid.id);
            pushed += 1;
        }

        pushed
    }
}

/// Cooldown-gated shockwaves and the waves currently expanding.
#[derive(Debug, Clone)]
pub struct ShockwaveSystem {
    config: ShockwaveConfig,
    cooldown: ShockwaveCooldown,
    waves: Vec<Shockwave>,
}

impl ShockwaveSystem {
    pub fn new(config: ShockwaveConfig) -> Self {
        Self {
            cooldown: ShockwaveCooldown::new(config.cooldown),
            config,
            waves: Vec::new(),
        }
    }

    pub fn config(&self) -> &ShockwaveConfig {
        &self.config
    }

    pub fn cooldown(&self) -> &ShockwaveCooldown {
        &self.cooldown
    }

    pub fn waves(&self) -> &[Shockwave] {
        &self.waves
    }

    pub fn active_count(&self) -> usize {
        self.waves.len()
    }

    /// Start a wave at `origin` if the cooldown allows it.
    pub fn trigger(&mut self, origin: Vec3, now: f64) -> bool {
        if !self.cooldown.try_trigger(now) {
            tracing::trace!(
                remaining = self.cooldown.remaining(now),
                "shockwave on cooldown"
            );
            return false;
        }
        tracing::debug!(origin = ?origin, "shockwave fired");
        self.waves.push(Shockwave::new(origin, &self.config));
        true
    }

    /// Expand every wave and push what it reaches. Finished waves still get
    /// their final sweep before being dropped. Returns asteroids pushed.
    pub fn update(
        &mut self,
        dt: f32,
        field: &mut AsteroidField,
        rng: &mut impl RandomSource,
    ) -> usize {
        if self.waves.is_empty() {
            return 0;
        }
        let _span = tracing::trace_span!("shockwave_update", waves = self.waves.len()).entered();

        let mut pushed = 0;
        for wave in &mut self.waves {
            wave.elapsed += dt;
            pushed += wave.sweep(field, &self.config, rng);
        }
        self.waves.retain(|w| !w.is_finished());
        pushed
    }

    pub fn clear(&mut self) {
        self.waves.clear();
    }
}

impl Default for ShockwaveSystem {
    fn default() -> Self {
        Self::new(ShockwaveConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftfield_common::SequenceRandom;
    use driftfield_stream::{Asteroid, AsteroidFieldConfig};

    fn asteroid_at(position: Vec3) -> Asteroid {
        Asteroid {
            id: EntityId::new(),
            variant: 0,
            position,
            rotation: Vec3::ZERO,
            rotation_speed: Vec3::new(0.01, 0.0, 0.0),
            scale: 1.0,
            impulse: None,
            spin_recovery: None,
        }
    }

    fn field_with(positions: &[Vec3]) -> AsteroidField {
        let mut field = AsteroidField::new(AsteroidFieldConfig::default());
        for p in positions {
            field.insert(asteroid_at(*p));
        }
        field
    }

    #[test]
    fn cooldown_refuses_early_trigger_without_resetting() {
        let mut gate = ShockwaveCooldown::new(3.0);
        assert!(gate.try_trigger(10.0));
        assert!(!gate.try_trigger(12.0));
        assert_eq!(gate.last_used(), Some(10.0));
        assert_eq!(gate.remaining(12.0), 1.0);
        assert!(gate.try_trigger(13.0));
        assert_eq!(gate.last_used(), Some(13.0));
    }

    #[test]
    fn first_trigger_always_fires() {
        let mut gate = ShockwaveCooldown::new(100.0);
        assert_eq!(gate.remaining(0.0), 0.0);
        assert!(gate.try_trigger(0.0));
    }

    #[test]
    fn remaining_never_negative() {
        let mut gate = ShockwaveCooldown::new(2.0);
        gate.try_trigger(0.0);
        assert_eq!(gate.remaining(50.0), 0.0);
    }

    #[test]
    fn system_trigger_respects_cooldown() {
        let mut system = ShockwaveSystem::default();
        assert!(system.trigger(Vec3::ZERO, 0.0));
        assert!(!system.trigger(Vec3::ZERO, 1.0));
        assert_eq!(system.active_count(), 1);
    }

    #[test]
    fn wave_radius_grows_with_time() {
        let config = ShockwaveConfig::default();
        let mut wave = Shockwave::new(Vec3::ZERO, &config);
        wave.elapsed = 1.0;
        assert_eq!(wave.current_radius(), 25.0);
        wave.elapsed = 5.0;
        assert_eq!(wave.current_radius(), 50.0);
        assert!(wave.is_finished());
    }

    #[test]
    fn pushes_only_what_the_front_has_reached() {
        let mut field = field_with(&[Vec3::new(10.0, 0.0, 0.0), Vec3::new(40.0, 0.0, 0.0)]);
        let mut system = ShockwaveSystem::default();
        let mut rng = SequenceRandom::constant(0.5);
        system.trigger(Vec3::ZERO, 0.0);

        // radius 25 after one second
        assert_eq!(system.update(1.0, &mut field, &mut rng), 1);
        assert!(field.asteroids()[0].impulse.is_some());
        assert!(field.asteroids()[1].impulse.is_none());

        // radius 50, wave completes and is dropped
        assert_eq!(system.update(1.0, &mut field, &mut rng), 1);
        assert!(field.asteroids()[1].impulse.is_some());
        assert_eq!(system.active_count(), 0);
    }

    #[test]
    fn each_asteroid_is_pushed_once_per_wave() {
        let mut field = field_with(&[Vec3::new(5.0, 0.0, 0.0)]);
        let mut system = ShockwaveSystem::default();
        let mut rng = SequenceRandom::constant(0.5);
        system.trigger(Vec3::ZERO, 0.0);

        let mut total = 0;
        for _ in 0..8 {
            total += system.update(0.25, &mut field, &mut rng);
        }
        assert_eq!(total, 1);
    }

    #[test]
    fn impulse_falls_off_with_a_floor() {
        let mut field = field_with(&[
            Vec3::new(0.0, 0.0, 20.0),
            Vec3::new(0.0, 0.0, -45.0),
            Vec3::new(5.0, 0.0, 0.0),
        ]);
        let mut system = ShockwaveSystem::default();
        // centered draws of 0.5 give no vertical kick and no spin jitter
        let mut rng = SequenceRandom::constant(0.5);
        system.trigger(Vec3::ZERO, 0.0);
        system.update(2.0, &mut field, &mut rng);

        let mid = field.asteroids()[0].impulse.unwrap_or(Vec3::ZERO);
        assert!((mid - Vec3::new(0.0, 0.0, 9.0)).length() < 1e-4);

        // 15 * (1 - 0.9) = 1.5 is below the 4.5 floor
        let far = field.asteroids()[1].impulse.unwrap_or(Vec3::ZERO);
        assert!((far - Vec3::new(0.0, 0.0, -4.5)).length() < 1e-4);

        // 15 * 0.9 * 1.2 inside the close range
        let near = field.asteroids()[2].impulse.unwrap_or(Vec3::ZERO);
        assert!((near - Vec3::new(16.2, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn vertical_kick_scales_with_intensity() {
        let mut field = field_with(&[Vec3::new(0.0, 0.0, 20.0)]);
        let mut system = ShockwaveSystem::default();
        // first draw is the vertical kick, then the spin jitter
        let mut rng = SequenceRandom::new(vec![1.0, 0.5, 0.5, 0.5]);
        system.trigger(Vec3::ZERO, 0.0);
        system.update(2.0, &mut field, &mut rng);

        let impulse = field.asteroids()[0].impulse.unwrap_or(Vec3::ZERO);
        assert!((impulse.y - 9.0 * 0.3 * 0.5).abs() < 1e-4);
    }

    #[test]
    fn spin_is_boosted_and_recovery_scheduled() {
        let mut field = field_with(&[Vec3::new(0.0, 0.0, 10.0)]);
        let mut system = ShockwaveSystem::default();
        let mut rng = SequenceRandom::constant(0.5);
        system.trigger(Vec3::ZERO, 0.0);
        system.update(2.0, &mut field, &mut rng);

        let asteroid = &field.asteroids()[0];
        assert!((asteroid.rotation_speed.x - 0.02).abs() < 1e-6);
        let recovery = asteroid.spin_recovery.expect("recovery scheduled");
        assert_eq!(recovery.original, Vec3::new(0.01, 0.0, 0.0));
        assert_eq!(recovery.timer, 3.0);
    }

    #[test]
    fn asteroids_beyond_max_radius_are_untouched() {
        let mut field = field_with(&[Vec3::new(0.0, 60.0, 0.0)]);
        let mut system = ShockwaveSystem::default();
        let mut rng = SequenceRandom::constant(0.5);
        system.trigger(Vec3::ZERO, 0.0);
        assert_eq!(system.update(3.0, &mut field, &mut rng), 0);
        assert!(field.asteroids()[0].impulse.is_none());
    }

    #[test]
    fn update_without_waves_is_a_no_op() {
        let mut field = field_with(&[Vec3::ZERO]);
        let mut system = ShockwaveSystem::default();
        let mut rng = SequenceRandom::constant(0.5);
        assert_eq!(system.update(1.0, &mut field, &mut rng), 0);
        assert!(field.asteroids()[0].impulse.is_none());
    }
}
