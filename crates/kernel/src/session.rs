use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use driftfield_abilities::{Boost, ShockwaveSystem};
use driftfield_assets::{AssetError, ModelTemplate, TemplateLoader};
use driftfield_collision::find_collisions;
use driftfield_common::{EntityId, RandomSource, SeededRandom};
use driftfield_input::ControlState;
use driftfield_stream::{AsteroidField, RescueField, StormField, StreamEvent};

use crate::clock::GameClock;
use crate::config::GameConfig;
use crate::ship::Ship;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Starting time budget in seconds.
    pub duration: f64,
    /// Seconds added per rescue.
    pub rescue_bonus: f64,
    pub score_per_rescue: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration: GameClock::DEFAULT_DURATION,
            rescue_bonus: 3.0,
            score_per_rescue: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Waiting on the start screen. Ticks do nothing.
    Menu,
    Running,
    /// The clock ran out. Final until reset.
    TimeUp,
}

/// Gameplay outcomes, in the order they happened.
///
/// Membership changes for presentation travel separately as `StreamEvent`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    Started,
    Rescued { id: EntityId, total: u32 },
    AsteroidHit { id: EntityId, total: u32 },
    ShockwaveFired { origin: Vec3 },
    BoostExhausted,
    EnteredStorm,
    LeftStorm,
    TimeUp { rescued: u32, score: u32 },
}

/// One run of the game.
///
/// Owns every simulated system and steps them in a fixed order each tick.
/// Randomness comes from `R`, so a seeded session with the same inputs
/// replays exactly.
#[derive(Debug)]
pub struct Session<R: RandomSource = SeededRandom> {
    config: GameConfig,
    phase: SessionPhase,
    clock: GameClock,
    ship: Ship,
    asteroids: AsteroidField,
    rescues: RescueField,
    storms: StormField,
    boost: Boost,
    shockwave: ShockwaveSystem,
    rng: R,
    tick: u64,
    rescued: u32,
    asteroid_hits: u32,
    in_storm: bool,
    events: Vec<SessionEvent>,
}

impl Session<SeededRandom> {
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::new(config, SeededRandom::with_seed(seed))
    }
}

impl<R: RandomSource> Session<R> {
    pub fn new(config: GameConfig, rng: R) -> Self {
        Self {
            phase: SessionPhase::Menu,
            clock: GameClock::new(config.session.duration),
            ship: Ship::new(config.ship),
            asteroids: AsteroidField::new(config.asteroids.clone()),
            rescues: RescueField::new(config.rescue.clone()),
            storms: StormField::new(config.storms.clone()),
            boost: Boost::new(config.boost),
            shockwave: ShockwaveSystem::new(config.shockwave),
            rng,
            tick: 0,
            rescued: 0,
            asteroid_hits: 0,
            in_storm: false,
            events: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn ship(&self) -> &Ship {
        &self.ship
    }

    pub fn ship_mut(&mut self) -> &mut Ship {
        &mut self.ship
    }

    pub fn asteroids(&self) -> &AsteroidField {
        &self.asteroids
    }

    pub fn asteroids_mut(&mut self) -> &mut AsteroidField {
        &mut self.asteroids
    }

    pub fn rescues(&self) -> &RescueField {
        &self.rescues
    }

    pub fn rescues_mut(&mut self) -> &mut RescueField {
        &mut self.rescues
    }

    pub fn storms(&self) -> &StormField {
        &self.storms
    }

    pub fn storms_mut(&mut self) -> &mut StormField {
        &mut self.storms
    }

    pub fn boost(&self) -> &Boost {
        &self.boost
    }

    pub fn shockwave(&self) -> &ShockwaveSystem {
        &self.shockwave
    }

    pub fn rescued(&self) -> u32 {
        self.rescued
    }

    pub fn asteroid_hits(&self) -> u32 {
        self.asteroid_hits
    }

    pub fn is_in_storm(&self) -> bool {
        self.in_storm
    }

    pub fn score(&self) -> u32 {
        self.rescued * self.config.session.score_per_rescue
    }

    /// Install the rescue model. Rescue targets only spawn once one is set.
    pub fn set_rescue_template(&mut self, template: ModelTemplate) {
        self.rescues.set_template(template);
    }

    pub fn load_rescue_template(
        &mut self,
        loader: &mut impl TemplateLoader,
        path: &Path,
    ) -> Result<(), AssetError> {
        let template = loader.load_template(path)?;
        self.rescues.set_template(template);
        Ok(())
    }

    /// Leave the menu. Does nothing once running or finished.
    pub fn start(&mut self) {
        if self.phase != SessionPhase::Menu {
            return;
        }
        self.phase = SessionPhase::Running;
        self.clock.start();
        self.events.push(SessionEvent::Started);
        tracing::info!(budget = self.clock.duration(), "session started");
    }

    /// Back to the menu with a fresh world. The rescue template survives, and
    /// entity ids keep counting so none is reused. Pending scene events are
    /// dropped; hosts clear their visuals alongside.
    pub fn reset(&mut self) {
        self.phase = SessionPhase::Menu;
        self.clock = GameClock::new(self.config.session.duration);
        self.ship = Ship::new(self.config.ship);
        self.asteroids.clear();
        self.rescues.clear();
        self.storms.clear();
        self.boost = Boost::new(self.config.boost);
        self.shockwave = ShockwaveSystem::new(self.config.shockwave);
        self.tick = 0;
        self.rescued = 0;
        self.asteroid_hits = 0;
        self.in_storm = false;
        self.events.clear();
        tracing::info!("session reset");
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    /// Spawns and despawns from every streamed population since the last
    /// call, for whoever keeps the visuals in sync.
    pub fn drain_scene_events(&mut self) -> Vec<StreamEvent> {
        let mut events = self.asteroids.drain_events();
        events.extend(self.rescues.drain_events());
        events.extend(self.storms.drain_events());
        events
    }

    /// Step the whole game by `dt` seconds. Only acts while running.
    ///
    /// Each tick appends to two logs: gameplay events (`drain_events`) and
    /// scene membership changes (`drain_scene_events`). Hosts drain both,
    /// usually once per frame. The scene log stays bounded by the live
    /// population even when not drained, since a pending spawn is cancelled
    /// by its despawn; the gameplay log grows with rescues, hits and other
    /// discrete events until drained.
    pub fn tick(&mut self, controls: &ControlState, dt: f32) {
        if self.phase != SessionPhase::Running {
            return;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.tick += 1;
        let _span = tracing::info_span!("session_tick", tick = self.tick).entered();

        self.clock.advance(f64::from(dt));
        let now = self.clock.elapsed();

        let position = self.ship.position();
        self.storms.advance(position, dt, now, &mut self.rng);
        let inside = self.storms.is_player_inside(position);
        if inside != self.in_storm {
            self.in_storm = inside;
            self.events.push(if inside {
                SessionEvent::EnteredStorm
            } else {
                SessionEvent::LeftStorm
            });
        }

        if self.boost.tick(controls.boost, dt) {
            self.events.push(SessionEvent::BoostExhausted);
        }

        let multiplier = self.boost.speed_multiplier() * self.storms.speed_multiplier_at(position);
        self.ship.update(controls, multiplier, dt);

        let position = self.ship.position();
        let direction = self.ship.forward();
        self.asteroids.advance(position, direction, dt, &mut self.rng);
        self.rescues
            .advance(position, direction, dt, now, &mut self.rng);

        if controls.shockwave && self.shockwave.trigger(position, now) {
            self.events.push(SessionEvent::ShockwaveFired { origin: position });
        }
        self.shockwave
            .update(dt, &mut self.asteroids, &mut self.rng);

        self.collect_rescues(position);
        self.resolve_asteroid_hits(position);

        if self.clock.is_expired() {
            self.phase = SessionPhase::TimeUp;
            self.clock.stop();
            let score = self.score();
            self.events.push(SessionEvent::TimeUp {
                rescued: self.rescued,
                score,
            });
            tracing::info!(rescued = self.rescued, score, ticks = self.tick, "time up");
        }
    }

    fn collect_rescues(&mut self, position: Vec3) {
        let radius = self.config.collision.rescue;
        let hits: Vec<EntityId> = find_collisions(position, self.rescues.targets(), radius)
            .into_iter()
            .map(|t| t.id)
            .collect();

        for id in hits {
            if !self.rescues.begin_collect(id, position) {
                continue;
            }
            self.rescued += 1;
            self.clock.add_time(self.config.session.rescue_bonus);
            self.events.push(SessionEvent::Rescued {
                id,
                total: self.rescued,
            });
            tracing::debug!(%id, total = self.rescued, "rescued");
        }
    }

    fn resolve_asteroid_hits(&mut self, position: Vec3) {
        let radius = self.config.collision.asteroid;
        let hits: Vec<EntityId> = find_collisions(position, self.asteroids.asteroids(), radius)
            .into_iter()
            .map(|a| a.id)
            .collect();

        for id in hits {
            if self.asteroids.remove(id).is_none() {
                continue;
            }
            self.asteroid_hits += 1;
            self.events.push(SessionEvent::AsteroidHit {
                id,
                total: self.asteroid_hits,
            });
            tracing::debug!(%id, total = self.asteroid_hits, "asteroid hit");
        }
    }

    /// Deterministic digest of the simulated state, for replay comparison.
    ///
    /// Entity ids are random and left out; positions and counters are hashed
    /// in population order.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        let mix_vec = |h: &mut u64, v: Vec3| {
            for c in v.to_array() {
                mix(h, &c.to_le_bytes());
            }
        };

        mix(&mut h, &self.tick.to_le_bytes());
        mix(&mut h, &self.rescued.to_le_bytes());
        mix(&mut h, &self.asteroid_hits.to_le_bytes());
        mix(&mut h, &self.clock.elapsed().to_le_bytes());
        mix_vec(&mut h, self.ship.position());
        for asteroid in self.asteroids.asteroids() {
            mix(&mut h, asteroid.id.0.as_bytes());
            mix_vec(&mut h, asteroid.position);
        }
        for target in self.rescues.targets() {
            mix(&mut h, target.id.0.as_bytes());
            mix_vec(&mut h, target.position);
        }
        for storm in self.storms.storms() {
            mix(&mut h, storm.id.0.as_bytes());
            mix_vec(&mut h, storm.center);
        }
        h
    }
}
