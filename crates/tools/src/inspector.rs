use std::fmt;

use glam::Vec3;

use driftfield_common::{EntityId, EntityKind, RandomSource};
use driftfield_kernel::{Session, SessionPhase};

/// Read-only queries over a running session.
pub struct SessionInspector;

impl SessionInspector {
    pub fn summary<R: RandomSource>(session: &Session<R>) -> SessionSummary {
        let boost = session.boost();
        SessionSummary {
            tick: session.tick_count(),
            phase: session.phase(),
            remaining: session.clock().remaining_whole_seconds(),
            ship_position: session.ship().position(),
            ship_speed: session.ship().speed(),
            asteroids: session.asteroids().len(),
            rescue_targets: session.rescues().active().count(),
            storms: session.storms().len(),
            in_storm: session.is_in_storm(),
            boost_energy: boost.energy_fraction(),
            boost_locked: boost.is_locked_out(),
            shockwaves: session.shockwave().active_count(),
            rescued: session.rescued(),
            asteroid_hits: session.asteroid_hits(),
            score: session.score(),
        }
    }

    /// Look an entity up in whichever population holds it.
    pub fn inspect_entity<R: RandomSource>(
        session: &Session<R>,
        id: EntityId,
    ) -> Option<EntityInfo> {
        let player = session.ship().position();
        let info = |kind, position: Vec3, scale| EntityInfo {
            id,
            kind,
            position,
            scale,
            distance: position.distance(player),
        };

        if let Some(a) = session.asteroids().get(id) {
            return Some(info(EntityKind::Asteroid, a.position, a.scale));
        }
        if let Some(t) = session.rescues().get(id) {
            return Some(info(EntityKind::RescueTarget, t.position, t.scale));
        }
        session
            .storms()
            .storms()
            .iter()
            .find(|s| s.id == id)
            .map(|s| info(EntityKind::Storm, s.center, s.radius))
    }

    /// Closest rescue target still up for grabs.
    pub fn nearest_rescue<R: RandomSource>(session: &Session<R>) -> Option<EntityInfo> {
        let player = session.ship().position();
        session
            .rescues()
            .active()
            .min_by(|a, b| {
                a.position
                    .distance_squared(player)
                    .total_cmp(&b.position.distance_squared(player))
            })
            .and_then(|t| Self::inspect_entity(session, t.id))
    }
}

/// Snapshot of the counters a developer watches.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub tick: u64,
    pub phase: SessionPhase,
    pub remaining: u32,
    pub ship_position: Vec3,
    pub ship_speed: f32,
    pub asteroids: usize,
    pub rescue_targets: usize,
    pub storms: usize,
    pub in_storm: bool,
    pub boost_energy: f32,
    pub boost_locked: bool,
    pub shockwaves: usize,
    pub rescued: u32,
    pub asteroid_hits: u32,
    pub score: u32,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.ship_position;
        write!(
            f,
            "Session: tick={} phase={:?} time={}s ship=({:.0}, {:.0}, {:.0}) asteroids={} \
             rescue_targets={} storms={}{} boost={:.0}%{} shockwaves={} rescued={} hits={} score={}",
            self.tick,
            self.phase,
            self.remaining,
            p.x,
            p.y,
            p.z,
            self.asteroids,
            self.rescue_targets,
            self.storms,
            if self.in_storm { " (inside)" } else { "" },
            self.boost_energy * 100.0,
            if self.boost_locked { " locked" } else { "" },
            self.shockwaves,
            self.rescued,
            self.asteroid_hits,
            self.score,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityInfo {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec3,
    pub scale: f32,
    /// Distance from the ship.
    pub distance: f32,
}

impl fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] pos=({:.2}, {:.2}, {:.2}) scale={:.2} distance={:.1}",
            self.kind,
            self.id,
            self.position.x,
            self.position.y,
            self.position.z,
            self.scale,
            self.distance,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftfield_assets::ModelTemplate;
    use driftfield_input::ControlState;
    use driftfield_kernel::GameConfig;
    use driftfield_stream::{RescueTarget, Storm};

    fn running() -> Session {
        let mut session = Session::with_seed(GameConfig::default(), 7);
        session.set_rescue_template(ModelTemplate::placeholder("astronaut", None));
        session.start();
        session
    }

    #[test]
    fn summary_before_first_tick() {
        let session = Session::with_seed(GameConfig::default(), 1);
        let summary = SessionInspector::summary(&session);
        assert_eq!(summary.tick, 0);
        assert_eq!(summary.phase, SessionPhase::Menu);
        assert_eq!(summary.asteroids, 0);
        assert_eq!(summary.remaining, 62);
        assert_eq!(summary.boost_energy, 1.0);
    }

    #[test]
    fn summary_tracks_the_run() {
        let mut session = running();
        for _ in 0..10 {
            session.tick(&ControlState::default(), 0.1);
        }
        let summary = SessionInspector::summary(&session);
        assert_eq!(summary.tick, 10);
        assert_eq!(summary.phase, SessionPhase::Running);
        // refilled to the cap each tick, minus anything hit on the last one
        assert!(summary.asteroids > 590 && summary.asteroids <= 600);
        assert!((summary.ship_speed - 6.0).abs() < 1e-3);
    }

    #[test]
    fn summary_display() {
        let summary = SessionInspector::summary(&running());
        let text = summary.to_string();
        assert!(text.contains("tick=0"));
        assert!(text.contains("boost=100%"));
    }

    #[test]
    fn inspect_finds_each_population() {
        let mut session = running();
        session.tick(&ControlState::default(), 0.1);

        let asteroid = session.asteroids().asteroids()[0].id;
        let info = SessionInspector::inspect_entity(&session, asteroid).unwrap();
        assert_eq!(info.kind, EntityKind::Asteroid);

        let storm = Storm::new(Vec3::new(0.0, 0.0, 100.0), 50.0, 0.0);
        let storm_id = storm.id;
        session.storms_mut().insert(storm);
        let info = SessionInspector::inspect_entity(&session, storm_id).unwrap();
        assert_eq!(info.kind, EntityKind::Storm);
        assert_eq!(info.scale, 50.0);

        assert!(SessionInspector::inspect_entity(&session, EntityId::new()).is_none());
    }

    #[test]
    fn nearest_rescue_picks_the_closest() {
        let mut session = running();
        let far = RescueTarget::placed(Vec3::new(0.0, 0.0, 400.0), 0.0);
        let near = RescueTarget::placed(Vec3::new(0.0, 0.0, 100.0), 0.0);
        let near_id = near.id;
        session.rescues_mut().insert(far);
        session.rescues_mut().insert(near);

        let info = SessionInspector::nearest_rescue(&session).unwrap();
        assert_eq!(info.id, near_id);
        assert_eq!(info.distance, 100.0);
    }
}
