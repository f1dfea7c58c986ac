use serde::{Deserialize, Serialize};

/// Boost tuning. Times are seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostConfig {
    /// Total seconds of boost a full tank holds.
    pub duration: f32,
    /// Seconds of energy regained per second while recharging.
    pub recharge_rate: f32,
    /// Minimum wait after running dry before boost can re-engage.
    pub lockout_duration: f32,
    /// Ship speed factor while boosting.
    pub speed_multiplier: f32,
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            duration: 5.0,
            recharge_rate: 1.0,
            lockout_duration: 1.0,
            speed_multiplier: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoostPhase {
    Ready,
    Active,
    Recharging,
}

/// Depletable, rechargeable boost with a lockout after exhaustion.
///
/// The lockout and the recharge run side by side: energy refills during the
/// lockout, but activation stays refused until the lockout timer hits zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Boost {
    config: BoostConfig,
    phase: BoostPhase,
    time_used: f32,
    locked_out: bool,
    lockout_timer: f32,
}

impl Boost {
    pub fn new(config: BoostConfig) -> Self {
        Self {
            config,
            phase: BoostPhase::Ready,
            time_used: 0.0,
            locked_out: false,
            lockout_timer: 0.0,
        }
    }

    pub fn config(&self) -> &BoostConfig {
        &self.config
    }

    pub fn phase(&self) -> BoostPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == BoostPhase::Active
    }

    pub fn is_locked_out(&self) -> bool {
        self.locked_out
    }

    pub fn lockout_remaining(&self) -> f32 {
        self.lockout_timer
    }

    /// Seconds of boost consumed, in `[0, duration]`.
    pub fn time_used(&self) -> f32 {
        self.time_used
    }

    pub fn time_remaining(&self) -> f32 {
        (self.config.duration - self.time_used).max(0.0)
    }

    /// Remaining energy as a fraction of a full tank, for display.
    pub fn energy_fraction(&self) -> f32 {
        if self.config.duration <= 0.0 {
            return 0.0;
        }
        (self.config.duration - self.time_used) / self.config.duration
    }

    pub fn speed_multiplier(&self) -> f32 {
        if self.is_active() {
            self.config.speed_multiplier
        } else {
            1.0
        }
    }

    /// Advance one frame with the boost key `held` or not.
    ///
    /// Returns true on the frame the tank runs dry.
    pub fn tick(&mut self, held: bool, dt: f32) -> bool {
        if self.locked_out {
            self.lockout_timer -= dt;
            if self.lockout_timer <= 0.0 {
                self.locked_out = false;
                self.lockout_timer = 0.0;
            }
        }

        let duration = self.config.duration;
        let mut exhausted = false;

        match self.phase {
            BoostPhase::Ready => {
                if held && self.time_used < duration {
                    self.phase = BoostPhase::Active;
                }
            }
            BoostPhase::Active => {
                if held && self.time_used < duration {
                    self.time_used = (self.time_used + dt).clamp(0.0, duration);
                    if self.time_used >= duration {
                        self.phase = BoostPhase::Recharging;
                        self.locked_out = true;
                        self.lockout_timer = self.config.lockout_duration;
                        exhausted = true;
                        tracing::debug!("boost exhausted, locked out");
                    }
                } else {
                    self.phase = BoostPhase::Recharging;
                }
            }
            BoostPhase::Recharging => {
                if self.time_used > 0.0 {
                    self.time_used =
                        (self.time_used - self.config.recharge_rate * dt).clamp(0.0, duration);
                }
                if held && self.time_used < duration && !self.locked_out {
                    self.phase = BoostPhase::Active;
                }
                if self.time_used <= 0.0 {
                    self.phase = BoostPhase::Ready;
                    self.time_used = 0.0;
                }
            }
        }

        exhausted
    }
}

impl Default for Boost {
    fn default() -> Self {
        Self::new(BoostConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftfield_common::{RandomSource, SeededRandom};

    const DT: f32 = 0.25;

    /// Press and hold until the tank runs dry. Returns the number of ticks.
    fn exhaust(boost: &mut Boost) -> usize {
        let mut ticks = 0;
        while !boost.tick(true, DT) {
            ticks += 1;
            assert!(ticks < 1000, "boost never ran out");
        }
        ticks + 1
    }

    #[test]
    fn starts_ready_and_full() {
        let boost = Boost::default();
        assert_eq!(boost.phase(), BoostPhase::Ready);
        assert!(!boost.is_active());
        assert_eq!(boost.energy_fraction(), 1.0);
        assert_eq!(boost.speed_multiplier(), 1.0);
    }

    #[test]
    fn press_activates_without_consuming() {
        let mut boost = Boost::default();
        boost.tick(true, DT);
        assert!(boost.is_active());
        assert_eq!(boost.time_used(), 0.0);
        assert_eq!(boost.speed_multiplier(), 3.0);
    }

    #[test]
    fn idle_when_not_held() {
        let mut boost = Boost::default();
        for _ in 0..10 {
            boost.tick(false, DT);
        }
        assert_eq!(boost.phase(), BoostPhase::Ready);
    }

    #[test]
    fn time_used_grows_by_dt_while_active() {
        let mut boost = Boost::default();
        boost.tick(true, DT);
        let mut previous = boost.time_used();
        while boost.is_active() && boost.time_used() < 5.0 {
            boost.tick(true, DT);
            if boost.is_active() {
                assert_eq!(boost.time_used(), previous + DT);
            }
            assert!(boost.time_used() > previous);
            previous = boost.time_used();
        }
    }

    #[test]
    fn exhaustion_deactivates_on_same_tick_and_locks_out() {
        let mut boost = Boost::default();
        let ticks = exhaust(&mut boost);
        // one activation tick plus 5.0 / 0.25 consuming ticks
        assert_eq!(ticks, 21);
        assert_eq!(boost.time_used(), 5.0);
        assert!(!boost.is_active());
        assert!(boost.is_locked_out());
        assert_eq!(boost.phase(), BoostPhase::Recharging);
        assert_eq!(boost.energy_fraction(), 0.0);
    }

    #[test]
    fn lockout_refuses_reactivation_while_energy_refills() {
        let mut boost = Boost::default();
        exhaust(&mut boost);

        for _ in 0..3 {
            boost.tick(true, DT);
            assert!(!boost.is_active());
        }
        assert!(boost.time_used() < 5.0, "energy refilled during lockout");
        assert!(boost.is_locked_out());

        // Fourth tick clears the one-second lockout.
        boost.tick(true, DT);
        assert!(!boost.is_locked_out());
        assert!(boost.is_active());
    }

    #[test]
    fn release_before_exhaustion_recharges_without_lockout() {
        let mut boost = Boost::default();
        for _ in 0..5 {
            boost.tick(true, DT);
        }
        assert_eq!(boost.time_used(), 1.0);

        boost.tick(false, DT);
        assert_eq!(boost.phase(), BoostPhase::Recharging);
        assert!(!boost.is_locked_out());

        boost.tick(true, DT);
        assert!(boost.is_active());
    }

    #[test]
    fn exhaustion_and_full_recovery() {
        let mut boost = Boost::new(BoostConfig {
            duration: 5.0,
            recharge_rate: 1.0,
            ..BoostConfig::default()
        });
        exhaust(&mut boost);

        // 5 seconds of energy at 1 second per second.
        for _ in 0..20 {
            boost.tick(false, DT);
        }
        assert_eq!(boost.time_used(), 0.0);
        assert_eq!(boost.phase(), BoostPhase::Ready);
        assert_eq!(boost.energy_fraction(), 1.0);
    }

    #[test]
    fn faster_recharge_rate_recovers_sooner() {
        let mut boost = Boost::new(BoostConfig {
            recharge_rate: 2.0,
            ..BoostConfig::default()
        });
        exhaust(&mut boost);
        for _ in 0..10 {
            boost.tick(false, DT);
        }
        assert_eq!(boost.phase(), BoostPhase::Ready);
    }

    #[test]
    fn time_used_stays_clamped_under_arbitrary_input() {
        let mut rng = SeededRandom::with_seed(1234);
        let mut boost = Boost::default();
        for _ in 0..20_000 {
            let held = rng.next_f32() < 0.6;
            let dt = rng.range(0.0, 0.5);
            boost.tick(held, dt);
            assert!(boost.time_used() >= 0.0);
            assert!(boost.time_used() <= boost.config().duration);
            assert_eq!(boost.is_active(), boost.phase() == BoostPhase::Active);
            let fraction = boost.energy_fraction();
            assert!((0.0..=1.0).contains(&fraction));
        }
    }
}
