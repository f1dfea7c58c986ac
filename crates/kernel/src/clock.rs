/// Countdown for a run, driven by accumulated frame deltas.
///
/// Nothing here reads the wall clock: if ticks stop, time stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameClock {
    initial: f64,
    duration: f64,
    elapsed: f64,
    running: bool,
}

impl GameClock {
    pub const DEFAULT_DURATION: f64 = 62.0;

    pub fn new(duration: f64) -> Self {
        let duration = duration.max(0.0);
        Self {
            initial: duration,
            duration,
            elapsed: 0.0,
            running: false,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Back to the initial budget, stopped.
    pub fn reset(&mut self) {
        *self = Self::new(self.initial);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Accumulate `dt` seconds while running. Negative deltas are ignored.
    pub fn advance(&mut self, dt: f64) {
        if self.running && dt > 0.0 {
            self.elapsed += dt;
        }
    }

    /// Extend the budget, e.g. as a pickup reward.
    pub fn add_time(&mut self, seconds: f64) {
        if seconds > 0.0 {
            self.duration += seconds;
        }
    }

    /// Seconds since start, across every running tick.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Current budget including any added time.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn remaining(&self) -> f64 {
        (self.duration - self.elapsed).max(0.0)
    }

    /// Whole seconds left, floored, as a HUD would show them.
    pub fn remaining_whole_seconds(&self) -> u32 {
        self.remaining().floor() as u32
    }

    pub fn is_expired(&self) -> bool {
        self.remaining() <= 0.0
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_clock_does_not_advance() {
        let mut clock = GameClock::default();
        clock.advance(5.0);
        assert_eq!(clock.elapsed(), 0.0);
        assert_eq!(clock.remaining(), 62.0);
    }

    #[test]
    fn counts_down_while_running() {
        let mut clock = GameClock::default();
        clock.start();
        clock.advance(2.5);
        assert_eq!(clock.remaining(), 59.5);
        assert_eq!(clock.remaining_whole_seconds(), 59);
        clock.advance(-1.0);
        assert_eq!(clock.elapsed(), 2.5);
    }

    #[test]
    fn add_time_extends_the_budget() {
        let mut clock = GameClock::new(10.0);
        clock.start();
        clock.advance(9.0);
        clock.add_time(3.0);
        assert_eq!(clock.remaining(), 4.0);
        clock.add_time(-5.0);
        assert_eq!(clock.duration(), 13.0);
    }

    #[test]
    fn expires_and_clamps_at_zero() {
        let mut clock = GameClock::new(1.0);
        clock.start();
        clock.advance(0.5);
        assert!(!clock.is_expired());
        clock.advance(2.0);
        assert!(clock.is_expired());
        assert_eq!(clock.remaining(), 0.0);
        assert_eq!(clock.remaining_whole_seconds(), 0);
    }

    #[test]
    fn reset_restores_initial_budget() {
        let mut clock = GameClock::new(20.0);
        clock.start();
        clock.advance(4.0);
        clock.add_time(3.0);
        clock.reset();
        assert!(!clock.is_running());
        assert_eq!(clock.duration(), 20.0);
        assert_eq!(clock.elapsed(), 0.0);
    }
}
