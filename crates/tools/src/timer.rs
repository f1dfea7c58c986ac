use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

/// Rolling window of recent tick durations.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    window: VecDeque<Duration>,
    capacity: usize,
    total: u64,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            total: 0,
        }
    }

    /// Add a sample, evicting the oldest once the window is full.
    pub fn record(&mut self, elapsed: Duration) {
        if self.capacity == 0 {
            return;
        }
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(elapsed);
        self.total += 1;
    }

    /// Samples currently in the window.
    pub fn count(&self) -> usize {
        self.window.len()
    }

    /// Samples ever recorded.
    pub fn total_recorded(&self) -> u64 {
        self.total
    }

    pub fn average(&self) -> Duration {
        if self.window.is_empty() {
            return Duration::ZERO;
        }
        self.window.iter().sum::<Duration>() / self.window.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.window.iter().copied().max().unwrap_or(Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.window.iter().copied().min().unwrap_or(Duration::ZERO)
    }

    /// Samples slower than `budget`, e.g. one 60 Hz frame.
    pub fn over_budget(&self, budget: Duration) -> usize {
        self.window.iter().filter(|d| **d > budget).count()
    }

    pub fn summary(&self) -> TimingSummary {
        TimingSummary {
            samples: self.count(),
            average: self.average(),
            min: self.min(),
            max: self.max(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingSummary {
    pub samples: usize,
    pub average: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl fmt::Display for TimingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks: avg {:?}, min {:?}, max {:?}",
            self.samples, self.average, self.min, self.max
        )
    }
}
