//! Where the agent's event timestamps come from

use checkr_monitor::Time;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Source of the timestamps passed to `post_and_run`.
///
/// Agents that share an evaluator must share one source too, otherwise the
/// later agent's clock starts behind the evaluator's.
pub trait TimeSource: Send + Sync {
    /// Seconds since the source was created. Never decreases.
    fn now(&self) -> Time;
}

/// Real elapsed time.
pub struct WallClock {
    start: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for WallClock {
    fn now(&self) -> Time {
        self.start.elapsed().as_secs_f64()
    }
}

/// Advances a fixed step on every reading, so a recorded trace replays with
/// identical timestamps.
pub struct StepClock {
    step: Time,
    ticks: Mutex<u64>,
}

impl StepClock {
    pub fn new(step: Time) -> Self {
        Self {
            step: step.max(0.0),
            ticks: Mutex::new(0),
        }
    }
}

impl TimeSource for StepClock {
    fn now(&self) -> Time {
        let mut ticks = self.ticks.lock();
        *ticks += 1;
        *ticks as Time * self.step
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockMode {
    #[default]
    Wall,
    Step,
}

impl ClockMode {
    pub fn build(self, step: Time) -> Arc<dyn TimeSource> {
        match self {
            ClockMode::Wall => Arc::new(WallClock::new()),
            ClockMode::Step => Arc::new(StepClock::new(step)),
        }
    }
}
