//! Time sources for the animation loop.
//!
//! The driver never reads `Instant` directly; it samples a [`Clock`] so tests can
//! step time by hand.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time source measured from an arbitrary fixed origin
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall clock backed by `Instant`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-stepped clock; clones share the same time
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get() + delta);
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Elapsed animation time, reset once at startup
#[derive(Debug, Clone, Default)]
pub struct AnimationClock {
    start: Option<Duration>,
    elapsed_s: f32,
}

impl AnimationClock {
    /// Restart from zero at `now`
    pub fn reset(&mut self, now: Duration) {
        self.start = Some(now);
        self.elapsed_s = 0.0;
    }

    /// Record the time of the current frame and return elapsed seconds.
    ///
    /// Never decreases, even if the clock source steps backwards.
    pub fn sample(&mut self, now: Duration) -> f32 {
        let start = *self.start.get_or_insert(now);
        let elapsed = now.saturating_sub(start).as_secs_f32();
        self.elapsed_s = self.elapsed_s.max(elapsed);
        self.elapsed_s
    }

    /// Elapsed seconds at `now` without recording it
    pub fn elapsed_at(&self, now: Duration) -> f32 {
        match self.start {
            Some(start) => now.saturating_sub(start).as_secs_f32().max(self.elapsed_s),
            None => self.elapsed_s,
        }
    }

    pub fn elapsed_s(&self) -> f32 {
        self.elapsed_s
    }
}
