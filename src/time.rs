//! Monotonic clock driving the simulation.
//!
//! Each [`Clock::tick`] yields `(elapsed, delta)` in seconds. Time spent
//! paused is excluded from `elapsed`, and the first tick after a resume
//! reports only the time since the resume.
//!
//! ```ignore
//! use flowcloud::time::Clock;
//!
//! let mut clock = Clock::new();
//! loop {
//!     let (elapsed, delta) = clock.tick();
//!     cloud.tick(elapsed, delta);
//! }
//! ```

use std::time::{Duration, Instant};

/// Time source for [`PointCloud::tick`](crate::cloud::PointCloud::tick).
#[derive(Debug)]
pub struct Clock {
    start: Instant,
    last_tick: Instant,
    /// Total time spent paused.
    paused_for: Duration,
    /// Set while paused: when the pause began.
    paused_at: Option<Instant>,
    elapsed: f64,
    delta: f64,
    ticks: u64,
}

impl Clock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            start: now,
            last_tick: now,
            paused_for: Duration::ZERO,
            paused_at: None,
            elapsed: 0.0,
            delta: 0.0,
            ticks: 0,
        }
    }

    /// Sample the clock. Returns `(elapsed, delta)` in seconds.
    ///
    /// While paused, `elapsed` holds still and `delta` is 0.
    pub fn tick(&mut self) -> (f64, f64) {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> (f64, f64) {
        if self.paused_at.is_some() {
            self.delta = 0.0;
            return (self.elapsed, self.delta);
        }

        self.delta = now.saturating_duration_since(self.last_tick).as_secs_f64();
        self.last_tick = now;
        self.elapsed = now
            .saturating_duration_since(self.start)
            .saturating_sub(self.paused_for)
            .as_secs_f64();
        self.ticks += 1;

        (self.elapsed, self.delta)
    }

    /// Elapsed seconds as of the last tick.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Seconds between the last two ticks.
    #[inline]
    pub fn delta(&self) -> f64 {
        self.delta
    }

    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(Instant::now());
        }
    }

    pub fn resume(&mut self) {
        self.resume_at(Instant::now());
    }

    fn resume_at(&mut self, now: Instant) {
        if let Some(since) = self.paused_at.take() {
            self.paused_for += now.saturating_duration_since(since);
            self.last_tick = now;
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
