//! Frame clock and profiling stopwatch

use std::time::{Duration, Instant};

/// Measures the time between successive frames of the update loop
#[derive(Debug)]
pub struct FrameClock {
    last_tick: Instant,
    delta: Duration,
    total: Duration,
    frames: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Create a clock whose first delta is measured from now
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            delta: Duration::ZERO,
            total: Duration::ZERO,
            frames: 0,
        }
    }

    /// Advance the clock by one frame and return the elapsed frame time
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        self.delta = now.duration_since(self.last_tick);
        self.total += self.delta;
        self.last_tick = now;
        self.frames += 1;
        self.delta
    }

    /// Duration of the last frame
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Accumulated time over every tick
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Number of ticks so far
    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

/// Accumulating stopwatch, used to profile domain system updates
#[derive(Debug, Default)]
pub struct Stopwatch {
    started: Option<Instant>,
    accumulated: Duration,
    laps: u64,
}

impl Stopwatch {
    /// Create a stopped stopwatch
    pub fn new() -> Self {
        Self::default()
    }

    /// Start measuring; a running stopwatch keeps its original start
    pub fn start(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    /// Stop measuring and fold the lap into the accumulated time
    pub fn stop(&mut self) {
        if let Some(start) = self.started.take() {
            self.accumulated += start.elapsed();
            self.laps += 1;
        }
    }

    /// Reset to zero
    pub fn reset(&mut self) {
        self.started = None;
        self.accumulated = Duration::ZERO;
        self.laps = 0;
    }

    /// Total measured time, including a lap in progress
    pub fn elapsed(&self) -> Duration {
        self.accumulated + self.started.map_or(Duration::ZERO, |s| s.elapsed())
    }

    /// Number of completed start/stop laps
    pub fn laps(&self) -> u64 {
        self.laps
    }

    /// Mean duration of a completed lap
    pub fn average_lap(&self) -> Duration {
        u32::try_from(self.laps)
            .ok()
            .filter(|laps| *laps > 0)
            .map_or(Duration::ZERO, |laps| self.accumulated / laps)
    }

    /// Check if the stopwatch is currently running
    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }
}
