//! Time management utilities

use std::time::{Duration, Instant};

/// Per-frame timing snapshot handed to every system update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Seconds covered by this frame's step
    pub delta: f32,
    /// Seconds accumulated over all previous frames plus this one
    pub total: f64,
    /// Index of this frame, starting at 0
    pub frame: u64,
}

impl FrameTime {
    /// Snapshot for a single step of `delta` seconds at frame 0
    pub fn from_delta(delta: f32) -> Self {
        Self {
            delta,
            total: f64::from(delta),
            frame: 0,
        }
    }

    /// The snapshot that follows this one after another step of `delta` seconds
    #[must_use]
    pub fn advance(&self, delta: f32) -> Self {
        Self {
            delta,
            total: self.total + f64::from(delta),
            frame: self.frame + 1,
        }
    }
}

impl Default for FrameTime {
    fn default() -> Self {
        Self {
            delta: 0.0,
            total: 0.0,
            frame: 0,
        }
    }
}

/// Wall-clock frame timer producing [`FrameTime`] snapshots
pub struct FrameClock {
    last_frame: Instant,
    current: Option<FrameTime>,
    max_delta: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Create a new clock; steps longer than a quarter second are clamped
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            current: None,
            max_delta: 0.25,
        }
    }

    /// Override the largest delta a single frame may report
    #[must_use]
    pub fn with_max_delta(mut self, max_delta: f32) -> Self {
        self.max_delta = max_delta.max(0.0);
        self
    }

    /// Sample the clock (should be called once per frame)
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let delta = now
            .duration_since(self.last_frame)
            .as_secs_f32()
            .min(self.max_delta);
        self.last_frame = now;

        let next = match self.current {
            Some(previous) => previous.advance(delta),
            None => FrameTime::from_delta(delta),
        };
        self.current = Some(next);
        next
    }

    /// Number of frames ticked so far
    pub fn frame_count(&self) -> u64 {
        self.current.map_or(0, |time| time.frame + 1)
    }
}

/// Simple stopwatch for measuring elapsed time
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed += start.elapsed();
            self.start_time = None;
        }
    }

    /// Reset the stopwatch to zero
    pub fn reset(&mut self) {
        self.start_time = None;
        self.elapsed = Duration::ZERO;
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let current_elapsed = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + current_elapsed
    }

    /// Check if the stopwatch is currently running
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}
