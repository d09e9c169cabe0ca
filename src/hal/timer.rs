//! Timer Abstractions
//!
//! Uptime, stopwatches and polling timeouts on top of `embassy-time`.

use embassy_time::{Duration, Instant, Timer};

use crate::types::Millis;

/// Milliseconds since boot
#[must_use]
pub fn uptime_ms() -> Millis {
    Instant::now().as_millis()
}

/// Stopwatch for timing measurements
#[derive(Clone, Copy, Debug)]
pub struct Stopwatch {
    start: Option<Instant>,
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    #[must_use]
    pub const fn new() -> Self {
        Self { start: None }
    }

    /// Create a stopwatch that is already running
    #[must_use]
    pub fn started() -> Self {
        Self {
            start: Some(Instant::now()),
        }
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start = Some(Instant::now());
    }

    /// Get elapsed time (returns zero if not started)
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start
            .map_or(Duration::from_ticks(0), |s| Instant::now() - s)
    }

    /// Get elapsed time in milliseconds
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis()
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl defmt::Format for Stopwatch {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Stopwatch({}ms)", self.elapsed_ms());
    }
}

/// Deadline for polling a device flag
pub struct Timeout {
    deadline: Instant,
}

impl Timeout {
    /// Create a new timeout from duration
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            deadline: Instant::now() + duration,
        }
    }

    /// Create a timeout from milliseconds
    #[must_use]
    pub fn from_ms(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Check if timeout has expired
    #[must_use]
    pub fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Yield briefly between polls
    pub async fn pause(&self) {
        Timer::after(Duration::from_micros(50)).await;
    }
}
