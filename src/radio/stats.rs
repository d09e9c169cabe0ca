//! Windowed RSSI Statistics
//!
//! Accumulates per-frame RSSI over a fixed window and produces the summary
//! printed as an `AVG` serial line. Uses Welford's update so the running
//! variance stays stable in `f32`.

#[cfg(feature = "embedded")]
use micromath::F32Ext;

use crate::types::{Millis, Rssi};

/// Summary of one window
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AvgReport {
    /// Uptime when the window closed
    pub at_ms: Millis,
    /// Window length actually covered
    pub duration_ms: Millis,
    /// Number of samples
    pub count: u32,
    /// `None` when no samples were taken
    pub summary: Option<RssiSummary>,
}

/// Sample statistics, present only when `count > 0`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RssiSummary {
    /// Mean in dBm
    pub mean: f32,
    /// Population standard deviation in dB
    pub std_dev: f32,
    /// Weakest sample
    pub min: Rssi,
    /// Strongest sample
    pub max: Rssi,
}

/// Running statistics over a time window
#[derive(Clone, Copy, Debug)]
pub struct RssiWindow {
    window_ms: Millis,
    started_ms: Millis,
    count: u32,
    mean: f32,
    m2: f32,
    min: Rssi,
    max: Rssi,
}

impl RssiWindow {
    /// Start an empty window at `now`
    #[must_use]
    pub const fn new(window_ms: Millis, now: Millis) -> Self {
        Self {
            window_ms,
            started_ms: now,
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: Rssi::from_dbm(i16::MAX),
            max: Rssi::from_dbm(i16::MIN),
        }
    }

    /// Record one sample
    pub fn record(&mut self, rssi: Rssi) {
        let x = f32::from(rssi.as_dbm());
        self.count = self.count.saturating_add(1);
        let delta = x - self.mean;
        self.mean += delta / self.count as f32;
        self.m2 += delta * (x - self.mean);
        self.min = self.min.min(rssi);
        self.max = self.max.max(rssi);
    }

    /// Number of samples so far
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// When the current window started
    #[must_use]
    pub const fn started_ms(&self) -> Millis {
        self.started_ms
    }

    /// Statistics so far, without closing the window
    #[must_use]
    pub fn summary(&self) -> Option<RssiSummary> {
        if self.count == 0 {
            return None;
        }
        let variance = (self.m2 / self.count as f32).max(0.0);
        Some(RssiSummary {
            mean: self.mean,
            std_dev: variance.sqrt(),
            min: self.min,
            max: self.max,
        })
    }

    /// Close the window if it has elapsed, returning its report and
    /// starting the next window at `now`
    pub fn poll(&mut self, now: Millis) -> Option<AvgReport> {
        let elapsed = now.saturating_sub(self.started_ms);
        if elapsed < self.window_ms {
            return None;
        }
        let report = AvgReport {
            at_ms: now,
            duration_ms: elapsed,
            count: self.count,
            summary: self.summary(),
        };
        *self = Self::new(self.window_ms, now);
        Some(report)
    }

    /// Discard samples and restart at `now`
    pub fn reset(&mut self, now: Millis) {
        *self = Self::new(self.window_ms, now);
    }
}
