//! Receiver Service
//!
//! Consumes receive outcomes and clock ticks, and decides what the LEDs,
//! display and serial port should show.

use crate::config::{AVG_WINDOW_MS, ERROR_PULSE_MS, SIGNAL_STALE_MS};
use crate::protocol::SerialLine;
use crate::radio::meter::MeterScale;
use crate::radio::packet::{Beacon, Frame, FrameError};
use crate::radio::service::Reaction;
use crate::radio::stats::RssiWindow;
use crate::types::{Frequency, Millis, Rssi};

/// A frame as delivered by the radio, with its signal strength
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reception {
    /// Decoded frame
    pub frame: Frame,
    /// RSSI measured while the frame was received
    pub rssi: Rssi,
}

/// Timing knobs for the receiver
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiverTiming {
    /// Error LED pulse length
    pub error_pulse_ms: Millis,
    /// Time without frames before the signal counts as lost
    pub stale_ms: Millis,
    /// Statistics window
    pub window_ms: Millis,
}

impl Default for ReceiverTiming {
    fn default() -> Self {
        Self {
            error_pulse_ms: ERROR_PULSE_MS,
            stale_ms: SIGNAL_STALE_MS,
            window_ms: AVG_WINDOW_MS,
        }
    }
}

/// What the meter screen shows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeterView {
    /// Carrier frequency
    pub frequency: Frequency,
    /// Latest RSSI, `None` before the first frame or once stale
    pub rssi: Option<Rssi>,
    /// Bar position 0..=100
    pub percent: u8,
    /// Valid frames since boot
    pub packets: u32,
    /// Malformed frames since boot
    pub errors: u32,
    /// Latest beacon sequence number
    pub last_seq: Option<u32>,
}

/// Receiver state machine
#[derive(Clone, Debug)]
pub struct ReceiverService {
    frequency: Frequency,
    scale: MeterScale,
    timing: ReceiverTiming,
    window: RssiWindow,
    last_rssi: Option<Rssi>,
    last_seq: Option<u32>,
    last_valid_ms: Option<Millis>,
    error_until: Option<Millis>,
    stale: bool,
    packets: u32,
    errors: u32,
}

impl ReceiverService {
    /// Create with default timing, starting the statistics window at `now`
    #[must_use]
    pub fn new(frequency: Frequency, now: Millis) -> Self {
        Self::with_timing(frequency, MeterScale::DEFAULT, ReceiverTiming::default(), now)
    }

    /// Create with explicit scale and timing
    #[must_use]
    pub const fn with_timing(
        frequency: Frequency,
        scale: MeterScale,
        timing: ReceiverTiming,
        now: Millis,
    ) -> Self {
        Self {
            frequency,
            scale,
            timing,
            window: RssiWindow::new(timing.window_ms, now),
            last_rssi: None,
            last_seq: None,
            last_valid_ms: None,
            error_until: None,
            stale: true,
            packets: 0,
            errors: 0,
        }
    }

    /// Handle the outcome of one receive attempt
    pub fn on_frame(&mut self, now: Millis, outcome: Result<Reception, FrameError>) -> Reaction {
        let decoded = outcome.and_then(|rx| {
            Beacon::decode(&rx.frame.payload).map(|beacon| (rx, beacon))
        });

        match decoded {
            Ok((rx, beacon)) => self.accept(now, &rx.frame, rx.rssi, beacon.seq),
            Err(err) => self.reject(now, err),
        }
    }

    fn accept(&mut self, now: Millis, frame: &Frame, rssi: Rssi, seq: u32) -> Reaction {
        self.packets = self.packets.wrapping_add(1);
        self.last_rssi = Some(rssi);
        self.last_seq = Some(seq);
        self.last_valid_ms = Some(now);
        self.stale = false;
        self.window.record(rssi);

        Reaction {
            meter_led: Some(self.scale.brightness(rssi)),
            redraw: true,
            line: Some(SerialLine::Rx {
                at_ms: now,
                rssi,
                from: frame.header.from,
                len: frame.payload.len(),
                seq,
            }),
            ..Reaction::none()
        }
    }

    fn reject(&mut self, now: Millis, err: FrameError) -> Reaction {
        self.errors = self.errors.wrapping_add(1);
        let was_lit = self.error_until.is_some();
        self.error_until = Some(now + self.timing.error_pulse_ms);

        Reaction {
            error_led: if was_lit { None } else { Some(true) },
            redraw: true,
            line: Some(SerialLine::Err {
                at_ms: now,
                reason: err.reason(),
            }),
            ..Reaction::none()
        }
    }

    /// Advance time: end error pulses, detect signal loss, close windows
    pub fn on_tick(&mut self, now: Millis) -> Reaction {
        let mut reaction = Reaction::none();

        if let Some(until) = self.error_until {
            if now >= until {
                self.error_until = None;
                reaction.error_led = Some(false);
            }
        }

        if !self.stale {
            let quiet = self
                .last_valid_ms
                .map_or(true, |t| now.saturating_sub(t) >= self.timing.stale_ms);
            if quiet {
                self.stale = true;
                reaction.meter_led = Some(0);
                reaction.redraw = true;
            }
        }

        if let Some(report) = self.window.poll(now) {
            reaction.line = Some(SerialLine::Avg(report));
        }

        reaction
    }

    /// Button B: restart the statistics window
    pub fn on_reset_button(&mut self, now: Millis) -> Reaction {
        self.window.reset(now);
        Reaction {
            redraw: true,
            ..Reaction::none()
        }
    }

    /// Snapshot for rendering
    #[must_use]
    pub fn view(&self) -> MeterView {
        let rssi = if self.stale { None } else { self.last_rssi };
        MeterView {
            frequency: self.frequency,
            rssi,
            percent: rssi.map_or(0, |r| self.scale.percent(r)),
            packets: self.packets,
            errors: self.errors,
            last_seq: self.last_seq,
        }
    }

    /// Frames accepted since boot
    #[must_use]
    pub const fn packets(&self) -> u32 {
        self.packets
    }

    /// Frames rejected since boot
    #[must_use]
    pub const fn errors(&self) -> u32 {
        self.errors
    }

    /// Samples in the current statistics window
    #[must_use]
    pub const fn window_count(&self) -> u32 {
        self.window.count()
    }

    /// Whether the signal is currently considered lost
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        self.stale
    }

    /// Whether the error LED pulse is running
    #[must_use]
    pub const fn is_error_lit(&self) -> bool {
        self.error_until.is_some()
    }
}

