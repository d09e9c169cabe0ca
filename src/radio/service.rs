//! Service-Stage Reactions
//!
//! The receiver and transmitter loops are pure state machines. Each event
//! returns a [`Reaction`] that the firmware shell applies to LEDs, the
//! display and the serial port.

use crate::protocol::SerialLine;

/// Side effects requested by a service state machine
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reaction {
    /// New meter LED duty (16-bit), if it changed
    pub meter_led: Option<u16>,
    /// New error LED level, if it changed
    pub error_led: Option<bool>,
    /// New status LED level, if it changed
    pub status_led: Option<bool>,
    /// Display contents changed
    pub redraw: bool,
    /// Line to emit on the serial port
    pub line: Option<SerialLine>,
}

impl Reaction {
    /// Nothing to do
    #[must_use]
    pub const fn none() -> Self {
        Self {
            meter_led: None,
            error_led: None,
            status_led: None,
            redraw: false,
            line: None,
        }
    }

    /// True if the reaction requests no effect at all
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.meter_led.is_none()
            && self.error_led.is_none()
            && self.status_led.is_none()
            && !self.redraw
            && self.line.is_none()
    }
}

/// Consecutive failures of a repeated hardware operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FailureStreak {
    limit: u8,
    count: u8,
}

impl FailureStreak {
    /// Give up after `limit` failures in a row (at least one)
    #[must_use]
    pub const fn new(limit: u8) -> Self {
        Self {
            limit: if limit == 0 { 1 } else { limit },
            count: 0,
        }
    }

    /// Record a failure; true once the limit is reached
    pub fn fail(&mut self) -> bool {
        self.count = self.count.saturating_add(1);
        self.count >= self.limit
    }

    /// Record a success, ending the streak
    pub fn succeed(&mut self) {
        self.count = 0;
    }

    /// Failures since the last success
    #[must_use]
    pub const fn count(&self) -> u8 {
        self.count
    }
}
