//! Transmitter Service
//!
//! Sends a numbered beacon at a fixed interval and blinks the status LED
//! after each attempt.

use crate::config::{BEACON_TEXT, ERROR_PULSE_MS, TX_BLINK_MS, TX_INTERVAL_MS};
use crate::protocol::SerialLine;
use crate::radio::packet::{Beacon, Frame, Header};
use crate::radio::service::Reaction;
use crate::types::{Frequency, Millis, NodeAddress, TxPower};

/// What the transmit screen shows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxView {
    /// Carrier frequency
    pub frequency: Frequency,
    /// Configured output power
    pub power: TxPower,
    /// Beacons handed to the radio
    pub sent: u32,
    /// Send attempts that failed
    pub failures: u32,
    /// Sequence number of the last beacon
    pub last_seq: Option<u32>,
}

/// Beacon scheduler
#[derive(Clone, Debug)]
pub struct TransmitterService {
    frequency: Frequency,
    power: TxPower,
    address: NodeAddress,
    destination: NodeAddress,
    interval_ms: Millis,
    next_due: Millis,
    next_seq: u32,
    last_seq: Option<u32>,
    status_until: Option<Millis>,
    error_until: Option<Millis>,
    sent: u32,
    failures: u32,
}

impl TransmitterService {
    /// Create a scheduler whose first beacon is due at `now`
    #[must_use]
    pub const fn new(
        frequency: Frequency,
        power: TxPower,
        address: NodeAddress,
        destination: NodeAddress,
        now: Millis,
    ) -> Self {
        Self {
            frequency,
            power,
            address,
            destination,
            interval_ms: TX_INTERVAL_MS,
            next_due: now,
            next_seq: 0,
            last_seq: None,
            status_until: None,
            error_until: None,
            sent: 0,
            failures: 0,
        }
    }

    /// Override the beacon interval
    #[must_use]
    pub const fn with_interval(mut self, interval_ms: Millis) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Next beacon if one is due
    ///
    /// The sequence number advances whether or not the send succeeds.
    pub fn poll(&mut self, now: Millis) -> Option<Frame> {
        if now < self.next_due {
            return None;
        }
        self.next_due = now + self.interval_ms;

        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.last_seq = Some(seq);

        let beacon = Beacon::numbered(BEACON_TEXT, seq);
        let header = Header {
            to: self.destination,
            from: self.address,
            id: seq as u8,
            flags: 0,
        };
        Frame::new(header, &beacon.encode()).ok()
    }

    /// Report the outcome of sending the beacon returned by [`Self::poll`]
    ///
    /// A failure carries the short reason token for the `ERR` line.
    pub fn on_sent(&mut self, now: Millis, outcome: Result<(), &'static str>) -> Reaction {
        let seq = self.last_seq.unwrap_or(0);
        match outcome {
            Ok(()) => {
                self.sent = self.sent.wrapping_add(1);
                self.status_until = Some(now + TX_BLINK_MS);
                Reaction {
                    status_led: Some(true),
                    redraw: true,
                    line: Some(SerialLine::Tx { at_ms: now, seq }),
                    ..Reaction::none()
                }
            }
            Err(reason) => {
                self.failures = self.failures.wrapping_add(1);
                self.error_until = Some(now + ERROR_PULSE_MS);
                Reaction {
                    error_led: Some(true),
                    redraw: true,
                    line: Some(SerialLine::Err { at_ms: now, reason }),
                    ..Reaction::none()
                }
            }
        }
    }

    /// Advance time: end LED blinks
    pub fn on_tick(&mut self, now: Millis) -> Reaction {
        let mut reaction = Reaction::none();
        if self.status_until.is_some_and(|t| now >= t) {
            self.status_until = None;
            reaction.status_led = Some(false);
        }
        if self.error_until.is_some_and(|t| now >= t) {
            self.error_until = None;
            reaction.error_led = Some(false);
        }
        reaction
    }

    /// Time until the next beacon is due
    #[must_use]
    pub const fn until_due(&self, now: Millis) -> Millis {
        self.next_due.saturating_sub(now)
    }

    /// Snapshot for rendering
    #[must_use]
    pub const fn view(&self) -> TxView {
        TxView {
            frequency: self.frequency,
            power: self.power,
            sent: self.sent,
            failures: self.failures,
            last_seq: self.last_seq,
        }
    }
}
