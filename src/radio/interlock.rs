//! Power-On Interlock
//!
//! Holding a button while the board powers up keeps the radio disabled.
//! The check runs once, before any RF hardware is touched; once locked the
//! device only flashes the status LED until it is reset.

use crate::types::Millis;

/// Interlock outcome
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterlockState {
    /// Still sampling
    Pending,
    /// No button held, radio may be enabled
    Clear,
    /// A button was held for every sample
    Locked,
}

#[cfg(feature = "embedded")]
impl defmt::Format for InterlockState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Pending => defmt::write!(f, "Pending"),
            Self::Clear => defmt::write!(f, "Clear"),
            Self::Locked => defmt::write!(f, "Locked"),
        }
    }
}

/// Samples the buttons at power-on
///
/// Locks only if a button reads held on every one of `required` samples,
/// so a bounce during power-up does not lock the device.
#[derive(Clone, Copy, Debug)]
pub struct PowerOnInterlock {
    required: u8,
    taken: u8,
    held_every_time: bool,
    state: InterlockState,
}

impl PowerOnInterlock {
    /// Create an interlock that needs `required` samples (at least one)
    #[must_use]
    pub const fn new(required: u8) -> Self {
        Self {
            required: if required == 0 { 1 } else { required },
            taken: 0,
            held_every_time: true,
            state: InterlockState::Pending,
        }
    }

    /// Feed one sample; `held` is true if any interlock button is pressed
    pub fn sample(&mut self, held: bool) -> InterlockState {
        if self.state != InterlockState::Pending {
            return self.state;
        }

        self.held_every_time &= held;
        self.taken += 1;

        if !self.held_every_time {
            self.state = InterlockState::Clear;
        } else if self.taken >= self.required {
            self.state = InterlockState::Locked;
        }
        self.state
    }

    /// Current outcome
    #[must_use]
    pub const fn state(&self) -> InterlockState {
        self.state
    }

    /// Run the whole check over a sequence of samples
    #[must_use]
    pub fn evaluate(required: u8, samples: impl IntoIterator<Item = bool>) -> InterlockState {
        let mut interlock = Self::new(required);
        for held in samples {
            if interlock.sample(held) != InterlockState::Pending {
                break;
            }
        }
        interlock.state()
    }
}

/// Lockout flash: LED level for a time since lockout began
#[must_use]
pub const fn lockout_led_on(elapsed_ms: Millis, half_period_ms: Millis) -> bool {
    if half_period_ms == 0 {
        return true;
    }
    (elapsed_ms / half_period_ms) % 2 == 0
}
