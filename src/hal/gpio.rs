//! GPIO Abstractions
//!
//! Indicator LEDs and the two user buttons.

use embassy_stm32::gpio::{Input, Output};

use crate::config::{BUTTON_DEBOUNCE_MS, POLL_INTERVAL_MS};

/// Indicator LED state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LedState {
    /// LED is off
    #[default]
    Off,
    /// LED is on
    On,
}

impl LedState {
    /// Toggle the LED state
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }

    /// State from a level
    #[must_use]
    pub const fn from_bool(on: bool) -> Self {
        if on {
            Self::On
        } else {
            Self::Off
        }
    }
}

impl defmt::Format for LedState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Off => defmt::write!(f, "OFF"),
            Self::On => defmt::write!(f, "ON"),
        }
    }
}

/// On/off indicator LED (error, status)
pub struct StatusLed<'d> {
    pin: Output<'d>,
    state: LedState,
}

impl<'d> StatusLed<'d> {
    /// Create a new indicator LED, driven off
    #[must_use]
    pub fn new(pin: Output<'d>) -> Self {
        let mut led = Self {
            pin,
            state: LedState::Off,
        };
        led.off();
        led
    }

    /// Turn LED on
    pub fn on(&mut self) {
        self.pin.set_high();
        self.state = LedState::On;
    }

    /// Turn LED off
    pub fn off(&mut self) {
        self.pin.set_low();
        self.state = LedState::Off;
    }

    /// Drive to a level
    pub fn set(&mut self, on: bool) {
        if on {
            self.on();
        } else {
            self.off();
        }
    }

    /// Toggle LED state
    pub fn toggle(&mut self) {
        self.set(self.state.toggle() == LedState::On);
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> LedState {
        self.state
    }
}

/// Button state after debouncing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonState {
    /// Button is released
    Released,
    /// Button is pressed
    Pressed,
}

impl defmt::Format for ButtonState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Released => defmt::write!(f, "Released"),
            Self::Pressed => defmt::write!(f, "Pressed"),
        }
    }
}

/// Active-low push button with pull-up and debouncing
pub struct Button<'d> {
    pin: Input<'d>,
    state: ButtonState,
    last_raw: bool,
    debounce_count: u8,
}

impl<'d> Button<'d> {
    /// Required consecutive reads for debounce, one per poll
    const DEBOUNCE_THRESHOLD: u8 = (BUTTON_DEBOUNCE_MS / POLL_INTERVAL_MS) as u8;

    /// Wrap an input configured with a pull-up
    #[must_use]
    pub fn new(pin: Input<'d>) -> Self {
        Self {
            pin,
            state: ButtonState::Released,
            last_raw: false,
            debounce_count: 0,
        }
    }

    /// Raw level, no debouncing; used by the power-on interlock
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.pin.is_low()
    }

    /// Update button state (call periodically)
    ///
    /// Returns true on a debounced press.
    pub fn update(&mut self) -> bool {
        let current = self.is_held();

        if current == self.last_raw {
            if self.debounce_count < Self::DEBOUNCE_THRESHOLD {
                self.debounce_count += 1;
            }
        } else {
            self.debounce_count = 0;
            self.last_raw = current;
        }

        if self.debounce_count >= Self::DEBOUNCE_THRESHOLD {
            let new_state = if current {
                ButtonState::Pressed
            } else {
                ButtonState::Released
            };

            if new_state != self.state {
                self.state = new_state;
                return new_state == ButtonState::Pressed;
            }
        }

        false
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> ButtonState {
        self.state
    }
}
