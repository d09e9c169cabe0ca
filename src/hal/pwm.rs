//! PWM LED Dimmer
//!
//! The meter LED brightness follows signal strength. It is driven by one
//! channel of a general-purpose timer in edge-aligned PWM mode.

use embassy_stm32::timer::simple_pwm::SimplePwmChannel;
use embassy_stm32::timer::GeneralInstance4Channel;

/// PWM duty cycle (0-65535)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DutyCycle(u16);

impl DutyCycle {
    /// 0% duty cycle
    pub const ZERO: Self = Self(0);

    /// 100% duty cycle
    pub const FULL: Self = Self(65535);

    /// Create from 16-bit value
    #[must_use]
    pub const fn from_raw(value: u16) -> Self {
        Self(value)
    }

    /// Create from percentage (0-100)
    #[must_use]
    pub fn from_percent(percent: u8) -> Self {
        let value = (u32::from(percent.min(100)) * 65535) / 100;
        Self(value as u16)
    }

    /// Get raw 16-bit value
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Get as percentage
    #[must_use]
    pub fn as_percent(self) -> u8 {
        ((u32::from(self.0) * 100) / 65535) as u8
    }

    /// Scale onto a timer's compare range `0..=max`
    #[must_use]
    pub fn to_compare(self, max: u16) -> u16 {
        ((u32::from(self.0) * u32::from(max)) / 65535) as u16
    }
}

impl Default for DutyCycle {
    fn default() -> Self {
        Self::ZERO
    }
}

impl defmt::Format for DutyCycle {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}%", self.as_percent());
    }
}

/// Meter LED on a PWM channel
pub struct LedDimmer<'d, T: GeneralInstance4Channel> {
    channel: SimplePwmChannel<'d, T>,
    duty: DutyCycle,
}

impl<'d, T: GeneralInstance4Channel> LedDimmer<'d, T> {
    /// Take an enabled-or-not channel; starts dark
    pub fn new(mut channel: SimplePwmChannel<'d, T>) -> Self {
        channel.set_duty_cycle_fully_off();
        channel.enable();
        Self {
            channel,
            duty: DutyCycle::ZERO,
        }
    }

    /// Set brightness
    pub fn set(&mut self, duty: DutyCycle) {
        let max = self.channel.max_duty_cycle();
        self.channel.set_duty_cycle(duty.to_compare(max));
        self.duty = duty;
    }

    /// Turn fully off
    pub fn off(&mut self) {
        self.set(DutyCycle::ZERO);
    }

    /// Current brightness
    #[must_use]
    pub const fn duty(&self) -> DutyCycle {
        self.duty
    }
}
