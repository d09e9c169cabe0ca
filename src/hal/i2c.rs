//! I2C Bus Abstractions
//!
//! Async I2C for the SSD1306 display.

use embassy_stm32::i2c::{Error as I2cError, I2c};
use embassy_stm32::mode::Async;

use crate::config::DISPLAY_I2C_ADDR;

/// I2C operation result
pub type I2cResult<T> = Result<T, I2cError>;

/// I2C device address wrapper
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct I2cAddress(u8);

impl I2cAddress {
    /// SSD1306 OLED display address
    pub const SSD1306: Self = Self(DISPLAY_I2C_ADDR);

    /// Create from 7-bit address
    #[must_use]
    pub const fn new(addr: u8) -> Self {
        Self(addr & 0x7F)
    }

    /// Get the 7-bit address
    #[must_use]
    pub const fn addr(self) -> u8 {
        self.0
    }
}

impl defmt::Format for I2cAddress {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "0x{:02X}", self.0);
    }
}

/// I2C bus wrapper
pub struct I2cBus<'d> {
    i2c: I2c<'d, Async>,
}

impl<'d> I2cBus<'d> {
    /// Create a new I2C bus wrapper
    #[must_use]
    pub fn new(i2c: I2c<'d, Async>) -> Self {
        Self { i2c }
    }

    /// Write bytes to a device
    pub async fn write(&mut self, addr: I2cAddress, data: &[u8]) -> I2cResult<()> {
        self.i2c.write(addr.addr(), data).await
    }

    /// Check that a device answers a one-byte read
    pub async fn ping(&mut self, addr: I2cAddress) -> bool {
        let mut buf = [0u8; 1];
        self.i2c.read(addr.addr(), &mut buf).await.is_ok()
    }
}
