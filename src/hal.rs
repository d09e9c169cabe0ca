//! Hardware Abstraction Layer
//!
//! Thin wrappers over STM32G474 peripherals: indicator LEDs and buttons,
//! the display I2C bus, the radio SPI bus, the meter LED PWM channel and
//! uptime helpers.

pub mod gpio;
pub mod i2c;
pub mod pwm;
pub mod spi;
pub mod timer;
