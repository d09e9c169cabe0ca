//! Peripheral Drivers
//!
//! Drivers for the external parts: the RFM69 transceiver on SPI and the
//! SSD1306 OLED on I2C.

pub mod display;
pub mod rfm69;
