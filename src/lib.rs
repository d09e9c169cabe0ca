//! RFM69 RSSI Meter Firmware Library
//!
//! This library provides the core functionality for an STM32G474-based
//! signal-strength meter. An RFM69HCW sub-GHz FSK transceiver receives
//! beacon frames from a second unit, and the measured RSSI of every frame
//! is shown on an SSD1306 OLED as a bar graph and a number, mirrored on an
//! LED brightness cue, and summarized over the USB serial port.
//!
//! # Architecture
//!
//! The firmware is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  Interlock  │  Receiver / Transmitter loop  │  Serial lines  │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     RADIO LOGIC                              │
//! │  Register math  │  Framing  │  RSSI statistics  │  Meter     │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL / DRIVER LAYER                         │
//! │  SPI (RFM69)  │  I2C (SSD1306)  │  PWM  │  USB  │  GPIO       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RTOS / SCHEDULER                          │
//! │           embassy-rs (async/await executor)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Functional core, imperative shell**: the service loops are pure
//!   state machines that return reactions; `main.rs` applies them to pins
//! - **Type-driven design**: frequencies, power levels and keys are
//!   validated on construction
//! - **No unsafe in application code**
//! - **Explicit error handling**: all fallible operations return `Result`

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;
#[cfg(feature = "embedded")]
pub use embassy_usb;

/// Hardware Abstraction Layer
///
/// Provides safe abstractions over STM32G474 peripherals.
#[cfg(feature = "embedded")]
pub mod hal;

/// Peripheral Drivers
///
/// Drivers for the RFM69 transceiver and the SSD1306 display.
#[cfg(feature = "embedded")]
pub mod drivers;

/// USB Subsystem
///
/// CDC ACM serial port used as the debug channel.
#[cfg(feature = "embedded")]
pub mod usb;

/// Radio Logic
///
/// Register math, framing, statistics and the service state machines.
pub mod radio;

/// User Interface
///
/// Frame buffer and screen rendering.
pub mod ui;

/// Serial line protocol
///
/// `AVG`/`RX`/`ERR`/`TX` report lines and their parser.
pub mod protocol;

/// Host-side CSV logger
///
/// Appends `AVG` lines read from the serial port to a CSV file.
#[cfg(feature = "std")]
pub mod logger;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    // Common traits
    pub use embedded_hal::digital::OutputPin;

    // Embassy
    pub use embassy_time::{Duration, Instant, Timer};

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
