//! USB Subsystem
//!
//! CDC ACM serial port used as the debug channel for report lines.

pub mod cdc;
