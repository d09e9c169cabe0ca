//! Radio Logic
//!
//! RFM69 register encoding, frame format and the pure state machines
//! behind the receiver and transmitter loops. Nothing here touches
//! hardware; the drivers and `main` feed events in and apply the
//! resulting [`service::Reaction`]s.

pub mod interlock;
pub mod meter;
pub mod packet;
pub mod receiver;
pub mod registers;
pub mod service;
pub mod stats;
pub mod transmitter;
