//! RSSI Meter Scale
//!
//! Maps a signal strength onto the 0-100 % range shared by the bar graph
//! and the LED brightness cue.

use crate::config::{RSSI_CEILING_DBM, RSSI_FLOOR_DBM};
use crate::types::Rssi;

/// Linear dBm scale between a floor and a ceiling
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeterScale {
    floor: i16,
    ceiling: i16,
}

impl MeterScale {
    /// Scale from the configured constants
    pub const DEFAULT: Self = Self {
        floor: RSSI_FLOOR_DBM,
        ceiling: RSSI_CEILING_DBM,
    };

    /// Create a scale; returns `None` unless `floor < ceiling`
    #[must_use]
    pub const fn new(floor_dbm: i16, ceiling_dbm: i16) -> Option<Self> {
        if floor_dbm < ceiling_dbm {
            Some(Self {
                floor: floor_dbm,
                ceiling: ceiling_dbm,
            })
        } else {
            None
        }
    }

    /// Floor in dBm
    #[must_use]
    pub const fn floor(&self) -> i16 {
        self.floor
    }

    /// Ceiling in dBm
    #[must_use]
    pub const fn ceiling(&self) -> i16 {
        self.ceiling
    }

    /// Position on the scale, 0..=100, clamped at both ends
    #[must_use]
    pub fn percent(&self, rssi: Rssi) -> u8 {
        let dbm = i32::from(rssi.as_dbm());
        let floor = i32::from(self.floor);
        let span = i32::from(self.ceiling) - floor;
        let pct = ((dbm - floor) * 100 / span).clamp(0, 100);
        pct as u8
    }

    /// Fill width in pixels for a bar `max_width` wide
    #[must_use]
    pub fn bar_width(&self, rssi: Rssi, max_width: u32) -> u32 {
        u32::from(self.percent(rssi)) * max_width / 100
    }

    /// LED duty cycle on a 16-bit scale
    #[must_use]
    pub fn brightness(&self, rssi: Rssi) -> u16 {
        (u32::from(self.percent(rssi)) * u32::from(u16::MAX) / 100) as u16
    }
}

impl Default for MeterScale {
    fn default() -> Self {
        Self::DEFAULT
    }
}
