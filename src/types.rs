//! Shared types used across the RSSI meter firmware
//!
//! This module defines domain-specific types that enforce invariants
//! at construction time and provide type safety throughout the codebase.

use core::fmt;

/// RFM69 crystal oscillator frequency
pub const FXOSC_HZ: u32 = 32_000_000;

/// Carrier frequency in Hertz with validation
///
/// Represents a frequency inside one of the RFM69 synthesizer bands.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Frequency(u32);

impl Frequency {
    /// Synthesizer bands supported by the SX1231 core (inclusive, Hz)
    pub const BANDS: [(u32, u32); 3] = [
        (290_000_000, 340_000_000),
        (424_000_000, 510_000_000),
        (862_000_000, 1_020_000_000),
    ];

    /// Create a new Frequency from Hz, returns None if outside every band
    #[must_use]
    pub const fn from_hz(hz: u32) -> Option<Self> {
        let mut i = 0;
        while i < Self::BANDS.len() {
            let (lo, hi) = Self::BANDS[i];
            if hz >= lo && hz <= hi {
                return Some(Self(hz));
            }
            i += 1;
        }
        None
    }

    /// Create a new Frequency from kHz
    #[must_use]
    pub const fn from_khz(khz: u32) -> Option<Self> {
        match khz.checked_mul(1000) {
            Some(hz) => Self::from_hz(hz),
            None => None,
        }
    }

    /// Create a new Frequency from MHz given as a float (e.g. `915.0`)
    #[must_use]
    pub fn from_mhz(mhz: f32) -> Option<Self> {
        if mhz.is_nan() || mhz <= 0.0 {
            return None;
        }
        let khz = (mhz * 1000.0 + 0.5) as u32;
        Self::from_khz(khz)
    }

    /// Get the frequency in Hz
    #[must_use]
    pub const fn as_hz(self) -> u32 {
        self.0
    }

    /// Get the frequency in kHz (truncated)
    #[must_use]
    pub const fn as_khz(self) -> u32 {
        self.0 / 1000
    }

    /// 24-bit FRF register word: `hz / Fstep` with `Fstep = FXOSC / 2^19`
    #[must_use]
    pub const fn frf(self) -> u32 {
        (((self.0 as u64) << 19) / FXOSC_HZ as u64) as u32
    }
}

impl fmt::Debug for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency({} Hz)", self.0)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mhz = self.0 / 1_000_000;
        let tenths = (self.0 % 1_000_000) / 100_000;
        write!(f, "{mhz}.{tenths}MHz")
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Frequency {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{} Hz", self.0);
    }
}

/// Which RFM69 variant is fitted
///
/// The HCW/HW parts route the PA through PA1/PA2 and cannot use PA0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PowerAmp {
    /// RFM69W/CW: PA0 only, -18..=13 dBm
    Standard,
    /// RFM69HW/HCW: PA1+PA2, -2..=20 dBm
    #[default]
    HighPower,
}

impl PowerAmp {
    /// Minimum output power in dBm
    #[must_use]
    pub const fn min_dbm(self) -> i8 {
        match self {
            Self::Standard => -18,
            Self::HighPower => -2,
        }
    }

    /// Maximum output power in dBm
    #[must_use]
    pub const fn max_dbm(self) -> i8 {
        match self {
            Self::Standard => 13,
            Self::HighPower => 20,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for PowerAmp {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Standard => defmt::write!(f, "PA0"),
            Self::HighPower => defmt::write!(f, "PA1+PA2"),
        }
    }
}

/// Transmit power in dBm, clamped to what the fitted PA supports
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxPower {
    dbm: i8,
    amp: PowerAmp,
}

impl TxPower {
    /// Create a power level, clamping into the amplifier's range
    #[must_use]
    pub const fn new(dbm: i8, amp: PowerAmp) -> Self {
        let dbm = if dbm < amp.min_dbm() {
            amp.min_dbm()
        } else if dbm > amp.max_dbm() {
            amp.max_dbm()
        } else {
            dbm
        };
        Self { dbm, amp }
    }

    /// Get power in dBm
    #[must_use]
    pub const fn dbm(self) -> i8 {
        self.dbm
    }

    /// Get the amplifier variant
    #[must_use]
    pub const fn amp(self) -> PowerAmp {
        self.amp
    }

    /// Whether the +20 dBm boost registers must be enabled while transmitting
    #[must_use]
    pub const fn needs_boost(self) -> bool {
        matches!(self.amp, PowerAmp::HighPower) && self.dbm >= 18
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TxPower {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{} dBm ({})", self.dbm, self.amp);
    }
}

/// Received signal strength in dBm
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rssi(i16);

impl Rssi {
    /// Weakest value the RSSI register can report
    pub const MIN: Self = Self(-127);

    /// Create from dBm
    #[must_use]
    pub const fn from_dbm(dbm: i16) -> Self {
        Self(dbm)
    }

    /// Convert a RegRssiValue reading (`-raw / 2` dBm)
    #[must_use]
    pub const fn from_register(raw: u8) -> Self {
        Self(-((raw / 2) as i16))
    }

    /// Get value in dBm
    #[must_use]
    pub const fn as_dbm(self) -> i16 {
        self.0
    }
}

impl fmt::Display for Rssi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} dBm", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Rssi {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{} dBm", self.0);
    }
}

/// AES-128 key shared by every node on the link
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EncryptionKey([u8; 16]);

impl EncryptionKey {
    /// Key length in bytes
    pub const LEN: usize = 16;

    /// Create from raw bytes
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create from an ASCII passphrase of exactly 16 bytes
    #[must_use]
    pub const fn from_ascii(s: &str) -> Option<Self> {
        let b = s.as_bytes();
        if b.len() != Self::LEN {
            return None;
        }
        let mut key = [0u8; 16];
        let mut i = 0;
        while i < Self::LEN {
            key[i] = b[i];
            i += 1;
        }
        Some(Self(key))
    }

    /// Raw key bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

// Never print key material.
impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}

/// Node address carried in the frame header
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeAddress(u8);

impl NodeAddress {
    /// Address every node accepts
    pub const BROADCAST: Self = Self(0xFF);

    /// Create from raw address
    #[must_use]
    pub const fn new(addr: u8) -> Self {
        Self(addr)
    }

    /// Raw address
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Check for the broadcast address
    #[must_use]
    pub const fn is_broadcast(self) -> bool {
        self.0 == Self::BROADCAST.0
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for NodeAddress {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "0x{:02X}", self.0);
    }
}

/// Loop body selected at build time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Listen for beacons and display their RSSI
    Receiver,
    /// Send numbered beacons on a fixed interval
    Transmitter,
}

#[cfg(feature = "embedded")]
impl defmt::Format for Role {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Receiver => defmt::write!(f, "RX"),
            Self::Transmitter => defmt::write!(f, "TX"),
        }
    }
}

/// Millisecond timestamp since boot
///
/// Plain `u64` so the pure state machines can be driven from tests.
pub type Millis = u64;
