//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the RSSI meter hardware.
//! All pin mappings, radio parameters, and timing values are centralized here.

use crate::radio::registers::ModemProfile;
use crate::types::{EncryptionKey, Frequency, NodeAddress, PowerAmp, Role, TxPower};

/// System clock frequency (STM32G474 @ 170MHz)
pub const SYSTEM_CLOCK_HZ: u32 = 170_000_000;

/// I2C bus frequency for the SSD1306 display
pub const I2C_FREQUENCY_HZ: u32 = 400_000;

/// SPI bus frequency for the RFM69 (chip maximum is 10 MHz)
pub const SPI_FREQUENCY_HZ: u32 = 1_000_000;

/// SSD1306 OLED I2C address
pub const DISPLAY_I2C_ADDR: u8 = 0x3C;

/// Display width in pixels
pub const DISPLAY_WIDTH: u32 = 128;

/// Display height in pixels
pub const DISPLAY_HEIGHT: u32 = 64;

/// Carrier frequency (US ISM band)
pub const RF_FREQUENCY_HZ: u32 = 915_000_000;

/// Transmit power in dBm
pub const TX_POWER_DBM: i8 = 20;

/// Fitted module is the high-power HCW variant
pub const POWER_AMP: PowerAmp = PowerAmp::HighPower;

/// Modulation profile shared by both ends of the link
pub const MODEM_PROFILE: ModemProfile = ModemProfile::GfskRb250Fd250;

/// Shared AES-128 key; both ends must match
pub const ENCRYPTION_KEY: &str = "sampleEncryptKey";

/// This node's address
pub const NODE_ADDRESS: u8 = 0x01;

/// Where beacons are sent
pub const DESTINATION_ADDRESS: u8 = 0xFF;

/// Accept frames addressed to any node
pub const PROMISCUOUS: bool = false;

/// Largest frame body the radio can encrypt (header + payload)
pub const RADIO_BUFFER_SIZE: usize = 64;

/// RSSI that maps to an empty bar
pub const RSSI_FLOOR_DBM: i16 = -100;

/// RSSI that maps to a full bar
pub const RSSI_CEILING_DBM: i16 = -30;

/// Statistics window for `AVG` report lines
pub const AVG_WINDOW_MS: u64 = 10_000;

/// How long the error LED stays lit after a malformed frame
pub const ERROR_PULSE_MS: u64 = 100;

/// Time without a valid frame before the signal is shown as lost
pub const SIGNAL_STALE_MS: u64 = 3_000;

/// Receiver poll period
pub const POLL_INTERVAL_MS: u64 = 5;

/// Transmitter beacon period
pub const TX_INTERVAL_MS: u64 = 1_000;

/// How long the status LED blinks per transmitted beacon
pub const TX_BLINK_MS: u64 = 50;

/// Beacon text prefix, followed by the sequence number
pub const BEACON_TEXT: &str = "Hello World #";

/// Lockout LED half-period
pub const LOCKOUT_FLASH_MS: u64 = 250;

/// Power-on interlock: consecutive held samples required to lock
pub const INTERLOCK_SAMPLES: u8 = 5;

/// Power-on interlock: spacing between samples
pub const INTERLOCK_SAMPLE_MS: u64 = 10;

/// Button debounce time in milliseconds (a multiple of the poll period)
pub const BUTTON_DEBOUNCE_MS: u64 = 15;

/// RFM69 reset pulse width in microseconds
pub const RADIO_RESET_PULSE_US: u64 = 100;

/// RFM69 start-up time after reset in milliseconds
pub const RADIO_STARTUP_MS: u64 = 5;

/// Mode-ready / packet-sent timeout in milliseconds
pub const RADIO_TIMEOUT_MS: u64 = 100;

/// Consecutive failed RX polls before the radio is treated as faulted
pub const RADIO_MAX_POLL_FAILURES: u8 = 10;

/// LED PWM frequency
pub const LED_PWM_HZ: u32 = 1_000;

/// Serial line coding reported to the host
pub const SERIAL_BAUD: u32 = 115_200;

/// Serial line buffer size, enough for the longest line at any field values
pub const SERIAL_LINE_SIZE: usize = 128;

/// Serial lines queued between the loop and the USB task
pub const SERIAL_QUEUE_DEPTH: usize = 8;

/// USB CDC ACM packet size
pub const USB_CDC_PACKET_SIZE: u16 = 64;

/// USB VID (use test VID for development)
pub const USB_VID: u16 = 0x1209;

/// USB PID (get from pid.codes for production)
pub const USB_PID: u16 = 0x0001;

/// Loop body built into this image
#[cfg(not(feature = "transmitter"))]
pub const ROLE: Role = Role::Receiver;

/// Loop body built into this image
#[cfg(feature = "transmitter")]
pub const ROLE: Role = Role::Transmitter;

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments matching the wiring

    /// RSSI brightness LED (TIM2 CH1 PWM)
    pub const LED_METER: &str = "PA5";

    /// Malformed-frame LED
    pub const LED_ERROR: &str = "PC0";

    /// Status LED (lockout flash, transmit blink)
    pub const LED_STATUS: &str = "PC1";

    /// Button A (active low)
    pub const BUTTON_A: &str = "PC2";

    /// Button B (active low)
    pub const BUTTON_B: &str = "PC3";

    /// I2C1 SCL (display)
    pub const I2C1_SCL: &str = "PB8";

    /// I2C1 SDA (display)
    pub const I2C1_SDA: &str = "PB9";

    /// SPI1 SCK (radio)
    pub const SPI1_SCK: &str = "PB3";

    /// SPI1 MISO (radio)
    pub const SPI1_MISO: &str = "PB4";

    /// SPI1 MOSI (radio)
    pub const SPI1_MOSI: &str = "PB5";

    /// Radio chip select (active low)
    pub const RADIO_CS: &str = "PA4";

    /// Radio reset (active high)
    pub const RADIO_RESET: &str = "PA8";

    /// USB D+ (handled by USB peripheral)
    pub const USB_DP: &str = "PA12";

    /// USB D- (handled by USB peripheral)
    pub const USB_DM: &str = "PA11";
}

/// Reasons a [`RadioConfig`] is rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Carrier outside the RFM69 bands
    InvalidFrequency(u32),
    /// Key is not exactly 16 bytes
    InvalidKeyLength(usize),
    /// Node address collides with the broadcast address
    BroadcastNodeAddress,
    /// Meter floor is not below its ceiling
    InvalidRssiScale,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidFrequency(hz) => write!(f, "frequency {hz} Hz out of band"),
            Self::InvalidKeyLength(len) => write!(f, "key must be 16 bytes, got {len}"),
            Self::BroadcastNodeAddress => f.write_str("node address 0xFF is reserved"),
            Self::InvalidRssiScale => f.write_str("RSSI floor must be below ceiling"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ConfigError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::InvalidFrequency(hz) => defmt::write!(f, "InvalidFrequency({})", hz),
            Self::InvalidKeyLength(len) => defmt::write!(f, "InvalidKeyLength({})", len),
            Self::BroadcastNodeAddress => defmt::write!(f, "BroadcastNodeAddress"),
            Self::InvalidRssiScale => defmt::write!(f, "InvalidRssiScale"),
        }
    }
}

/// Radio settings applied during start-up
#[derive(Clone, Copy, Debug)]
pub struct RadioConfig {
    /// Carrier frequency
    pub frequency: Frequency,
    /// Output power
    pub power: TxPower,
    /// Modulation profile
    pub profile: ModemProfile,
    /// Shared AES key (`None` disables encryption)
    pub key: Option<EncryptionKey>,
    /// This node
    pub address: NodeAddress,
    /// Beacon destination
    pub destination: NodeAddress,
    /// Accept frames for other nodes
    pub promiscuous: bool,
}

impl RadioConfig {
    /// Build from raw settings, validating each one
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn from_parts(
        frequency_hz: u32,
        power_dbm: i8,
        amp: PowerAmp,
        profile: ModemProfile,
        key: Option<&str>,
        address: u8,
        destination: u8,
    ) -> Result<Self, ConfigError> {
        let frequency =
            Frequency::from_hz(frequency_hz).ok_or(ConfigError::InvalidFrequency(frequency_hz))?;
        let key = match key {
            Some(k) => Some(
                EncryptionKey::from_ascii(k).ok_or(ConfigError::InvalidKeyLength(k.len()))?,
            ),
            None => None,
        };
        let config = Self {
            frequency,
            power: TxPower::new(power_dbm, amp),
            profile,
            key,
            address: NodeAddress::new(address),
            destination: NodeAddress::new(destination),
            promiscuous: PROMISCUOUS,
        };
        config.validate()?;
        Ok(config)
    }

    /// Build from the compile-time constants
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any constant is out of range.
    pub fn from_constants() -> Result<Self, ConfigError> {
        Self::from_parts(
            RF_FREQUENCY_HZ,
            TX_POWER_DBM,
            POWER_AMP,
            MODEM_PROFILE,
            Some(ENCRYPTION_KEY),
            NODE_ADDRESS,
            DESTINATION_ADDRESS,
        )
    }

    /// Check cross-field invariants
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first violation.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.address.is_broadcast() {
            return Err(ConfigError::BroadcastNodeAddress);
        }
        if RSSI_FLOOR_DBM >= RSSI_CEILING_DBM {
            return Err(ConfigError::InvalidRssiScale);
        }
        Ok(())
    }
}

/// Configured carrier, checked at compile time
pub const DEFAULT_FREQUENCY: Frequency = match Frequency::from_hz(RF_FREQUENCY_HZ) {
    Some(freq) => freq,
    None => panic!("RF_FREQUENCY_HZ is outside the RFM69 bands"),
};
