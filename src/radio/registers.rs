//! RFM69 Register Map
//!
//! Register addresses, bit fields and the pure computations needed to
//! program the SX1231 core inside the RFM69: operating modes, PA levels,
//! modem profiles and packet-engine settings.

use crate::types::{PowerAmp, TxPower, FXOSC_HZ};

/// RFM69 register addresses
#[allow(missing_docs)]
pub mod reg {
    pub const FIFO: u8 = 0x00;
    pub const OP_MODE: u8 = 0x01;
    pub const DATA_MODUL: u8 = 0x02;
    pub const BITRATE_MSB: u8 = 0x03;
    pub const BITRATE_LSB: u8 = 0x04;
    pub const FDEV_MSB: u8 = 0x05;
    pub const FDEV_LSB: u8 = 0x06;
    pub const FRF_MSB: u8 = 0x07;
    pub const FRF_MID: u8 = 0x08;
    pub const FRF_LSB: u8 = 0x09;
    pub const VERSION: u8 = 0x10;
    pub const PA_LEVEL: u8 = 0x11;
    pub const OCP: u8 = 0x13;
    pub const RX_BW: u8 = 0x19;
    pub const AFC_BW: u8 = 0x1A;
    pub const RSSI_VALUE: u8 = 0x24;
    pub const DIO_MAPPING1: u8 = 0x25;
    pub const IRQ_FLAGS1: u8 = 0x27;
    pub const IRQ_FLAGS2: u8 = 0x28;
    pub const PREAMBLE_MSB: u8 = 0x2C;
    pub const PREAMBLE_LSB: u8 = 0x2D;
    pub const SYNC_CONFIG: u8 = 0x2E;
    pub const SYNC_VALUE1: u8 = 0x2F;
    pub const PACKET_CONFIG1: u8 = 0x37;
    pub const PAYLOAD_LENGTH: u8 = 0x38;
    pub const NODE_ADRS: u8 = 0x39;
    pub const BROADCAST_ADRS: u8 = 0x3A;
    pub const FIFO_THRESH: u8 = 0x3C;
    pub const PACKET_CONFIG2: u8 = 0x3D;
    pub const AES_KEY1: u8 = 0x3E;
    pub const TEST_PA1: u8 = 0x5A;
    pub const TEST_PA2: u8 = 0x5C;
    pub const TEST_DAGC: u8 = 0x6F;
}

/// Set on the address byte to select a register write
pub const WRITE_MASK: u8 = 0x80;

/// Expected contents of `RegVersion` (silicon 2.4)
pub const CHIP_VERSION: u8 = 0x24;

/// `RegIrqFlags1` bits
#[allow(missing_docs)]
pub mod irq1 {
    pub const MODE_READY: u8 = 0x80;
}

/// `RegIrqFlags2` bits
#[allow(missing_docs)]
pub mod irq2 {
    pub const PACKET_SENT: u8 = 0x08;
    pub const PAYLOAD_READY: u8 = 0x04;
    pub const CRC_OK: u8 = 0x02;
}

/// `RegPaLevel` amplifier enables
#[allow(missing_docs)]
pub mod pa {
    pub const PA0_ON: u8 = 0x80;
    pub const PA1_ON: u8 = 0x40;
    pub const PA2_ON: u8 = 0x20;
    pub const OUTPUT_POWER: u8 = 0x1F;
}

/// `RegPacketConfig1` bits
#[allow(missing_docs)]
pub mod packet1 {
    pub const VARIABLE_LENGTH: u8 = 0x80;
    pub const WHITENING: u8 = 0x40;
    pub const CRC_ON: u8 = 0x10;
    /// Keep the FIFO on a CRC failure so `PayloadReady` still fires
    pub const CRC_AUTO_CLEAR_OFF: u8 = 0x08;
}

/// `RegTestPa1`/`RegTestPa2`/`RegOcp` values for normal and +20 dBm operation
#[allow(missing_docs)]
pub mod boost {
    pub const TEST_PA1_NORMAL: u8 = 0x55;
    pub const TEST_PA1_BOOST: u8 = 0x5D;
    pub const TEST_PA2_NORMAL: u8 = 0x70;
    pub const TEST_PA2_BOOST: u8 = 0x7C;
    pub const OCP_ON: u8 = 0x1A;
    pub const OCP_OFF: u8 = 0x0F;
}

/// `RegDioMapping1` values
pub mod dio {
    /// DIO0 = `PayloadReady` in RX
    pub const RX_PAYLOAD_READY: u8 = 0x40;
    /// DIO0 = `PacketSent` in TX
    pub const TX_PACKET_SENT: u8 = 0x00;
}

/// Fixed start-up settings written by `init`
pub mod defaults {
    /// TX starts as soon as the FIFO is not empty, threshold 15
    pub const FIFO_THRESH: u8 = 0x8F;
    /// Improved DAGC for low modulation index
    pub const TEST_DAGC: u8 = 0x30;
    /// Sync on, 2 sync bytes, no errors tolerated
    pub const SYNC_CONFIG: u8 = 0x88;
    /// Sync word shared with RadioHead-compatible nodes
    pub const SYNC_WORDS: [u8; 2] = [0x2D, 0xD4];
    /// Preamble length in bytes
    pub const PREAMBLE_LEN: u16 = 4;
    /// Largest length byte the packet engine accepts
    pub const PAYLOAD_LENGTH: u8 = 66;
    /// AES on, auto restart RX after a packet
    pub const PACKET_CONFIG2_AES: u8 = 0x03;
    /// AES off, auto restart RX after a packet
    pub const PACKET_CONFIG2_PLAIN: u8 = 0x02;
}

/// Transceiver operating modes (`RegOpMode` bits 4..2)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpMode {
    /// Lowest power, registers retained
    Sleep,
    /// Crystal running, ready for FIFO access
    Standby,
    /// Frequency synthesizer running
    FrequencySynth,
    /// Transmitting
    Tx,
    /// Receiving
    Rx,
}

impl OpMode {
    /// `RegOpMode` value with sequencer on and listen off
    #[must_use]
    pub const fn as_reg(self) -> u8 {
        match self {
            Self::Sleep => 0x00,
            Self::Standby => 0x04,
            Self::FrequencySynth => 0x08,
            Self::Tx => 0x0C,
            Self::Rx => 0x10,
        }
    }

    /// Decode the mode bits of a `RegOpMode` read
    #[must_use]
    pub const fn from_reg(value: u8) -> Option<Self> {
        match value & 0x1C {
            0x00 => Some(Self::Sleep),
            0x04 => Some(Self::Standby),
            0x08 => Some(Self::FrequencySynth),
            0x0C => Some(Self::Tx),
            0x10 => Some(Self::Rx),
            _ => None,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for OpMode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Sleep => defmt::write!(f, "SLEEP"),
            Self::Standby => defmt::write!(f, "STDBY"),
            Self::FrequencySynth => defmt::write!(f, "FS"),
            Self::Tx => defmt::write!(f, "TX"),
            Self::Rx => defmt::write!(f, "RX"),
        }
    }
}

/// `RegPaLevel` value for a power setting
///
/// The high-power part has no PA0 path; below +14 dBm it runs PA1 alone,
/// above that PA1 and PA2 together, and from +18 dBm the boost registers
/// add the last 3 dB.
#[must_use]
pub const fn pa_level(power: TxPower) -> u8 {
    let dbm = power.dbm();
    match power.amp() {
        PowerAmp::Standard => pa::PA0_ON | (((dbm + 18) as u8) & pa::OUTPUT_POWER),
        PowerAmp::HighPower => {
            if dbm <= 13 {
                pa::PA1_ON | (((dbm + 18) as u8) & pa::OUTPUT_POWER)
            } else if dbm >= 18 {
                pa::PA1_ON | pa::PA2_ON | (((dbm + 11) as u8) & pa::OUTPUT_POWER)
            } else {
                pa::PA1_ON | pa::PA2_ON | (((dbm + 14) as u8) & pa::OUTPUT_POWER)
            }
        }
    }
}

/// `RegOcp`, `RegTestPa1`, `RegTestPa2` values for a mode
///
/// Boost is only legal while transmitting; RX must see the normal values.
#[must_use]
pub const fn boost_registers(power: TxPower, mode: OpMode) -> [(u8, u8); 3] {
    if power.needs_boost() && matches!(mode, OpMode::Tx) {
        [
            (reg::OCP, boost::OCP_OFF),
            (reg::TEST_PA1, boost::TEST_PA1_BOOST),
            (reg::TEST_PA2, boost::TEST_PA2_BOOST),
        ]
    } else {
        [
            (reg::OCP, boost::OCP_ON),
            (reg::TEST_PA1, boost::TEST_PA1_NORMAL),
            (reg::TEST_PA2, boost::TEST_PA2_NORMAL),
        ]
    }
}

/// Bit-rate register word for a rate in bits per second
#[must_use]
pub const fn bitrate_word(bps: u32) -> u16 {
    (FXOSC_HZ / bps) as u16
}

/// Frequency-deviation register word (`fdev / Fstep`)
#[must_use]
pub const fn fdev_word(hz: u32) -> u16 {
    ((((hz as u64) << 19) / FXOSC_HZ as u64) as u16) & 0x3FFF
}

/// Pulse shaping for FSK
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shaping {
    /// Plain FSK
    None,
    /// Gaussian filter, BT = 1.0
    GaussianBt1_0,
}

/// FSK modulation profiles, named after bit rate and deviation
///
/// All profiles use variable-length packets, whitening and CRC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModemProfile {
    /// FSK, 2.4 kbps, 4.8 kHz deviation
    FskRb2_4Fd4_8,
    /// FSK, 9.6 kbps, 19.2 kHz deviation
    FskRb9_6Fd19_2,
    /// FSK, 38.4 kbps, 76.8 kHz deviation
    FskRb38_4Fd76_8,
    /// FSK, 125 kbps, 125 kHz deviation
    FskRb125Fd125,
    /// FSK, 250 kbps, 250 kHz deviation
    FskRb250Fd250,
    /// GFSK, 2.4 kbps, 4.8 kHz deviation
    GfskRb2_4Fd4_8,
    /// GFSK, 9.6 kbps, 19.2 kHz deviation
    GfskRb9_6Fd19_2,
    /// GFSK, 38.4 kbps, 76.8 kHz deviation
    GfskRb38_4Fd76_8,
    /// GFSK, 125 kbps, 125 kHz deviation
    GfskRb125Fd125,
    /// GFSK, 250 kbps, 250 kHz deviation
    GfskRb250Fd250,
}

/// Register values a profile expands to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModemRegisters {
    /// `RegDataModul`
    pub data_modul: u8,
    /// `RegBitrateMsb`/`Lsb`
    pub bitrate: u16,
    /// `RegFdevMsb`/`Lsb`
    pub fdev: u16,
    /// `RegRxBw`
    pub rx_bw: u8,
    /// `RegAfcBw`
    pub afc_bw: u8,
    /// `RegPacketConfig1`
    pub packet_config1: u8,
}

impl ModemRegisters {
    /// Register/value pairs in write order
    #[must_use]
    pub const fn writes(&self) -> [(u8, u8); 8] {
        [
            (reg::DATA_MODUL, self.data_modul),
            (reg::BITRATE_MSB, (self.bitrate >> 8) as u8),
            (reg::BITRATE_LSB, self.bitrate as u8),
            (reg::FDEV_MSB, (self.fdev >> 8) as u8),
            (reg::FDEV_LSB, self.fdev as u8),
            (reg::RX_BW, self.rx_bw),
            (reg::AFC_BW, self.afc_bw),
            (reg::PACKET_CONFIG1, self.packet_config1),
        ]
    }
}

/// Variable length, whitening, CRC checked but failed frames delivered,
/// no hardware address filter
pub const PACKET_CONFIG1_WHITE: u8 = packet1::VARIABLE_LENGTH
    | packet1::WHITENING
    | packet1::CRC_ON
    | packet1::CRC_AUTO_CLEAR_OFF;

impl ModemProfile {
    /// Bit rate in bits per second
    #[must_use]
    pub const fn bitrate_bps(self) -> u32 {
        match self {
            Self::FskRb2_4Fd4_8 | Self::GfskRb2_4Fd4_8 => 2_400,
            Self::FskRb9_6Fd19_2 | Self::GfskRb9_6Fd19_2 => 9_600,
            Self::FskRb38_4Fd76_8 | Self::GfskRb38_4Fd76_8 => 38_400,
            Self::FskRb125Fd125 | Self::GfskRb125Fd125 => 125_000,
            Self::FskRb250Fd250 | Self::GfskRb250Fd250 => 250_000,
        }
    }

    /// Frequency deviation in Hz
    #[must_use]
    pub const fn deviation_hz(self) -> u32 {
        match self {
            Self::FskRb2_4Fd4_8 | Self::GfskRb2_4Fd4_8 => 4_800,
            Self::FskRb9_6Fd19_2 | Self::GfskRb9_6Fd19_2 => 19_200,
            Self::FskRb38_4Fd76_8 | Self::GfskRb38_4Fd76_8 => 76_800,
            Self::FskRb125Fd125 | Self::GfskRb125Fd125 => 125_000,
            Self::FskRb250Fd250 | Self::GfskRb250Fd250 => 250_000,
        }
    }

    /// Pulse shaping
    #[must_use]
    pub const fn shaping(self) -> Shaping {
        match self {
            Self::FskRb2_4Fd4_8
            | Self::FskRb9_6Fd19_2
            | Self::FskRb38_4Fd76_8
            | Self::FskRb125Fd125
            | Self::FskRb250Fd250 => Shaping::None,
            _ => Shaping::GaussianBt1_0,
        }
    }

    /// `RegRxBw` (DCC cutoff + mantissa/exponent) sized for the deviation
    const fn rx_bw(self) -> u8 {
        match self.deviation_hz() {
            0..=19_200 => 0xF4,
            19_201..=76_800 => 0xF2,
            76_801..=125_000 => 0xE1,
            _ => 0xE0,
        }
    }

    /// Expand to register values
    #[must_use]
    pub const fn registers(self) -> ModemRegisters {
        let data_modul = match self.shaping() {
            Shaping::None => 0x00,
            Shaping::GaussianBt1_0 => 0x01,
        };
        let rx_bw = self.rx_bw();
        ModemRegisters {
            data_modul,
            bitrate: bitrate_word(self.bitrate_bps()),
            fdev: fdev_word(self.deviation_hz()),
            rx_bw,
            afc_bw: rx_bw,
            packet_config1: PACKET_CONFIG1_WHITE,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ModemProfile {
    fn format(&self, f: defmt::Formatter) {
        let g = if matches!(self.shaping(), Shaping::GaussianBt1_0) { "G" } else { "" };
        defmt::write!(
            f,
            "{}FSK {} bps / {} Hz",
            g,
            self.bitrate_bps(),
            self.deviation_hz()
        );
    }
}
