//! RFM69 Transceiver Driver
//!
//! Packet-mode driver for the HopeRF RFM69HCW over SPI. Register values come
//! from [`crate::radio::registers`]; framing and addressing from
//! [`crate::radio::packet`].
//!
//! The driver polls `RegIrqFlags2` instead of using DIO0, so only SPI, chip
//! select and reset are wired.

use embassy_stm32::gpio::Output;
use embassy_stm32::spi::Error as SpiError;
use embassy_time::{Duration, Timer};

use crate::config::{RadioConfig, RADIO_RESET_PULSE_US, RADIO_STARTUP_MS, RADIO_TIMEOUT_MS};
use crate::hal::spi::RadioSpi;
use crate::hal::timer::Timeout;
use crate::radio::packet::{Frame, FrameError, MAX_BODY_LEN, MAX_FRAME_LEN};
use crate::radio::receiver::Reception;
use crate::radio::registers::{
    boost_registers, defaults, dio, irq1, irq2, pa_level, reg, ModemProfile, OpMode, CHIP_VERSION,
};
use crate::types::{EncryptionKey, Frequency, NodeAddress, Rssi, TxPower};

/// Radio driver errors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rfm69Error {
    /// SPI transfer failed
    Spi(SpiError),
    /// `RegVersion` did not read 0x24 (module missing or miswired)
    VersionMismatch(u8),
    /// `ModeReady` never set
    ModeTimeout,
    /// `PacketSent` never set
    SendTimeout,
    /// Received frame was malformed
    Frame(FrameError),
    /// Frame does not fit the FIFO
    PayloadTooLong,
}

impl From<SpiError> for Rfm69Error {
    fn from(err: SpiError) -> Self {
        Self::Spi(err)
    }
}

impl From<FrameError> for Rfm69Error {
    fn from(err: FrameError) -> Self {
        Self::Frame(err)
    }
}

impl Rfm69Error {
    /// Short token used in `ERR` serial lines
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Spi(_) => "spi",
            Self::VersionMismatch(_) => "version",
            Self::ModeTimeout => "mode_timeout",
            Self::SendTimeout => "send_timeout",
            Self::Frame(err) => err.reason(),
            Self::PayloadTooLong => "too_long",
        }
    }
}

impl defmt::Format for Rfm69Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Spi(_) => defmt::write!(f, "Spi"),
            Self::VersionMismatch(v) => defmt::write!(f, "VersionMismatch(0x{:02X})", v),
            Self::ModeTimeout => defmt::write!(f, "ModeTimeout"),
            Self::SendTimeout => defmt::write!(f, "SendTimeout"),
            Self::Frame(err) => defmt::write!(f, "Frame({})", err),
            Self::PayloadTooLong => defmt::write!(f, "PayloadTooLong"),
        }
    }
}

/// Driver result
pub type Rfm69Result<T> = Result<T, Rfm69Error>;

/// RFM69 transceiver
pub struct Rfm69<'d> {
    spi: RadioSpi<'d>,
    reset: Output<'d>,
    mode: Option<OpMode>,
    power: TxPower,
    address: NodeAddress,
    promiscuous: bool,
}

impl<'d> Rfm69<'d> {
    /// Wrap the SPI bus and reset line; call [`Self::reset`] then [`Self::init`]
    #[must_use]
    pub fn new(spi: RadioSpi<'d>, reset: Output<'d>, power: TxPower) -> Self {
        Self {
            spi,
            reset,
            mode: None,
            power,
            address: NodeAddress::BROADCAST,
            promiscuous: true,
        }
    }

    /// Pulse the reset line (active high) and wait for the chip to start
    pub async fn reset(&mut self) {
        self.reset.set_high();
        Timer::after(Duration::from_micros(RADIO_RESET_PULSE_US)).await;
        self.reset.set_low();
        Timer::after(Duration::from_millis(RADIO_STARTUP_MS)).await;
        self.mode = None;
    }

    /// Verify the chip and write the fixed start-up settings
    pub async fn init(&mut self) -> Rfm69Result<()> {
        let version = self.spi.read_reg(reg::VERSION).await?;
        if version != CHIP_VERSION {
            return Err(Rfm69Error::VersionMismatch(version));
        }

        self.set_mode(OpMode::Standby).await?;

        self.spi.write_reg(reg::FIFO_THRESH, defaults::FIFO_THRESH).await?;
        self.spi.write_reg(reg::TEST_DAGC, defaults::TEST_DAGC).await?;
        self.spi.write_reg(reg::SYNC_CONFIG, defaults::SYNC_CONFIG).await?;
        self.spi
            .write_burst(reg::SYNC_VALUE1, &defaults::SYNC_WORDS)
            .await?;
        let [msb, lsb] = defaults::PREAMBLE_LEN.to_be_bytes();
        self.spi.write_reg(reg::PREAMBLE_MSB, msb).await?;
        self.spi.write_reg(reg::PREAMBLE_LSB, lsb).await?;
        self.spi
            .write_reg(reg::PAYLOAD_LENGTH, defaults::PAYLOAD_LENGTH)
            .await?;
        Ok(())
    }

    /// Apply a full configuration and leave the radio in standby
    pub async fn configure(&mut self, config: &RadioConfig) -> Rfm69Result<()> {
        self.set_modem_profile(config.profile).await?;
        self.set_frequency(config.frequency).await?;
        self.set_tx_power(config.power).await?;
        self.set_encryption_key(config.key.as_ref()).await?;
        self.set_address(config.address, config.promiscuous).await?;
        self.set_mode(OpMode::Standby).await
    }

    /// Program the carrier frequency
    pub async fn set_frequency(&mut self, freq: Frequency) -> Rfm69Result<()> {
        let [_, msb, mid, lsb] = freq.frf().to_be_bytes();
        self.spi.write_burst(reg::FRF_MSB, &[msb, mid, lsb]).await?;
        Ok(())
    }

    /// Program the PA path and output level
    pub async fn set_tx_power(&mut self, power: TxPower) -> Rfm69Result<()> {
        self.power = power;
        self.spi.write_reg(reg::PA_LEVEL, pa_level(power)).await?;
        Ok(())
    }

    /// Program bit rate, deviation, bandwidth and packet format
    pub async fn set_modem_profile(&mut self, profile: ModemProfile) -> Rfm69Result<()> {
        for (addr, value) in profile.registers().writes() {
            self.spi.write_reg(addr, value).await?;
        }
        Ok(())
    }

    /// Load the AES key, or disable encryption with `None`
    pub async fn set_encryption_key(&mut self, key: Option<&EncryptionKey>) -> Rfm69Result<()> {
        self.set_mode(OpMode::Standby).await?;
        let config2 = match key {
            Some(key) => {
                self.spi.write_burst(reg::AES_KEY1, key.as_bytes()).await?;
                defaults::PACKET_CONFIG2_AES
            }
            None => defaults::PACKET_CONFIG2_PLAIN,
        };
        self.spi.write_reg(reg::PACKET_CONFIG2, config2).await?;
        Ok(())
    }

    /// Set this node's address; filtering happens in software
    pub async fn set_address(&mut self, address: NodeAddress, promiscuous: bool) -> Rfm69Result<()> {
        self.address = address;
        self.promiscuous = promiscuous;
        self.spi.write_reg(reg::NODE_ADRS, address.raw()).await?;
        self.spi
            .write_reg(reg::BROADCAST_ADRS, NodeAddress::BROADCAST.raw())
            .await?;
        Ok(())
    }

    /// Switch operating mode and wait for `ModeReady`
    ///
    /// The +20 dBm boost registers are set on entering TX and cleared on
    /// every other mode.
    pub async fn set_mode(&mut self, mode: OpMode) -> Rfm69Result<()> {
        if self.mode == Some(mode) {
            return Ok(());
        }

        for (addr, value) in boost_registers(self.power, mode) {
            self.spi.write_reg(addr, value).await?;
        }
        match mode {
            OpMode::Rx => self.spi.write_reg(reg::DIO_MAPPING1, dio::RX_PAYLOAD_READY).await?,
            OpMode::Tx => self.spi.write_reg(reg::DIO_MAPPING1, dio::TX_PACKET_SENT).await?,
            _ => {}
        }
        self.spi.write_reg(reg::OP_MODE, mode.as_reg()).await?;

        let timeout = Timeout::from_ms(RADIO_TIMEOUT_MS);
        while self.spi.read_reg(reg::IRQ_FLAGS1).await? & irq1::MODE_READY == 0 {
            if timeout.expired() {
                self.mode = None;
                return Err(Rfm69Error::ModeTimeout);
            }
            timeout.pause().await;
        }

        self.mode = Some(mode);
        Ok(())
    }

    /// Current mode, if known
    #[must_use]
    pub const fn mode(&self) -> Option<OpMode> {
        self.mode
    }

    /// Enter receive mode
    pub async fn start_receive(&mut self) -> Rfm69Result<()> {
        self.set_mode(OpMode::Rx).await
    }

    /// True if a received frame waits in the FIFO
    pub async fn available(&mut self) -> Rfm69Result<bool> {
        if self.mode != Some(OpMode::Rx) {
            defmt::warn!("RFM69 not in RX ({}), re-entering", self.mode);
            self.set_mode(OpMode::Rx).await?;
            return Ok(false);
        }
        let flags = self.spi.read_reg(reg::IRQ_FLAGS2).await?;
        Ok(flags & irq2::PAYLOAD_READY != 0)
    }

    /// Read the pending frame and its RSSI, then resume receiving
    ///
    /// Malformed frames come back as [`Rfm69Error::Frame`].
    pub async fn receive(&mut self) -> Rfm69Result<Reception> {
        let rssi = Rssi::from_register(self.spi.read_reg(reg::RSSI_VALUE).await?);
        let flags = self.spi.read_reg(reg::IRQ_FLAGS2).await?;

        self.set_mode(OpMode::Standby).await?;
        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = self.spi.read_reg(reg::FIFO).await?;
        buf[0] = len;
        let body = usize::from(len).min(MAX_BODY_LEN);
        self.spi.read_burst(reg::FIFO, &mut buf[1..=body]).await?;
        self.set_mode(OpMode::Rx).await?;

        if flags & irq2::CRC_OK == 0 {
            return Err(FrameError::Crc.into());
        }
        let frame = Frame::decode(&buf[..=body], self.address, self.promiscuous)?;
        Ok(Reception { frame, rssi })
    }

    /// Transmit a frame and wait for `PacketSent`; returns to standby
    pub async fn send(&mut self, frame: &Frame) -> Rfm69Result<()> {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = frame
            .encode(&mut buf)
            .map_err(|_| Rfm69Error::PayloadTooLong)?;

        self.set_mode(OpMode::Standby).await?;
        self.spi.write_burst(reg::FIFO, &buf[..len]).await?;
        self.set_mode(OpMode::Tx).await?;

        let timeout = Timeout::from_ms(RADIO_TIMEOUT_MS);
        while self.spi.read_reg(reg::IRQ_FLAGS2).await? & irq2::PACKET_SENT == 0 {
            if timeout.expired() {
                self.set_mode(OpMode::Standby).await?;
                return Err(Rfm69Error::SendTimeout);
            }
            timeout.pause().await;
        }

        self.set_mode(OpMode::Standby).await
    }
}
