//! SPI Bus Abstractions
//!
//! Register access for the RFM69 over async SPI with a software chip
//! select. The top bit of the address byte selects write (1) or read (0).

use embassy_stm32::gpio::Output;
use embassy_stm32::mode::Async;
use embassy_stm32::spi::{Error as SpiError, Spi};

use crate::radio::registers::WRITE_MASK;

/// SPI operation result
pub type SpiResult<T> = Result<T, SpiError>;

/// Largest burst transfer (FIFO plus address byte)
const BURST_MAX: usize = 66;

/// SPI bus with a dedicated chip-select line
pub struct RadioSpi<'d> {
    spi: Spi<'d, Async>,
    cs: Output<'d>,
}

impl<'d> RadioSpi<'d> {
    /// Create the bus; chip select is driven inactive (high)
    #[must_use]
    pub fn new(spi: Spi<'d, Async>, mut cs: Output<'d>) -> Self {
        cs.set_high();
        Self { spi, cs }
    }

    async fn transaction(&mut self, buf: &mut [u8]) -> SpiResult<()> {
        self.cs.set_low();
        let result = self.spi.transfer_in_place(buf).await;
        self.cs.set_high();
        result
    }

    /// Read a single register
    pub async fn read_reg(&mut self, reg: u8) -> SpiResult<u8> {
        let mut buf = [reg & !WRITE_MASK, 0];
        self.transaction(&mut buf).await?;
        Ok(buf[1])
    }

    /// Write a single register
    pub async fn write_reg(&mut self, reg: u8, value: u8) -> SpiResult<()> {
        let mut buf = [reg | WRITE_MASK, value];
        self.transaction(&mut buf).await
    }

    /// Write consecutive registers starting at `reg`
    pub async fn write_burst(&mut self, reg: u8, values: &[u8]) -> SpiResult<()> {
        let len = values.len().min(BURST_MAX - 1);
        let mut buf = [0u8; BURST_MAX];
        buf[0] = reg | WRITE_MASK;
        buf[1..=len].copy_from_slice(&values[..len]);
        self.transaction(&mut buf[..=len]).await
    }

    /// Read consecutive registers starting at `reg` into `out`
    pub async fn read_burst(&mut self, reg: u8, out: &mut [u8]) -> SpiResult<()> {
        let len = out.len().min(BURST_MAX - 1);
        let mut buf = [0u8; BURST_MAX];
        buf[0] = reg & !WRITE_MASK;
        self.transaction(&mut buf[..=len]).await?;
        out[..len].copy_from_slice(&buf[1..=len]);
        Ok(())
    }
}
