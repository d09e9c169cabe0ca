//! OLED Display Driver
//!
//! SSD1306 128x64 over I2C. Drawing happens in a [`DisplayBuffer`]; this
//! driver only initializes the controller and pushes the buffer.

use crate::hal::i2c::{I2cAddress, I2cBus, I2cResult};
use crate::ui::DisplayBuffer;
use embassy_stm32::i2c::I2c;
use embassy_stm32::mode::Async;

/// SSD1306 commands
mod cmd {
    pub const SET_CONTRAST: u8 = 0x81;
    pub const DISPLAY_ALL_ON_RESUME: u8 = 0xA4;
    pub const NORMAL_DISPLAY: u8 = 0xA6;
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    pub const SET_COM_PINS: u8 = 0xDA;
    pub const SET_VCOM_DETECT: u8 = 0xDB;
    pub const SET_DISPLAY_CLOCK_DIV: u8 = 0xD5;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_MULTIPLEX: u8 = 0xA8;
    pub const SET_START_LINE: u8 = 0x40;
    pub const MEMORY_MODE: u8 = 0x20;
    pub const COLUMN_ADDR: u8 = 0x21;
    pub const PAGE_ADDR: u8 = 0x22;
    pub const COM_SCAN_DEC: u8 = 0xC8;
    pub const SEG_REMAP: u8 = 0xA0;
    pub const CHARGE_PUMP: u8 = 0x8D;
}

/// Control byte prefixes
const CONTROL_COMMAND: u8 = 0x00;
const CONTROL_DATA: u8 = 0x40;

/// OLED display driver
pub struct Display<'d> {
    bus: I2cBus<'d>,
    buffer: DisplayBuffer,
}

impl<'d> Display<'d> {
    /// Create a new display driver
    #[must_use]
    pub fn new(i2c: I2c<'d, Async>) -> Self {
        Self {
            bus: I2cBus::new(i2c),
            buffer: DisplayBuffer::new(),
        }
    }

    /// True if the controller acknowledges its address
    pub async fn is_present(&mut self) -> bool {
        self.bus.ping(I2cAddress::SSD1306).await
    }

    /// Initialize the controller and blank the panel
    pub async fn init(&mut self) -> I2cResult<()> {
        let init_cmds = [
            CONTROL_COMMAND,
            cmd::DISPLAY_OFF,
            cmd::SET_DISPLAY_CLOCK_DIV,
            0x80,
            cmd::SET_MULTIPLEX,
            0x3F, // 64 lines
            cmd::SET_DISPLAY_OFFSET,
            0x00,
            cmd::SET_START_LINE,
            cmd::CHARGE_PUMP,
            0x14, // internal charge pump
            cmd::MEMORY_MODE,
            0x00, // horizontal addressing
            cmd::SEG_REMAP | 0x01,
            cmd::COM_SCAN_DEC,
            cmd::SET_COM_PINS,
            0x12,
            cmd::SET_CONTRAST,
            0xCF,
            cmd::SET_PRECHARGE,
            0xF1,
            cmd::SET_VCOM_DETECT,
            0x40,
            cmd::DISPLAY_ALL_ON_RESUME,
            cmd::NORMAL_DISPLAY,
            cmd::DISPLAY_ON,
        ];
        self.bus.write(I2cAddress::SSD1306, &init_cmds).await?;

        self.buffer.clear();
        self.flush().await
    }

    /// Push the whole buffer to the panel
    pub async fn flush(&mut self) -> I2cResult<()> {
        self.bus
            .write(
                I2cAddress::SSD1306,
                &[CONTROL_COMMAND, cmd::COLUMN_ADDR, 0, 127, cmd::PAGE_ADDR, 0, 7],
            )
            .await?;

        // Chunked to stay within the controller's I2C burst
        let data = self.buffer.as_bytes();
        for chunk in data.chunks(32) {
            let mut buf = [0u8; 33];
            buf[0] = CONTROL_DATA;
            buf[1..=chunk.len()].copy_from_slice(chunk);
            self.bus
                .write(I2cAddress::SSD1306, &buf[..=chunk.len()])
                .await?;
        }

        Ok(())
    }

    /// Get mutable access to the buffer for drawing
    #[must_use]
    pub fn buffer_mut(&mut self) -> &mut DisplayBuffer {
        &mut self.buffer
    }
}
