//! User Interface
//!
//! Frame buffer and screen layouts for the 128x64 OLED. Rendering only
//! touches a [`DisplayBuffer`]; the display driver pushes it over I2C.

use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use heapless::String;

use crate::config::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::radio::meter::MeterScale;
use crate::radio::receiver::MeterView;
use crate::radio::transmitter::TxView;
use crate::types::{Frequency, Role};

const BUFFER_LEN: usize = (DISPLAY_WIDTH * DISPLAY_HEIGHT / 8) as usize;

/// Bar graph geometry
pub mod layout {
    /// Bar left edge
    pub const BAR_X: i32 = 4;
    /// Bar top edge
    pub const BAR_Y: i32 = 38;
    /// Bar width
    pub const BAR_WIDTH: u32 = 120;
    /// Bar height
    pub const BAR_HEIGHT: u32 = 10;
    /// Tick spacing in dB
    pub const TICK_DB: i16 = 10;
    /// Baseline row of the bottom status line
    pub const STATUS_Y: i32 = 54;
}

/// Display buffer (1 bit per pixel, SSD1306 page layout)
pub struct DisplayBuffer {
    buffer: [u8; BUFFER_LEN],
}

impl DisplayBuffer {
    /// Create a new empty display buffer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0; BUFFER_LEN],
        }
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.buffer.fill(0);
    }

    /// Set a pixel; out-of-range coordinates are ignored
    pub fn set_pixel(&mut self, x: u32, y: u32, on: bool) {
        if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            return;
        }

        let byte_idx = (y / 8 * DISPLAY_WIDTH + x) as usize;
        let bit = 1 << (y % 8);

        if on {
            self.buffer[byte_idx] |= bit;
        } else {
            self.buffer[byte_idx] &= !bit;
        }
    }

    /// Read a pixel; out-of-range coordinates read as off
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            return false;
        }
        let byte_idx = (y / 8 * DISPLAY_WIDTH + x) as usize;
        self.buffer[byte_idx] & (1 << (y % 8)) != 0
    }

    /// Number of lit pixels
    #[must_use]
    pub fn lit_pixels(&self) -> u32 {
        self.buffer.iter().map(|b| b.count_ones()).sum()
    }

    /// Get the raw buffer
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }
}

impl Default for DisplayBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawTarget for DisplayBuffer {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if let (Ok(x), Ok(y)) = (u32::try_from(coord.x), u32::try_from(coord.y)) {
                self.set_pixel(x, y, color.is_on());
            }
        }
        Ok(())
    }
}

impl OriginDimensions for DisplayBuffer {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }
}

fn small() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyle::new(&FONT_6X10, BinaryColor::On)
}

fn draw_small(buffer: &mut DisplayBuffer, text: &str, x: i32, y: i32) {
    let _ = Text::with_baseline(text, Point::new(x, y), small(), Baseline::Top).draw(buffer);
}

fn draw_centered(buffer: &mut DisplayBuffer, text: &str, y: i32, large: bool) {
    let font = if large { &FONT_10X20 } else { &FONT_6X10 };
    let style = MonoTextStyle::new(font, BinaryColor::On);
    let layout = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Top)
        .build();
    let _ = Text::with_text_style(text, Point::new(DISPLAY_WIDTH as i32 / 2, y), style, layout)
        .draw(buffer);
}

fn frequency_title(freq: Frequency, suffix: &str) -> String<24> {
    let mut s: String<24> = String::new();
    let mhz = freq.as_hz() / 1_000_000;
    let khz = (freq.as_hz() % 1_000_000) / 1000;
    core::fmt::write(&mut s, format_args!("{mhz}.{khz:03} MHz {suffix}")).ok();
    s
}

/// Bar outline, fill and 10 dB tick marks below the bar
pub fn render_bar(buffer: &mut DisplayBuffer, scale: &MeterScale, percent: u8) {
    use layout::{BAR_HEIGHT, BAR_WIDTH, BAR_X, BAR_Y, TICK_DB};

    let outline = Rectangle::new(Point::new(BAR_X, BAR_Y), Size::new(BAR_WIDTH, BAR_HEIGHT));
    let _ = outline
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(buffer);

    let fill = u32::from(percent.min(100)) * BAR_WIDTH / 100;
    if fill > 0 {
        let rect = Rectangle::new(Point::new(BAR_X, BAR_Y), Size::new(fill, BAR_HEIGHT));
        let _ = rect
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(buffer);
    }

    let span = i32::from(scale.ceiling() - scale.floor());
    let tick_y = BAR_Y + BAR_HEIGHT as i32;
    let mut dbm = scale.floor();
    while dbm <= scale.ceiling() {
        let offset = i32::from(dbm - scale.floor()) * (BAR_WIDTH as i32 - 1) / span;
        let x = BAR_X + offset;
        let _ = Line::new(Point::new(x, tick_y), Point::new(x, tick_y + 2))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(buffer);
        dbm += TICK_DB;
    }
}

/// Receiver screen: frequency, RSSI number and bar, or NO SIGNAL
pub fn render_meter_screen(buffer: &mut DisplayBuffer, view: &MeterView, scale: &MeterScale) {
    buffer.clear();

    draw_small(buffer, &frequency_title(view.frequency, "RX"), 0, 0);

    match view.rssi {
        Some(rssi) => {
            let mut s: String<12> = String::new();
            core::fmt::write(&mut s, format_args!("{} dBm", rssi.as_dbm())).ok();
            draw_centered(buffer, &s, 14, true);
            render_bar(buffer, scale, view.percent);
        }
        None => {
            draw_centered(buffer, "NO SIGNAL", 20, false);
            render_bar(buffer, scale, 0);
        }
    }

    let mut s: String<24> = String::new();
    core::fmt::write(
        &mut s,
        format_args!("pkt:{} err:{}", view.packets, view.errors),
    )
    .ok();
    draw_small(buffer, &s, 0, layout::STATUS_Y);
}

/// Transmitter screen: frequency, power and beacon counters
pub fn render_transmit_screen(buffer: &mut DisplayBuffer, view: &TxView) {
    buffer.clear();

    draw_small(buffer, &frequency_title(view.frequency, "TX"), 0, 0);

    let mut s: String<16> = String::new();
    match view.last_seq {
        Some(seq) => core::fmt::write(&mut s, format_args!("#{seq}")).ok(),
        None => core::fmt::write(&mut s, format_args!("--")).ok(),
    };
    draw_centered(buffer, &s, 14, true);

    let mut s: String<24> = String::new();
    core::fmt::write(&mut s, format_args!("{} dBm", view.power.dbm())).ok();
    draw_centered(buffer, &s, 38, false);

    let mut s: String<24> = String::new();
    core::fmt::write(
        &mut s,
        format_args!("sent:{} fail:{}", view.sent, view.failures),
    )
    .ok();
    draw_small(buffer, &s, 0, layout::STATUS_Y);
}

/// Splash shown while the radio is being configured
pub fn render_boot_screen(buffer: &mut DisplayBuffer, role: Role, freq: Frequency) {
    buffer.clear();

    let title = match role {
        Role::Receiver => "RSSI METER",
        Role::Transmitter => "BEACON",
    };
    draw_centered(buffer, title, 8, true);
    draw_centered(buffer, &frequency_title(freq, ""), 36, false);
    draw_centered(buffer, "starting radio", 50, false);
}

/// Shown when radio init fails; the loop does not start
pub fn render_fault_screen(buffer: &mut DisplayBuffer, reason: &str) {
    buffer.clear();
    draw_centered(buffer, "RADIO FAULT", 12, false);
    draw_centered(buffer, reason, 30, false);
}
