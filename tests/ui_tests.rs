//! Display Rendering Tests
//!
//! Tests for the frame buffer and the receiver, transmitter, boot and fault
//! screens.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test ui_tests

use rssi_meter::radio::meter::MeterScale;
use rssi_meter::radio::receiver::MeterView;
use rssi_meter::radio::transmitter::TxView;
use rssi_meter::types::{Frequency, PowerAmp, Role, Rssi, TxPower};
use rssi_meter::ui::{
    layout, render_bar, render_boot_screen, render_fault_screen, render_meter_screen,
    render_transmit_screen, DisplayBuffer,
};

fn freq() -> Frequency {
    Frequency::from_hz(915_000_000).unwrap()
}

fn meter_view(rssi: Option<i16>) -> MeterView {
    let scale = MeterScale::DEFAULT;
    let rssi = rssi.map(Rssi::from_dbm);
    MeterView {
        frequency: freq(),
        rssi,
        percent: rssi.map_or(0, |r| scale.percent(r)),
        packets: 12,
        errors: 1,
        last_seq: Some(11),
    }
}

/// Lit pixels on the middle row of the bar
fn bar_fill(buffer: &DisplayBuffer) -> u32 {
    let y = (layout::BAR_Y + layout::BAR_HEIGHT as i32 / 2) as u32;
    let start = layout::BAR_X as u32 + 1;
    let end = layout::BAR_X as u32 + layout::BAR_WIDTH - 1;
    (start..end).filter(|&x| buffer.pixel(x, y)).count() as u32
}

// ============================================================================
// Frame Buffer
// ============================================================================

#[test]
fn test_buffer_starts_blank() {
    let buffer = DisplayBuffer::new();
    assert_eq!(buffer.as_bytes().len(), 1024);
    assert_eq!(buffer.lit_pixels(), 0);
}

#[test]
fn test_set_and_read_pixel() {
    let mut buffer = DisplayBuffer::new();
    buffer.set_pixel(5, 9, true);
    assert!(buffer.pixel(5, 9));
    // Page 1, column 5, bit 1
    assert_eq!(buffer.as_bytes()[128 + 5], 0x02);

    buffer.set_pixel(5, 9, false);
    assert!(!buffer.pixel(5, 9));
    assert_eq!(buffer.lit_pixels(), 0);
}

#[test]
fn test_out_of_range_pixels_ignored() {
    let mut buffer = DisplayBuffer::new();
    buffer.set_pixel(128, 0, true);
    buffer.set_pixel(0, 64, true);
    assert_eq!(buffer.lit_pixels(), 0);
    assert!(!buffer.pixel(500, 500));
}

#[test]
fn test_clear() {
    let mut buffer = DisplayBuffer::new();
    buffer.set_pixel(0, 0, true);
    buffer.set_pixel(127, 63, true);
    assert_eq!(buffer.lit_pixels(), 2);
    buffer.clear();
    assert_eq!(buffer.lit_pixels(), 0);
}

// ============================================================================
// Bar Graph
// ============================================================================

#[test]
fn test_bar_empty_draws_outline_only() {
    let mut buffer = DisplayBuffer::new();
    render_bar(&mut buffer, &MeterScale::DEFAULT, 0);
    assert!(buffer.pixel(layout::BAR_X as u32, layout::BAR_Y as u32));
    assert_eq!(bar_fill(&buffer), 0);
}

#[test]
fn test_bar_fill_grows_with_percent() {
    let mut low = DisplayBuffer::new();
    render_bar(&mut low, &MeterScale::DEFAULT, 25);
    let mut high = DisplayBuffer::new();
    render_bar(&mut high, &MeterScale::DEFAULT, 75);
    let mut full = DisplayBuffer::new();
    render_bar(&mut full, &MeterScale::DEFAULT, 100);

    assert!(bar_fill(&low) > 0);
    assert!(bar_fill(&high) > bar_fill(&low));
    assert_eq!(bar_fill(&full), layout::BAR_WIDTH - 2);
}

#[test]
fn test_bar_has_ticks_below() {
    let mut buffer = DisplayBuffer::new();
    render_bar(&mut buffer, &MeterScale::DEFAULT, 0);
    let tick_y = (layout::BAR_Y as u32) + layout::BAR_HEIGHT + 1;
    let ticks = (0..128).filter(|&x| buffer.pixel(x, tick_y)).count();
    // -100..=-30 in 10 dB steps
    assert_eq!(ticks, 8);
}

// ============================================================================
// Screens
// ============================================================================

#[test]
fn test_meter_screen_with_signal() {
    let mut buffer = DisplayBuffer::new();
    render_meter_screen(&mut buffer, &meter_view(Some(-60)), &MeterScale::DEFAULT);
    assert!(buffer.lit_pixels() > 0);
    assert!(bar_fill(&buffer) > 0);
}

#[test]
fn test_meter_screen_no_signal() {
    let mut buffer = DisplayBuffer::new();
    render_meter_screen(&mut buffer, &meter_view(None), &MeterScale::DEFAULT);
    assert!(buffer.lit_pixels() > 0);
    assert_eq!(bar_fill(&buffer), 0);
}

#[test]
fn test_meter_screen_changes_with_rssi() {
    let mut weak = DisplayBuffer::new();
    render_meter_screen(&mut weak, &meter_view(Some(-90)), &MeterScale::DEFAULT);
    let mut strong = DisplayBuffer::new();
    render_meter_screen(&mut strong, &meter_view(Some(-40)), &MeterScale::DEFAULT);
    assert_ne!(weak.as_bytes(), strong.as_bytes());
    assert!(bar_fill(&strong) > bar_fill(&weak));
}

#[test]
fn test_meter_screen_redraw_replaces_contents() {
    let mut buffer = DisplayBuffer::new();
    render_meter_screen(&mut buffer, &meter_view(Some(-40)), &MeterScale::DEFAULT);
    render_meter_screen(&mut buffer, &meter_view(None), &MeterScale::DEFAULT);

    let mut fresh = DisplayBuffer::new();
    render_meter_screen(&mut fresh, &meter_view(None), &MeterScale::DEFAULT);
    assert_eq!(buffer.as_bytes(), fresh.as_bytes());
}

#[test]
fn test_transmit_screen() {
    let view = TxView {
        frequency: freq(),
        power: TxPower::new(20, PowerAmp::HighPower),
        sent: 4,
        failures: 0,
        last_seq: Some(3),
    };
    let mut buffer = DisplayBuffer::new();
    render_transmit_screen(&mut buffer, &view);
    assert!(buffer.lit_pixels() > 0);

    let idle = TxView {
        last_seq: None,
        ..view
    };
    let mut before = DisplayBuffer::new();
    render_transmit_screen(&mut before, &idle);
    assert_ne!(buffer.as_bytes(), before.as_bytes());
}

#[test]
fn test_boot_screen_differs_by_role() {
    let mut rx = DisplayBuffer::new();
    render_boot_screen(&mut rx, Role::Receiver, freq());
    let mut tx = DisplayBuffer::new();
    render_boot_screen(&mut tx, Role::Transmitter, freq());
    assert!(rx.lit_pixels() > 0);
    assert_ne!(rx.as_bytes(), tx.as_bytes());
}

#[test]
fn test_fault_screen() {
    let mut buffer = DisplayBuffer::new();
    render_fault_screen(&mut buffer, "version");
    assert!(buffer.lit_pixels() > 0);
}
