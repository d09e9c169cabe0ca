//! Configuration and Constants Tests
//!
//! Tests to verify configuration values are valid and consistent.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test config_tests

use rssi_meter::config::*;
use rssi_meter::radio::registers::ModemProfile;
use rssi_meter::types::{PowerAmp, Role};

// =============================================================================
// Radio Constants
// =============================================================================

#[test]
fn rf_frequency_is_915_mhz() {
    assert_eq!(RF_FREQUENCY_HZ, 915_000_000);
    assert_eq!(DEFAULT_FREQUENCY.as_hz(), RF_FREQUENCY_HZ);
}

#[test]
fn tx_power_is_module_maximum() {
    assert_eq!(TX_POWER_DBM, 20);
    assert_eq!(POWER_AMP, PowerAmp::HighPower);
    assert_eq!(POWER_AMP.max_dbm(), TX_POWER_DBM);
}

#[test]
fn modem_profile_is_gfsk_250k() {
    assert_eq!(MODEM_PROFILE, ModemProfile::GfskRb250Fd250);
}

#[test]
fn encryption_key_is_sixteen_bytes() {
    assert_eq!(ENCRYPTION_KEY.len(), 16);
}

#[test]
fn node_is_not_broadcast() {
    assert_ne!(NODE_ADDRESS, 0xFF);
}

#[test]
fn radio_buffer_holds_a_frame() {
    assert!(RADIO_BUFFER_SIZE >= rssi_meter::radio::packet::MAX_BODY_LEN);
}

#[test]
fn default_role_is_receiver() {
    assert_eq!(ROLE, Role::Receiver);
}

// =============================================================================
// Meter and Timing Constants
// =============================================================================

#[test]
fn rssi_scale_is_ordered() {
    assert!(RSSI_FLOOR_DBM < RSSI_CEILING_DBM);
    assert_eq!(RSSI_FLOOR_DBM, -100);
    assert_eq!(RSSI_CEILING_DBM, -30);
}

#[test]
fn averaging_window_is_ten_seconds() {
    assert_eq!(AVG_WINDOW_MS, 10_000);
}

#[test]
fn error_pulse_shorter_than_stale_timeout() {
    assert!(ERROR_PULSE_MS < SIGNAL_STALE_MS);
}

#[test]
fn stale_timeout_covers_several_beacons() {
    assert!(SIGNAL_STALE_MS >= 2 * TX_INTERVAL_MS);
}

#[test]
fn poll_interval_faster_than_blink() {
    assert!(POLL_INTERVAL_MS < TX_BLINK_MS);
    assert!(POLL_INTERVAL_MS < ERROR_PULSE_MS);
}

#[test]
fn interlock_takes_more_than_one_sample() {
    assert!(INTERLOCK_SAMPLES > 1);
    assert!(u64::from(INTERLOCK_SAMPLES) * INTERLOCK_SAMPLE_MS < 1_000);
}

// =============================================================================
// Bus and Serial Constants
// =============================================================================

#[test]
fn display_address_and_geometry() {
    assert_eq!(DISPLAY_I2C_ADDR, 0x3C);
    assert_eq!(DISPLAY_WIDTH, 128);
    assert_eq!(DISPLAY_HEIGHT, 64);
}

#[test]
fn bus_speeds() {
    assert_eq!(I2C_FREQUENCY_HZ, 400_000);
    assert_eq!(SPI_FREQUENCY_HZ, 1_000_000);
    assert_eq!(SERIAL_BAUD, 115_200);
}

#[test]
fn serial_line_fits_longest_report() {
    let longest = "AVG,ms=18446744073709551615,dur_ms=18446744073709551615,mean=-32768.00,std=32767.50,n=4294967295,min=-32768,max=-32768";
    assert!(longest.len() <= SERIAL_LINE_SIZE);
}

#[test]
fn radio_poll_failure_limit() {
    assert!(RADIO_MAX_POLL_FAILURES > 1);
    // Gives up well within a second of polling
    assert!(u64::from(RADIO_MAX_POLL_FAILURES) * POLL_INTERVAL_MS < 1_000);
}

// =============================================================================
// RadioConfig
// =============================================================================

#[test]
fn radio_config_from_constants() {
    let config = RadioConfig::from_constants().unwrap();
    assert_eq!(config.frequency.as_hz(), 915_000_000);
    assert_eq!(config.power.dbm(), 20);
    assert!(config.key.is_some());
    assert_eq!(config.address.raw(), NODE_ADDRESS);
    assert_eq!(config.destination.raw(), DESTINATION_ADDRESS);
    assert!(config.validate().is_ok());
}

#[test]
fn radio_config_rejects_out_of_band_frequency() {
    let err = RadioConfig::from_parts(
        700_000_000,
        20,
        PowerAmp::HighPower,
        MODEM_PROFILE,
        None,
        1,
        2,
    )
    .unwrap_err();
    assert_eq!(err, ConfigError::InvalidFrequency(700_000_000));
}

#[test]
fn radio_config_rejects_bad_key() {
    let err = RadioConfig::from_parts(
        915_000_000,
        20,
        PowerAmp::HighPower,
        MODEM_PROFILE,
        Some("tooShort"),
        1,
        2,
    )
    .unwrap_err();
    assert_eq!(err, ConfigError::InvalidKeyLength(8));
}

#[test]
fn radio_config_rejects_broadcast_node() {
    let err = RadioConfig::from_parts(
        915_000_000,
        20,
        PowerAmp::HighPower,
        MODEM_PROFILE,
        None,
        0xFF,
        2,
    )
    .unwrap_err();
    assert_eq!(err, ConfigError::BroadcastNodeAddress);
}

#[test]
fn radio_config_clamps_power() {
    let config = RadioConfig::from_parts(
        868_000_000,
        30,
        PowerAmp::Standard,
        MODEM_PROFILE,
        None,
        1,
        2,
    )
    .unwrap();
    assert_eq!(config.power.dbm(), 13);
    assert!(config.key.is_none());
}

#[test]
fn config_error_display() {
    let text = format!("{}", ConfigError::InvalidKeyLength(3));
    assert!(text.contains('3'));
}

#[test]
fn button_debounce_spans_several_polls() {
    assert_eq!(BUTTON_DEBOUNCE_MS % POLL_INTERVAL_MS, 0);
    assert!(BUTTON_DEBOUNCE_MS / POLL_INTERVAL_MS >= 2);
}
