//! RFM69 Register Tests
//!
//! Tests for operating modes, PA level encoding, boost sequencing and modem
//! profile expansion.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test registers_tests

use rssi_meter::radio::registers::{
    bitrate_word, boost, boost_registers, fdev_word, pa, pa_level, packet1, reg, ModemProfile, OpMode,
    Shaping, PACKET_CONFIG1_WHITE,
};
use rssi_meter::types::{PowerAmp, TxPower};

// =============================================================================
// Operating Modes
// =============================================================================

#[test]
fn test_op_mode_register_values() {
    assert_eq!(OpMode::Sleep.as_reg(), 0x00);
    assert_eq!(OpMode::Standby.as_reg(), 0x04);
    assert_eq!(OpMode::FrequencySynth.as_reg(), 0x08);
    assert_eq!(OpMode::Tx.as_reg(), 0x0C);
    assert_eq!(OpMode::Rx.as_reg(), 0x10);
}

#[test]
fn test_op_mode_decode_ignores_other_bits() {
    assert_eq!(OpMode::from_reg(0x90), Some(OpMode::Rx));
    assert_eq!(OpMode::from_reg(0x04 | 0x40), Some(OpMode::Standby));
    assert_eq!(OpMode::from_reg(0x14), None);
}

// =============================================================================
// PA Level
// =============================================================================

#[test]
fn test_pa_level_high_power_boosted() {
    let level = pa_level(TxPower::new(20, PowerAmp::HighPower));
    assert_eq!(level, pa::PA1_ON | pa::PA2_ON | 0x1F);
    let level = pa_level(TxPower::new(18, PowerAmp::HighPower));
    assert_eq!(level, pa::PA1_ON | pa::PA2_ON | 29);
}

#[test]
fn test_pa_level_high_power_pa1_pa2() {
    let level = pa_level(TxPower::new(14, PowerAmp::HighPower));
    assert_eq!(level, 0x7C);
    let level = pa_level(TxPower::new(17, PowerAmp::HighPower));
    assert_eq!(level, 0x7F);
}

#[test]
fn test_pa_level_high_power_pa1_only() {
    assert_eq!(pa_level(TxPower::new(13, PowerAmp::HighPower)), 0x5F);
    assert_eq!(pa_level(TxPower::new(-2, PowerAmp::HighPower)), 0x50);
}

#[test]
fn test_pa_level_standard_uses_pa0() {
    assert_eq!(pa_level(TxPower::new(13, PowerAmp::Standard)), 0x9F);
    assert_eq!(pa_level(TxPower::new(-18, PowerAmp::Standard)), 0x80);
}

// =============================================================================
// Boost Registers
// =============================================================================

#[test]
fn test_boost_only_in_tx() {
    let power = TxPower::new(20, PowerAmp::HighPower);
    let tx = boost_registers(power, OpMode::Tx);
    assert_eq!(tx[0], (reg::OCP, boost::OCP_OFF));
    assert_eq!(tx[1], (reg::TEST_PA1, boost::TEST_PA1_BOOST));
    assert_eq!(tx[2], (reg::TEST_PA2, boost::TEST_PA2_BOOST));

    let rx = boost_registers(power, OpMode::Rx);
    assert_eq!(rx[0], (reg::OCP, boost::OCP_ON));
    assert_eq!(rx[1], (reg::TEST_PA1, boost::TEST_PA1_NORMAL));
    assert_eq!(rx[2], (reg::TEST_PA2, boost::TEST_PA2_NORMAL));
}

#[test]
fn test_no_boost_below_18_dbm() {
    let power = TxPower::new(17, PowerAmp::HighPower);
    let tx = boost_registers(power, OpMode::Tx);
    assert_eq!(tx[1], (reg::TEST_PA1, boost::TEST_PA1_NORMAL));
    assert_eq!(tx[0], (reg::OCP, boost::OCP_ON));
}

// =============================================================================
// Modem Profiles
// =============================================================================

#[test]
fn test_bitrate_words() {
    assert_eq!(bitrate_word(250_000), 0x0080);
    assert_eq!(bitrate_word(125_000), 0x0100);
    assert_eq!(bitrate_word(2_400), 0x3415);
}

#[test]
fn test_fdev_words() {
    assert_eq!(fdev_word(250_000), 0x1000);
    assert_eq!(fdev_word(125_000), 0x0800);
    assert_eq!(fdev_word(4_800), 0x004E);
}

#[test]
fn test_gfsk_250k_profile() {
    let profile = ModemProfile::GfskRb250Fd250;
    assert_eq!(profile.bitrate_bps(), 250_000);
    assert_eq!(profile.deviation_hz(), 250_000);
    assert_eq!(profile.shaping(), Shaping::GaussianBt1_0);

    let regs = profile.registers();
    assert_eq!(regs.data_modul, 0x01);
    assert_eq!(regs.bitrate, 0x0080);
    assert_eq!(regs.fdev, 0x1000);
    assert_eq!(regs.rx_bw, 0xE0);
    assert_eq!(regs.afc_bw, regs.rx_bw);
    assert_eq!(regs.packet_config1, PACKET_CONFIG1_WHITE);
}

#[test]
fn test_fsk_profile_has_no_shaping() {
    let regs = ModemProfile::FskRb2_4Fd4_8.registers();
    assert_eq!(regs.data_modul, 0x00);
    assert_eq!(regs.rx_bw, 0xF4);
}

#[test]
fn test_register_write_order() {
    let writes = ModemProfile::GfskRb250Fd250.registers().writes();
    assert_eq!(writes[0], (reg::DATA_MODUL, 0x01));
    assert_eq!(writes[1], (reg::BITRATE_MSB, 0x00));
    assert_eq!(writes[2], (reg::BITRATE_LSB, 0x80));
    assert_eq!(writes[3], (reg::FDEV_MSB, 0x10));
    assert_eq!(writes[4], (reg::FDEV_LSB, 0x00));
    assert_eq!(writes[7], (reg::PACKET_CONFIG1, 0xD8));
}

#[test]
fn test_packet_config_variable_length_whitening_crc() {
    assert_eq!(PACKET_CONFIG1_WHITE & 0x80, 0x80);
    assert_eq!(PACKET_CONFIG1_WHITE & 0x60, 0x40);
    assert_eq!(PACKET_CONFIG1_WHITE & 0x10, 0x10);
}

#[test]
fn test_crc_failed_frames_reach_the_fifo() {
    // A corrupted frame still raises PayloadReady, with CrcOk clear
    for profile in [
        ModemProfile::GfskRb250Fd250,
        ModemProfile::FskRb2_4Fd4_8,
        ModemProfile::GfskRb38_4Fd76_8,
    ] {
        let config1 = profile.registers().packet_config1;
        assert_eq!(config1 & packet1::CRC_AUTO_CLEAR_OFF, 0x08);
        assert_eq!(config1 & packet1::CRC_ON, 0x10);
    }
}
