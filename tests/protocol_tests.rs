//! Serial Line Protocol Tests
//!
//! Tests for rendering report lines and parsing AVG lines back.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test protocol_tests

use rssi_meter::protocol::{AvgLine, SerialLine};
use rssi_meter::radio::stats::{AvgReport, RssiSummary};
use rssi_meter::types::{NodeAddress, Rssi};

fn report() -> AvgReport {
    AvgReport {
        at_ms: 123_456,
        duration_ms: 10_001,
        count: 86,
        summary: Some(RssiSummary {
            mean: -72.4,
            std_dev: 3.1,
            min: Rssi::from_dbm(-90),
            max: Rssi::from_dbm(-60),
        }),
    }
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_render_avg() {
    let line = SerialLine::Avg(report()).render();
    assert_eq!(
        line.as_str(),
        "AVG,ms=123456,dur_ms=10001,mean=-72.40,std=3.10,n=86,min=-90,max=-60"
    );
}

#[test]
fn test_render_avg_empty_window() {
    let line = SerialLine::Avg(AvgReport {
        at_ms: 20_000,
        duration_ms: 10_000,
        count: 0,
        summary: None,
    })
    .render();
    assert_eq!(line.as_str(), "AVG,ms=20000,dur_ms=10000,n=0");
}

#[test]
fn test_render_rx() {
    let line = SerialLine::Rx {
        at_ms: 500,
        rssi: Rssi::from_dbm(-71),
        from: NodeAddress::new(2),
        len: 18,
        seq: 41,
    }
    .render();
    assert_eq!(line.as_str(), "RX,ms=500,rssi=-71,from=2,len=18,seq=41");
}

#[test]
fn test_render_err() {
    let line = SerialLine::Err {
        at_ms: 7,
        reason: "checksum",
    }
    .render();
    assert_eq!(line.as_str(), "ERR,ms=7,reason=checksum");
}

#[test]
fn test_render_tx() {
    let line = SerialLine::Tx { at_ms: 1_000, seq: 3 }.render();
    assert_eq!(line.as_str(), "TX,ms=1000,seq=3");
}

#[test]
fn test_render_avg_extreme_values_not_truncated() {
    let line = SerialLine::Avg(AvgReport {
        at_ms: u64::MAX,
        duration_ms: u64::MAX,
        count: u32::MAX,
        summary: Some(RssiSummary {
            mean: -32768.0,
            std_dev: 32767.5,
            min: Rssi::from_dbm(i16::MIN),
            max: Rssi::from_dbm(i16::MIN),
        }),
    })
    .render();
    assert!(line.ends_with(",min=-32768,max=-32768"));

    let parsed = AvgLine::parse(&line).unwrap();
    assert_eq!(parsed.count, Some(i64::from(u32::MAX)));
    assert_eq!(parsed.min, Some(-32768));
    assert_eq!(parsed.max, Some(-32768));
}

// ============================================================================
// AVG Parsing
// ============================================================================

#[test]
fn test_parse_rendered_line() {
    let line = SerialLine::Avg(report()).render();
    let parsed = AvgLine::parse(&line).unwrap();
    assert_eq!(parsed.at_ms, Some(123_456));
    assert_eq!(parsed.duration_ms, Some(10_001));
    assert_eq!(parsed.count, Some(86));
    assert_eq!(parsed.min, Some(-90));
    assert_eq!(parsed.max, Some(-60));
    assert!((parsed.mean.unwrap() + 72.4).abs() < 1e-3);
    assert!((parsed.std_dev.unwrap() - 3.1).abs() < 1e-3);
}

#[test]
fn test_parse_empty_window_line() {
    let parsed = AvgLine::parse("AVG,ms=20000,dur_ms=10000,n=0").unwrap();
    assert_eq!(parsed.count, Some(0));
    assert_eq!(parsed.mean, None);
    assert_eq!(parsed.min, None);
}

#[test]
fn test_parse_ignores_surrounding_whitespace() {
    let parsed = AvgLine::parse("  AVG,ms=1,n=2\r\n").unwrap();
    assert_eq!(parsed.at_ms, Some(1));
    assert_eq!(parsed.count, Some(2));
}

#[test]
fn test_parse_skips_unknown_and_bare_fields() {
    let parsed = AvgLine::parse("AVG,ms=5,foo=bar,junk,n=3").unwrap();
    assert_eq!(parsed.at_ms, Some(5));
    assert_eq!(parsed.count, Some(3));
}

#[test]
fn test_parse_integer_field_accepts_decimal() {
    let parsed = AvgLine::parse("AVG,dur_ms=10000.7,min=-80.0").unwrap();
    assert_eq!(parsed.duration_ms, Some(10_000));
    assert_eq!(parsed.min, Some(-80));
}

#[test]
fn test_parse_bad_value_is_none() {
    let parsed = AvgLine::parse("AVG,ms=abc,mean=x").unwrap();
    assert_eq!(parsed.at_ms, None);
    assert_eq!(parsed.mean, None);
}

#[test]
fn test_parse_rejects_other_lines() {
    assert!(AvgLine::parse("RX,ms=500,rssi=-71").is_none());
    assert!(AvgLine::parse("AVG").is_none());
    assert!(AvgLine::parse("").is_none());
    assert!(AvgLine::parse("avg,ms=1").is_none());
}
