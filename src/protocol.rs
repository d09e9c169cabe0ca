//! Serial Line Protocol
//!
//! Text lines written to the USB serial port. Each line starts with a tag
//! followed by comma-separated `key=value` fields:
//!
//! ```text
//! AVG,ms=123456,dur_ms=10001,mean=-72.40,std=3.10,n=86,min=-90,max=-60
//! RX,ms=123456,rssi=-71,from=2,len=18,seq=41
//! ERR,ms=123456,reason=checksum
//! TX,ms=123456,seq=41
//! ```
//!
//! `AVG` lines are the ones logged on the host; [`AvgLine::parse`] accepts
//! them with the same leniency as the host logger.

use core::fmt::Write;

use heapless::String;

use crate::config::SERIAL_LINE_SIZE;
use crate::radio::stats::AvgReport;
use crate::types::{Millis, NodeAddress, Rssi};

/// Formatted line (without terminator)
pub type Line = String<SERIAL_LINE_SIZE>;

/// Tag that starts every statistics line
pub const AVG_TAG: &str = "AVG,";

/// One report line
#[derive(Clone, Debug, PartialEq)]
pub enum SerialLine {
    /// Window statistics
    Avg(AvgReport),
    /// Valid frame received
    Rx {
        /// Uptime
        at_ms: Millis,
        /// Signal strength
        rssi: Rssi,
        /// Sender
        from: NodeAddress,
        /// Payload length
        len: usize,
        /// Beacon sequence number
        seq: u32,
    },
    /// Malformed frame or radio fault
    Err {
        /// Uptime
        at_ms: Millis,
        /// Short reason token
        reason: &'static str,
    },
    /// Beacon sent
    Tx {
        /// Uptime
        at_ms: Millis,
        /// Beacon sequence number
        seq: u32,
    },
}

impl SerialLine {
    /// Render the line
    ///
    /// [`Line`] is sized for every field at its extreme, so the write
    /// cannot overflow.
    #[must_use]
    pub fn render(&self) -> Line {
        let mut s = Line::new();
        let written = match self {
            Self::Avg(report) => write_avg(&mut s, report),
            Self::Rx {
                at_ms,
                rssi,
                from,
                len,
                seq,
            } => write!(
                s,
                "RX,ms={at_ms},rssi={},from={},len={len},seq={seq}",
                rssi.as_dbm(),
                from.raw()
            ),
            Self::Err { at_ms, reason } => write!(s, "ERR,ms={at_ms},reason={reason}"),
            Self::Tx { at_ms, seq } => write!(s, "TX,ms={at_ms},seq={seq}"),
        };
        debug_assert!(written.is_ok(), "serial line overflowed SERIAL_LINE_SIZE");
        s
    }
}

fn write_avg(s: &mut Line, report: &AvgReport) -> core::fmt::Result {
    write!(
        s,
        "AVG,ms={},dur_ms={}",
        report.at_ms, report.duration_ms
    )?;
    match report.summary {
        Some(sum) => write!(
            s,
            ",mean={:.2},std={:.2},n={},min={},max={}",
            sum.mean,
            sum.std_dev,
            report.count,
            sum.min.as_dbm(),
            sum.max.as_dbm()
        ),
        None => write!(s, ",n={}", report.count),
    }
}

/// Parsed `AVG` line; every field is optional
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AvgLine {
    /// `ms`
    pub at_ms: Option<i64>,
    /// `dur_ms`
    pub duration_ms: Option<i64>,
    /// `mean`
    pub mean: Option<f32>,
    /// `std`
    pub std_dev: Option<f32>,
    /// `n`
    pub count: Option<i64>,
    /// `min`
    pub min: Option<i64>,
    /// `max`
    pub max: Option<i64>,
}

impl AvgLine {
    /// Parse a line; returns `None` unless it starts with `AVG,`
    ///
    /// Surrounding whitespace is ignored. Fields are split at the first
    /// `=`; unknown keys and fields without `=` are skipped. Integer fields
    /// also accept a decimal value and truncate it.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.trim().strip_prefix(AVG_TAG)?;
        let mut out = Self::default();

        for field in rest.split(',') {
            let Some((key, value)) = field.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "ms" => out.at_ms = parse_int(value),
                "dur_ms" => out.duration_ms = parse_int(value),
                "mean" => out.mean = value.parse().ok(),
                "std" => out.std_dev = value.parse().ok(),
                "n" => out.count = parse_int(value),
                "min" => out.min = parse_int(value),
                "max" => out.max = parse_int(value),
                _ => {}
            }
        }
        Some(out)
    }
}

fn parse_int(value: &str) -> Option<i64> {
    value
        .parse::<i64>()
        .ok()
        .or_else(|| value.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v as i64))
}
