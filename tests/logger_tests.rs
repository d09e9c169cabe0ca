//! Host Logger Tests
//!
//! Tests for the CSV log file, the serial line splitter and the
//! environment settings of the host-side AVG logger.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test logger_tests

use std::fs;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;

use rssi_meter::config::SERIAL_BAUD;
use rssi_meter::logger::{
    log_line, CsvLog, LineReader, LogRow, LoggerSettings, CSV_HEADER, DEFAULT_CSV_PATH,
    DEFAULT_PORT,
};
use rssi_meter::protocol::AvgLine;

const HEADER_LINE: &str = "pc_time_iso,arduino_ms,dur_ms,mean_rssi_dbm,std_rssi_db,n_samples,min_rssi_dbm,max_rssi_dbm,notes";

const AVG: &str = "AVG,ms=123456,dur_ms=10001,mean=-72.40,std=3.10,n=86,min=-90,max=-60";

fn read_lines(path: &PathBuf) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_owned)
        .collect()
}

// ============================================================================
// CSV Log
// ============================================================================

#[test]
fn test_header_matches_columns() {
    assert_eq!(CSV_HEADER.join(","), HEADER_LINE);
}

#[test]
fn test_new_file_gets_header_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.csv");

    let mut log = CsvLog::open(&path).unwrap();
    assert!(log_line(&mut log, AVG, "2026-10-18T12:00:00", "roof").unwrap());
    assert!(log_line(&mut log, AVG, "2026-10-18T12:00:10", "roof").unwrap());
    assert_eq!(log.rows(), 2);

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], HEADER_LINE);
    assert_eq!(
        lines[1],
        "2026-10-18T12:00:00,123456,10001,-72.4,3.1,86,-90,-60,roof"
    );
}

#[test]
fn test_reopen_appends_without_second_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.csv");

    {
        let mut log = CsvLog::open(&path).unwrap();
        log_line(&mut log, AVG, "t1", "").unwrap();
    }
    {
        let mut log = CsvLog::open(&path).unwrap();
        log_line(&mut log, AVG, "t2", "").unwrap();
    }

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines.iter().filter(|l| *l == HEADER_LINE).count(), 1);
    assert!(lines[1].starts_with("t1,"));
    assert!(lines[2].starts_with("t2,"));
}

#[test]
fn test_empty_existing_file_gets_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.csv");
    fs::write(&path, "").unwrap();

    CsvLog::open(&path).unwrap();
    assert_eq!(read_lines(&path), vec![HEADER_LINE.to_owned()]);
}

#[test]
fn test_non_empty_file_left_without_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.csv");
    fs::write(&path, "older,data\n").unwrap();

    let mut log = CsvLog::open(&path).unwrap();
    log_line(&mut log, AVG, "t", "").unwrap();

    let lines = read_lines(&path);
    assert_eq!(lines[0], "older,data");
    assert!(lines[1].starts_with("t,123456,"));
}

#[test]
fn test_non_avg_lines_are_not_logged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.csv");

    let mut log = CsvLog::open(&path).unwrap();
    assert!(!log_line(&mut log, "RX,ms=500,rssi=-71,from=2,len=18,seq=41", "t", "").unwrap());
    assert!(!log_line(&mut log, "ERR,ms=7,reason=checksum", "t", "").unwrap());
    assert_eq!(log.rows(), 0);
    assert_eq!(read_lines(&path).len(), 1);
}

#[test]
fn test_empty_window_leaves_blank_fields() {
    let avg = AvgLine::parse("AVG,ms=20000,dur_ms=10000,n=0").unwrap();
    let row = LogRow::new("t", avg, "");
    assert_eq!(
        row.record(),
        ["t", "20000", "10000", "", "", "0", "", "", ""].map(str::to_owned)
    );
}

#[test]
fn test_notes_with_comma_are_quoted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.csv");

    let mut log = CsvLog::open(&path).unwrap();
    log_line(&mut log, AVG, "t", "hill, 3m mast").unwrap();

    let lines = read_lines(&path);
    assert!(lines[1].ends_with(",\"hill, 3m mast\""));
}

// ============================================================================
// Line Reader
// ============================================================================

#[test]
fn test_lines_are_trimmed_and_blanks_skipped() {
    let mut reader = LineReader::new(Cursor::new("AVG,ms=1\r\n\r\n   \nRX,ms=2\n"));
    assert_eq!(reader.next_line().unwrap().as_deref(), Some("AVG,ms=1"));
    assert_eq!(reader.next_line().unwrap().as_deref(), Some("RX,ms=2"));
}

#[test]
fn test_reset_noise_is_replaced_not_rejected() {
    let mut reader = LineReader::new(Cursor::new(b"\xff\xfeTX,ms=3\n".to_vec()));
    let line = reader.next_line().unwrap().unwrap();
    assert!(line.ends_with("TX,ms=3"));
    assert!(line.contains('\u{FFFD}'));
}

#[test]
fn test_partial_line_at_end_of_input() {
    let mut reader = LineReader::new(Cursor::new("TX,ms=4"));
    assert_eq!(reader.next_line().unwrap().as_deref(), Some("TX,ms=4"));
    let err = reader.next_line().unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
}

#[test]
fn test_exhausted_input_is_an_error() {
    let mut reader = LineReader::new(Cursor::new("\n\n"));
    let err = reader.next_line().unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
}

/// Serves chunks in order; `None` entries time out
struct ChunkedPort {
    chunks: Vec<Option<&'static [u8]>>,
}

impl Read for ChunkedPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.chunks.is_empty() {
            return Ok(0);
        }
        match self.chunks.remove(0) {
            Some(chunk) => {
                buf[..chunk.len()].copy_from_slice(chunk);
                Ok(chunk.len())
            }
            None => Err(io::ErrorKind::TimedOut.into()),
        }
    }
}

#[test]
fn test_timeout_keeps_partial_line() {
    let port = ChunkedPort {
        chunks: vec![Some(b"AVG,ms="), None, Some(b"9,n=1\n")],
    };
    let mut reader = LineReader::new(port);

    assert_eq!(reader.next_line().unwrap(), None);
    assert_eq!(reader.next_line().unwrap().as_deref(), Some("AVG,ms=9,n=1"));
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn test_settings_defaults() {
    let settings = LoggerSettings::default();
    assert_eq!(settings.port, DEFAULT_PORT);
    assert_eq!(settings.baud, SERIAL_BAUD);
    assert_eq!(settings.csv_path, PathBuf::from(DEFAULT_CSV_PATH));
    assert_eq!(settings.notes, "");
}

#[test]
fn test_settings_overrides() {
    let settings = LoggerSettings::from_lookup(|key| match key {
        "PORT" => Some("/dev/ttyUSB1".to_owned()),
        "BAUD" => Some("57600".to_owned()),
        "CSV" => Some("field.csv".to_owned()),
        "NOTES" => Some("north ridge".to_owned()),
        _ => None,
    });
    assert_eq!(settings.port, "/dev/ttyUSB1");
    assert_eq!(settings.baud, 57_600);
    assert_eq!(settings.csv_path, PathBuf::from("field.csv"));
    assert_eq!(settings.notes, "north ridge");
}

#[test]
fn test_settings_bad_baud_falls_back() {
    let settings = LoggerSettings::from_lookup(|key| (key == "BAUD").then(|| "fast".to_owned()));
    assert_eq!(settings.baud, SERIAL_BAUD);
}
