//! Host-Side AVG Logger
//!
//! Reads report lines from the meter's serial port and appends every `AVG`
//! line to a CSV file, stamped with the PC's local time and free-form
//! notes (location, antenna, ...). The header row is written only when the
//! file is missing or empty, so repeated sessions append to one file.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::config::SERIAL_BAUD;
use crate::protocol::AvgLine;

/// CSV column names, in order
pub const CSV_HEADER: [&str; 9] = [
    "pc_time_iso",
    "arduino_ms",
    "dur_ms",
    "mean_rssi_dbm",
    "std_rssi_db",
    "n_samples",
    "min_rssi_dbm",
    "max_rssi_dbm",
    "notes",
];

/// Default serial device
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";

/// Default output file
pub const DEFAULT_CSV_PATH: &str = "rssi_log.csv";

/// Logger errors
#[derive(Debug)]
pub enum LoggerError {
    /// File or serial I/O failed
    Io(io::Error),
    /// CSV encoding failed
    Csv(csv::Error),
}

impl From<io::Error> for LoggerError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for LoggerError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl fmt::Display for LoggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Csv(err) => write!(f, "CSV error: {err}"),
        }
    }
}

impl std::error::Error for LoggerError {}

/// Logger result
pub type LoggerResult<T> = Result<T, LoggerError>;

/// Settings taken from the environment: `PORT`, `BAUD`, `CSV`, `NOTES`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggerSettings {
    /// Serial device
    pub port: String,
    /// Line rate
    pub baud: u32,
    /// Output file
    pub csv_path: PathBuf,
    /// Text stored in the `notes` column of every row
    pub notes: String,
}

impl LoggerSettings {
    /// Read settings through `lookup`; missing or invalid values use defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: lookup("PORT").unwrap_or_else(|| DEFAULT_PORT.to_owned()),
            baud: lookup("BAUD")
                .and_then(|b| b.trim().parse().ok())
                .unwrap_or(SERIAL_BAUD),
            csv_path: lookup("CSV").map_or_else(|| PathBuf::from(DEFAULT_CSV_PATH), PathBuf::from),
            notes: lookup("NOTES").unwrap_or_default(),
        }
    }

    /// Read settings from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// PC local time, ISO 8601 to the second
#[must_use]
pub fn pc_timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

/// One CSV row: a parsed `AVG` line plus PC-side context
#[derive(Clone, Debug, PartialEq)]
pub struct LogRow {
    /// When the line arrived on the PC
    pub pc_time: String,
    /// Parsed statistics
    pub avg: AvgLine,
    /// Free-form notes
    pub notes: String,
}

impl LogRow {
    /// Build a row
    pub fn new(pc_time: impl Into<String>, avg: AvgLine, notes: impl Into<String>) -> Self {
        Self {
            pc_time: pc_time.into(),
            avg,
            notes: notes.into(),
        }
    }

    /// Fields in [`CSV_HEADER`] order; missing values are empty
    #[must_use]
    pub fn record(&self) -> [String; 9] {
        fn field<T: ToString>(value: Option<T>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }

        [
            self.pc_time.clone(),
            field(self.avg.at_ms),
            field(self.avg.duration_ms),
            field(self.avg.mean),
            field(self.avg.std_dev),
            field(self.avg.count),
            field(self.avg.min),
            field(self.avg.max),
            self.notes.clone(),
        ]
    }
}

/// Append-only CSV log
pub struct CsvLog {
    writer: csv::Writer<File>,
    rows: usize,
}

impl CsvLog {
    /// Open `path` for appending, writing the header if it is missing or empty
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or the header cannot be written.
    pub fn open(path: impl AsRef<Path>) -> LoggerResult<Self> {
        let path = path.as_ref();
        let needs_header = fs::metadata(path).map_or(true, |meta| meta.len() == 0);

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(CSV_HEADER)?;
            writer.flush()?;
        }
        Ok(Self { writer, rows: 0 })
    }

    /// Append one row and flush it to disk
    ///
    /// # Errors
    ///
    /// Fails if the row cannot be written.
    pub fn append(&mut self, row: &LogRow) -> LoggerResult<()> {
        self.writer.write_record(row.record())?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Rows appended in this session
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }
}

/// Splits a byte stream into trimmed text lines
///
/// Bytes that are not UTF-8 (reset noise on the port) are replaced rather
/// than rejected. A read timeout keeps the partial line for the next call.
pub struct LineReader<R> {
    inner: BufReader<R>,
    pending: Vec<u8>,
}

impl<R: Read> LineReader<R> {
    /// Wrap a reader
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            pending: Vec::new(),
        }
    }

    /// Next non-blank line
    ///
    /// Returns `Ok(None)` when the read timed out before a full line arrived.
    ///
    /// # Errors
    ///
    /// `UnexpectedEof` once the input is exhausted, or any other read error.
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            match self.inner.read_until(b'\n', &mut self.pending) {
                Ok(0) => {
                    if self.pending.is_empty() {
                        return Err(io::ErrorKind::UnexpectedEof.into());
                    }
                    if let Some(line) = self.take_line() {
                        return Ok(Some(line));
                    }
                }
                Ok(_) => {
                    if self.pending.last() == Some(&b'\n') {
                        if let Some(line) = self.take_line() {
                            return Ok(Some(line));
                        }
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::TimedOut => return Ok(None),
                Err(err) => return Err(err),
            }
        }
    }

    fn take_line(&mut self) -> Option<String> {
        let line = String::from_utf8_lossy(&self.pending).trim().to_owned();
        self.pending.clear();
        if line.is_empty() {
            None
        } else {
            Some(line)
        }
    }
}

/// Parse `line` and append it to `log` if it is an `AVG` line
///
/// Returns whether a row was written.
///
/// # Errors
///
/// Fails if the row cannot be written.
pub fn log_line(log: &mut CsvLog, line: &str, pc_time: &str, notes: &str) -> LoggerResult<bool> {
    match AvgLine::parse(line) {
        Some(avg) => {
            log.append(&LogRow::new(pc_time, avg, notes))?;
            Ok(true)
        }
        None => Ok(false),
    }
}
