//! Host companion for the RSSI meter.
//!
//! Echoes every line the receiver prints on its USB serial port and appends
//! `AVG` lines to a CSV file.
//!
//! Settings come from the environment:
//!
//! | Variable | Default         |
//! |----------|-----------------|
//! | PORT     | /dev/ttyACM0    |
//! | BAUD     | 115200          |
//! | CSV      | rssi_log.csv    |
//! | NOTES    | (empty)         |
//!
//! `rssi-logger --list` prints the serial ports found on this machine.
//!
//! Run with: cargo run --target x86_64-unknown-linux-gnu --no-default-features --features logger --bin rssi-logger

use std::process;
use std::thread;
use std::time::Duration;

use log::{error, info, warn};
use serialport::ClearBuffer;

use rssi_meter::logger::{log_line, pc_timestamp, CsvLog, LineReader, LoggerSettings};

/// Serial read timeout
const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// The board resets when the port opens; wait it out before reading
const SETTLE_TIME: Duration = Duration::from_millis(1500);

fn list_ports() {
    match serialport::available_ports() {
        Ok(ports) if ports.is_empty() => println!("No serial ports found"),
        Ok(ports) => {
            for port in ports {
                println!("{}", port.port_name);
            }
        }
        Err(e) => error!("Port enumeration failed: {e}"),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if std::env::args().skip(1).any(|arg| arg == "--list") {
        list_ports();
        return;
    }

    let settings = LoggerSettings::from_env();

    let mut port = match serialport::new(&settings.port, settings.baud)
        .timeout(READ_TIMEOUT)
        .open()
    {
        Ok(port) => port,
        Err(e) => {
            error!("Cannot open {}: {e}", settings.port);
            process::exit(1);
        }
    };

    thread::sleep(SETTLE_TIME);
    if let Err(e) = port.clear(ClearBuffer::Input) {
        warn!("Input flush failed: {e}");
    }

    let mut log = match CsvLog::open(&settings.csv_path) {
        Ok(log) => log,
        Err(e) => {
            error!("Cannot open {}: {e}", settings.csv_path.display());
            process::exit(1);
        }
    };

    info!(
        "Logging {} @ {} baud to {}",
        settings.port,
        settings.baud,
        settings.csv_path.display()
    );

    let mut lines = LineReader::new(port);
    loop {
        let line = match lines.next_line() {
            Ok(Some(line)) => line,
            Ok(None) => continue,
            Err(e) => {
                error!("Serial read failed: {e}");
                process::exit(1);
            }
        };

        println!("{line}");
        match log_line(&mut log, &line, &pc_timestamp(), &settings.notes) {
            Ok(true) => info!("CSV appended ({} rows)", log.rows()),
            Ok(false) => {}
            Err(e) => error!("CSV write failed: {e}"),
        }
    }
}
