//! USB CDC ACM (Serial) Implementation
//!
//! Virtual serial port carrying the report lines. The service loop queues
//! rendered lines on a channel; the USB task drains it whenever a host has
//! the port open. Lines queued while nobody listens are dropped once the
//! queue is full.

use embassy_stm32::peripherals::USB;
use embassy_stm32::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::driver::EndpointError;
use embassy_usb::{Builder, UsbDevice};
use static_cell::StaticCell;

use crate::config::{SERIAL_LINE_SIZE, SERIAL_QUEUE_DEPTH, USB_CDC_PACKET_SIZE};
use crate::protocol::{Line, SerialLine};

/// USB driver type for this board
pub type UsbDriver = Driver<'static, USB>;

/// Queue between the service loop and the USB task
pub type LineChannel = Channel<CriticalSectionRawMutex, Line, SERIAL_QUEUE_DEPTH>;

/// Line terminator
const CRLF: &[u8] = b"\r\n";

/// Outgoing line buffer (text plus CRLF)
pub struct CdcWriteBuffer {
    buffer: [u8; SERIAL_LINE_SIZE + 2],
    len: usize,
}

impl CdcWriteBuffer {
    /// Create a new write buffer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0; SERIAL_LINE_SIZE + 2],
            len: 0,
        }
    }

    /// Write data to buffer
    pub fn write(&mut self, data: &[u8]) -> usize {
        let space = self.buffer.len() - self.len;
        let to_write = data.len().min(space);
        self.buffer[self.len..self.len + to_write].copy_from_slice(&data[..to_write]);
        self.len += to_write;
        to_write
    }

    /// Load a line followed by CRLF, replacing any previous contents
    pub fn load_line(&mut self, line: &str) {
        self.clear();
        self.write(line.as_bytes());
        self.write(CRLF);
    }

    /// Get buffer contents
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Get used length
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check if empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for CdcWriteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// USB device descriptor strings
pub struct UsbStrings {
    /// Manufacturer name
    pub manufacturer: &'static str,
    /// Product name
    pub product: &'static str,
    /// Serial number
    pub serial: &'static str,
}

impl Default for UsbStrings {
    fn default() -> Self {
        Self {
            manufacturer: "RSSI Meter Project",
            product: "RFM69 RSSI Meter",
            serial: "0001",
        }
    }
}

/// USB device info for descriptor
#[derive(Clone, Copy, Debug)]
pub struct UsbDeviceInfo {
    /// Vendor ID
    pub vid: u16,
    /// Product ID
    pub pid: u16,
    /// Device release number
    pub device_release: u16,
}

impl Default for UsbDeviceInfo {
    fn default() -> Self {
        Self {
            vid: crate::config::USB_VID,
            pid: crate::config::USB_PID,
            device_release: 0x0100,
        }
    }
}

impl defmt::Format for UsbDeviceInfo {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "USB({:04X}:{:04X})", self.vid, self.pid);
    }
}

/// Non-blocking producer side used by the service loop
#[derive(Clone, Copy)]
pub struct SerialWriter {
    channel: &'static LineChannel,
}

impl SerialWriter {
    /// Wrap a channel
    #[must_use]
    pub const fn new(channel: &'static LineChannel) -> Self {
        Self { channel }
    }

    /// Queue a line; returns false if it was dropped
    pub fn emit(&self, line: &SerialLine) -> bool {
        self.channel.try_send(line.render()).is_ok()
    }
}

/// Build the USB device and CDC class
///
/// Descriptor buffers live in statics, so this may only be called once.
pub fn build(driver: UsbDriver) -> (UsbDevice<'static, UsbDriver>, CdcAcmClass<'static, UsbDriver>) {
    static CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
    static BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
    static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();
    static STATE: StaticCell<State<'static>> = StaticCell::new();

    let info = UsbDeviceInfo::default();
    let strings = UsbStrings::default();

    let mut config = embassy_usb::Config::new(info.vid, info.pid);
    config.manufacturer = Some(strings.manufacturer);
    config.product = Some(strings.product);
    config.serial_number = Some(strings.serial);
    config.device_release = info.device_release;
    config.max_power = 100;
    config.max_packet_size_0 = 64;

    let mut builder = Builder::new(
        driver,
        config,
        CONFIG_DESC.init([0; 256]),
        BOS_DESC.init([0; 256]),
        &mut [],
        CONTROL_BUF.init([0; 64]),
    );
    let class = CdcAcmClass::new(&mut builder, STATE.init(State::new()), USB_CDC_PACKET_SIZE);
    (builder.build(), class)
}

/// Forward queued lines to the host until it disconnects
pub async fn pump(
    class: &mut CdcAcmClass<'static, UsbDriver>,
    lines: &'static LineChannel,
) -> Result<(), EndpointError> {
    let mut out = CdcWriteBuffer::new();
    loop {
        let line = lines.receive().await;
        out.load_line(&line);
        for packet in out.as_bytes().chunks(usize::from(USB_CDC_PACKET_SIZE)) {
            class.write_packet(packet).await?;
        }
        // A full-size final packet needs a ZLP to end the transfer
        if out.len() % usize::from(USB_CDC_PACKET_SIZE) == 0 {
            class.write_packet(&[]).await?;
        }
    }
}
