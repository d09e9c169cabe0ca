//! Radio Framing
//!
//! Frame layout in the RFM69 FIFO:
//!
//! ```text
//! [len][to][from][id][flags][payload ...]
//! ```
//!
//! `len` counts the four header bytes plus the payload. With AES enabled the
//! packet engine encrypts at most 64 bytes after the length byte, so the
//! payload is limited to 60 bytes.
//!
//! The beacon carried in the payload is `[seq u32 LE][text][crc16 LE]`.

use crc::{Crc, CRC_16_IBM_3740};
use heapless::{String, Vec};

use crate::types::NodeAddress;

/// Header bytes following the length byte
pub const HEADER_LEN: usize = 4;

/// Largest body (header + payload) the AES engine handles
pub const MAX_BODY_LEN: usize = 64;

/// Largest payload
pub const MAX_PAYLOAD_LEN: usize = MAX_BODY_LEN - HEADER_LEN;

/// Largest encoded frame including the length byte
pub const MAX_FRAME_LEN: usize = MAX_BODY_LEN + 1;

/// Beacon overhead: sequence number plus checksum
pub const BEACON_OVERHEAD: usize = 4 + 2;

/// Longest beacon text
pub const MAX_BEACON_TEXT: usize = MAX_PAYLOAD_LEN - BEACON_OVERHEAD;

/// Why a received frame was rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameError {
    /// Nothing was read from the FIFO
    Empty,
    /// Length byte smaller than the header
    TooShort(u8),
    /// Length byte larger than the AES limit
    TooLong(u8),
    /// Fewer bytes present than the length byte claims
    Truncated {
        /// Bytes announced by the length byte
        expected: usize,
        /// Bytes actually present
        actual: usize,
    },
    /// Addressed to a different node
    NotForUs(u8),
    /// Hardware CRC check failed
    Crc,
    /// Payload checksum mismatch
    Checksum {
        /// Checksum carried in the payload
        expected: u16,
        /// Checksum computed over the payload
        actual: u16,
    },
    /// Payload too short to hold a beacon
    BadBeacon,
}

impl FrameError {
    /// Short token used in `ERR` serial lines
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::TooShort(_) => "too_short",
            Self::TooLong(_) => "too_long",
            Self::Truncated { .. } => "truncated",
            Self::NotForUs(_) => "not_for_us",
            Self::Crc => "crc",
            Self::Checksum { .. } => "checksum",
            Self::BadBeacon => "bad_beacon",
        }
    }
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => f.write_str("empty frame"),
            Self::TooShort(len) => write!(f, "length {len} shorter than header"),
            Self::TooLong(len) => write!(f, "length {len} exceeds {MAX_BODY_LEN}"),
            Self::Truncated { expected, actual } => {
                write!(f, "expected {expected} bytes, got {actual}")
            }
            Self::NotForUs(to) => write!(f, "addressed to 0x{to:02X}"),
            Self::Crc => f.write_str("CRC error"),
            Self::Checksum { expected, actual } => {
                write!(f, "checksum 0x{expected:04X} != 0x{actual:04X}")
            }
            Self::BadBeacon => f.write_str("payload is not a beacon"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for FrameError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Empty => defmt::write!(f, "Empty"),
            Self::TooShort(len) => defmt::write!(f, "TooShort({})", len),
            Self::TooLong(len) => defmt::write!(f, "TooLong({})", len),
            Self::Truncated { expected, actual } => {
                defmt::write!(f, "Truncated({}/{})", actual, expected);
            }
            Self::NotForUs(to) => defmt::write!(f, "NotForUs(0x{:02X})", to),
            Self::Crc => defmt::write!(f, "Crc"),
            Self::Checksum { expected, actual } => {
                defmt::write!(f, "Checksum(0x{:04X} != 0x{:04X})", expected, actual);
            }
            Self::BadBeacon => defmt::write!(f, "BadBeacon"),
        }
    }
}

/// Frame header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    /// Destination
    pub to: NodeAddress,
    /// Source
    pub from: NodeAddress,
    /// Sender-chosen message id
    pub id: u8,
    /// Application flags
    pub flags: u8,
}

/// A decoded frame with its payload copied into a fixed buffer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Header fields
    pub header: Header,
    /// Payload bytes
    pub payload: Vec<u8, MAX_PAYLOAD_LEN>,
}

impl Frame {
    /// Build a frame, rejecting payloads over [`MAX_PAYLOAD_LEN`]
    ///
    /// # Errors
    ///
    /// [`FrameError::TooLong`] if the payload does not fit.
    pub fn new(header: Header, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload)
            .map_err(|()| FrameError::TooLong((payload.len() + HEADER_LEN).min(255) as u8))?;
        Ok(Self { header, payload })
    }

    /// Decode the FIFO contents (starting with the length byte)
    ///
    /// `me` is this node's address; frames for other nodes are rejected
    /// unless `promiscuous` is set. Broadcast frames are always accepted.
    ///
    /// # Errors
    ///
    /// Returns the [`FrameError`] describing the malformation.
    pub fn decode(raw: &[u8], me: NodeAddress, promiscuous: bool) -> Result<Self, FrameError> {
        let (&len, body) = raw.split_first().ok_or(FrameError::Empty)?;
        let len_usize = usize::from(len);

        if len_usize < HEADER_LEN {
            return Err(FrameError::TooShort(len));
        }
        if len_usize > MAX_BODY_LEN {
            return Err(FrameError::TooLong(len));
        }
        if body.len() < len_usize {
            return Err(FrameError::Truncated {
                expected: len_usize,
                actual: body.len(),
            });
        }

        let header = Header {
            to: NodeAddress::new(body[0]),
            from: NodeAddress::new(body[1]),
            id: body[2],
            flags: body[3],
        };

        if !promiscuous && header.to != me && !header.to.is_broadcast() {
            return Err(FrameError::NotForUs(header.to.raw()));
        }

        Self::new(header, &body[HEADER_LEN..len_usize])
    }

    /// Encode into `out` (length byte first), returning the bytes written
    ///
    /// # Errors
    ///
    /// [`FrameError::Truncated`] if `out` is too small.
    pub fn encode(&self, out: &mut [u8]) -> Result<usize, FrameError> {
        let body_len = HEADER_LEN + self.payload.len();
        let total = body_len + 1;
        if out.len() < total {
            return Err(FrameError::Truncated {
                expected: total,
                actual: out.len(),
            });
        }
        out[0] = body_len as u8;
        out[1] = self.header.to.raw();
        out[2] = self.header.from.raw();
        out[3] = self.header.id;
        out[4] = self.header.flags;
        out[5..total].copy_from_slice(&self.payload);
        Ok(total)
    }
}

/// CRC-16/CCITT-FALSE (poly 0x1021, init 0xFFFF)
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Beacon checksum
#[must_use]
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// Numbered beacon exchanged between transmitter and receiver
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Beacon {
    /// Sequence number
    pub seq: u32,
    /// Human-readable text
    pub text: String<MAX_BEACON_TEXT>,
}

impl Beacon {
    /// Standard beacon: `prefix` followed by the sequence number
    #[must_use]
    pub fn numbered(prefix: &str, seq: u32) -> Self {
        let mut text: String<MAX_BEACON_TEXT> = String::new();
        for ch in prefix.chars() {
            if text.push(ch).is_err() {
                break;
            }
        }
        let _ = core::fmt::write(&mut text, format_args!("{seq}"));
        Self { seq, text }
    }

    /// Serialize into a payload
    #[must_use]
    pub fn encode(&self) -> Vec<u8, MAX_PAYLOAD_LEN> {
        let mut out: Vec<u8, MAX_PAYLOAD_LEN> = Vec::new();
        // Text is capped at MAX_BEACON_TEXT, so everything fits.
        let _ = out.extend_from_slice(&self.seq.to_le_bytes());
        let _ = out.extend_from_slice(self.text.as_bytes());
        let crc = crc16_ccitt(&out);
        let _ = out.extend_from_slice(&crc.to_le_bytes());
        out
    }

    /// Parse and checksum a payload
    ///
    /// # Errors
    ///
    /// [`FrameError::BadBeacon`] if too short or the text is not UTF-8,
    /// [`FrameError::Checksum`] on a checksum mismatch.
    pub fn decode(payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() < BEACON_OVERHEAD {
            return Err(FrameError::BadBeacon);
        }
        let (body, crc_bytes) = payload.split_at(payload.len() - 2);
        let expected = u16::from_le_bytes([crc_bytes[0], crc_bytes[1]]);
        let actual = crc16_ccitt(body);
        if expected != actual {
            return Err(FrameError::Checksum { expected, actual });
        }

        let seq = u32::from_le_bytes([body[0], body[1], body[2], body[3]]);
        let text = core::str::from_utf8(&body[4..]).map_err(|_| FrameError::BadBeacon)?;
        let mut owned: String<MAX_BEACON_TEXT> = String::new();
        owned.push_str(text).map_err(|()| FrameError::BadBeacon)?;
        Ok(Self { seq, text: owned })
    }
}
