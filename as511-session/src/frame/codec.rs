//! AS511 frame structure and encoding/decoding
//!
//! # Wire Format
//! ```text
//! STX  LEN  ADDR  PAYLOAD...  ETX  LRC
//! ```
//! - `LEN` counts `ADDR`, `PAYLOAD` and `ETX`
//! - `LRC` is the exclusive-or of `LEN` through `ETX`

use crate::error::{As511Error, As511Result};
use crate::frame::lrc::{compute_checksum, LrcCalc};
use bytes::{BufMut, BytesMut};
use std::fmt;

/// Start of frame marker
pub const STX: u8 = 0x02;

/// End of frame marker
pub const ETX: u8 = 0x03;

/// Bytes a frame adds around its payload (STX, LEN, ADDR, ETX, LRC)
pub const FRAME_OVERHEAD: usize = 5;

/// Largest payload the one-byte length field can describe
pub const MAX_FRAME_PAYLOAD: usize = u8::MAX as usize - 2;

/// One AS511 frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    address: u8,
    payload: Vec<u8>,
    checksum: u8,
}

impl Frame {
    /// Create a frame for the given station address
    ///
    /// # Errors
    /// Returns `As511Error::OversizedPayload` if the payload does not fit a
    /// single frame.
    pub fn new(address: u8, payload: Vec<u8>) -> As511Result<Self> {
        if payload.len() > MAX_FRAME_PAYLOAD {
            return Err(As511Error::OversizedPayload {
                len: payload.len(),
                max: MAX_FRAME_PAYLOAD,
            });
        }

        let mut calc = LrcCalc::new();
        calc.update(Self::length_field(payload.len()));
        calc.update(address);
        calc.update_bytes(&payload);
        calc.update(ETX);

        Ok(Self {
            address,
            payload,
            checksum: calc.value(),
        })
    }

    fn length_field(payload_len: usize) -> u8 {
        (payload_len + 2) as u8
    }

    /// Encode the frame to wire bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.payload.len() + FRAME_OVERHEAD);
        buf.put_u8(STX);
        buf.put_u8(Self::length_field(self.payload.len()));
        buf.put_u8(self.address);
        buf.put_slice(&self.payload);
        buf.put_u8(ETX);
        buf.put_u8(self.checksum);
        buf.to_vec()
    }

    /// Decode a frame from wire bytes
    ///
    /// The input must hold exactly one frame: missing or misplaced markers,
    /// truncated input and trailing bytes are all `MalformedFrame`. A check
    /// byte that does not match the recomputed LRC is `ChecksumMismatch`.
    pub fn decode(wire: &[u8]) -> As511Result<Self> {
        if wire.len() < FRAME_OVERHEAD {
            return Err(As511Error::MalformedFrame(format!(
                "Frame too short: {} bytes",
                wire.len()
            )));
        }

        if wire[0] != STX {
            return Err(As511Error::MalformedFrame(format!(
                "Expected STX 0x{:02X}, but received: 0x{:02X}",
                STX, wire[0]
            )));
        }

        let length = wire[1] as usize;
        if length < 2 {
            return Err(As511Error::MalformedFrame(format!(
                "Frame length too short: {}",
                length
            )));
        }
        if wire.len() != length + 3 {
            return Err(As511Error::MalformedFrame(format!(
                "Frame length field says {} bytes, frame carries {}",
                length + 3,
                wire.len()
            )));
        }

        let etx_pos = 1 + length;
        if wire[etx_pos] != ETX {
            return Err(As511Error::MalformedFrame(format!(
                "Expected ETX 0x{:02X} at offset {}, but received: 0x{:02X}",
                ETX, etx_pos, wire[etx_pos]
            )));
        }

        let computed = compute_checksum(&wire[1..=etx_pos]);
        let received = wire[etx_pos + 1];
        if computed != received {
            return Err(As511Error::ChecksumMismatch { computed, received });
        }

        Ok(Self {
            address: wire[2],
            payload: wire[3..etx_pos].to_vec(),
            checksum: received,
        })
    }

    /// Get the station address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Get the payload
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Take ownership of the payload
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Get the check byte
    pub fn checksum(&self) -> u8 {
        self.checksum
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame[addr=0x{:02X}, {} bytes, lrc=0x{:02X}]",
            self.address,
            self.payload.len(),
            self.checksum
        )
    }
}

/// Frame encoder/decoder bound to one PLC station address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodec {
    address: u8,
}

impl FrameCodec {
    /// Create a codec for a station address
    pub fn new(address: u8) -> Self {
        Self { address }
    }

    /// Get the station address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Wrap a payload into wire bytes
    pub fn encode(&self, payload: &[u8]) -> As511Result<Vec<u8>> {
        Ok(Frame::new(self.address, payload.to_vec())?.encode())
    }

    /// Validate wire bytes and return the enclosed payload
    pub fn decode(&self, wire: &[u8]) -> As511Result<Vec<u8>> {
        Ok(Frame::decode(wire)?.into_payload())
    }
}
