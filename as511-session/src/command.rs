//! AS511 command set
//!
//! Request payload layouts (multi-byte fields big-endian):
//!
//! | Command     | Opcode | Payload                        | Reply |
//! |-------------|--------|--------------------------------|-------|
//! | READ        | 0x10   | type number                    | data  |
//! | WRITE_BEGIN | 0x11   | type number total(2)           | ack   |
//! | READ_NEXT   | 0x12   | type number offset(2)          | data  |
//! | WRITE_DATA  | 0x13   | offset(2) chunk...             | ack   |
//! | WRITE_END   | 0x14   | type number                    | ack   |
//! | INFO        | 0x1A   | type number                    | data  |
//! | ABORT       | 0x1F   | -                              | ack   |

use crate::frame::MAX_FRAME_PAYLOAD;
use as511_core::BlockAddress;
use bytes::{BufMut, BytesMut};
use std::fmt;

pub const CMD_READ: u8 = 0x10;
pub const CMD_WRITE_BEGIN: u8 = 0x11;
pub const CMD_READ_NEXT: u8 = 0x12;
pub const CMD_WRITE_DATA: u8 = 0x13;
pub const CMD_WRITE_END: u8 = 0x14;
pub const CMD_INFO: u8 = 0x1A;
pub const CMD_ABORT: u8 = 0x1F;

/// Header bytes of a WRITE_DATA payload ahead of the chunk
pub const WRITE_DATA_HEADER_LEN: usize = 3;

/// Largest WRITE_DATA segment that still fits a single frame
pub const MAX_WRITE_CHUNK: usize = MAX_FRAME_PAYLOAD - WRITE_DATA_HEADER_LEN;

/// What the PLC sends back for a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// A single acknowledgement byte
    Ack,
    /// A data frame, optionally preceded by an acknowledgement
    Data,
}

/// One request to the PLC
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: &'static str,
    payload: Vec<u8>,
    reply: ReplyKind,
}

impl Command {
    /// Create a raw command
    pub fn new(name: &'static str, payload: Vec<u8>, reply: ReplyKind) -> Self {
        Self {
            name,
            payload,
            reply,
        }
    }

    fn build(name: &'static str, reply: ReplyKind, fill: impl FnOnce(&mut BytesMut)) -> Self {
        let mut buf = BytesMut::with_capacity(8);
        fill(&mut buf);
        Self::new(name, buf.to_vec(), reply)
    }

    /// Request a block and its declared length
    pub fn read(address: BlockAddress) -> Self {
        Self::build("READ", ReplyKind::Data, |buf| {
            buf.put_u8(CMD_READ);
            put_address(buf, address);
        })
    }

    /// Request the next chunk of a block starting at `offset`
    pub fn read_next(address: BlockAddress, offset: u16) -> Self {
        Self::build("READ_NEXT", ReplyKind::Data, |buf| {
            buf.put_u8(CMD_READ_NEXT);
            put_address(buf, address);
            buf.put_u16(offset);
        })
    }

    /// Announce a block write of `total` bytes
    pub fn write_begin(address: BlockAddress, total: u16) -> Self {
        Self::build("WRITE_BEGIN", ReplyKind::Ack, |buf| {
            buf.put_u8(CMD_WRITE_BEGIN);
            put_address(buf, address);
            buf.put_u16(total);
        })
    }

    /// Carry one segment of a block write
    pub fn write_data(offset: u16, chunk: &[u8]) -> Self {
        let mut buf = BytesMut::with_capacity(WRITE_DATA_HEADER_LEN + chunk.len());
        buf.put_u8(CMD_WRITE_DATA);
        buf.put_u16(offset);
        buf.put_slice(chunk);
        Self::new("WRITE_DATA", buf.to_vec(), ReplyKind::Ack)
    }

    /// Commit a block write
    pub fn write_end(address: BlockAddress) -> Self {
        Self::build("WRITE_END", ReplyKind::Ack, |buf| {
            buf.put_u8(CMD_WRITE_END);
            put_address(buf, address);
        })
    }

    /// Query block metadata
    pub fn info(address: BlockAddress) -> Self {
        Self::build("INFO", ReplyKind::Data, |buf| {
            buf.put_u8(CMD_INFO);
            put_address(buf, address);
        })
    }

    /// Cancel a transfer in progress
    pub fn abort() -> Self {
        Self::new("ABORT", vec![CMD_ABORT], ReplyKind::Ack)
    }

    /// Get the command name used in logs
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Get the request payload
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get the expected reply kind
    pub fn reply_kind(&self) -> ReplyKind {
        self.reply
    }

    /// Get the opcode
    pub fn opcode(&self) -> Option<u8> {
        self.payload.first().copied()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({} bytes)", self.name, self.payload.len())
    }
}

fn put_address(buf: &mut BytesMut, address: BlockAddress) {
    buf.put_u8(address.block_type().code());
    buf.put_u8(address.number());
}
