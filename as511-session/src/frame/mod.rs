//! AS511 wire framing

pub mod codec;
pub mod lrc;
pub mod reader;

pub use codec::{Frame, FrameCodec, ETX, FRAME_OVERHEAD, MAX_FRAME_PAYLOAD, STX};
pub use lrc::{compute_checksum, LrcCalc};
pub use reader::FrameReader;

/// Positive acknowledgement byte
pub const ACK: u8 = 0x06;

/// Negative acknowledgement byte, followed on the wire by a reason code
pub const NAK: u8 = 0x15;

/// Data link escape, the PLC's answer to a bare STX during the connect handshake
pub const DLE: u8 = 0x10;
