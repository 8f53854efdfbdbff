//! Session layer module for the AS511 protocol
//!
//! This crate provides the wire framing (STX/ETX delimited frames protected by
//! an LRC), the AS511 command set, and the protocol session that drives a
//! single command exchange with acknowledgement handling and retries.

pub mod command;
pub mod frame;
pub mod retry;
pub mod session;
pub mod state;
pub mod statistics;

pub use as511_core::error;
pub use as511_core::{As511Error, As511Result};
pub use command::{Command, ReplyKind, MAX_WRITE_CHUNK};
pub use frame::{
    compute_checksum, Frame, FrameCodec, FrameReader, LrcCalc, ACK, DLE, ETX, MAX_FRAME_PAYLOAD,
    NAK, STX,
};
pub use retry::RetryBudget;
pub use session::{
    ProtocolSession, SessionConfig, DEFAULT_PLC_ADDRESS, DEFAULT_RETRIES, HANDSHAKE_NAK_DELAY,
};
pub use state::SessionState;
pub use statistics::SessionStatistics;
