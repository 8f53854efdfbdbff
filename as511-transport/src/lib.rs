//! Transport layer module for the AS511 protocol
//!
//! This crate provides the byte-stream capability traits used by the session
//! layer, the serial port implementation, and a scriptable mock transport for
//! exercising the protocol without hardware.

pub mod mock;
pub mod serial;
pub mod stream;

pub use as511_core::error;
pub use as511_core::{As511Error, As511Result};
pub use mock::{MockHandle, MockReply, MockTransport};
pub use serial::{SerialSettings, SerialTransport};
pub use stream::{StreamAccessor, TransportLayer};
