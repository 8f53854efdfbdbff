//! AS511 frame reader

use crate::error::{As511Error, As511Result};
use crate::frame::codec::{Frame, STX};
use as511_transport::StreamAccessor;

/// Pulls one frame at a time off a byte stream
pub struct FrameReader;

impl FrameReader {
    /// Read and decode one frame
    ///
    /// # Arguments
    /// * `stream` - Stream to read from; its read timeout bounds every read
    /// * `start` - The start byte if the caller already consumed it
    ///
    /// The length byte only decides how many bytes to collect. Whether those
    /// bytes form a valid frame is left to `Frame::decode`.
    pub async fn read_frame<S: StreamAccessor>(
        stream: &mut S,
        start: Option<u8>,
    ) -> As511Result<Frame> {
        let start = match start {
            Some(byte) => byte,
            None => stream.read_byte().await?,
        };
        Self::validate_start(start)?;

        let length = stream.read_byte().await?;

        let mut wire = vec![0u8; length as usize + 3];
        wire[0] = start;
        wire[1] = length;
        stream.read_exact(&mut wire[2..]).await?;

        log::debug!("<- {:02X?}", wire);
        Frame::decode(&wire)
    }

    fn validate_start(byte: u8) -> As511Result<()> {
        if byte != STX {
            Err(As511Error::MalformedFrame(format!(
                "Expected STX 0x{:02X}, but received: 0x{:02X}",
                STX, byte
            )))
        } else {
            Ok(())
        }
    }
}
