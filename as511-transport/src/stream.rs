//! Stream accessor trait for transport layer

use crate::error::{As511Error, As511Result};
use async_trait::async_trait;
use std::time::Duration;

/// Stream accessor interface to a physical byte stream to a PLC
///
/// Implementations know nothing about AS511 framing. A read that does not
/// complete within the configured timeout fails with a `TransportFailure`
/// of kind `TimedOut`.
#[async_trait]
pub trait StreamAccessor: Send + Sync {
    /// Set the read timeout
    ///
    /// # Arguments
    ///
    /// * `timeout` - The timeout duration. None means infinite timeout.
    async fn set_timeout(&mut self, timeout: Option<Duration>) -> As511Result<()>;

    /// Read data from the stream
    ///
    /// # Returns
    ///
    /// Number of bytes read, or 0 if EOF
    async fn read(&mut self, buf: &mut [u8]) -> As511Result<usize>;

    /// Read exact number of bytes from the stream
    ///
    /// Returns error if unable to read the exact number of bytes
    async fn read_exact(&mut self, mut buf: &mut [u8]) -> As511Result<()> {
        while !buf.is_empty() {
            let n = self.read(buf).await?;
            if n == 0 {
                return Err(As511Error::TransportFailure(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "Failed to read exact number of bytes",
                )));
            }
            buf = &mut buf[n..];
        }
        Ok(())
    }

    /// Read a single byte from the stream
    async fn read_byte(&mut self) -> As511Result<u8> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte).await?;
        Ok(byte[0])
    }

    /// Write data to the stream
    ///
    /// # Returns
    ///
    /// Number of bytes written
    async fn write(&mut self, buf: &[u8]) -> As511Result<usize>;

    /// Write all data to the stream
    async fn write_all(&mut self, buf: &[u8]) -> As511Result<()> {
        let mut written = 0;
        while written < buf.len() {
            let n = self.write(&buf[written..]).await?;
            if n == 0 {
                return Err(As511Error::TransportFailure(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "Failed to write all data",
                )));
            }
            written += n;
        }
        Ok(())
    }

    /// Flush any buffered data
    async fn flush(&mut self) -> As511Result<()>;

    /// Drop any bytes already received but not yet read
    ///
    /// Called before every (re)transmission so a late reply to an earlier
    /// attempt cannot be mistaken for the reply to the current one.
    async fn discard_input(&mut self) -> As511Result<()>;

    /// Check if the stream is closed
    fn is_closed(&self) -> bool;

    /// Close the stream
    async fn close(&mut self) -> As511Result<()>;
}

/// Transport layer trait that extends StreamAccessor
#[async_trait]
pub trait TransportLayer: StreamAccessor {
    /// Open the physical layer connection
    async fn open(&mut self) -> As511Result<()>;
}
