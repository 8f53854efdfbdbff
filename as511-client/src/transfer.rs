//! Block transfer engine
//!
//! Splits block reads and writes into AS511 command exchanges on a
//! `ProtocolSession` and reassembles the results. The session retries each
//! exchange on its own; this layer only sequences them.
//!
//! # Read
//! ```text
//! READ type number            -> total(2) chunk
//! READ_NEXT type number off   -> off(2) chunk      (until total received)
//! ```
//!
//! # Write
//! ```text
//! WRITE_BEGIN type number total   -> ACK
//! WRITE_DATA off chunk            -> ACK  (one per segment)
//! WRITE_END type number           -> ACK
//! ABORT                           -> ACK  (once, after a failed segment)
//! ```
//!
//! # Info
//! ```text
//! INFO type number            -> type number status length_words(2)
//! ```

use crate::error::{As511Error, As511Result};
use as511_core::{BlockAddress, BlockData, BlockInfo};
use as511_session::{Command, ProtocolSession, MAX_WRITE_CHUNK};
use as511_transport::StreamAccessor;
use bytes::BytesMut;

/// Block transfer engine bound to a session for the duration of a transfer
pub struct BlockTransfer<'s, T: StreamAccessor> {
    session: &'s mut ProtocolSession<T>,
    chunk_size: usize,
}

impl<'s, T: StreamAccessor> BlockTransfer<'s, T> {
    /// Create an engine writing segments of at most `chunk_size` bytes
    ///
    /// The size is clamped to `1..=MAX_WRITE_CHUNK` so every WRITE_DATA
    /// segment fits a single frame.
    pub fn new(session: &'s mut ProtocolSession<T>, chunk_size: usize) -> Self {
        Self {
            session,
            chunk_size: chunk_size.clamp(1, MAX_WRITE_CHUNK),
        }
    }

    /// Read a whole block
    ///
    /// # Errors
    /// A failure of the initial READ is returned as is. Once the first chunk
    /// has arrived, any failure other than `TransportFailure` is wrapped in
    /// `PartialTransferFailure` and the partial data is dropped.
    pub async fn read_block(&mut self, address: BlockAddress) -> As511Result<BlockData> {
        let reply = self.request(&Command::read(address)).await?;
        let (total, first) = split_word(&reply, "READ")?;
        let total = total as usize;
        if first.len() > total {
            return Err(As511Error::MalformedFrame(format!(
                "READ reply for {} carries {} bytes but declares {}",
                address,
                first.len(),
                total
            )));
        }

        let mut data = BytesMut::with_capacity(total);
        data.extend_from_slice(first);

        while data.len() < total {
            let offset = data.len();
            let chunk = self
                .read_continuation(address, offset, total)
                .await
                .map_err(|e| partial(address, offset, total, e))?;
            data.extend_from_slice(&chunk);
        }

        log::info!("Read {} ({} bytes)", address, total);
        Ok(BlockData::new(address, data.to_vec()))
    }

    async fn read_continuation(
        &mut self,
        address: BlockAddress,
        offset: usize,
        total: usize,
    ) -> As511Result<Vec<u8>> {
        let reply = self
            .request(&Command::read_next(address, offset as u16))
            .await?;
        let (echoed, chunk) = split_word(&reply, "READ_NEXT")?;

        if echoed as usize != offset {
            return Err(As511Error::MalformedFrame(format!(
                "READ_NEXT reply out of sequence: expected offset {}, got {}",
                offset, echoed
            )));
        }
        if chunk.is_empty() {
            return Err(As511Error::MalformedFrame(format!(
                "Empty READ_NEXT reply at offset {}",
                offset
            )));
        }
        if offset + chunk.len() > total {
            return Err(As511Error::MalformedFrame(format!(
                "READ_NEXT reply overruns block: {} + {} > {}",
                offset,
                chunk.len(),
                total
            )));
        }
        Ok(chunk.to_vec())
    }

    /// Write a whole block
    ///
    /// The data is validated before anything is sent. A failure of
    /// WRITE_BEGIN is returned as is; a failed segment or WRITE_END sends a
    /// single ABORT and is reported as `PartialTransferFailure`.
    pub async fn write_block(&mut self, block: &BlockData) -> As511Result<()> {
        block.validate_for_write()?;
        let address = block.address();
        let total = block.len();

        self.session
            .execute(&Command::write_begin(address, total as u16))
            .await?;

        let mut offset = 0;
        for chunk in block.bytes().chunks(self.chunk_size) {
            let result = self
                .session
                .execute(&Command::write_data(offset as u16, chunk))
                .await;
            if let Err(e) = result {
                return Err(self.abort(address, offset, total, e).await);
            }
            offset += chunk.len();
        }

        if let Err(e) = self.session.execute(&Command::write_end(address)).await {
            return Err(self.abort(address, offset, total, e).await);
        }

        log::info!("Wrote {} ({} bytes)", address, total);
        Ok(())
    }

    async fn abort(
        &mut self,
        address: BlockAddress,
        transferred: usize,
        total: usize,
        error: As511Error,
    ) -> As511Error {
        if error.is_fatal() {
            return error;
        }
        if let Err(e) = self.session.execute_once(&Command::abort()).await {
            log::warn!("ABORT after failed write of {} also failed: {}", address, e);
        }
        partial(address, transferred, total, error)
    }

    /// Query block metadata
    pub async fn block_info(&mut self, address: BlockAddress) -> As511Result<BlockInfo> {
        let reply = self.request(&Command::info(address)).await?;
        let &[type_code, number, status, hi, lo] = reply.as_slice() else {
            return Err(As511Error::MalformedFrame(format!(
                "INFO reply must be 5 bytes, got {}",
                reply.len()
            )));
        };

        if type_code != address.block_type().code() || number != address.number() {
            return Err(As511Error::MalformedFrame(format!(
                "INFO reply names block 0x{:02X}/{} instead of {}",
                type_code, number, address
            )));
        }

        Ok(BlockInfo {
            address,
            exists: status != 0,
            length_words: u16::from_be_bytes([hi, lo]),
        })
    }

    async fn request(&mut self, command: &Command) -> As511Result<Vec<u8>> {
        self.session.execute(command).await?.ok_or_else(|| {
            As511Error::MalformedFrame(format!("{} completed without data", command))
        })
    }
}

/// Split a reply into its leading big-endian word and the rest
fn split_word<'a>(reply: &'a [u8], what: &str) -> As511Result<(u16, &'a [u8])> {
    match reply {
        [hi, lo, rest @ ..] => Ok((u16::from_be_bytes([*hi, *lo]), rest)),
        _ => Err(As511Error::MalformedFrame(format!(
            "{} reply too short ({} bytes)",
            what,
            reply.len()
        ))),
    }
}

fn partial(address: BlockAddress, transferred: usize, total: usize, error: As511Error) -> As511Error {
    if error.is_fatal() {
        return error;
    }
    As511Error::PartialTransferFailure {
        address,
        transferred,
        total,
        source: Box::new(error),
    }
}
