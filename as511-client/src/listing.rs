//! Lazy block listing
//!
//! AS511 has no directory command. A listing walks the block numbers of one
//! type with INFO queries and keeps the ones the PLC reports as present.

use crate::client::As511Client;
use crate::error::{As511Error, As511Result};
use as511_core::{BlockAddress, BlockType, MAX_BLOCK_NUMBER};
use as511_transport::TransportLayer;

/// Blocks of one type, discovered number by number
///
/// INFO queries are sent only when iteration reaches the end of what has
/// already been discovered. Everything found is cached, so `rewind` restarts
/// iteration without going back to the PLC.
///
/// A number the PLC refuses to describe is treated as absent. Any other
/// failure is returned and the next call queries the same number again.
///
/// # Usage Example
///
/// ```rust,no_run
/// # async fn list(client: &as511_client::As511Client<as511_transport::SerialTransport>) -> as511_core::As511Result<()> {
/// let mut blocks = client.list_blocks(as511_core::BlockType::Function);
/// while let Some(address) = blocks.next().await? {
///     println!("{}", address);
/// }
/// # Ok(())
/// # }
/// ```
pub struct BlockListing<'c, T: TransportLayer> {
    client: &'c As511Client<T>,
    block_type: BlockType,
    cache: Vec<BlockAddress>,
    position: usize,
    next_number: u32,
    complete: bool,
}

impl<'c, T: TransportLayer> BlockListing<'c, T> {
    pub(crate) fn new(client: &'c As511Client<T>, block_type: BlockType) -> Self {
        Self {
            client,
            block_type,
            cache: Vec::new(),
            position: 0,
            next_number: 0,
            complete: false,
        }
    }

    /// Get the listed block type
    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    /// Get the next block in number order, querying the PLC if needed
    ///
    /// Returns `Ok(None)` once every block number has been checked.
    pub async fn next(&mut self) -> As511Result<Option<BlockAddress>> {
        loop {
            if let Some(address) = self.cache.get(self.position) {
                self.position += 1;
                return Ok(Some(*address));
            }
            if self.complete {
                return Ok(None);
            }
            self.query_next().await?;
        }
    }

    async fn query_next(&mut self) -> As511Result<()> {
        let address = BlockAddress::new(self.block_type, self.next_number)?;

        match self.client.block_info(address).await {
            Ok(info) if info.exists && info.address.block_type() == self.block_type => {
                log::debug!("Found {} ({} bytes)", address, info.byte_len());
                self.cache.push(address);
            }
            Ok(_) => {}
            Err(As511Error::ProtocolRejected { reason }) => {
                log::debug!("INFO for {} rejected (reason {:02X?}), treating as absent", address, reason);
            }
            Err(e) => return Err(e),
        }

        self.next_number += 1;
        self.complete = self.next_number > MAX_BLOCK_NUMBER;
        Ok(())
    }

    /// Restart iteration from the first block
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Drain the remaining blocks
    pub async fn collect_all(&mut self) -> As511Result<Vec<BlockAddress>> {
        let mut blocks = Vec::new();
        while let Some(address) = self.next().await? {
            blocks.push(address);
        }
        Ok(blocks)
    }

    /// Blocks discovered so far
    pub fn cached(&self) -> &[BlockAddress] {
        &self.cache
    }

    /// Check whether every block number has been queried
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}
