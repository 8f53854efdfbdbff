//! Block addressing and block contents

use crate::block_type::BlockType;
use crate::error::{As511Error, As511Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Highest block number addressable by a single-byte block number
pub const MAX_BLOCK_NUMBER: u32 = 0xFF;

/// Largest block the 16-bit length field can describe
pub const MAX_BLOCK_LEN: usize = u16::MAX as usize;

static ADDRESS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?P<name>[A-Za-z]{2})\s*(?P<number>\d+)|(?P<code>0[xX][0-9A-Fa-f]+|\d+)\s*[:/]\s*(?P<coded_number>\d+))$",
    )
    .expect("block address pattern is valid")
});

/// Address of a block in the PLC block store
///
/// A block is identified by its type and a number in `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockAddress {
    block_type: BlockType,
    number: u8,
}

impl BlockAddress {
    /// Create a new block address
    ///
    /// # Errors
    /// Returns `As511Error::InvalidAddress` if `number` does not fit the
    /// protocol's block number range.
    pub fn new(block_type: BlockType, number: u32) -> As511Result<Self> {
        let number = u8::try_from(number).map_err(|_| {
            As511Error::InvalidAddress(format!(
                "Block number {} out of range (0..={})",
                number, MAX_BLOCK_NUMBER
            ))
        })?;
        Ok(Self { block_type, number })
    }

    /// Create an address from raw wire values
    pub fn from_wire(type_code: u8, number: u8) -> As511Result<Self> {
        Ok(Self {
            block_type: BlockType::from_code(type_code)?,
            number,
        })
    }

    /// Get the block type
    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    /// Get the block number
    pub fn number(&self) -> u8 {
        self.number
    }
}

/// Parses `FB12`, `fb 12`, `0x08:12` or `8/12`
impl FromStr for BlockAddress {
    type Err = As511Error;

    fn from_str(s: &str) -> As511Result<Self> {
        let caps = ADDRESS_PATTERN
            .captures(s.trim())
            .ok_or_else(|| As511Error::InvalidAddress(format!("Invalid block address: {}", s)))?;

        let (block_type, number) = match (caps.name("name"), caps.name("code")) {
            (Some(name), _) => (
                BlockType::from_short_name(name.as_str())?,
                caps.name("number"),
            ),
            (None, Some(code)) => (code.as_str().parse::<BlockType>()?, caps.name("coded_number")),
            (None, None) => {
                return Err(As511Error::InvalidAddress(format!("Invalid block address: {}", s)));
            }
        };

        let number = number
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .ok_or_else(|| As511Error::InvalidAddress(format!("Invalid block number in: {}", s)))?;

        Self::new(block_type, number)
    }
}

impl fmt::Display for BlockAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.block_type, self.number)
    }
}

/// Raw contents of one block
///
/// Produced by a block read and consumed by a block write. The client never
/// keeps a copy of the bytes once it has handed them over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockData {
    address: BlockAddress,
    #[serde(with = "serde_bytes")]
    bytes: Vec<u8>,
}

impl BlockData {
    /// Create block data for an address
    pub fn new(address: BlockAddress, bytes: Vec<u8>) -> Self {
        Self { address, bytes }
    }

    /// Get the block address
    pub fn address(&self) -> BlockAddress {
        self.address
    }

    /// Get the block contents
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get the block length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check whether the block is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Take ownership of the block contents
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Check that the block can be written to the PLC
    ///
    /// S5 blocks are stored in 16-bit words, so the length must be a
    /// non-zero even number that fits the 16-bit length field.
    pub fn validate_for_write(&self) -> As511Result<()> {
        if self.bytes.is_empty() {
            return Err(As511Error::InvalidAddress(format!(
                "Refusing to write empty block {}",
                self.address
            )));
        }
        if self.bytes.len() > MAX_BLOCK_LEN {
            return Err(As511Error::InvalidAddress(format!(
                "Block {} is {} bytes, maximum is {}",
                self.address,
                self.bytes.len(),
                MAX_BLOCK_LEN
            )));
        }
        if self.bytes.len() % 2 != 0 {
            return Err(As511Error::InvalidAddress(format!(
                "Block {} has odd length {}, blocks are stored in words",
                self.address,
                self.bytes.len()
            )));
        }
        Ok(())
    }
}

/// Block metadata returned by an info query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub address: BlockAddress,
    pub exists: bool,
    /// Block length in 16-bit words
    pub length_words: u16,
}

impl BlockInfo {
    /// Block length in bytes
    pub fn byte_len(&self) -> usize {
        self.length_words as usize * 2
    }
}
