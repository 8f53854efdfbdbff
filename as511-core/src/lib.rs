//! Core types and utilities for the AS511 protocol
//!
//! This crate provides the block model (types, addresses, block contents and
//! metadata) and the error type shared by every layer of the AS511 client.

pub mod block;
pub mod block_type;
pub mod error;

pub use block::{BlockAddress, BlockData, BlockInfo, MAX_BLOCK_LEN, MAX_BLOCK_NUMBER};
pub use block_type::BlockType;
pub use error::{As511Error, As511Result};
