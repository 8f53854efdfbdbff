//! AS511 client implementation
//!
//! This crate provides the block-level operations on top of the protocol
//! session: reading, writing and listing PLC blocks, and the client facade
//! that owns the connection.

pub mod builder;
pub mod client;
pub mod config;
pub mod listing;
pub mod transfer;

#[cfg(test)]
mod testing;

pub use as511_core::error;
pub use as511_core::{As511Error, As511Result};
pub use builder::ClientBuilder;
pub use client::{As511Client, ConnectionState};
pub use config::{ClientConfig, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
pub use listing::BlockListing;
pub use transfer::BlockTransfer;
