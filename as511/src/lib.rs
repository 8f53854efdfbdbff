//! as511 - Rust implementation of the Siemens S5 AS511 protocol
//!
//! This library talks to S5 PLCs over their programming port: it reads,
//! writes and lists program and data blocks.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `as511-core`: Block types, block addresses and the error type
//! - `as511-transport`: Transport layer (serial port, mock)
//! - `as511-session`: Session layer (framing, LRC, command exchange with retries)
//! - `as511-client`: Block transfer engine and client facade
//!
//! # Usage
//!
//! ```no_run
//! use as511::{BlockType, ClientBuilder};
//!
//! # async fn run() -> as511::As511Result<()> {
//! let client = ClientBuilder::new().serial("/dev/ttyUSB0", 9600).connect().await?;
//! let blocks = client.list_blocks(BlockType::Function).collect_all().await?;
//! for address in blocks {
//!     let block = client.read_block(address).await?;
//!     println!("{}: {} bytes", address, block.len());
//! }
//! # Ok(())
//! # }
//! ```

// Re-export core types
pub use as511_core::{
    As511Error, As511Result, BlockAddress, BlockData, BlockInfo, BlockType, MAX_BLOCK_LEN,
    MAX_BLOCK_NUMBER,
};

// Re-export client API
pub use as511_client::{
    As511Client, BlockListing, ClientBuilder, ClientConfig, ConnectionState, DEFAULT_CHUNK_SIZE,
    MAX_CHUNK_SIZE,
};

pub mod client {
    pub use as511_client::*;
}

pub mod session {
    pub use as511_session::*;
}

pub mod transport {
    pub use as511_transport::*;
}
