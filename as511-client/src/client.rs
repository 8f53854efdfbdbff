//! AS511 client facade
//!
//! `As511Client` owns one connection to one PLC. All block operations take
//! `&self`; the session sits behind an async mutex, so a client shared between
//! tasks still runs one command exchange (and one whole block transfer) at a
//! time.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use as511_client::As511Client;
//! use std::time::Duration;
//!
//! # async fn run() -> as511_core::As511Result<()> {
//! let client = As511Client::open_serial("/dev/ttyUSB0", 9600, Duration::from_secs(1)).await?;
//! let block = client.read_block("FB12".parse()?).await?;
//! client.write_block(&block).await?;
//! client.disconnect().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::{millis, ClientConfig};
use crate::error::{As511Error, As511Result};
use crate::listing::BlockListing;
use crate::transfer::BlockTransfer;
use as511_core::{BlockAddress, BlockData, BlockInfo, BlockType};
use as511_session::{ProtocolSession, SessionStatistics};
use as511_transport::{SerialTransport, TransportLayer};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Transport is closed (initial state)
    #[default]
    Closed,
    /// Transport is open, block operations are allowed
    Open,
}

impl ConnectionState {
    /// Check if block operations are allowed
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

struct Link<T: TransportLayer> {
    session: ProtocolSession<T>,
    state: ConnectionState,
}

/// AS511 client
pub struct As511Client<T: TransportLayer> {
    link: Mutex<Link<T>>,
    config: ClientConfig,
}

impl<T: TransportLayer> As511Client<T> {
    /// Create a disconnected client over a transport
    ///
    /// # Errors
    /// `InvalidConfig` if the configuration is rejected
    pub fn new(transport: T, config: ClientConfig) -> As511Result<Self> {
        config.validate()?;
        Ok(Self {
            link: Mutex::new(Link {
                session: ProtocolSession::new(transport, config.session_config()),
                state: ConnectionState::Closed,
            }),
            config,
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Open the transport and run the connect handshake
    ///
    /// Connecting an open client does nothing. If the PLC does not complete
    /// the handshake the transport is closed again.
    ///
    /// # Errors
    /// - `TransportFailure` if the transport cannot be opened
    /// - `ProtocolTimeout`, `ProtocolRejected` or `MalformedFrame` if the
    ///   handshake fails
    pub async fn connect(&self) -> As511Result<()> {
        let mut link = self.link.lock().await;
        if link.state.is_open() && !link.session.transport().is_closed() {
            return Ok(());
        }

        link.state = ConnectionState::Closed;
        link.session.transport_mut().open().await?;
        if let Err(e) = link.session.handshake().await {
            log::warn!("Handshake with station {} failed: {}", self.config.plc_address, e);
            if let Err(close_error) = link.session.transport_mut().close().await {
                log::warn!("Failed to close transport after handshake failure: {}", close_error);
            }
            return Err(e);
        }
        link.state = ConnectionState::Open;
        log::info!("Connected to PLC at station address {}", self.config.plc_address);
        Ok(())
    }

    /// Close the transport
    ///
    /// Disconnecting a closed client does nothing.
    pub async fn disconnect(&self) -> As511Result<()> {
        let mut link = self.link.lock().await;
        if !link.state.is_open() {
            return Ok(());
        }

        link.state = ConnectionState::Closed;
        link.session.transport_mut().close().await?;
        log::info!("Disconnected from PLC at station address {}", self.config.plc_address);
        Ok(())
    }

    /// Get the connection state
    pub async fn state(&self) -> ConnectionState {
        let link = self.link.lock().await;
        if link.session.transport().is_closed() {
            ConnectionState::Closed
        } else {
            link.state
        }
    }

    /// Check if the client is connected
    pub async fn is_connected(&self) -> bool {
        self.state().await.is_open()
    }

    /// Read a whole block
    pub async fn read_block(&self, address: BlockAddress) -> As511Result<BlockData> {
        let mut link = self.connected().await?;
        self.transfer(&mut link).read_block(address).await
    }

    /// Write a whole block
    pub async fn write_block(&self, block: &BlockData) -> As511Result<()> {
        let mut link = self.connected().await?;
        self.transfer(&mut link).write_block(block).await
    }

    /// Query block metadata
    pub async fn block_info(&self, address: BlockAddress) -> As511Result<BlockInfo> {
        let mut link = self.connected().await?;
        self.transfer(&mut link).block_info(address).await
    }

    /// List the blocks of a type
    ///
    /// Nothing is sent until the listing is iterated.
    pub fn list_blocks(&self, block_type: BlockType) -> BlockListing<'_, T> {
        BlockListing::new(self, block_type)
    }

    /// Get a snapshot of the session statistics
    pub async fn statistics(&self) -> SessionStatistics {
        self.link.lock().await.session.statistics().clone()
    }

    /// Clear the session statistics
    pub async fn clear_statistics(&self) {
        self.link.lock().await.session.clear_statistics();
    }

    async fn connected(&self) -> As511Result<MutexGuard<'_, Link<T>>> {
        let link = self.link.lock().await;
        if !link.state.is_open() || link.session.transport().is_closed() {
            return Err(As511Error::NotConnected);
        }
        Ok(link)
    }

    fn transfer<'a>(&self, link: &'a mut Link<T>) -> BlockTransfer<'a, T> {
        BlockTransfer::new(&mut link.session, self.config.chunk_size)
    }
}

impl As511Client<SerialTransport> {
    /// Create a disconnected client for the serial port named in `config`
    pub fn serial(config: ClientConfig) -> As511Result<Self> {
        config.validate_serial()?;
        let transport = SerialTransport::new(config.serial_settings());
        Self::new(transport, config)
    }

    /// Open a serial port and connect with default protocol settings
    pub async fn open_serial(port_name: &str, baud_rate: u32, timeout: Duration) -> As511Result<Self> {
        let config = ClientConfig {
            port_name: port_name.to_string(),
            baud_rate,
            timeout_ms: millis(timeout),
            ..ClientConfig::default()
        };
        let client = Self::serial(config)?;
        client.connect().await?;
        Ok(client)
    }
}
