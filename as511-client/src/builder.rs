//! Client builder
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use as511_client::ClientBuilder;
//! use std::time::Duration;
//!
//! # async fn run() -> as511_core::As511Result<()> {
//! let client = ClientBuilder::new()
//!     .serial("/dev/ttyUSB0", 9600)
//!     .plc_address(2)
//!     .timeout(Duration::from_millis(500))
//!     .retries(5)
//!     .connect()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::client::As511Client;
use crate::config::{millis, ClientConfig};
use crate::error::As511Result;
use as511_transport::{SerialTransport, TransportLayer};
use std::time::Duration;

/// Builder for `As511Client`
///
/// Starts from `ClientConfig::default()`; every setter overrides one field.
/// The configuration is validated when the client is built.
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Create a builder with default settings
    ///
    /// # Default Settings
    /// - Station address: 2
    /// - Baud rate: 9600
    /// - Timeout: 1 s per read
    /// - Retries: 3
    /// - Chunk size: 128 bytes
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn from_config(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Configure the serial port
    ///
    /// # Arguments
    /// * `port_name` - Serial port name (e.g., "/dev/ttyUSB0" or "COM1")
    /// * `baud_rate` - Baud rate (S5 programming ports run at 9600)
    pub fn serial(mut self, port_name: &str, baud_rate: u32) -> Self {
        self.config.port_name = port_name.to_string();
        self.config.baud_rate = baud_rate;
        self
    }

    /// Configure the PLC station address
    pub fn plc_address(mut self, address: u8) -> Self {
        self.config.plc_address = address;
        self
    }

    /// Configure the per-read timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = millis(timeout);
        self
    }

    /// Configure retransmissions per command
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Configure the WRITE_DATA segment size
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Get the configuration built so far
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build a disconnected serial client
    ///
    /// # Errors
    /// `InvalidConfig` if no port is configured or a parameter is out of range
    pub fn build(self) -> As511Result<As511Client<SerialTransport>> {
        As511Client::serial(self.config)
    }

    /// Build a disconnected client over a caller-supplied transport
    pub fn build_with_transport<T: TransportLayer>(self, transport: T) -> As511Result<As511Client<T>> {
        As511Client::new(transport, self.config)
    }

    /// Build a serial client and connect it
    pub async fn connect(self) -> As511Result<As511Client<SerialTransport>> {
        let client = self.build()?;
        client.connect().await?;
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::As511Error;
    use crate::testing::{pattern, FakePlc};
    use as511_core::BlockAddress;

    #[test]
    fn test_setters() {
        let builder = ClientBuilder::new()
            .serial("COM3", 19200)
            .plc_address(4)
            .timeout(Duration::from_millis(250))
            .retries(1)
            .chunk_size(64);

        let config = builder.config();
        assert_eq!(config.port_name, "COM3");
        assert_eq!(config.baud_rate, 19200);
        assert_eq!(config.plc_address, 4);
        assert_eq!(config.timeout_ms, 250);
        assert_eq!(config.retries, 1);
        assert_eq!(config.chunk_size, 64);
    }

    #[test]
    fn test_build_requires_port() {
        assert!(matches!(ClientBuilder::new().build(), Err(As511Error::InvalidConfig(_))));
    }

    #[test]
    fn test_build_serial_does_not_open() {
        let client = ClientBuilder::new().serial("/dev/ttyUSB0", 9600).build().unwrap();
        assert_eq!(client.config().port_name, "/dev/ttyUSB0");
    }

    #[test]
    fn test_rejects_oversized_chunk() {
        let plc = FakePlc::new();
        let (transport, _handle) = plc.transport();
        let result = ClientBuilder::new().chunk_size(300).build_with_transport(transport);
        assert!(matches!(result, Err(As511Error::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_settings_reach_the_session() {
        let plc = FakePlc::new().with_block("DB2", pattern(8));
        let (transport, handle) = plc.transport();
        let client = ClientBuilder::new()
            .plc_address(9)
            .timeout(Duration::from_millis(300))
            .retries(0)
            .build_with_transport(transport)
            .unwrap();
        client.connect().await.unwrap();

        let address: BlockAddress = "DB2".parse().unwrap();
        client.read_block(address).await.unwrap();
        assert_eq!(handle.timeout(), Some(Duration::from_millis(300)));

        // Station address follows STX and LEN; the bare handshake STX carries none
        let writes = handle.writes();
        assert_eq!(writes[0], vec![as511_session::STX]);
        assert!(writes.len() > 1);
        assert!(writes[1..].iter().all(|w| w[2] == 9));
    }

    #[test]
    fn test_huge_timeout_saturates() {
        let builder = ClientBuilder::new().timeout(Duration::MAX);
        assert_eq!(builder.config().timeout_ms, u64::MAX);
    }
}
