//! Client configuration

use crate::error::{As511Error, As511Result};
use as511_session::{SessionConfig, DEFAULT_PLC_ADDRESS, DEFAULT_RETRIES, MAX_WRITE_CHUNK};
use as511_transport::serial::{DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT};
use as511_transport::SerialSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default WRITE_DATA segment size in bytes
pub const DEFAULT_CHUNK_SIZE: usize = 128;

/// Largest segment that still fits a single frame
pub const MAX_CHUNK_SIZE: usize = MAX_WRITE_CHUNK;

/// Convert a duration to whole milliseconds, saturating at `u64::MAX`
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Client configuration
///
/// Every field has a default, so a partial document deserializes into a
/// usable configuration:
///
/// ```json
/// { "port_name": "/dev/ttyUSB0", "retries": 5 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Serial device path (e.g. "/dev/ttyUSB0" or "COM1")
    pub port_name: String,
    pub baud_rate: u32,
    /// Station address of the PLC
    pub plc_address: u8,
    /// Per-read timeout in milliseconds
    pub timeout_ms: u64,
    /// Retransmissions per command
    pub retries: u32,
    /// WRITE_DATA segment size in bytes
    pub chunk_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            plc_address: DEFAULT_PLC_ADDRESS,
            timeout_ms: millis(DEFAULT_TIMEOUT),
            retries: DEFAULT_RETRIES,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ClientConfig {
    /// Get the per-read timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Check every parameter that does not depend on the transport
    pub fn validate(&self) -> As511Result<()> {
        if self.timeout_ms == 0 {
            return Err(As511Error::InvalidConfig(
                "Timeout must be greater than zero".to_string(),
            ));
        }
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(As511Error::InvalidConfig(format!(
                "Chunk size {} out of range (1..={})",
                self.chunk_size, MAX_CHUNK_SIZE
            )));
        }
        Ok(())
    }

    /// Check the parameters needed to open a serial port
    pub fn validate_serial(&self) -> As511Result<()> {
        self.validate()?;
        if self.port_name.trim().is_empty() {
            return Err(As511Error::InvalidConfig(
                "Serial port name must be set".to_string(),
            ));
        }
        if self.baud_rate == 0 {
            return Err(As511Error::InvalidConfig(
                "Baud rate must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Derive the session parameters
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            plc_address: self.plc_address,
            timeout: self.timeout(),
            retries: self.retries,
        }
    }

    /// Derive the serial port settings
    pub fn serial_settings(&self) -> SerialSettings {
        SerialSettings::with_timeout(self.port_name.clone(), self.baud_rate, self.timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.plc_address, 2);
        assert_eq!(config.timeout(), Duration::from_secs(1));
        assert_eq!(config.retries, 3);
        assert_eq!(config.chunk_size, 128);
        assert!(config.validate().is_ok());
        assert!(matches!(config.validate_serial(), Err(As511Error::InvalidConfig(_))));
    }

    #[test]
    fn test_chunk_size_bounds() {
        assert_eq!(MAX_CHUNK_SIZE, 250);
        let mut config = ClientConfig {
            chunk_size: MAX_CHUNK_SIZE,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        config.chunk_size = MAX_CHUNK_SIZE + 1;
        assert!(matches!(config.validate(), Err(As511Error::InvalidConfig(_))));
        config.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ClientConfig {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(As511Error::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{ "port_name": "/dev/ttyUSB0", "retries": 5 }"#).unwrap();
        assert_eq!(config.port_name, "/dev/ttyUSB0");
        assert_eq!(config.retries, 5);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(config.validate_serial().is_ok());

        let session = config.session_config();
        assert_eq!(session.retries, 5);
        assert_eq!(session.plc_address, 2);
        assert_eq!(config.serial_settings().port_name, "/dev/ttyUSB0");
    }

    #[test]
    fn test_millis_saturates() {
        assert_eq!(millis(Duration::from_millis(1500)), 1500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }
}
