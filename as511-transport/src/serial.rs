//! Serial port transport implementation

use crate::error::{As511Error, As511Result};
use crate::stream::{StreamAccessor, TransportLayer};
use async_trait::async_trait;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::SerialStream;

/// Default baud rate of S5 programming ports
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default per-read timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Wrapper for SerialStream that implements Debug
struct DebugSerialStream(SerialStream);

impl fmt::Debug for DebugSerialStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialStream").finish()
    }
}

impl Deref for DebugSerialStream {
    type Target = SerialStream;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DebugSerialStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Serial port transport layer settings
#[derive(Debug, Clone)]
pub struct SerialSettings {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: tokio_serial::DataBits,
    pub stop_bits: tokio_serial::StopBits,
    pub parity: tokio_serial::Parity,
    pub flow_control: tokio_serial::FlowControl,
    pub timeout: Option<Duration>,
}

impl SerialSettings {
    /// Create new serial settings with default parameters (8N1, 1 s timeout)
    pub fn new(port_name: String, baud_rate: u32) -> Self {
        Self::with_timeout(port_name, baud_rate, DEFAULT_TIMEOUT)
    }

    /// Create serial settings with timeout
    pub fn with_timeout(port_name: String, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            port_name,
            baud_rate,
            data_bits: tokio_serial::DataBits::Eight,
            stop_bits: tokio_serial::StopBits::One,
            parity: tokio_serial::Parity::None,
            flow_control: tokio_serial::FlowControl::None,
            timeout: Some(timeout),
        }
    }
}

/// Serial port transport layer implementation
#[derive(Debug)]
pub struct SerialTransport {
    stream: Option<DebugSerialStream>,
    settings: SerialSettings,
    closed: bool,
}

impl SerialTransport {
    /// Create a new serial transport layer
    pub fn new(settings: SerialSettings) -> Self {
        Self {
            stream: None,
            settings,
            closed: true,
        }
    }

    /// Create serial transport with port name and baud rate
    pub fn new_simple(port_name: String, baud_rate: u32) -> Self {
        Self::new(SerialSettings::new(port_name, baud_rate))
    }

    /// Get the transport settings
    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    fn stream_mut(&mut self) -> As511Result<&mut DebugSerialStream> {
        self.stream.as_mut().ok_or_else(|| {
            As511Error::TransportFailure(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "Serial stream not connected",
            ))
        })
    }
}

#[async_trait]
impl TransportLayer for SerialTransport {
    async fn open(&mut self) -> As511Result<()> {
        if !self.closed {
            return Err(As511Error::TransportFailure(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Connection has already been opened",
            )));
        }

        let builder = tokio_serial::new(&self.settings.port_name, self.settings.baud_rate)
            .data_bits(self.settings.data_bits)
            .stop_bits(self.settings.stop_bits)
            .parity(self.settings.parity)
            .flow_control(self.settings.flow_control);

        let stream = SerialStream::open(&builder).map_err(|e| {
            As511Error::TransportFailure(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to open serial port {}: {}", self.settings.port_name, e),
            ))
        })?;

        log::info!(
            "Opened {} @ {}bps",
            self.settings.port_name,
            self.settings.baud_rate
        );
        self.stream = Some(DebugSerialStream(stream));
        self.closed = false;
        Ok(())
    }
}

#[async_trait]
impl StreamAccessor for SerialTransport {
    async fn set_timeout(&mut self, timeout: Option<Duration>) -> As511Result<()> {
        self.settings.timeout = timeout;
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> As511Result<usize> {
        let timeout = self.settings.timeout;
        let stream = self.stream_mut()?;

        let result = if let Some(timeout) = timeout {
            tokio::time::timeout(timeout, stream.read(buf))
                .await
                .map_err(|_| As511Error::timed_out("Serial read timed out"))?
                .map_err(As511Error::TransportFailure)
        } else {
            stream.read(buf).await.map_err(As511Error::TransportFailure)
        };

        match result {
            Ok(0) => {
                self.closed = true;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(e) => {
                self.closed = true;
                Err(e)
            }
        }
    }

    async fn write(&mut self, buf: &[u8]) -> As511Result<usize> {
        let stream = self.stream_mut()?;
        stream.write(buf).await.map_err(As511Error::TransportFailure)
    }

    async fn flush(&mut self) -> As511Result<()> {
        let stream = self.stream_mut()?;
        stream.flush().await.map_err(As511Error::TransportFailure)
    }

    async fn discard_input(&mut self) -> As511Result<()> {
        let stream = self.stream_mut()?;
        tokio_serial::SerialPort::clear(&stream.0, tokio_serial::ClearBuffer::Input)
            .map_err(|e| As511Error::TransportFailure(e.into()))
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(&mut self) -> As511Result<()> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.flush().await;
            log::info!("Serial port {} closed", self.settings.port_name);
        }
        self.closed = true;
        Ok(())
    }
}
