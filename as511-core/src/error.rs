use crate::block::BlockAddress;
use thiserror::Error;

/// Main error type for AS511 operations
///
/// Every public operation of the client returns exactly one of these kinds.
#[derive(Error, Debug)]
pub enum As511Error {
    #[error("Not connected")]
    NotConnected,

    /// The serial link itself failed.
    ///
    /// A read timeout is reported with `io::ErrorKind::TimedOut` and is the
    /// only transport failure the session layer retries.
    #[error("Transport failure: {0}")]
    TransportFailure(#[from] std::io::Error),

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Checksum mismatch: computed 0x{computed:02X}, received 0x{received:02X}")]
    ChecksumMismatch { computed: u8, received: u8 },

    #[error("No reply from PLC after {attempts} attempt(s)")]
    ProtocolTimeout { attempts: u32 },

    #[error("PLC rejected request (reason code: {reason:?})")]
    ProtocolRejected { reason: Option<u8> },

    #[error("Payload of {len} bytes exceeds frame capacity of {max} bytes")]
    OversizedPayload { len: usize, max: usize },

    #[error("Transfer of {address} failed after {transferred} of {total} bytes: {source}")]
    PartialTransferFailure {
        address: BlockAddress,
        transferred: usize,
        total: usize,
        source: Box<As511Error>,
    },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl As511Error {
    /// Build a transport timeout error
    pub fn timed_out(message: &str) -> Self {
        As511Error::TransportFailure(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            message.to_string(),
        ))
    }

    /// Check whether this error is a transport read timeout
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            As511Error::TransportFailure(e) if e.kind() == std::io::ErrorKind::TimedOut
        )
    }

    /// Check whether a failed exchange may be retried
    ///
    /// Timeouts, framing errors, checksum errors and NAKs are caused by line
    /// noise or a busy PLC. Everything else is surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        self.is_timeout()
            || matches!(
                self,
                As511Error::MalformedFrame(_)
                    | As511Error::ChecksumMismatch { .. }
                    | As511Error::ProtocolRejected { .. }
            )
    }

    /// Check whether the link is unusable after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, As511Error::TransportFailure(_)) && !self.is_timeout()
    }
}

/// Result type alias for AS511 operations
pub type As511Result<T> = Result<T, As511Error>;
