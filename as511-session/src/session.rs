//! AS511 protocol session
//!
//! A session owns the transport and runs one command exchange at a time:
//! write the command frame, wait for the acknowledgement and, for data
//! commands, the reply frame. Timeouts, NAKs and corrupted replies are
//! retried within a fresh `RetryBudget` per command; transport failures end
//! the exchange at once.

use crate::command::{Command, ReplyKind};
use crate::error::{As511Error, As511Result};
use crate::frame::{FrameCodec, FrameReader, ACK, DLE, NAK, STX};
use crate::retry::RetryBudget;
use crate::state::SessionState;
use crate::statistics::SessionStatistics;
use as511_transport::StreamAccessor;
use std::fmt;
use std::time::Duration;

/// Station address S5 programming ports answer to by default
pub const DEFAULT_PLC_ADDRESS: u8 = 2;

/// Default number of retransmissions per command
pub const DEFAULT_RETRIES: u32 = 3;

/// Default per-read timeout
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(1);

/// Pause before repeating a handshake the PLC answered with NAK
pub const HANDSHAKE_NAK_DELAY: Duration = Duration::from_millis(500);

const HANDSHAKE: &str = "HANDSHAKE";

/// Session parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Station address carried in every frame
    pub plc_address: u8,
    /// Bound on every read while waiting for a reply
    pub timeout: Duration,
    /// Retransmissions allowed per command
    pub retries: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            plc_address: DEFAULT_PLC_ADDRESS,
            timeout: DEFAULT_REPLY_TIMEOUT,
            retries: DEFAULT_RETRIES,
        }
    }
}

/// AS511 protocol session
pub struct ProtocolSession<T: StreamAccessor> {
    transport: T,
    codec: FrameCodec,
    config: SessionConfig,
    state: SessionState,
    statistics: SessionStatistics,
}

impl<T: StreamAccessor> ProtocolSession<T> {
    /// Create a session over a transport
    ///
    /// The transport is expected to be open before the first command.
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            codec: FrameCodec::new(config.plc_address),
            config,
            state: SessionState::Idle,
            statistics: SessionStatistics::new(),
        }
    }

    /// Get the session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Get statistics
    pub fn statistics(&self) -> &SessionStatistics {
        &self.statistics
    }

    /// Clear statistics
    pub fn clear_statistics(&mut self) {
        self.statistics.clear();
    }

    /// Get the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get the transport mutably
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the session and return the transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Run one command exchange with the configured retry budget
    ///
    /// # Returns
    /// The reply payload for data commands, `None` for acknowledge-only
    /// commands
    ///
    /// # Errors
    /// - `OversizedPayload` before anything is written
    /// - `TransportFailure` immediately if the link fails
    /// - `ProtocolTimeout`, `ProtocolRejected`, `ChecksumMismatch` or
    ///   `MalformedFrame` once the retry budget is exhausted
    pub async fn execute(&mut self, command: &Command) -> As511Result<Option<Vec<u8>>> {
        let budget = RetryBudget::new(self.config.retries, self.config.timeout);
        self.run(command, budget).await
    }

    /// Run one command exchange without retries
    pub async fn execute_once(&mut self, command: &Command) -> As511Result<Option<Vec<u8>>> {
        self.run(command, RetryBudget::single(self.config.timeout))
            .await
    }

    async fn run(&mut self, command: &Command, mut budget: RetryBudget) -> As511Result<Option<Vec<u8>>> {
        let wire = self.codec.encode(command.payload())?;
        self.begin(&budget).await?;

        loop {
            if let Err(e) = self.send(&wire).await {
                return Err(self.fail(command, e));
            }

            match self.await_reply(command).await {
                Ok(reply) => {
                    self.complete();
                    return Ok(reply);
                }
                Err(e) if e.is_retryable() => self.absorb(command, e, &mut budget)?,
                Err(e) => return Err(self.fail(command, e)),
            }
        }
    }

    /// Run the connect handshake
    ///
    /// A bare STX is answered by DLE and then ACK when the PLC is ready or
    /// NAK when it is busy. A NAKed attempt is repeated after
    /// `HANDSHAKE_NAK_DELAY`, within the configured retry budget.
    ///
    /// # Errors
    /// - `ProtocolTimeout` if the PLC stays silent on every attempt
    /// - `ProtocolRejected` if the last attempt was NAKed
    /// - `MalformedFrame` if the last attempt got anything but DLE and ACK/NAK
    /// - `TransportFailure` immediately if the link fails
    pub async fn handshake(&mut self) -> As511Result<()> {
        let mut budget = RetryBudget::new(self.config.retries, self.config.timeout);
        self.begin(&budget).await?;

        loop {
            if let Err(e) = self.send(&[STX]).await {
                return Err(self.fail(&HANDSHAKE, e));
            }

            match self.await_handshake().await {
                Ok(()) => {
                    self.complete();
                    log::debug!("Handshake complete");
                    return Ok(());
                }
                Err(e) if e.is_retryable() => {
                    let busy = matches!(e, As511Error::ProtocolRejected { .. });
                    self.absorb(&HANDSHAKE, e, &mut budget)?;
                    if busy {
                        tokio::time::sleep(HANDSHAKE_NAK_DELAY).await;
                    }
                }
                Err(e) => return Err(self.fail(&HANDSHAKE, e)),
            }
        }
    }

    async fn await_handshake(&mut self) -> As511Result<()> {
        let first = self.transport.read_byte().await?;
        if first != DLE {
            return Err(As511Error::MalformedFrame(format!(
                "Expected DLE after STX, got 0x{:02X}",
                first
            )));
        }

        match self.transport.read_byte().await? {
            ACK => {
                log::debug!("<- DLE ACK");
                Ok(())
            }
            NAK => {
                log::warn!("<- DLE NAK, PLC busy");
                Err(As511Error::ProtocolRejected { reason: None })
            }
            other => Err(As511Error::MalformedFrame(format!(
                "Expected ACK or NAK after DLE, got 0x{:02X}",
                other
            ))),
        }
    }

    async fn begin(&mut self, budget: &RetryBudget) -> As511Result<()> {
        if !self.state.is_idle() {
            // A previous exchange was dropped mid-flight
            log::warn!("Session left in state {}, resetting", self.state.as_str());
            self.state = SessionState::Idle;
        }
        self.transport.set_timeout(Some(budget.timeout())).await?;
        self.transition_to(SessionState::AwaitingAck);
        Ok(())
    }

    fn complete(&mut self) {
        self.statistics.exchanges_completed += 1;
        self.transition_to(SessionState::Idle);
    }

    /// Account for a retryable failure
    ///
    /// Returns `Ok` when another attempt is granted, otherwise the error to
    /// surface.
    fn absorb(&mut self, what: &dyn fmt::Display, error: As511Error, budget: &mut RetryBudget) -> As511Result<()> {
        self.record_failure(&error);
        if budget.consume() {
            log::warn!(
                "{} attempt failed: {}; retrying ({} retries left)",
                what,
                error,
                budget.remaining()
            );
            self.statistics.retransmissions += 1;
            self.transition_to(SessionState::AwaitingAck);
            return Ok(());
        }

        let error = if error.is_timeout() {
            As511Error::ProtocolTimeout {
                attempts: budget.attempts(),
            }
        } else {
            error
        };
        Err(self.fail(what, error))
    }

    async fn send(&mut self, wire: &[u8]) -> As511Result<()> {
        self.transport.discard_input().await?;
        log::debug!("-> {:02X?}", wire);
        self.transport.write_all(wire).await?;
        self.transport.flush().await?;
        self.statistics.frames_sent += 1;
        Ok(())
    }

    async fn await_reply(&mut self, command: &Command) -> As511Result<Option<Vec<u8>>> {
        let first = self.transport.read_byte().await?;

        match (first, command.reply_kind()) {
            (ACK, ReplyKind::Ack) => {
                log::debug!("<- ACK");
                Ok(None)
            }
            (ACK, ReplyKind::Data) => {
                log::debug!("<- ACK");
                self.transition_to(SessionState::AwaitingData);
                self.receive_data(None).await.map(Some)
            }
            (STX, ReplyKind::Data) => {
                self.transition_to(SessionState::AwaitingData);
                self.receive_data(Some(STX)).await.map(Some)
            }
            (NAK, _) => {
                let reason = self.read_nak_reason().await?;
                log::warn!("<- NAK for {} (reason {:02X?})", command, reason);
                Err(As511Error::ProtocolRejected { reason })
            }
            (other, _) => Err(As511Error::MalformedFrame(format!(
                "Unexpected reply byte 0x{:02X} to {}",
                other, command
            ))),
        }
    }

    async fn read_nak_reason(&mut self) -> As511Result<Option<u8>> {
        match self.transport.read_byte().await {
            Ok(reason) => Ok(Some(reason)),
            Err(e) if e.is_timeout() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn receive_data(&mut self, start: Option<u8>) -> As511Result<Vec<u8>> {
        let frame = FrameReader::read_frame(&mut self.transport, start).await?;
        self.statistics.frames_received += 1;
        Ok(frame.into_payload())
    }

    fn record_failure(&mut self, error: &As511Error) {
        match error {
            e if e.is_timeout() => self.statistics.timeouts += 1,
            As511Error::ChecksumMismatch { .. } => self.statistics.checksum_errors += 1,
            As511Error::MalformedFrame(_) => self.statistics.framing_errors += 1,
            As511Error::ProtocolRejected { .. } => self.statistics.naks += 1,
            _ => {}
        }
    }

    fn fail(&mut self, what: &dyn fmt::Display, error: As511Error) -> As511Error {
        self.statistics.exchanges_failed += 1;
        self.transition_to(SessionState::Error);
        log::warn!("{} failed: {}", what, error);
        self.transition_to(SessionState::Idle);
        error
    }

    fn transition_to(&mut self, new_state: SessionState) {
        if !self.state.can_transition_to(new_state) {
            log::warn!(
                "Invalid session state transition: {} -> {}",
                self.state.as_str(),
                new_state.as_str()
            );
        }
        log::debug!("Session {} -> {}", self.state.as_str(), new_state.as_str());
        self.state = new_state;
    }
}
