//! Scriptable in-memory transport
//!
//! `MockTransport` stands in for a serial port in tests and simulations. Every
//! `write` is recorded and handed to a responder closure, whose `MockReply`
//! decides what the "PLC" sends back. Reads drain the queued reply bytes and
//! fail immediately with a timeout once the queue is empty, so retry logic can
//! be exercised without waiting on real timers.

use crate::error::{As511Error, As511Result};
use crate::stream::{StreamAccessor, TransportLayer};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Reaction of the simulated peer to one write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Queue these bytes for reading
    Bytes(Vec<u8>),
    /// Send nothing (the next read times out)
    Silence,
    /// Fail the write itself
    WriteError,
}

type Responder = Box<dyn FnMut(&[u8]) -> MockReply + Send>;

struct MockState {
    responder: Responder,
    writes: Vec<Vec<u8>>,
    pending: VecDeque<u8>,
    open: bool,
    fail_open: bool,
    timeout: Option<Duration>,
}

/// Shared view of a mock transport's state
///
/// The handle stays with the test while the transport itself is moved into a
/// session or client.
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// All writes seen so far, one entry per `write` call
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.lock().writes.clone()
    }

    /// Number of writes seen so far
    pub fn write_count(&self) -> usize {
        self.lock().writes.len()
    }

    /// Forget recorded writes
    pub fn clear_writes(&self) {
        self.lock().writes.clear();
    }

    /// Queue bytes for reading without a preceding write
    pub fn push_input(&self, bytes: &[u8]) {
        self.lock().pending.extend(bytes.iter().copied());
    }

    /// Replace the responder
    pub fn set_responder<F>(&self, responder: F)
    where
        F: FnMut(&[u8]) -> MockReply + Send + 'static,
    {
        self.lock().responder = Box::new(responder);
    }

    /// Make the next `open` fail
    pub fn fail_open(&self, fail: bool) {
        self.lock().fail_open = fail;
    }

    /// Check whether the transport is open
    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    /// Last timeout configured through `set_timeout`
    pub fn timeout(&self) -> Option<Duration> {
        self.lock().timeout
    }
}

/// In-memory transport driven by a responder closure
pub struct MockTransport {
    handle: MockHandle,
}

impl MockTransport {
    /// Create a mock transport and the handle used to inspect it
    pub fn new<F>(responder: F) -> (Self, MockHandle)
    where
        F: FnMut(&[u8]) -> MockReply + Send + 'static,
    {
        let handle = MockHandle {
            state: Arc::new(Mutex::new(MockState {
                responder: Box::new(responder),
                writes: Vec::new(),
                pending: VecDeque::new(),
                open: false,
                fail_open: false,
                timeout: None,
            })),
        };
        (
            Self {
                handle: handle.clone(),
            },
            handle,
        )
    }

    /// Create a mock transport whose peer never answers
    pub fn silent() -> (Self, MockHandle) {
        Self::new(|_| MockReply::Silence)
    }

    /// Create a mock transport that replays `replies` in order, one per write
    ///
    /// Writes beyond the end of the script are answered with silence.
    pub fn scripted(replies: Vec<MockReply>) -> (Self, MockHandle) {
        let mut replies = VecDeque::from(replies);
        Self::new(move |_| replies.pop_front().unwrap_or(MockReply::Silence))
    }

    fn not_connected() -> As511Error {
        As511Error::TransportFailure(std::io::Error::new(
            std::io::ErrorKind::NotConnected,
            "Mock transport not open",
        ))
    }
}

#[async_trait]
impl TransportLayer for MockTransport {
    async fn open(&mut self) -> As511Result<()> {
        let mut state = self.handle.lock();
        if state.fail_open {
            return Err(As511Error::TransportFailure(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Mock port unavailable",
            )));
        }
        state.open = true;
        Ok(())
    }
}

#[async_trait]
impl StreamAccessor for MockTransport {
    async fn set_timeout(&mut self, timeout: Option<Duration>) -> As511Result<()> {
        self.handle.lock().timeout = timeout;
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> As511Result<usize> {
        let mut state = self.handle.lock();
        if !state.open {
            return Err(Self::not_connected());
        }
        if buf.is_empty() {
            return Ok(0);
        }
        if state.pending.is_empty() {
            return Err(As511Error::timed_out("Mock read timed out"));
        }
        let n = buf.len().min(state.pending.len());
        for (slot, byte) in buf.iter_mut().zip(state.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn write(&mut self, buf: &[u8]) -> As511Result<usize> {
        let mut state = self.handle.lock();
        if !state.open {
            return Err(Self::not_connected());
        }
        match (state.responder)(buf) {
            MockReply::WriteError => Err(As511Error::TransportFailure(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "Mock write failed",
            ))),
            reply => {
                state.writes.push(buf.to_vec());
                if let MockReply::Bytes(bytes) = reply {
                    state.pending.extend(bytes);
                }
                Ok(buf.len())
            }
        }
    }

    async fn flush(&mut self) -> As511Result<()> {
        Ok(())
    }

    async fn discard_input(&mut self) -> As511Result<()> {
        self.handle.lock().pending.clear();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        !self.handle.lock().open
    }

    async fn close(&mut self) -> As511Result<()> {
        let mut state = self.handle.lock();
        state.open = false;
        state.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies() {
        let (mut transport, handle) = MockTransport::scripted(vec![
            MockReply::Bytes(vec![0x06]),
            MockReply::Silence,
        ]);
        transport.open().await.unwrap();

        transport.write_all(&[0x01, 0x02]).await.unwrap();
        assert_eq!(transport.read_byte().await.unwrap(), 0x06);

        transport.write_all(&[0x03]).await.unwrap();
        assert!(transport.read_byte().await.unwrap_err().is_timeout());

        assert_eq!(handle.writes(), vec![vec![0x01, 0x02], vec![0x03]]);
    }

    #[tokio::test]
    async fn test_write_error_is_not_recorded() {
        let (mut transport, handle) = MockTransport::new(|_| MockReply::WriteError);
        transport.open().await.unwrap();
        let err = transport.write_all(&[0x02]).await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(handle.write_count(), 0);
    }

    #[tokio::test]
    async fn test_closed_transport_rejects_io() {
        let (mut transport, handle) = MockTransport::silent();
        assert!(transport.is_closed());
        assert!(transport.write(&[0x00]).await.is_err());

        handle.fail_open(true);
        assert!(transport.open().await.is_err());
        handle.fail_open(false);
        transport.open().await.unwrap();
        assert!(handle.is_open());

        transport.close().await.unwrap();
        assert!(transport.is_closed());
    }

    #[tokio::test]
    async fn test_discard_input() {
        let (mut transport, handle) = MockTransport::silent();
        transport.open().await.unwrap();
        handle.push_input(&[0xAA, 0xBB]);
        transport.discard_input().await.unwrap();
        assert!(transport.read_byte().await.unwrap_err().is_timeout());
    }
}
