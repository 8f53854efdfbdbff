//! Simulated PLC for client tests
//!
//! `FakePlc` answers decoded AS511 commands from an in-memory block table and
//! plugs into `MockTransport` as its responder. A fault hook sees every
//! command payload first and may replace the reply. The connect handshake
//! is always accepted and never recorded as a command.

use as511_core::{BlockAddress, BlockData};
use as511_session::command::{
    CMD_ABORT, CMD_INFO, CMD_READ, CMD_READ_NEXT, CMD_WRITE_BEGIN, CMD_WRITE_DATA, CMD_WRITE_END,
};
use as511_session::{FrameCodec, ACK, DEFAULT_PLC_ADDRESS, DLE, NAK, STX};
use as511_transport::{MockHandle, MockReply, MockTransport};
use std::sync::{Arc, Mutex, MutexGuard};

type Fault = Box<dyn FnMut(&[u8]) -> Option<MockReply> + Send>;

struct PlcState {
    codec: FrameCodec,
    blocks: Vec<BlockData>,
    read_chunk: usize,
    ack_before_data: bool,
    pending_write: Option<(BlockAddress, usize, Vec<u8>)>,
    commands: Vec<Vec<u8>>,
    fault: Option<Fault>,
}

#[derive(Clone)]
pub(crate) struct FakePlc {
    state: Arc<Mutex<PlcState>>,
}

impl FakePlc {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(PlcState {
                codec: FrameCodec::new(DEFAULT_PLC_ADDRESS),
                blocks: Vec::new(),
                read_chunk: 128,
                ack_before_data: true,
                pending_write: None,
                commands: Vec::new(),
                fault: None,
            })),
        }
    }

    /// Add a block
    pub fn with_block(self, address: &str, bytes: Vec<u8>) -> Self {
        let address: BlockAddress = address.parse().unwrap();
        self.lock().blocks.push(BlockData::new(address, bytes));
        self
    }

    pub fn read_chunk(self, size: usize) -> Self {
        self.lock().read_chunk = size;
        self
    }

    /// Send data frames without a leading ACK
    pub fn without_ack(self) -> Self {
        self.lock().ack_before_data = false;
        self
    }

    pub fn inject<F>(&self, fault: F)
    where
        F: FnMut(&[u8]) -> Option<MockReply> + Send + 'static,
    {
        self.lock().fault = Some(Box::new(fault));
    }

    pub fn block(&self, address: &str) -> Option<Vec<u8>> {
        let address: BlockAddress = address.parse().unwrap();
        self.lock()
            .blocks
            .iter()
            .find(|b| b.address() == address)
            .map(|b| b.bytes().to_vec())
    }

    /// Payloads of every command received, faulted ones included
    pub fn commands(&self) -> Vec<Vec<u8>> {
        self.lock().commands.clone()
    }

    pub fn count(&self, opcode: u8) -> usize {
        self.lock()
            .commands
            .iter()
            .filter(|c| c.first() == Some(&opcode))
            .count()
    }

    pub fn has_pending_write(&self) -> bool {
        self.lock().pending_write.is_some()
    }

    /// Create a closed mock transport wired to this PLC
    pub fn transport(&self) -> (MockTransport, MockHandle) {
        let plc = self.clone();
        MockTransport::new(move |wire| plc.respond(wire))
    }

    fn lock(&self) -> MutexGuard<'_, PlcState> {
        self.state.lock().unwrap()
    }

    fn respond(&self, wire: &[u8]) -> MockReply {
        if wire == [STX] {
            // Connect handshake, always accepted
            return MockReply::Bytes(vec![DLE, ACK]);
        }
        let mut state = self.lock();
        let payload = match state.codec.decode(wire) {
            Ok(payload) => payload,
            Err(_) => return MockReply::Bytes(vec![NAK, 0xFF]),
        };
        state.commands.push(payload.clone());
        if let Some(fault) = state.fault.as_mut() {
            if let Some(reply) = fault(&payload) {
                return reply;
            }
        }
        state.handle(&payload)
    }
}

impl PlcState {
    fn handle(&mut self, payload: &[u8]) -> MockReply {
        match payload {
            [CMD_READ, t, n] => match self.find(*t, *n) {
                Some(bytes) => {
                    let end = bytes.len().min(self.read_chunk);
                    let mut reply = (bytes.len() as u16).to_be_bytes().to_vec();
                    reply.extend_from_slice(&bytes[..end]);
                    self.data(&reply)
                }
                None => nak(0x01),
            },
            [CMD_READ_NEXT, t, n, hi, lo] => {
                let offset = u16::from_be_bytes([*hi, *lo]) as usize;
                match self.find(*t, *n) {
                    Some(bytes) if offset < bytes.len() => {
                        let end = bytes.len().min(offset + self.read_chunk);
                        let mut reply = vec![*hi, *lo];
                        reply.extend_from_slice(&bytes[offset..end]);
                        self.data(&reply)
                    }
                    _ => nak(0x02),
                }
            }
            [CMD_WRITE_BEGIN, t, n, hi, lo] => match BlockAddress::from_wire(*t, *n) {
                Ok(address) => {
                    let total = u16::from_be_bytes([*hi, *lo]) as usize;
                    self.pending_write = Some((address, total, Vec::new()));
                    MockReply::Bytes(vec![ACK])
                }
                Err(_) => nak(0x03),
            },
            [CMD_WRITE_DATA, hi, lo, chunk @ ..] => {
                let offset = u16::from_be_bytes([*hi, *lo]) as usize;
                match self.pending_write.as_mut() {
                    Some((_, total, buf)) if offset == buf.len() && offset + chunk.len() <= *total => {
                        buf.extend_from_slice(chunk);
                        MockReply::Bytes(vec![ACK])
                    }
                    _ => nak(0x04),
                }
            }
            [CMD_WRITE_END, t, n] => match self.pending_write.take() {
                Some((address, total, buf))
                    if address.block_type().code() == *t
                        && address.number() == *n
                        && buf.len() == total =>
                {
                    self.blocks.retain(|b| b.address() != address);
                    self.blocks.push(BlockData::new(address, buf));
                    MockReply::Bytes(vec![ACK])
                }
                _ => nak(0x05),
            },
            [CMD_INFO, t, n] => {
                let (status, words) = match self.find(*t, *n) {
                    Some(bytes) => (1, (bytes.len() / 2) as u16),
                    None => (0, 0),
                };
                let [hi, lo] = words.to_be_bytes();
                self.data(&[*t, *n, status, hi, lo])
            }
            [CMD_ABORT] => {
                self.pending_write = None;
                MockReply::Bytes(vec![ACK])
            }
            _ => nak(0xFF),
        }
    }

    fn find(&self, type_code: u8, number: u8) -> Option<Vec<u8>> {
        self.blocks
            .iter()
            .find(|b| b.address().block_type().code() == type_code && b.address().number() == number)
            .map(|b| b.bytes().to_vec())
    }

    fn data(&self, payload: &[u8]) -> MockReply {
        let mut bytes = if self.ack_before_data { vec![ACK] } else { Vec::new() };
        bytes.extend(self.codec.encode(payload).unwrap());
        MockReply::Bytes(bytes)
    }
}

fn nak(reason: u8) -> MockReply {
    MockReply::Bytes(vec![NAK, reason])
}

/// Deterministic block contents of `len` bytes
pub(crate) fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
}
