//! Inbound chunk acceptance and stream reassembly.
//!
//! [`RecvSession`] implements the receive side of the alternating-bit
//! scheme for one uploading peer:
//!
//! - An in-order DATA packet (`seq == expected`) is appended to the buffer
//!   and acknowledged with its own sequence bit; `expected` then flips.
//! - A duplicate (the retransmission caused by a lost ACK) is **not**
//!   re-appended; the previous ACK is repeated so the stuck sender can make
//!   progress.  Re-ACKing is idempotent.
//! - END hands back the reassembled bytes and resets the session to its
//!   initial state (`expected = 0`, empty buffer).
//!
//! This module only manages state; all socket I/O and persistence is the
//! caller's responsibility (see [`crate::session`]).

/// What the caller must put on the wire after feeding in a DATA packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataVerdict {
    /// Sequence bit the outbound ACK must carry.
    pub ack_seq: u8,
    /// `true` if the payload was new and got appended; `false` for a
    /// suppressed duplicate.
    pub accepted: bool,
}

/// Receive-side state for one transfer (one uploading peer).
#[derive(Debug, Default)]
pub struct RecvSession {
    /// Sequence bit the next in-order DATA packet must carry.
    expected: u8,
    /// Ordered payload accumulation, persisted when END arrives.
    buffer: Vec<u8>,
}

impl RecvSession {
    /// A fresh session awaiting sequence 0 with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes reassembled so far.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Process a DATA packet's sequence bit and payload.
    pub fn on_data(&mut self, seq: u8, payload: &[u8]) -> DataVerdict {
        if seq == self.expected {
            self.buffer.extend_from_slice(payload);
            let ack_seq = self.expected;
            self.expected ^= 1;
            DataVerdict { ack_seq, accepted: true }
        } else {
            // Retransmitted duplicate: its original ACK was lost.  Repeat
            // the ACK for the chunk we already hold, append nothing.
            DataVerdict {
                ack_seq: self.expected ^ 1,
                accepted: false,
            }
        }
    }

    /// Process END: take the completed artifact and reset to initial state.
    pub fn on_end(&mut self) -> Vec<u8> {
        self.expected = 0;
        std::mem::take(&mut self.buffer)
    }
}
