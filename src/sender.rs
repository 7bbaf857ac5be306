//! Outbound chunk state for stop-and-wait reliability.
//!
//! [`ChunkSender`] tracks the alternating sequence bit and the single
//! in-flight DATA packet.  It does **not** touch the socket;
//! [`crate::session`] calls these methods and owns the actual send/receive
//! loop.
//!
//! # Stop-and-Wait contract
//! - At most **one** chunk is in flight at any moment (`unacked`).
//! - A new chunk may only be staged once `unacked` is `None`.
//! - On a matching ACK: flip the sequence bit; clear `unacked`.
//! - On timeout or a stale arrival: increment `tx_count`; resend the same
//!   packet unchanged.

use crate::packet::{Kind, Packet};

/// A DATA packet that has been sent but not yet acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlight {
    /// The packet on the wire.
    pub packet: Packet,
    /// How many times this packet has been transmitted (1 = first send).
    pub tx_count: u32,
}

/// Stop-and-wait send-side state for one transfer.
#[derive(Debug, Default)]
pub struct ChunkSender {
    /// Sequence bit the next DATA packet will carry.  Starts at 0 and flips
    /// only when the in-flight chunk is acknowledged.
    seq: u8,

    /// The in-flight chunk, or `None` when the sender is ready for the next.
    unacked: Option<InFlight>,
}

impl ChunkSender {
    /// A fresh sender at the start of a transfer (`seq = 0`, nothing in flight).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence bit currently on the wire (or about to be).
    pub fn current_seq(&self) -> u8 {
        self.seq
    }

    /// `true` while a chunk is waiting for its ACK.
    pub fn has_unacked(&self) -> bool {
        self.unacked.is_some()
    }

    /// Stage the next chunk and return the DATA packet to transmit.
    ///
    /// Panics in debug mode if a chunk is already in flight.
    pub fn stage(&mut self, chunk: Vec<u8>) -> Packet {
        debug_assert!(
            self.unacked.is_none(),
            "stage called while a chunk is already in flight"
        );
        let packet = Packet::data(self.seq, chunk);
        self.unacked = Some(InFlight {
            packet: packet.clone(),
            tx_count: 1,
        });
        packet
    }

    /// Process an inbound packet while awaiting an ACK.
    ///
    /// Returns `true` if it is the ACK covering the in-flight chunk: the
    /// sequence bit flips and the retransmit slot clears.  Anything else —
    /// wrong kind, wrong sequence — is stale noise and returns `false`; the
    /// caller resends the outstanding packet unchanged.
    pub fn on_packet(&mut self, packet: &Packet) -> bool {
        if self.unacked.is_some() && packet.kind == Kind::Ack && packet.seq == self.seq {
            self.seq ^= 1;
            self.unacked = None;
            return true;
        }
        false
    }

    /// The outstanding packet for retransmission, bumping its counter.
    ///
    /// Returns `None` when nothing is in flight.
    pub fn retransmit(&mut self) -> Option<&Packet> {
        let entry = self.unacked.as_mut()?;
        entry.tx_count += 1;
        Some(&entry.packet)
    }

    /// Number of times the in-flight chunk has been sent (0 when idle).
    pub fn tx_count(&self) -> u32 {
        self.unacked.as_ref().map_or(0, |e| e.tx_count)
    }

    /// The END packet closing this transfer, carrying the current sequence
    /// bit.  Sent once, unacknowledged.
    pub fn finish(&self) -> Packet {
        debug_assert!(self.unacked.is_none(), "finish called with a chunk in flight");
        Packet::end(self.seq)
    }
}
