//! `ftp-over-udp` — stop-and-wait reliable file transfer over UDP.
//!
//! # Architecture
//!
//! ```text
//!  ┌───────────┐    DATA (seq 0/1)    ┌───────────┐
//!  │  Sender   │─────────────────────▶│ Receiver  │
//!  └────┬──────┘                      └─────┬─────┘
//!       │            ACKs                   │
//!       │◀──────────────────────────────────┘
//!       │
//!  ┌────▼──────────────────────────────┐
//!  │            Session                │
//!  │ (initiator / responder loops)     │
//!  └────┬──────────────────────────────┘
//!       │ packets
//!  ┌────▼──────┐       ┌──────────────┐
//!  │  Channel  │──────▶│ LossyChannel │  (optional drop-on-send decorator)
//!  └────┬──────┘       └──────────────┘
//!       │ raw UDP datagrams
//!  ┌────▼──────┐
//!  │  Socket   │  (thin async wrapper around tokio UdpSocket)
//!  └───────────┘
//! ```
//!
//! One packet is in flight at a time (window size 1): the sender transmits a
//! chunk, waits a bounded time for its ACK, and retransmits on expiry.  The
//! receiver deduplicates by the alternating sequence bit and re-ACKs
//! duplicates so a sender stuck on a lost ACK can make progress.  A transfer
//! is bounded by a best-effort END packet, on which the receiver persists the
//! reassembled bytes.
//!
//! Each module has a single responsibility:
//! - [`checksum`] — 16-bit one's-complement checksum (compute / verify)
//! - [`packet`]   — wire format (serialise / deserialise)
//! - [`socket`]   — async UDP socket abstraction
//! - [`channel`]  — transport capability + lossy decorator for testing
//! - [`timer`]    — retransmission cadence policy
//! - [`sender`]   — stop-and-wait outbound chunk state
//! - [`receiver`] — inbound chunk acceptance and reassembly
//! - [`session`]  — initiator / responder orchestration loops

pub mod channel;
pub mod checksum;
pub mod packet;
pub mod receiver;
pub mod sender;
pub mod session;
pub mod socket;
pub mod timer;
