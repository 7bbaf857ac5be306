//! Wire-format definitions for protocol datagrams.
//!
//! Every datagram exchanged between peers is a [`Packet`].  This module is
//! responsible for:
//! - Defining the on-wire binary layout (header fields, payload).
//! - Serialising a [`Packet`] into a byte buffer ready for transmission.
//! - Deserialising a raw byte slice back into a [`Packet`], returning errors
//!   for malformed or truncated input.
//!
//! No I/O happens here — this is pure data transformation.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//! +--------+--------+-----------------+-----------------+---------------
//! |  seq   |  kind  |     length      |    checksum     |  payload ...
//! | 1 byte | 1 byte |     2 bytes     |     2 bytes     |  `length` bytes
//! +--------+--------+-----------------+-----------------+---------------
//! ```
//!
//! Total header size: [`HEADER_LEN`] = 6 bytes.  `seq` alternates 0/1 under
//! the stop-and-wait scheme; `kind` is one of the [`Kind`] discriminants;
//! `checksum` is the one's-complement sum from [`crate::checksum`] computed
//! over the whole datagram with the checksum field zeroed.

use crate::checksum;

/// Byte length of the fixed-size header on the wire.
pub const HEADER_LEN: usize = 6;

/// Maximum payload bytes carried by a single DATA packet (chunk size).
pub const MAX_PAYLOAD: usize = 1024;

// Byte offsets of each field within the serialised header.
const OFF_SEQ: usize = 0;
const OFF_KIND: usize = 1;
const OFF_LENGTH: usize = 2;
const OFF_CHECKSUM: usize = 4;

/// Discriminates what a datagram means to the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Kind {
    /// A chunk of file content, carrying the sender's current sequence bit.
    Data = 0,
    /// Acknowledges the DATA packet with the same sequence bit.
    Ack = 1,
    /// Requests the named resource; payload is the UTF-8 name, seq fixed at 0.
    Get = 2,
    /// Ends a transfer; the receiver persists its buffer and resets.
    End = 3,
}

impl Kind {
    fn from_wire(byte: u8) -> Result<Self, PacketError> {
        match byte {
            0 => Ok(Kind::Data),
            1 => Ok(Kind::Ack),
            2 => Ok(Kind::Get),
            3 => Ok(Kind::End),
            other => Err(PacketError::UnknownKind(other)),
        }
    }
}

/// A complete protocol datagram: sequence bit, kind, payload bytes.
///
/// The `length` and `checksum` wire fields are derived during [`encode`] and
/// validated during [`decode`]; they are not stored here.
///
/// [`encode`]: Packet::encode
/// [`decode`]: Packet::decode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Alternating-bit sequence number (0 or 1).
    pub seq: u8,
    /// What this datagram means to the protocol.
    pub kind: Kind,
    /// Raw payload bytes (file chunk for DATA, resource name for GET,
    /// empty for ACK and END).
    pub payload: Vec<u8>,
}

impl Packet {
    /// A DATA packet carrying one chunk of the stream.
    pub fn data(seq: u8, payload: Vec<u8>) -> Self {
        debug_assert!(payload.len() <= MAX_PAYLOAD);
        Self { seq, kind: Kind::Data, payload }
    }

    /// An ACK for the DATA packet that carried `seq`.
    pub fn ack(seq: u8) -> Self {
        Self { seq, kind: Kind::Ack, payload: Vec::new() }
    }

    /// A GET request for the named remote resource.
    pub fn get(name: &str) -> Self {
        Self { seq: 0, kind: Kind::Get, payload: name.as_bytes().to_vec() }
    }

    /// An END marker closing out a transfer.
    pub fn end(seq: u8) -> Self {
        Self { seq, kind: Kind::End, payload: Vec::new() }
    }

    /// Serialise this packet into a newly allocated byte vector.
    ///
    /// The checksum is computed over the full buffer with the checksum field
    /// zeroed, then spliced into place.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_LEN + self.payload.len()];

        buf[OFF_SEQ] = self.seq;
        buf[OFF_KIND] = self.kind as u8;
        buf[OFF_LENGTH..OFF_LENGTH + 2]
            .copy_from_slice(&(self.payload.len() as u16).to_be_bytes());
        // Checksum field stays zero while the checksum is computed.
        buf[HEADER_LEN..].copy_from_slice(&self.payload);

        let csum = checksum::compute(&buf);
        buf[OFF_CHECKSUM..OFF_CHECKSUM + 2].copy_from_slice(&csum.to_be_bytes());

        buf
    }

    /// Parse a [`Packet`] from a raw byte slice.
    ///
    /// Returns [`Err`] if:
    /// - `buf` is shorter than [`HEADER_LEN`],
    /// - the `length` field disagrees with the actual trailing byte count,
    /// - the checksum does not verify over the whole buffer, or
    /// - the `kind` byte is not a known discriminant.
    ///
    /// A corrupted datagram whose damage happens to preserve the checksum
    /// still decodes (a ~1/65536 false-negative accepted by the design).
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < HEADER_LEN {
            return Err(PacketError::TooShort);
        }

        let length =
            u16::from_be_bytes(buf[OFF_LENGTH..OFF_LENGTH + 2].try_into().unwrap());
        if buf.len() != HEADER_LEN + length as usize {
            return Err(PacketError::LengthMismatch);
        }

        // The transmitted checksum participates in the sum: an intact
        // datagram folds to 0xFFFF without zeroing anything.
        if !checksum::verify(buf) {
            return Err(PacketError::ChecksumMismatch);
        }

        let kind = Kind::from_wire(buf[OFF_KIND])?;

        Ok(Packet {
            seq: buf[OFF_SEQ],
            kind,
            payload: buf[HEADER_LEN..].to_vec(),
        })
    }
}

/// Errors that can arise when parsing a raw datagram.
///
/// Every variant means "discard as if lost": the peer never answers a
/// malformed datagram and recovery rides on the sender's retransmission.
#[derive(Debug, PartialEq, Eq)]
pub enum PacketError {
    /// Buffer shorter than the fixed header size.
    TooShort,
    /// `length` field does not match the actual remaining bytes.
    LengthMismatch,
    /// Checksum did not fold to `0xFFFF`.
    ChecksumMismatch,
    /// `kind` byte is not a known discriminant.
    UnknownKind(u8),
}

impl std::fmt::Display for PacketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacketError::TooShort => write!(f, "buffer too short to contain a header"),
            PacketError::LengthMismatch => {
                write!(f, "length field does not match remaining bytes")
            }
            PacketError::ChecksumMismatch => write!(f, "checksum verification failed"),
            PacketError::UnknownKind(k) => write!(f, "unknown packet kind {k}"),
        }
    }
}

impl std::error::Error for PacketError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let pkt = Packet::data(1, b"hello".to_vec());
        let decoded = Packet::decode(&pkt.encode()).unwrap();
        assert_eq!(decoded, pkt);
    }

    #[test]
    fn encode_layout_is_big_endian() {
        let bytes = Packet::data(1, vec![0xAB; 300]).encode();
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[1], Kind::Data as u8);
        assert_eq!(&bytes[2..4], &300u16.to_be_bytes());
        assert_eq!(bytes.len(), HEADER_LEN + 300);
    }

    #[test]
    fn whole_datagram_sums_to_all_ones() {
        let bytes = Packet::get("testfile.bin").encode();
        assert!(crate::checksum::verify(&bytes));
    }

    #[test]
    fn decode_empty_buffer_returns_error() {
        assert_eq!(Packet::decode(&[]), Err(PacketError::TooShort));
    }

    #[test]
    fn decode_short_header_returns_error() {
        assert_eq!(
            Packet::decode(&[0u8; HEADER_LEN - 1]),
            Err(PacketError::TooShort)
        );
    }

    #[test]
    fn decode_truncated_payload_returns_error() {
        let mut bytes = Packet::data(0, b"data".to_vec()).encode();
        bytes.pop(); // length field still claims 4 bytes, but buf is one short
        assert_eq!(Packet::decode(&bytes), Err(PacketError::LengthMismatch));
    }

    #[test]
    fn decode_corrupt_byte_returns_checksum_error() {
        let mut bytes = Packet::data(0, b"Hello, World!".to_vec()).encode();
        bytes[0] ^= 0x01;
        assert_eq!(Packet::decode(&bytes), Err(PacketError::ChecksumMismatch));
    }

    #[test]
    fn decode_corrupt_payload_returns_checksum_error() {
        let mut bytes = Packet::data(1, b"chunk".to_vec()).encode();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert_eq!(Packet::decode(&bytes), Err(PacketError::ChecksumMismatch));
    }

    #[test]
    fn decode_unknown_kind_returns_error() {
        // Build a checksummed frame by hand with kind byte 9.
        let pkt = Packet::ack(0);
        let mut bytes = pkt.encode();
        bytes[1] = 9;
        // Restore checksum validity for the altered kind byte.
        bytes[4] = 0;
        bytes[5] = 0;
        let cs = crate::checksum::compute(&bytes);
        bytes[4..6].copy_from_slice(&cs.to_be_bytes());
        assert_eq!(Packet::decode(&bytes), Err(PacketError::UnknownKind(9)));
    }

    #[test]
    fn empty_payload_roundtrip() {
        let decoded = Packet::decode(&Packet::end(1).encode()).unwrap();
        assert_eq!(decoded.kind, Kind::End);
        assert_eq!(decoded.seq, 1);
        assert!(decoded.payload.is_empty());
    }

    #[test]
    fn get_carries_utf8_name() {
        let decoded = Packet::decode(&Packet::get("report.pdf").encode()).unwrap();
        assert_eq!(decoded.kind, Kind::Get);
        assert_eq!(decoded.seq, 0);
        assert_eq!(decoded.payload, b"report.pdf");
    }

    #[test]
    fn max_payload_roundtrip() {
        let payload: Vec<u8> = (0..MAX_PAYLOAD).map(|i| (i % 256) as u8).collect();
        let decoded = Packet::decode(&Packet::data(0, payload.clone()).encode()).unwrap();
        assert_eq!(decoded.payload, payload);
    }
}
