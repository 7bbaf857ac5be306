//! 16-bit one's-complement checksum (RFC 1071 style).
//!
//! Two entry points:
//! - [`compute`] — run over a buffer whose checksum field is still zero;
//!   returns the value to splice into the packet.
//! - [`verify`] — run over the buffer **as received**, checksum field
//!   included.  An uncorrupted packet folds to `0xFFFF`; anything else means
//!   the datagram was damaged in flight.
//!
//! Bytes are paired into 16-bit big-endian words; an odd trailing byte is
//! padded with a zero on the right for the computation only.

/// Compute the one's-complement checksum of `data`.
///
/// The caller must zero any checksum field within `data` before calling.
pub fn compute(data: &[u8]) -> u16 {
    !fold(data)
}

/// Verify a received buffer, checksum field included (not zeroed).
///
/// The transmitted checksum is the complement of the word sum, so summing
/// the complete buffer must fold to `0xFFFF` exactly.
pub fn verify(data: &[u8]) -> bool {
    fold(data) == 0xFFFF
}

/// Sum consecutive 16-bit big-endian words with end-around carry folding.
fn fold(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut i = 0;

    while i + 1 < data.len() {
        sum += u32::from(u16::from_be_bytes([data[i], data[i + 1]]));
        i += 2;
    }
    // Odd trailing byte — pad with a zero byte on the right.
    if i < data.len() {
        sum += u32::from(data[i]) << 8;
    }

    // Fold the 32-bit accumulator into 16 bits.
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }

    sum as u16
}
