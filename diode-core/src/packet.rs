//! Wire packet format: a fixed 7-byte little-endian header followed by a
//! fixed-size, zero-padded payload area.

use crate::const_settings::{MAX_PAYLOAD, PACKET_HEADER_BYTES, UDP_MAX_BYTES};

/// One-byte chunk-coloring tag stamped on every datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// A data chunk, first of the alternating pair.
    Red,
    /// A data chunk, second of the alternating pair.
    Blue,
    /// The EOF chunk, carrying the cumulative SHA-256 digest.
    Eof,
    /// Idle keep-alive filler. Always dropped by the receiver.
    White,
}

impl Color {
    const RED_BYTE: u8 = 0x52;
    const BLUE_BYTE: u8 = 0x42;
    const EOF_BYTE: u8 = 0x4B;
    const WHITE_BYTE: u8 = 0x57;

    #[inline]
    pub fn to_byte(self) -> u8 {
        match self {
            Color::Red => Self::RED_BYTE,
            Color::Blue => Self::BLUE_BYTE,
            Color::Eof => Self::EOF_BYTE,
            Color::White => Self::WHITE_BYTE,
        }
    }

    #[inline]
    pub fn from_byte(b: u8) -> Option<Color> {
        match b {
            Self::RED_BYTE => Some(Color::Red),
            Self::BLUE_BYTE => Some(Color::Blue),
            Self::EOF_BYTE => Some(Color::Eof),
            Self::WHITE_BYTE => Some(Color::White),
            _ => None,
        }
    }

    /// The other color in the R/B alternation. Panics if called on
    /// `Eof`/`White`, which never participate in alternation.
    #[inline]
    pub fn opposite(self) -> Color {
        match self {
            Color::Red => Color::Blue,
            Color::Blue => Color::Red,
            Color::Eof | Color::White => {
                unreachable!("opposite() is only defined for data colors")
            }
        }
    }
}

/// A decoded packet header plus a view of its meaningful payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPacket<'a> {
    pub color: Color,
    pub n_packets: u16,
    pub seq: u16,
    pub payload: &'a [u8],
}

/// Encode a packet into a full `UDP_MAX_BYTES`-length datagram.
///
/// `payload.len()` must be `<= MAX_PAYLOAD`; the remainder of the payload
/// area is zero-padded.
pub fn encode(color: Color, n_packets: u16, seq: u16, payload: &[u8]) -> Vec<u8> {
    debug_assert!(payload.len() <= MAX_PAYLOAD);
    let mut datagram = Vec::with_capacity(UDP_MAX_BYTES);
    datagram.push(color.to_byte());
    datagram.extend_from_slice(&n_packets.to_le_bytes());
    datagram.extend_from_slice(&seq.to_le_bytes());
    datagram.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    datagram.extend_from_slice(payload);
    datagram.resize(UDP_MAX_BYTES, 0);
    datagram
}

/// Decode a received datagram. Returns `None` for anything malformed:
/// undersized, or claiming a `payload_len` that doesn't fit in the buffer,
/// or carrying an unrecognized color byte.
pub fn decode(datagram: &[u8]) -> Option<DecodedPacket<'_>> {
    if datagram.len() < PACKET_HEADER_BYTES {
        return None;
    }
    let color = Color::from_byte(datagram[0])?;
    let n_packets = u16::from_le_bytes([datagram[1], datagram[2]]);
    let seq = u16::from_le_bytes([datagram[3], datagram[4]]);
    let payload_len = u16::from_le_bytes([datagram[5], datagram[6]]) as usize;

    let payload_end = PACKET_HEADER_BYTES + payload_len;
    if payload_end > datagram.len() {
        return None;
    }
    if seq >= n_packets {
        return None;
    }

    Some(DecodedPacket {
        color,
        n_packets,
        seq,
        payload: &datagram[PACKET_HEADER_BYTES..payload_end],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_partial_payload() {
        let payload = b"hello world";
        let datagram = encode(Color::Red, 3, 1, payload);
        assert_eq!(datagram.len(), UDP_MAX_BYTES);

        let decoded = decode(&datagram).expect("should decode");
        assert_eq!(decoded.color, Color::Red);
        assert_eq!(decoded.n_packets, 3);
        assert_eq!(decoded.seq, 1);
        assert_eq!(decoded.payload, payload);
    }

    #[test]
    fn round_trips_a_full_payload() {
        let payload = vec![0xAB; MAX_PAYLOAD];
        let datagram = encode(Color::Blue, 1, 0, &payload);
        let decoded = decode(&datagram).unwrap();
        assert_eq!(decoded.payload, &payload[..]);
    }

    #[test]
    fn round_trips_an_empty_payload() {
        let datagram = encode(Color::Eof, 1, 0, &[]);
        let decoded = decode(&datagram).unwrap();
        assert_eq!(decoded.payload.len(), 0);
    }

    #[test]
    fn rejects_undersized_datagrams() {
        assert!(decode(&[0x52, 0, 0]).is_none());
    }

    #[test]
    fn rejects_unrecognized_color() {
        let mut datagram = encode(Color::Red, 1, 0, b"x");
        datagram[0] = 0xFF;
        assert!(decode(&datagram).is_none());
    }

    #[test]
    fn rejects_payload_len_overrunning_the_buffer() {
        let mut datagram = encode(Color::Red, 1, 0, b"hi");
        // Claim far more payload than the buffer could possibly hold.
        datagram[5] = 0xFF;
        datagram[6] = 0xFF;
        assert!(decode(&datagram[..10]).is_none());
    }

    #[test]
    fn opposite_alternates() {
        assert_eq!(Color::Red.opposite(), Color::Blue);
        assert_eq!(Color::Blue.opposite(), Color::Red);
    }

    proptest::proptest! {
        #[test]
        fn header_round_trip_is_identity(
            color_idx in 0..2usize,
            n in 1u16..=65535,
            s_frac in 0.0f64..1.0,
            len in 0usize..=MAX_PAYLOAD,
        ) {
            let color = [Color::Red, Color::Blue][color_idx];
            let s = (s_frac * n as f64) as u16;
            let payload: Vec<u8> = (0..len).map(|i| (i % 256) as u8).collect();
            let datagram = encode(color, n, s, &payload);
            let decoded = decode(&datagram).unwrap();
            prop_assert_eq!(decoded.color, color);
            prop_assert_eq!(decoded.n_packets, n);
            prop_assert_eq!(decoded.seq, s);
            prop_assert_eq!(decoded.payload, &payload[..]);
        }
    }
}
