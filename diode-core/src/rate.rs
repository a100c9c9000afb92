//! Pacing math shared between the CLI parsers: deriving a chunk's packet
//! count from its duration (or vice versa) under a bitrate cap.

use crate::const_settings::{BYTE_BITS, MAX_PAYLOAD, UDP_MAX_BYTES};

/// Either end of the mutually-exclusive `--chunk-duration` /
/// `--chunk-max-packets` pair, as supplied on the command line.
pub enum ChunkSizing {
    Duration(f64),
    MaxPackets(u32),
}

pub struct ChunkPlan {
    pub chunk_duration: f64,
    pub chunk_max_packets: u32,
    pub chunk_max_data_bytes: usize,
}

/// Resolve the sizing choice into a full plan: whichever of (duration,
/// packet count) is missing is computed from `max_bitrate`, then
/// `chunk_max_data_bytes` follows from the packet count.
pub fn resolve(sizing: ChunkSizing, max_bitrate: u64) -> ChunkPlan {
    let (chunk_duration, chunk_max_packets) = match sizing {
        ChunkSizing::MaxPackets(n) => {
            let duration = (n as f64) * (UDP_MAX_BYTES as f64) * (BYTE_BITS as f64) / (max_bitrate as f64);
            (duration, n)
        }
        ChunkSizing::Duration(t) => {
            let n = (t * (max_bitrate as f64) / (BYTE_BITS as f64) / (UDP_MAX_BYTES as f64)).floor();
            (t, n as u32)
        }
    };

    ChunkPlan {
        chunk_duration,
        chunk_max_packets,
        chunk_max_data_bytes: (chunk_max_packets as usize) * MAX_PAYLOAD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_packets_derives_duration() {
        let plan = resolve(ChunkSizing::MaxPackets(100), 100_000_000);
        // duration = 100 * 1472 * 8 / 100_000_000
        assert!((plan.chunk_duration - 0.011776).abs() < 1e-9);
        assert_eq!(plan.chunk_max_packets, 100);
        assert_eq!(plan.chunk_max_data_bytes, 100 * MAX_PAYLOAD);
    }

    #[test]
    fn duration_derives_max_packets() {
        let plan = resolve(ChunkSizing::Duration(0.011776), 100_000_000);
        assert_eq!(plan.chunk_max_packets, 100);
    }
}
