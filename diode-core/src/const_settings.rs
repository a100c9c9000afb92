// =============================================================================
// const_settings.rs — Single source of truth for wire-format and protocol
// constants shared by the sender and receiver binaries.
// =============================================================================
//
// Base constants are defined first. Derived constants are computed from them.
// Every module should import from here instead of defining its own magic
// numbers.

// ---------------------------------------------------------------------------
// Datagram sizing
// ---------------------------------------------------------------------------

/// Maximum UDP payload we assume is deliverable without fragmentation.
///
/// 1472 is safe for broadcast traffic on every platform we care about;
/// 9216 is the jumbo-frame ceiling used when broadcast isn't required.
/// We default to the broadcast-safe value, since `UdpTransport` always
/// enables `SO_BROADCAST`.
pub const UDP_MAX_BYTES: usize = 1472;

/// Fixed packet header: color (1) + n_packets (2) + seq (2) + payload_len (2).
pub const PACKET_HEADER_BYTES: usize = 7;

/// Maximum payload bytes that fit in a single datagram.
pub const MAX_PAYLOAD: usize = UDP_MAX_BYTES - PACKET_HEADER_BYTES;

// ---------------------------------------------------------------------------
// Redundancy & warmup
// ---------------------------------------------------------------------------

/// Send the first data chunk at least this many times. Real hardware shows
/// elevated loss into roughly the first 330 packets of a transfer.
pub const MIN_WARMUP_CHUNKS: u32 = 5;

/// Send the EOF chunk at least this many times.
pub const MIN_EOF_CHUNKS: u32 = 2;

/// Sleep (pace) after sending this many packets.
pub const PACKET_BURST: usize = 10;

// ---------------------------------------------------------------------------
// ChunkBuffer backpressure
// ---------------------------------------------------------------------------

/// Stall `InputReader` once the buffer holds more than this many chunks.
pub const CHUNK_BUFFER_WATERMARK: usize = 10;

/// How long the reader waits for readability before re-checking the
/// termination flag, in stream (pipe) mode.
pub const READ_POLL_INTERVAL_MS: u64 = 100;

// ---------------------------------------------------------------------------
// CLI defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_PORT: u16 = 1234;
pub const DEFAULT_MAX_BITRATE: u64 = 100_000_000;
pub const DEFAULT_REDUNDANCY: u32 = 2;
pub const DEFAULT_CHUNK_MAX_PACKETS: u32 = 100;

/// Number of bits in a byte, spelled out because it appears in the
/// bitrate <-> chunk-duration derivation and reads better named.
pub const BYTE_BITS: u64 = 8;
