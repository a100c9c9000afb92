//! Shared wire format, buffering, transport, and error types for the
//! `diode-send` and `diode-receive` binaries.

pub mod chunk;
pub mod const_settings;
pub mod error;
pub mod packet;
pub mod packet_log;
pub mod rate;

pub use chunk::{ChunkBuffer, ChunkEntry};
pub use error::{DiodeError, DiodeResult};
pub use packet::{decode, encode, Color, DecodedPacket};

pub mod transport;
