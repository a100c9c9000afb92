use clap::Parser;
use diode_core::const_settings::{DEFAULT_MAX_BITRATE, DEFAULT_PORT, DEFAULT_REDUNDANCY};
use diode_core::error::DiodeError;
use diode_core::rate::{resolve, ChunkPlan, ChunkSizing};
use std::net::IpAddr;
use std::path::PathBuf;

/// Send data across a data diode via UDP.
#[derive(Parser, Debug, Clone)]
#[command(name = "diode-send")]
pub struct Args {
    /// The IP of the interface data is read from (the receiver's address).
    pub read_ip: IpAddr,

    /// The IP of the interface data is written to (our own, bound address).
    pub write_ip: IpAddr,

    /// Send and receive data using this port.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Maximum number of bits transferred per second.
    #[arg(long = "max-bitrate", default_value_t = DEFAULT_MAX_BITRATE)]
    pub max_bitrate: u64,

    /// Send each chunk for this many seconds.
    #[arg(long = "chunk-duration")]
    pub chunk_duration: Option<f64>,

    /// The maximum number of packets a chunk should contain.
    #[arg(long = "chunk-max-packets")]
    pub chunk_max_packets: Option<u32>,

    /// How many times to send each chunk.
    #[arg(long, default_value_t = DEFAULT_REDUNDANCY)]
    pub redundancy: u32,

    /// Print INFO logging.
    #[arg(long)]
    pub verbose: bool,

    /// Print DEBUG logging (also enables per-packet logging overhead).
    #[arg(long)]
    pub debug: bool,

    /// Append a CSV row per sent data packet to this path.
    #[arg(long = "packet-log")]
    pub packet_log: Option<PathBuf>,
}

impl Args {
    pub fn log_level(&self) -> log::LevelFilter {
        if self.debug {
            log::LevelFilter::Debug
        } else if self.verbose {
            log::LevelFilter::Info
        } else {
            log::LevelFilter::Warn
        }
    }

    /// Validate the mutually-exclusive chunk-sizing flags and resolve the
    /// final chunk plan.
    pub fn chunk_plan(&self) -> Result<ChunkPlan, DiodeError> {
        let sizing = match (self.chunk_duration, self.chunk_max_packets) {
            (Some(_), Some(_)) => {
                return Err(DiodeError::Config(
                    "Supply either --chunk-duration or --chunk-max-packets, not both".into(),
                ));
            }
            (Some(t), None) => ChunkSizing::Duration(t),
            (None, Some(n)) => ChunkSizing::MaxPackets(n),
            (None, None) => ChunkSizing::MaxPackets(
                diode_core::const_settings::DEFAULT_CHUNK_MAX_PACKETS,
            ),
        };
        if self.max_bitrate == 0 {
            return Err(DiodeError::Config("--max-bitrate must be > 0".into()));
        }
        Ok(resolve(sizing, self.max_bitrate))
    }
}
