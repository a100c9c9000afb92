use clap::Parser;
use diode_core::const_settings::DEFAULT_PORT;
use std::net::IpAddr;
use std::path::PathBuf;

/// Receive data across a data diode via UDP.
#[derive(Parser, Debug, Clone)]
#[command(name = "diode-receive")]
pub struct Args {
    /// The IP of the interface data is read from (our own, bound address).
    pub read_ip: IpAddr,

    /// Send and receive data using this port.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Print INFO logging.
    #[arg(long)]
    pub verbose: bool,

    /// Print DEBUG logging (also enables per-packet logging overhead).
    #[arg(long)]
    pub debug: bool,

    /// Append a CSV row per received data packet to this path.
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
}
