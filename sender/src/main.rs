use clap::Parser;
use diode_core::error::DiodeError;
use diode_core::transport::SenderTransport;
use diode_core::ChunkBuffer;
use sender::cli::Args;
use sender::core::SenderCore;
use sender::input::InputReader;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::new().filter_level(args.log_level()).init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), DiodeError> {
    let plan = args.chunk_plan()?;
    log::debug!("chunk_max_packets={}", plan.chunk_max_packets);
    log::debug!("chunk_duration={}", plan.chunk_duration);
    log::debug!("chunk_max_data_bytes={}", plan.chunk_max_data_bytes);

    let transport = SenderTransport::bind(args.write_ip, args.read_ip, args.port).await?;

    let packet_log = match &args.packet_log {
        Some(path) => {
            let (handle, _join) = diode_core::packet_log::spawn(path).await?;
            Some(handle)
        }
        None => None,
    };

    let buffer = Arc::new(ChunkBuffer::new());
    let terminated = Arc::new(AtomicBool::new(false));

    let reader = InputReader::new(plan.chunk_max_data_bytes, terminated.clone());
    let reader_task = tokio::spawn(reader.run(buffer.clone()));

    let sender = SenderCore::new(
        transport,
        buffer,
        plan.chunk_max_packets as usize,
        Duration::from_secs_f64(plan.chunk_duration.max(0.0)),
        args.redundancy,
        packet_log,
    );

    tokio::select! {
        result = sender.run() => {
            terminated.store(true, Ordering::Relaxed);
            let _ = reader_task.await;
            result
        }
        _ = tokio::signal::ctrl_c() => {
            terminated.store(true, Ordering::Relaxed);
            let _ = reader_task.await;
            Err(DiodeError::Config("interrupted before completion".into()))
        }
    }
}
