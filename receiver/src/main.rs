use clap::Parser;
use diode_core::error::DiodeError;
use diode_core::transport::ReceiverTransport;
use receiver::cli::Args;
use receiver::core::ReceiverCore;
use receiver::output;
use std::process::ExitCode;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
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
    let transport = ReceiverTransport::bind(args.read_ip, args.port).await?;

    let packet_log = match &args.packet_log {
        Some(path) => {
            let (handle, _join) = diode_core::packet_log::spawn(path).await?;
            Some(handle)
        }
        None => None,
    };

    let (tx, rx) = tokio::sync::mpsc::channel(diode_core::const_settings::CHUNK_BUFFER_WATERMARK);

    let receiver = ReceiverCore::new(transport, tx, packet_log);
    let reader_task = tokio::spawn(receiver.run());

    let stdout = tokio::io::stdout();
    let writer_result = tokio::select! {
        result = output::run(rx, stdout) => result,
        _ = tokio::signal::ctrl_c() => {
            reader_task.abort();
            return Err(DiodeError::Config("interrupted before EOF".into()));
        }
    };

    match reader_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::warn!("network reader exited with error: {e}"),
        Err(e) if e.is_cancelled() => {}
        Err(e) => log::warn!("network reader task panicked: {e}"),
    }

    writer_result
}
