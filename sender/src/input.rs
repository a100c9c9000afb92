//! `InputReader`: pulls bytes from standard input into the shared
//! `ChunkBuffer`, in either regular-file or incremental stream mode.

use diode_core::const_settings::{CHUNK_BUFFER_WATERMARK, READ_POLL_INTERVAL_MS};
use diode_core::ChunkBuffer;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Standard input is a regular file: one blocking read per call is
    /// enough, since the data is already fully available.
    RegularFile,
    /// Standard input is a pipe or character device: data may arrive
    /// incrementally, so we poll readability in short quanta instead of
    /// waiting for a full chunk to accumulate.
    Stream,
}

fn detect_mode() -> Mode {
    #[cfg(unix)]
    {
        use std::os::unix::io::AsRawFd;
        let fd = std::io::stdin().as_raw_fd();
        let mut st: libc::stat = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::fstat(fd, &mut st) };
        if rc == 0 && (st.st_mode & libc::S_IFMT) == libc::S_IFREG {
            return Mode::RegularFile;
        }
    }
    Mode::Stream
}

pub struct InputReader {
    chunk_max_data_bytes: usize,
    mode: Mode,
    terminated: Arc<AtomicBool>,
}

impl InputReader {
    pub fn new(chunk_max_data_bytes: usize, terminated: Arc<AtomicBool>) -> Self {
        Self {
            chunk_max_data_bytes,
            mode: detect_mode(),
            terminated,
        }
    }

    /// Read up to `chunk_max_data_bytes`. Returns an empty vector at EOF.
    async fn read_once(&self) -> std::io::Result<Vec<u8>> {
        match self.mode {
            Mode::RegularFile => {
                let cap = self.chunk_max_data_bytes;
                tokio::task::spawn_blocking(move || {
                    let mut buf = vec![0u8; cap];
                    let n = std::io::stdin().read(&mut buf)?;
                    buf.truncate(n);
                    Ok(buf)
                })
                .await
                .expect("blocking stdin read task panicked")
            }
            Mode::Stream => {
                let mut stdin = tokio::io::stdin();
                let mut buf = vec![0u8; self.chunk_max_data_bytes];
                loop {
                    if self.terminated.load(Ordering::Relaxed) {
                        return Ok(Vec::new());
                    }
                    match tokio::time::timeout(
                        Duration::from_millis(READ_POLL_INTERVAL_MS),
                        stdin.read(&mut buf),
                    )
                    .await
                    {
                        Ok(Ok(n)) => {
                            buf.truncate(n);
                            return Ok(buf);
                        }
                        Ok(Err(e)) => return Err(e),
                        Err(_elapsed) => continue,
                    }
                }
            }
        }
    }

    /// Drive reads until EOF or the termination flag is set, pushing data
    /// into `buffer` and honoring its watermark-based backpressure.
    pub async fn run(self, buffer: Arc<ChunkBuffer>) -> std::io::Result<()> {
        loop {
            if self.terminated.load(Ordering::Relaxed) {
                break;
            }
            let data = self.read_once().await?;
            if data.is_empty() {
                break;
            }
            log::debug!("read {} bytes of data", data.len());
            buffer.append(&data, self.chunk_max_data_bytes);

            while buffer.len() > CHUNK_BUFFER_WATERMARK && !self.terminated.load(Ordering::Relaxed) {
                tokio::time::sleep(Duration::from_millis(READ_POLL_INTERVAL_MS)).await;
            }
        }
        buffer.push_eof();
        Ok(())
    }
}
