//! `SenderCore`: chunk selection, color rotation, redundancy, warmup,
//! keep-alive, and EOF finalization.

use crate::pacer::Pacer;
use diode_core::const_settings::{MAX_PAYLOAD, MIN_EOF_CHUNKS, MIN_WARMUP_CHUNKS};
use diode_core::error::DiodeResult;
use diode_core::packet::{encode, Color};
use diode_core::packet_log::PacketLogHandle;
use diode_core::transport::SenderTransport;
use diode_core::{ChunkBuffer, ChunkEntry};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

pub struct SenderCore {
    transport: SenderTransport,
    buffer: Arc<ChunkBuffer>,
    chunk_max_packets: usize,
    chunk_duration: Duration,
    redundancy: u32,
    packet_log: Option<PacketLogHandle>,

    current_color: Color,
    warmup: bool,
    previous_chunk: Option<(Vec<u8>, Color)>,
    sha: Sha256,
}

impl SenderCore {
    pub fn new(
        transport: SenderTransport,
        buffer: Arc<ChunkBuffer>,
        chunk_max_packets: usize,
        chunk_duration: Duration,
        redundancy: u32,
        packet_log: Option<PacketLogHandle>,
    ) -> Self {
        Self {
            transport,
            buffer,
            chunk_max_packets,
            chunk_duration,
            redundancy,
            packet_log,
            current_color: Color::Red,
            warmup: true,
            previous_chunk: None,
            sha: Sha256::new(),
        }
    }

    /// Drive the sender until the EOF chunk has been transmitted.
    pub async fn run(mut self) -> DiodeResult<()> {
        loop {
            match self.buffer.pop() {
                Some(ChunkEntry::Eof) => {
                    let digest = std::mem::replace(&mut self.sha, Sha256::new()).finalize();
                    log::debug!("EOF digest: {}", hex(&digest));
                    let redundancy = self.redundancy.max(MIN_EOF_CHUNKS);
                    self.send_chunk(&digest, Color::Eof, redundancy).await?;
                    return Ok(());
                }
                Some(ChunkEntry::Data(data)) => {
                    self.sha.update(&data);
                    let color = self.current_color;
                    let redundancy = if self.warmup {
                        MIN_WARMUP_CHUNKS + self.redundancy - 1
                    } else {
                        self.redundancy
                    };
                    self.send_chunk(&data, color, redundancy).await?;
                    self.warmup = false;
                    self.current_color = color.opposite();
                    self.previous_chunk = Some((data, color));
                }
                None => {
                    if let Some((data, color)) = self.previous_chunk.clone() {
                        log::debug!("resending previous chunk while waiting for data");
                        self.send_chunk(&data, color, 1).await?;
                    } else {
                        log::debug!("no data yet; sending keep-alive filler");
                        self.send_chunk(&[0u8], Color::White, 1).await?;
                    }
                }
            }
        }
    }

    /// Emit `data` as a single chunk of the given color, `redundancy` times.
    async fn send_chunk(&mut self, data: &[u8], color: Color, redundancy: u32) -> DiodeResult<()> {
        let n_packets = (data.len().div_ceil(MAX_PAYLOAD)).max(1) as u16;
        log::debug!(
            "{n_packets} packets needed to send a {color:?} chunk of length {}",
            data.len()
        );

        for r in 0..redundancy {
            log::debug!("send iteration {}/{redundancy}", r + 1);
            let mut pacer = Pacer::new(self.chunk_max_packets, self.chunk_duration);
            for p in 0..self.chunk_max_packets {
                let slot = p % (n_packets as usize);
                let start = slot * MAX_PAYLOAD;
                let end = (start + MAX_PAYLOAD).min(data.len());
                let payload = &data[start..end];

                let datagram = encode(color, n_packets, slot as u16, payload);
                self.transport.send(&datagram).await?;
                if let Some(log_handle) = &self.packet_log {
                    log_handle.record(color, datagram.len(), n_packets, slot as u16, payload);
                }
                pacer.after_packet(p + 1).await;
            }
            pacer.finish().await;
        }
        Ok(())
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
