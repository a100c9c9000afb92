//! Optional per-packet CSV observation hook.
//!
//! This must never sit on the hot path: a full channel never blocks the
//! caller (rows are dropped instead), and the file write itself happens on
//! a dedicated task.

use crate::packet::Color;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct PacketLogRow {
    pub id: u64,
    pub packet_len: usize,
    pub color: Color,
    pub n_packets: u16,
    pub seq: u16,
    pub payload_digest: [u8; 8],
}

impl PacketLogRow {
    fn color_letter(&self) -> char {
        match self.color {
            Color::Red => 'R',
            Color::Blue => 'B',
            Color::Eof => 'K',
            Color::White => 'W',
        }
    }

    fn to_csv_line(&self) -> String {
        let digest_hex: String = self.payload_digest.iter().map(|b| format!("{b:02x}")).collect();
        format!(
            "{},{},{},{},{},{}\n",
            self.id,
            self.packet_len,
            self.color_letter(),
            self.n_packets,
            self.seq,
            digest_hex
        )
    }
}

/// Handle used by sender/receiver cores to submit rows without awaiting the
/// disk write.
#[derive(Clone)]
pub struct PacketLogHandle {
    tx: mpsc::Sender<PacketLogRow>,
    next_id: std::sync::Arc<AtomicU64>,
}

impl PacketLogHandle {
    /// Build a row from packet fields and hand it to the writer task. Only
    /// colors R and B are logged; keep-alive filler and the EOF packet carry
    /// no data worth observing.
    pub fn record(&self, color: Color, packet_len: usize, n_packets: u16, seq: u16, payload: &[u8]) {
        if !matches!(color, Color::Red | Color::Blue) {
            return;
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload_digest = short_digest(payload);
        let row = PacketLogRow {
            id,
            packet_len,
            color,
            n_packets,
            seq,
            payload_digest,
        };
        // A full queue means the disk can't keep up; drop the row rather
        // than stall the transmit/receive hot path.
        let _ = self.tx.try_send(row);
    }
}

fn short_digest(payload: &[u8]) -> [u8; 8] {
    use sha2::{Digest, Sha256};
    let full = Sha256::digest(payload);
    let mut out = [0u8; 8];
    out.copy_from_slice(&full[..8]);
    out
}

/// Spawn the writer task and return a handle plus its join handle (for
/// flushing on shutdown).
pub async fn spawn(path: impl AsRef<Path>) -> std::io::Result<(PacketLogHandle, JoinHandle<()>)> {
    let mut file = File::create(path).await?;
    file.write_all(b"id,packet_len,color,n_packets,seq,payload_digest\n")
        .await?;

    let (tx, mut rx) = mpsc::channel::<PacketLogRow>(1024);
    let join = tokio::spawn(async move {
        while let Some(row) = rx.recv().await {
            let line = row.to_csv_line();
            if file.write_all(line.as_bytes()).await.is_err() {
                break;
            }
        }
        let _ = file.flush().await;
    });

    Ok((
        PacketLogHandle {
            tx,
            next_id: std::sync::Arc::new(AtomicU64::new(0)),
        },
        join,
    ))
}
