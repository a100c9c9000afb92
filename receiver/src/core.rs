//! `ReceiverCore`: per-color reassembly, completion gating, and ordered
//! emission onto the output sink.

use diode_core::const_settings::UDP_MAX_BYTES;
use diode_core::error::DiodeResult;
use diode_core::packet::{decode, Color};
use diode_core::packet_log::PacketLogHandle;
use diode_core::transport::ReceiverTransport;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// An item handed to the output writer task, in arrival order.
pub enum OutputItem {
    /// A completed, in-order slice of a data chunk.
    Data(Vec<u8>),
    /// The transfer is done; carries the claimed SHA-256 digest. A single
    /// message doubles as both end-of-stream terminator and digest payload,
    /// since the channel already preserves order for a single consumer.
    Eof(Vec<u8>),
}

fn color_index(color: Color) -> usize {
    match color {
        Color::Red => 0,
        Color::Blue => 1,
        _ => unreachable!("color_index only called for data colors"),
    }
}

pub struct ReceiverCore {
    transport: ReceiverTransport,
    sink: mpsc::Sender<OutputItem>,
    packet_log: Option<PacketLogHandle>,
    completed: [bool; 2],
    slots: [HashMap<u16, Vec<u8>>; 2],
}

impl ReceiverCore {
    pub fn new(
        transport: ReceiverTransport,
        sink: mpsc::Sender<OutputItem>,
        packet_log: Option<PacketLogHandle>,
    ) -> Self {
        Self {
            transport,
            sink,
            packet_log,
            completed: [false, false],
            slots: [HashMap::new(), HashMap::new()],
        }
    }

    /// Receive datagrams until the EOF packet arrives (or the socket errors
    /// out). Returns once the EOF item has been pushed onto the sink.
    pub async fn run(mut self) -> DiodeResult<()> {
        let mut buf = vec![0u8; UDP_MAX_BYTES];
        loop {
            let len = self.transport.recv(&mut buf).await?;
            let Some(decoded) = decode(&buf[..len]) else {
                log::debug!("dropping malformed datagram ({len} bytes)");
                continue;
            };

            match decoded.color {
                Color::Eof => {
                    log::debug!("EOF packet received");
                    let _ = self.sink.send(OutputItem::Eof(decoded.payload.to_vec())).await;
                    return Ok(());
                }
                Color::White => {
                    // Idle keep-alive filler; always ignored.
                }
                Color::Red | Color::Blue => {
                    if let Some(log_handle) = &self.packet_log {
                        log_handle.record(
                            decoded.color,
                            len,
                            decoded.n_packets,
                            decoded.seq,
                            decoded.payload,
                        );
                    }
                    self.handle_data_packet(
                        decoded.color,
                        decoded.n_packets,
                        decoded.seq,
                        decoded.payload,
                    )
                    .await;
                }
            }
        }
    }

    async fn handle_data_packet(&mut self, color: Color, n_packets: u16, seq: u16, payload: &[u8]) {
        let idx = color_index(color);
        if self.completed[idx] {
            // Duplicate of an already-emitted chunk.
            return;
        }

        // Defensive cap: never accept a seq outside [0, n_packets), and
        // never hold more than n_packets distinct slots even if a prior
        // malformed header elsewhere inflated our bookkeeping.
        if (seq as usize) < (n_packets as usize) {
            let slots = &mut self.slots[idx];
            if !slots.contains_key(&seq) && slots.len() < n_packets as usize {
                slots.insert(seq, payload.to_vec());
            }
        }

        if self.slots[idx].len() == n_packets as usize {
            log::debug!("{color:?} chunk completed");
            for seq in 0..n_packets {
                if let Some(data) = self.slots[idx].remove(&seq) {
                    if self.sink.send(OutputItem::Data(data)).await.is_err() {
                        return;
                    }
                }
            }
            self.completed[idx] = true;
            self.slots[idx].clear();
            self.completed[1 - idx] = false;
        }
    }
}
