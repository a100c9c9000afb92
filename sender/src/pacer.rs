//! `Pacer`: divides a chunk's time budget evenly across bursts of packets,
//! so the sender doesn't dump a whole chunk on the wire instantly and then
//! idle.
//!
//! Sleeps are batched every [`PACKET_BURST`] packets rather than once per
//! packet, and the final sleep tops off whatever fraction of the budget
//! the burst sleeps didn't already cover.

use diode_core::const_settings::PACKET_BURST;
use std::time::Duration;
use tokio::time::Instant;

pub struct Pacer {
    /// How many times `after_packet` is expected to be called in total.
    n_packets: usize,
    /// How many of those calls actually trigger a sleep (every `PACKET_BURST`-th).
    n_sleeps: usize,
    /// Number of `after_packet` calls seen so far.
    calls: usize,
    /// Number of sleeps performed so far.
    sleeps_done: usize,
    duration: Duration,
    start: Instant,
}

impl Pacer {
    pub fn new(n_packets: usize, duration: Duration) -> Self {
        let n_sleeps = n_packets.div_ceil(PACKET_BURST).max(1);
        Self {
            n_packets,
            n_sleeps,
            calls: 0,
            sleeps_done: 0,
            duration,
            start: Instant::now(),
        }
    }

    /// Call once per packet transmitted, with `k` the 1-based count of
    /// packets sent so far in this pass.
    pub async fn after_packet(&mut self, k: usize) {
        self.calls = k;
        if k % PACKET_BURST != 0 {
            return;
        }
        self.sleeps_done += 1;
        if self.sleeps_done > self.n_sleeps {
            return;
        }
        let target_elapsed = self.duration.mul_f64(self.sleeps_done as f64 / self.n_sleeps as f64);
        let already_elapsed = self.start.elapsed();
        if target_elapsed > already_elapsed {
            tokio::time::sleep(target_elapsed - already_elapsed).await;
        }
    }

    /// Call once after the pass completes, to fill out any remainder (e.g.
    /// when `n_packets` isn't a multiple of `PACKET_BURST`).
    pub async fn finish(&mut self) {
        if self.sleeps_done < self.n_sleeps {
            let already_elapsed = self.start.elapsed();
            if self.duration > already_elapsed {
                tokio::time::sleep(self.duration - already_elapsed).await;
            }
            self.sleeps_done = self.n_sleeps;
        }
    }

    #[cfg(test)]
    fn total_packets(&self) -> usize {
        self.n_packets
    }
}
