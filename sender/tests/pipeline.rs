use diode_core::packet::{decode, Color};
use diode_core::rate::{resolve, ChunkSizing};
use diode_core::transport::SenderTransport;
use diode_core::ChunkBuffer;
use rand::{RngCore, SeedableRng};
use sender::core::SenderCore;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::Instant;

async fn capture_socket() -> (UdpSocket, u16) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.expect("bind capture socket");
    let port = socket.local_addr().unwrap().port();
    (socket, port)
}

/// Drain every datagram the capture socket has queued up within a short
/// grace window, then stop. Good enough once the sender side has finished.
async fn drain(socket: &UdpSocket) -> Vec<Vec<u8>> {
    let mut datagrams = Vec::new();
    let mut buf = vec![0u8; 2048];
    loop {
        match tokio::time::timeout(Duration::from_millis(200), socket.recv(&mut buf)).await {
            Ok(Ok(n)) => datagrams.push(buf[..n].to_vec()),
            _ => break,
        }
    }
    datagrams
}

#[tokio::test]
async fn colors_alternate_and_eof_digest_matches() {
    let (capture, port) = capture_socket().await;
    let loopback = IpAddr::V4(Ipv4Addr::LOCALHOST);
    let transport = SenderTransport::bind(loopback, loopback, port).await.unwrap();

    let buffer = Arc::new(ChunkBuffer::new());
    buffer.append(b"first-chunk-", 12);
    buffer.append(b"second-chunk", 12);
    buffer.push_eof();

    let core = SenderCore::new(transport, buffer, 4, Duration::from_millis(1), 1, None);
    let send_task = tokio::spawn(core.run());

    let datagrams = drain(&capture).await;
    send_task.await.unwrap().unwrap();

    let decoded: Vec<_> = datagrams.iter().filter_map(|d| decode(d)).collect();
    assert!(!decoded.is_empty());

    let data_colors: Vec<Color> = decoded
        .iter()
        .filter(|d| matches!(d.color, Color::Red | Color::Blue))
        .map(|d| d.color)
        .collect();
    // Consecutive distinct chunk colors must differ. Group consecutive
    // repeats of the same color (redundant copies of the same chunk) and
    // check only the transitions between groups.
    let mut last_group_color = None;
    for color in &data_colors {
        if last_group_color != Some(*color) {
            if let Some(prev) = last_group_color {
                assert_ne!(prev, *color, "consecutive chunks must alternate color");
            }
            last_group_color = Some(*color);
        }
    }

    let eof = decoded
        .iter()
        .find(|d| matches!(d.color, Color::Eof))
        .expect("an EOF packet must have been sent");
    let expected_digest = Sha256::digest(b"first-chunk-second-chunk");
    assert_eq!(eof.payload, expected_digest.as_slice());
}

#[tokio::test]
async fn first_chunk_is_sent_with_warmup_redundancy() {
    let (capture, port) = capture_socket().await;
    let loopback = IpAddr::V4(Ipv4Addr::LOCALHOST);
    let transport = SenderTransport::bind(loopback, loopback, port).await.unwrap();

    let buffer = Arc::new(ChunkBuffer::new());
    buffer.append(b"only-chunk", 10);
    buffer.push_eof();

    // chunk_max_packets=1 (the chunk itself is one packet) so every
    // redundancy pass emits exactly one datagram; redundancy=1 -> warmup
    // redundancy is MIN_WARMUP_CHUNKS + 1 - 1 = MIN_WARMUP_CHUNKS passes.
    let core = SenderCore::new(transport, buffer, 1, Duration::from_millis(1), 1, None);
    let send_task = tokio::spawn(core.run());

    let datagrams = drain(&capture).await;
    send_task.await.unwrap().unwrap();

    let data_copies = datagrams
        .iter()
        .filter_map(|d| decode(d))
        .filter(|d| d.color == Color::Red)
        .count();
    assert_eq!(data_copies, diode_core::const_settings::MIN_WARMUP_CHUNKS as usize);
}

/// Reassemble datagrams the way `ReceiverCore` would, without depending on
/// the `receiver` crate: dedup per (color, seq), emit a chunk once all its
/// slots arrive, drop filler and stale repeats.
fn reassemble(datagrams: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut completed = [false, false];
    let mut slots: [HashMap<u16, Vec<u8>>; 2] = [HashMap::new(), HashMap::new()];

    for raw in datagrams {
        let Some(decoded) = decode(raw) else { continue };
        let idx = match decoded.color {
            Color::Red => 0,
            Color::Blue => 1,
            Color::White => continue,
            Color::Eof => break,
        };
        if completed[idx] {
            continue;
        }
        slots[idx].entry(decoded.seq).or_insert_with(|| decoded.payload.to_vec());
        if slots[idx].len() == decoded.n_packets as usize {
            for seq in 0..decoded.n_packets {
                out.extend_from_slice(&slots[idx].remove(&seq).unwrap());
            }
            completed[idx] = true;
            completed[1 - idx] = false;
        }
    }
    out
}

#[tokio::test]
async fn random_payload_round_trips_with_matching_digest() {
    let (capture, port) = capture_socket().await;
    let loopback = IpAddr::V4(Ipv4Addr::LOCALHOST);
    let transport = SenderTransport::bind(loopback, loopback, port).await.unwrap();

    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let mut payload = vec![0u8; 125_000];
    rng.fill_bytes(&mut payload);

    let buffer = Arc::new(ChunkBuffer::new());
    let chunk_cap = 4096;
    for window in payload.chunks(chunk_cap) {
        buffer.append(window, chunk_cap);
    }
    buffer.push_eof();

    let core = SenderCore::new(transport, buffer, 50, Duration::from_micros(200), 2, None);
    let send_task = tokio::spawn(core.run());

    let datagrams = drain_until_eof(&capture).await;
    send_task.await.unwrap().unwrap();

    let reassembled = reassemble(&datagrams);
    assert_eq!(Sha256::digest(&reassembled).as_slice(), Sha256::digest(&payload).as_slice());
    assert_eq!(reassembled, payload);
}

/// Like `drain`, but stops as soon as an EOF packet has been observed,
/// since a large transfer can otherwise race the grace-period timeout.
async fn drain_until_eof(socket: &UdpSocket) -> Vec<Vec<u8>> {
    let mut datagrams = Vec::new();
    let mut buf = vec![0u8; 2048];
    loop {
        match tokio::time::timeout(Duration::from_millis(500), socket.recv(&mut buf)).await {
            Ok(Ok(n)) => {
                let raw = buf[..n].to_vec();
                let is_eof = decode(&raw).map(|d| d.color == Color::Eof).unwrap_or(false);
                datagrams.push(raw);
                if is_eof {
                    break;
                }
            }
            _ => break,
        }
    }
    datagrams
}

/// Like `drain_until_eof`, but also timestamps each datagram's arrival so
/// a caller can compute throughput over a window.
async fn drain_with_arrivals(socket: &UdpSocket) -> Vec<(Instant, Vec<u8>)> {
    let mut datagrams = Vec::new();
    let mut buf = vec![0u8; 2048];
    loop {
        match tokio::time::timeout(Duration::from_millis(500), socket.recv(&mut buf)).await {
            Ok(Ok(n)) => {
                let now = Instant::now();
                let raw = buf[..n].to_vec();
                let is_eof = decode(&raw).map(|d| d.color == Color::Eof).unwrap_or(false);
                datagrams.push((now, raw));
                if is_eof {
                    break;
                }
            }
            _ => break,
        }
    }
    datagrams
}

#[tokio::test]
async fn steady_state_throughput_stays_within_rate_cap() {
    let (capture, port) = capture_socket().await;
    let loopback = IpAddr::V4(Ipv4Addr::LOCALHOST);
    let transport = SenderTransport::bind(loopback, loopback, port).await.unwrap();

    // 2 Mbit/s cap -> 250,000 bytes/sec allowed, 275,000 with the spec's
    // 1.1x burst-jitter slack.
    let max_bitrate: u64 = 2_000_000;
    let plan = resolve(ChunkSizing::MaxPackets(20), max_bitrate);

    // Warmup chunk (excluded from measurement) plus two full steady-state
    // chunks, so there's a complete post-warmup pass to measure.
    let buffer = Arc::new(ChunkBuffer::new());
    for _ in 0..3 {
        buffer.append(&vec![0xABu8; plan.chunk_max_data_bytes], plan.chunk_max_data_bytes);
    }
    buffer.push_eof();

    let core = SenderCore::new(
        transport,
        buffer,
        plan.chunk_max_packets as usize,
        Duration::from_secs_f64(plan.chunk_duration),
        1,
        None,
    );
    let send_task = tokio::spawn(core.run());

    let arrivals = drain_with_arrivals(&capture).await;
    send_task.await.unwrap().unwrap();

    let colors: Vec<Color> = arrivals
        .iter()
        .map(|(_, d)| decode(d).unwrap().color)
        .collect();
    let warmup_color = colors[0];
    let steady_start = colors
        .iter()
        .position(|&c| c != warmup_color)
        .expect("expected at least one post-warmup chunk");

    let steady_color = colors[steady_start];
    let pass_end = colors[steady_start..]
        .iter()
        .position(|&c| c != steady_color)
        .map(|offset| steady_start + offset)
        .unwrap_or(arrivals.len());
    let pass = &arrivals[steady_start..pass_end];

    let window_start = pass.first().unwrap().0;
    let window_end = pass.last().unwrap().0;
    let elapsed = window_end.duration_since(window_start).max(Duration::from_micros(1));
    let bytes_on_wire: usize = pass.iter().map(|(_, d)| d.len()).sum();

    let observed_rate = bytes_on_wire as f64 / elapsed.as_secs_f64();
    let cap_with_jitter = (max_bitrate as f64 / 8.0) * 1.1;
    assert!(
        observed_rate <= cap_with_jitter,
        "observed {observed_rate:.0} B/s exceeded the 1.1x-jittered cap of {cap_with_jitter:.0} B/s"
    );
}
