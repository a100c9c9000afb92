//! Output writer task: drains the ordered sink, writes to stdout, and
//! verifies the cumulative digest once EOF arrives.

use crate::core::OutputItem;
use diode_core::error::DiodeError;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

/// Consume `sink` until an `OutputItem::Eof` arrives (or the channel
/// closes without one), writing every data item to `out` as it arrives
/// and comparing the running digest against the claimed one.
pub async fn run<W: AsyncWriteExt + Unpin>(
    mut sink: mpsc::Receiver<OutputItem>,
    mut out: W,
) -> Result<(), DiodeError> {
    let mut sha = Sha256::new();

    while let Some(item) = sink.recv().await {
        match item {
            OutputItem::Data(data) => {
                sha.update(&data);
                out.write_all(&data).await?;
            }
            OutputItem::Eof(claimed_digest) => {
                out.flush().await?;
                let computed = sha.finalize();
                if computed.as_slice() == claimed_digest.as_slice() {
                    log::info!("digest matched, transfer complete");
                    return Ok(());
                }
                log::warn!(
                    "digest mismatch: computed {} claimed {}",
                    hex(computed.as_slice()),
                    hex(&claimed_digest)
                );
                return Err(DiodeError::DigestMismatch);
            }
        }
    }

    out.flush().await?;
    Err(DiodeError::MissingEof)
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
