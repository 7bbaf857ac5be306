//! Transfer orchestration: the send/receive loops and the two peer roles.
//!
//! The state machines in [`crate::sender`] and [`crate::receiver`] are pure;
//! this module wires them to a [`Channel`] and drives them:
//!
//! - [`send_bytes`] — reliable one-way delivery of a byte stream, chunk by
//!   chunk, with timeout-driven retransmission and a trailing best-effort END.
//! - [`download`] — issue one GET and ingest the streamed response until END.
//! - [`exchange`] — the initiator role: upload a local file, then fetch the
//!   same name back and persist it under [`DOWNLOAD_ARTIFACT`].
//! - [`serve`] — the responder role: one receive loop dispatching every
//!   inbound datagram by kind, with per-peer receive sessions.
//!
//! A bounded wait on the channel is both the suspension point and the retry
//! scheduler: the wait expiring is the sole trigger for retransmission.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::timeout;

use crate::channel::Channel;
use crate::packet::{Kind, Packet, MAX_PAYLOAD};
use crate::receiver::RecvSession;
use crate::sender::ChunkSender;
use crate::socket::SocketError;
use crate::timer::RetryPolicy;

/// Fixed name under which the responder persists a completed upload.
pub const UPLOAD_ARTIFACT: &str = "received_upload.dat";

/// Fixed name under which the initiator persists a completed download.
pub const DOWNLOAD_ARTIFACT: &str = "received_download.dat";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for one endpoint.  Local only — nothing here is negotiated
/// over the wire.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Payload bytes per DATA packet (capped at [`MAX_PAYLOAD`]).
    pub chunk_size: usize,
    /// Retransmission schedule for in-flight DATA packets.
    pub retry: RetryPolicy,
    /// How long a downloader waits for the next DATA/END before declaring
    /// the request failed.
    pub idle_timeout: Duration,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: MAX_PAYLOAD,
            retry: RetryPolicy::default(),
            // Generous multiple of the retry interval so a peer mid-backoff
            // is not mistaken for a dead one.
            idle_timeout: Duration::from_secs(2),
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors surfaced by the transfer loops.
#[derive(Debug)]
pub enum TransferError {
    /// Socket-level failure (I/O, not protocol noise).
    Socket(SocketError),
    /// Local filesystem failure while reading or persisting an artifact.
    Io(std::io::Error),
    /// The retry ceiling was exhausted without an ACK for the in-flight chunk.
    RetriesExhausted,
    /// A GET produced no DATA/END within the idle window — the resource is
    /// missing or the peer is unreachable.
    RequestTimedOut,
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Socket(e) => write!(f, "transport error: {e}"),
            Self::Io(e) => write!(f, "file I/O error: {e}"),
            Self::RetriesExhausted => write!(f, "retry ceiling exhausted waiting for ACK"),
            Self::RequestTimedOut => write!(f, "no response to GET within the idle window"),
        }
    }
}

impl std::error::Error for TransferError {}

impl From<SocketError> for TransferError {
    fn from(e: SocketError) -> Self {
        Self::Socket(e)
    }
}

impl From<std::io::Error> for TransferError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Sender-role loop
// ---------------------------------------------------------------------------

/// Reliably deliver `data` to `peer`, then send one best-effort END.
///
/// Each chunk is retransmitted until its ACK arrives or the retry ceiling
/// in `config.retry` is exhausted.  The END packet is sent exactly once and
/// never acknowledged.
pub async fn send_bytes<C: Channel>(
    channel: &C,
    peer: SocketAddr,
    data: &[u8],
    config: &TransferConfig,
) -> Result<(), TransferError> {
    let chunk_size = config.chunk_size.clamp(1, MAX_PAYLOAD);
    let mut sender = ChunkSender::new();

    for chunk in data.chunks(chunk_size) {
        let packet = sender.stage(chunk.to_vec());
        log::debug!("→ DATA seq={} len={} to {peer}", packet.seq, packet.payload.len());
        channel.send_to(&packet, peer).await?;
        await_ack(channel, peer, &mut sender, &config.retry).await?;
    }

    let end = sender.finish();
    log::debug!("→ END seq={} to {peer}", end.seq);
    channel.send_to(&end, peer).await?;
    Ok(())
}

/// Block until the in-flight chunk is acknowledged, retransmitting on every
/// timeout or stale arrival.
async fn await_ack<C: Channel>(
    channel: &C,
    peer: SocketAddr,
    sender: &mut ChunkSender,
    retry: &RetryPolicy,
) -> Result<(), TransferError> {
    let mut retries = 0u32;

    loop {
        match timeout(retry.wait_for(retries), channel.recv_from()).await {
            Ok(Ok((packet, from))) => {
                if from == peer && sender.on_packet(&packet) {
                    log::debug!("← ACK seq={} from {peer}", packet.seq);
                    return Ok(());
                }
                // Wrong peer, wrong kind, or wrong sequence: stale noise.
                log::debug!(
                    "stale {:?} seq={} from {from} while awaiting ACK, resending",
                    packet.kind,
                    packet.seq
                );
            }
            // A datagram that fails to decode is treated exactly like loss.
            Ok(Err(SocketError::Packet(e))) => {
                log::debug!("corrupted datagram while awaiting ACK: {e}");
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_elapsed) => {
                log::debug!(
                    "timeout on seq={} (tx {}), resending",
                    sender.current_seq(),
                    sender.tx_count()
                );
            }
        }

        retries += 1;
        if retry.exhausted(retries) {
            return Err(TransferError::RetriesExhausted);
        }
        if let Some(packet) = sender.retransmit() {
            channel.send_to(packet, peer).await?;
        }
    }
}

// ---------------------------------------------------------------------------
// Initiator role
// ---------------------------------------------------------------------------

/// Upload the file at `path` to `peer`.
pub async fn upload_file<C: Channel>(
    channel: &C,
    peer: SocketAddr,
    path: &Path,
    config: &TransferConfig,
) -> Result<(), TransferError> {
    let data = tokio::fs::read(path).await?;
    log::info!("uploading '{}' ({} bytes) to {peer}", path.display(), data.len());
    send_bytes(channel, peer, &data, config).await?;
    log::info!("upload complete");
    Ok(())
}

/// Issue one GET for `name` and ingest the streamed response until END.
///
/// The GET itself is best-effort.  If no decodable DATA/END arrives within
/// `config.idle_timeout`, the request is declared failed — the responder
/// stays silent for unknown resources, so a timeout is the only signal.
pub async fn download<C: Channel>(
    channel: &C,
    peer: SocketAddr,
    name: &str,
    config: &TransferConfig,
) -> Result<Vec<u8>, TransferError> {
    log::info!("requesting '{name}' from {peer}");
    channel.send_to(&Packet::get(name), peer).await?;

    let mut session = RecvSession::new();
    loop {
        let (packet, from) = match timeout(config.idle_timeout, channel.recv_from()).await {
            Ok(Ok(received)) => received,
            Ok(Err(SocketError::Packet(e))) => {
                // Corrupted: discard and let the peer's timeout retransmit.
                log::debug!("corrupted datagram during download: {e}");
                continue;
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_elapsed) => return Err(TransferError::RequestTimedOut),
        };

        if from != peer {
            continue;
        }

        match packet.kind {
            Kind::Data => {
                let verdict = session.on_data(packet.seq, &packet.payload);
                if verdict.accepted {
                    log::debug!("← DATA seq={} len={}", packet.seq, packet.payload.len());
                } else {
                    log::debug!("← duplicate DATA seq={}, re-ACKing {}", packet.seq, verdict.ack_seq);
                }
                channel.send_to(&Packet::ack(verdict.ack_seq), peer).await?;
            }
            Kind::End => {
                let body = session.on_end();
                log::info!("download of '{name}' complete: {} bytes", body.len());
                return Ok(body);
            }
            // Not receiver-role traffic on this side; ignore.
            Kind::Ack | Kind::Get => {}
        }
    }
}

/// The full initiator flow: upload `<dir>/<filename>`, then fetch `filename`
/// back from the peer and persist it as `<dir>/`[`DOWNLOAD_ARTIFACT`].
///
/// Returns the path of the persisted download.
pub async fn exchange<C: Channel>(
    channel: &C,
    peer: SocketAddr,
    dir: &Path,
    filename: &str,
    config: &TransferConfig,
) -> Result<PathBuf, TransferError> {
    upload_file(channel, peer, &dir.join(filename), config).await?;

    let body = download(channel, peer, filename, config).await?;
    let out = dir.join(DOWNLOAD_ARTIFACT);
    tokio::fs::write(&out, &body).await?;
    log::info!("saved download as '{}'", out.display());
    Ok(out)
}

// ---------------------------------------------------------------------------
// Responder role
// ---------------------------------------------------------------------------

/// Run the responder loop forever, rooted at `root`.
///
/// Every inbound datagram is dispatched by kind:
/// - GET — stream the named file back to the requester with the full
///   sender-role loop.  Missing or unsafe names get no response at all.
/// - DATA — ingested into that peer's [`RecvSession`] and acknowledged.
///   Sessions are keyed by peer address, so concurrent uploaders cannot
///   corrupt each other's buffers.
/// - END — the peer's buffer is persisted as `<root>/`[`UPLOAD_ARTIFACT`]
///   and the session is discarded.
///
/// Transfers are still served one at a time from this single loop; while a
/// GET is being streamed, other peers' traffic is treated as stale noise by
/// the sender loop and recovered by their own retransmissions.
pub async fn serve<C: Channel>(
    channel: &C,
    root: &Path,
    config: &TransferConfig,
) -> Result<(), TransferError> {
    let mut sessions: HashMap<SocketAddr, RecvSession> = HashMap::new();

    loop {
        let (packet, from) = match channel.recv_from().await {
            Ok(received) => received,
            Err(SocketError::Packet(e)) => {
                // Malformed: drop silently, no NACK; the sender will retry.
                log::warn!("discarding corrupted datagram: {e}");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        match packet.kind {
            Kind::Get => {
                let name = String::from_utf8_lossy(&packet.payload).into_owned();
                if !is_safe_name(&name) {
                    log::warn!("ignoring GET with unsafe name {name:?} from {from}");
                    continue;
                }
                let data = match tokio::fs::read(root.join(&name)).await {
                    Ok(data) => data,
                    Err(e) => {
                        // Unknown resource: no action, no response.  The
                        // requester's idle window surfaces the failure.
                        log::info!("GET '{name}' from {from}: unavailable ({e}), ignoring");
                        continue;
                    }
                };
                log::info!("GET '{name}' from {from}: streaming {} bytes", data.len());
                match send_bytes(channel, from, &data, config).await {
                    Ok(()) => log::info!("finished streaming '{name}' to {from}"),
                    Err(TransferError::RetriesExhausted) => {
                        log::warn!("gave up streaming '{name}' to {from}");
                    }
                    Err(e) => return Err(e),
                }
            }

            Kind::Data => {
                let session = sessions.entry(from).or_default();
                let verdict = session.on_data(packet.seq, &packet.payload);
                if verdict.accepted {
                    log::debug!("← DATA seq={} len={} from {from}", packet.seq, packet.payload.len());
                } else {
                    log::debug!("← duplicate DATA seq={} from {from}, re-ACKing {}", packet.seq, verdict.ack_seq);
                }
                channel.send_to(&Packet::ack(verdict.ack_seq), from).await?;
            }

            Kind::End => {
                let artifact = sessions.remove(&from).unwrap_or_default().on_end();
                let out = root.join(UPLOAD_ARTIFACT);
                tokio::fs::write(&out, &artifact).await?;
                log::info!(
                    "upload from {from} complete: {} bytes saved as '{}'",
                    artifact.len(),
                    out.display()
                );
            }

            Kind::Ack => {
                log::debug!("stray ACK seq={} from {from}", packet.seq);
            }
        }
    }
}

/// Reject resource names that would escape the serving root.
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\'])
        && name != "."
        && name != ".."
}
