//! The per-connection pipeline loop.
//!
//! Responsibilities:
//! - Handshake: init/auth, initial listings, then `sync`
//! - Strictly sequential feed -> frame -> decode -> interpret -> apply
//! - Lifecycle: ping interval + idle timeout
//! - Publish: snapshot per processed frame, change descriptor per apply
//!
//! Decode/apply failures are frame- or message-local and never end the loop;
//! only transport-level failures do.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, Instant, MissedTickBehavior};

use weerelay_proto::wire::{decode_message, Frame, FrameReader};
use weerelay_proto::{RelayError, Result};

use crate::config::RelayConfig;
use crate::dispatch::EventRegistry;
use crate::obs::PipelineMetrics;
use crate::session::{Session, SessionChange, SessionStore};
use crate::transport::{commands, RelayTransport, TransportRx, TransportTx};

pub(crate) async fn run_session<T: RelayTransport>(
    cfg: RelayConfig,
    transport: T,
    registry: Arc<EventRegistry>,
    metrics: Arc<PipelineMetrics>,
    mut cmd_rx: mpsc::Receiver<String>,
    snapshots: watch::Sender<Arc<Session>>,
    changes: mpsc::Sender<SessionChange>,
) -> Result<()> {
    let mut store = SessionStore::new(cfg.session.max_lines_per_buffer);
    let mut reader = FrameReader::new(cfg.relay.max_frame_bytes);

    // ---- split socket
    let (mut rx, mut tx) = transport.split();

    // ---- handshake: auth, seed the session, then subscribe
    tx.send(&commands::init(&cfg.relay.password, cfg.relay.compression))
        .await?;
    tx.send(&commands::list_buffers()).await?;
    tx.send(&commands::list_lines(cfg.session.lines_per_buffer))
        .await?;
    tx.send(&commands::last_read_lines()).await?;
    tx.send(&commands::request_nicklist()).await?;
    tx.send(&commands::sync()).await?;

    // ---- timers
    let ping_every = Duration::from_millis(cfg.relay.ping_interval_ms);
    let idle_timeout = Duration::from_millis(cfg.relay.idle_timeout_ms);
    let mut ping_tick = tokio::time::interval(ping_every);
    ping_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ping_seq: u64 = 0;
    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            // caller commands
            maybe_cmd = cmd_rx.recv() => {
                match maybe_cmd {
                    Some(cmd) => tx.send(&cmd).await?,
                    None => {
                        // Handle dropped: leave politely.
                        let _ = tx.send(&commands::quit()).await;
                        return Ok(());
                    }
                }
            }

            // inbound bytes
            incoming = rx.recv() => {
                let Some(bytes) = incoming? else {
                    return Err(RelayError::Transport("connection closed by relay".into()));
                };
                last_activity = Instant::now();
                metrics.bytes_in(bytes.len());

                reader.feed(&bytes);
                loop {
                    match reader.next_frame() {
                        Ok(Some(frame)) => {
                            apply_frame(frame, &registry, &mut store, &metrics, &snapshots, &changes);
                        }
                        Ok(None) => break,
                        Err(e) => {
                            metrics.error(e.kind());
                            tracing::warn!(error = %e, "frame dropped");
                        }
                    }
                }
            }

            // keepalive
            _ = ping_tick.tick() => {
                ping_seq += 1;
                tx.send(&commands::ping(&ping_seq.to_string())).await?;
            }

            // idle timeout
            _ = tokio::time::sleep(Duration::from_millis(250)) => {
                if last_activity.elapsed() >= idle_timeout {
                    return Err(RelayError::Transport("idle timeout".into()));
                }
            }
        }
    }
}

/// Decode one frame, interpret it, and fold its mutations into the store.
/// Failures drop the message; the stream continues.
pub(crate) fn apply_frame(
    frame: Frame,
    registry: &EventRegistry,
    store: &mut SessionStore,
    metrics: &PipelineMetrics,
    snapshots: &watch::Sender<Arc<Session>>,
    changes: &mpsc::Sender<SessionChange>,
) {
    metrics.frame();

    let msg = match decode_message(&frame.payload) {
        Ok(msg) => msg,
        Err(e) => {
            metrics.error(e.kind());
            tracing::warn!(error = %e, "message dropped");
            return;
        }
    };

    let mutations = match registry.interpret(&msg) {
        Ok(m) => m,
        Err(e) => {
            metrics.error(e.kind());
            tracing::warn!(id = %msg.id, error = %e, "event dropped");
            return;
        }
    };
    if mutations.is_empty() {
        return;
    }

    for mutation in mutations {
        let change = store.apply(mutation);
        match &change {
            SessionChange::Ignored { .. } => metrics.orphan(),
            SessionChange::LineAppended { evicted: true, .. } => metrics.eviction(),
            _ => {}
        }
        // A diff missed by a slow consumer is recoverable from the watch
        // snapshot published below.
        if changes.try_send(change).is_err() {
            metrics.change_dropped();
        }
    }

    snapshots.send_replace(Arc::new(store.snapshot()));
}
