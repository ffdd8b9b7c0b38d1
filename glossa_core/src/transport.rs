//! Newline-delimited JSON transport between the host browser and the
//! background service.
//!
//! Every inbound message is routed on its own task, so replies can leave in
//! a different order than requests arrived. Frames carry an `id` for
//! correlation. Relayed messages go out as `forward` frames and complete
//! when the matching `tab_reply` (or `tab_gone`) comes back.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::install::{InstallDetails, InstallOutcome};
use crate::message::{Envelope, Sender, TabId};
use crate::router::{RelayError, TabMessenger};
use crate::service::Background;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundFrame {
    Message {
        id: u64,
        #[serde(default)]
        sender: Sender,
        data: Envelope,
    },
    TabReply {
        id: u64,
        #[serde(default)]
        response: Value,
    },
    TabGone {
        id: u64,
    },
    Installed(InstallDetails),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboundFrame {
    Reply {
        id: u64,
        response: Value,
    },
    Forward {
        id: u64,
        tab_id: TabId,
        data: Envelope,
    },
    Installed {
        outcome: InstallOutcome,
    },
    Error {
        message: String,
    },
}

type PendingMap = HashMap<u64, (TabId, oneshot::Sender<Result<Value, RelayError>>)>;

/// Outbound frame queue plus the relayed calls awaiting a tab's answer.
pub struct FrameLink {
    out: mpsc::UnboundedSender<OutboundFrame>,
    pending: Arc<Mutex<PendingMap>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

// Drops the pending slot when the waiting relay finishes or is abandoned.
struct PendingGuard {
    pending: Arc<Mutex<PendingMap>>,
    id: u64,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&self.id);
        }
    }
}

impl FrameLink {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<OutboundFrame>) {
        let (out, rx) = mpsc::unbounded_channel();
        let link = Self {
            out,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        };
        (Arc::new(link), rx)
    }

    pub fn send(&self, frame: OutboundFrame) {
        if self.out.send(frame).is_err() {
            warn!("outbound frame dropped, writer is gone");
        }
    }

    /// Resolve the relayed call `id`. Unknown ids are ignored.
    pub fn complete(&self, id: u64, outcome: impl FnOnce(TabId) -> Result<Value, RelayError>) {
        let slot = match self.pending.lock() {
            Ok(mut pending) => pending.remove(&id),
            Err(_) => None,
        };
        match slot {
            Some((tab_id, tx)) => {
                let _ = tx.send(outcome(tab_id));
            }
            None => debug!(id, "reply for unknown or expired forward"),
        }
    }

    /// Fail every relayed call still waiting. Calls made afterwards fail
    /// immediately.
    pub fn fail_pending(&self, reason: &str) {
        self.closed.store(true, Ordering::SeqCst);
        let drained: Vec<_> = match self.pending.lock() {
            Ok(mut pending) => pending.drain().collect(),
            Err(_) => Vec::new(),
        };
        for (_, (_, tx)) in drained {
            let _ = tx.send(Err(RelayError::Transport(reason.to_string())));
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl TabMessenger for FrameLink {
    async fn send_to_tab(&self, tab_id: TabId, envelope: Envelope) -> Result<Value, RelayError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .map_err(|e| RelayError::Transport(format!("lock poisoned: {}", e)))?
            .insert(id, (tab_id, tx));
        let _guard = PendingGuard {
            pending: Arc::clone(&self.pending),
            id,
        };
        if self.closed.load(Ordering::SeqCst) {
            return Err(RelayError::Transport("link closed".to_string()));
        }

        self.out
            .send(OutboundFrame::Forward {
                id,
                tab_id,
                data: envelope,
            })
            .map_err(|_| RelayError::Transport("writer is gone".to_string()))?;

        rx.await
            .map_err(|_| RelayError::Transport("forward abandoned".to_string()))?
    }
}

pub struct HostTransport {
    background: Arc<Background>,
    link: Arc<FrameLink>,
    outbound: mpsc::UnboundedReceiver<OutboundFrame>,
    in_flight: Arc<AtomicUsize>,
}

impl HostTransport {
    /// `link` must be the messenger `background` was started with, and
    /// `outbound` its receiver.
    pub fn new(
        background: Arc<Background>,
        link: Arc<FrameLink>,
        outbound: mpsc::UnboundedReceiver<OutboundFrame>,
    ) -> Self {
        Self {
            background,
            link,
            outbound,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Message tasks the serve loop still holds, updated every loop turn.
    pub fn in_flight(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.in_flight)
    }

    pub async fn run_stdio(self) -> io::Result<()> {
        self.run(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve frames from `reader` until EOF, writing replies to `writer`.
    pub async fn run<R, W>(self, reader: R, writer: W) -> io::Result<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        info!("Starting host transport");
        let HostTransport {
            background,
            link,
            outbound,
            in_flight,
        } = self;

        let (stop_tx, stop_rx) = oneshot::channel();
        let writer_task = tokio::spawn(write_frames(writer, outbound, stop_rx));

        // Finished tasks are reaped as they complete, not only at EOF.
        let mut tasks = JoinSet::new();
        let mut lines = BufReader::new(reader).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    handle_line(&line, &background, &link, &mut tasks);
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => log_joined(joined),
            }
            in_flight.store(tasks.len(), Ordering::Relaxed);
        }

        debug!("EOF reached on input");
        link.fail_pending("input closed");
        while let Some(joined) = tasks.join_next().await {
            log_joined(joined);
        }
        in_flight.store(0, Ordering::Relaxed);

        let _ = stop_tx.send(());
        writer_task
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }
}

fn handle_line(
    line: &str,
    background: &Arc<Background>,
    link: &Arc<FrameLink>,
    tasks: &mut JoinSet<()>,
) {
    if line.trim().is_empty() {
        return;
    }
    debug!("Processing line: {}", line);
    match serde_json::from_str::<InboundFrame>(line) {
        Ok(frame) => dispatch(frame, background, link, tasks),
        Err(e) => {
            error!("Failed to parse frame: {}", e);
            link.send(OutboundFrame::Error {
                message: format!("parse error: {}", e),
            });
        }
    }
}

fn log_joined(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!("message task failed: {}", e);
    }
}

fn dispatch(
    frame: InboundFrame,
    background: &Arc<Background>,
    link: &Arc<FrameLink>,
    tasks: &mut JoinSet<()>,
) {
    match frame {
        InboundFrame::Message { id, sender, data } => {
            let background = Arc::clone(background);
            let link = Arc::clone(link);
            tasks.spawn(async move {
                match background.handle_message(data, sender).await {
                    Some(response) => link.send(OutboundFrame::Reply { id, response }),
                    None => debug!(id, "message produced no reply"),
                }
            });
        }
        InboundFrame::TabReply { id, response } => link.complete(id, |_| Ok(response)),
        InboundFrame::TabGone { id } => link.complete(id, |tab_id| Err(RelayError::TabClosed(tab_id))),
        InboundFrame::Installed(details) => {
            let background = Arc::clone(background);
            let link = Arc::clone(link);
            tasks.spawn(async move {
                match background.on_installed(&details).await {
                    Ok(outcome) => link.send(OutboundFrame::Installed { outcome }),
                    Err(e) => {
                        error!("install handling failed: {}", e);
                        link.send(OutboundFrame::Error {
                            message: e.to_string(),
                        });
                    }
                }
            });
        }
    }
}

async fn write_frames<W>(
    mut writer: W,
    mut outbound: mpsc::UnboundedReceiver<OutboundFrame>,
    mut stop: oneshot::Receiver<()>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(frame) => write_frame(&mut writer, &frame).await?,
                None => break,
            },
            _ = &mut stop => {
                while let Ok(frame) = outbound.try_recv() {
                    write_frame(&mut writer, &frame).await?;
                }
                break;
            }
        }
    }
    writer.flush().await
}

async fn write_frame<W>(writer: &mut W, frame: &OutboundFrame) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let line = serde_json::to_string(frame)?;
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    debug!("Sent frame: {}", line);
    Ok(())
}
