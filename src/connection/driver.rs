//! Connection driver task.
//!
//! One spawned task owns the link handle, the receive assembler, and the
//! state machine. Every mutation flows through it:
//!
//! ```text
//! connect/disconnect/write/ping ─┐
//! heartbeat ticks ───────────────┼─► mpsc::Sender<Command> ─► Driver ─► Link
//! ```
//!
//! The loop selects over the command queue, the link read (armed only while
//! `Connected`), and the debounce deadline (armed only while `PendingLoss`).
//! Because writes complete inside the task before the next command is taken,
//! two concurrent `write()` callers can never interleave frame bytes on the
//! wire, and payloads are delivered upward in exactly the order they were
//! assembled.

use std::io;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

use super::heartbeat::Heartbeat;
use super::state::LinkState;
use super::{ConnectionParameters, ConnectionStatus, KeepaliveSource};
use crate::error::{FramelinkError, Result};
use crate::handler::DeviceHandler;
use crate::protocol::{encode_frame, ReceiveAssembler};
use crate::transport::{Link, LinkOpener};

/// Default wait before a loss signal is believed.
///
/// Some environments emit transient error/close notifications for non-fatal
/// conditions (USB re-enumeration among them); treating every signal as
/// fatal would make the connection flap.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

/// Read buffer size for link reads.
const READ_CHUNK_SIZE: usize = 1024;

/// Commands accepted by the driver task.
pub(crate) enum Command {
    Connect {
        params: ConnectionParameters,
        reply: oneshot::Sender<Result<()>>,
    },
    Disconnect {
        reply: oneshot::Sender<()>,
    },
    Reconnect {
        reply: oneshot::Sender<Result<()>>,
    },
    Write {
        payload: Bytes,
        reply: oneshot::Sender<Result<()>>,
    },
    Ping {
        reply: oneshot::Sender<bool>,
    },
    Keepalive,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::Connect { .. } => "Connect",
            Command::Disconnect { .. } => "Disconnect",
            Command::Reconnect { .. } => "Reconnect",
            Command::Write { .. } => "Write",
            Command::Ping { .. } => "Ping",
            Command::Keepalive => "Keepalive",
        };
        f.write_str(name)
    }
}

/// Driver configuration, assembled by the builder.
pub(crate) struct DriverConfig {
    pub heartbeat_period: Duration,
    pub debounce_window: Duration,
    pub keepalive: Option<KeepaliveSource>,
}

/// The event-loop task behind a `SerialConnection`.
pub(crate) struct Driver<H, O: LinkOpener> {
    handler: H,
    opener: O,
    cmd_rx: mpsc::Receiver<Command>,
    /// Sender back into our own queue, handed to the heartbeat task.
    cmd_tx: mpsc::Sender<Command>,
    status_tx: watch::Sender<ConnectionStatus>,

    state: LinkState,
    link: Option<O::Link>,
    assembler: ReceiveAssembler,
    params: Option<ConnectionParameters>,
    heartbeat: Option<Heartbeat>,
    debounce_deadline: Option<Instant>,

    heartbeat_period: Duration,
    debounce_window: Duration,
    keepalive: Option<KeepaliveSource>,
}

impl<H, O> Driver<H, O>
where
    H: DeviceHandler,
    O: LinkOpener,
{
    pub(crate) fn new(
        handler: H,
        opener: O,
        cmd_rx: mpsc::Receiver<Command>,
        cmd_tx: mpsc::Sender<Command>,
        status_tx: watch::Sender<ConnectionStatus>,
        config: DriverConfig,
    ) -> Self {
        Self {
            handler,
            opener,
            cmd_rx,
            cmd_tx,
            status_tx,
            state: LinkState::Disconnected,
            link: None,
            assembler: ReceiveAssembler::new(),
            params: None,
            heartbeat: None,
            debounce_deadline: None,
            heartbeat_period: config.heartbeat_period,
            debounce_window: config.debounce_window,
            keepalive: config.keepalive,
        }
    }

    /// Main loop. Exits when every `SerialConnection` handle is dropped.
    pub(crate) async fn run(mut self) {
        let mut read_buf = vec![0u8; READ_CHUNK_SIZE];

        loop {
            let reading = self.link.is_some() && self.state == LinkState::Connected;
            let debounce_at = self.debounce_deadline;

            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => break,
                    }
                }
                result = read_some(self.link.as_mut(), &mut read_buf), if reading => {
                    self.handle_read(result, &read_buf);
                }
                _ = tokio::time::sleep_until(debounce_at.unwrap_or_else(Instant::now)),
                    if debounce_at.is_some() =>
                {
                    self.handle_debounce_expired().await;
                }
            }
        }

        // All handles dropped: tear down without notifications.
        self.cancel_heartbeat();
        if let Some(mut link) = self.link.take() {
            link.close().await;
        }
        tracing::debug!("connection driver exited");
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Connect { params, reply } => {
                let result = self.handle_connect(params).await;
                let _ = reply.send(result);
            }
            Command::Disconnect { reply } => {
                self.handle_disconnect().await;
                let _ = reply.send(());
            }
            Command::Reconnect { reply } => {
                let result = self.handle_reconnect().await;
                let _ = reply.send(result);
            }
            Command::Write { payload, reply } => {
                let result = self.handle_write(payload).await;
                let _ = reply.send(result);
            }
            Command::Ping { reply } => {
                let alive = self.link.as_ref().is_some_and(|link| link.is_open());
                let _ = reply.send(alive);
            }
            Command::Keepalive => self.handle_keepalive().await,
        }
    }

    async fn handle_connect(&mut self, params: ConnectionParameters) -> Result<()> {
        match self.state {
            LinkState::Disconnected => {}
            LinkState::Connecting => return Err(FramelinkError::AlreadyConnecting),
            _ => return Err(FramelinkError::AlreadyConnected),
        }

        self.params = Some(params.clone());
        self.transition(LinkState::Connecting);

        match self.opener.open(&params).await {
            Ok(link) => {
                tracing::debug!(path = %params.path, baud = params.baud_rate, "link opened");
                self.link = Some(link);
                self.assembler.clear();
                self.transition(LinkState::Connected);
                if self.keepalive.is_some() {
                    self.heartbeat =
                        Some(Heartbeat::spawn(self.cmd_tx.clone(), self.heartbeat_period));
                }
                Ok(())
            }
            Err(e) => {
                tracing::debug!(path = %params.path, error = %e, "open failed");
                self.transition(LinkState::Disconnected);
                Err(e)
            }
        }
    }

    /// Best-effort teardown; safe from any state.
    async fn handle_disconnect(&mut self) {
        if self.state == LinkState::Disconnected {
            return;
        }

        self.cancel_heartbeat();
        self.debounce_deadline = None;

        if matches!(self.state, LinkState::Connected | LinkState::PendingLoss) {
            self.transition(LinkState::Disconnecting);
        }

        if let Some(mut link) = self.link.take() {
            link.close().await;
        }
        self.assembler.clear();
        self.transition(LinkState::Disconnected);
    }

    async fn handle_reconnect(&mut self) -> Result<()> {
        let Some(params) = self.params.clone() else {
            return Err(FramelinkError::NotConfigured);
        };
        self.handle_disconnect().await;
        self.handle_connect(params).await
    }

    async fn handle_write(&mut self, payload: Bytes) -> Result<()> {
        // PendingLoss still projects to Connected: the link may well survive
        // the debounce, and a dead one fails the write anyway.
        if !matches!(self.state, LinkState::Connected | LinkState::PendingLoss) {
            return Err(FramelinkError::NotConnected);
        }

        let frame = encode_frame(&payload)?;
        let Some(link) = self.link.as_mut() else {
            return Err(FramelinkError::NotConnected);
        };
        write_frame(link, &frame).await?;
        Ok(())
    }

    async fn handle_keepalive(&mut self) {
        // Ticks queued before a teardown land here and are dropped.
        if self.state != LinkState::Connected {
            return;
        }
        let Some(source) = self.keepalive.as_mut() else {
            return;
        };

        let payload = source();
        let frame = match encode_frame(&payload) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "keep-alive payload rejected");
                return;
            }
        };

        if let Some(link) = self.link.as_mut() {
            if let Err(e) = write_frame(link, &frame).await {
                // Best-effort: a failed heartbeat never changes state.
                tracing::warn!(error = %e, "keep-alive write failed");
            }
        }
    }

    fn handle_read(&mut self, result: io::Result<usize>, buf: &[u8]) {
        match result {
            Ok(0) => {
                tracing::debug!("link signalled end of stream");
                self.handle_loss_signal();
            }
            Ok(n) => {
                let feed = self.assembler.feed(&buf[..n]);
                for payload in feed.payloads {
                    if let Err(e) = self.handler.on_payload(payload) {
                        tracing::error!(error = %e, "payload handler error");
                    }
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "link read error");
                self.handle_loss_signal();
            }
        }
    }

    /// An error or close signal arrived from the link. Do not believe it
    /// yet: re-check after the debounce window.
    fn handle_loss_signal(&mut self) {
        if self.state != LinkState::Connected {
            return;
        }
        self.transition(LinkState::PendingLoss);
        self.debounce_deadline = Some(Instant::now() + self.debounce_window);
    }

    async fn handle_debounce_expired(&mut self) {
        self.debounce_deadline = None;
        if self.state != LinkState::PendingLoss {
            return;
        }

        if self.link.as_ref().is_some_and(|link| link.is_open()) {
            tracing::debug!("loss signal was spurious, link still open");
            self.transition(LinkState::Connected);
            return;
        }

        tracing::debug!("link loss confirmed");
        self.cancel_heartbeat();
        self.transition(LinkState::Disconnecting);
        if let Some(mut link) = self.link.take() {
            link.close().await;
        }
        self.assembler.clear();
        self.transition(LinkState::Disconnected);
    }

    fn cancel_heartbeat(&mut self) {
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.cancel();
        }
    }

    /// Move to `next`, notifying the handler when the public status changes.
    ///
    /// Sub-state moves (`Connected` ⇄ `PendingLoss`, entering
    /// `Disconnecting`) project to the same status and are silent, so a
    /// suppressed spurious loss produces no notification at all.
    fn transition(&mut self, next: LinkState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );

        let prev = self.state;
        self.state = next;
        tracing::debug!(?prev, ?next, "state transition");

        let status = next.status();
        if prev.status() != status {
            let _ = self.status_tx.send(status);
            self.handler.on_status(status);
        }
    }
}

/// Read from the link if one is present; otherwise never resolve.
///
/// The select branch is additionally gated on the link being present, so
/// the pending arm is never actually polled.
async fn read_some<L: Link>(link: Option<&mut L>, buf: &mut [u8]) -> io::Result<usize> {
    match link {
        Some(link) => link.read_chunk(buf).await,
        None => std::future::pending().await,
    }
}

async fn write_frame<L: Link>(link: &mut L, frame: &[u8]) -> io::Result<()> {
    link.write_all(frame).await?;
    link.flush().await
}
