//! Connection module - builder, public handle, and lifecycle machinery.
//!
//! [`ConnectionBuilder`] provides a fluent API for configuring the
//! connection; [`SerialConnection`] is the cheaply-cloneable handle whose
//! methods enqueue commands into the single driver task:
//!
//! 1. Build with a [`DeviceHandler`](crate::handler::DeviceHandler)
//! 2. `connect()` with [`ConnectionParameters`]
//! 3. `write()` payloads; received payloads arrive at the handler
//! 4. `disconnect()` (or drop every handle) to tear the link down
//!
//! # Example
//!
//! ```ignore
//! use framelink::{ConnectionBuilder, ConnectionParameters};
//!
//! let connection = ConnectionBuilder::new(MyHandler::default())
//!     .keepalive(|| heartbeat_payload())
//!     .spawn();
//!
//! connection.connect(ConnectionParameters::new("/dev/ttyUSB0")).await?;
//! connection.write(b"\x01\x02".as_slice().into()).await?;
//! ```

mod driver;
mod heartbeat;
mod state;

pub use driver::DEFAULT_DEBOUNCE_WINDOW;
pub use heartbeat::DEFAULT_HEARTBEAT_PERIOD;
pub use state::ConnectionStatus;

use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};

use crate::error::{FramelinkError, Result};
use crate::handler::DeviceHandler;
use crate::transport::{LinkOpener, SerialOpener};
use driver::{Command, Driver, DriverConfig};

/// Default baud rate for serial links.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default capacity of the driver's command queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Source of keep-alive payloads, invoked once per heartbeat tick.
pub type KeepaliveSource = Box<dyn FnMut() -> Bytes + Send>;

/// Parameters for opening the link.
///
/// Immutable once a connect is issued; a later `connect` call with
/// different parameters supersedes the stored copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParameters {
    /// Port address, e.g. `/dev/ttyUSB0` or `COM3`.
    pub path: String,
    /// Baud rate, 115200 unless overridden.
    pub baud_rate: u32,
}

impl ConnectionParameters {
    /// Parameters for `path` at the default baud rate.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }

    /// Override the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

/// Builder for configuring and spawning a connection.
pub struct ConnectionBuilder<H> {
    handler: H,
    heartbeat_period: Duration,
    debounce_window: Duration,
    queue_capacity: usize,
    keepalive: Option<KeepaliveSource>,
}

impl<H: DeviceHandler> ConnectionBuilder<H> {
    /// Create a builder delivering notifications to `handler`.
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            heartbeat_period: DEFAULT_HEARTBEAT_PERIOD,
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            keepalive: None,
        }
    }

    /// Supply the keep-alive payload source.
    ///
    /// Without one, no heartbeat runs: the connection cannot invent a
    /// keep-alive the device would understand.
    pub fn keepalive<F>(mut self, source: F) -> Self
    where
        F: FnMut() -> Bytes + Send + 'static,
    {
        self.keepalive = Some(Box::new(source));
        self
    }

    /// Set the heartbeat interval.
    ///
    /// Default: 60 seconds.
    pub fn heartbeat_period(mut self, period: Duration) -> Self {
        self.heartbeat_period = period;
        self
    }

    /// Set how long a loss signal must persist before it is believed.
    ///
    /// Default: 100 milliseconds.
    pub fn debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    /// Set the command queue capacity.
    ///
    /// Default: 32.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Spawn the driver task over native serial ports.
    pub fn spawn(self) -> SerialConnection {
        self.spawn_with(SerialOpener)
    }

    /// Spawn the driver task over a custom link opener.
    ///
    /// This is how tests substitute in-memory links, and how alternative
    /// transports plug in.
    pub fn spawn_with<O: LinkOpener>(self, opener: O) -> SerialConnection {
        let (cmd_tx, cmd_rx) = mpsc::channel(self.queue_capacity);
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);

        let driver = Driver::new(
            self.handler,
            opener,
            cmd_rx,
            cmd_tx.clone(),
            status_tx,
            DriverConfig {
                heartbeat_period: self.heartbeat_period,
                debounce_window: self.debounce_window,
                keepalive: self.keepalive,
            },
        );
        tokio::spawn(driver.run());

        SerialConnection { cmd_tx, status_rx }
    }
}

/// Handle to a running connection.
///
/// Cheaply cloneable; all clones address the same driver task. When the
/// last clone is dropped the driver closes the link and exits.
#[derive(Clone)]
pub struct SerialConnection {
    cmd_tx: mpsc::Sender<Command>,
    status_rx: watch::Receiver<ConnectionStatus>,
}

impl SerialConnection {
    /// Open the link described by `params`.
    ///
    /// Resolves once the connection is established.
    ///
    /// # Errors
    ///
    /// [`FramelinkError::AlreadyConnecting`] / [`FramelinkError::AlreadyConnected`]
    /// when called from a non-disconnected state; otherwise the underlying
    /// open error, with the state back at disconnected and no retry.
    pub async fn connect(&self, params: ConnectionParameters) -> Result<()> {
        match self.status() {
            ConnectionStatus::Connecting => return Err(FramelinkError::AlreadyConnecting),
            ConnectionStatus::Connected => return Err(FramelinkError::AlreadyConnected),
            ConnectionStatus::Disconnected => {}
        }

        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Connect { params, reply })
            .await
            .map_err(|_| FramelinkError::Closed)?;
        rx.await.map_err(|_| FramelinkError::Closed)?
    }

    /// Close the link. Best-effort, idempotent, safe from any state.
    pub async fn disconnect(&self) {
        let (reply, rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(Command::Disconnect { reply })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }

    /// Disconnect, then connect with the most recently supplied parameters.
    ///
    /// Runs as one queued command, so it cannot interleave with another
    /// in-flight connect or disconnect on this connection.
    pub async fn reconnect(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Reconnect { reply })
            .await
            .map_err(|_| FramelinkError::Closed)?;
        rx.await.map_err(|_| FramelinkError::Closed)?
    }

    /// Frame `payload` and write it to the link.
    ///
    /// Writes are serialized in the driver task: a second call waits for
    /// the first write's flush before its bytes go out, so frames never
    /// interleave on the wire.
    ///
    /// # Errors
    ///
    /// [`FramelinkError::NotConnected`] when no link is open,
    /// [`FramelinkError::InvalidPayloadSize`] past 255 bytes, or the
    /// underlying write error (connection state unchanged).
    pub async fn write(&self, payload: Bytes) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Write { payload, reply })
            .await
            .map_err(|_| FramelinkError::Closed)?;
        rx.await.map_err(|_| FramelinkError::Closed)?
    }

    /// Whether the hardware handle currently reports itself open.
    ///
    /// Pure query; never alters connection state.
    pub async fn ping(&self) -> bool {
        let (reply, rx) = oneshot::channel();
        if self.cmd_tx.send(Command::Ping { reply }).await.is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Snapshot of the current connection status.
    pub fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }
}
