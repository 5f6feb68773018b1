//! # framelink
//!
//! Transport-level connection manager for framed serial devices.
//!
//! This crate turns the unreliable, unstructured byte stream of a serial
//! link into discrete application frames, and manages the lifecycle of the
//! link itself: opening, closing, debounced detection of unexpected loss,
//! and periodic keep-alive heartbeats.
//!
//! ## Architecture
//!
//! - **Framing** ([`protocol`]): a magic-delimited wire format
//!   (`0x94 0xC3`, reserved byte, length byte, payload) plus a bounded
//!   receive assembler that tolerates partial reads and interleaved noise.
//! - **Lifecycle** ([`connection`]): a single driver task owns the link and
//!   funnels every command, read, heartbeat tick, and timer through one
//!   event loop, so no locks guard the connection state and writes can
//!   never interleave.
//! - **Transport** ([`transport`]): the hardware handle behind a small
//!   trait pair, `tokio-serial` in production and in-memory links in tests.
//!
//! What the payloads *mean* is not this crate's business: assembled
//! payloads are handed as opaque bytes to a caller-supplied
//! [`DeviceHandler`], and outgoing payloads arrive the same way.
//!
//! ## Example
//!
//! ```ignore
//! use bytes::Bytes;
//! use framelink::{ConnectionBuilder, ConnectionParameters, ConnectionStatus, DeviceHandler};
//!
//! struct Radio;
//!
//! impl DeviceHandler for Radio {
//!     fn on_status(&mut self, status: ConnectionStatus) {
//!         println!("link: {:?}", status);
//!     }
//!
//!     fn on_payload(&mut self, payload: Bytes) -> Result<(), framelink::PayloadError> {
//!         println!("rx {} bytes", payload.len());
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> framelink::Result<()> {
//!     let connection = ConnectionBuilder::new(Radio)
//!         .keepalive(|| Bytes::from_static(&[0x00]))
//!         .spawn();
//!
//!     connection.connect(ConnectionParameters::new("/dev/ttyUSB0")).await?;
//!     connection.write(Bytes::from_static(&[0x7A, 0x01])).await?;
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod transport;

pub use connection::{
    ConnectionBuilder, ConnectionParameters, ConnectionStatus, SerialConnection,
    DEFAULT_BAUD_RATE, DEFAULT_DEBOUNCE_WINDOW, DEFAULT_HEARTBEAT_PERIOD,
};
pub use error::{FramelinkError, Result};
pub use handler::{DeviceHandler, PayloadError};
