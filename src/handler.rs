//! Device handler - the capability interface to the protocol layer.
//!
//! The connection does not know what payloads mean; it hands every
//! assembled payload, and every status change, to a caller-supplied
//! [`DeviceHandler`]. The connection is composed into the device driver,
//! not derived from it: the handler is the only channel upward.
//!
//! Handler errors are contained at this boundary. A failing
//! [`on_payload`](DeviceHandler::on_payload) is logged and the connection
//! keeps running; a broken protocol layer must not take the link down.

use bytes::Bytes;

use crate::connection::ConnectionStatus;

/// Error type a handler may raise while processing a payload.
pub type PayloadError = Box<dyn std::error::Error + Send + Sync>;

/// Callbacks invoked by the connection driver.
///
/// Both methods are called from the single driver task, in event order:
/// one `on_status` per public status transition, one `on_payload` per frame
/// in the order frames were assembled from the byte stream.
pub trait DeviceHandler: Send + 'static {
    /// The connection status changed.
    fn on_status(&mut self, status: ConnectionStatus);

    /// A complete frame payload arrived.
    ///
    /// Returning an error does not affect the connection; it is logged at
    /// the delivery boundary.
    fn on_payload(&mut self, payload: Bytes) -> Result<(), PayloadError>;
}
