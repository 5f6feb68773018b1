//! Transport module - the hardware link abstraction.
//!
//! The connection driver never touches a serial port type directly; it
//! drives a [`Link`] opened by a [`LinkOpener`]. The production pair is
//! [`SerialOpener`] over `tokio-serial`; tests substitute in-memory links.
//!
//! Futures returned by the trait methods are `Send` so a driver generic
//! over any opener can run inside `tokio::spawn`.

mod serial;

pub use serial::SerialOpener;

use std::future::Future;
use std::io;

use crate::connection::ConnectionParameters;
use crate::error::Result;

/// An open bidirectional byte link to the device.
pub trait Link: Send + 'static {
    /// Read a chunk of bytes into `buf`, returning the number read.
    ///
    /// A return of `Ok(0)` means the peer closed the link.
    fn read_chunk(&mut self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;

    /// Write all of `data` to the link.
    fn write_all(&mut self, data: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    /// Flush buffered output to the device.
    fn flush(&mut self) -> impl Future<Output = io::Result<()>> + Send;

    /// Close the link. Best-effort: errors are swallowed.
    fn close(&mut self) -> impl Future<Output = ()> + Send;

    /// Whether the underlying handle still reports itself open.
    ///
    /// Used as the liveness re-check after a debounced loss signal, and by
    /// `ping()`. Must not alter link state.
    fn is_open(&self) -> bool;
}

/// Factory that opens a [`Link`] from connection parameters.
pub trait LinkOpener: Send + 'static {
    /// The link type this opener produces.
    type Link: Link;

    /// Open a link, surfacing the underlying open error on failure.
    fn open(
        &mut self,
        params: &ConnectionParameters,
    ) -> impl Future<Output = Result<Self::Link>> + Send;
}
