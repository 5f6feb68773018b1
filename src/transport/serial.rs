//! Serial port implementation of the link abstraction.
//!
//! Wraps `tokio_serial::SerialStream`, the async serial transport for
//! tokio. Liveness probing uses `SerialPort::bytes_to_read()`: the call is
//! side-effect free but faults once the device has vanished, which is
//! exactly the distinction the disconnect debounce needs.

use std::io;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};

use super::{Link, LinkOpener};
use crate::connection::ConnectionParameters;
use crate::error::Result;

/// Opens native serial ports.
#[derive(Debug, Default)]
pub struct SerialOpener;

impl LinkOpener for SerialOpener {
    type Link = SerialStream;

    async fn open(&mut self, params: &ConnectionParameters) -> Result<SerialStream> {
        let stream =
            tokio_serial::new(params.path.as_str(), params.baud_rate).open_native_async()?;
        Ok(stream)
    }
}

impl Link for SerialStream {
    async fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf).await
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        AsyncWriteExt::write_all(self, data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        AsyncWriteExt::flush(self).await
    }

    async fn close(&mut self) {
        let _ = self.shutdown().await;
    }

    fn is_open(&self) -> bool {
        self.bytes_to_read().is_ok()
    }
}
