//! Receive assembler for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for zero-copy buffer management. Incoming chunks
//! are appended and every complete frame is drained out via
//! [`decode_frames`](super::wire_format::decode_frames); trailing partial
//! data stays buffered for the next feed.
//!
//! The retained buffer is bounded: noise or a length header that can never
//! complete would otherwise grow it without limit. Crossing
//! [`MAX_BUFFER_SIZE`] resets the buffer to empty. That loses the buffered
//! bytes, which is deliberate: the stream has no recoverable frame in it,
//! and dropping it lets decoding resume at the next magic pair.

use bytes::{Bytes, BytesMut};

use super::wire_format::decode_frames;

/// Upper bound on retained bytes before the buffer is reset.
pub const MAX_BUFFER_SIZE: usize = 4096;

/// Result of feeding a chunk into the assembler.
#[derive(Debug)]
pub struct FeedResult {
    /// Complete payloads drained from the stream, in arrival order.
    pub payloads: Vec<Bytes>,
    /// True if the retained buffer crossed the cap and was reset.
    pub overflow: bool,
}

/// Buffer that turns arbitrarily-chunked reads into complete payloads.
#[derive(Debug)]
pub struct ReceiveAssembler {
    buffer: BytesMut,
}

impl ReceiveAssembler {
    /// Create an empty assembler.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(MAX_BUFFER_SIZE),
        }
    }

    /// Append a chunk and drain every complete payload.
    ///
    /// Overflow is absorbed here, not raised: the buffer is cleared, a
    /// warning is logged, and `overflow` is set so the caller can surface
    /// a diagnostic.
    pub fn feed(&mut self, data: &[u8]) -> FeedResult {
        self.buffer.extend_from_slice(data);

        let payloads = decode_frames(&mut self.buffer);

        let overflow = self.buffer.len() > MAX_BUFFER_SIZE;
        if overflow {
            tracing::warn!(
                buffered = self.buffer.len(),
                "receive buffer exceeded cap without completing a frame, resetting"
            );
            self.buffer.clear();
        }

        FeedResult { payloads, overflow }
    }

    /// Number of bytes retained from incomplete frames.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Discard all retained bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for ReceiveAssembler {
    fn default() -> Self {
        Self::new()
    }
}
