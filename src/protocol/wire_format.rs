//! Wire format encoding and decoding.
//!
//! Implements the 4-byte magic-delimited header format:
//! ```text
//! ┌───────┬───────┬──────────┬────────┬────────────┐
//! │ Magic │ Magic │ Reserved │ Length │ Payload    │
//! │ 0x94  │ 0xC3  │ 1 byte   │ 1 byte │ 0-255 B    │
//! └───────┴───────┴──────────┴────────┴────────────┘
//! ```
//!
//! Encoding always writes the reserved byte as zero, which caps outgoing
//! payloads at 255 bytes. Decoding reconstructs a 16-bit length as
//! `(reserved << 8) | length`, so a peer that sets the reserved byte could
//! in principle announce up to 65535 bytes. The asymmetry is preserved on
//! purpose: peer behavior is unspecified, and widening the encode side
//! would produce frames existing firmware rejects.

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{FramelinkError, Result};

/// First magic byte marking the start of a frame.
pub const MAGIC1: u8 = 0x94;

/// Second magic byte marking the start of a frame.
pub const MAGIC2: u8 = 0xC3;

/// Header size in bytes (magic pair + reserved + length).
pub const HEADER_SIZE: usize = 4;

/// Maximum payload size the single length byte can express on encode.
pub const MAX_PAYLOAD_SIZE: usize = 255;

/// Encode a payload into a complete frame.
///
/// # Errors
///
/// Returns [`FramelinkError::InvalidPayloadSize`] if the payload does not
/// fit the single length byte. The payload is never truncated.
///
/// # Example
///
/// ```
/// use framelink::protocol::encode_frame;
///
/// let frame = encode_frame(&[0x7A, 0x01]).unwrap();
/// assert_eq!(frame, [0x94, 0xC3, 0x00, 0x02, 0x7A, 0x01]);
/// ```
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(FramelinkError::InvalidPayloadSize(payload.len()));
    }

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.push(MAGIC1);
    buf.push(MAGIC2);
    buf.push(0x00);
    buf.push(payload.len() as u8);
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Extract every complete frame payload from the front of `buf`.
///
/// Scans left to right for the magic pair, applying the alignment policy:
///
/// - No magic pair in a buffer of two or more bytes: everything but the
///   last byte is discarded (it may be the first half of a future magic
///   pair) and scanning stops.
/// - Magic pair found past the start: the leading noise is discarded.
/// - Fewer than [`HEADER_SIZE`] bytes after alignment, or fewer payload
///   bytes than the header announces: scanning stops and the partial frame
///   stays in `buf` for the next call.
///
/// The loop is restartable: calling this repeatedly as bytes accumulate
/// yields the same frame sequence as one call over the full buffer.
///
/// # Example
///
/// ```
/// use bytes::BytesMut;
/// use framelink::protocol::decode_frames;
///
/// let mut buf = BytesMut::from(&[0xFF, 0x94, 0xC3, 0x00, 0x01, 0x42][..]);
/// let frames = decode_frames(&mut buf);
/// assert_eq!(frames.len(), 1);
/// assert_eq!(&frames[0][..], &[0x42]);
/// assert!(buf.is_empty());
/// ```
pub fn decode_frames(buf: &mut BytesMut) -> Vec<Bytes> {
    let mut frames = Vec::new();

    loop {
        let Some(start) = find_magic(buf) else {
            // Keep the final byte: it may be MAGIC1 awaiting its pair.
            if buf.len() > 1 {
                let tail = buf.split_off(buf.len() - 1);
                *buf = tail;
            }
            break;
        };

        if start > 0 {
            buf.advance(start);
        }

        if buf.len() < HEADER_SIZE {
            break;
        }

        let length = (usize::from(buf[2]) << 8) | usize::from(buf[3]);
        if buf.len() < HEADER_SIZE + length {
            break;
        }

        buf.advance(HEADER_SIZE);
        frames.push(buf.split_to(length).freeze());
    }

    frames
}

/// Find the offset of the first magic pair, if any.
fn find_magic(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == [MAGIC1, MAGIC2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_known_frame() {
        let frame = encode_frame(&[0x7A, 0x01]).unwrap();
        assert_eq!(frame, vec![0x94, 0xC3, 0x00, 0x02, 0x7A, 0x01]);
    }

    #[test]
    fn test_encode_empty_payload() {
        let frame = encode_frame(&[]).unwrap();
        assert_eq!(frame, vec![0x94, 0xC3, 0x00, 0x00]);
    }

    #[test]
    fn test_encode_max_payload() {
        let payload = vec![0xAB; MAX_PAYLOAD_SIZE];
        let frame = encode_frame(&payload).unwrap();
        assert_eq!(frame.len(), HEADER_SIZE + MAX_PAYLOAD_SIZE);
        assert_eq!(frame[3], 0xFF);
    }

    #[test]
    fn test_encode_oversized_payload_rejected() {
        let payload = vec![0u8; MAX_PAYLOAD_SIZE + 1];
        let result = encode_frame(&payload);
        assert!(matches!(
            result,
            Err(FramelinkError::InvalidPayloadSize(256))
        ));
    }

    #[test]
    fn test_decode_roundtrip_all_lengths() {
        for len in [0usize, 1, 2, 127, 254, 255] {
            let payload: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let mut buf = BytesMut::from(&encode_frame(&payload).unwrap()[..]);

            let frames = decode_frames(&mut buf);

            assert_eq!(frames.len(), 1, "length {}", len);
            assert_eq!(&frames[0][..], &payload[..]);
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_decode_multiple_frames() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&encode_frame(b"first").unwrap());
        buf.extend_from_slice(&encode_frame(b"second").unwrap());
        buf.extend_from_slice(&encode_frame(b"third").unwrap());

        let frames = decode_frames(&mut buf);

        assert_eq!(frames.len(), 3);
        assert_eq!(&frames[0][..], b"first");
        assert_eq!(&frames[1][..], b"second");
        assert_eq!(&frames[2][..], b"third");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_discards_leading_noise() {
        let mut buf = BytesMut::from(&[0x00, 0xFF, 0x42][..]);
        buf.extend_from_slice(&encode_frame(b"ok").unwrap());

        let frames = decode_frames(&mut buf);

        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], b"ok");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_no_magic_keeps_last_byte() {
        let mut buf = BytesMut::from(&[0x01, 0x02, 0x03, 0x94][..]);

        let frames = decode_frames(&mut buf);

        assert!(frames.is_empty());
        // The trailing 0x94 may pair with a 0xC3 in the next chunk.
        assert_eq!(&buf[..], &[0x94]);
    }

    #[test]
    fn test_decode_single_byte_untouched() {
        let mut buf = BytesMut::from(&[0x55][..]);

        let frames = decode_frames(&mut buf);

        assert!(frames.is_empty());
        assert_eq!(&buf[..], &[0x55]);
    }

    #[test]
    fn test_decode_partial_header_waits() {
        let mut buf = BytesMut::from(&[0x94, 0xC3, 0x00][..]);

        let frames = decode_frames(&mut buf);

        assert!(frames.is_empty());
        assert_eq!(buf.len(), 3);

        buf.extend_from_slice(&[0x01, 0x7F]);
        let frames = decode_frames(&mut buf);
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], &[0x7F]);
    }

    #[test]
    fn test_decode_partial_payload_waits() {
        let full = encode_frame(b"hello world").unwrap();
        let mut buf = BytesMut::from(&full[..full.len() - 3]);

        let frames = decode_frames(&mut buf);
        assert!(frames.is_empty());

        buf.extend_from_slice(&full[full.len() - 3..]);
        let frames = decode_frames(&mut buf);
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], b"hello world");
    }

    #[test]
    fn test_decode_magic_split_across_calls() {
        let mut buf = BytesMut::from(&[0xAA, 0xBB, 0x94][..]);
        assert!(decode_frames(&mut buf).is_empty());
        assert_eq!(&buf[..], &[0x94]);

        buf.extend_from_slice(&[0xC3, 0x00, 0x01, 0x09]);
        let frames = decode_frames(&mut buf);
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], &[0x09]);
    }

    #[test]
    fn test_decode_sixteen_bit_length() {
        // A peer that sets the reserved byte announces a 16-bit length.
        let payload = vec![0x5A; 300];
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[MAGIC1, MAGIC2, 0x01, 0x2C]); // 0x012C = 300
        buf.extend_from_slice(&payload);

        let frames = decode_frames(&mut buf);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), 300);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_restartable_matches_single_pass() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&[0xDE, 0xAD]); // noise
        for i in 0..4u8 {
            stream.extend_from_slice(&encode_frame(&[i; 5]).unwrap());
        }

        // Single pass.
        let mut whole = BytesMut::from(&stream[..]);
        let expected = decode_frames(&mut whole);

        // One byte at a time.
        let mut buf = BytesMut::new();
        let mut collected = Vec::new();
        for byte in &stream {
            buf.extend_from_slice(&[*byte]);
            collected.extend(decode_frames(&mut buf));
        }

        assert_eq!(expected.len(), 4);
        assert_eq!(collected, expected);
    }
}
