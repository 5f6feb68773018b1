//! Protocol module - wire format and receive assembly.
//!
//! This module implements the framing layer of the byte stream:
//! - magic-delimited 4-byte header encoding/decoding
//! - receive assembler for accumulating partial reads

mod assembler;
mod wire_format;

pub use assembler::{FeedResult, ReceiveAssembler, MAX_BUFFER_SIZE};
pub use wire_format::{
    decode_frames, encode_frame, HEADER_SIZE, MAGIC1, MAGIC2, MAX_PAYLOAD_SIZE,
};
