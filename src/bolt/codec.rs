//! Chunked message framing.
//!
//! A Bolt message is one PackStream structure split across chunks, each
//! prefixed with a big-endian `u16` length, terminated by a `0x0000`
//! end marker. Zero-length messages (bare end markers) are keep-alive
//! NOOPs and are skipped.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::packstream::{decode, encode, Value};
use super::error::BoltError;

/// Largest chunk payload the u16 length prefix can describe.
pub const MAX_CHUNK_SIZE: usize = u16::MAX as usize;

/// Message end marker.
pub const END_MARKER: [u8; 2] = [0x00, 0x00];

/// Default cap on a reassembled message.
const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Framing codec: encodes one PackStream value per message, reassembles
/// contiguous chunks on decode until the end marker.
#[derive(Debug)]
pub struct ChunkCodec {
    max_message_size: usize,
    assembly: BytesMut,
}

impl ChunkCodec {
    pub fn new() -> Self {
        Self::with_max_message_size(DEFAULT_MAX_MESSAGE_SIZE)
    }

    pub fn with_max_message_size(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            assembly: BytesMut::with_capacity(4096),
        }
    }

    /// Split `payload` into chunks and append the end marker.
    fn write_chunked(payload: &[u8], dst: &mut BytesMut) {
        dst.reserve(payload.len() + 4 + 2 * (payload.len() / MAX_CHUNK_SIZE));
        for chunk in payload.chunks(MAX_CHUNK_SIZE) {
            dst.put_u16(chunk.len() as u16);
            dst.put_slice(chunk);
        }
        dst.put_slice(&END_MARKER);
    }
}

impl Default for ChunkCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ChunkCodec {
    type Item = Value;
    type Error = BoltError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Value>, BoltError> {
        loop {
            if src.len() < 2 {
                return Ok(None);
            }
            let chunk_len = u16::from_be_bytes([src[0], src[1]]) as usize;

            if chunk_len == 0 {
                src.advance(2);
                if self.assembly.is_empty() {
                    // NOOP keep-alive, nothing accumulated.
                    continue;
                }
                let payload = self.assembly.split();
                let value = decode(&payload)?;
                return Ok(Some(value));
            }

            if src.len() < 2 + chunk_len {
                return Ok(None);
            }
            if self.assembly.len() + chunk_len > self.max_message_size {
                return Err(BoltError::MessageTooLarge {
                    size: self.assembly.len() + chunk_len,
                    max: self.max_message_size,
                });
            }
            src.advance(2);
            self.assembly.extend_from_slice(&src[..chunk_len]);
            src.advance(chunk_len);
        }
    }
}

impl Encoder<&Value> for ChunkCodec {
    type Error = BoltError;

    fn encode(&mut self, item: &Value, dst: &mut BytesMut) -> Result<(), BoltError> {
        let payload = encode(item)?;
        Self::write_chunked(&payload, dst);
        Ok(())
    }
}
