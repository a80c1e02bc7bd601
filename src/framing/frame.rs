//! Length-prefixed, versioned, compressed frame sender/receiver.
//!
//! Mirrors `deluge.protocol.DelugeRPCProtocol`: a 5-byte big-endian
//! `version:u8 ‖ body_length:u32` header precedes each compressed,
//! codec-encoded body. Sending and receiving are pure buffer operations —
//! non-suspending, driven by transport callbacks the caller owns.

use std::sync::Arc;

use bytes::BytesMut;

use super::codec::{ObjectCodec, Value};
use super::compress::Compressor;
use crate::error::{Error, Result};

/// The sole recognized wire version.
pub const PROTOCOL_VERSION: u8 = 1;
/// Header size in bytes: one version byte plus a 4-byte body length.
pub const HEADER_SIZE: usize = 5;

/// Sender/receiver of length-prefixed frames over a byte stream.
///
/// `send` and `receive` are non-suspending; they never touch a transport
/// themselves. Feed inbound bytes to `data_received` and write whatever
/// `send` returns to the transport yourself.
pub struct Framer {
    codec: Arc<dyn ObjectCodec>,
    compressor: Arc<dyn Compressor>,
    buf: BytesMut,
    bytes_sent: u64,
    bytes_received: u64,
}

impl Framer {
    pub fn new(codec: Arc<dyn ObjectCodec>, compressor: Arc<dyn Compressor>) -> Self {
        Self {
            codec,
            compressor,
            buf: BytesMut::new(),
            bytes_sent: 0,
            bytes_received: 0,
        }
    }

    /// Serialize, compress, and frame `value`, returning the bytes to
    /// write to the transport.
    pub fn send(&mut self, value: &Value) -> Result<Vec<u8>> {
        let encoded = self.codec.encode(value);
        let compressed = self.compressor.compress(&encoded)?;
        let body_len = compressed.len() as u32;

        let mut message = Vec::with_capacity(HEADER_SIZE + compressed.len());
        message.push(PROTOCOL_VERSION);
        message.extend_from_slice(&body_len.to_be_bytes());
        message.extend_from_slice(&compressed);

        self.bytes_sent += message.len() as u64;
        Ok(message)
    }

    /// Feed a chunk of inbound bytes, returning every complete frame's
    /// decoded payload delivered in arrival order, together with the
    /// outcome of the parse. A single call may yield zero or more
    /// messages; partial frames are retained across calls without being
    /// re-copied beyond buffer growth.
    ///
    /// The two halves of the return are independent: a frame that fails
    /// to decompress or decode does not retract messages already decoded
    /// from earlier frames in the same chunk — the reference delivers
    /// each frame to its callback as soon as it is parsed, so one bad
    /// frame later in the buffer must not un-deliver the good ones before
    /// it. Callers that want the old fail-fast behavior can call
    /// `.1?` on the result.
    ///
    /// On a version mismatch the receive buffer is reset to empty and the
    /// mismatch is logged as a warning — it is not propagated as an
    /// error, matching the reference's locally-recovered `InvalidVersion`.
    pub fn data_received(&mut self, data: &[u8]) -> (Vec<Value>, Result<()>) {
        self.buf.extend_from_slice(data);
        self.bytes_received += data.len() as u64;

        let mut messages = Vec::new();
        loop {
            // `>= HEADER_SIZE`, not `>`: the reference implementation's
            // off-by-one (spec.md §9) is fixed here.
            if self.buf.len() < HEADER_SIZE {
                break;
            }

            let version = self.buf[0];
            if version != PROTOCOL_VERSION {
                tracing::warn!(
                    received = version,
                    expected = PROTOCOL_VERSION,
                    "invalid protocol version; resetting receive buffer"
                );
                self.buf.clear();
                break;
            }

            let body_len =
                u32::from_be_bytes([self.buf[1], self.buf[2], self.buf[3], self.buf[4]]) as usize;
            if self.buf.len() - HEADER_SIZE < body_len {
                // Frame incomplete; wait for more data.
                break;
            }

            let frame = self.buf.split_to(HEADER_SIZE + body_len);
            let body = &frame[HEADER_SIZE..];
            let decompressed = match self.compressor.decompress(body) {
                Ok(d) => d,
                Err(e) => return (messages, Err(e.into())),
            };
            let value = match self.codec.decode(&decompressed) {
                Ok(v) => v,
                Err(e) => return (messages, Err(e.into())),
            };
            messages.push(value);
        }
        (messages, Ok(()))
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }
}

/// Validate a 5-byte header in isolation, for callers that want to peek
/// without mutating a Framer's buffer.
pub fn parse_header(header: &[u8; HEADER_SIZE]) -> Result<(u8, u32)> {
    let version = header[0];
    if version != PROTOCOL_VERSION {
        return Err(Error::InvalidVersion {
            received: version,
            expected: PROTOCOL_VERSION,
        });
    }
    let body_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
    Ok((version, body_len))
}
