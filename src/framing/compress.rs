//! The compressor interface: a stream-independent byte-in/byte-out
//! compress/decompress pair. Reference implementation uses DEFLATE with
//! a zlib wrapper, matching `protocol.py`'s `zlib.compress`/`zlib.decompress`.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressError {
    #[error("compression failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A stream-independent compressor.
pub trait Compressor: Send + Sync {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressError>;
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressError>;
}

/// DEFLATE with a zlib wrapper, the reference wire's compression.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZlibCompressor;

impl Compressor for ZlibCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressError> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data)?;
        Ok(encoder.finish()?)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressError> {
        let mut decoder = ZlibDecoder::new(data);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    }
}
