//! zlib (DEFLATE) compression of encoded objects.
//!
//! Object files on disk hold `compress(encode(object))` exactly, which is
//! what git writes, so any zlib implementation can read them back.

use std::io::{self, Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

/// The compressed stream could not be inflated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("corrupt compressed stream: {0}")]
pub struct CorruptionError(pub String);

/// zlib compressor with a fixed level.
#[derive(Clone, Copy, Debug)]
pub struct Compressor {
    level: Compression,
}

impl Compressor {
    /// Default zlib level, matching git's `core.compression` default.
    pub const DEFAULT_LEVEL: u32 = 6;

    /// Create a compressor. Levels above 9 are clamped to 9.
    pub fn new(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }

    pub fn level(&self) -> u32 {
        self.level.level()
    }

    /// Compress `data` into a fresh buffer.
    ///
    /// Writing into memory only fails if the allocator does, but the error
    /// is still propagated rather than unwrapped.
    pub fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2 + 16), self.level);
        encoder.write_all(data)?;
        encoder.finish()
    }

    /// Inflate a zlib stream produced by [`Compressor::compress`] (or git).
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CorruptionError> {
        let mut out = Vec::with_capacity(data.len() * 2);
        ZlibDecoder::new(data)
            .read_to_end(&mut out)
            .map_err(|e| CorruptionError(e.to_string()))?;
        Ok(out)
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LEVEL)
    }
}

/// Compress with the default level.
pub fn compress(data: &[u8]) -> io::Result<Vec<u8>> {
    Compressor::default().compress(data)
}

/// Decompress a zlib stream.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, CorruptionError> {
    Compressor::default().decompress(data)
}
