//! Response body compression
//!
//! Wraps a byte sink in the compressor matching a negotiated encoding.
//! `finish` must run exactly once; it consumes the encoder, flushes the
//! compressor and returns the compressed bytes.

use crate::negotiate::Encoding;
use async_compression::tokio::write::{BrotliEncoder, DeflateEncoder, GzipEncoder};
use atrium_core::error::{Error, Result};
use tokio::io::AsyncWriteExt;

/// A compressing byte sink for one of the supported encodings
pub enum BodyEncoder {
    Brotli(BrotliEncoder<Vec<u8>>),
    Gzip(GzipEncoder<Vec<u8>>),
    Deflate(DeflateEncoder<Vec<u8>>),
}

impl BodyEncoder {
    /// Create an encoder for the given encoding. Identity has no
    /// compressor and callers must not wrap it.
    pub fn new(encoding: Encoding) -> Result<Self> {
        match encoding {
            Encoding::Brotli => Ok(Self::Brotli(BrotliEncoder::new(Vec::new()))),
            Encoding::Gzip => Ok(Self::Gzip(GzipEncoder::new(Vec::new()))),
            Encoding::Deflate => Ok(Self::Deflate(DeflateEncoder::new(Vec::new()))),
            Encoding::Identity => Err(Error::UnsupportedEncoding(encoding.token().to_string())),
        }
    }

    /// Write bytes through the compressor
    pub async fn write(&mut self, buf: &[u8]) -> std::io::Result<()> {
        match self {
            Self::Brotli(encoder) => encoder.write_all(buf).await,
            Self::Gzip(encoder) => encoder.write_all(buf).await,
            Self::Deflate(encoder) => encoder.write_all(buf).await,
        }
    }

    /// Flush and close the compressor, returning the compressed bytes
    pub async fn finish(self) -> std::io::Result<Vec<u8>> {
        match self {
            Self::Brotli(mut encoder) => {
                encoder.shutdown().await?;
                Ok(encoder.into_inner())
            }
            Self::Gzip(mut encoder) => {
                encoder.shutdown().await?;
                Ok(encoder.into_inner())
            }
            Self::Deflate(mut encoder) => {
                encoder.shutdown().await?;
                Ok(encoder.into_inner())
            }
        }
    }
}

/// Compress a full buffer with the given encoding
pub async fn encode(encoding: Encoding, input: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = BodyEncoder::new(encoding)?;
    encoder.write(input).await?;
    Ok(encoder.finish().await?)
}
