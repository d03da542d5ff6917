//! Streaming codecs wrapping archive readers and writers.

use crate::types::CompressionType;
use dialcache_core::{Error, Result};
use std::io::{self, Read, Write};

/// Zstd level used for new archives.
pub const ZSTD_LEVEL: i32 = 3;

/// Compressing writer for one of the supported algorithms.
///
/// `finish` must be called to flush trailing frames; dropping the encoder
/// may leave a truncated stream.
pub enum Encoder<W: Write> {
    None(W),
    Zstd(zstd::stream::write::Encoder<'static, W>),
    Gzip(flate2::write::GzEncoder<W>),
    Lz4(lz4_flex::frame::FrameEncoder<W>),
}

impl<W: Write> Encoder<W> {
    pub fn new(writer: W, algorithm: CompressionType) -> Result<Self> {
        Ok(match algorithm {
            CompressionType::None => Encoder::None(writer),
            CompressionType::Zstd => Encoder::Zstd(
                zstd::stream::write::Encoder::new(writer, ZSTD_LEVEL)
                    .map_err(|e| Error::Compression(format!("Zstd init failed: {}", e)))?,
            ),
            CompressionType::Gzip => Encoder::Gzip(flate2::write::GzEncoder::new(
                writer,
                flate2::Compression::default(),
            )),
            CompressionType::Lz4 => Encoder::Lz4(lz4_flex::frame::FrameEncoder::new(writer)),
        })
    }

    /// Flush the codec and hand back the inner writer.
    pub fn finish(self) -> Result<W> {
        match self {
            Encoder::None(mut w) => {
                w.flush()?;
                Ok(w)
            }
            Encoder::Zstd(e) => e
                .finish()
                .map_err(|e| Error::Compression(format!("Zstd finish failed: {}", e))),
            Encoder::Gzip(e) => e
                .finish()
                .map_err(|e| Error::Compression(format!("Gzip finish failed: {}", e))),
            Encoder::Lz4(e) => e
                .finish()
                .map_err(|e| Error::Compression(format!("LZ4 finish failed: {}", e))),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Encoder::None(w) => w.write(buf),
            Encoder::Zstd(e) => e.write(buf),
            Encoder::Gzip(e) => e.write(buf),
            Encoder::Lz4(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Encoder::None(w) => w.flush(),
            Encoder::Zstd(e) => e.flush(),
            Encoder::Gzip(e) => e.flush(),
            Encoder::Lz4(e) => e.flush(),
        }
    }
}

/// Wrap a reader with the decoder for `algorithm`.
pub fn decoder<'a, R: Read + 'a>(
    reader: R,
    algorithm: CompressionType,
) -> Result<Box<dyn Read + 'a>> {
    Ok(match algorithm {
        CompressionType::None => Box::new(reader),
        CompressionType::Zstd => Box::new(
            zstd::stream::read::Decoder::new(reader)
                .map_err(|e| Error::Compression(format!("Zstd decompression failed: {}", e)))?,
        ),
        CompressionType::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
        CompressionType::Lz4 => Box::new(lz4_flex::frame::FrameDecoder::new(reader)),
    })
}
