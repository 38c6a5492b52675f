//! Sniffing and undoing the compression NBT files usually come with.
//!
//! Level and player files are gzip compressed, region file chunks are
//! normally zlib compressed. [`detect`] looks at the first bytes and
//! [`decoder`] wraps a source in the matching decompressor.
use std::io::{BufRead, BufReader, Read};

use flate2::bufread::{GzDecoder, ZlibDecoder};
use tracing::debug;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zlib,
}

/// Guess the compression from the first bytes of a document.
pub fn detect(head: &[u8]) -> Compression {
    match head {
        [0x1f, 0x8b, ..] => Compression::Gzip,
        [0x78, ..] => Compression::Zlib,
        _ => Compression::None,
    }
}

/// Wrap `reader` so that it yields the decompressed document. Nothing past
/// the first couple of bytes is consumed to decide.
pub fn decoder<'a, R: Read + 'a>(reader: R) -> Result<Box<dyn Read + 'a>> {
    let mut reader = BufReader::new(reader);
    let compression = detect(reader.fill_buf()?);
    debug!(?compression, "Detected compression.");
    Ok(match compression {
        Compression::None => Box::new(reader),
        Compression::Gzip => Box::new(GzDecoder::new(reader)),
        Compression::Zlib => Box::new(ZlibDecoder::new(reader)),
    })
}

/// Decompress `bytes` if they look compressed, borrowing them otherwise.
pub fn decode_bytes(bytes: &[u8]) -> Result<std::borrow::Cow<'_, [u8]>> {
    let compression = detect(bytes);
    debug!(?compression, "Detected compression.");
    let mut out = Vec::new();
    match compression {
        Compression::None => return Ok(std::borrow::Cow::Borrowed(bytes)),
        Compression::Gzip => GzDecoder::new(bytes).read_to_end(&mut out)?,
        Compression::Zlib => ZlibDecoder::new(bytes).read_to_end(&mut out)?,
    };
    Ok(std::borrow::Cow::Owned(out))
}
