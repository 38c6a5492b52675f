//! Reading values from binary NBT.
//!
//! [`from_bytes`] and [`from_reader`] undo gzip or zlib compression when the
//! input starts with the matching magic bytes; [`from_bytes_with`] and
//! [`from_raw_reader`] take the bytes as they are.
//!
//! Any type with a converter can be the target, including [`Value`] when the
//! structure is not known:
//!
//! ```
//! use elysianbt::{de::from_bytes, Value};
//!
//! let bytes = [
//!     0x0a, 0x00, 0x00, // root compound, no name
//!     0x08, 0x00, 0x02, b'i', b'd', // string "id"
//!     0x00, 0x04, b'd', b'i', b'r', b't', //
//!     0x00,
//! ];
//! let value: Value = from_bytes(&bytes)?;
//! assert_eq!(value.get("id").and_then(Value::as_str), Some("dirt"));
//! # Ok::<(), elysianbt::error::Error>(())
//! ```
//!
//! [`Value`]: crate::Value
use std::io::Read;

use crate::{
    compress,
    convert::{unbox, Context, NbtType},
    error::{Error, Result},
    BinaryOptions, BinaryReader, NbtRead, Token,
};

/// Deserialize Java edition bytes, compressed or not.
pub fn from_bytes<T: NbtType>(bytes: &[u8]) -> Result<T> {
    let bytes = compress::decode_bytes(bytes)?;
    from_bytes_with(&bytes, &BinaryOptions::java(), Context::global())
}

/// Deserialize uncompressed bytes in the variant `options` describes.
pub fn from_bytes_with<T: NbtType>(bytes: &[u8], options: &BinaryOptions, ctx: &Context) -> Result<T> {
    let mut reader = BinaryReader::new(bytes, *options);
    deserialize(&mut reader, ctx)
}

/// Deserialize from a reader, undoing compression if the data looks
/// compressed.
pub fn from_reader<R: Read, T: NbtType>(reader: R, options: &BinaryOptions, ctx: &Context) -> Result<T> {
    from_raw_reader(compress::decoder(reader)?, options, ctx)
}

/// Deserialize from a reader of uncompressed data.
pub fn from_raw_reader<R: Read, T: NbtType>(reader: R, options: &BinaryOptions, ctx: &Context) -> Result<T> {
    let mut reader = BinaryReader::new(reader, *options);
    deserialize(&mut reader, ctx)
}

/// Read one complete document from any tag-stream reader. The root name, if
/// any, is discarded.
pub fn deserialize<T: NbtType>(reader: &mut dyn NbtRead, ctx: &Context) -> Result<T> {
    let converter = ctx.read_converter_for::<T>()?;
    if reader.options().has_root_name {
        match reader.read()? {
            Token::Name => reader.skip()?,
            Token::None => return Err(Error::truncated(reader.position())),
            token => {
                return Err(Error::format(
                    format!("expected the root name, found {:?}", token),
                    reader.position(),
                ))
            }
        }
    }
    unbox(converter.read(reader, ctx)?)
}
