//! Writing values as binary NBT.
//!
//! The root value is written with an empty name when the options call for a
//! root name. Any type with a converter can be the root, though files written
//! by the game always have a compound there.
//!
//! ```
//! use elysianbt::{ser::to_bytes_with, BinaryOptions, Context};
//! use std::collections::BTreeMap;
//!
//! let mut level = BTreeMap::new();
//! level.insert("seed".to_owned(), -7i64);
//!
//! let bytes = to_bytes_with(&level, &BinaryOptions::bedrock_network(), Context::global())?;
//! assert_eq!(bytes, [0x0a, 0x04, 0x04, b's', b'e', b'e', b'd', 0x0d, 0x00]);
//! # Ok::<(), elysianbt::error::Error>(())
//! ```
use std::io::{Cursor, Seek, Write};

use crate::{
    convert::{Context, NbtType},
    error::Result,
    BinaryOptions, BinaryWriter, NbtWrite,
};

/// Serialize a value to Java edition bytes, uncompressed.
pub fn to_bytes<T: NbtType>(value: &T) -> Result<Vec<u8>> {
    to_bytes_with(value, &BinaryOptions::java(), Context::global())
}

pub fn to_bytes_with<T: NbtType>(value: &T, options: &BinaryOptions, ctx: &Context) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    to_writer(&mut out, value, options, ctx)?;
    Ok(out.into_inner())
}

/// Serialize to a seekable sink, such as a file.
pub fn to_writer<W, T>(writer: W, value: &T, options: &BinaryOptions, ctx: &Context) -> Result<()>
where
    W: Write + Seek,
    T: NbtType,
{
    let mut writer = BinaryWriter::new(writer, *options)?;
    serialize(&mut writer, value, ctx)
}

/// Serialize to a sink that cannot seek, such as a socket or an encoder.
/// Every built-in converter knows its tags and lengths up front, so this only
/// fails for custom converters that leave them open.
pub fn to_forward_writer<W, T>(writer: W, value: &T, options: &BinaryOptions, ctx: &Context) -> Result<()>
where
    W: Write,
    T: NbtType,
{
    let mut writer = BinaryWriter::forward_only(writer, *options)?;
    serialize(&mut writer, value, ctx)
}

/// Write `value` as a complete document to any tag-stream writer.
pub fn serialize<T: NbtType>(writer: &mut dyn NbtWrite, value: &T, ctx: &Context) -> Result<()> {
    let converter = ctx.write_converter_for::<T>()?;
    if writer.options().has_root_name {
        let tag = converter.value_tag(value, ctx)?;
        writer.write_name("", Some(tag))?;
    }
    converter.write(writer, value, ctx)?;
    writer.flush()
}
