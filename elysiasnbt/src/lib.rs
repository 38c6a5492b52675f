//! elysiasnbt reads and writes SNBT, the stringified form of NBT that
//! *Minecraft* uses in commands and data packs:
//!
//! ```text
//! {id: "minecraft:chest", Items: [{Slot: 0b, Count: 64b}], Pos: [I; 0, 64, -300]}
//! ```
//!
//! The reader and writer implement the tag-stream traits from `elysianbt`,
//! so every converter works over text exactly as it does over binary, and a
//! value read from one form can be written to the other.
//!
//! ```
//! use elysiasnbt::{from_str, to_string};
//! use elysianbt::Value;
//!
//! let value: Value = from_str("{name: 'Steve', health: 20.0f, pos: [L; 1L, -2L]}")?;
//! assert_eq!(value.get("name").and_then(Value::as_str), Some("Steve"));
//!
//! let text = to_string(&value.get("pos").cloned().unwrap_or(Value::Int(0)))?;
//! assert_eq!(text, "[L;1L,-2L]");
//! # Ok::<(), elysianbt::error::Error>(())
//! ```
//!
//! Bare words are typed by their suffix: `1b` byte, `1s` short, `1` int,
//! `1L` long, `1.0f` float, `1.0` or `1.0d` double. `true` and `false` are
//! bytes. Anything else bare is a string.
use std::io::{Read, Write};

use elysianbt::{
    convert::{Context, NbtType},
    de::deserialize,
    ser::serialize,
};

pub mod options;
mod parser;
mod reader;
mod writer;

pub use elysianbt::error::{Error, ErrorKind, Result};
pub use options::{QuotePolicy, StringOptions};
pub use reader::SnbtReader;
pub use writer::SnbtWriter;

#[cfg(test)]
mod test;

/// Serialize a value to compact SNBT.
pub fn to_string<T: NbtType>(value: &T) -> Result<String> {
    to_string_with(value, &StringOptions::minimal(), Context::global())
}

pub fn to_string_with<T: NbtType>(value: &T, options: &StringOptions, ctx: &Context) -> Result<String> {
    let mut out = Vec::new();
    to_writer(&mut out, value, options, ctx)?;
    String::from_utf8(out).map_err(|e| Error::new(ErrorKind::Io, e.to_string()))
}

pub fn to_writer<W, T>(writer: W, value: &T, options: &StringOptions, ctx: &Context) -> Result<()>
where
    W: Write,
    T: NbtType,
{
    let mut writer = SnbtWriter::new(writer, options.clone());
    serialize(&mut writer, value, ctx)
}

/// Deserialize a value from SNBT. Only whitespace may follow the value.
pub fn from_str<T: NbtType>(input: &str) -> Result<T> {
    from_str_with(input, &StringOptions::default(), Context::global())
}

pub fn from_str_with<T: NbtType>(input: &str, options: &StringOptions, ctx: &Context) -> Result<T> {
    let mut reader = SnbtReader::new(input, options.clone());
    let value = deserialize(&mut reader, ctx)?;
    reader.finish()?;
    Ok(value)
}

/// Deserialize from a reader of UTF-8 text.
pub fn from_reader<R: Read, T: NbtType>(mut reader: R, options: &StringOptions, ctx: &Context) -> Result<T> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let input = String::from_utf8(bytes).map_err(|e| {
        let at = e.utf8_error().valid_up_to() as u64;
        Error::format("input is not valid UTF-8", at)
    })?;
    from_str_with(&input, options, ctx)
}
