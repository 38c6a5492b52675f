//! Pull-based access to NBT without prior knowledge of the structure.
//!
//! A reader is driven one [`Token`] per call to [`NbtRead::read`]. For the
//! document `{"a": 1b, "b": [1, 2]}` (with an empty root name) the binary
//! reader produces:
//!
//! ```text
//! Name StartCompound Name Byte Name StartList Int Int EndArray EndCompound None
//! ```
//!
//! Strings and names are not decoded until asked for with
//! [`NbtRead::get_str`], and [`NbtRead::skip`] discards them unread.
//!
//! Writers take the same tokens as calls. Both traits are object safe so that
//! converters can work over any encoding.
//!
//! # Example
//!
//! Find the `DataVersion` of a level without building the whole document.
//!
//! ```
//! use elysianbt::{stream::find_entry, BinaryOptions, BinaryReader, NbtRead, Token};
//!
//! # let bytes = elysianbt::ser::to_bytes(&elysianbt::Value::Compound(
//! #     [("DataVersion".to_owned(), elysianbt::Value::Int(3465))].into_iter().collect()
//! # )).unwrap();
//! let mut reader = BinaryReader::new(bytes.as_slice(), BinaryOptions::java());
//! reader.read()?; // root name
//! reader.read()?; // root compound
//!
//! if find_entry(&mut reader, "DataVersion")? {
//!     assert_eq!(reader.read()?, Token::Int);
//!     assert_eq!(reader.get_i32(true)?, 3465);
//! }
//! # Ok::<(), elysianbt::error::Error>(())
//! ```
use std::fmt;

use crate::{
    error::{Error, Result},
    options::NbtOptions,
    Tag, Token,
};

mod reader;
mod writer;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    ReadingName,
    ReadingPayload,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    WritingName,
    WritingPayload,
    Stopped,
}

/// The scalar a reader is positioned on, if any.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Payload {
    #[default]
    None,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl Payload {
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Payload::Byte(v) => Some(v as i64),
            Payload::Short(v) => Some(v as i64),
            Payload::Int(v) => Some(v as i64),
            Payload::Long(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(self) -> Option<f64> {
        match self {
            Payload::Float(v) => Some(v as f64),
            Payload::Double(v) => Some(v),
            other => other.as_i64().map(|v| v as f64),
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::None => Ok(()),
            Payload::Byte(v) => write!(f, "{}", v),
            Payload::Short(v) => write!(f, "{}", v),
            Payload::Int(v) => write!(f, "{}", v),
            Payload::Long(v) => write!(f, "{}", v),
            Payload::Float(v) => write!(f, "{}", v),
            Payload::Double(v) => write!(f, "{}", v),
        }
    }
}

fn integer(token: Token, payload: Payload, exact: Tag, strict: bool) -> Result<i64> {
    let found = token.tag();
    if strict && found != Some(exact) {
        return Err(Error::unexpected_tag(format!("{:?}", exact), found));
    }
    match (found, payload.as_i64()) {
        (Some(tag), Some(v)) if tag.widens_to(exact) => Ok(v),
        _ => Err(Error::unexpected_tag(format!("{:?} or a narrower integer", exact), found)),
    }
}

/// As `integer`, for a getter of the unsigned type of `exact`'s width. The
/// exact tag is reinterpreted bit for bit; a narrower tag must not be
/// negative.
fn unsigned(token: Token, payload: Payload, exact: Tag, strict: bool) -> Result<i64> {
    let v = integer(token, payload, exact, strict)?;
    if v < 0 && token.tag() != Some(exact) {
        return Err(Error::type_mismatch(format!(
            "{} does not fit an unsigned {:?}",
            v, exact
        )));
    }
    Ok(v)
}

fn float(token: Token, payload: Payload, exact: Tag, strict: bool) -> Result<f64> {
    let found = token.tag();
    if strict && found != Some(exact) {
        return Err(Error::unexpected_tag(format!("{:?}", exact), found));
    }
    match (found, payload.as_f64()) {
        (Some(tag), Some(v)) if tag.widens_to(exact) => Ok(v),
        _ => Err(Error::unexpected_tag(format!("a number that fits {:?}", exact), found)),
    }
}

/// A pull parser over some encoding of NBT.
///
/// The numeric getters read the scalar the reader is positioned on. With
/// `strict` they demand the exact tag; otherwise they also take any tag
/// that widens to it without loss, so a `Short` reads as an `i32` but a
/// `Long` does not. The unsigned getters reinterpret their own tag, so
/// `get_u8` on a byte of -1 gives 255.
pub trait NbtRead {
    fn options(&self) -> &NbtOptions;

    /// The token produced by the last call to `read`.
    fn token(&self) -> Token;

    fn state(&self) -> ReaderState;

    /// Number of open containers.
    fn depth(&self) -> usize;

    /// Declared length of the string, name, list or array just read, if the
    /// encoding carries one.
    fn content_len(&self) -> Option<usize>;

    /// Offset into the source, in bytes.
    fn position(&self) -> u64;

    fn payload(&self) -> Payload;

    /// Advance to the next token. Returns `Token::None` once the document is
    /// complete.
    fn read(&mut self) -> Result<Token>;

    /// Decode the current name or string. On a numeric token this gives its
    /// decimal text.
    fn get_str(&mut self) -> Result<&str>;

    /// Discard the unread bytes of the current name or string.
    fn skip(&mut self) -> Result<()>;

    fn get_string(&mut self) -> Result<String> {
        self.get_str().map(str::to_owned)
    }

    fn get_bool(&self, strict: bool) -> Result<bool> {
        integer(self.token(), self.payload(), Tag::Byte, strict).map(|v| v != 0)
    }

    fn get_i8(&self, strict: bool) -> Result<i8> {
        integer(self.token(), self.payload(), Tag::Byte, strict).map(|v| v as i8)
    }

    fn get_u8(&self, strict: bool) -> Result<u8> {
        unsigned(self.token(), self.payload(), Tag::Byte, strict).map(|v| v as u8)
    }

    fn get_i16(&self, strict: bool) -> Result<i16> {
        integer(self.token(), self.payload(), Tag::Short, strict).map(|v| v as i16)
    }

    fn get_u16(&self, strict: bool) -> Result<u16> {
        unsigned(self.token(), self.payload(), Tag::Short, strict).map(|v| v as u16)
    }

    fn get_i32(&self, strict: bool) -> Result<i32> {
        integer(self.token(), self.payload(), Tag::Int, strict).map(|v| v as i32)
    }

    fn get_u32(&self, strict: bool) -> Result<u32> {
        unsigned(self.token(), self.payload(), Tag::Int, strict).map(|v| v as u32)
    }

    fn get_i64(&self, strict: bool) -> Result<i64> {
        integer(self.token(), self.payload(), Tag::Long, strict)
    }

    fn get_u64(&self, strict: bool) -> Result<u64> {
        unsigned(self.token(), self.payload(), Tag::Long, strict).map(|v| v as u64)
    }

    fn get_f32(&self, strict: bool) -> Result<f32> {
        float(self.token(), self.payload(), Tag::Float, strict).map(|v| v as f32)
    }

    fn get_f64(&self, strict: bool) -> Result<f64> {
        float(self.token(), self.payload(), Tag::Double, strict)
    }
}

/// An emitter for some encoding of NBT, fed one token per call.
///
/// Inside a compound every value is preceded by `write_name`. Inside lists
/// and arrays values are written bare.
pub trait NbtWrite {
    fn options(&self) -> &NbtOptions;

    fn state(&self) -> WriterState;

    fn depth(&self) -> usize;

    /// Bytes written so far.
    fn position(&self) -> u64;

    /// Whether the innermost open container is a list or array.
    fn is_in_array(&self) -> bool;

    /// Whether lists and arrays must be given their length when opened.
    fn requires_length_info(&self) -> bool;

    /// Write an entry name. `tag` is the tag of the value that follows, or
    /// `None` if it is not known yet.
    fn write_name(&mut self, name: &str, tag: Option<Tag>) -> Result<()>;

    fn write_start_compound(&mut self) -> Result<()>;

    fn write_end_compound(&mut self) -> Result<()>;

    /// Open a list. `element` and `len` may be left out when not known yet.
    fn write_start_list(&mut self, element: Option<Tag>, len: Option<usize>) -> Result<()>;

    /// Open one of the typed arrays: `ByteArray`, `IntArray` or `LongArray`.
    fn write_start_array(&mut self, kind: Tag, len: Option<usize>) -> Result<()>;

    /// Close the innermost list or array.
    fn write_end_array(&mut self) -> Result<()>;

    fn write_bool(&mut self, v: bool) -> Result<()>;
    fn write_i8(&mut self, v: i8) -> Result<()>;
    fn write_i16(&mut self, v: i16) -> Result<()>;
    fn write_i32(&mut self, v: i32) -> Result<()>;
    fn write_i64(&mut self, v: i64) -> Result<()>;
    fn write_f32(&mut self, v: f32) -> Result<()>;
    fn write_f64(&mut self, v: f64) -> Result<()>;
    fn write_str(&mut self, v: &str) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    fn write_u8(&mut self, v: u8) -> Result<()> {
        self.write_i8(v as i8)
    }

    fn write_u16(&mut self, v: u16) -> Result<()> {
        self.write_i16(v as i16)
    }

    fn write_u32(&mut self, v: u32) -> Result<()> {
        self.write_i32(v as i32)
    }

    fn write_u64(&mut self, v: u64) -> Result<()> {
        self.write_i64(v as i64)
    }

    fn write_start_byte_array(&mut self, len: Option<usize>) -> Result<()> {
        self.write_start_array(Tag::ByteArray, len)
    }

    fn write_start_int_array(&mut self, len: Option<usize>) -> Result<()> {
        self.write_start_array(Tag::IntArray, len)
    }

    fn write_start_long_array(&mut self, len: Option<usize>) -> Result<()> {
        self.write_start_array(Tag::LongArray, len)
    }

    fn write_byte_array(&mut self, values: &[i8]) -> Result<()> {
        self.write_start_byte_array(Some(values.len()))?;
        for v in values {
            self.write_i8(*v)?;
        }
        self.write_end_array()
    }

    fn write_int_array(&mut self, values: &[i32]) -> Result<()> {
        self.write_start_int_array(Some(values.len()))?;
        for v in values {
            self.write_i32(*v)?;
        }
        self.write_end_array()
    }

    fn write_long_array(&mut self, values: &[i64]) -> Result<()> {
        self.write_start_long_array(Some(values.len()))?;
        for v in values {
            self.write_i64(*v)?;
        }
        self.write_end_array()
    }
}

/// Consume the rest of the value whose opening token was just read. Nested
/// containers are skipped as a whole.
pub fn skip_value(reader: &mut (impl NbtRead + ?Sized)) -> Result<()> {
    let mut depth = 0usize;
    let mut token = reader.token();
    loop {
        match token {
            Token::StartCompound
            | Token::StartList
            | Token::StartByteArray
            | Token::StartIntArray
            | Token::StartLongArray => depth += 1,
            Token::EndCompound | Token::EndArray => depth = depth.saturating_sub(1),
            Token::Name | Token::String => reader.skip()?,
            Token::None => return Err(Error::truncated(reader.position())),
            _ => {}
        }
        if depth == 0 && token != Token::Name {
            return Ok(());
        }
        token = reader.read()?;
    }
}

/// Parse the input until the compound we are currently inside is complete.
/// Handles inner compounds and lists by skipping those as well.
pub fn skip_compound(reader: &mut (impl NbtRead + ?Sized)) -> Result<()> {
    loop {
        match reader.read()? {
            Token::EndCompound => return Ok(()),
            Token::Name => reader.skip()?,
            Token::None => return Err(Error::truncated(reader.position())),
            _ => skip_value(reader)?,
        }
    }
}

/// Advance within the current compound until the entry called `name`. On
/// success the reader is positioned on that entry's name, ready to read its
/// value. If the compound ends first, it is consumed and `false` returned.
pub fn find_entry(reader: &mut (impl NbtRead + ?Sized), name: &str) -> Result<bool> {
    loop {
        match reader.read()? {
            Token::EndCompound => return Ok(false),
            Token::Name => {
                if reader.get_str()? == name {
                    return Ok(true);
                }
            }
            Token::None => return Err(Error::truncated(reader.position())),
            _ => skip_value(reader)?,
        }
    }
}
