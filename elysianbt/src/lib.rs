//! elysianbt reads and writes NBT data, the tagged binary format used by
//! *Minecraft* to store world data, player inventories and network payloads.
//!
//! The crate is built in layers:
//!
//! * [`stream`] holds pull-based tag-stream readers and writers. A reader
//!   turns bytes into a flat sequence of [`Token`]s, a writer does the
//!   reverse. Both sit behind the object safe [`NbtRead`] and [`NbtWrite`]
//!   traits so that the text form in the `elysiasnbt` crate plugs into the
//!   same machinery.
//! * [`convert`] maps Rust types onto the token stream. Types describe
//!   themselves through [`NbtType`], and a [`Context`] resolves the best
//!   converter for a type, caching the result.
//! * [`de`] and [`ser`] are the usual entry points.
//!
//! Three binary variants are supported through [`BinaryOptions`]:
//!
//! * Java edition: big-endian, root name, Modified UTF-8 strings.
//! * Bedrock edition: little-endian, root name.
//! * Bedrock network: little-endian with VarInt lengths and no root name.
//!
//! # Quick example
//!
//! ```
//! use elysianbt::{de::from_bytes, ser::to_bytes, Value};
//! use std::collections::HashMap;
//!
//! let mut level: HashMap<String, Value> = HashMap::new();
//! level.insert("byteTest".to_owned(), Value::Byte(5));
//! level.insert("listTest".to_owned(), Value::List(vec![Value::Int(1), Value::Int(2)]));
//!
//! let bytes = to_bytes(&level).unwrap();
//! let back: HashMap<String, Value> = from_bytes(&bytes).unwrap();
//! assert_eq!(level, back);
//! ```
//!
//! # Your own types
//!
//! There is no runtime reflection in Rust, so a struct declares its members
//! once in an [`ObjectTable`]. The reflective converter builds its read and
//! write plans from that table.
//!
//! ```
//! use elysianbt::convert::{Member, NbtType, ObjectTable, TypeDesc};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Slot {
//!     id: String,
//!     count: i8,
//! }
//!
//! impl NbtType for Slot {
//!     fn describe() -> TypeDesc {
//!         TypeDesc::of::<Self>()
//!             .object(
//!                 ObjectTable::new::<Self>()
//!                     .member(Member::field("id", |s: &Self| &s.id, |s| &mut s.id))
//!                     .member(
//!                         Member::field("count", |s: &Self| &s.count, |s| &mut s.count)
//!                             .rename("Count"),
//!                     ),
//!             )
//!             .build()
//!     }
//! }
//!
//! let slot = Slot { id: "minecraft:dirt".to_owned(), count: 64 };
//! let bytes = elysianbt::ser::to_bytes(&slot).unwrap();
//! let back: Slot = elysianbt::de::from_bytes(&bytes).unwrap();
//! assert_eq!(slot, back);
//! ```

use serde::{Deserialize, Serialize};

pub mod compress;
pub mod convert;
pub mod de;
pub mod error;
pub mod options;
pub mod output;
pub mod ser;
pub mod stream;
pub mod varint;

mod input;
mod token;
mod value;

pub use convert::{Context, Member, NbtType, ObjectTable, TypeDesc};
pub use de::from_bytes;
pub use options::{BinaryOptions, NbtOptions, StringEncoding};
pub use ser::to_bytes;
pub use stream::{BinaryReader, BinaryWriter, NbtRead, NbtWrite, Payload};
pub use token::{TagSet, Token};
pub use value::*;

#[cfg(test)]
mod test;

use std::convert::TryFrom;

/// An NBT tag. This does not carry the value or the name of the data.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[repr(u8)]
pub enum Tag {
    /// Represents the end of a Compound object.
    End = 0,
    /// Equivalent to i8.
    Byte = 1,
    /// Equivalent to i16.
    Short = 2,
    /// Equivalent to i32.
    Int = 3,
    /// Equivalent to i64
    Long = 4,
    /// Equivalent to f32.
    Float = 5,
    /// Equivalent to f64.
    Double = 6,
    /// Represents as array of Byte (i8).
    ByteArray = 7,
    /// Represents a Unicode string.
    String = 8,
    /// Represents a list of other objects, every element sharing one tag.
    List = 9,
    /// Represents a struct-like structure.
    Compound = 10,
    /// Represents as array of Int (i32).
    IntArray = 11,
    /// Represents as array of Long (i64).
    LongArray = 12,
}

impl Tag {
    /// The token a reader emits when it meets a payload of this tag.
    pub fn token(self) -> Token {
        match self {
            Tag::End => Token::EndCompound,
            Tag::Byte => Token::Byte,
            Tag::Short => Token::Short,
            Tag::Int => Token::Int,
            Tag::Long => Token::Long,
            Tag::Float => Token::Float,
            Tag::Double => Token::Double,
            Tag::ByteArray => Token::StartByteArray,
            Tag::String => Token::String,
            Tag::List => Token::StartList,
            Tag::Compound => Token::StartCompound,
            Tag::IntArray => Token::StartIntArray,
            Tag::LongArray => Token::StartLongArray,
        }
    }

    /// Whether a value of this tag opens a nested frame.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            Tag::ByteArray | Tag::List | Tag::Compound | Tag::IntArray | Tag::LongArray
        )
    }

    /// Whether every value of this numeric tag is exactly representable as a
    /// value of `target`.
    pub fn widens_to(self, target: Tag) -> bool {
        use Tag::*;
        match (self, target) {
            (Byte | Short | Int | Long, Byte | Short | Int | Long) => self as u8 <= target as u8,
            (Byte | Short | Float, Float) => true,
            (Byte | Short | Int | Float | Double, Double) => true,
            _ => false,
        }
    }
}

// The tags will very rarely change, so writing the conversions out by hand is
// no burden.
impl TryFrom<u8> for Tag {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        use Tag::*;
        Ok(match value {
            0 => End,
            1 => Byte,
            2 => Short,
            3 => Int,
            4 => Long,
            5 => Float,
            6 => Double,
            7 => ByteArray,
            8 => String,
            9 => List,
            10 => Compound,
            11 => IntArray,
            12 => LongArray,
            13..=u8::MAX => return Err(()),
        })
    }
}

impl From<Tag> for u8 {
    fn from(tag: Tag) -> Self {
        tag as u8
    }
}
