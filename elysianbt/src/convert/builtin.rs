//! Leaf converters for the primitive types and the typed arrays, plus the
//! list of built-in factories.
use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
};

use super::{
    dynamic::ValueConverter,
    structural::{BoxFactory, EnumFactory, MapFactory, NullableFactory, SeqFactory},
    typed, Context, Converter, ConverterFactory, TypeKey, TypedConverter,
};
use crate::{
    error::{Error, Result},
    NbtRead, NbtWrite, Tag, TagSet, Token, Value,
};

/// Largest number of elements preallocated on the word of a declared length.
const PREALLOCATE_LIMIT: usize = 64 * 1024;

macro_rules! scalar {
    ($name:ident, $ty:ty, $tag:ident, $accepts:expr, $get:ident, $write:ident) => {
        struct $name;

        impl TypedConverter<$ty> for $name {
            fn accepted_tags(&self, _: &Context) -> TagSet {
                $accepts
            }

            fn target_tag(&self, _: &Context) -> Option<Tag> {
                Some(Tag::$tag)
            }

            fn read_body(&self, reader: &mut dyn NbtRead, _: &Context) -> Result<$ty> {
                reader.$get(false)
            }

            fn write(&self, writer: &mut dyn NbtWrite, value: &$ty, _: &Context) -> Result<()> {
                writer.$write(*value)
            }
        }
    };
}

scalar!(BoolConverter, bool, Byte, TagSet::widening_to(Tag::Byte), get_bool, write_bool);
scalar!(I8Converter, i8, Byte, TagSet::widening_to(Tag::Byte), get_i8, write_i8);
scalar!(U8Converter, u8, Byte, TagSet::widening_to(Tag::Byte), get_u8, write_u8);
scalar!(I16Converter, i16, Short, TagSet::widening_to(Tag::Short), get_i16, write_i16);
scalar!(U16Converter, u16, Short, TagSet::widening_to(Tag::Short), get_u16, write_u16);
scalar!(I32Converter, i32, Int, TagSet::widening_to(Tag::Int), get_i32, write_i32);
scalar!(U32Converter, u32, Int, TagSet::widening_to(Tag::Int), get_u32, write_u32);
scalar!(I64Converter, i64, Long, TagSet::widening_to(Tag::Long), get_i64, write_i64);
scalar!(U64Converter, u64, Long, TagSet::widening_to(Tag::Long), get_u64, write_u64);
scalar!(F32Converter, f32, Float, TagSet::widening_to(Tag::Float), get_f32, write_f32);
scalar!(F64Converter, f64, Double, TagSet::widening_to(Tag::Double), get_f64, write_f64);

struct StringConverter;

impl TypedConverter<String> for StringConverter {
    fn accepted_tags(&self, _: &Context) -> TagSet {
        TagSet::single(Tag::String)
    }

    fn target_tag(&self, _: &Context) -> Option<Tag> {
        Some(Tag::String)
    }

    fn read_body(&self, reader: &mut dyn NbtRead, _: &Context) -> Result<String> {
        reader.get_string()
    }

    fn write(&self, writer: &mut dyn NbtWrite, value: &String, _: &Context) -> Result<()> {
        writer.write_str(value)
    }
}

struct CharConverter;

impl TypedConverter<char> for CharConverter {
    fn accepted_tags(&self, _: &Context) -> TagSet {
        TagSet::single(Tag::String)
    }

    fn target_tag(&self, _: &Context) -> Option<Tag> {
        Some(Tag::String)
    }

    fn read_body(&self, reader: &mut dyn NbtRead, _: &Context) -> Result<char> {
        let mut chars = reader.get_str()?.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(Error::type_mismatch("expected a string of one character")),
        }
    }

    fn write(&self, writer: &mut dyn NbtWrite, value: &char, _: &Context) -> Result<()> {
        writer.write_str(value.encode_utf8(&mut [0; 4]))
    }
}

/// Characters travel as one string rather than a list.
struct CharsConverter;

impl TypedConverter<Vec<char>> for CharsConverter {
    fn accepted_tags(&self, _: &Context) -> TagSet {
        TagSet::single(Tag::String)
    }

    fn target_tag(&self, _: &Context) -> Option<Tag> {
        Some(Tag::String)
    }

    fn read_body(&self, reader: &mut dyn NbtRead, _: &Context) -> Result<Vec<char>> {
        Ok(reader.get_str()?.chars().collect())
    }

    fn write(&self, writer: &mut dyn NbtWrite, value: &Vec<char>, _: &Context) -> Result<()> {
        writer.write_str(&value.iter().collect::<String>())
    }
}

/// 128-bit integers are stored as a long. Values outside the range of
/// `i64` (or `u64` for `u128`) cannot be written.
struct I128Converter;

impl TypedConverter<i128> for I128Converter {
    fn accepted_tags(&self, _: &Context) -> TagSet {
        TagSet::widening_to(Tag::Long)
    }

    fn target_tag(&self, _: &Context) -> Option<Tag> {
        Some(Tag::Long)
    }

    fn read_body(&self, reader: &mut dyn NbtRead, _: &Context) -> Result<i128> {
        reader.get_i64(false).map(i128::from)
    }

    fn write(&self, writer: &mut dyn NbtWrite, value: &i128, _: &Context) -> Result<()> {
        let v = i64::try_from(*value)
            .map_err(|_| Error::unsupported(format!("{} does not fit a long", value)))?;
        writer.write_i64(v)
    }
}

struct U128Converter;

impl TypedConverter<u128> for U128Converter {
    fn accepted_tags(&self, _: &Context) -> TagSet {
        TagSet::widening_to(Tag::Long)
    }

    fn target_tag(&self, _: &Context) -> Option<Tag> {
        Some(Tag::Long)
    }

    fn read_body(&self, reader: &mut dyn NbtRead, _: &Context) -> Result<u128> {
        reader.get_u64(false).map(u128::from)
    }

    fn write(&self, writer: &mut dyn NbtWrite, value: &u128, _: &Context) -> Result<()> {
        let v = u64::try_from(*value)
            .map_err(|_| Error::unsupported(format!("{} does not fit a long", value)))?;
        writer.write_u64(v)
    }
}

/// Read the elements of the list or array just opened, up to its end.
pub(crate) fn read_elements<T>(
    reader: &mut dyn NbtRead,
    mut get: impl FnMut(&mut dyn NbtRead) -> Result<T>,
) -> Result<Vec<T>> {
    let capacity = reader.content_len().unwrap_or(0).min(PREALLOCATE_LIMIT);
    let mut out = Vec::with_capacity(capacity);
    loop {
        match reader.read()? {
            Token::EndArray => return Ok(out),
            Token::None => return Err(Error::truncated(reader.position())),
            _ => out.push(get(reader)?),
        }
    }
}

macro_rules! array {
    ($name:ident, $ty:ty, $kind:ident, $get:ident, $write:ident) => {
        struct $name;

        impl TypedConverter<Vec<$ty>> for $name {
            fn accepted_tags(&self, _: &Context) -> TagSet {
                TagSet::of(&[Tag::$kind, Tag::List])
            }

            fn target_tag(&self, _: &Context) -> Option<Tag> {
                Some(Tag::$kind)
            }

            fn read_body(&self, reader: &mut dyn NbtRead, _: &Context) -> Result<Vec<$ty>> {
                read_elements(reader, |r| r.$get(false))
            }

            fn write(&self, writer: &mut dyn NbtWrite, value: &Vec<$ty>, _: &Context) -> Result<()> {
                writer.write_start_array(Tag::$kind, Some(value.len()))?;
                for v in value {
                    writer.$write(*v)?;
                }
                writer.write_end_array()
            }
        }
    };
}

array!(I8ArrayConverter, i8, ByteArray, get_i8, write_i8);
array!(U8ArrayConverter, u8, ByteArray, get_u8, write_u8);
array!(I32ArrayConverter, i32, IntArray, get_i32, write_i32);
array!(U32ArrayConverter, u32, IntArray, get_u32, write_u32);
array!(I64ArrayConverter, i64, LongArray, get_i64, write_i64);
array!(U64ArrayConverter, u64, LongArray, get_u64, write_u64);

/// The converter for exactly the type `key`, if it is one of the built-in
/// leaves.
pub(crate) fn basic(key: &TypeKey) -> Option<Arc<dyn Converter>> {
    static TABLE: OnceLock<HashMap<TypeKey, Arc<dyn Converter>>> = OnceLock::new();
    TABLE
        .get_or_init(|| {
            HashMap::from([
                (TypeKey::of::<bool>(), typed(BoolConverter)),
                (TypeKey::of::<i8>(), typed(I8Converter)),
                (TypeKey::of::<u8>(), typed(U8Converter)),
                (TypeKey::of::<i16>(), typed(I16Converter)),
                (TypeKey::of::<u16>(), typed(U16Converter)),
                (TypeKey::of::<i32>(), typed(I32Converter)),
                (TypeKey::of::<u32>(), typed(U32Converter)),
                (TypeKey::of::<i64>(), typed(I64Converter)),
                (TypeKey::of::<u64>(), typed(U64Converter)),
                (TypeKey::of::<f32>(), typed(F32Converter)),
                (TypeKey::of::<f64>(), typed(F64Converter)),
                (TypeKey::of::<i128>(), typed(I128Converter)),
                (TypeKey::of::<u128>(), typed(U128Converter)),
                (TypeKey::of::<char>(), typed(CharConverter)),
                (TypeKey::of::<String>(), typed(StringConverter)),
                (TypeKey::of::<Vec<char>>(), typed(CharsConverter)),
                (TypeKey::of::<Vec<i8>>(), typed(I8ArrayConverter)),
                (TypeKey::of::<Vec<u8>>(), typed(U8ArrayConverter)),
                (TypeKey::of::<Vec<i32>>(), typed(I32ArrayConverter)),
                (TypeKey::of::<Vec<u32>>(), typed(U32ArrayConverter)),
                (TypeKey::of::<Vec<i64>>(), typed(I64ArrayConverter)),
                (TypeKey::of::<Vec<u64>>(), typed(U64ArrayConverter)),
                (TypeKey::of::<Value>(), typed(ValueConverter)),
            ])
        })
        .get(key)
        .cloned()
}

/// Factories every context starts with, lowest priority first.
pub(crate) fn factories() -> &'static [Arc<dyn ConverterFactory>] {
    static FACTORIES: OnceLock<Vec<Arc<dyn ConverterFactory>>> = OnceLock::new();
    FACTORIES.get_or_init(|| {
        vec![
            Arc::new(SeqFactory::seq()),
            Arc::new(SeqFactory::list()),
            Arc::new(MapFactory),
            Arc::new(NullableFactory),
            Arc::new(BoxFactory),
            Arc::new(EnumFactory),
        ]
    })
}
