use std::any::Any;

use super::{builtin::read_elements, Context, Converter, TypedConverter};
use crate::{
    error::{Error, Result},
    stream::skip_value,
    Compound, NbtRead, NbtWrite, Tag, TagSet, Token, Value,
};

/// Reads anything into a [`Value`] and writes a `Value` back as it is.
pub struct ValueConverter;

impl ValueConverter {
    fn read_value(reader: &mut dyn NbtRead) -> Result<Value> {
        Ok(match reader.token() {
            Token::Byte | Token::True | Token::False => Value::Byte(reader.get_i8(false)?),
            Token::Short => Value::Short(reader.get_i16(true)?),
            Token::Int => Value::Int(reader.get_i32(true)?),
            Token::Long => Value::Long(reader.get_i64(true)?),
            Token::Float => Value::Float(reader.get_f32(true)?),
            Token::Double => Value::Double(reader.get_f64(true)?),
            Token::String => Value::String(reader.get_string()?),
            Token::StartByteArray => Value::ByteArray(read_elements(reader, |r| r.get_i8(false))?),
            Token::StartIntArray => Value::IntArray(read_elements(reader, |r| r.get_i32(false))?),
            Token::StartLongArray => {
                Value::LongArray(read_elements(reader, |r| r.get_i64(false))?)
            }
            Token::StartList => Value::List(read_elements(reader, Self::read_value)?),
            Token::StartCompound => {
                let mut compound = Compound::default();
                loop {
                    match reader.read()? {
                        Token::EndCompound => break,
                        Token::Name => {
                            let name = reader.get_string()?;
                            match reader.read()? {
                                Token::None => return Err(Error::truncated(reader.position())),
                                _ => {
                                    compound.insert(name, Self::read_value(reader)?);
                                }
                            }
                        }
                        Token::None => return Err(Error::truncated(reader.position())),
                        token => {
                            return Err(Error::format(
                                format!("expected an entry name, found {:?}", token),
                                reader.position(),
                            ))
                        }
                    }
                }
                Value::Compound(compound)
            }
            Token::None => return Err(Error::truncated(reader.position())),
            token => {
                return Err(Error::format(
                    format!("{:?} does not start a value", token),
                    reader.position(),
                ))
            }
        })
    }

    fn write_value(writer: &mut dyn NbtWrite, value: &Value) -> Result<()> {
        match value {
            Value::Byte(v) => writer.write_i8(*v),
            Value::Short(v) => writer.write_i16(*v),
            Value::Int(v) => writer.write_i32(*v),
            Value::Long(v) => writer.write_i64(*v),
            Value::Float(v) => writer.write_f32(*v),
            Value::Double(v) => writer.write_f64(*v),
            Value::String(v) => writer.write_str(v),
            Value::ByteArray(v) => writer.write_byte_array(v),
            Value::IntArray(v) => writer.write_int_array(v),
            Value::LongArray(v) => writer.write_long_array(v),
            Value::List(values) => {
                let element = values.first().map_or(Tag::End, Value::tag);
                writer.write_start_list(Some(element), Some(values.len()))?;
                for v in values {
                    Self::write_value(writer, v)?;
                }
                writer.write_end_array()
            }
            Value::Compound(entries) => {
                writer.write_start_compound()?;
                for (name, v) in entries {
                    writer.write_name(name, Some(v.tag()))?;
                    Self::write_value(writer, v)?;
                }
                writer.write_end_compound()
            }
        }
    }
}

impl TypedConverter<Value> for ValueConverter {
    fn accepted_tags(&self, _: &Context) -> TagSet {
        TagSet::ALL
    }

    fn target_tags(&self, _: &Context) -> TagSet {
        TagSet::ALL
    }

    fn target_tag(&self, _: &Context) -> Option<Tag> {
        None
    }

    fn value_tag(&self, value: &Value, _: &Context) -> Result<Tag> {
        Ok(value.tag())
    }

    fn read_body(&self, reader: &mut dyn NbtRead, _: &Context) -> Result<Value> {
        Self::read_value(reader)
    }

    fn write(&self, writer: &mut dyn NbtWrite, value: &Value, _: &Context) -> Result<()> {
        Self::write_value(writer, value)
    }
}

/// Consumes one value of any shape, nested containers included. Read only.
pub struct SkipConverter;

impl Converter for SkipConverter {
    fn can_write(&self) -> bool {
        false
    }

    fn accepted_tags(&self, _: &Context) -> TagSet {
        TagSet::ALL
    }

    fn target_tags(&self, _: &Context) -> TagSet {
        TagSet::EMPTY
    }

    fn target_tag(&self, _: &Context) -> Option<Tag> {
        None
    }

    fn read_body(&self, reader: &mut dyn NbtRead, _: &Context) -> Result<Box<dyn Any>> {
        skip_value(reader)?;
        Ok(Box::new(()))
    }

    fn write(&self, _: &mut dyn NbtWrite, _: &dyn Any, _: &Context) -> Result<()> {
        Err(Error::unsupported("the skip converter cannot write"))
    }
}
