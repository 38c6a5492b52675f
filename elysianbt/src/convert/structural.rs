//! Converters for types that hold other types: sequences, maps, options,
//! boxes. The inner converter is resolved from the context on every call, so
//! a derived context's overrides reach the elements too.
use std::{any::Any, sync::Arc};

use super::{
    check_accepted,
    desc::interface,
    BoxOps, Context, Converter, ConverterFactory, EnumOps, MapOps, OptionOps, Pattern, SeqOps,
    TypeDesc,
};
use crate::{
    error::{Error, Result},
    stream::skip_value,
    NbtRead, NbtWrite, Tag, TagSet, Token,
};

const PREALLOCATE_LIMIT: usize = 64 * 1024;

fn read_next(reader: &mut dyn NbtRead) -> Result<Token> {
    match reader.read()? {
        Token::None => Err(Error::truncated(reader.position())),
        token => Ok(token),
    }
}

struct SeqConverter {
    element: Arc<TypeDesc>,
    ops: SeqOps,
    accepted: TagSet,
}

impl Converter for SeqConverter {
    fn accepted_tags(&self, _: &Context) -> TagSet {
        self.accepted
    }

    fn target_tag(&self, _: &Context) -> Option<Tag> {
        Some(Tag::List)
    }

    fn read_body(&self, reader: &mut dyn NbtRead, ctx: &Context) -> Result<Box<dyn Any>> {
        let converter = ctx.read_converter(&self.element)?;
        let accepted = converter.accepted_tags(ctx);
        let capacity = reader.content_len().unwrap_or(0).min(PREALLOCATE_LIMIT);
        let mut out = (self.ops.with_capacity)(capacity);
        loop {
            let token = read_next(reader)?;
            if token == Token::EndArray {
                return Ok(out);
            }
            check_accepted(accepted, token, reader.position())?;
            let item = converter.read_body(reader, ctx)?;
            (self.ops.push)(out.as_mut(), item)?;
        }
    }

    fn write(&self, writer: &mut dyn NbtWrite, value: &dyn Any, ctx: &Context) -> Result<()> {
        let converter = ctx.write_converter(&self.element)?;
        let len = (self.ops.len)(value)?;
        let element = match converter.target_tag(ctx) {
            Some(tag) => tag,
            None => {
                let mut first = None;
                (self.ops.each)(value, &mut |item| {
                    if first.is_none() {
                        first = Some(converter.value_tag(item, ctx)?);
                    }
                    Ok(())
                })?;
                first.unwrap_or(Tag::End)
            }
        };
        writer.write_start_list(Some(element), Some(len))?;
        (self.ops.each)(value, &mut |item| converter.write(writer, item, ctx))?;
        writer.write_end_array()
    }
}

/// Builds list converters for sequences. The `List` flavour also reads the
/// typed arrays; sets and other unordered sequences only read lists.
pub(crate) struct SeqFactory {
    family: &'static str,
    accepted: TagSet,
}

impl SeqFactory {
    pub(crate) fn seq() -> Self {
        Self {
            family: interface::SEQ,
            accepted: TagSet::single(Tag::List),
        }
    }

    pub(crate) fn list() -> Self {
        Self {
            family: interface::LIST,
            accepted: TagSet::of(&[Tag::List, Tag::ByteArray, Tag::IntArray, Tag::LongArray]),
        }
    }
}

impl ConverterFactory for SeqFactory {
    fn handles(&self) -> Pattern {
        Pattern::family(self.family, vec![Pattern::Param(0)])
    }

    fn create(
        &self,
        desc: &Arc<TypeDesc>,
        bindings: &[Arc<TypeDesc>],
        _: &Context,
    ) -> Option<Arc<dyn Converter>> {
        Some(Arc::new(SeqConverter {
            element: bindings.first()?.clone(),
            ops: desc.capabilities().sequence?,
            accepted: self.accepted,
        }))
    }
}

struct MapConverter {
    value: Arc<TypeDesc>,
    ops: MapOps,
}

impl Converter for MapConverter {
    fn accepted_tags(&self, _: &Context) -> TagSet {
        TagSet::single(Tag::Compound)
    }

    fn target_tag(&self, _: &Context) -> Option<Tag> {
        Some(Tag::Compound)
    }

    fn read_body(&self, reader: &mut dyn NbtRead, ctx: &Context) -> Result<Box<dyn Any>> {
        let converter = ctx.read_converter(&self.value)?;
        let mut out = (self.ops.new)();
        loop {
            match read_next(reader)? {
                Token::EndCompound => return Ok(out),
                Token::Name => {
                    let key = reader.get_string()?;
                    let value = converter.read(reader, ctx)?;
                    (self.ops.insert)(out.as_mut(), key, value)?;
                }
                token => {
                    return Err(Error::format(
                        format!("expected an entry name, found {:?}", token),
                        reader.position(),
                    ))
                }
            }
        }
    }

    fn write(&self, writer: &mut dyn NbtWrite, value: &dyn Any, ctx: &Context) -> Result<()> {
        let converter = ctx.write_converter(&self.value)?;
        writer.write_start_compound()?;
        (self.ops.each)(value, &mut |key, item| {
            let tag = converter.value_tag(item, ctx)?;
            writer.write_name(key, Some(tag))?;
            converter.write(writer, item, ctx)
        })?;
        writer.write_end_compound()
    }
}

pub(crate) struct MapFactory;

impl ConverterFactory for MapFactory {
    fn handles(&self) -> Pattern {
        Pattern::family(interface::MAP, vec![Pattern::Param(0)])
    }

    fn create(
        &self,
        desc: &Arc<TypeDesc>,
        bindings: &[Arc<TypeDesc>],
        _: &Context,
    ) -> Option<Arc<dyn Converter>> {
        Some(Arc::new(MapConverter {
            value: bindings.first()?.clone(),
            ops: desc.capabilities().map?,
        }))
    }
}

/// Absent values travel as the context's null tag. Reading a null tag the
/// inner type cannot take gives `None`.
struct NullableConverter {
    inner: Arc<TypeDesc>,
    ops: OptionOps,
}

impl Converter for NullableConverter {
    fn accepted_tags(&self, ctx: &Context) -> TagSet {
        let inner = match ctx.read_converter(&self.inner) {
            Ok(inner) => inner.accepted_tags(ctx),
            Err(_) => TagSet::EMPTY,
        };
        inner.union(TagSet::single(ctx.null_tag()))
    }

    fn target_tags(&self, ctx: &Context) -> TagSet {
        let inner = match ctx.write_converter(&self.inner) {
            Ok(inner) => inner.target_tags(ctx),
            Err(_) => TagSet::EMPTY,
        };
        inner.union(TagSet::single(ctx.null_tag()))
    }

    /// Fixed only when an absent value is written with the same tag as a
    /// present one.
    fn target_tag(&self, ctx: &Context) -> Option<Tag> {
        let inner = ctx.write_converter(&self.inner).ok()?.target_tag(ctx)?;
        (inner == ctx.null_tag()).then_some(inner)
    }

    fn value_tag(&self, value: &dyn Any, ctx: &Context) -> Result<Tag> {
        match (self.ops.get)(value)? {
            Some(inner) => ctx.write_converter(&self.inner)?.value_tag(inner, ctx),
            None => Ok(ctx.null_tag()),
        }
    }

    fn read_body(&self, reader: &mut dyn NbtRead, ctx: &Context) -> Result<Box<dyn Any>> {
        let inner = ctx.read_converter(&self.inner)?;
        let null = ctx.null_tag();
        if reader.token().tag() == Some(null) && !inner.accepted_tags(ctx).contains(null) {
            skip_value(reader)?;
            return Ok((self.ops.none)());
        }
        (self.ops.some)(inner.read_body(reader, ctx)?)
    }

    fn write(&self, writer: &mut dyn NbtWrite, value: &dyn Any, ctx: &Context) -> Result<()> {
        match (self.ops.get)(value)? {
            Some(inner) => ctx.write_converter(&self.inner)?.write(writer, inner, ctx),
            None => ctx.write_null(writer),
        }
    }
}

pub(crate) struct NullableFactory;

impl ConverterFactory for NullableFactory {
    fn handles(&self) -> Pattern {
        Pattern::family(interface::NULLABLE, vec![Pattern::Param(0)])
    }

    fn create(
        &self,
        desc: &Arc<TypeDesc>,
        bindings: &[Arc<TypeDesc>],
        _: &Context,
    ) -> Option<Arc<dyn Converter>> {
        Some(Arc::new(NullableConverter {
            inner: bindings.first()?.clone(),
            ops: desc.capabilities().optional?,
        }))
    }
}

struct BoxConverter {
    inner: Arc<TypeDesc>,
    ops: BoxOps,
}

impl Converter for BoxConverter {
    fn accepted_tags(&self, ctx: &Context) -> TagSet {
        ctx.read_converter(&self.inner)
            .map_or(TagSet::EMPTY, |inner| inner.accepted_tags(ctx))
    }

    fn target_tags(&self, ctx: &Context) -> TagSet {
        ctx.write_converter(&self.inner)
            .map_or(TagSet::EMPTY, |inner| inner.target_tags(ctx))
    }

    fn target_tag(&self, ctx: &Context) -> Option<Tag> {
        ctx.write_converter(&self.inner).ok()?.target_tag(ctx)
    }

    fn value_tag(&self, value: &dyn Any, ctx: &Context) -> Result<Tag> {
        ctx.write_converter(&self.inner)?
            .value_tag((self.ops.get)(value)?, ctx)
    }

    fn read_body(&self, reader: &mut dyn NbtRead, ctx: &Context) -> Result<Box<dyn Any>> {
        (self.ops.wrap)(ctx.read_converter(&self.inner)?.read_body(reader, ctx)?)
    }

    fn write(&self, writer: &mut dyn NbtWrite, value: &dyn Any, ctx: &Context) -> Result<()> {
        ctx.write_converter(&self.inner)?
            .write(writer, (self.ops.get)(value)?, ctx)
    }
}

pub(crate) struct BoxFactory;

impl ConverterFactory for BoxFactory {
    fn handles(&self) -> Pattern {
        Pattern::family(interface::BOXED, vec![Pattern::Param(0)])
    }

    fn create(
        &self,
        desc: &Arc<TypeDesc>,
        bindings: &[Arc<TypeDesc>],
        _: &Context,
    ) -> Option<Arc<dyn Converter>> {
        Some(Arc::new(BoxConverter {
            inner: bindings.first()?.clone(),
            ops: desc.capabilities().boxed?,
        }))
    }
}

struct EnumConverter {
    ops: EnumOps,
}

impl Converter for EnumConverter {
    fn accepted_tags(&self, _: &Context) -> TagSet {
        TagSet::INTEGERS
    }

    fn target_tag(&self, _: &Context) -> Option<Tag> {
        Some(self.ops.tag)
    }

    fn read_body(&self, reader: &mut dyn NbtRead, _: &Context) -> Result<Box<dyn Any>> {
        (self.ops.from_i64)(reader.get_i64(false)?)
    }

    fn write(&self, writer: &mut dyn NbtWrite, value: &dyn Any, _: &Context) -> Result<()> {
        let v = (self.ops.to_i64)(value)?;
        match self.ops.tag {
            Tag::Byte => writer.write_i8(v as i8),
            Tag::Short => writer.write_i16(v as i16),
            Tag::Int => writer.write_i32(v as i32),
            Tag::Long => writer.write_i64(v),
            tag => Err(Error::unsupported(format!(
                "enums cannot be written as {:?}",
                tag
            ))),
        }
    }
}

pub(crate) struct EnumFactory;

impl ConverterFactory for EnumFactory {
    fn handles(&self) -> Pattern {
        Pattern::family(interface::ENUM, Vec::new())
    }

    fn create(&self, desc: &Arc<TypeDesc>, _: &[Arc<TypeDesc>], _: &Context) -> Option<Arc<dyn Converter>> {
        Some(Arc::new(EnumConverter {
            ops: desc.capabilities().enumeration?,
        }))
    }
}
