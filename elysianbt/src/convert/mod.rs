//! Mapping Rust types onto the token stream.
//!
//! A [`Converter`] reads one value of some type from an [`NbtRead`] and
//! writes it to an [`NbtWrite`]. Converters are type-erased through
//! [`Any`] so that one [`Context`] can hold converters for every type; most
//! are written against the typed [`TypedConverter`] layer and wrapped with
//! [`typed`].
//!
//! Types take part by implementing [`NbtType`], which returns a [`TypeDesc`]
//! naming the type's ancestors and what it can do (be iterated, be looked up
//! by name, be absent, ...). Given a descriptor the context picks a converter:
//!
//! 1. an override registered for exactly that type,
//! 2. a converter the type or one of its ancestors is annotated with, nearest
//!    ancestor first,
//! 3. a built-in or registered [`ConverterFactory`] whose [`Pattern`] unifies
//!    with the type or an ancestor, nearest first and then most specific,
//! 4. the reflective object converter, if the type has an [`ObjectTable`].
//!
//! Resolved converters are cached in the context.
use std::{any::Any, marker::PhantomData, sync::Arc};

use crate::{
    error::{Error, Result},
    NbtRead, NbtWrite, Tag, TagSet, Token,
};

mod builtin;
mod context;
mod desc;
mod dynamic;
mod impls;
mod object;
mod structural;

pub use context::{Context, DefaultIncluded, Direction, ObjectParams};
pub use desc::{
    desc_of, interface, BoxOps, Capabilities, EnumOps, MapLike, MapOps, NbtType, OptionOps,
    Pattern, SeqLike, SeqOps, TypeDesc, TypeDescBuilder, TypeKey,
};
pub use dynamic::{SkipConverter, ValueConverter};
pub use impls::NbtEnum;
pub use object::{IgnoreCondition, Member, ObjectTable, Visibility};

/// Converts values of one type to and from the token stream.
///
/// Values travel as `&dyn Any` and `Box<dyn Any>`; a converter may assume
/// they hold the type it was resolved for.
pub trait Converter: Send + Sync + 'static {
    fn can_read(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        true
    }

    /// Tags this converter can read a value from.
    fn accepted_tags(&self, ctx: &Context) -> TagSet;

    /// Tags this converter may produce.
    fn target_tags(&self, ctx: &Context) -> TagSet {
        self.target_tag(ctx).map_or(TagSet::EMPTY, TagSet::single)
    }

    /// The tag every value is written as, when it does not depend on the
    /// value.
    fn target_tag(&self, ctx: &Context) -> Option<Tag>;

    /// The tag `value` will be written as.
    fn value_tag(&self, _value: &dyn Any, ctx: &Context) -> Result<Tag> {
        self.target_tag(ctx).ok_or_else(|| {
            Error::unsupported(format!(
                "{} cannot tell the tag of a value",
                std::any::type_name::<Self>()
            ))
        })
    }

    /// Read a value whose first token has already been read.
    fn read_body(&self, reader: &mut dyn NbtRead, ctx: &Context) -> Result<Box<dyn Any>>;

    /// Read the next token, check that it starts a value this converter
    /// accepts, and read the value.
    fn read(&self, reader: &mut dyn NbtRead, ctx: &Context) -> Result<Box<dyn Any>> {
        let token = reader.read()?;
        check_accepted(self.accepted_tags(ctx), token, reader.position())?;
        self.read_body(reader, ctx)
    }

    fn write(&self, writer: &mut dyn NbtWrite, value: &dyn Any, ctx: &Context) -> Result<()>;
}

/// The typed counterpart of [`Converter`]. Wrap one with [`typed`] to register
/// it.
///
/// ```
/// use elysianbt::convert::{typed, Context, TypedConverter};
/// use elysianbt::error::Result;
/// use elysianbt::{NbtRead, NbtWrite, Tag, TagSet};
///
/// /// Stores a `u128` as a string of digits.
/// struct Digits;
///
/// impl TypedConverter<u128> for Digits {
///     fn accepted_tags(&self, _: &Context) -> TagSet {
///         TagSet::single(Tag::String)
///     }
///     fn target_tag(&self, _: &Context) -> Option<Tag> {
///         Some(Tag::String)
///     }
///     fn read_body(&self, reader: &mut dyn NbtRead, _: &Context) -> Result<u128> {
///         reader
///             .get_str()?
///             .parse()
///             .map_err(|_| elysianbt::error::Error::type_mismatch("not a u128"))
///     }
///     fn write(&self, writer: &mut dyn NbtWrite, value: &u128, _: &Context) -> Result<()> {
///         writer.write_str(&value.to_string())
///     }
/// }
///
/// let converter = typed(Digits);
/// assert_eq!(converter.target_tag(Context::global()), Some(Tag::String));
/// ```
pub trait TypedConverter<T: 'static>: Send + Sync + 'static {
    fn can_read(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        true
    }

    fn accepted_tags(&self, ctx: &Context) -> TagSet;

    fn target_tags(&self, ctx: &Context) -> TagSet {
        self.target_tag(ctx).map_or(TagSet::EMPTY, TagSet::single)
    }

    fn target_tag(&self, ctx: &Context) -> Option<Tag>;

    fn value_tag(&self, _value: &T, ctx: &Context) -> Result<Tag> {
        self.target_tag(ctx).ok_or_else(|| {
            Error::unsupported(format!(
                "{} cannot tell the tag of a value",
                std::any::type_name::<Self>()
            ))
        })
    }

    fn read_body(&self, reader: &mut dyn NbtRead, ctx: &Context) -> Result<T>;

    fn write(&self, writer: &mut dyn NbtWrite, value: &T, ctx: &Context) -> Result<()>;
}

/// Erases a [`TypedConverter`].
pub struct Typed<T, C> {
    inner: C,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static, C: TypedConverter<T>> Converter for Typed<T, C> {
    fn can_read(&self) -> bool {
        self.inner.can_read()
    }

    fn can_write(&self) -> bool {
        self.inner.can_write()
    }

    fn accepted_tags(&self, ctx: &Context) -> TagSet {
        self.inner.accepted_tags(ctx)
    }

    fn target_tags(&self, ctx: &Context) -> TagSet {
        self.inner.target_tags(ctx)
    }

    fn target_tag(&self, ctx: &Context) -> Option<Tag> {
        self.inner.target_tag(ctx)
    }

    fn value_tag(&self, value: &dyn Any, ctx: &Context) -> Result<Tag> {
        self.inner.value_tag(downcast::<T>(value)?, ctx)
    }

    fn read_body(&self, reader: &mut dyn NbtRead, ctx: &Context) -> Result<Box<dyn Any>> {
        Ok(Box::new(self.inner.read_body(reader, ctx)?))
    }

    fn write(&self, writer: &mut dyn NbtWrite, value: &dyn Any, ctx: &Context) -> Result<()> {
        self.inner.write(writer, downcast::<T>(value)?, ctx)
    }
}

pub fn typed<T: 'static, C: TypedConverter<T>>(converter: C) -> Arc<dyn Converter> {
    Arc::new(Typed {
        inner: converter,
        _marker: PhantomData,
    })
}

/// Builds converters for a family of types, e.g. every `List<T>`.
pub trait ConverterFactory: Send + Sync + 'static {
    /// The types this factory can build a converter for.
    fn handles(&self) -> Pattern;

    /// Build a converter for `desc`. `bindings[i]` holds what parameter `i` of
    /// the pattern was bound to when it unified with `desc` or one of its
    /// ancestors. Returns `None` when `desc` lacks something the converter
    /// needs.
    fn create(
        &self,
        desc: &Arc<TypeDesc>,
        bindings: &[Arc<TypeDesc>],
        ctx: &Context,
    ) -> Option<Arc<dyn Converter>>;
}

/// A factory that hands out one existing converter for everything its
/// pattern matches.
pub struct Fixed {
    pattern: Pattern,
    converter: Arc<dyn Converter>,
}

impl Fixed {
    pub fn new(pattern: Pattern, converter: Arc<dyn Converter>) -> Arc<dyn ConverterFactory> {
        Arc::new(Fixed { pattern, converter })
    }

    /// A factory for exactly the type `T`.
    pub fn of<T: NbtType>(converter: Arc<dyn Converter>) -> Arc<dyn ConverterFactory> {
        Self::new(Pattern::exact(&desc_of::<T>()), converter)
    }
}

impl ConverterFactory for Fixed {
    fn handles(&self) -> Pattern {
        self.pattern.clone()
    }

    fn create(&self, _: &Arc<TypeDesc>, _: &[Arc<TypeDesc>], _: &Context) -> Option<Arc<dyn Converter>> {
        Some(self.converter.clone())
    }
}

/// Fail unless `token` starts a value with one of the `accepted` tags.
pub fn check_accepted(accepted: TagSet, token: Token, position: u64) -> Result<()> {
    match token.tag() {
        Some(tag) if tag != Tag::End && accepted.contains(tag) => Ok(()),
        _ if token == Token::None => Err(Error::truncated(position)),
        tag => Err(Error::unexpected_tag(format!("one of {:?}", accepted), tag).at(position)),
    }
}

pub fn downcast<T: Any>(value: &dyn Any) -> Result<&T> {
    value.downcast_ref::<T>().ok_or_else(|| not_a::<T>())
}

pub fn downcast_mut<T: Any>(value: &mut dyn Any) -> Result<&mut T> {
    value.downcast_mut::<T>().ok_or_else(|| not_a::<T>())
}

pub fn unbox<T: Any>(value: Box<dyn Any>) -> Result<T> {
    value.downcast::<T>().map(|b| *b).map_err(|_| not_a::<T>())
}

fn not_a<T>() -> Error {
    Error::type_mismatch(format!("value is not a {}", std::any::type_name::<T>()))
}
