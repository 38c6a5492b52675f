use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, OnceLock},
};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    builtin, desc_of, dynamic::SkipConverter, object::ObjectConverter, Converter,
    ConverterFactory, IgnoreCondition, NbtType, TypeDesc, TypeKey,
};
use crate::{
    error::{Error, Result},
    NbtWrite, Tag,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Read,
    Write,
}

/// Which struct members are included when they carry no explicit marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DefaultIncluded {
    None,
    #[default]
    Public,
    NonPublic,
    All,
}

/// The policy the reflective object converter builds its plans under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectParams {
    pub included: DefaultIncluded,
    pub ignore: IgnoreCondition,
}

type Cache = RwLock<HashMap<TypeKey, Arc<dyn Converter>>>;

/// Answers "which converter handles this type" and caches the answer.
///
/// A context is cheap to share between threads. Deriving a new one with
/// [`with_converters`](Context::with_converters) or
/// [`with_overrides`](Context::with_overrides) keeps everything the parent
/// already resolved.
///
/// ```
/// use elysianbt::{convert::Context, Tag};
///
/// let ctx = Context::global();
/// let converter = ctx.read_converter_for::<Vec<String>>()?;
/// assert_eq!(converter.target_tag(ctx), Some(Tag::List));
/// # Ok::<(), elysianbt::error::Error>(())
/// ```
pub struct Context {
    null_tag: Tag,
    object_params: ObjectParams,
    read_overrides: HashMap<TypeKey, Arc<dyn Converter>>,
    write_overrides: HashMap<TypeKey, Arc<dyn Converter>>,
    factories: Vec<Arc<dyn ConverterFactory>>,
    read_cache: Cache,
    write_cache: Cache,
    skip: Arc<dyn Converter>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            null_tag: Tag::Compound,
            object_params: ObjectParams::default(),
            read_overrides: HashMap::new(),
            write_overrides: HashMap::new(),
            factories: Vec::new(),
            read_cache: Cache::default(),
            write_cache: Cache::default(),
            skip: Arc::new(SkipConverter),
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("null_tag", &self.null_tag)
            .field("object_params", &self.object_params)
            .field("factories", &self.factories.len())
            .field("read_cached", &self.read_cache.read().len())
            .field("write_cached", &self.write_cache.read().len())
            .finish()
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// The context the entry points use when none is given.
    pub fn global() -> &'static Context {
        static GLOBAL: OnceLock<Context> = OnceLock::new();
        GLOBAL.get_or_init(Context::new)
    }

    fn derive(&self, keep_caches: bool) -> Context {
        let copy = |cache: &Cache| {
            if keep_caches {
                RwLock::new(cache.read().clone())
            } else {
                Cache::default()
            }
        };
        Context {
            null_tag: self.null_tag,
            object_params: self.object_params,
            read_overrides: self.read_overrides.clone(),
            write_overrides: self.write_overrides.clone(),
            factories: self.factories.clone(),
            read_cache: copy(&self.read_cache),
            write_cache: copy(&self.write_cache),
            skip: self.skip.clone(),
        }
    }

    /// Register more factories. They compete with the built-in ones, winning
    /// ties, but only for types this context has not resolved yet.
    pub fn with_converters(
        &self,
        factories: impl IntoIterator<Item = Arc<dyn ConverterFactory>>,
    ) -> Context {
        let mut ctx = self.derive(true);
        ctx.factories.extend(factories);
        ctx
    }

    /// Use `converter` for exactly the type with `key`, in whichever
    /// directions it supports.
    pub fn with_overrides(
        &self,
        overrides: impl IntoIterator<Item = (TypeKey, Arc<dyn Converter>)>,
    ) -> Context {
        let mut ctx = self.derive(true);
        for (key, converter) in overrides {
            if converter.can_read() {
                ctx.read_cache.get_mut().remove(&key);
                ctx.read_overrides.insert(key.clone(), converter.clone());
            }
            if converter.can_write() {
                ctx.write_cache.get_mut().remove(&key);
                ctx.write_overrides.insert(key, converter);
            }
        }
        ctx
    }

    pub fn with_override<T: NbtType>(&self, converter: Arc<dyn Converter>) -> Context {
        self.with_overrides([(TypeKey::of::<T>(), converter)])
    }

    pub fn with_object_params(&self, params: ObjectParams) -> Context {
        let mut ctx = self.derive(false);
        ctx.object_params = params;
        ctx
    }

    /// Change how absent values are written. Only tags with an obvious empty
    /// value make sense here: a compound, list, string or array.
    pub fn with_null_tag(&self, tag: Tag) -> Context {
        let mut ctx = self.derive(false);
        ctx.null_tag = tag;
        ctx
    }

    pub fn null_tag(&self) -> Tag {
        self.null_tag
    }

    pub fn object_params(&self) -> ObjectParams {
        self.object_params
    }

    /// The converter that consumes a value of any shape and produces nothing.
    pub fn skip_converter(&self) -> &Arc<dyn Converter> {
        &self.skip
    }

    /// Write the stand-in for an absent value.
    pub fn write_null(&self, writer: &mut dyn NbtWrite) -> Result<()> {
        match self.null_tag {
            Tag::Compound => {
                writer.write_start_compound()?;
                writer.write_end_compound()
            }
            Tag::List => {
                writer.write_start_list(Some(Tag::End), Some(0))?;
                writer.write_end_array()
            }
            Tag::String => writer.write_str(""),
            kind @ (Tag::ByteArray | Tag::IntArray | Tag::LongArray) => {
                writer.write_start_array(kind, Some(0))?;
                writer.write_end_array()
            }
            Tag::Byte => writer.write_i8(0),
            Tag::Short => writer.write_i16(0),
            Tag::Int => writer.write_i32(0),
            Tag::Long => writer.write_i64(0),
            Tag::Float => writer.write_f32(0.0),
            Tag::Double => writer.write_f64(0.0),
            Tag::End => Err(Error::unsupported("null cannot be written as End")),
        }
    }

    pub fn read_converter(&self, desc: &Arc<TypeDesc>) -> Result<Arc<dyn Converter>> {
        self.converter(desc, Direction::Read)
    }

    pub fn write_converter(&self, desc: &Arc<TypeDesc>) -> Result<Arc<dyn Converter>> {
        self.converter(desc, Direction::Write)
    }

    pub fn read_converter_for<T: NbtType>(&self) -> Result<Arc<dyn Converter>> {
        self.read_converter(&desc_of::<T>())
    }

    pub fn write_converter_for<T: NbtType>(&self) -> Result<Arc<dyn Converter>> {
        self.write_converter(&desc_of::<T>())
    }

    pub fn converter(&self, desc: &Arc<TypeDesc>, direction: Direction) -> Result<Arc<dyn Converter>> {
        let cache = match direction {
            Direction::Read => &self.read_cache,
            Direction::Write => &self.write_cache,
        };
        if let Some(converter) = cache.read().get(desc.key()) {
            return Ok(converter.clone());
        }
        // Resolution may recurse into this context, so the lock is not held.
        // Converters are stateless, losing a race only wastes the work.
        let converter = self.resolve(desc, direction)?;
        Ok(cache
            .write()
            .entry(desc.key().clone())
            .or_insert(converter)
            .clone())
    }

    fn resolve(&self, desc: &Arc<TypeDesc>, direction: Direction) -> Result<Arc<dyn Converter>> {
        let supports = |c: &Arc<dyn Converter>| match direction {
            Direction::Read => c.can_read(),
            Direction::Write => c.can_write(),
        };
        let overrides = match direction {
            Direction::Read => &self.read_overrides,
            Direction::Write => &self.write_overrides,
        };
        let found = |strategy: &str, distance: usize, c: Arc<dyn Converter>| -> Result<Arc<dyn Converter>> {
            debug!(
                ty = desc.name(),
                ?direction,
                strategy,
                distance,
                "Resolved converter."
            );
            Ok(c)
        };

        if let Some(converter) = overrides.get(desc.key()) {
            return found("override", 0, converter.clone());
        }
        if let Some(converter) = builtin::basic(desc.key()).filter(supports) {
            return found("builtin", 0, converter);
        }

        for (distance, ancestor) in desc.walk() {
            if let Some(factory) = ancestor.converter() {
                if let Some(converter) = factory
                    .create(desc, ancestor.args(), self)
                    .filter(supports)
                {
                    return found("annotation", distance, converter);
                }
            }
            if distance > 0 {
                if let Some(converter) = overrides.get(ancestor.key()) {
                    return found("ancestor override", distance, converter.clone());
                }
            }
        }

        let mut candidates = Vec::new();
        let factories = builtin::factories().iter().chain(&self.factories);
        for (index, factory) in factories.enumerate() {
            let pattern = factory.handles();
            for (distance, ancestor) in desc.walk() {
                if let Some(bindings) = pattern.matches(ancestor) {
                    candidates.push((distance, pattern.specificity(), index, factory, bindings));
                    break;
                }
            }
        }
        candidates.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then(b.1.cmp(&a.1))
                .then(b.2.cmp(&a.2))
        });
        for (distance, _, _, factory, bindings) in candidates {
            if let Some(converter) = factory.create(desc, &bindings, self).filter(supports) {
                return found("factory", distance, converter);
            }
        }

        if let Some(converter) = ObjectConverter::create(desc, self.object_params) {
            return found("reflection", 0, converter);
        }

        Err(Error::unsupported(format!(
            "no converter can {} {}",
            match direction {
                Direction::Read => "read",
                Direction::Write => "write",
            },
            desc.name()
        )))
    }
}
