use std::{
    any::{Any, TypeId},
    cmp::Reverse,
    collections::{HashMap, HashSet},
    fmt,
    sync::{Arc, OnceLock},
};

use parking_lot::RwLock;

use super::{downcast, downcast_mut, object::IgnoreCondition, unbox, ConverterFactory, ObjectTable};
use crate::{error::Result, Tag};

/// Identity of a described type. Concrete Rust types are keyed by their
/// `TypeId`; interfaces, which exist only as descriptors, by their name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Concrete(TypeId),
    Abstract(Arc<str>),
}

impl TypeKey {
    pub fn of<T: Any>() -> TypeKey {
        TypeKey::Concrete(TypeId::of::<T>())
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, TypeKey::Abstract(_))
    }
}

/// Types that can be mapped onto NBT.
///
/// `describe` is called at most a few times per type; the result is interned
/// by [`desc_of`].
pub trait NbtType: Any {
    fn describe() -> TypeDesc;
}

/// The interned descriptor of `T`.
pub fn desc_of<T: NbtType>() -> Arc<TypeDesc> {
    static REGISTRY: OnceLock<RwLock<HashMap<TypeId, Arc<TypeDesc>>>> = OnceLock::new();
    let registry = REGISTRY.get_or_init(Default::default);

    let id = TypeId::of::<T>();
    if let Some(desc) = registry.read().get(&id) {
        return desc.clone();
    }
    // Describing may need the descriptors of other types, so no lock is held
    // while it runs. A racing thread's descriptor wins.
    let desc = Arc::new(T::describe());
    registry.write().entry(id).or_insert(desc).clone()
}

/// The erased operations of a sequence type.
#[derive(Clone, Copy)]
pub struct SeqOps {
    pub len: fn(&dyn Any) -> Result<usize>,
    pub each: fn(&dyn Any, &mut dyn FnMut(&dyn Any) -> Result<()>) -> Result<()>,
    pub with_capacity: fn(usize) -> Box<dyn Any>,
    pub push: fn(&mut dyn Any, Box<dyn Any>) -> Result<()>,
}

/// Collections that can be read and written as a list.
pub trait SeqLike: 'static {
    type Item: 'static;

    fn seq_len(&self) -> usize;
    fn seq_iter(&self) -> Box<dyn Iterator<Item = &Self::Item> + '_>;
    fn seq_with_capacity(capacity: usize) -> Self;
    fn seq_push(&mut self, item: Self::Item);
}

impl SeqOps {
    pub fn of<S: SeqLike>() -> SeqOps {
        fn len<S: SeqLike>(v: &dyn Any) -> Result<usize> {
            Ok(downcast::<S>(v)?.seq_len())
        }
        fn each<S: SeqLike>(v: &dyn Any, f: &mut dyn FnMut(&dyn Any) -> Result<()>) -> Result<()> {
            for item in downcast::<S>(v)?.seq_iter() {
                f(item)?;
            }
            Ok(())
        }
        fn with_capacity<S: SeqLike>(capacity: usize) -> Box<dyn Any> {
            Box::new(S::seq_with_capacity(capacity))
        }
        fn push<S: SeqLike>(v: &mut dyn Any, item: Box<dyn Any>) -> Result<()> {
            let item = unbox::<S::Item>(item)?;
            downcast_mut::<S>(v)?.seq_push(item);
            Ok(())
        }
        SeqOps {
            len: len::<S>,
            each: each::<S>,
            with_capacity: with_capacity::<S>,
            push: push::<S>,
        }
    }
}

/// The erased operations of a string-keyed map.
#[derive(Clone, Copy)]
pub struct MapOps {
    pub len: fn(&dyn Any) -> Result<usize>,
    pub each: fn(&dyn Any, &mut dyn FnMut(&str, &dyn Any) -> Result<()>) -> Result<()>,
    pub new: fn() -> Box<dyn Any>,
    pub insert: fn(&mut dyn Any, String, Box<dyn Any>) -> Result<()>,
}

/// Maps that can be read and written as a compound.
pub trait MapLike: Default + 'static {
    type Value: 'static;

    fn map_len(&self) -> usize;
    fn map_iter(&self) -> Box<dyn Iterator<Item = (&str, &Self::Value)> + '_>;
    fn map_insert(&mut self, key: String, value: Self::Value);
}

impl MapOps {
    pub fn of<M: MapLike>() -> MapOps {
        fn len<M: MapLike>(v: &dyn Any) -> Result<usize> {
            Ok(downcast::<M>(v)?.map_len())
        }
        fn each<M: MapLike>(
            v: &dyn Any,
            f: &mut dyn FnMut(&str, &dyn Any) -> Result<()>,
        ) -> Result<()> {
            for (key, value) in downcast::<M>(v)?.map_iter() {
                f(key, value)?;
            }
            Ok(())
        }
        fn new<M: MapLike>() -> Box<dyn Any> {
            Box::new(M::default())
        }
        fn insert<M: MapLike>(v: &mut dyn Any, key: String, value: Box<dyn Any>) -> Result<()> {
            let value = unbox::<M::Value>(value)?;
            downcast_mut::<M>(v)?.map_insert(key, value);
            Ok(())
        }
        MapOps {
            len: len::<M>,
            each: each::<M>,
            new: new::<M>,
            insert: insert::<M>,
        }
    }
}

#[derive(Clone, Copy)]
pub struct OptionOps {
    pub get: fn(&dyn Any) -> Result<Option<&dyn Any>>,
    pub none: fn() -> Box<dyn Any>,
    pub some: fn(Box<dyn Any>) -> Result<Box<dyn Any>>,
}

impl OptionOps {
    pub fn of<T: 'static>() -> OptionOps {
        fn get<T: 'static>(v: &dyn Any) -> Result<Option<&dyn Any>> {
            Ok(downcast::<Option<T>>(v)?.as_ref().map(|v| v as &dyn Any))
        }
        fn none<T: 'static>() -> Box<dyn Any> {
            Box::new(None::<T>)
        }
        fn some<T: 'static>(v: Box<dyn Any>) -> Result<Box<dyn Any>> {
            Ok(Box::new(Some(unbox::<T>(v)?)))
        }
        OptionOps {
            get: get::<T>,
            none: none::<T>,
            some: some::<T>,
        }
    }
}

#[derive(Clone, Copy)]
pub struct BoxOps {
    pub get: fn(&dyn Any) -> Result<&dyn Any>,
    pub wrap: fn(Box<dyn Any>) -> Result<Box<dyn Any>>,
}

impl BoxOps {
    pub fn of<T: 'static>() -> BoxOps {
        fn get<T: 'static>(v: &dyn Any) -> Result<&dyn Any> {
            let inner: &T = downcast::<Box<T>>(v)?;
            Ok(inner as &dyn Any)
        }
        fn wrap<T: 'static>(v: Box<dyn Any>) -> Result<Box<dyn Any>> {
            Ok(Box::new(Box::new(unbox::<T>(v)?)))
        }
        BoxOps {
            get: get::<T>,
            wrap: wrap::<T>,
        }
    }
}

/// Fieldless enums stored as their integer representation.
#[derive(Clone, Copy)]
pub struct EnumOps {
    pub tag: Tag,
    pub to_i64: fn(&dyn Any) -> Result<i64>,
    pub from_i64: fn(i64) -> Result<Box<dyn Any>>,
}

/// What a described type can do, beyond being a leaf.
#[derive(Clone, Default)]
pub struct Capabilities {
    pub sequence: Option<SeqOps>,
    pub map: Option<MapOps>,
    pub optional: Option<OptionOps>,
    pub boxed: Option<BoxOps>,
    pub enumeration: Option<EnumOps>,
    pub object: Option<Arc<ObjectTable>>,
}

/// Describes a type to the resolution engine: its identity and generic
/// arguments, the types it extends, how to reach its contents, and any
/// converter it is annotated with.
pub struct TypeDesc {
    key: TypeKey,
    name: Arc<str>,
    family: &'static str,
    args: Vec<Arc<TypeDesc>>,
    supers: Vec<Arc<TypeDesc>>,
    converter: Option<Arc<dyn ConverterFactory>>,
    ignore: Option<IgnoreCondition>,
    caps: Capabilities,
    ancestors: OnceLock<Vec<Vec<Arc<TypeDesc>>>>,
}

impl TypeDesc {
    /// Start describing the concrete type `T`.
    pub fn of<T: Any>() -> TypeDescBuilder {
        let name = std::any::type_name::<T>();
        TypeDescBuilder::new(
            TypeKey::of::<T>(),
            Some(name.into()),
            name.split('<').next().unwrap_or(name),
        )
    }

    /// Start describing an interface: a type that exists only to be extended
    /// and matched against.
    pub fn interface(family: &'static str) -> TypeDescBuilder {
        TypeDescBuilder::new(TypeKey::Abstract(family.into()), None, family)
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name without generic arguments.
    pub fn family(&self) -> &'static str {
        self.family
    }

    pub fn args(&self) -> &[Arc<TypeDesc>] {
        &self.args
    }

    pub fn supers(&self) -> &[Arc<TypeDesc>] {
        &self.supers
    }

    pub fn converter(&self) -> Option<&Arc<dyn ConverterFactory>> {
        self.converter.as_ref()
    }

    /// The omission policy members of this type default to.
    pub fn ignore(&self) -> Option<IgnoreCondition> {
        self.ignore
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// Ancestors grouped by distance; `layers()[0]` holds distance 1. Within a
    /// layer concrete types come before interfaces, and more generic
    /// arguments before fewer.
    pub fn layers(&self) -> &[Vec<Arc<TypeDesc>>] {
        self.ancestors.get_or_init(|| {
            let mut seen: HashSet<TypeKey> = HashSet::from([self.key.clone()]);
            let mut layers = Vec::new();
            let mut frontier = self.supers.clone();
            while !frontier.is_empty() {
                let mut layer: Vec<_> = frontier
                    .into_iter()
                    .filter(|d| seen.insert(d.key.clone()))
                    .collect();
                layer.sort_by_key(|d| (d.key.is_abstract(), Reverse(d.args.len())));
                frontier = layer.iter().flat_map(|d| d.supers.iter().cloned()).collect();
                if !layer.is_empty() {
                    layers.push(layer);
                }
            }
            layers
        })
    }

    /// This type at distance 0, then every ancestor with its distance.
    pub fn walk(self: &Arc<Self>) -> impl Iterator<Item = (usize, &Arc<TypeDesc>)> + '_ {
        std::iter::once((0, self)).chain(
            self.layers()
                .iter()
                .enumerate()
                .flat_map(|(i, layer)| layer.iter().map(move |d| (i + 1, d))),
        )
    }

    /// Distance from this type to `key`, if it is this type or an ancestor.
    pub fn distance_to(self: &Arc<Self>, key: &TypeKey) -> Option<usize> {
        self.walk().find(|(_, d)| &d.key == key).map(|(i, _)| i)
    }
}

impl fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

pub struct TypeDescBuilder {
    key: TypeKey,
    name: Option<Arc<str>>,
    family: &'static str,
    args: Vec<Arc<TypeDesc>>,
    supers: Vec<Arc<TypeDesc>>,
    converter: Option<Arc<dyn ConverterFactory>>,
    ignore: Option<IgnoreCondition>,
    caps: Capabilities,
}

impl TypeDescBuilder {
    fn new(key: TypeKey, name: Option<Arc<str>>, family: &'static str) -> Self {
        Self {
            key,
            name,
            family,
            args: Vec::new(),
            supers: Vec::new(),
            converter: None,
            ignore: None,
            caps: Capabilities::default(),
        }
    }

    /// Add a generic argument.
    pub fn arg(mut self, arg: Arc<TypeDesc>) -> Self {
        self.args.push(arg);
        self
    }

    /// Declare a direct base type or interface.
    pub fn extends(mut self, parent: Arc<TypeDesc>) -> Self {
        self.supers.push(parent);
        self
    }

    /// Annotate the type with a converter. It applies to the type and to
    /// everything extending it.
    pub fn converter(mut self, factory: Arc<dyn ConverterFactory>) -> Self {
        self.converter = Some(factory);
        self
    }

    pub fn ignore(mut self, condition: IgnoreCondition) -> Self {
        self.ignore = Some(condition);
        self
    }

    pub fn sequence(mut self, ops: SeqOps) -> Self {
        self.caps.sequence = Some(ops);
        self
    }

    pub fn map(mut self, ops: MapOps) -> Self {
        self.caps.map = Some(ops);
        self
    }

    pub fn optional(mut self, ops: OptionOps) -> Self {
        self.caps.optional = Some(ops);
        self
    }

    pub fn boxed(mut self, ops: BoxOps) -> Self {
        self.caps.boxed = Some(ops);
        self
    }

    pub fn enumeration(mut self, ops: EnumOps) -> Self {
        self.caps.enumeration = Some(ops);
        self
    }

    pub fn object(mut self, table: ObjectTable) -> Self {
        self.caps.object = Some(Arc::new(table));
        self
    }

    pub fn build(self) -> TypeDesc {
        let name = self.name.unwrap_or_else(|| {
            if self.args.is_empty() {
                self.family.into()
            } else {
                let args: Vec<&str> = self.args.iter().map(|a| a.name()).collect();
                format!("{}<{}>", self.family, args.join(", ")).into()
            }
        });
        let key = match self.key {
            TypeKey::Abstract(_) => TypeKey::Abstract(name.clone()),
            key => key,
        };
        TypeDesc {
            key,
            name,
            family: self.family,
            args: self.args,
            supers: self.supers,
            converter: self.converter,
            ignore: self.ignore,
            caps: self.caps,
            ancestors: OnceLock::new(),
        }
    }
}

/// The interfaces the built-in types extend, and that the built-in factories
/// match.
pub mod interface {
    use std::sync::Arc;

    use super::TypeDesc;

    /// Anything that can be iterated and collected.
    pub const SEQ: &str = "elysianbt::Seq";
    /// An ordered sequence; extends `Seq`.
    pub const LIST: &str = "elysianbt::List";
    /// String-keyed maps.
    pub const MAP: &str = "elysianbt::Map";
    pub const NULLABLE: &str = "elysianbt::Nullable";
    pub const BOXED: &str = "elysianbt::Boxed";
    pub const ENUM: &str = "elysianbt::Enum";

    pub fn seq(element: Arc<TypeDesc>) -> Arc<TypeDesc> {
        Arc::new(TypeDesc::interface(SEQ).arg(element).build())
    }

    pub fn list(element: Arc<TypeDesc>) -> Arc<TypeDesc> {
        Arc::new(
            TypeDesc::interface(LIST)
                .arg(element.clone())
                .extends(seq(element))
                .build(),
        )
    }

    pub fn map(value: Arc<TypeDesc>) -> Arc<TypeDesc> {
        Arc::new(TypeDesc::interface(MAP).arg(value).build())
    }

    pub fn nullable(inner: Arc<TypeDesc>) -> Arc<TypeDesc> {
        Arc::new(TypeDesc::interface(NULLABLE).arg(inner).build())
    }

    pub fn boxed(inner: Arc<TypeDesc>) -> Arc<TypeDesc> {
        Arc::new(TypeDesc::interface(BOXED).arg(inner).build())
    }

    pub fn enumeration() -> Arc<TypeDesc> {
        Arc::new(TypeDesc::interface(ENUM).build())
    }
}

/// The types a factory handles. Parameters are numbered from 0 and bind to
/// whatever they line up with when the pattern is unified with a descriptor.
///
/// ```
/// use elysianbt::convert::{desc_of, interface, Pattern};
///
/// let list_of_anything = Pattern::family(interface::LIST, vec![Pattern::Param(0)]);
/// let bindings = list_of_anything.matches(&desc_of::<Vec<String>>().layers()[0][0]);
/// assert_eq!(bindings.unwrap()[0].name(), std::any::type_name::<String>());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Param(usize),
    Exact(TypeKey),
    Family(&'static str, Vec<Pattern>),
}

impl Pattern {
    pub fn exact(desc: &TypeDesc) -> Pattern {
        Pattern::Exact(desc.key.clone())
    }

    pub fn of<T: NbtType>() -> Pattern {
        Pattern::exact(&desc_of::<T>())
    }

    pub fn family(family: &'static str, args: Vec<Pattern>) -> Pattern {
        Pattern::Family(family, args)
    }

    /// How much of the pattern is fixed rather than a parameter.
    pub fn specificity(&self) -> usize {
        match self {
            Pattern::Param(_) => 0,
            // An exact type pins down every argument it has.
            Pattern::Exact(_) => usize::MAX / 2,
            Pattern::Family(_, args) => 1 + args.iter().map(Pattern::specificity).sum::<usize>(),
        }
    }

    fn params(&self) -> usize {
        match self {
            Pattern::Param(i) => i + 1,
            Pattern::Exact(_) => 0,
            Pattern::Family(_, args) => args.iter().map(Pattern::params).max().unwrap_or(0),
        }
    }

    fn unify(&self, desc: &Arc<TypeDesc>, bindings: &mut [Option<Arc<TypeDesc>>]) -> bool {
        match self {
            Pattern::Param(i) => match &bindings[*i] {
                Some(bound) => bound.key == desc.key,
                None => {
                    bindings[*i] = Some(desc.clone());
                    true
                }
            },
            Pattern::Exact(key) => &desc.key == key,
            Pattern::Family(family, args) => {
                *family == desc.family
                    && args.len() == desc.args.len()
                    && args
                        .iter()
                        .zip(&desc.args)
                        .all(|(p, arg)| p.unify(arg, bindings))
            }
        }
    }

    /// Unify with `desc`, giving what each parameter was bound to.
    pub fn matches(&self, desc: &Arc<TypeDesc>) -> Option<Vec<Arc<TypeDesc>>> {
        let mut bindings = vec![None; self.params()];
        if !self.unify(desc, &mut bindings) {
            return None;
        }
        // A parameter that appears nowhere in the pattern stays unbound; the
        // numbering must be dense for a match.
        bindings.into_iter().collect()
    }
}
