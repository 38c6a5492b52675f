//! Descriptors for the standard library types.
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    hash::Hash,
};

use super::{
    desc::interface, desc_of, downcast, BoxOps, EnumOps, MapLike, MapOps, NbtType, OptionOps,
    SeqLike, SeqOps, TypeDesc,
};
use crate::{error::Error, Tag, Value};

macro_rules! leaf {
    ($($ty:ty),* $(,)?) => {
        $(
            impl NbtType for $ty {
                fn describe() -> TypeDesc {
                    TypeDesc::of::<Self>().build()
                }
            }
        )*
    };
}

leaf!(bool, i8, u8, i16, u16, i32, u32, i64, u64, i128, u128, f32, f64, char, String, Value);

impl<T: 'static> SeqLike for Vec<T> {
    type Item = T;

    fn seq_len(&self) -> usize {
        self.len()
    }

    fn seq_iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }

    fn seq_with_capacity(capacity: usize) -> Self {
        Vec::with_capacity(capacity)
    }

    fn seq_push(&mut self, item: T) {
        self.push(item)
    }
}

impl<T: 'static> SeqLike for VecDeque<T> {
    type Item = T;

    fn seq_len(&self) -> usize {
        self.len()
    }

    fn seq_iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }

    fn seq_with_capacity(capacity: usize) -> Self {
        VecDeque::with_capacity(capacity)
    }

    fn seq_push(&mut self, item: T) {
        self.push_back(item)
    }
}

impl<T: Eq + Hash + 'static> SeqLike for HashSet<T> {
    type Item = T;

    fn seq_len(&self) -> usize {
        self.len()
    }

    fn seq_iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }

    fn seq_with_capacity(capacity: usize) -> Self {
        HashSet::with_capacity(capacity)
    }

    fn seq_push(&mut self, item: T) {
        self.insert(item);
    }
}

impl<T: Ord + 'static> SeqLike for BTreeSet<T> {
    type Item = T;

    fn seq_len(&self) -> usize {
        self.len()
    }

    fn seq_iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }

    fn seq_with_capacity(_: usize) -> Self {
        BTreeSet::new()
    }

    fn seq_push(&mut self, item: T) {
        self.insert(item);
    }
}

impl<T: NbtType> NbtType for Vec<T> {
    fn describe() -> TypeDesc {
        let element = desc_of::<T>();
        TypeDesc::of::<Self>()
            .arg(element.clone())
            .extends(interface::list(element))
            .sequence(SeqOps::of::<Self>())
            .build()
    }
}

impl<T: NbtType> NbtType for VecDeque<T> {
    fn describe() -> TypeDesc {
        let element = desc_of::<T>();
        TypeDesc::of::<Self>()
            .arg(element.clone())
            .extends(interface::list(element))
            .sequence(SeqOps::of::<Self>())
            .build()
    }
}

impl<T: NbtType + Eq + Hash> NbtType for HashSet<T> {
    fn describe() -> TypeDesc {
        let element = desc_of::<T>();
        TypeDesc::of::<Self>()
            .arg(element.clone())
            .extends(interface::seq(element))
            .sequence(SeqOps::of::<Self>())
            .build()
    }
}

impl<T: NbtType + Ord> NbtType for BTreeSet<T> {
    fn describe() -> TypeDesc {
        let element = desc_of::<T>();
        TypeDesc::of::<Self>()
            .arg(element.clone())
            .extends(interface::seq(element))
            .sequence(SeqOps::of::<Self>())
            .build()
    }
}

impl<V: 'static> MapLike for HashMap<String, V> {
    type Value = V;

    fn map_len(&self) -> usize {
        self.len()
    }

    fn map_iter(&self) -> Box<dyn Iterator<Item = (&str, &V)> + '_> {
        Box::new(self.iter().map(|(k, v)| (k.as_str(), v)))
    }

    fn map_insert(&mut self, key: String, value: V) {
        self.insert(key, value);
    }
}

impl<V: 'static> MapLike for BTreeMap<String, V> {
    type Value = V;

    fn map_len(&self) -> usize {
        self.len()
    }

    fn map_iter(&self) -> Box<dyn Iterator<Item = (&str, &V)> + '_> {
        Box::new(self.iter().map(|(k, v)| (k.as_str(), v)))
    }

    fn map_insert(&mut self, key: String, value: V) {
        self.insert(key, value);
    }
}

#[cfg(feature = "preserve-order")]
impl<V: 'static> MapLike for indexmap::IndexMap<String, V> {
    type Value = V;

    fn map_len(&self) -> usize {
        self.len()
    }

    fn map_iter(&self) -> Box<dyn Iterator<Item = (&str, &V)> + '_> {
        Box::new(self.iter().map(|(k, v)| (k.as_str(), v)))
    }

    fn map_insert(&mut self, key: String, value: V) {
        self.insert(key, value);
    }
}

fn describe_map<M: MapLike>() -> TypeDesc
where
    M::Value: NbtType,
{
    let value = desc_of::<M::Value>();
    TypeDesc::of::<M>()
        .arg(desc_of::<String>())
        .arg(value.clone())
        .extends(interface::map(value))
        .map(MapOps::of::<M>())
        .build()
}

impl<V: NbtType> NbtType for HashMap<String, V> {
    fn describe() -> TypeDesc {
        describe_map::<Self>()
    }
}

impl<V: NbtType> NbtType for BTreeMap<String, V> {
    fn describe() -> TypeDesc {
        describe_map::<Self>()
    }
}

#[cfg(feature = "preserve-order")]
impl<V: NbtType> NbtType for indexmap::IndexMap<String, V> {
    fn describe() -> TypeDesc {
        describe_map::<Self>()
    }
}

impl<T: NbtType> NbtType for Option<T> {
    fn describe() -> TypeDesc {
        let inner = desc_of::<T>();
        TypeDesc::of::<Self>()
            .arg(inner.clone())
            .extends(interface::nullable(inner))
            .optional(OptionOps::of::<T>())
            .build()
    }
}

impl<T: NbtType> NbtType for Box<T> {
    fn describe() -> TypeDesc {
        let inner = desc_of::<T>();
        TypeDesc::of::<Self>()
            .arg(inner.clone())
            .extends(interface::boxed(inner))
            .boxed(BoxOps::of::<T>())
            .build()
    }
}

/// Fieldless enums stored as an integer. Implement it with [`nbt_enum!`].
///
/// [`nbt_enum!`]: crate::nbt_enum
pub trait NbtEnum: Sized + 'static {
    /// The integer tag the enum is written as.
    const TAG: Tag;

    fn to_i64(&self) -> i64;

    fn from_i64(value: i64) -> Option<Self>;
}

impl EnumOps {
    pub fn of<E: NbtEnum>() -> EnumOps {
        fn to_i64<E: NbtEnum>(v: &dyn std::any::Any) -> crate::error::Result<i64> {
            Ok(downcast::<E>(v)?.to_i64())
        }
        fn from_i64<E: NbtEnum>(v: i64) -> crate::error::Result<Box<dyn std::any::Any>> {
            match E::from_i64(v) {
                Some(e) => Ok(Box::new(e)),
                None => Err(Error::type_mismatch(format!(
                    "{} has no variant {}",
                    std::any::type_name::<E>(),
                    v
                ))),
            }
        }
        EnumOps {
            tag: E::TAG,
            to_i64: to_i64::<E>,
            from_i64: from_i64::<E>,
        }
    }
}

/// Map a fieldless enum onto an integer tag.
///
/// ```
/// use elysianbt::nbt_enum;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum GameMode {
///     Survival = 0,
///     Creative = 1,
///     Adventure = 2,
///     Spectator = 3,
/// }
///
/// nbt_enum!(GameMode as Int { Survival, Creative, Adventure, Spectator });
///
/// let bytes = elysianbt::ser::to_bytes(&GameMode::Creative).unwrap();
/// assert_eq!(bytes, [0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01]);
/// ```
#[macro_export]
macro_rules! nbt_enum {
    ($name:ident as $tag:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::convert::NbtEnum for $name {
            const TAG: $crate::Tag = $crate::Tag::$tag;

            fn to_i64(&self) -> i64 {
                match self {
                    $($name::$variant => $name::$variant as i64,)+
                }
            }

            fn from_i64(value: i64) -> ::std::option::Option<Self> {
                $(
                    if value == $name::$variant as i64 {
                        return ::std::option::Option::Some($name::$variant);
                    }
                )+
                ::std::option::Option::None
            }
        }

        impl $crate::convert::NbtType for $name {
            fn describe() -> $crate::convert::TypeDesc {
                $crate::convert::TypeDesc::of::<Self>()
                    .extends($crate::convert::interface::enumeration())
                    .enumeration($crate::convert::EnumOps::of::<Self>())
                    .build()
            }
        }
    };
}
