//! The reflective converter for structs.
//!
//! A struct lists its members once in an [`ObjectTable`]. For every
//! combination of type and [`ObjectParams`] the table is turned into a read
//! plan and a write plan, which are cached for the life of the process.
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::{Arc, OnceLock},
};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{
    desc_of, downcast, downcast_mut, unbox, Context, Converter, DefaultIncluded, NbtType,
    ObjectParams, TypeDesc, TypeKey,
};
use crate::{
    error::{Error, Result},
    NbtRead, NbtWrite, Tag, TagSet, Token,
};

/// When a member is left out of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IgnoreCondition {
    /// Always written.
    Never,
    /// Left out when the value is absent, e.g. `None`.
    #[default]
    WhenWritingNull,
    /// Left out when the value equals its type's default. Members without a
    /// default comparison fall back to `WhenWritingNull`.
    WhenWritingDefault,
    /// Never read or written.
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    NonPublic,
}

type Getter = Arc<dyn Fn(&dyn Any) -> Result<&dyn Any> + Send + Sync>;
type Setter = Arc<dyn Fn(&mut dyn Any, Box<dyn Any>) -> Result<()> + Send + Sync>;
type DefaultCheck = Arc<dyn Fn(&dyn Any) -> bool + Send + Sync>;

fn getter<G>(get: G) -> Getter
where
    G: Fn(&dyn Any) -> Result<&dyn Any> + Send + Sync + 'static,
{
    Arc::new(get)
}

/// One member of a struct `O` with type `F`.
pub struct Member<O, F> {
    name: String,
    order: Option<i32>,
    visibility: Visibility,
    ignore: Option<IgnoreCondition>,
    converter: Option<Arc<dyn Converter>>,
    explicit: bool,
    get: fn(&O) -> &F,
    set: Option<fn(&mut O) -> &mut F>,
    is_default: Option<fn(&F) -> bool>,
}

impl<O: 'static, F: NbtType> Member<O, F> {
    /// A member that is read and written.
    pub fn field(name: &str, get: fn(&O) -> &F, set: fn(&mut O) -> &mut F) -> Self {
        Self {
            set: Some(set),
            ..Self::read_only(name, get)
        }
    }

    /// A member that is written but never read back, like a computed
    /// property.
    pub fn read_only(name: &str, get: fn(&O) -> &F) -> Self {
        Self {
            name: name.to_owned(),
            order: None,
            visibility: Visibility::Public,
            ignore: None,
            converter: None,
            explicit: false,
            get,
            set: None,
            is_default: None,
        }
    }

    /// Use `name` for the entry instead of the member's own name.
    pub fn rename(mut self, name: &str) -> Self {
        self.name = name.to_owned();
        self.explicit = true;
        self
    }

    /// Members are written in ascending order. Members without an order come
    /// last, in declaration order.
    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self.explicit = true;
        self
    }

    pub fn private(mut self) -> Self {
        self.visibility = Visibility::NonPublic;
        self
    }

    /// Include the member whatever the inclusion policy says.
    pub fn include(mut self) -> Self {
        self.explicit = true;
        self
    }

    pub fn ignore(mut self, condition: IgnoreCondition) -> Self {
        self.ignore = Some(condition);
        self.explicit = true;
        self
    }

    /// Convert this member with `converter` rather than the resolved one.
    pub fn converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = Some(converter);
        self.explicit = true;
        self
    }

    /// Leave the member out when it equals `F::default()`.
    pub fn ignore_default(mut self) -> Self
    where
        F: Default + PartialEq,
    {
        self.is_default = Some(|v| *v == F::default());
        self.ignore(IgnoreCondition::WhenWritingDefault)
    }
}

struct MemberEntry {
    name: String,
    order: Option<i32>,
    visibility: Visibility,
    ignore: Option<IgnoreCondition>,
    converter: Option<Arc<dyn Converter>>,
    explicit: bool,
    desc: fn() -> Arc<TypeDesc>,
    get: Getter,
    set: Option<Setter>,
    is_default: Option<DefaultCheck>,
}

/// The members of a struct, in declaration order.
pub struct ObjectTable {
    type_id: TypeId,
    construct: fn() -> Box<dyn Any>,
    members: Vec<MemberEntry>,
}

impl ObjectTable {
    /// A table for `O`. Reading starts from `O::default()` and sets the
    /// members found in the input.
    pub fn new<O: Default + 'static>() -> Self {
        fn construct<O: Default + 'static>() -> Box<dyn Any> {
            Box::new(O::default())
        }
        Self {
            type_id: TypeId::of::<O>(),
            construct: construct::<O>,
            members: Vec::new(),
        }
    }

    pub fn member<O: 'static, F: NbtType>(mut self, member: Member<O, F>) -> Self {
        debug_assert_eq!(self.type_id, TypeId::of::<O>(), "member of another type");
        let get = member.get;
        let set = member.set.map(|set| -> Setter {
            Arc::new(move |o: &mut dyn Any, v: Box<dyn Any>| -> Result<()> {
                *set(downcast_mut::<O>(o)?) = unbox::<F>(v)?;
                Ok(())
            })
        });
        let is_default = member.is_default.map(|check| -> DefaultCheck {
            Arc::new(move |v: &dyn Any| v.downcast_ref::<F>().map_or(false, check))
        });
        self.members.push(MemberEntry {
            name: member.name,
            order: member.order,
            visibility: member.visibility,
            ignore: member.ignore,
            converter: member.converter,
            explicit: member.explicit,
            desc: desc_of::<F>,
            get: getter(move |o| Ok(get(downcast::<O>(o)?) as &dyn Any)),
            set,
            is_default,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct Planned {
    member: usize,
    ignore: IgnoreCondition,
}

#[derive(Debug, Default)]
struct Plan {
    write: Vec<(String, Planned)>,
    read: HashMap<String, Planned>,
}

impl Plan {
    fn build(table: &ObjectTable, params: ObjectParams) -> Plan {
        let mut included: Vec<(usize, Planned)> = Vec::new();
        for (i, member) in table.members.iter().enumerate() {
            let ignore = member
                .ignore
                .or_else(|| (member.desc)().ignore())
                .unwrap_or(params.ignore);
            if ignore == IgnoreCondition::Always {
                continue;
            }
            if !member.explicit && !params.included.allows(member.visibility) {
                continue;
            }
            included.push((i, Planned { member: i, ignore }));
        }
        // Stable, so equal orders keep declaration order.
        included.sort_by_key(|(i, _)| table.members[*i].order.unwrap_or(i32::MAX));

        let mut plan = Plan::default();
        for (i, planned) in included {
            let member = &table.members[i];
            if !plan.write.iter().any(|(name, _)| name == &member.name) {
                plan.write.push((member.name.clone(), planned));
            }
            if member.set.is_some() {
                plan.read.entry(member.name.clone()).or_insert(planned);
            }
        }
        plan
    }

    fn cached(key: &TypeKey, table: &ObjectTable, params: ObjectParams) -> Arc<Plan> {
        type Plans = RwLock<HashMap<(TypeKey, ObjectParams), Arc<Plan>>>;
        static PLANS: OnceLock<Plans> = OnceLock::new();
        let plans = PLANS.get_or_init(Default::default);

        let key = (key.clone(), params);
        if let Some(plan) = plans.read().get(&key) {
            return plan.clone();
        }
        let plan = Arc::new(Plan::build(table, params));
        plans.write().entry(key).or_insert(plan).clone()
    }
}

impl DefaultIncluded {
    fn allows(self, visibility: Visibility) -> bool {
        matches!(
            (self, visibility),
            (DefaultIncluded::All, _)
                | (DefaultIncluded::Public, Visibility::Public)
                | (DefaultIncluded::NonPublic, Visibility::NonPublic)
        )
    }
}

/// Reads and writes a struct as a compound, member by member.
pub(crate) struct ObjectConverter {
    table: Arc<ObjectTable>,
    plan: Arc<Plan>,
}

impl ObjectConverter {
    pub(crate) fn create(desc: &TypeDesc, params: ObjectParams) -> Option<Arc<dyn Converter>> {
        let table = desc.capabilities().object.clone()?;
        let plan = Plan::cached(desc.key(), &table, params);
        Some(Arc::new(ObjectConverter { table, plan }))
    }

    fn converter(&self, member: &MemberEntry, ctx: &Context, read: bool) -> Result<Arc<dyn Converter>> {
        match &member.converter {
            Some(converter) => Ok(converter.clone()),
            None if read => ctx.read_converter(&(member.desc)()),
            None => ctx.write_converter(&(member.desc)()),
        }
    }

    fn omitted(&self, member: &MemberEntry, ignore: IgnoreCondition, value: &dyn Any) -> Result<bool> {
        let is_null = || -> Result<bool> {
            match (member.desc)().capabilities().optional {
                Some(ops) => Ok((ops.get)(value)?.is_none()),
                None => Ok(false),
            }
        };
        match ignore {
            IgnoreCondition::Never => Ok(false),
            IgnoreCondition::Always => Ok(true),
            IgnoreCondition::WhenWritingNull => is_null(),
            IgnoreCondition::WhenWritingDefault => match &member.is_default {
                Some(check) => Ok(check(value)),
                None => is_null(),
            },
        }
    }
}

impl Converter for ObjectConverter {
    fn accepted_tags(&self, _: &Context) -> TagSet {
        TagSet::single(Tag::Compound)
    }

    fn target_tag(&self, _: &Context) -> Option<Tag> {
        Some(Tag::Compound)
    }

    fn read_body(&self, reader: &mut dyn NbtRead, ctx: &Context) -> Result<Box<dyn Any>> {
        let mut object = (self.table.construct)();
        loop {
            match reader.read()? {
                Token::EndCompound => return Ok(object),
                Token::Name => {}
                Token::None => return Err(Error::truncated(reader.position())),
                token => {
                    return Err(Error::format(
                        format!("expected a member name, found {:?}", token),
                        reader.position(),
                    ))
                }
            }

            let name = reader.get_str()?;
            let planned = match self.plan.read.get(name) {
                Some(planned) => *planned,
                None => {
                    trace!("Skipping unknown member {:?}.", name);
                    ctx.skip_converter().read(reader, ctx)?;
                    continue;
                }
            };
            let member = &self.table.members[planned.member];
            let value = self.converter(member, ctx, true)?.read(reader, ctx)?;
            if let Some(set) = &member.set {
                set(object.as_mut(), value)?;
            }
        }
    }

    fn write(&self, writer: &mut dyn NbtWrite, value: &dyn Any, ctx: &Context) -> Result<()> {
        writer.write_start_compound()?;
        for (name, planned) in &self.plan.write {
            let member = &self.table.members[planned.member];
            let member_value = (member.get)(value)?;
            if self.omitted(member, planned.ignore, member_value)? {
                continue;
            }
            let converter = self.converter(member, ctx, false)?;
            let tag = converter.value_tag(member_value, ctx)?;
            writer.write_name(name, Some(tag))?;
            converter.write(writer, member_value, ctx)?;
        }
        writer.write_end_compound()
    }
}
