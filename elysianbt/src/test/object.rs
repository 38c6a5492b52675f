use super::builder::Builder;
use crate::{
    convert::{
        typed, Context, DefaultIncluded, IgnoreCondition, Member, NbtType, ObjectParams,
        ObjectTable, TypeDesc, TypedConverter,
    },
    de::from_bytes_with,
    error::{Error, ErrorKind, Result},
    ser::to_bytes_with,
    BinaryOptions, NbtRead, NbtWrite, Tag, TagSet,
};

fn write(value: &impl NbtType, ctx: &Context) -> Result<Vec<u8>> {
    to_bytes_with(value, &BinaryOptions::java(), ctx)
}

fn read<T: NbtType>(bytes: &[u8], ctx: &Context) -> Result<T> {
    from_bytes_with(bytes, &BinaryOptions::java(), ctx)
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Slot {
    id: String,
    count: i8,
    damage: i16,
}

impl NbtType for Slot {
    fn describe() -> TypeDesc {
        TypeDesc::of::<Self>()
            .object(
                ObjectTable::new::<Self>()
                    .member(Member::field("id", |s: &Self| &s.id, |s: &mut Self| &mut s.id))
                    .member(
                        Member::field("count", |s: &Self| &s.count, |s: &mut Self| &mut s.count)
                            .rename("Count"),
                    )
                    .member(
                        Member::field("damage", |s: &Self| &s.damage, |s: &mut Self| {
                            &mut s.damage
                        })
                        .ignore_default(),
                    ),
            )
            .build()
    }
}

#[derive(Debug, Default, PartialEq)]
struct Ordered {
    a: i8,
    b: i8,
    c: i8,
}

impl NbtType for Ordered {
    fn describe() -> TypeDesc {
        TypeDesc::of::<Self>()
            .object(
                ObjectTable::new::<Self>()
                    .member(Member::field("a", |s: &Self| &s.a, |s: &mut Self| &mut s.a).order(5))
                    .member(Member::field("b", |s: &Self| &s.b, |s: &mut Self| &mut s.b))
                    .member(Member::field("c", |s: &Self| &s.c, |s: &mut Self| &mut s.c).order(-1)),
            )
            .build()
    }
}

#[derive(Debug, Default, PartialEq)]
struct Account {
    user: String,
    token: String,
    salt: i64,
}

impl NbtType for Account {
    fn describe() -> TypeDesc {
        TypeDesc::of::<Self>()
            .object(
                ObjectTable::new::<Self>()
                    .member(Member::field("user", |s: &Self| &s.user, |s: &mut Self| &mut s.user))
                    .member(
                        Member::field("token", |s: &Self| &s.token, |s: &mut Self| &mut s.token)
                            .private(),
                    )
                    .member(
                        Member::field("salt", |s: &Self| &s.salt, |s: &mut Self| &mut s.salt)
                            .private()
                            .include(),
                    ),
            )
            .build()
    }
}

/// Members whose type asks never to be stored.
#[derive(Debug, Default, PartialEq)]
struct Scratch(Vec<i32>);

impl NbtType for Scratch {
    fn describe() -> TypeDesc {
        TypeDesc::of::<Self>().ignore(IgnoreCondition::Always).build()
    }
}

#[derive(Debug, Default, PartialEq)]
struct Profile {
    nickname: Option<String>,
    motto: Option<String>,
    level: i32,
    scratch: Scratch,
    hidden: i32,
}

impl NbtType for Profile {
    fn describe() -> TypeDesc {
        TypeDesc::of::<Self>()
            .object(
                ObjectTable::new::<Self>()
                    .member(Member::field("nickname", |s: &Self| &s.nickname, |s: &mut Self| {
                        &mut s.nickname
                    }))
                    .member(
                        Member::field("motto", |s: &Self| &s.motto, |s: &mut Self| &mut s.motto)
                            .ignore(IgnoreCondition::Never),
                    )
                    .member(Member::field("level", |s: &Self| &s.level, |s: &mut Self| &mut s.level))
                    .member(Member::field("scratch", |s: &Self| &s.scratch, |s: &mut Self| {
                        &mut s.scratch
                    }))
                    .member(
                        Member::field("hidden", |s: &Self| &s.hidden, |s: &mut Self| &mut s.hidden)
                            .ignore(IgnoreCondition::Always),
                    ),
            )
            .build()
    }
}

/// A property computed from other members.
#[derive(Debug, Default, PartialEq)]
struct Area {
    width: i32,
    height: i32,
    size: i32,
}

impl Area {
    fn new(width: i32, height: i32) -> Self {
        Area {
            width,
            height,
            size: width * height,
        }
    }
}

impl NbtType for Area {
    fn describe() -> TypeDesc {
        TypeDesc::of::<Self>()
            .object(
                ObjectTable::new::<Self>()
                    .member(Member::field("w", |s: &Self| &s.width, |s: &mut Self| &mut s.width))
                    .member(Member::field("h", |s: &Self| &s.height, |s: &mut Self| &mut s.height))
                    .member(Member::read_only("size", |s: &Self| &s.size)),
            )
            .build()
    }
}

/// Stores an int as its decimal digits.
struct Digits;

impl TypedConverter<i32> for Digits {
    fn accepted_tags(&self, _: &Context) -> TagSet {
        TagSet::single(Tag::String)
    }

    fn target_tag(&self, _: &Context) -> Option<Tag> {
        Some(Tag::String)
    }

    fn read_body(&self, reader: &mut dyn NbtRead, _: &Context) -> Result<i32> {
        reader
            .get_str()?
            .parse()
            .map_err(|_| Error::type_mismatch("not an int"))
    }

    fn write(&self, writer: &mut dyn NbtWrite, value: &i32, _: &Context) -> Result<()> {
        writer.write_str(&value.to_string())
    }
}

#[derive(Debug, Default, PartialEq)]
struct Version {
    major: i32,
    minor: i32,
    alias: i32,
}

impl NbtType for Version {
    fn describe() -> TypeDesc {
        TypeDesc::of::<Self>()
            .object(
                ObjectTable::new::<Self>()
                    .member(
                        Member::field("major", |s: &Self| &s.major, |s: &mut Self| &mut s.major)
                            .converter(typed(Digits)),
                    )
                    .member(Member::field("minor", |s: &Self| &s.minor, |s: &mut Self| &mut s.minor))
                    // Clashes with "major"; the first declared member keeps the name.
                    .member(
                        Member::field("alias", |s: &Self| &s.alias, |s: &mut Self| &mut s.alias)
                            .rename("major"),
                    ),
            )
            .build()
    }
}

#[derive(Debug, Default, PartialEq)]
struct Node {
    value: i32,
    children: Vec<Node>,
    next: Option<Box<Node>>,
}

impl NbtType for Node {
    fn describe() -> TypeDesc {
        TypeDesc::of::<Self>()
            .object(
                ObjectTable::new::<Self>()
                    .member(Member::field("value", |s: &Self| &s.value, |s: &mut Self| &mut s.value))
                    .member(Member::field("children", |s: &Self| &s.children, |s: &mut Self| {
                        &mut s.children
                    }))
                    .member(Member::field("next", |s: &Self| &s.next, |s: &mut Self| &mut s.next)),
            )
            .build()
    }
}

#[derive(Debug, Default, PartialEq)]
struct Inventory {
    owner: String,
    slots: Vec<Slot>,
    offhand: Option<Slot>,
}

impl NbtType for Inventory {
    fn describe() -> TypeDesc {
        TypeDesc::of::<Self>()
            .object(
                ObjectTable::new::<Self>()
                    .member(Member::field("owner", |s: &Self| &s.owner, |s: &mut Self| &mut s.owner))
                    .member(
                        Member::field("slots", |s: &Self| &s.slots, |s: &mut Self| &mut s.slots)
                            .rename("Items"),
                    )
                    .member(Member::field("offhand", |s: &Self| &s.offhand, |s: &mut Self| {
                        &mut s.offhand
                    })),
            )
            .build()
    }
}

#[test]
fn renamed_members() -> Result<()> {
    let ctx = Context::new();
    let slot = Slot {
        id: "minecraft:dirt".to_owned(),
        count: 64,
        damage: 3,
    };
    let expected = Builder::new()
        .start_compound("")
        .string("id", "minecraft:dirt")
        .byte("Count", 64)
        .short("damage", 3)
        .end_compound()
        .build();
    assert_eq!(write(&slot, &ctx)?, expected);
    assert_eq!(read::<Slot>(&expected, &ctx)?, slot);
    Ok(())
}

#[test]
fn default_values_can_be_left_out() -> Result<()> {
    let ctx = Context::new();
    let slot = Slot {
        id: "minecraft:stick".to_owned(),
        count: 1,
        damage: 0,
    };
    let expected = Builder::new()
        .start_compound("")
        .string("id", "minecraft:stick")
        .byte("Count", 1)
        .end_compound()
        .build();
    assert_eq!(write(&slot, &ctx)?, expected);
    assert_eq!(read::<Slot>(&expected, &ctx)?, slot);
    Ok(())
}

#[test]
fn members_follow_their_order() -> Result<()> {
    let ctx = Context::new();
    let value = Ordered { a: 1, b: 2, c: 3 };
    let expected = Builder::new()
        .start_compound("")
        .byte("c", 3)
        .byte("a", 1)
        .byte("b", 2)
        .end_compound()
        .build();
    assert_eq!(write(&value, &ctx)?, expected);
    Ok(())
}

#[test]
fn reading_ignores_member_order() -> Result<()> {
    let ctx = Context::new();
    let bytes = Builder::new()
        .start_compound("")
        .byte("b", 2)
        .byte("a", 1)
        .end_compound()
        .build();
    assert_eq!(read::<Ordered>(&bytes, &ctx)?, Ordered { a: 1, b: 2, c: 0 });
    Ok(())
}

#[test]
fn inclusion_policy() -> Result<()> {
    let account = Account {
        user: "alex".to_owned(),
        token: "t0k3n".to_owned(),
        salt: 99,
    };

    let public = Context::new();
    let expected = Builder::new()
        .start_compound("")
        .string("user", "alex")
        .long("salt", 99)
        .end_compound()
        .build();
    assert_eq!(write(&account, &public)?, expected);

    let all = Context::new().with_object_params(ObjectParams {
        included: DefaultIncluded::All,
        ..ObjectParams::default()
    });
    let bytes = write(&account, &all)?;
    assert_eq!(read::<Account>(&bytes, &all)?, account);

    let private_only = Context::new().with_object_params(ObjectParams {
        included: DefaultIncluded::NonPublic,
        ..ObjectParams::default()
    });
    let expected = Builder::new()
        .start_compound("")
        .string("token", "t0k3n")
        .long("salt", 99)
        .end_compound()
        .build();
    assert_eq!(write(&account, &private_only)?, expected);

    let none = Context::new().with_object_params(ObjectParams {
        included: DefaultIncluded::None,
        ..ObjectParams::default()
    });
    let expected = Builder::new()
        .start_compound("")
        .long("salt", 99)
        .end_compound()
        .build();
    assert_eq!(write(&account, &none)?, expected);
    // Excluded members are not read either.
    assert_eq!(
        read::<Account>(&write(&account, &all)?, &none)?,
        Account {
            salt: 99,
            ..Account::default()
        }
    );
    Ok(())
}

#[test]
fn ignore_conditions() -> Result<()> {
    let ctx = Context::new();
    let profile = Profile {
        nickname: None,
        motto: None,
        level: 0,
        scratch: Scratch(vec![1, 2]),
        hidden: 7,
    };
    let expected = Builder::new()
        .start_compound("")
        .start_compound("motto")
        .end_compound()
        .int("level", 0)
        .end_compound()
        .build();
    assert_eq!(write(&profile, &ctx)?, expected);

    let back = read::<Profile>(&expected, &ctx)?;
    assert_eq!(
        back,
        Profile {
            level: 0,
            ..Profile::default()
        }
    );
    Ok(())
}

#[test]
fn ignored_members_are_not_read() -> Result<()> {
    let ctx = Context::new();
    let bytes = Builder::new()
        .start_compound("")
        .int("hidden", 5)
        .int_array("scratch", &[1])
        .string("nickname", "steve")
        .end_compound()
        .build();
    let profile = read::<Profile>(&bytes, &ctx)?;
    assert_eq!(profile.hidden, 0);
    assert_eq!(profile.scratch, Scratch::default());
    assert_eq!(profile.nickname.as_deref(), Some("steve"));
    Ok(())
}

#[test]
fn context_wide_ignore_condition() -> Result<()> {
    let never = Context::new().with_object_params(ObjectParams {
        ignore: IgnoreCondition::Never,
        ..ObjectParams::default()
    });
    let profile = Profile {
        nickname: None,
        motto: Some("hi".to_owned()),
        level: 2,
        ..Profile::default()
    };
    let expected = Builder::new()
        .start_compound("")
        .start_compound("nickname")
        .end_compound()
        .string("motto", "hi")
        .int("level", 2)
        .end_compound()
        .build();
    assert_eq!(write(&profile, &never)?, expected);
    assert_eq!(read::<Profile>(&expected, &never)?, profile);

    // Members without a default check treat "default" as "absent".
    let defaults = Context::new().with_object_params(ObjectParams {
        ignore: IgnoreCondition::WhenWritingDefault,
        ..ObjectParams::default()
    });
    let profile = Profile::default();
    let expected = Builder::new()
        .start_compound("")
        .start_compound("motto")
        .end_compound()
        .int("level", 0)
        .end_compound()
        .build();
    assert_eq!(write(&profile, &defaults)?, expected);
    Ok(())
}

#[test]
fn unknown_members_are_skipped() -> Result<()> {
    let ctx = Context::new();
    let bytes = Builder::new()
        .start_compound("")
        .start_compound("tag")
        .start_list("Enchantments", Tag::Compound, 1)
        .string("id", "sharpness")
        .short("lvl", 5)
        .end_compound()
        .end_compound()
        .string("id", "minecraft:sword")
        .long_array("extra", &[1, 2, 3])
        .byte("Count", 1)
        .end_compound()
        .build();
    let slot = read::<Slot>(&bytes, &ctx)?;
    assert_eq!(
        slot,
        Slot {
            id: "minecraft:sword".to_owned(),
            count: 1,
            damage: 0,
        }
    );
    Ok(())
}

#[test]
fn read_only_members_are_written_not_read() -> Result<()> {
    let ctx = Context::new();
    let area = Area::new(3, 4);
    let expected = Builder::new()
        .start_compound("")
        .int("w", 3)
        .int("h", 4)
        .int("size", 12)
        .end_compound()
        .build();
    assert_eq!(write(&area, &ctx)?, expected);

    let back = read::<Area>(&expected, &ctx)?;
    assert_eq!((back.width, back.height, back.size), (3, 4, 0));
    Ok(())
}

#[test]
fn member_converters_and_duplicate_names() -> Result<()> {
    let ctx = Context::new();
    let version = Version {
        major: 1,
        minor: 20,
        alias: 9,
    };
    let expected = Builder::new()
        .start_compound("")
        .string("major", "1")
        .int("minor", 20)
        .end_compound()
        .build();
    assert_eq!(write(&version, &ctx)?, expected);
    assert_eq!(
        read::<Version>(&expected, &ctx)?,
        Version {
            major: 1,
            minor: 20,
            alias: 0,
        }
    );
    Ok(())
}

#[test]
fn recursive_structs() -> Result<()> {
    let ctx = Context::new();
    let tree = Node {
        value: 1,
        children: vec![
            Node {
                value: 2,
                ..Node::default()
            },
            Node {
                value: 3,
                children: vec![Node {
                    value: 4,
                    ..Node::default()
                }],
                next: None,
            },
        ],
        next: Some(Box::new(Node {
            value: 5,
            ..Node::default()
        })),
    };
    let bytes = write(&tree, &ctx)?;
    assert_eq!(read::<Node>(&bytes, &ctx)?, tree);
    Ok(())
}

#[test]
fn nested_objects() -> Result<()> {
    let ctx = Context::new();
    let inventory = Inventory {
        owner: "alex".to_owned(),
        slots: vec![
            Slot {
                id: "minecraft:torch".to_owned(),
                count: 16,
                damage: 0,
            },
            Slot {
                id: "minecraft:bow".to_owned(),
                count: 1,
                damage: 40,
            },
        ],
        offhand: None,
    };
    let expected = Builder::new()
        .start_compound("")
        .string("owner", "alex")
        .start_list("Items", Tag::Compound, 2)
        .string("id", "minecraft:torch")
        .byte("Count", 16)
        .end_compound()
        .string("id", "minecraft:bow")
        .byte("Count", 1)
        .short("damage", 40)
        .end_compound()
        .end_compound()
        .build();
    assert_eq!(write(&inventory, &ctx)?, expected);
    assert_eq!(read::<Inventory>(&expected, &ctx)?, inventory);

    for options in [BinaryOptions::bedrock(), BinaryOptions::bedrock_network()] {
        let bytes = to_bytes_with(&inventory, &options, &ctx)?;
        let back: Inventory = from_bytes_with(&bytes, &options, &ctx)?;
        assert_eq!(back, inventory);
    }
    Ok(())
}

#[test]
fn objects_need_a_compound() {
    let ctx = Context::new();
    let bytes = Builder::new().start_list("", Tag::Int, 0).build();
    let err = read::<Slot>(&bytes, &ctx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn cut_off_objects() {
    let ctx = Context::new();
    let bytes = Builder::new()
        .start_compound("")
        .string("id", "minecraft:dirt")
        .build();
    let err = read::<Slot>(&bytes, &ctx).unwrap_err();
    assert!(err.is_truncation());
}

#[test]
fn member_types_are_checked() {
    let ctx = Context::new();
    let bytes = Builder::new()
        .start_compound("")
        .int("id", 3)
        .end_compound()
        .build();
    let err = read::<Slot>(&bytes, &ctx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}
