use std::fmt;

use crate::Tag;

/// The unit a tag-stream reader emits and a writer expects.
///
/// `True` and `False` only come out of the text form, where they stand in for
/// a byte of 1 or 0. `UnknownPayload` marks a text literal whose kind has not
/// been settled yet; it never escapes a reader once a token is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Token {
    /// The stream is exhausted, or nothing has been read yet.
    #[default]
    None,
    Name,
    StartCompound,
    EndCompound,
    StartList,
    StartByteArray,
    StartIntArray,
    StartLongArray,
    EndArray,
    String,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    True,
    False,
    UnknownPayload,
}

impl Token {
    /// The tag of the payload this token starts or carries. `EndCompound` maps
    /// to `End`; `Name`, `EndArray`, `None` and `UnknownPayload` have no tag.
    pub fn tag(self) -> Option<Tag> {
        Some(match self {
            Token::EndCompound => Tag::End,
            Token::Byte | Token::True | Token::False => Tag::Byte,
            Token::Short => Tag::Short,
            Token::Int => Tag::Int,
            Token::Long => Tag::Long,
            Token::Float => Tag::Float,
            Token::Double => Tag::Double,
            Token::StartByteArray => Tag::ByteArray,
            Token::String => Tag::String,
            Token::StartList => Tag::List,
            Token::StartCompound => Tag::Compound,
            Token::StartIntArray => Tag::IntArray,
            Token::StartLongArray => Tag::LongArray,
            Token::None | Token::Name | Token::EndArray | Token::UnknownPayload => return None,
        })
    }
}

/// A set of tags, as accepted or produced by a converter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TagSet(u16);

impl TagSet {
    pub const EMPTY: TagSet = TagSet(0);

    /// Every tag a value can have, i.e. everything but `End`.
    pub const ALL: TagSet = TagSet(0x1ffe);

    pub const INTEGERS: TagSet = TagSet::of(&[Tag::Byte, Tag::Short, Tag::Int, Tag::Long]);

    pub const NUMBERS: TagSet = TagSet::of(&[
        Tag::Byte,
        Tag::Short,
        Tag::Int,
        Tag::Long,
        Tag::Float,
        Tag::Double,
    ]);

    pub const fn of(tags: &[Tag]) -> TagSet {
        let mut bits = 0u16;
        let mut i = 0;
        while i < tags.len() {
            bits |= 1 << tags[i] as u8;
            i += 1;
        }
        TagSet(bits)
    }

    pub const fn single(tag: Tag) -> TagSet {
        TagSet(1 << tag as u8)
    }

    pub const fn union(self, other: TagSet) -> TagSet {
        TagSet(self.0 | other.0)
    }

    pub fn contains(self, tag: Tag) -> bool {
        self.0 & (1 << tag as u8) != 0
    }

    pub fn is_superset(self, other: TagSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The numeric tags that convert to `target` without loss.
    pub fn widening_to(target: Tag) -> TagSet {
        TagSet::NUMBERS
            .iter()
            .filter(|tag| tag.widens_to(target))
            .fold(TagSet::EMPTY, |set, tag| set.union(TagSet::single(tag)))
    }

    pub fn iter(self) -> impl Iterator<Item = Tag> {
        (0u8..=12)
            .filter(move |b| self.0 & (1 << b) != 0)
            .filter_map(|b| Tag::try_from(b).ok())
    }
}

impl fmt::Debug for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
