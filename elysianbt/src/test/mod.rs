use std::convert::TryFrom;

use crate::{Tag, TagSet, Token};


mod compress;
mod object;
mod writer;

macro_rules! check_tags {
    {$($tag:ident = $val:literal),* $(,)?} => {
        $(
            assert_eq!(u8::from(Tag::$tag), $val);
        )*
    };
}

#[test]
fn exhaustive_tag_check() {
    check_tags! {
        End = 0,
        Byte = 1,
        Short = 2,
        Int = 3,
        Long = 4,
        Float = 5,
        Double = 6,
        ByteArray = 7,
        String = 8,
        List = 9,
        Compound = 10,
        IntArray = 11,
        LongArray = 12,
    }

    for value in 13..=u8::MAX {
        assert!(Tag::try_from(value).is_err())
    }
}

#[test]
fn tag_and_token_agree() {
    for value in 0..=12u8 {
        let tag = Tag::try_from(value).unwrap();
        assert_eq!(tag.token().tag(), Some(tag));
    }
    assert_eq!(Token::True.tag(), Some(Tag::Byte));
    assert_eq!(Token::False.tag(), Some(Tag::Byte));
    assert_eq!(Token::Name.tag(), None);
    assert_eq!(Token::EndArray.tag(), None);
    assert_eq!(Token::None.tag(), None);
}

#[test]
fn tag_sets() {
    assert!(TagSet::INTEGERS.contains(Tag::Long));
    assert!(!TagSet::INTEGERS.contains(Tag::Float));
    assert!(TagSet::NUMBERS.is_superset(TagSet::INTEGERS));
    assert!(!TagSet::ALL.contains(Tag::End));
    assert_eq!(TagSet::ALL.iter().count(), 12);
    assert!(TagSet::EMPTY.is_empty());

    let set = TagSet::single(Tag::List).union(TagSet::single(Tag::IntArray));
    assert_eq!(set.iter().collect::<Vec<_>>(), vec![Tag::List, Tag::IntArray]);
    assert_eq!(format!("{:?}", set), "{List, IntArray}");
}
