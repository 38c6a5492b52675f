use elysianbt::{error::ErrorKind, stream::WriterState, NbtWrite, Tag};

use crate::{
    options::{QuotePolicy, StringOptions},
    writer::select_quote,
    SnbtWriter,
};

fn text(writer: SnbtWriter<Vec<u8>>) -> String {
    String::from_utf8(writer.into_inner()).unwrap()
}

fn compact() -> SnbtWriter<Vec<u8>> {
    SnbtWriter::new(Vec::new(), StringOptions::minimal())
}

#[test]
fn compact_document() -> elysianbt::error::Result<()> {
    let mut writer = compact();
    writer.write_start_compound()?;
    writer.write_name("a", Some(Tag::Byte))?;
    writer.write_i8(1)?;
    writer.write_name("b", Some(Tag::List))?;
    writer.write_start_list(Some(Tag::Int), Some(2))?;
    writer.write_i32(1)?;
    writer.write_i32(2)?;
    writer.write_end_array()?;
    writer.write_name("c d", None)?;
    writer.write_str("x")?;
    writer.write_name("e", None)?;
    writer.write_start_compound()?;
    writer.write_end_compound()?;
    writer.write_end_compound()?;
    assert_eq!(writer.state(), WriterState::Stopped);
    assert_eq!(writer.position(), 29);
    assert_eq!(text(writer), r#"{a:1b,b:[1,2],"c d":"x",e:{}}"#);
    Ok(())
}

#[test]
fn scalars_carry_suffixes() -> elysianbt::error::Result<()> {
    let mut writer = compact();
    writer.write_start_list(None, None)?;
    writer.write_end_array()?;
    assert_eq!(text(writer), "[]");

    fn one(write: impl FnOnce(&mut SnbtWriter<Vec<u8>>) -> elysianbt::error::Result<()>) -> String {
        let mut writer = compact();
        write(&mut writer).unwrap();
        text(writer)
    }
    assert_eq!(one(|w| w.write_i8(-5)), "-5b");
    assert_eq!(one(|w| w.write_u8(200)), "-56b");
    assert_eq!(one(|w| w.write_i16(300)), "300s");
    assert_eq!(one(|w| w.write_i32(-7)), "-7");
    assert_eq!(one(|w| w.write_i64(i64::MIN)), "-9223372036854775808L");
    assert_eq!(one(|w| w.write_f32(1.5)), "1.5f");
    assert_eq!(one(|w| w.write_f32(f32::NAN)), "NaNf");
    assert_eq!(one(|w| w.write_f64(10.4)), "10.4d");
    assert_eq!(one(|w| w.write_f64(1e20)), "1e20d");
    assert_eq!(one(|w| w.write_bool(true)), "true");
    assert_eq!(one(|w| w.write_bool(false)), "false");
    Ok(())
}

#[test]
fn typed_arrays() -> elysianbt::error::Result<()> {
    let mut writer = compact();
    writer.write_start_compound()?;
    writer.write_name("b", Some(Tag::ByteArray))?;
    writer.write_byte_array(&[1, -1])?;
    writer.write_name("i", Some(Tag::IntArray))?;
    writer.write_int_array(&[])?;
    writer.write_name("l", Some(Tag::LongArray))?;
    writer.write_long_array(&[7])?;
    writer.write_end_compound()?;
    assert_eq!(text(writer), "{b:[B;1b,-1b],i:[I;],l:[L;7L]}");
    Ok(())
}

#[test]
fn spacing_without_line_breaks() -> elysianbt::error::Result<()> {
    let options = StringOptions {
        colon_space: true,
        comma_space: true,
        ..StringOptions::minimal()
    };
    let mut writer = SnbtWriter::new(Vec::new(), options);
    writer.write_start_compound()?;
    writer.write_name("a", None)?;
    writer.write_i8(1)?;
    writer.write_name("b", None)?;
    writer.write_start_list(None, None)?;
    writer.write_i32(1)?;
    writer.write_i32(2)?;
    writer.write_end_array()?;
    writer.write_end_compound()?;
    assert_eq!(text(writer), "{a: 1b, b: [1, 2]}");
    Ok(())
}

#[test]
fn pretty_document() -> elysianbt::error::Result<()> {
    let mut writer = SnbtWriter::new(Vec::new(), StringOptions::pretty());
    writer.write_start_compound()?;
    writer.write_name("name", Some(Tag::String))?;
    writer.write_str("Steve")?;
    writer.write_name("pos", Some(Tag::IntArray))?;
    writer.write_int_array(&[1, 2])?;
    writer.write_name("empty", Some(Tag::Compound))?;
    writer.write_start_compound()?;
    writer.write_end_compound()?;
    writer.write_end_compound()?;
    assert_eq!(
        text(writer),
        "{\n    name: \"Steve\",\n    pos: [I;\n        1,\n        2\n    ],\n    empty: {}\n}"
    );
    Ok(())
}

#[test]
fn root_names() -> elysianbt::error::Result<()> {
    let mut writer = SnbtWriter::new(Vec::new(), StringOptions::default().with_root_name(true));
    assert_eq!(writer.state(), WriterState::WritingName);
    writer.write_name("", Some(Tag::Compound))?;
    writer.write_start_compound()?;
    writer.write_end_compound()?;
    assert_eq!(text(writer), r#""":{}"#);
    Ok(())
}

#[test]
fn strings_are_escaped() -> elysianbt::error::Result<()> {
    let mut writer = compact();
    writer.write_str(r#"a"b'c\"#)?;
    assert_eq!(text(writer), r#""a\"b'c\\""#);

    let mut writer = compact();
    writer.write_str(r#"say "hi""#)?;
    assert_eq!(text(writer), r#"'say "hi"'"#);
    Ok(())
}

#[test]
fn quote_selection() {
    use QuotePolicy::*;
    assert_eq!(select_quote("plain", Default, false), Some('"'));
    assert_eq!(select_quote(r#"say "hi""#, Default, false), Some('\''));
    assert_eq!(select_quote(r#"it's "x""#, Default, false), Some('"'));

    assert_eq!(select_quote("Count", DefaultWithNoQuote, true), None);
    assert_eq!(select_quote("5", DefaultWithNoQuote, true), None);
    assert_eq!(select_quote("", DefaultWithNoQuote, true), Some('"'));
    assert_eq!(select_quote("a b", DefaultWithNoQuote, true), Some('"'));
    assert_eq!(select_quote(r#"a"b"#, DefaultWithNoQuote, true), Some('\''));
    // Bare payloads must read back as strings.
    assert_eq!(select_quote("stone", DefaultWithNoQuote, false), None);
    assert_eq!(select_quote("5", DefaultWithNoQuote, false), Some('"'));
    assert_eq!(select_quote("true", DefaultWithNoQuote, false), Some('"'));

    assert_eq!(select_quote(r#"a"b"c'"#, Shorter, false), Some('\''));
    assert_eq!(select_quote(r#"'a'""#, Shorter, false), Some('"'));
    assert_eq!(select_quote("x", ForceSingle, true), Some('\''));
    assert_eq!(select_quote("x", ForceDouble, true), Some('"'));
}

#[test]
fn structure_is_checked() {
    let mut writer = compact();
    writer.write_start_list(None, None).unwrap();
    let err = writer.write_name("x", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    writer.write_i32(1).unwrap();
    let err = writer.write_str("mixed").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    let err = writer.write_end_compound().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);

    let mut writer = compact();
    writer.write_start_list(Some(Tag::Int), Some(2)).unwrap();
    writer.write_i32(1).unwrap();
    let err = writer.write_end_array().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);

    let mut writer = compact();
    writer.write_start_compound().unwrap();
    let err = writer.write_i32(1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);

    let mut writer = compact();
    writer.write_i32(1).unwrap();
    let err = writer.write_i32(2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);

    let mut writer = compact();
    let err = writer.write_start_array(Tag::Int, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    assert!(!writer.requires_length_info());
}

#[test]
fn nesting_is_bounded() {
    let mut writer = SnbtWriter::new(Vec::new(), StringOptions::default().with_max_depth(2));
    writer.write_start_list(None, None).unwrap();
    writer.write_start_list(None, None).unwrap();
    assert!(writer.is_in_array());
    assert_eq!(writer.depth(), 2);
    let err = writer.write_start_compound().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
}
