use std::io::Cursor;

use super::builder::Builder;
use crate::{
    error::{ErrorKind, Result},
    stream::WriterState,
    BinaryOptions, BinaryWriter, NbtWrite, Tag,
};

fn seekable(options: BinaryOptions) -> BinaryWriter<crate::output::Seekable<Cursor<Vec<u8>>>> {
    BinaryWriter::new(Cursor::new(Vec::new()), options).unwrap()
}

fn open_root(writer: &mut impl NbtWrite) -> Result<()> {
    if writer.options().has_root_name {
        writer.write_name("", Some(Tag::Compound))?;
    }
    writer.write_start_compound()
}

#[test]
fn tags_and_lengths_are_patched() -> Result<()> {
    let mut writer = seekable(BinaryOptions::java());
    open_root(&mut writer)?;
    writer.write_name("xs", None)?;
    writer.write_start_list(None, None)?;
    writer.write_i32(1)?;
    writer.write_i32(2)?;
    writer.write_end_array()?;
    writer.write_end_compound()?;
    assert_eq!(writer.state(), WriterState::Stopped);

    let expected = Builder::new()
        .start_compound("")
        .start_list("xs", Tag::Int, 2)
        .int_payload(1)
        .int_payload(2)
        .end_compound()
        .build();
    assert_eq!(writer.into_inner().into_inner(), expected);
    Ok(())
}

#[test]
fn empty_list_of_unknown_element_is_end() -> Result<()> {
    let mut writer = seekable(BinaryOptions::java());
    open_root(&mut writer)?;
    writer.write_name("e", Some(Tag::List))?;
    writer.write_start_list(None, None)?;
    writer.write_end_array()?;
    writer.write_end_compound()?;

    let expected = Builder::new()
        .start_compound("")
        .start_list("e", Tag::End, 0)
        .end_compound()
        .build();
    assert_eq!(writer.into_inner().into_inner(), expected);
    Ok(())
}

#[test]
fn arrays_and_nested_compounds() -> Result<()> {
    let mut writer = seekable(BinaryOptions::java());
    open_root(&mut writer)?;
    writer.write_name("bytes", Some(Tag::ByteArray))?;
    writer.write_byte_array(&[1, -1])?;
    writer.write_name("longs", Some(Tag::LongArray))?;
    writer.write_start_long_array(None)?;
    writer.write_i64(7)?;
    writer.write_end_array()?;
    writer.write_name("inner", None)?;
    writer.write_start_compound()?;
    assert_eq!(writer.depth(), 2);
    writer.write_name("s", Some(Tag::String))?;
    writer.write_str("hi")?;
    writer.write_end_compound()?;
    writer.write_end_compound()?;

    let expected = Builder::new()
        .start_compound("")
        .byte_array("bytes", &[1, -1])
        .long_array("longs", &[7])
        .start_compound("inner")
        .string("s", "hi")
        .end_compound()
        .end_compound()
        .build();
    assert_eq!(writer.into_inner().into_inner(), expected);
    Ok(())
}

#[test]
fn bedrock_layouts() -> Result<()> {
    for options in [BinaryOptions::bedrock(), BinaryOptions::bedrock_network()] {
        let mut writer = seekable(options);
        open_root(&mut writer)?;
        writer.write_name("i", Some(Tag::Int))?;
        writer.write_i32(-4)?;
        writer.write_name("l", Some(Tag::List))?;
        writer.write_start_list(Some(Tag::Short), Some(1))?;
        writer.write_i16(0x0102)?;
        writer.write_end_array()?;
        writer.write_end_compound()?;

        let builder = Builder::for_options(&options);
        let builder = if options.generic.has_root_name {
            builder.start_compound("")
        } else {
            builder.tag(Tag::Compound)
        };
        let expected = builder
            .int("i", -4)
            .start_list("l", Tag::Short, 1)
            .short_payload(0x0102)
            .end_compound()
            .build();
        assert_eq!(writer.into_inner().into_inner(), expected);
    }
    Ok(())
}

#[test]
fn forward_only_needs_tags_up_front() -> Result<()> {
    let mut writer = BinaryWriter::forward_only(Vec::new(), BinaryOptions::java())?;
    open_root(&mut writer)?;
    let err = writer.write_name("x", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    // Nothing of the refused entry reached the sink.
    assert_eq!(writer.into_inner(), [0x0a, 0x00, 0x00]);
    Ok(())
}

#[test]
fn forward_only_needs_lengths_up_front() -> Result<()> {
    let mut writer = BinaryWriter::forward_only(Vec::new(), BinaryOptions::java())?;
    assert!(writer.requires_length_info());
    open_root(&mut writer)?;
    writer.write_name("l", Some(Tag::List))?;
    let err = writer.write_start_list(Some(Tag::Int), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);

    let err = writer.write_start_list(None, Some(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);

    writer.write_start_list(Some(Tag::Int), Some(1))?;
    writer.write_i32(3)?;
    writer.write_end_array()?;
    writer.write_end_compound()?;

    let expected = Builder::new()
        .start_compound("")
        .start_list("l", Tag::Int, 1)
        .int_payload(3)
        .end_compound()
        .build();
    assert_eq!(writer.into_inner(), expected);
    Ok(())
}

#[test]
fn forward_only_writes_empty_lists() -> Result<()> {
    let mut writer = BinaryWriter::forward_only(Vec::new(), BinaryOptions::java())?;
    open_root(&mut writer)?;
    writer.write_name("e", Some(Tag::List))?;
    writer.write_start_list(None, Some(0))?;
    writer.write_end_array()?;
    writer.write_end_compound()?;

    let expected = Builder::new()
        .start_compound("")
        .start_list("e", Tag::End, 0)
        .end_compound()
        .build();
    assert_eq!(writer.into_inner(), expected);
    Ok(())
}

#[test]
fn varint_lengths_must_be_known() -> Result<()> {
    let mut writer = seekable(BinaryOptions::bedrock_network());
    assert!(writer.requires_length_info());
    open_root(&mut writer)?;
    writer.write_name("l", Some(Tag::List))?;
    let err = writer.write_start_list(Some(Tag::Int), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    Ok(())
}

#[test]
fn declared_tag_must_match() -> Result<()> {
    let mut writer = seekable(BinaryOptions::java());
    open_root(&mut writer)?;
    writer.write_name("x", Some(Tag::Int))?;
    let err = writer.write_i16(1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    Ok(())
}

#[test]
fn declared_length_must_match() -> Result<()> {
    let mut writer = seekable(BinaryOptions::java());
    open_root(&mut writer)?;
    writer.write_name("short", Some(Tag::List))?;
    writer.write_start_list(Some(Tag::Int), Some(2))?;
    writer.write_i32(1)?;
    assert!(writer.write_end_array().is_err());

    let mut writer = seekable(BinaryOptions::java());
    open_root(&mut writer)?;
    writer.write_name("long", Some(Tag::IntArray))?;
    writer.write_start_int_array(Some(1))?;
    writer.write_i32(1)?;
    let err = writer.write_i32(2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    Ok(())
}

#[test]
fn lists_are_homogeneous() -> Result<()> {
    let mut writer = seekable(BinaryOptions::java());
    open_root(&mut writer)?;
    writer.write_name("l", Some(Tag::List))?;
    writer.write_start_list(None, Some(2))?;
    writer.write_i32(1)?;
    let err = writer.write_i16(2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    Ok(())
}

#[test]
fn names_belong_in_compounds() -> Result<()> {
    let mut writer = seekable(BinaryOptions::java());
    open_root(&mut writer)?;
    writer.write_name("l", Some(Tag::List))?;
    writer.write_start_list(Some(Tag::Compound), Some(1))?;
    assert!(writer.is_in_array());
    assert!(writer.write_name("nope", Some(Tag::Int)).is_err());

    writer.write_start_compound()?;
    assert!(!writer.is_in_array());
    assert!(writer.write_i32(1).is_err());
    Ok(())
}

#[test]
fn nothing_after_the_root() -> Result<()> {
    let mut writer = seekable(BinaryOptions::java());
    open_root(&mut writer)?;
    writer.write_end_compound()?;
    assert_eq!(writer.state(), WriterState::Stopped);

    assert!(writer.write_i32(1).is_err());
    assert!(writer.write_name("again", Some(Tag::Int)).is_err());
    assert!(writer.write_end_compound().is_err());
    Ok(())
}

#[test]
fn nesting_is_bounded() -> Result<()> {
    let mut writer = seekable(BinaryOptions::java().with_max_depth(2));
    open_root(&mut writer)?;
    writer.write_name("a", Some(Tag::Compound))?;
    writer.write_start_compound()?;
    writer.write_name("b", Some(Tag::Compound))?;
    let err = writer.write_start_compound().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    Ok(())
}

#[test]
fn modified_utf8_names() -> Result<()> {
    let mut writer = seekable(BinaryOptions::java());
    open_root(&mut writer)?;
    writer.write_name("\u{1F600}", Some(Tag::Byte))?;
    writer.write_bool(true)?;
    writer.write_end_compound()?;

    let expected = Builder::new()
        .start_compound("")
        .byte("\u{1F600}", 1)
        .end_compound()
        .build();
    let bytes = writer.into_inner().into_inner();
    assert_eq!(bytes, expected);
    // surrogate pair, three bytes each
    assert_eq!(&bytes[4..6], &[0x00, 0x06]);
    Ok(())
}
