use std::io::Write;

use flate2::{
    write::{GzEncoder, ZlibEncoder},
    Compression as Level,
};

use super::builder::Builder;
use crate::{
    compress::{decode_bytes, detect, Compression},
    de::{from_bytes, from_reader},
    error::Result,
    BinaryOptions, Context, Value,
};

fn document() -> Vec<u8> {
    Builder::new()
        .start_compound("")
        .string("LevelName", "New World")
        .long("RandomSeed", 42)
        .end_compound()
        .build()
}

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Level::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

fn zlib(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Level::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

fn check(level: &Value) {
    assert_eq!(level.get("LevelName").and_then(Value::as_str), Some("New World"));
    assert_eq!(level.get("RandomSeed").and_then(Value::as_i64), Some(42));
}

#[test]
fn detection() {
    assert_eq!(detect(&gzip(b"x")), Compression::Gzip);
    assert_eq!(detect(&zlib(b"x")), Compression::Zlib);
    assert_eq!(detect(&document()), Compression::None);
    assert_eq!(detect(&[]), Compression::None);
    assert_eq!(detect(&[0x1f]), Compression::None);
}

#[test]
fn uncompressed_bytes_are_borrowed() -> Result<()> {
    let doc = document();
    assert!(matches!(decode_bytes(&doc)?, std::borrow::Cow::Borrowed(_)));
    assert_eq!(decode_bytes(&gzip(&doc))?.as_ref(), doc.as_slice());
    assert_eq!(decode_bytes(&zlib(&doc))?.as_ref(), doc.as_slice());
    Ok(())
}

#[test]
fn from_compressed_bytes() -> Result<()> {
    let doc = document();
    check(&from_bytes(&doc)?);
    check(&from_bytes(&gzip(&doc))?);
    check(&from_bytes(&zlib(&doc))?);
    Ok(())
}

#[test]
fn from_compressed_readers() -> Result<()> {
    let doc = document();
    let ctx = Context::global();
    let options = BinaryOptions::java();
    for bytes in [doc.clone(), gzip(&doc), zlib(&doc)] {
        let level: Value = from_reader(bytes.as_slice(), &options, ctx)?;
        check(&level);
    }
    Ok(())
}

#[test]
fn corrupt_streams_fail() {
    let mut bytes = gzip(&document());
    let len = bytes.len();
    bytes.truncate(len / 2);
    assert!(from_bytes::<Value>(&bytes).is_err());

    let bytes = [0x78, 0x9c, 0xff, 0xff, 0xff];
    assert!(from_bytes::<Value>(&bytes).is_err());
}
