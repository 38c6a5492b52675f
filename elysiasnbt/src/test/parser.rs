use elysianbt::{Payload, Token};

use crate::parser::classify;

#[test]
fn suffixes_pick_the_tag() {
    assert_eq!(classify("5"), (Token::Int, Payload::Int(5)));
    assert_eq!(classify("5b"), (Token::Byte, Payload::Byte(5)));
    assert_eq!(classify("5B"), (Token::Byte, Payload::Byte(5)));
    assert_eq!(classify("5s"), (Token::Short, Payload::Short(5)));
    assert_eq!(classify("5L"), (Token::Long, Payload::Long(5)));
    assert_eq!(classify("5l"), (Token::Long, Payload::Long(5)));
    assert_eq!(classify("5f"), (Token::Float, Payload::Float(5.0)));
    assert_eq!(classify("5.0"), (Token::Double, Payload::Double(5.0)));
    assert_eq!(classify("5.0d"), (Token::Double, Payload::Double(5.0)));
    assert_eq!(classify("5d"), (Token::Double, Payload::Double(5.0)));
}

#[test]
fn signs_and_exponents() {
    assert_eq!(classify("-128b"), (Token::Byte, Payload::Byte(-128)));
    assert_eq!(classify("+7"), (Token::Int, Payload::Int(7)));
    assert_eq!(classify("-0b"), (Token::Byte, Payload::Byte(0)));
    assert_eq!(classify("1e3"), (Token::Double, Payload::Double(1000.0)));
    assert_eq!(classify("-2.5E-1f"), (Token::Float, Payload::Float(-0.25)));
    assert_eq!(classify(".5"), (Token::Double, Payload::Double(0.5)));
    assert_eq!(
        classify("-9223372036854775808L"),
        (Token::Long, Payload::Long(i64::MIN))
    );
}

#[test]
fn out_of_range_falls_through() {
    // Too big for an int, so it is read as a double instead.
    assert_eq!(classify("3000000000"), (Token::Double, Payload::Double(3e9)));
    assert_eq!(classify("300b"), (Token::String, Payload::None));
    assert_eq!(classify("70000s"), (Token::String, Payload::None));
}

#[test]
fn zero_padding_is_not_a_number() {
    assert_eq!(classify("0b"), (Token::Byte, Payload::Byte(0)));
    assert_eq!(classify("007b"), (Token::String, Payload::None));
    assert_eq!(classify("01L"), (Token::String, Payload::None));
    assert_eq!(classify("-05s"), (Token::String, Payload::None));
}

#[test]
fn booleans_ignore_case() {
    assert_eq!(classify("true"), (Token::True, Payload::Byte(1)));
    assert_eq!(classify("FALSE"), (Token::False, Payload::Byte(0)));
    assert_eq!(classify("True"), (Token::True, Payload::Byte(1)));
    assert_eq!(classify("truthy"), (Token::String, Payload::None));
}

#[test]
fn special_floats() {
    assert_eq!(classify("inff"), (Token::Float, Payload::Float(f32::INFINITY)));
    assert_eq!(
        classify("-inf"),
        (Token::Double, Payload::Double(f64::NEG_INFINITY))
    );
    match classify("NaNf") {
        (Token::Float, Payload::Float(v)) => assert!(v.is_nan()),
        other => panic!("{:?}", other),
    }
    assert_eq!(classify("Infinity"), (Token::Double, Payload::Double(f64::INFINITY)));
    assert_eq!(classify("-inff"), (Token::Float, Payload::Float(f32::NEG_INFINITY)));
    assert_eq!(classify("+INFINITYd"), (Token::Double, Payload::Double(f64::INFINITY)));
}

#[test]
fn everything_else_is_a_string() {
    for word in ["minecraft:stone", "stone", "a.b", "-", "+", ".", "1e", "12ab", "0x10"] {
        assert_eq!(classify(word).0, Token::String, "{}", word);
    }
}
