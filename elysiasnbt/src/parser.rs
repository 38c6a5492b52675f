//! Classification of unquoted literals.
//!
//! A bare word is tried as each kind of number in a fixed order, then as a
//! boolean, and is a string if nothing matches:
//!
//! `1.5f` float, `3b` byte, `9L` long, `2s` short, `7` int, `0.5` or `0.5d`
//! double, `true`/`false` in any case.
//!
//! Integer literals with a zero-padded magnitude such as `007b` are not
//! numbers; only `0` itself may start with a zero.
//!
//! `inf`, `infinity` and `nan` are taken in any case and with an optional
//! sign, beyond the usual `Infinity` and `NaN`, so that the `inf` and `NaN`
//! the writer produces read back. `-inff` is a negative infinite float.
use elysianbt::{Payload, Token};
use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case},
    character::complete::{char, digit0, digit1, one_of},
    combinator::{all_consuming, map_res, opt, recognize, value},
    sequence::{pair, terminated, tuple},
    IResult,
};

/// The token and payload a bare word reads as. Strings come back with
/// `Payload::None`.
pub(crate) fn classify(word: &str) -> (Token, Payload) {
    if let Some(v) = whole(parse_f32, word) {
        (Token::Float, Payload::Float(v))
    } else if let Some(v) = whole(parse_i8, word) {
        (Token::Byte, Payload::Byte(v))
    } else if let Some(v) = whole(parse_i64, word) {
        (Token::Long, Payload::Long(v))
    } else if let Some(v) = whole(parse_i16, word) {
        (Token::Short, Payload::Short(v))
    } else if let Some(v) = whole(parse_i32, word) {
        (Token::Int, Payload::Int(v))
    } else if let Some(v) = whole(parse_f64, word) {
        (Token::Double, Payload::Double(v))
    } else {
        match whole(parse_bool, word) {
            Some(true) => (Token::True, Payload::Byte(1)),
            Some(false) => (Token::False, Payload::Byte(0)),
            None => (Token::String, Payload::None),
        }
    }
}

/// Characters allowed in a bare word.
pub(crate) fn is_unquoted(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'_' | b'-' | b'.' | b'+')
}

/// Characters that end a bare word.
pub(crate) fn is_separator(c: u8) -> bool {
    c.is_ascii_whitespace() || matches!(c, b':' | b',' | b'}' | b']')
}

fn whole<'a, O>(parser: impl FnMut(&'a str) -> IResult<&'a str, O>, word: &'a str) -> Option<O> {
    all_consuming(parser)(word).ok().map(|(_, v)| v)
}

fn parse_bool(input: &str) -> IResult<&str, bool> {
    alt((
        value(true, tag_no_case("true")),
        value(false, tag_no_case("false")),
    ))(input)
}

fn parse_i8(input: &str) -> IResult<&str, i8> {
    map_res(terminated(decimal, one_of("bB")), |s: &str| s.parse())(input)
}

fn parse_i16(input: &str) -> IResult<&str, i16> {
    map_res(terminated(decimal, one_of("sS")), |s: &str| s.parse())(input)
}

fn parse_i32(input: &str) -> IResult<&str, i32> {
    map_res(decimal, |s: &str| s.parse())(input)
}

fn parse_i64(input: &str) -> IResult<&str, i64> {
    map_res(terminated(decimal, one_of("lL")), |s: &str| s.parse())(input)
}

fn parse_f32(input: &str) -> IResult<&str, f32> {
    map_res(terminated(float, one_of("fF")), |s: &str| s.parse())(input)
}

fn parse_f64(input: &str) -> IResult<&str, f64> {
    map_res(terminated(float, opt(one_of("dD"))), |s: &str| s.parse())(input)
}

fn float(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        opt(one_of("+-")),
        alt((
            tag_no_case("infinity"),
            tag_no_case("inf"),
            tag_no_case("nan"),
            recognize(pair(
                alt((
                    recognize(pair(digit1, opt(pair(char('.'), digit0)))),
                    recognize(pair(char('.'), digit1)),
                )),
                opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
            )),
        )),
    ))(input)
}

// parse a single 0 OR a non-zero digit followed by 0 or more digits
fn decimal(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        opt(one_of("+-")),
        alt((recognize(pair(one_of("123456789"), digit0)), tag("0"))),
    ))(input)
}
