//! Contains the Error and Result type used throughout the codec and the
//! converter engine.
use std::fmt::Display;

use crate::Tag;

/// Various errors that can occur while reading, writing or converting NBT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    msg: String,
    kind: ErrorKind,
    offset: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed input: an invalid tag byte, an unterminated string, an
    /// unknown escape sequence, a missing separator.
    Format,

    /// The source ran out part way through a value. Distinct from `Format` so
    /// that streaming callers can tell incomplete data from bad data.
    Truncation,

    /// The caller asked for something the reader, writer or converter cannot
    /// do, e.g. writing an unknown-length list to a sink that cannot seek.
    UnsupportedOperation,

    /// The current token or value is not one the converter or getter accepts.
    TypeMismatch,

    /// Any other IO failure from the underlying source or sink.
    Io,
}

/// Convenience type for Result.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Get the kind of error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Byte offset into the source where the error was detected, if known.
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn is_truncation(&self) -> bool {
        self.kind == ErrorKind::Truncation
    }

    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            kind,
            offset: None,
        }
    }

    pub fn format(msg: impl Into<String>, offset: u64) -> Self {
        Self::new(ErrorKind::Format, msg).at(offset)
    }

    pub fn truncated(offset: u64) -> Self {
        Self::new(ErrorKind::Truncation, "unexpectedly ran out of input").at(offset)
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedOperation, msg)
    }

    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch, msg)
    }

    /// Attach the offset at which this error occurred, keeping an existing one.
    pub fn at(mut self, offset: u64) -> Self {
        self.offset.get_or_insert(offset);
        self
    }

    pub(crate) fn invalid_tag(tag: u8, offset: u64) -> Self {
        Self::format(format!("invalid nbt tag value: {}", tag), offset)
    }

    pub(crate) fn nonunicode_string(data: &[u8], offset: u64) -> Self {
        Self::format(
            format!(
                "invalid nbt string: nonunicode: {}",
                String::from_utf8_lossy(data)
            ),
            offset,
        )
    }

    pub(crate) fn unexpected_tag(expected: impl Display, found: Option<Tag>) -> Self {
        Self::type_mismatch(format!("expected {}, found {:?}", expected, found))
    }
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "{} at offset {}", self.msg, offset),
            None => f.write_str(&self.msg),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof => Self::new(ErrorKind::Truncation, e.to_string()),
            _ => Self::new(ErrorKind::Io, format!("io error: {}", e)),
        }
    }
}
