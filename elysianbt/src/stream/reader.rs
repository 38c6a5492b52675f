use std::io::Read;

use tracing::trace;

use super::{NbtRead, Payload, ReaderState};
use crate::{
    error::{Error, Result},
    input::ByteSource,
    options::{BinaryOptions, NbtOptions, StringEncoding},
    Tag, Token,
};

/// An open container. Lists and arrays know how many elements are left and
/// what tag they all share; compounds have no count.
#[derive(Debug, Clone, Copy)]
struct Frame {
    remaining: Option<usize>,
    element: Tag,
}

/// Pull parser for binary NBT in any of the Java, Bedrock or network
/// variants. Does not do decompression, see [`crate::compress`] for that.
///
/// ```
/// use elysianbt::{BinaryOptions, BinaryReader, NbtRead, Token};
///
/// // A Bedrock network payload: no root name, VarInt numbers.
/// let bytes = [0x03, 0x07];
/// let mut reader = BinaryReader::new(&bytes[..], BinaryOptions::bedrock_network());
///
/// assert_eq!(reader.read()?, Token::Int);
/// assert_eq!(reader.get_i32(true)?, -4);
/// assert_eq!(reader.read()?, Token::None);
/// # Ok::<(), elysianbt::error::Error>(())
/// ```
pub struct BinaryReader<R> {
    input: ByteSource<R>,
    options: BinaryOptions,
    token: Token,
    state: ReaderState,
    frames: Vec<Frame>,
    payload: Payload,

    /// Tag announced by the last name read.
    tag: Tag,

    /// Bytes of the current name or string not yet consumed.
    pending: usize,
    content_len: Option<usize>,
    raw: Vec<u8>,
    text: String,
    decoded: bool,
}

impl<R: Read> BinaryReader<R> {
    pub fn new(reader: R, options: BinaryOptions) -> Self {
        let state = if options.generic.has_root_name {
            ReaderState::ReadingName
        } else {
            ReaderState::ReadingPayload
        };
        Self {
            input: ByteSource::new(reader, &options),
            options,
            token: Token::None,
            state,
            frames: Vec::with_capacity(options.generic.max_depth.min(64)),
            payload: Payload::None,
            tag: Tag::End,
            pending: 0,
            content_len: None,
            raw: Vec::new(),
            text: String::new(),
            decoded: false,
        }
    }

    pub fn binary_options(&self) -> &BinaryOptions {
        &self.options
    }

    /// Gets a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        self.input.get_ref()
    }

    /// Consumes this parser, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.input.into_inner()
    }

    fn set_state(&mut self, state: ReaderState) {
        if self.state != state {
            trace!("Switching to state {:?}.", state);
            self.state = state;
        }
    }

    fn stop(&mut self) -> Token {
        self.set_state(ReaderState::Stopped);
        Token::None
    }

    /// A value just finished: inside a list the next thing is another bare
    /// value, anywhere else a name (or the end of the document).
    fn after_value(&mut self) {
        match self.frames.last() {
            Some(Frame {
                remaining: Some(_), ..
            }) => self.set_state(ReaderState::ReadingPayload),
            _ => self.set_state(ReaderState::ReadingName),
        }
    }

    fn push(&mut self, frame: Frame) -> Result<()> {
        if self.frames.len() >= self.options.generic.max_depth {
            return Err(Error::format(
                format!(
                    "nesting exceeds the maximum depth of {}",
                    self.options.generic.max_depth
                ),
                self.input.position(),
            ));
        }
        self.frames.push(frame);
        Ok(())
    }

    fn read_name(&mut self) -> Result<Token> {
        let tag = if self.frames.is_empty() {
            if !self.options.generic.has_root_name {
                return Ok(self.stop());
            }
            match self.input.try_tag()? {
                Some(tag) => tag,
                None => return Ok(self.stop()),
            }
        } else {
            self.input.tag()?
        };

        if tag == Tag::End {
            if self.frames.pop().is_none() {
                // Padding after the last root tag.
                return Ok(self.stop());
            }
            self.after_value();
            return Ok(Token::EndCompound);
        }

        self.tag = tag;
        self.pending = self.input.string_len()?;
        self.content_len = Some(self.pending);
        self.set_state(ReaderState::ReadingPayload);
        Ok(Token::Name)
    }

    fn read_payload(&mut self) -> Result<Token> {
        let tag = match self.frames.last_mut() {
            Some(Frame {
                remaining: Some(remaining),
                element,
            }) => {
                if *remaining == 0 || *element == Tag::End {
                    self.frames.pop();
                    self.after_value();
                    return Ok(Token::EndArray);
                }
                *remaining -= 1;
                *element
            }
            None if !self.options.generic.has_root_name => match self.input.try_tag()? {
                Some(Tag::End) | None => return Ok(self.stop()),
                Some(tag) => tag,
            },
            _ => self.tag,
        };
        self.read_value(tag)
    }

    fn read_value(&mut self, tag: Tag) -> Result<Token> {
        let token = match tag {
            Tag::End => {
                return Err(Error::format(
                    "end tag cannot be a value",
                    self.input.position(),
                ))
            }
            Tag::Byte => {
                self.payload = Payload::Byte(self.input.i8()?);
                Token::Byte
            }
            Tag::Short => {
                self.payload = Payload::Short(self.input.i16()?);
                Token::Short
            }
            Tag::Int => {
                self.payload = Payload::Int(self.input.i32()?);
                Token::Int
            }
            Tag::Long => {
                self.payload = Payload::Long(self.input.i64()?);
                Token::Long
            }
            Tag::Float => {
                self.payload = Payload::Float(self.input.f32()?);
                Token::Float
            }
            Tag::Double => {
                self.payload = Payload::Double(self.input.f64()?);
                Token::Double
            }
            Tag::String => {
                self.pending = self.input.string_len()?;
                self.content_len = Some(self.pending);
                Token::String
            }
            Tag::ByteArray | Tag::IntArray | Tag::LongArray => {
                let element = match tag {
                    Tag::ByteArray => Tag::Byte,
                    Tag::IntArray => Tag::Int,
                    _ => Tag::Long,
                };
                let len = self.input.array_len()?;
                self.push(Frame {
                    remaining: Some(len),
                    element,
                })?;
                self.content_len = Some(len);
                self.set_state(ReaderState::ReadingPayload);
                return Ok(tag.token());
            }
            Tag::List => {
                let element = self.input.tag()?;
                let len = self.input.array_len()?;
                self.push(Frame {
                    remaining: Some(len),
                    element,
                })?;
                self.content_len = Some(len);
                self.set_state(ReaderState::ReadingPayload);
                return Ok(Token::StartList);
            }
            Tag::Compound => {
                self.push(Frame {
                    remaining: None,
                    element: Tag::End,
                })?;
                self.set_state(ReaderState::ReadingName);
                return Ok(Token::StartCompound);
            }
        };
        self.after_value();
        Ok(token)
    }
}

impl<R: Read> NbtRead for BinaryReader<R> {
    fn options(&self) -> &NbtOptions {
        &self.options.generic
    }

    fn token(&self) -> Token {
        self.token
    }

    fn state(&self) -> ReaderState {
        self.state
    }

    fn depth(&self) -> usize {
        self.frames.len()
    }

    fn content_len(&self) -> Option<usize> {
        self.content_len
    }

    fn position(&self) -> u64 {
        self.input.position()
    }

    fn payload(&self) -> Payload {
        self.payload
    }

    fn read(&mut self) -> Result<Token> {
        self.skip()?;
        self.payload = Payload::None;
        self.content_len = None;
        self.decoded = false;

        let token = match self.state {
            ReaderState::Stopped => Token::None,
            ReaderState::ReadingName => self.read_name()?,
            ReaderState::ReadingPayload => self.read_payload()?,
        };
        self.token = token;
        Ok(token)
    }

    fn get_str(&mut self) -> Result<&str> {
        match self.token {
            Token::Name | Token::String => {
                if !self.decoded {
                    let at = self.input.position();
                    let n = std::mem::take(&mut self.pending);
                    self.raw.clear();
                    self.input.read_into(n, &mut self.raw)?;

                    self.text.clear();
                    match self.options.string_encoding {
                        StringEncoding::ModifiedUtf8 => {
                            let s = cesu8::from_java_cesu8(&self.raw)
                                .map_err(|_| Error::nonunicode_string(&self.raw, at))?;
                            self.text.push_str(&s);
                        }
                        StringEncoding::Utf8 => {
                            let s = std::str::from_utf8(&self.raw)
                                .map_err(|_| Error::nonunicode_string(&self.raw, at))?;
                            self.text.push_str(s);
                        }
                    }
                    self.decoded = true;
                }
            }
            token if self.payload != Payload::None => {
                debug_assert!(token.tag().is_some());
                self.text = self.payload.to_string();
                self.decoded = true;
            }
            token => return Err(Error::unexpected_tag("a string", token.tag())),
        }
        Ok(&self.text)
    }

    fn skip(&mut self) -> Result<()> {
        if self.pending > 0 {
            let n = std::mem::take(&mut self.pending);
            self.input.skip(n)?;
        }
        Ok(())
    }
}
