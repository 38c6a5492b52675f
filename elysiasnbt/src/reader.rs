use elysianbt::{
    error::{Error, Result},
    stream::ReaderState,
    NbtOptions, NbtRead, Payload, Tag, Token,
};
use tracing::trace;

use crate::{
    options::StringOptions,
    parser::{classify, is_separator, is_unquoted},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Compound,
    /// Element tag, once the first element has been seen.
    List(Option<Tag>),
    /// One of the typed arrays.
    Array(Tag),
}

/// A name or string whose text has not been scanned yet. The cursor sits on
/// its first character, after any opening quote.
#[derive(Debug, Clone, Copy)]
enum Pending {
    Quoted(u8),
    Bare,
}

/// Pull parser for SNBT, producing the same tokens as the binary reader.
///
/// Bare words are classified as soon as they are read, so the reader never
/// hands out `Token::UnknownPayload`. `true` and `false` come out as
/// `Token::True` and `Token::False` with a byte payload of 1 and 0.
///
/// ```
/// use elysiasnbt::{SnbtReader, StringOptions};
/// use elysianbt::{NbtRead, Token};
///
/// let mut reader = SnbtReader::new("{id: 'minecraft:dirt', Count: 64b}", StringOptions::default());
/// assert_eq!(reader.read()?, Token::StartCompound);
/// assert_eq!(reader.read()?, Token::Name);
/// assert_eq!(reader.get_str()?, "id");
/// assert_eq!(reader.read()?, Token::String);
/// assert_eq!(reader.get_str()?, "minecraft:dirt");
/// assert_eq!(reader.read()?, Token::Name);
/// assert_eq!(reader.read()?, Token::Byte);
/// assert_eq!(reader.get_i8(true)?, 64);
/// assert_eq!(reader.read()?, Token::EndCompound);
/// assert_eq!(reader.read()?, Token::None);
/// # Ok::<(), elysianbt::error::Error>(())
/// ```
pub struct SnbtReader<'a> {
    input: &'a str,
    pos: usize,
    options: NbtOptions,
    token: Token,
    state: ReaderState,
    frames: Vec<Frame>,

    /// No entry or element has been read yet in the innermost container.
    first: bool,
    payload: Payload,
    pending: Option<Pending>,
    text: String,
}

impl<'a> SnbtReader<'a> {
    pub fn new(input: &'a str, options: StringOptions) -> Self {
        let options = options.generic();
        let state = if options.has_root_name {
            ReaderState::ReadingName
        } else {
            ReaderState::ReadingPayload
        };
        Self {
            input,
            pos: 0,
            options,
            token: Token::None,
            state,
            frames: Vec::with_capacity(options.max_depth.min(64)),
            first: true,
            payload: Payload::None,
            pending: None,
            text: String::new(),
        }
    }

    /// Check that nothing but whitespace follows the document.
    pub fn finish(&mut self) -> Result<()> {
        self.skip()?;
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(Error::format("trailing input after the document", self.at()));
        }
        Ok(())
    }

    fn at(&self) -> u64 {
        self.pos as u64
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, |c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: u8) -> Result<()> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                self.skip_whitespace();
                Ok(())
            }
            Some(c) => Err(Error::format(
                format!("expected '{}', found '{}'", expected as char, c as char),
                self.at(),
            )),
            None => Err(Error::truncated(self.at())),
        }
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

    fn after_value(&mut self) {
        match self.frames.last() {
            Some(Frame::Compound) => self.set_state(ReaderState::ReadingName),
            Some(_) => self.set_state(ReaderState::ReadingPayload),
            None => self.set_state(ReaderState::Stopped),
        }
    }

    fn push(&mut self, frame: Frame) -> Result<()> {
        if self.frames.len() >= self.options.max_depth {
            return Err(Error::format(
                format!("nesting exceeds the maximum depth of {}", self.options.max_depth),
                self.at(),
            ));
        }
        self.frames.push(frame);
        self.first = true;
        Ok(())
    }

    fn pop(&mut self) {
        self.pos += 1;
        self.frames.pop();
        self.first = false;
        self.after_value();
    }

    fn read_name(&mut self) -> Result<Token> {
        self.skip_whitespace();
        if self.frames.last() == Some(&Frame::Compound) {
            if self.peek() == Some(b'}') {
                self.pop();
                return Ok(Token::EndCompound);
            }
            if !self.first {
                self.expect(b',')?;
            }
        } else if !self.options.has_root_name || self.token != Token::None {
            return Ok(self.stop());
        }
        self.first = false;

        self.pending = Some(self.open_text()?);
        self.set_state(ReaderState::ReadingPayload);
        Ok(Token::Name)
    }

    /// Start of a name or string: step over an opening quote.
    fn open_text(&mut self) -> Result<Pending> {
        match self.peek() {
            Some(q @ (b'"' | b'\'')) => {
                self.pos += 1;
                Ok(Pending::Quoted(q))
            }
            Some(c) if is_unquoted(c) => Ok(Pending::Bare),
            Some(c) => Err(Error::format(
                format!("unexpected '{}' where a name was expected", c as char),
                self.at(),
            )),
            None => Err(Error::truncated(self.at())),
        }
    }

    fn read_payload(&mut self) -> Result<Token> {
        self.skip_whitespace();
        match self.frames.last() {
            Some(Frame::List(_) | Frame::Array(_)) => {
                if self.peek() == Some(b']') {
                    self.pop();
                    return Ok(Token::EndArray);
                }
                if !self.first {
                    self.expect(b',')?;
                }
                self.first = false;
            }
            Some(Frame::Compound) => self.expect(b':')?,
            None if self.options.has_root_name => self.expect(b':')?,
            None => {}
        }

        let parent = self.frames.len();
        let token = self.read_value()?;
        if let (Some(tag), Some(i)) = (token.tag(), parent.checked_sub(1)) {
            self.check_element(i, tag)?;
        }
        Ok(token)
    }

    /// Lists hold one tag throughout, typed arrays only their own element.
    fn check_element(&mut self, frame: usize, tag: Tag) -> Result<()> {
        let at = self.at();
        match &mut self.frames[frame] {
            Frame::List(element @ None) => *element = Some(tag),
            Frame::List(Some(element)) if *element != tag => {
                return Err(Error::format(
                    format!("list of {:?} cannot hold {:?}", element, tag),
                    at,
                ))
            }
            Frame::Array(kind) if array_element(*kind) != tag => {
                return Err(Error::format(
                    format!("{:?} cannot hold {:?}", kind, tag),
                    at,
                ))
            }
            _ => {}
        }
        Ok(())
    }

    fn read_value(&mut self) -> Result<Token> {
        let input = self.input;
        let token = match self.peek() {
            None => return Err(Error::truncated(self.at())),
            Some(b'{') => {
                self.pos += 1;
                self.push(Frame::Compound)?;
                self.set_state(ReaderState::ReadingName);
                return Ok(Token::StartCompound);
            }
            Some(b'[') => {
                self.pos += 1;
                let bytes = input.as_bytes();
                let (frame, token) = match (bytes.get(self.pos), bytes.get(self.pos + 1)) {
                    (Some(kind), Some(b';')) => {
                        let array = match kind {
                            b'B' => Tag::ByteArray,
                            b'I' => Tag::IntArray,
                            b'L' => Tag::LongArray,
                            other => {
                                return Err(Error::format(
                                    format!("unknown array type '{}'", *other as char),
                                    self.at(),
                                ))
                            }
                        };
                        self.pos += 2;
                        (Frame::Array(array), array.token())
                    }
                    _ => (Frame::List(None), Token::StartList),
                };
                self.push(frame)?;
                self.set_state(ReaderState::ReadingPayload);
                return Ok(token);
            }
            Some(q @ (b'"' | b'\'')) => {
                self.pos += 1;
                self.pending = Some(Pending::Quoted(q));
                Token::String
            }
            Some(_) => self.read_word()?,
        };
        self.after_value();
        Ok(token)
    }

    fn read_word(&mut self) -> Result<Token> {
        let start = self.pos;
        self.scan_bare(false)?;
        if self.pos == start {
            let found = self.peek().map_or('?', char::from);
            return Err(Error::format(
                format!("expected a value, found '{}'", found),
                self.at(),
            ));
        }

        let word = &self.input[start..self.pos];
        let (token, payload) = classify(word);
        if token == Token::String {
            self.text.push_str(word);
        }
        self.payload = payload;
        Ok(token)
    }

    /// Move past a bare word, copying it into `text` if `keep`.
    fn scan_bare(&mut self, keep: bool) -> Result<()> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_separator(c) {
                break;
            }
            if !is_unquoted(c) {
                return Err(Error::format(
                    format!("'{}' must be quoted", c as char),
                    self.at(),
                ));
            }
            self.pos += 1;
        }
        if keep {
            self.text.push_str(&self.input[start..self.pos]);
        }
        Ok(())
    }

    /// Move past a quoted string up to and including the closing quote,
    /// unescaping it into `text` if `keep`.
    fn scan_quoted(&mut self, quote: u8, keep: bool) -> Result<()> {
        let input = self.input;
        let bytes = input.as_bytes();
        let mut start = self.pos;
        loop {
            match bytes.get(self.pos) {
                None => return Err(Error::format("unterminated string", self.at())),
                Some(b'\\') => match bytes.get(self.pos + 1) {
                    Some(&c) if c == quote || c == b'\\' => {
                        if keep {
                            self.text.push_str(&input[start..self.pos]);
                            self.text.push(c as char);
                        }
                        self.pos += 2;
                        start = self.pos;
                    }
                    Some(&c) => {
                        return Err(Error::format(
                            format!("unknown escape sequence '\\{}'", c as char),
                            self.at(),
                        ))
                    }
                    None => return Err(Error::format("unterminated string", self.at())),
                },
                Some(&c) if c == quote => {
                    if keep {
                        self.text.push_str(&input[start..self.pos]);
                    }
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn scan(&mut self, pending: Pending, keep: bool) -> Result<()> {
        match pending {
            Pending::Quoted(quote) => self.scan_quoted(quote, keep),
            Pending::Bare => self.scan_bare(keep),
        }
    }
}

fn array_element(kind: Tag) -> Tag {
    match kind {
        Tag::ByteArray => Tag::Byte,
        Tag::IntArray => Tag::Int,
        _ => Tag::Long,
    }
}

impl NbtRead for SnbtReader<'_> {
    fn options(&self) -> &NbtOptions {
        &self.options
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
        None
    }

    fn position(&self) -> u64 {
        self.at()
    }

    fn payload(&self) -> Payload {
        self.payload
    }

    fn read(&mut self) -> Result<Token> {
        self.skip()?;
        self.payload = Payload::None;
        self.text.clear();

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
                if let Some(pending) = self.pending.take() {
                    self.scan(pending, true)?;
                }
            }
            token if self.payload != Payload::None => {
                debug_assert!(token.tag().is_some());
                self.text = self.payload.to_string();
            }
            token => {
                return Err(Error::type_mismatch(format!(
                    "expected a string, found {:?}",
                    token.tag()
                )))
            }
        }
        Ok(&self.text)
    }

    fn skip(&mut self) -> Result<()> {
        match self.pending.take() {
            Some(pending) => self.scan(pending, false),
            None => Ok(()),
        }
    }
}
