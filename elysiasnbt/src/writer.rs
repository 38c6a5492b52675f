use std::io::Write;

use elysianbt::{
    error::{Error, Result},
    stream::WriterState,
    NbtOptions, NbtWrite, Tag, Token,
};
use tracing::trace;

use crate::{
    options::{QuotePolicy, StringOptions},
    parser::{classify, is_unquoted},
};

#[derive(Debug)]
struct Frame {
    /// `Compound`, `List` or one of the array tags.
    kind: Tag,
    element: Option<Tag>,
    len: Option<usize>,
    /// Entries or elements written so far.
    count: usize,
}

/// Emitter for SNBT.
///
/// The text form has no lengths or tag bytes to patch, so any sink will do
/// and nothing has to be known up front. Lists still hold a single tag and
/// a declared length must match what is written, as in the binary form.
///
/// ```
/// use elysiasnbt::{SnbtWriter, StringOptions};
/// use elysianbt::{NbtWrite, Tag};
///
/// let mut out = Vec::new();
/// let mut writer = SnbtWriter::new(&mut out, StringOptions::default());
/// writer.write_start_compound()?;
/// writer.write_name("Pos", Some(Tag::List))?;
/// writer.write_start_list(None, None)?;
/// writer.write_f64(0.5)?;
/// writer.write_f64(64.0)?;
/// writer.write_end_array()?;
/// writer.write_end_compound()?;
///
/// assert_eq!(out, b"{Pos:[0.5d,64.0d]}");
/// # Ok::<(), elysianbt::error::Error>(())
/// ```
pub struct SnbtWriter<W> {
    out: W,
    options: StringOptions,
    generic: NbtOptions,
    state: WriterState,
    frames: Vec<Frame>,
    position: u64,
}

impl<W: Write> SnbtWriter<W> {
    pub fn new(writer: W, options: StringOptions) -> Self {
        let generic = options.generic();
        let state = if generic.has_root_name {
            WriterState::WritingName
        } else {
            WriterState::WritingPayload
        };
        Self {
            out: writer,
            options,
            generic,
            state,
            frames: Vec::with_capacity(generic.max_depth.min(64)),
            position: 0,
        }
    }

    pub fn string_options(&self) -> &StringOptions {
        &self.options
    }

    /// Consumes the writer, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn set_state(&mut self, state: WriterState) {
        if self.state != state {
            trace!("Switching to state {:?}.", state);
            self.state = state;
        }
    }

    fn raw(&mut self, s: &str) -> Result<()> {
        self.out.write_all(s.as_bytes())?;
        self.position += s.len() as u64;
        Ok(())
    }

    fn line_break(&mut self, depth: usize) -> Result<()> {
        let mut text = self.options.new_line.clone();
        for _ in 0..self.options.indent * depth {
            text.push_str(&self.options.indent_unit);
        }
        self.raw(&text)
    }

    /// Punctuation in front of the `count`th entry or element of the
    /// innermost container.
    fn separate(&mut self, count: usize) -> Result<()> {
        if count > 1 {
            self.raw(",")?;
        }
        if self.options.is_multiline() {
            self.line_break(self.frames.len())
        } else if count > 1 && self.options.comma_space {
            self.raw(" ")
        } else {
            Ok(())
        }
    }

    fn check_depth(&self) -> Result<()> {
        if self.frames.len() >= self.generic.max_depth {
            return Err(Error::unsupported(format!(
                "nesting exceeds the maximum depth of {}",
                self.generic.max_depth
            )));
        }
        Ok(())
    }

    fn begin_value(&mut self, tag: Tag) -> Result<()> {
        match self.state {
            WriterState::WritingPayload => {}
            WriterState::WritingName => {
                return Err(Error::unsupported(format!(
                    "{:?} written where an entry name was expected",
                    tag
                )))
            }
            WriterState::Stopped => {
                return Err(Error::unsupported("the document is already complete"))
            }
        }

        let count = match self.frames.last_mut() {
            Some(frame) if frame.kind != Tag::Compound => {
                if let Some(len) = frame.len.filter(|len| frame.count >= *len) {
                    return Err(Error::unsupported(format!(
                        "{:?} has more elements than the {} declared",
                        frame.kind, len
                    )));
                }
                match frame.element {
                    Some(element) if element != tag => {
                        return Err(Error::unsupported(format!(
                            "{:?} of {:?} cannot hold {:?}",
                            frame.kind, element, tag
                        )))
                    }
                    Some(_) => {}
                    None => frame.element = Some(tag),
                }
                frame.count += 1;
                frame.count
            }
            _ => return Ok(()),
        };
        self.separate(count)
    }

    fn end_value(&mut self) {
        let next = match self.frames.last() {
            Some(frame) if frame.kind == Tag::Compound => WriterState::WritingName,
            Some(_) => WriterState::WritingPayload,
            None => WriterState::Stopped,
        };
        self.set_state(next);
    }

    fn scalar(&mut self, tag: Tag, text: &str, suffix: &str) -> Result<()> {
        self.begin_value(tag)?;
        self.raw(text)?;
        self.raw(suffix)?;
        self.end_value();
        Ok(())
    }

    fn open(&mut self, kind: Tag, element: Option<Tag>, len: Option<usize>, bracket: &str) -> Result<()> {
        self.check_depth()?;
        self.begin_value(kind)?;
        self.raw(bracket)?;
        self.frames.push(Frame {
            kind,
            element,
            len,
            count: 0,
        });
        let next = if kind == Tag::Compound {
            WriterState::WritingName
        } else {
            WriterState::WritingPayload
        };
        self.set_state(next);
        Ok(())
    }

    fn close(&mut self, bracket: &str) -> Result<()> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| Error::unsupported("no container to close here"))?;
        if frame.count > 0 && self.options.is_multiline() {
            self.line_break(self.frames.len())?;
        }
        self.raw(bracket)?;
        self.end_value();
        Ok(())
    }

    fn quoted(&mut self, s: &str, policy: QuotePolicy, is_name: bool) -> Result<()> {
        let quote = match select_quote(s, policy, is_name) {
            Some(quote) => quote,
            None => return self.raw(s),
        };
        let mut text = String::with_capacity(s.len() + 2);
        text.push(quote);
        for c in s.chars() {
            if c == '\\' || c == quote {
                text.push('\\');
            }
            text.push(c);
        }
        text.push(quote);
        self.raw(&text)
    }
}

/// The quote character for `s`, or `None` to leave it bare.
pub(crate) fn select_quote(s: &str, policy: QuotePolicy, is_name: bool) -> Option<char> {
    let has_single = s.contains('\'');
    let has_double = s.contains('"');
    let default = if has_double && !has_single { '\'' } else { '"' };
    match policy {
        QuotePolicy::Default => Some(default),
        QuotePolicy::DefaultWithNoQuote => {
            let bare = !s.is_empty()
                && s.bytes().all(is_unquoted)
                && (is_name || classify(s).0 == Token::String);
            (!bare).then_some(default)
        }
        QuotePolicy::Shorter => {
            let singles = s.matches('\'').count();
            let doubles = s.matches('"').count();
            Some(if doubles > singles { '\'' } else { '"' })
        }
        QuotePolicy::ForceSingle => Some('\''),
        QuotePolicy::ForceDouble => Some('"'),
    }
}

impl<W: Write> NbtWrite for SnbtWriter<W> {
    fn options(&self) -> &NbtOptions {
        &self.generic
    }

    fn state(&self) -> WriterState {
        self.state
    }

    fn depth(&self) -> usize {
        self.frames.len()
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn is_in_array(&self) -> bool {
        self.frames.last().map_or(false, |f| f.kind != Tag::Compound)
    }

    fn requires_length_info(&self) -> bool {
        false
    }

    fn write_name(&mut self, name: &str, _tag: Option<Tag>) -> Result<()> {
        match self.state {
            WriterState::WritingName => {}
            WriterState::WritingPayload if self.is_in_array() => {
                return Err(Error::unsupported("names cannot be written inside a list"))
            }
            WriterState::WritingPayload => {
                return Err(Error::unsupported(
                    "name written where a value was expected",
                ))
            }
            WriterState::Stopped => {
                return Err(Error::unsupported("the document is already complete"))
            }
        }

        if let Some(frame) = self.frames.last_mut() {
            frame.count += 1;
            let count = frame.count;
            self.separate(count)?;
        }
        self.quoted(name, self.options.name_quotes, true)?;
        self.raw(if self.options.colon_space { ": " } else { ":" })?;
        self.set_state(WriterState::WritingPayload);
        Ok(())
    }

    fn write_start_compound(&mut self) -> Result<()> {
        self.open(Tag::Compound, None, None, "{")
    }

    fn write_end_compound(&mut self) -> Result<()> {
        if self.frames.is_empty() || self.is_in_array() || self.state != WriterState::WritingName {
            return Err(Error::unsupported("no compound entry list to close here"));
        }
        self.close("}")
    }

    fn write_start_list(&mut self, element: Option<Tag>, len: Option<usize>) -> Result<()> {
        self.open(Tag::List, element, len, "[")
    }

    fn write_start_array(&mut self, kind: Tag, len: Option<usize>) -> Result<()> {
        let (element, bracket) = match kind {
            Tag::ByteArray => (Tag::Byte, "[B;"),
            Tag::IntArray => (Tag::Int, "[I;"),
            Tag::LongArray => (Tag::Long, "[L;"),
            other => {
                return Err(Error::unsupported(format!(
                    "{:?} is not an array tag",
                    other
                )))
            }
        };
        self.open(kind, Some(element), len, bracket)
    }

    fn write_end_array(&mut self) -> Result<()> {
        let frame = match self.frames.last() {
            Some(frame) if frame.kind != Tag::Compound => frame,
            _ => return Err(Error::unsupported("no list or array to close here")),
        };
        if let Some(len) = frame.len {
            if len != frame.count {
                return Err(Error::unsupported(format!(
                    "{:?} declared {} elements but {} were written",
                    frame.kind, len, frame.count
                )));
            }
        }
        self.close("]")
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.scalar(Tag::Byte, if v { "true" } else { "false" }, "")
    }

    fn write_i8(&mut self, v: i8) -> Result<()> {
        self.scalar(Tag::Byte, itoa::Buffer::new().format(v), "b")
    }

    fn write_i16(&mut self, v: i16) -> Result<()> {
        self.scalar(Tag::Short, itoa::Buffer::new().format(v), "s")
    }

    fn write_i32(&mut self, v: i32) -> Result<()> {
        self.scalar(Tag::Int, itoa::Buffer::new().format(v), "")
    }

    fn write_i64(&mut self, v: i64) -> Result<()> {
        self.scalar(Tag::Long, itoa::Buffer::new().format(v), "L")
    }

    fn write_f32(&mut self, v: f32) -> Result<()> {
        self.scalar(Tag::Float, ryu::Buffer::new().format(v), "f")
    }

    fn write_f64(&mut self, v: f64) -> Result<()> {
        self.scalar(Tag::Double, ryu::Buffer::new().format(v), "d")
    }

    fn write_str(&mut self, v: &str) -> Result<()> {
        self.begin_value(Tag::String)?;
        self.quoted(v, self.options.payload_quotes, false)?;
        self.end_value();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(self.out.flush()?)
    }
}
