use std::borrow::Cow;
use std::io::{Seek, Write};

use tracing::trace;

use super::{NbtWrite, WriterState};
use crate::{
    error::{Error, Result},
    options::{BinaryOptions, NbtOptions, StringEncoding},
    output::{ByteSink, ForwardOnly, Seekable, Sink},
    Tag,
};

#[derive(Debug)]
struct ArrayFrame {
    kind: Tag,
    element: Option<Tag>,
    /// Offset of an element tag byte still to be filled in.
    element_at: Option<u64>,
    len: Option<usize>,
    /// Offset of a length still to be filled in.
    len_at: Option<u64>,
    count: usize,
}

/// A compound (or the document root) when `array` is `None`.
#[derive(Debug, Default)]
struct Frame {
    array: Option<ArrayFrame>,
    /// Tag promised by the last `write_name`.
    declared: Option<Tag>,
    /// Offset of the tag byte of the current entry, when its name was written
    /// before its tag was known.
    pending_tag: Option<u64>,
}

/// Emitter for binary NBT in any of the Java, Bedrock or network variants.
///
/// Tags and lengths that are not known when a name or list is started are
/// written as placeholders and patched once known. That needs a sink that
/// can seek, so a writer built with [`BinaryWriter::forward_only`] refuses to
/// start such an element instead of producing bytes it cannot fix up.
///
/// ```
/// use elysianbt::{BinaryOptions, BinaryWriter, NbtWrite, Tag};
/// use std::io::Cursor;
///
/// let mut writer = BinaryWriter::new(Cursor::new(Vec::new()), BinaryOptions::java())?;
/// writer.write_name("", Some(Tag::Compound))?;
/// writer.write_start_compound()?;
/// writer.write_name("xs", Some(Tag::List))?;
/// writer.write_start_list(None, None)?; // both patched later
/// writer.write_i16(7)?;
/// writer.write_end_array()?;
/// writer.write_end_compound()?;
///
/// let bytes = writer.into_inner().into_inner();
/// assert_eq!(&bytes[8..13], &[2, 0, 0, 0, 1]);
/// # Ok::<(), elysianbt::error::Error>(())
/// ```
pub struct BinaryWriter<S> {
    out: ByteSink<S>,
    options: BinaryOptions,
    state: WriterState,
    frames: Vec<Frame>,
}

impl<W: Write + Seek> BinaryWriter<Seekable<W>> {
    pub fn new(writer: W, options: BinaryOptions) -> Result<Self> {
        Self::with_sink(Seekable(writer), options)
    }

    /// Consumes the writer, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().0
    }
}

impl<W: Write> BinaryWriter<ForwardOnly<W>> {
    /// A writer over a sink that cannot seek. Lists must be given their
    /// length up front and names their tag.
    pub fn forward_only(writer: W, options: BinaryOptions) -> Result<Self> {
        Self::with_sink(ForwardOnly(writer), options)
    }

    /// Consumes the writer, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().0
    }
}

impl<S: Sink> BinaryWriter<S> {
    pub fn with_sink(sink: S, options: BinaryOptions) -> Result<Self> {
        let state = if options.generic.has_root_name {
            WriterState::WritingName
        } else {
            WriterState::WritingPayload
        };
        let mut frames = Vec::with_capacity(options.generic.max_depth.min(64) + 1);
        frames.push(Frame::default());
        Ok(Self {
            out: ByteSink::new(sink, &options)?,
            options,
            state,
            frames,
        })
    }

    pub fn binary_options(&self) -> &BinaryOptions {
        &self.options
    }

    pub fn get_ref(&self) -> &S {
        self.out.get_ref()
    }

    fn set_state(&mut self, state: WriterState) {
        if self.state != state {
            trace!("Switching to state {:?}.", state);
            self.state = state;
        }
    }

    fn top(&mut self) -> &mut Frame {
        // The root frame is never popped.
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn check_depth(&self) -> Result<()> {
        if self.frames.len() > self.options.generic.max_depth {
            return Err(Error::unsupported(format!(
                "nesting exceeds the maximum depth of {}",
                self.options.generic.max_depth
            )));
        }
        Ok(())
    }

    fn encode<'a>(&self, s: &'a str) -> Cow<'a, [u8]> {
        match self.options.string_encoding {
            StringEncoding::ModifiedUtf8 => cesu8::to_java_cesu8(s),
            StringEncoding::Utf8 => Cow::Borrowed(s.as_bytes()),
        }
    }

    fn write_string_body(&mut self, s: &str) -> Result<()> {
        let bytes = self.encode(s);
        self.out.string_len(bytes.len())?;
        self.out.bytes(&bytes)
    }

    /// Everything that has to happen before the bytes of a value of `tag`:
    /// checks against what the enclosing frame expects, the root tag byte, and
    /// patching any tag byte left as a placeholder.
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

        let at_root = self.frames.len() == 1;
        let has_root_name = self.options.generic.has_root_name;
        let last = self.frames.len() - 1;
        let frame = &mut self.frames[last];

        if let Some(array) = &mut frame.array {
            if let Some(len) = array.len.filter(|len| array.count >= *len) {
                return Err(Error::unsupported(format!(
                    "{:?} has more elements than the {} declared",
                    array.kind, len
                )));
            }
            match array.element {
                Some(element) if element != tag => {
                    return Err(Error::unsupported(format!(
                        "{:?} of {:?} cannot hold {:?}",
                        array.kind, element, tag
                    )))
                }
                Some(_) => {}
                None => {
                    array.element = Some(tag);
                    if let Some(at) = array.element_at.take() {
                        self.out.patch_tag(at, tag)?;
                    }
                }
            }
            array.count += 1;
            return Ok(());
        }

        if at_root && !has_root_name {
            return self.out.tag(tag);
        }

        match (frame.declared.take(), frame.pending_tag.take()) {
            (Some(declared), _) if declared != tag => Err(Error::unsupported(format!(
                "entry declared as {:?} but given {:?}",
                declared, tag
            ))),
            (None, Some(at)) => self.out.patch_tag(at, tag),
            _ => Ok(()),
        }
    }

    fn end_value(&mut self) {
        let next = if self.top().array.is_some() {
            WriterState::WritingPayload
        } else if self.frames.len() == 1 {
            WriterState::Stopped
        } else {
            WriterState::WritingName
        };
        self.set_state(next);
    }

    fn scalar(&mut self, tag: Tag, write: impl FnOnce(&mut ByteSink<S>) -> Result<()>) -> Result<()> {
        self.begin_value(tag)?;
        write(&mut self.out)?;
        self.end_value();
        Ok(())
    }

    fn start_sequence(
        &mut self,
        kind: Tag,
        element: Option<Tag>,
        len: Option<usize>,
    ) -> Result<()> {
        self.check_depth()?;
        // An empty list is written with the End tag whatever it would hold.
        let element = match (element, len) {
            (None, Some(0)) if kind == Tag::List => Some(Tag::End),
            _ => element,
        };
        if len.is_none() && self.requires_length_info() {
            return Err(Error::unsupported(format!(
                "{:?} of unknown length needs a seekable sink without varints",
                kind
            )));
        }
        if element.is_none() && !self.out.can_seek() {
            return Err(Error::unsupported(
                "list of unknown element tag needs a seekable sink",
            ));
        }

        self.begin_value(kind)?;

        let mut element_at = None;
        if kind == Tag::List {
            match element {
                Some(tag) => self.out.tag(tag)?,
                None => {
                    element_at = Some(self.out.position());
                    self.out.tag(Tag::End)?;
                }
            }
        }

        let mut len_at = None;
        match len {
            Some(len) => self.out.array_len(len)?,
            None => {
                len_at = Some(self.out.position());
                self.out.array_len(0)?;
            }
        }

        self.frames.push(Frame {
            array: Some(ArrayFrame {
                kind,
                element,
                element_at,
                len,
                len_at,
                count: 0,
            }),
            ..Frame::default()
        });
        self.set_state(WriterState::WritingPayload);
        Ok(())
    }
}

impl<S: Sink> NbtWrite for BinaryWriter<S> {
    fn options(&self) -> &NbtOptions {
        &self.options.generic
    }

    fn state(&self) -> WriterState {
        self.state
    }

    fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    fn position(&self) -> u64 {
        self.out.position()
    }

    fn is_in_array(&self) -> bool {
        self.frames.last().map_or(false, |f| f.array.is_some())
    }

    fn requires_length_info(&self) -> bool {
        !self.out.can_seek() || self.options.var_int
    }

    fn write_name(&mut self, name: &str, tag: Option<Tag>) -> Result<()> {
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

        match tag {
            Some(tag) => {
                self.out.tag(tag)?;
                self.top().declared = Some(tag);
            }
            None => {
                if !self.out.can_seek() {
                    return Err(Error::unsupported(format!(
                        "entry {:?} of unknown tag needs a seekable sink",
                        name
                    )));
                }
                let at = self.out.position();
                self.out.tag(Tag::End)?;
                self.top().pending_tag = Some(at);
            }
        }
        self.write_string_body(name)?;
        self.set_state(WriterState::WritingPayload);
        Ok(())
    }

    fn write_start_compound(&mut self) -> Result<()> {
        self.check_depth()?;
        self.begin_value(Tag::Compound)?;
        self.frames.push(Frame::default());
        self.set_state(WriterState::WritingName);
        Ok(())
    }

    fn write_end_compound(&mut self) -> Result<()> {
        if self.frames.len() == 1 || self.is_in_array() || self.state != WriterState::WritingName {
            return Err(Error::unsupported("no compound entry list to close here"));
        }
        self.out.tag(Tag::End)?;
        self.frames.pop();
        self.end_value();
        Ok(())
    }

    fn write_start_list(&mut self, element: Option<Tag>, len: Option<usize>) -> Result<()> {
        self.start_sequence(Tag::List, element, len)
    }

    fn write_start_array(&mut self, kind: Tag, len: Option<usize>) -> Result<()> {
        let element = match kind {
            Tag::ByteArray => Tag::Byte,
            Tag::IntArray => Tag::Int,
            Tag::LongArray => Tag::Long,
            other => {
                return Err(Error::unsupported(format!(
                    "{:?} is not an array tag",
                    other
                )))
            }
        };
        self.start_sequence(kind, Some(element), len)
    }

    fn write_end_array(&mut self) -> Result<()> {
        if self.frames.len() == 1 || !self.is_in_array() {
            return Err(Error::unsupported("no list or array to close here"));
        }
        let array = self
            .frames
            .pop()
            .and_then(|f| f.array)
            .ok_or_else(|| Error::unsupported("no list or array to close here"))?;

        if let Some(len) = array.len {
            if len != array.count {
                return Err(Error::unsupported(format!(
                    "{:?} declared {} elements but {} were written",
                    array.kind, len, array.count
                )));
            }
        }
        if let Some(at) = array.len_at {
            self.out.patch_len(at, array.count)?;
        }
        self.end_value();
        Ok(())
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.write_i8(v as i8)
    }

    fn write_i8(&mut self, v: i8) -> Result<()> {
        self.scalar(Tag::Byte, |out| out.u8(v as u8))
    }

    fn write_i16(&mut self, v: i16) -> Result<()> {
        self.scalar(Tag::Short, |out| out.i16(v))
    }

    fn write_i32(&mut self, v: i32) -> Result<()> {
        self.scalar(Tag::Int, |out| out.i32(v))
    }

    fn write_i64(&mut self, v: i64) -> Result<()> {
        self.scalar(Tag::Long, |out| out.i64(v))
    }

    fn write_f32(&mut self, v: f32) -> Result<()> {
        self.scalar(Tag::Float, |out| out.f32(v))
    }

    fn write_f64(&mut self, v: f64) -> Result<()> {
        self.scalar(Tag::Double, |out| out.f64(v))
    }

    fn write_str(&mut self, v: &str) -> Result<()> {
        self.begin_value(Tag::String)?;
        self.write_string_body(v)?;
        self.end_value();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()
    }
}
