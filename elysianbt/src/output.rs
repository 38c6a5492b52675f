//! Byte sinks for the binary writer.
//!
//! The writer sometimes has to go back and fill in a tag byte or a length it
//! did not know when it got there. A [`Sink`] says whether it can do that.
//! Wrap a `Write + Seek` in [`Seekable`] and a plain `Write` in
//! [`ForwardOnly`].
use std::io::{self, Seek, SeekFrom, Write};

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use crate::{
    error::{Error, Result},
    options::BinaryOptions,
    varint, Tag,
};

pub trait Sink: Write {
    fn can_seek(&self) -> bool;

    /// Overwrite bytes at absolute offset `at`, then return to where the sink
    /// was.
    fn patch(&mut self, at: u64, bytes: &[u8]) -> io::Result<()>;

    /// Absolute offset of the next byte written.
    fn start_position(&mut self) -> io::Result<u64>;
}

#[derive(Debug)]
pub struct Seekable<W>(pub W);

#[derive(Debug)]
pub struct ForwardOnly<W>(pub W);

impl<W: Write> Write for Seekable<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<W: Write + Seek> Sink for Seekable<W> {
    fn can_seek(&self) -> bool {
        true
    }

    fn patch(&mut self, at: u64, bytes: &[u8]) -> io::Result<()> {
        let here = self.0.stream_position()?;
        self.0.seek(SeekFrom::Start(at))?;
        let written = self.0.write_all(bytes);
        // Go back even if the write failed, so the sink is not left mid-document.
        self.0.seek(SeekFrom::Start(here))?;
        written
    }

    fn start_position(&mut self) -> io::Result<u64> {
        self.0.stream_position()
    }
}

impl<W: Write> Write for ForwardOnly<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<W: Write> Sink for ForwardOnly<W> {
    fn can_seek(&self) -> bool {
        false
    }

    fn patch(&mut self, _at: u64, _bytes: &[u8]) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "sink cannot seek back",
        ))
    }

    fn start_position(&mut self) -> io::Result<u64> {
        Ok(0)
    }
}

/// Primitive writes onto a sink, mirroring the reads of the binary reader.
pub(crate) struct ByteSink<S> {
    inner: S,
    position: u64,
    little_endian: bool,
    var_int: bool,
}

macro_rules! fixed {
    ($name:ident, $ty:ty, $write:ident, $size:expr) => {
        pub fn $name(&mut self, v: $ty) -> Result<()> {
            if self.little_endian {
                self.inner.$write::<LittleEndian>(v)?;
            } else {
                self.inner.$write::<BigEndian>(v)?;
            }
            self.position += $size;
            Ok(())
        }
    };
}

impl<S: Sink> ByteSink<S> {
    pub fn new(mut inner: S, options: &BinaryOptions) -> Result<Self> {
        let position = inner.start_position()?;
        Ok(Self {
            inner,
            position,
            little_endian: options.little_endian,
            var_int: options.var_int,
        })
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn can_seek(&self) -> bool {
        self.inner.can_seek()
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    pub fn flush(&mut self) -> Result<()> {
        Ok(self.inner.flush()?)
    }

    pub fn u8(&mut self, v: u8) -> Result<()> {
        self.inner.write_u8(v)?;
        self.position += 1;
        Ok(())
    }

    pub fn tag(&mut self, tag: Tag) -> Result<()> {
        self.u8(tag.into())
    }

    pub fn bytes(&mut self, bs: &[u8]) -> Result<()> {
        self.inner.write_all(bs)?;
        self.position += bs.len() as u64;
        Ok(())
    }

    fixed!(i16, i16, write_i16, 2);
    fixed!(fixed_i32, i32, write_i32, 4);
    fixed!(fixed_i64, i64, write_i64, 8);
    fixed!(f32, f32, write_f32, 4);
    fixed!(f64, f64, write_f64, 8);

    pub fn i32(&mut self, v: i32) -> Result<()> {
        if self.var_int {
            let n = varint::write_var_u32(&mut self.inner, varint::zigzag32(v))?;
            self.position += n as u64;
            Ok(())
        } else {
            self.fixed_i32(v)
        }
    }

    pub fn i64(&mut self, v: i64) -> Result<()> {
        if self.var_int {
            let n = varint::write_var_u64(&mut self.inner, varint::zigzag64(v))?;
            self.position += n as u64;
            Ok(())
        } else {
            self.fixed_i64(v)
        }
    }

    pub fn array_len(&mut self, len: usize) -> Result<()> {
        let len = i32::try_from(len)
            .map_err(|_| Error::unsupported(format!("length {} does not fit in an i32", len)))?;
        self.i32(len)
    }

    pub fn string_len(&mut self, len: usize) -> Result<()> {
        if self.var_int {
            let len = u32::try_from(len)
                .map_err(|_| Error::unsupported(format!("string of {} bytes is too long", len)))?;
            let n = varint::write_var_u32(&mut self.inner, len)?;
            self.position += n as u64;
            Ok(())
        } else {
            let len = u16::try_from(len)
                .map_err(|_| Error::unsupported(format!("string of {} bytes is too long", len)))?;
            if self.little_endian {
                self.inner.write_u16::<LittleEndian>(len)?;
            } else {
                self.inner.write_u16::<BigEndian>(len)?;
            }
            self.position += 2;
            Ok(())
        }
    }

    pub fn patch_tag(&mut self, at: u64, tag: Tag) -> Result<()> {
        self.inner.patch(at, &[tag.into()])?;
        Ok(())
    }

    /// Patch a fixed-width length. Only valid outside VarInt mode, where the
    /// placeholder has a known width.
    pub fn patch_len(&mut self, at: u64, len: usize) -> Result<()> {
        let len = i32::try_from(len)
            .map_err(|_| Error::unsupported(format!("length {} does not fit in an i32", len)))?;
        let bytes = if self.little_endian {
            len.to_le_bytes()
        } else {
            len.to_be_bytes()
        };
        self.inner.patch(at, &bytes)?;
        Ok(())
    }
}
