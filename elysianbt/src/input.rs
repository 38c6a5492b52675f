use std::io::{self, Read};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

use crate::{
    error::{Error, Result},
    options::BinaryOptions,
    varint, Tag,
};

/// Primitive reads over a byte source, honoring the endianness and VarInt
/// mode of the options. Tracks how many bytes have been consumed so errors can
/// carry an offset.
pub(crate) struct ByteSource<R> {
    inner: R,
    position: u64,
    little_endian: bool,
    var_int: bool,
}

macro_rules! fixed {
    ($name:ident, $ty:ty, $read:ident, $size:expr) => {
        pub fn $name(&mut self) -> Result<$ty> {
            let at = self.position;
            let value = if self.little_endian {
                self.inner.$read::<LittleEndian>()
            } else {
                self.inner.$read::<BigEndian>()
            }
            .map_err(|e| Error::from(e).at(at))?;
            self.position += $size;
            Ok(value)
        }
    };
}

impl<R: Read> ByteSource<R> {
    pub fn new(inner: R, options: &BinaryOptions) -> Self {
        Self {
            inner,
            position: 0,
            little_endian: options.little_endian,
            var_int: options.var_int,
        }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read one byte, or `None` if the source is cleanly exhausted.
    pub fn try_u8(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.position += 1;
                    return Ok(Some(byte[0]));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::from(e).at(self.position)),
            }
        }
    }

    pub fn u8(&mut self) -> Result<u8> {
        let at = self.position;
        let b = self.inner.read_u8().map_err(|e| Error::from(e).at(at))?;
        self.position += 1;
        Ok(b)
    }

    pub fn i8(&mut self) -> Result<i8> {
        Ok(self.u8()? as i8)
    }

    pub fn tag(&mut self) -> Result<Tag> {
        let at = self.position;
        let b = self.u8()?;
        Tag::try_from(b).map_err(|_| Error::invalid_tag(b, at))
    }

    /// Like `tag`, but a clean end of input gives `None`.
    pub fn try_tag(&mut self) -> Result<Option<Tag>> {
        let at = self.position;
        match self.try_u8()? {
            Some(b) => Tag::try_from(b)
                .map(Some)
                .map_err(|_| Error::invalid_tag(b, at)),
            None => Ok(None),
        }
    }

    fixed!(i16, i16, read_i16, 2);
    fixed!(fixed_i32, i32, read_i32, 4);
    fixed!(fixed_i64, i64, read_i64, 8);
    fixed!(f32, f32, read_f32, 4);
    fixed!(f64, f64, read_f64, 8);

    pub fn i32(&mut self) -> Result<i32> {
        if self.var_int {
            let (v, len) = varint::read_var_u32(&mut self.inner, self.position)?;
            self.position += len as u64;
            Ok(varint::unzigzag32(v))
        } else {
            self.fixed_i32()
        }
    }

    pub fn i64(&mut self) -> Result<i64> {
        if self.var_int {
            let (v, len) = varint::read_var_u64(&mut self.inner, self.position)?;
            self.position += len as u64;
            Ok(varint::unzigzag64(v))
        } else {
            self.fixed_i64()
        }
    }

    /// Length of a list or array. Negative lengths are clamped to zero.
    pub fn array_len(&mut self) -> Result<usize> {
        Ok(self.i32()?.max(0) as usize)
    }

    /// Byte length of a string: a u16, or an unsigned VarInt in network mode.
    pub fn string_len(&mut self) -> Result<usize> {
        if self.var_int {
            let (v, len) = varint::read_var_u32(&mut self.inner, self.position)?;
            self.position += len as u64;
            Ok(v as usize)
        } else {
            let at = self.position;
            let v = if self.little_endian {
                self.inner.read_u16::<LittleEndian>()
            } else {
                self.inner.read_u16::<BigEndian>()
            }
            .map_err(|e| Error::from(e).at(at))?;
            self.position += 2;
            Ok(v as usize)
        }
    }

    /// Append exactly `n` bytes to `buf`, in bounded chunks so a corrupt
    /// length cannot force one huge allocation up front.
    pub fn read_into(&mut self, n: usize, buf: &mut Vec<u8>) -> Result<()> {
        const CHUNK: usize = 8 * 1024;
        let mut remaining = n;
        while remaining > 0 {
            let step = remaining.min(CHUNK);
            let start = buf.len();
            buf.resize(start + step, 0);
            let at = self.position;
            self.inner
                .read_exact(&mut buf[start..])
                .map_err(|e| Error::from(e).at(at))?;
            self.position += step as u64;
            remaining -= step;
        }
        Ok(())
    }

    /// Discard exactly `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        let at = self.position;
        let copied = io::copy(&mut (&mut self.inner).take(n as u64), &mut io::sink())
            .map_err(|e| Error::from(e).at(at))?;
        self.position += copied;
        if copied < n as u64 {
            return Err(Error::truncated(self.position));
        }
        Ok(())
    }
}
