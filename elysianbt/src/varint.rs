//! Base-128 VarInts and the ZigZag sign folding used by Bedrock network NBT.
//!
//! Each byte carries seven payload bits, least significant group first, with
//! the high bit set on every byte but the last.
use std::io::{Read, Write};

use crate::error::{Error, Result};

/// Longest VarInt that can hold a 32-bit value.
pub const MAX_VARINT32_LEN: usize = 5;

/// Longest VarInt that can hold a 64-bit value.
pub const MAX_VARINT64_LEN: usize = 10;

pub fn zigzag32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

pub fn unzigzag32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

pub fn zigzag64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

pub fn unzigzag64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

/// Write `value` as a VarInt, returning the number of bytes written.
pub fn write_var_u64<W: Write + ?Sized>(writer: &mut W, mut value: u64) -> Result<usize> {
    let mut buf = [0u8; MAX_VARINT64_LEN];
    let mut len = 0;
    loop {
        let group = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf[len] = group;
            len += 1;
            break;
        }
        buf[len] = group | 0x80;
        len += 1;
    }
    writer.write_all(&buf[..len])?;
    Ok(len)
}

pub fn write_var_u32<W: Write + ?Sized>(writer: &mut W, value: u32) -> Result<usize> {
    write_var_u64(writer, value as u64)
}

/// Read a VarInt of at most `max_len` bytes. `offset` is only used to report
/// where a malformed VarInt started. Returns the value and its encoded length.
fn read_var<R: Read + ?Sized>(reader: &mut R, max_len: usize, offset: u64) -> Result<(u64, usize)> {
    let mut value = 0u64;
    for i in 0..max_len {
        let mut byte = [0u8];
        reader
            .read_exact(&mut byte)
            .map_err(|e| Error::from(e).at(offset + i as u64))?;
        value |= ((byte[0] & 0x7f) as u64) << (7 * i);
        if byte[0] & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(Error::format(
        format!("varint longer than {} bytes", max_len),
        offset,
    ))
}

pub fn read_var_u32<R: Read + ?Sized>(reader: &mut R, offset: u64) -> Result<(u32, usize)> {
    let (value, len) = read_var(reader, MAX_VARINT32_LEN, offset)?;
    let value = u32::try_from(value)
        .map_err(|_| Error::format("varint does not fit in 32 bits", offset))?;
    Ok((value, len))
}

pub fn read_var_u64<R: Read + ?Sized>(reader: &mut R, offset: u64) -> Result<(u64, usize)> {
    read_var(reader, MAX_VARINT64_LEN, offset)
}
