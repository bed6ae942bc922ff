//! Primitive codec: fixed-width little-endian integers, compact-size counts
//! and MSB base-128 varints.
//!
//! Writers fail with [`CodecError::Io`] when the sink rejects bytes. Readers use
//! `read_exact`, so a truncated source yields an `UnexpectedEof` I/O error.

use std::io::{Read, Write};

use crate::constants::MAX_COMPACT_SIZE;
use crate::error::{CodecError, CorruptionError};

macro_rules! fixed_int {
    ($write:ident, $read:ident, $ty:ty) => {
        #[doc = concat!("Write a little-endian `", stringify!($ty), "`.")]
        pub fn $write<W: Write + ?Sized>(w: &mut W, value: $ty) -> Result<(), CodecError> {
            w.write_all(&value.to_le_bytes())?;
            Ok(())
        }

        #[doc = concat!("Read a little-endian `", stringify!($ty), "`.")]
        pub fn $read<R: Read + ?Sized>(r: &mut R) -> Result<$ty, CodecError> {
            let mut buf = [0u8; std::mem::size_of::<$ty>()];
            r.read_exact(&mut buf)?;
            Ok(<$ty>::from_le_bytes(buf))
        }
    };
}

fixed_int!(write_u8, read_u8, u8);
fixed_int!(write_u16, read_u16, u16);
fixed_int!(write_i32, read_i32, i32);
fixed_int!(write_u32, read_u32, u32);
fixed_int!(write_u64, read_u64, u64);

/// Write a count prefix in compact-size form.
///
/// `< 0xFD` is one byte; larger values use a marker byte followed by a u16,
/// u32 or u64.
pub fn write_compact_size<W: Write + ?Sized>(w: &mut W, size: u64) -> Result<(), CodecError> {
    if size < 0xFD {
        write_u8(w, size as u8)
    } else if size <= 0xFFFF {
        write_u8(w, 0xFD)?;
        write_u16(w, size as u16)
    } else if size <= 0xFFFF_FFFF {
        write_u8(w, 0xFE)?;
        write_u32(w, size as u32)
    } else {
        write_u8(w, 0xFF)?;
        write_u64(w, size)
    }
}

/// Read a compact-size count.
///
/// Rejects encodings that use a wider form than needed and values above
/// [`MAX_COMPACT_SIZE`].
pub fn read_compact_size<R: Read + ?Sized>(r: &mut R) -> Result<u64, CodecError> {
    let prefix = read_u8(r)?;
    let (value, min) = match prefix {
        0xFD => (u64::from(read_u16(r)?), 0xFD),
        0xFE => (u64::from(read_u32(r)?), 0x1_0000),
        0xFF => (read_u64(r)?, 0x1_0000_0000),
        small => return Ok(u64::from(small)),
    };
    if value < min {
        return Err(CorruptionError::NonCanonicalCompactSize { value, prefix }.into());
    }
    if value > MAX_COMPACT_SIZE {
        return Err(CorruptionError::SizeTooLarge(value).into());
    }
    Ok(value)
}

/// Number of bytes [`write_compact_size`] emits for `size`.
pub fn compact_size_len(size: u64) -> usize {
    match size {
        0..=0xFC => 1,
        0xFD..=0xFFFF => 3,
        0x1_0000..=0xFFFF_FFFF => 5,
        _ => 9,
    }
}

/// Write an MSB base-128 varint.
///
/// Each byte carries seven bits, most significant group first, with the high
/// bit set on every byte but the last. One is subtracted from every group
/// after the last so that each value has exactly one encoding.
pub fn write_varint<W: Write + ?Sized>(w: &mut W, mut n: u64) -> Result<(), CodecError> {
    let mut tmp = [0u8; 10];
    let mut len = 0;
    loop {
        tmp[len] = (n & 0x7F) as u8 | if len > 0 { 0x80 } else { 0x00 };
        if n <= 0x7F {
            break;
        }
        n = (n >> 7) - 1;
        len += 1;
    }
    tmp[..=len].reverse();
    w.write_all(&tmp[..=len])?;
    Ok(())
}

/// Read an MSB base-128 varint written by [`write_varint`].
pub fn read_varint<R: Read + ?Sized>(r: &mut R) -> Result<u64, CodecError> {
    let mut n: u64 = 0;
    loop {
        let byte = read_u8(r)?;
        if n > (u64::MAX >> 7) {
            return Err(CorruptionError::VarIntOverflow.into());
        }
        n = (n << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok(n);
        }
        n = n.checked_add(1).ok_or(CorruptionError::VarIntOverflow)?;
    }
}
