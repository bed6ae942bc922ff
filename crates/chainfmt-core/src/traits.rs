//! Capability traits for nested codecs.
//!
//! The undo log and block index treat coins and headers as opaque units that
//! know how to write and read themselves:
//! - [`Serializable`] writes a value to a byte sink
//! - [`Deserializable`] builds a value from a byte source
//!
//! [`Coin`](crate::coin::Coin) and [`BlockHeader`](crate::types::BlockHeader)
//! are the implementations shipped with this crate; tests and other
//! subsystems plug in their own.

use std::io::{Read, Write};

use crate::error::CodecError;

/// A value with a byte encoding.
pub trait Serializable {
    /// Write the value's encoding to `w`.
    fn serialize<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), CodecError>;

    /// Length of the encoding in bytes.
    ///
    /// Default implementation serializes into a scratch buffer and measures it.
    fn serialized_size(&self) -> Result<usize, CodecError> {
        let mut buf = Vec::new();
        self.serialize(&mut buf)?;
        Ok(buf.len())
    }
}

/// A value that can be constructed from its byte encoding.
///
/// Malformed content must be reported as
/// [`CodecError::Corrupt`](crate::error::CodecError::Corrupt) and truncated input
/// as an I/O error. Implementations never panic on untrusted bytes.
pub trait Deserializable: Sized {
    /// Read one value from `r`.
    fn deserialize<R: Read + ?Sized>(r: &mut R) -> Result<Self, CodecError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use std::io::Cursor;

    #[derive(Debug, PartialEq)]
    struct Pair(u32, u32);

    impl Serializable for Pair {
        fn serialize<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), CodecError> {
            codec::write_u32(w, self.0)?;
            codec::write_u32(w, self.1)
        }
    }

    impl Deserializable for Pair {
        fn deserialize<R: Read + ?Sized>(r: &mut R) -> Result<Self, CodecError> {
            Ok(Self(codec::read_u32(r)?, codec::read_u32(r)?))
        }
    }

    #[test]
    fn default_serialized_size_measures_encoding() {
        assert_eq!(Pair(1, 2).serialized_size().unwrap(), 8);
    }

    #[test]
    fn works_over_dyn_streams() {
        let mut buf: Vec<u8> = Vec::new();
        let sink: &mut dyn Write = &mut buf;
        Pair(3, 4).serialize(sink).unwrap();

        let mut cur = Cursor::new(buf);
        let src: &mut dyn Read = &mut cur;
        assert_eq!(Pair::deserialize(src).unwrap(), Pair(3, 4));
    }
}
