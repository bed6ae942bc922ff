//! Persisted block-index record.
//!
//! Wire layout, integers little-endian:
//!
//! | field          | width |
//! |----------------|-------|
//! | client version | i32   |
//! | height         | i32   |
//! | status         | u32   |
//! | tx_count       | i32   |
//! | file           | i32   |
//! | data_pos       | u32   |
//! | undo_pos       | u32   |
//! | header         | header codec |
//!
//! The client version is written from [`FormatConfig`] and is advisory only:
//! decoding reads it and moves on.

use std::io::{Read, Write};

use bytes::{BufMut, BytesMut};

use crate::codec;
use crate::config::FormatConfig;
use crate::constants::{HEADER_SIZE, UNDO_POS_UNSET};
use crate::error::CodecError;
use crate::traits::{Deserializable, Serializable};
use crate::types::BlockHeader;

/// Bytes preceding the header in an encoded record.
pub const SERIALIZED_FIXED_LEN: usize = 7 * 4;

/// Index metadata for one block: chain position, validation status and where
/// its data and undo data live on disk.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct BlockIndexRecord<H = BlockHeader> {
    /// Position in the chain; genesis is 0.
    pub height: i32,
    /// Validation flags, persisted verbatim.
    pub status: u32,
    /// Number of transactions in the block.
    pub tx_count: i32,
    /// Block-data file holding the block.
    pub file: i32,
    /// Offset of the block within `file`.
    pub data_pos: u32,
    /// Offset of the block's undo data, or [`UNDO_POS_UNSET`].
    pub undo_pos: u32,
    pub header: H,
}

impl<H> BlockIndexRecord<H> {
    /// Persisted fields in wire order, after the version tag.
    pub const FIELDS: [&'static str; 7] =
        ["height", "status", "tx_count", "file", "data_pos", "undo_pos", "header"];

    /// Whether undo data has been written for this block.
    pub fn has_undo(&self) -> bool {
        self.undo_pos != UNDO_POS_UNSET
    }
}

impl<H: Serializable> BlockIndexRecord<H> {
    /// Write the record tagged with `config.client_version`.
    ///
    /// The record is assembled in memory and handed to `w` with a single
    /// `write_all`, so a failure while encoding never reaches the sink.
    pub fn serialize<W: Write + ?Sized>(&self, config: &FormatConfig, w: &mut W) -> Result<(), CodecError> {
        let mut buf = BytesMut::with_capacity(SERIALIZED_FIXED_LEN + HEADER_SIZE).writer();
        codec::write_i32(&mut buf, config.client_version)?;
        codec::write_i32(&mut buf, self.height)?;
        codec::write_u32(&mut buf, self.status)?;
        codec::write_i32(&mut buf, self.tx_count)?;
        codec::write_i32(&mut buf, self.file)?;
        codec::write_u32(&mut buf, self.data_pos)?;
        codec::write_u32(&mut buf, self.undo_pos)?;
        self.header.serialize(&mut buf)?;

        let buf = buf.into_inner();
        w.write_all(&buf)?;
        tracing::trace!(height = self.height, len = buf.len(), "wrote block index record");
        Ok(())
    }

    /// Length of the encoded record.
    pub fn serialized_size(&self) -> Result<usize, CodecError> {
        Ok(SERIALIZED_FIXED_LEN + self.header.serialized_size()?)
    }

    /// Field names paired with printable values, in wire order.
    ///
    /// The header is shown as the hex of its encoding.
    pub fn field_values(&self) -> Result<Vec<(&'static str, String)>, CodecError> {
        let mut header = Vec::new();
        self.header.serialize(&mut header)?;
        let values = [
            self.height.to_string(),
            format!("{:#010x}", self.status),
            self.tx_count.to_string(),
            self.file.to_string(),
            self.data_pos.to_string(),
            self.undo_pos.to_string(),
            hex::encode(header),
        ];
        Ok(Self::FIELDS.into_iter().zip(values).collect())
    }
}

impl<H: Deserializable> BlockIndexRecord<H> {
    /// Read a record, discarding its version tag.
    pub fn deserialize<R: Read + ?Sized>(r: &mut R) -> Result<Self, CodecError> {
        Self::deserialize_versioned(r).map(|(_, record)| record)
    }

    /// Read a record and the client version it was written with.
    pub fn deserialize_versioned<R: Read + ?Sized>(r: &mut R) -> Result<(i32, Self), CodecError> {
        let version = codec::read_i32(r)?;
        let record = Self {
            height: codec::read_i32(r)?,
            status: codec::read_u32(r)?,
            tx_count: codec::read_i32(r)?,
            file: codec::read_i32(r)?,
            data_pos: codec::read_u32(r)?,
            undo_pos: codec::read_u32(r)?,
            header: H::deserialize(r)?,
        };
        Ok((version, record))
    }
}
