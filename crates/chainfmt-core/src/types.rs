//! Block header types used by the block index.
//!
//! The header is stored inside every [`BlockIndexRecord`](crate::BlockIndexRecord)
//! through its own fixed 80-byte codec.

use sha2::{Digest, Sha256};
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use crate::codec;
use crate::constants::HEADER_SIZE;
use crate::error::CodecError;
use crate::traits::{Deserializable, Serializable};

/// A 32-byte hash value, stored in wire order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero hash. Used as the previous-block hash of genesis.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a Hash256 from a byte array.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for Hash256 {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serializable for Hash256 {
    fn serialize<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), CodecError> {
        w.write_all(&self.0)?;
        Ok(())
    }

    fn serialized_size(&self) -> Result<usize, CodecError> {
        Ok(32)
    }
}

impl Deserializable for Hash256 {
    fn deserialize<R: Read + ?Sized>(r: &mut R) -> Result<Self, CodecError> {
        let mut bytes = [0u8; 32];
        r.read_exact(&mut bytes)?;
        Ok(Self(bytes))
    }
}

/// Block header.
///
/// Serialized as version || prev_block || merkle_root || time || bits || nonce,
/// integers little-endian, [`HEADER_SIZE`] bytes total.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct BlockHeader {
    /// Block version.
    pub version: i32,
    /// Hash of the previous block header.
    pub prev_block: Hash256,
    /// Merkle root of the block's transactions.
    pub merkle_root: Hash256,
    /// Unix timestamp in seconds.
    pub time: u32,
    /// Compact difficulty target.
    pub bits: u32,
    /// Proof-of-work nonce.
    pub nonce: u32,
}

impl BlockHeader {
    /// Compute the block hash (double SHA-256 of the 80-byte encoding).
    pub fn hash(&self) -> Hash256 {
        let mut data = Vec::with_capacity(HEADER_SIZE);
        data.extend_from_slice(&self.version.to_le_bytes());
        data.extend_from_slice(self.prev_block.as_bytes());
        data.extend_from_slice(self.merkle_root.as_bytes());
        data.extend_from_slice(&self.time.to_le_bytes());
        data.extend_from_slice(&self.bits.to_le_bytes());
        data.extend_from_slice(&self.nonce.to_le_bytes());
        let first = Sha256::digest(&data);
        Hash256(Sha256::digest(first).into())
    }
}

impl Serializable for BlockHeader {
    fn serialize<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), CodecError> {
        codec::write_i32(w, self.version)?;
        self.prev_block.serialize(w)?;
        self.merkle_root.serialize(w)?;
        codec::write_u32(w, self.time)?;
        codec::write_u32(w, self.bits)?;
        codec::write_u32(w, self.nonce)
    }

    fn serialized_size(&self) -> Result<usize, CodecError> {
        Ok(HEADER_SIZE)
    }
}

impl Deserializable for BlockHeader {
    fn deserialize<R: Read + ?Sized>(r: &mut R) -> Result<Self, CodecError> {
        Ok(Self {
            version: codec::read_i32(r)?,
            prev_block: Hash256::deserialize(r)?,
            merkle_root: Hash256::deserialize(r)?,
            time: codec::read_u32(r)?,
            bits: codec::read_u32(r)?,
            nonce: codec::read_u32(r)?,
        })
    }
}
