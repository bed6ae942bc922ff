//! Reference coin: the UTXO snapshot stored in undo records.
//!
//! The undo log only needs the [`Serializable`]/[`Deserializable`] contract;
//! this type is the implementation used by the tools and tests in this
//! workspace. Encoding:
//!
//! ```text
//! varint(height * 2 + is_coinbase) || varint(value) || compact_size(len) || script_pubkey
//! ```

use std::io::{Read, Write};

use crate::codec;
use crate::constants::{MAX_PREALLOC, MAX_SCRIPT_SIZE};
use crate::error::{CodecError, CorruptionError};
use crate::traits::{Deserializable, Serializable};

/// A transaction output.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct TxOut {
    /// Value in the smallest currency unit.
    pub value: u64,
    /// Locking script.
    pub script_pubkey: Vec<u8>,
}

/// An unspent output together with the context it was created in.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Coin {
    /// The output itself.
    pub out: TxOut,
    /// Height of the block that created the output.
    pub height: u32,
    /// Whether the creating transaction was a coinbase.
    pub is_coinbase: bool,
}

impl Coin {
    pub fn new(out: TxOut, height: u32, is_coinbase: bool) -> Self {
        Self { out, height, is_coinbase }
    }

    fn code(&self) -> u64 {
        u64::from(self.height) * 2 + u64::from(self.is_coinbase)
    }
}

impl Serializable for Coin {
    fn serialize<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), CodecError> {
        codec::write_varint(w, self.code())?;
        codec::write_varint(w, self.out.value)?;
        codec::write_compact_size(w, self.out.script_pubkey.len() as u64)?;
        w.write_all(&self.out.script_pubkey)?;
        Ok(())
    }
}

impl Deserializable for Coin {
    fn deserialize<R: Read + ?Sized>(r: &mut R) -> Result<Self, CodecError> {
        let code = codec::read_varint(r)?;
        let height = u32::try_from(code >> 1).map_err(|_| CorruptionError::Malformed {
            what: "coin",
            reason: format!("height {} out of range", code >> 1),
        })?;
        let value = codec::read_varint(r)?;

        let len = codec::read_compact_size(r)?;
        if len > MAX_SCRIPT_SIZE {
            return Err(CorruptionError::ScriptTooLarge { size: len, max: MAX_SCRIPT_SIZE }.into());
        }
        let mut script_pubkey = Vec::with_capacity((len as usize).min(MAX_PREALLOC));
        (&mut *r).take(len).read_to_end(&mut script_pubkey)?;
        if script_pubkey.len() as u64 != len {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        }

        Ok(Self {
            out: TxOut { value, script_pubkey },
            height,
            is_coinbase: code & 1 == 1,
        })
    }
}
