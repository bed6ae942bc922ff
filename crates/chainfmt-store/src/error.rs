//! Error types for the flat-file store.
use chainfmt_core::CodecError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)] Codec(#[from] CodecError),
    #[error("io: {0}")] Io(#[from] std::io::Error),
    #[error("bad file magic: expected {expected:02x?}, found {found:02x?}")] BadMagic { expected: [u8; 4], found: [u8; 4] },
    #[error("file offset {0} exceeds the 32-bit position range")] OffsetOverflow(u64),
    #[error("position {0} is not a record offset")] InvalidPosition(u32),
    #[error("size mismatch: reserved {reserved} bytes, wrote {written}")] SizeMismatch { reserved: u64, written: u64 },
}

impl StoreError {
    /// True when the stored bytes were readable but not a valid record.
    pub fn is_corruption(&self) -> bool {
        match self {
            Self::Codec(e) => e.is_corruption(),
            Self::BadMagic { .. } => true,
            _ => false,
        }
    }
}
