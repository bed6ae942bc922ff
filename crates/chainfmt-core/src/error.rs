//! Error types for the persistence formats.
use thiserror::Error;

/// Structurally invalid data found while decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorruptionError {
    #[error("too many input undo records: {count} > {max}")] TooManyInputs { count: u64, max: u64 },
    #[error("size too large: {0}")] SizeTooLarge(u64),
    #[error("non-canonical compact size: {value} encoded with prefix {prefix:#04x}")] NonCanonicalCompactSize { value: u64, prefix: u8 },
    #[error("varint overflows u64")] VarIntOverflow,
    #[error("script too large: {size} > {max}")] ScriptTooLarge { size: u64, max: u64 },
    #[error("malformed {what}: {reason}")] Malformed { what: &'static str, reason: String },
}

/// Failure while encoding or decoding a record.
///
/// I/O failures (including short reads, surfaced as
/// [`std::io::ErrorKind::UnexpectedEof`]) are passed through unchanged.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("io: {0}")] Io(#[from] std::io::Error),
    #[error("corrupt: {0}")] Corrupt(#[from] CorruptionError),
}

impl CodecError {
    /// True if the underlying stream failed.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// True if the bytes were readable but structurally invalid.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Corrupt(_))
    }

    /// True for a read that ran out of bytes mid-record.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }

    /// The corruption cause, if any.
    pub fn corruption(&self) -> Option<&CorruptionError> {
        match self {
            Self::Corrupt(c) => Some(c),
            Self::Io(_) => None,
        }
    }
}
