//! Format constants.

/// Format tag written at the head of every block-index record.
pub const CLIENT_VERSION: i32 = 160_000;

/// Largest P2P message payload (32 MiB).
pub const MAX_MESSAGE_PAYLOAD: u64 = 32 * 1024 * 1024;

/// Smallest possible serialized transaction input: outpoint (36) + script
/// length (1) + sequence (4).
pub const MIN_TX_IN_PAYLOAD: u64 = 9 + 32;

/// Maximum number of inputs a transaction can carry, and so the upper bound on
/// the coin count of a single [`TxUndo`](crate::undo::TxUndo).
pub const MAX_TX_IN_PER_MESSAGE: u64 = MAX_MESSAGE_PAYLOAD / MIN_TX_IN_PAYLOAD + 1;

/// Upper bound for any compact-size length prefix.
pub const MAX_COMPACT_SIZE: u64 = 0x0200_0000;

/// Largest script accepted when decoding a coin.
pub const MAX_SCRIPT_SIZE: u64 = 10_000;

/// Cap on elements preallocated from an untrusted count before the backing
/// bytes have been read.
pub const MAX_PREALLOC: usize = 4096;

/// `undo_pos` value for a block without undo data.
pub const UNDO_POS_UNSET: u32 = 0;

/// Serialized size of a [`BlockHeader`](crate::types::BlockHeader).
pub const HEADER_SIZE: usize = 80;
